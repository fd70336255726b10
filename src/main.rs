use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use scriptorium::api::{self, AppState};
use scriptorium::config::AppConfig;
use scriptorium::export::ExportFormat;
use scriptorium::runtime::Runtime;
use scriptorium::store::Store;
use scriptorium::workspace::{UploadSource, Workspace};

#[derive(Parser)]
#[command(name = "scriptorium")]
#[command(about = "Local writing workspace with AI ghost text and seeds")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API for the editor front-end
    Serve {
        /// Port for HTTP API (defaults to the configured port)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Search tabs, context files, library files and headings
    Search {
        query: String,
    },
    /// Export the active tab
    Export {
        /// One of txt, md, html
        #[arg(short, long, default_value = "txt")]
        format: String,

        /// Write to this path instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Import local files into the library
    Import {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Target folder id
        #[arg(long)]
        folder: Option<Uuid>,
    },
    /// Show workspace and server status
    Status,
    /// Print the effective configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        write: bool,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "scriptorium=debug,tower_http=debug".into()),
    );

    // Logs go to stderr so command output on stdout stays pipeable
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_store(config: &AppConfig) -> anyhow::Result<Store> {
    let store = match &config.data_dir {
        Some(dir) => Store::open(dir.join("workspace.db"))?,
        None => Store::open_default()?,
    }
    .with_quota(config.storage_quota_bytes);
    store.migrate()?;
    Ok(store)
}

fn load_workspace(config: &AppConfig) -> anyhow::Result<Workspace> {
    let store = open_store(config)?;
    Ok(Workspace::load(store, config.upload_fallback))
}

async fn serve(config: &AppConfig, port: u16) -> anyhow::Result<()> {
    tracing::info!("Starting Scriptorium server on port {}", port);

    let workspace = load_workspace(config)?;
    let runtime = Runtime::new(workspace, config.ghost_delay());
    let app = api::create_router(AppState::new(runtime));

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("Scriptorium server listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = AppConfig::load();

    match cli.command {
        Some(Commands::Serve { port }) => {
            serve(&config, port.unwrap_or(config.port)).await?;
        }
        Some(Commands::Search { query }) => {
            let mut workspace = load_workspace(&config)?;
            let results = workspace.set_search_query(query);
            if results.is_empty() {
                println!("No matches.");
            }
            for result in results {
                println!("[{:?}] {}: {}", result.source, result.title, result.preview);
            }
        }
        Some(Commands::Export { format, output }) => {
            let format = ExportFormat::from_str(&format)
                .ok_or_else(|| anyhow::anyhow!("Unsupported export format: {}", format))?;
            let workspace = load_workspace(&config)?;
            let tab = workspace
                .active_tab()
                .ok_or_else(|| anyhow::anyhow!("No active tab to export"))?;
            let export = scriptorium::export::export_tab(tab, format);

            match output {
                Some(path) => {
                    std::fs::write(&path, &export.body)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Exported '{}' to {}", tab.title, path.display());
                }
                None => print!("{}", export.body),
            }
        }
        Some(Commands::Import { files, folder }) => {
            let mut workspace = load_workspace(&config)?;
            let sources = files.into_iter().map(UploadSource::Path).collect();
            let report = workspace.upload_files(sources, folder).await?;

            for file in &report.added {
                println!(
                    "Imported {} ({})",
                    file.filename,
                    file.metadata.as_deref().unwrap_or("")
                );
            }
            for failure in &report.failed {
                eprintln!("Skipped {}: {}", failure.filename, failure.reason);
            }
        }
        Some(Commands::Status) => {
            let workspace = load_workspace(&config)?;
            println!("Project: {}", workspace.project_title());
            println!("Tabs: {}", workspace.tabs().len());
            println!("Pages: {}", workspace.pages().len());
            println!("Library folders: {}", workspace.library().len());
            println!("Context files: {}", workspace.context_files().len());
            println!(
                "AI: {}",
                if scriptorium::config::effective_ai_config(workspace.ai_config()).has_key() {
                    "configured"
                } else {
                    "not configured"
                }
            );

            let url = format!("http://127.0.0.1:{}/api/v1/health", config.port);
            match reqwest::get(&url).await {
                Ok(response) if response.status().is_success() => {
                    println!("Server: running on port {}", config.port)
                }
                _ => println!("Server: not running"),
            }
        }
        Some(Commands::Config { write }) => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            if write {
                config.save()?;
                println!("Configuration saved.");
            }
        }
        None => {
            serve(&config, config.port).await?;
        }
    }

    Ok(())
}
