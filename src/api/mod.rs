mod handlers;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::runtime::Runtime;

/// Shared handle to the single-writer runtime.
#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<Mutex<Runtime>>,
}

impl AppState {
    /// Wrap `runtime` and spawn the task that feeds timer and AI events back
    /// into it. Must be called inside a tokio runtime.
    pub fn new(mut runtime: Runtime) -> Self {
        let events = runtime.detach_events();
        let runtime = Arc::new(Mutex::new(runtime));

        if let Some(mut events) = events {
            let pump = Arc::clone(&runtime);
            tokio::spawn(async move {
                while let Some(event) = events.recv().await {
                    pump.lock().await.dispatch(event);
                }
                tracing::debug!("Event pump stopped");
            });
        }

        Self { runtime }
    }
}

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        // Workspace
        .route("/workspace", get(handlers::get_workspace))
        .route("/project", put(handlers::update_project))
        .route("/ui", put(handlers::update_ui))
        // Tabs
        .route("/tabs", post(handlers::create_tab))
        .route("/tabs/{id}", put(handlers::update_tab))
        .route("/tabs/{id}", delete(handlers::close_tab))
        .route("/tabs/{id}/activate", post(handlers::activate_tab))
        // Pages
        .route("/pages", post(handlers::create_page))
        .route("/pages/{id}", put(handlers::rename_page))
        .route("/pages/{id}", delete(handlers::delete_page))
        .route("/pages/{id}/documents", post(handlers::add_page_document))
        .route("/pages/{id}/toggle", post(handlers::toggle_page))
        // Library
        .route("/folders", post(handlers::create_folder))
        .route("/folders/{id}", put(handlers::rename_folder))
        .route("/folders/{id}", delete(handlers::delete_folder))
        .route("/folders/{id}/toggle", post(handlers::toggle_folder))
        .route("/library/upload", post(handlers::upload_files))
        .route("/library/files/{id}", delete(handlers::delete_library_file))
        // Context
        .route("/context", post(handlers::add_context))
        .route("/context/{id}", delete(handlers::remove_context))
        // Search and export
        .route("/search", get(handlers::search))
        .route("/export/{format}", get(handlers::export))
        // AI features
        .route("/seeds", post(handlers::generate_seeds))
        .route("/transform/framework", post(handlers::apply_framework))
        .route("/transform/style", post(handlers::apply_style))
        .route("/ghost", get(handlers::get_ghost))
        .route("/ghost/accept", post(handlers::accept_ghost))
        // Catalogs and settings
        .route("/frameworks", get(handlers::list_frameworks))
        .route("/frameworks", post(handlers::create_framework))
        .route("/frameworks/{id}", delete(handlers::delete_framework))
        .route("/styles", post(handlers::create_style))
        .route("/styles/{id}", put(handlers::update_style))
        .route("/styles/{id}", delete(handlers::delete_style))
        .route("/role", put(handlers::update_role))
        .route("/config/ai", put(handlers::update_ai_config))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
