use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::TestServer;
use scriptorium::ai::{AiError, Completer, Message};
use scriptorium::api::{create_router, AppState};
use scriptorium::config::{api_key_from_env, UploadFallback};
use scriptorium::models::*;
use scriptorium::runtime::Runtime;
use scriptorium::store::Store;
use scriptorium::workspace::Workspace;
use serde_json::{json, Value};

/// Completer with a fixed reply; unconfigured when the reply is `None`.
struct FixedCompleter(Option<String>);

#[async_trait]
impl Completer for FixedCompleter {
    fn is_configured(&self) -> bool {
        self.0.is_some()
    }

    async fn complete(&self, _messages: Vec<Message>, _system: Option<String>) -> Result<String, AiError> {
        self.0.clone().ok_or(AiError::Config)
    }
}

fn setup_with(reply: Option<&str>) -> TestServer {
    let store = Store::open_memory().expect("Failed to create store");
    store.migrate().expect("Failed to migrate");
    let workspace = Workspace::load(store, UploadFallback::FirstFolder);

    let completer: Arc<dyn Completer> = Arc::new(FixedCompleter(reply.map(str::to_string)));
    let runtime = Runtime::with_factory(
        workspace,
        Duration::from_secs(60),
        Arc::new(move |_: &AiConfig, _: &RoleDefinition| completer.clone()),
    );

    let app = create_router(AppState::new(runtime));
    TestServer::new(app).expect("Failed to create test server")
}

fn setup() -> TestServer {
    setup_with(None)
}

async fn snapshot(server: &TestServer) -> Value {
    server.get("/api/v1/workspace").await.json::<Value>()
}

async fn active_tab_id(server: &TestServer) -> String {
    snapshot(server).await["active_tab_id"]
        .as_str()
        .expect("No active tab")
        .to_string()
}

async fn set_active_content(server: &TestServer, content: &str) -> String {
    let id = active_tab_id(server).await;
    server
        .put(&format!("/api/v1/tabs/{}", id))
        .json(&json!({ "content": content }))
        .await
        .assert_status_ok();
    id
}

mod health {
    use super::*;

    #[tokio::test]
    async fn reports_ok() {
        let server = setup();
        let response = server.get("/api/v1/health").await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["status"], "ok");
    }
}

mod workspace {
    use super::*;

    #[tokio::test]
    async fn starts_with_one_untitled_tab() {
        let server = setup();

        let workspace = snapshot(&server).await;

        assert_eq!(workspace["project_title"], "Untitled Project");
        assert_eq!(workspace["tabs"].as_array().map(Vec::len), Some(1));
        assert_eq!(workspace["tabs"][0]["title"], "Untitled");
        assert_eq!(workspace["ai_configured"], api_key_from_env().is_some());
    }

    #[tokio::test]
    async fn renames_the_project() {
        let server = setup();

        server
            .put("/api/v1/project")
            .json(&json!({ "title": "Essay" }))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        assert_eq!(snapshot(&server).await["project_title"], "Essay");
    }

    #[tokio::test]
    async fn framework_search_filters_the_catalog() {
        let server = setup();

        let ui: Value = server
            .put("/api/v1/ui")
            .json(&json!({ "right_sidebar": "frameworks", "framework_search": "HATS" }))
            .await
            .json();
        assert_eq!(ui["right_sidebar"], "frameworks");
        assert_eq!(ui["left_sidebar"], "context");

        let frameworks: Vec<Framework> = server.get("/api/v1/frameworks").await.json();
        assert_eq!(frameworks.len(), 1);
        assert_eq!(frameworks[0].name, "Six Thinking Hats");
    }
}

mod tabs {
    use super::*;

    #[tokio::test]
    async fn creates_an_active_tab() {
        let server = setup();

        let response = server.post("/api/v1/tabs").json(&json!({})).await;

        response.assert_status(StatusCode::CREATED);
        let tab: DocumentTab = response.json();
        assert!(tab.is_active);
        assert_eq!(active_tab_id(&server).await, tab.id.to_string());
    }

    #[tokio::test]
    async fn updating_content_regenerates_headings() {
        let server = setup();

        set_active_content(&server, "<h1>Intro</h1><p>Text</p>").await;

        let workspace = snapshot(&server).await;
        assert_eq!(workspace["headings"][0]["text"], "Intro");
        assert_eq!(workspace["headings"][0]["id"], "heading-0");
    }

    #[tokio::test]
    async fn renames_a_tab() {
        let server = setup();
        let id = active_tab_id(&server).await;

        let tab: DocumentTab = server
            .put(&format!("/api/v1/tabs/{}", id))
            .json(&json!({ "title": "Chapter 1" }))
            .await
            .json();

        assert_eq!(tab.title, "Chapter 1");
    }

    #[tokio::test]
    async fn closing_the_only_tab_leaves_a_fresh_one() {
        let server = setup();
        let id = active_tab_id(&server).await;

        server
            .delete(&format!("/api/v1/tabs/{}", id))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let workspace = snapshot(&server).await;
        assert_eq!(workspace["tabs"].as_array().map(Vec::len), Some(1));
        assert_ne!(workspace["tabs"][0]["id"], id.as_str());
    }

    #[tokio::test]
    async fn unknown_tabs_are_not_found() {
        let server = setup();
        let missing = uuid::Uuid::new_v4();

        server
            .delete(&format!("/api/v1/tabs/{}", missing))
            .await
            .assert_status_not_found();
        server
            .post(&format!("/api/v1/tabs/{}/activate", missing))
            .await
            .assert_status_not_found();
    }
}

mod pages {
    use super::*;

    #[tokio::test]
    async fn deleting_a_page_closes_its_tabs() {
        let server = setup();
        let page: Page = server
            .post("/api/v1/pages")
            .json(&json!({ "name": "Draft" }))
            .await
            .json();

        let tab: DocumentTab = server
            .post(&format!("/api/v1/pages/{}/documents", page.id))
            .await
            .json();
        assert_eq!(tab.page_id, Some(page.id));

        server
            .delete(&format!("/api/v1/pages/{}", page.id))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let workspace = snapshot(&server).await;
        assert!(workspace["pages"].as_array().map(Vec::is_empty).unwrap_or(false));
        let ids: Vec<_> = workspace["tabs"]
            .as_array()
            .expect("tabs")
            .iter()
            .map(|t| t["id"].as_str().unwrap_or_default().to_string())
            .collect();
        assert!(!ids.contains(&tab.id.to_string()));
    }

    #[tokio::test]
    async fn creating_a_tab_for_an_unknown_page_fails() {
        let server = setup();

        server
            .post("/api/v1/tabs")
            .json(&json!({ "page_id": uuid::Uuid::new_v4() }))
            .await
            .assert_status_not_found();
    }
}

mod library {
    use super::*;

    #[tokio::test]
    async fn uploads_into_a_new_uploads_folder_and_indexes_the_file() {
        let server = setup();

        let response = server
            .post("/api/v1/library/upload")
            .json(&json!({ "files": [{ "filename": "zebra.md", "content": "Stripes" }] }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let report: Value = response.json();
        assert_eq!(report["added"][0]["filetype"], "md");

        let workspace = snapshot(&server).await;
        assert_eq!(workspace["library"][0]["name"], "Uploads");

        let results: Value = server
            .get("/api/v1/search")
            .add_query_param("q", "STRIPES")
            .await
            .json();
        assert_eq!(results[0]["source"], "library");
        assert_eq!(results[0]["parent_id"], workspace["library"][0]["id"]);
    }

    #[tokio::test]
    async fn upload_to_an_unknown_folder_is_not_found() {
        let server = setup();

        server
            .post("/api/v1/library/upload")
            .json(&json!({ "folder_id": uuid::Uuid::new_v4(), "files": [] }))
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn copies_files_into_context() {
        let server = setup();
        let report: Value = server
            .post("/api/v1/library/upload")
            .json(&json!({ "files": [{ "filename": "notes.txt", "content": "Notes" }] }))
            .await
            .json();
        let file_id = report["added"][0]["id"].clone();

        let response = server
            .post("/api/v1/context")
            .json(&json!({ "library_file_id": file_id }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let context: ContextFile = response.json();
        assert_eq!(context.filename, "notes.txt");

        server
            .delete(&format!("/api/v1/context/{}", context.id))
            .await
            .assert_status(StatusCode::NO_CONTENT);
    }
}

mod search {
    use super::*;

    #[tokio::test]
    async fn empty_query_returns_nothing() {
        let server = setup();
        set_active_content(&server, "<p>Anything</p>").await;

        let results: Vec<Value> = server.get("/api/v1/search").await.json();

        assert!(results.is_empty());
    }
}

mod export {
    use super::*;

    #[tokio::test]
    async fn exports_markdown_with_a_download_name() {
        let server = setup();
        set_active_content(&server, "<h1>Title</h1><p>Body</p>").await;

        let response = server.get("/api/v1/export/md").await;

        response.assert_status_ok();
        assert_eq!(response.text(), "# Title\nBody\n\n");
        assert_eq!(response.header("content-type"), "text/markdown");
        assert_eq!(
            response.header("content-disposition"),
            "attachment; filename=\"Untitled.md\""
        );
    }

    #[tokio::test]
    async fn sanitizes_the_download_name() {
        let server = setup();
        let id = set_active_content(&server, "<p>Body</p>").await;
        server
            .put(&format!("/api/v1/tabs/{}", id))
            .json(&json!({ "title": "Say \"hi\"\u{7}" }))
            .await
            .assert_status_ok();

        let response = server.get("/api/v1/export/md").await;

        response.assert_status_ok();
        assert_eq!(
            response.header("content-disposition"),
            "attachment; filename=\"Say _hi__.md\""
        );
    }

    #[tokio::test]
    async fn exports_plain_text() {
        let server = setup();
        set_active_content(&server, "<p>Hello <b>World</b></p>").await;

        let response = server.get("/api/v1/export/txt").await;

        assert_eq!(response.text(), "Hello World");
    }

    #[tokio::test]
    async fn rejects_unknown_formats() {
        let server = setup();

        server
            .get("/api/v1/export/pdf")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}

mod ai_features {
    use super::*;

    #[tokio::test]
    async fn seeds_require_a_key() {
        let server = setup();

        server
            .post("/api/v1/seeds")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn seeds_replace_the_current_set() {
        let server = setup_with(Some(r#"[{"type":"extend","preview":"Go further","filename":"plan.md"}]"#));
        set_active_content(&server, "<p>A draft</p>").await;

        let seeds: Vec<Seed> = server.post("/api/v1/seeds").await.json();

        assert_eq!(seeds.len(), 1);
        assert_eq!(seeds[0].seed_type, SeedType::Extend);
        assert_eq!(snapshot(&server).await["seeds"][0]["type"], "extend");
    }

    #[tokio::test]
    async fn framework_result_replaces_the_selection() {
        let server = setup_with(Some("Automobiles"));
        let id = set_active_content(&server, "<p>Cars are fast</p>").await;
        let framework_id = snapshot(&server).await["frameworks"][0]["id"].clone();

        let response: Value = server
            .post("/api/v1/transform/framework")
            .json(&json!({ "id": framework_id, "selection": "Cars" }))
            .await
            .json();

        assert_eq!(response["result"], "Automobiles");
        assert_eq!(response["applied"], true);
        let workspace = snapshot(&server).await;
        let tab = workspace["tabs"]
            .as_array()
            .expect("tabs")
            .iter()
            .find(|t| t["id"] == id.as_str())
            .cloned()
            .expect("tab");
        assert_eq!(tab["content"], "<p>Automobiles are fast</p>");
    }

    #[tokio::test]
    async fn unknown_style_is_not_found() {
        let server = setup_with(Some("ok"));

        server
            .post("/api/v1/transform/style")
            .json(&json!({ "id": uuid::Uuid::new_v4(), "selection": "x" }))
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn ghost_starts_idle_and_tab_inserts_nothing() {
        let server = setup();

        let state: Value = server.get("/api/v1/ghost").await.json();
        assert_eq!(state["state"], "idle");

        let accepted: Value = server
            .post("/api/v1/ghost/accept")
            .json(&json!({ "key": "Tab", "editor_focused": true }))
            .await
            .json();
        assert!(accepted["inserted"].is_null());
    }

    #[tokio::test]
    async fn stores_ai_settings() {
        let server = setup();

        server
            .put("/api/v1/config/ai")
            .json(&json!({ "api_key": "sk-test", "model": "claude-3-haiku-20240307" }))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        assert_eq!(snapshot(&server).await["ai_configured"], true);
    }
}
