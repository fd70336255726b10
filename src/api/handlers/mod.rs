use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AppState;
use crate::ai::AiError;
use crate::export::ExportFormat;
use crate::ghost::{GhostState, KeyPress};
use crate::models::*;
use crate::runtime::{Event, Outcome};
use crate::search::SearchResult;
use crate::workspace::{
    CreateFrameworkInput, StyleInput, UiState, UploadError, UploadReport, UploadSource,
    WorkspaceSnapshot,
};
use crate::{seeds, transform};

// ============================================================
// Error Handling
// ============================================================

/// Log an internal error and return a sanitized response to the client.
fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    tracing::error!("Internal error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

/// Missing credentials are the caller's to fix; anything else is upstream.
fn ai_error(e: AiError) -> (StatusCode, String) {
    match e {
        AiError::Config => (StatusCode::BAD_REQUEST, e.to_string()),
        e => {
            tracing::warn!("AI operation failed: {}", e);
            (StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}

fn not_found(what: &str) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("{} not found", what))
}

// ============================================================
// Request / response bodies
// ============================================================

#[derive(Debug, Default, Deserialize)]
pub struct CreateTabInput {
    #[serde(default)]
    pub page_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTabInput {
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NameInput {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ProjectInput {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct UploadFileInput {
    pub filename: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct UploadInput {
    #[serde(default)]
    pub folder_id: Option<Uuid>,
    pub files: Vec<UploadFileInput>,
}

#[derive(Debug, Deserialize)]
pub struct AddContextInput {
    pub library_file_id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct TransformInput {
    pub id: Uuid,
    pub selection: String,
}

#[derive(Debug, Serialize)]
pub struct TransformResponse {
    pub result: String,
    /// Whether the selection was found and replaced in the active tab.
    pub applied: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UiInput {
    pub left_sidebar: Option<LeftSidebarTab>,
    pub right_sidebar: Option<RightSidebarTab>,
    pub framework_search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AcceptResponse {
    pub inserted: Option<String>,
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Workspace
// ============================================================

pub async fn get_workspace(State(state): State<AppState>) -> Json<WorkspaceSnapshot> {
    Json(state.runtime.lock().await.workspace().snapshot())
}

pub async fn update_project(
    State(state): State<AppState>,
    Json(input): Json<ProjectInput>,
) -> StatusCode {
    state
        .runtime
        .lock()
        .await
        .workspace_mut()
        .set_project_title(input.title);
    StatusCode::NO_CONTENT
}

pub async fn update_ui(
    State(state): State<AppState>,
    Json(input): Json<UiInput>,
) -> Json<UiState> {
    let mut runtime = state.runtime.lock().await;
    let workspace = runtime.workspace_mut();
    if let Some(tab) = input.left_sidebar {
        workspace.set_left_sidebar_tab(tab);
    }
    if let Some(tab) = input.right_sidebar {
        workspace.set_right_sidebar_tab(tab);
    }
    if let Some(query) = input.framework_search {
        workspace.set_framework_search(query);
    }
    Json(workspace.ui().clone())
}

// ============================================================
// Tabs
// ============================================================

pub async fn create_tab(
    State(state): State<AppState>,
    Json(input): Json<CreateTabInput>,
) -> Result<(StatusCode, Json<DocumentTab>), (StatusCode, String)> {
    let mut runtime = state.runtime.lock().await;
    let tab = match input.page_id {
        Some(page_id) => runtime
            .update_workspace(|ws| ws.add_document_to_page(page_id))
            .ok_or_else(|| not_found("Page"))?,
        None => runtime.update_workspace(|ws| ws.add_tab(None)),
    };
    Ok((StatusCode::CREATED, Json(tab)))
}

pub async fn update_tab(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateTabInput>,
) -> Result<Json<DocumentTab>, (StatusCode, String)> {
    let mut runtime = state.runtime.lock().await;
    if runtime.workspace().tab(id).is_none() {
        return Err(not_found("Tab"));
    }

    if let Some(title) = input.title {
        runtime.workspace_mut().update_tab_title(id, title);
    }
    if let Some(content) = input.content {
        runtime.dispatch(Event::EditorChanged { tab_id: id, content });
    }

    runtime
        .workspace()
        .tab(id)
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found("Tab"))
}

pub async fn close_tab(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let mut runtime = state.runtime.lock().await;
    if runtime.workspace().tab(id).is_none() {
        return Err(not_found("Tab"));
    }
    runtime.dispatch(Event::TabClosed { tab_id: id });
    Ok(StatusCode::NO_CONTENT)
}

pub async fn activate_tab(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state.runtime.lock().await.activate_tab(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Tab"))
    }
}

// ============================================================
// Pages
// ============================================================

pub async fn create_page(
    State(state): State<AppState>,
    Json(input): Json<NameInput>,
) -> (StatusCode, Json<Page>) {
    let page = state
        .runtime
        .lock()
        .await
        .workspace_mut()
        .create_page(input.name);
    (StatusCode::CREATED, Json(page))
}

pub async fn rename_page(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<NameInput>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state
        .runtime
        .lock()
        .await
        .workspace_mut()
        .rename_page(id, input.name)
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Page"))
    }
}

pub async fn toggle_page(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state
        .runtime
        .lock()
        .await
        .workspace_mut()
        .toggle_page_expanded(id)
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Page"))
    }
}

pub async fn delete_page(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state.runtime.lock().await.delete_page(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Page"))
    }
}

pub async fn add_page_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<DocumentTab>), (StatusCode, String)> {
    state
        .runtime
        .lock()
        .await
        .update_workspace(|ws| ws.add_document_to_page(id))
        .map(|tab| (StatusCode::CREATED, Json(tab)))
        .ok_or_else(|| not_found("Page"))
}

// ============================================================
// Library
// ============================================================

pub async fn create_folder(
    State(state): State<AppState>,
    Json(input): Json<NameInput>,
) -> (StatusCode, Json<LibraryFolder>) {
    let folder = state
        .runtime
        .lock()
        .await
        .workspace_mut()
        .create_folder(input.name);
    (StatusCode::CREATED, Json(folder))
}

pub async fn rename_folder(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<NameInput>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state
        .runtime
        .lock()
        .await
        .workspace_mut()
        .rename_folder(id, input.name)
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Folder"))
    }
}

pub async fn toggle_folder(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state
        .runtime
        .lock()
        .await
        .workspace_mut()
        .toggle_folder_expanded(id)
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Folder"))
    }
}

pub async fn delete_folder(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state.runtime.lock().await.workspace_mut().delete_folder(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Folder"))
    }
}

pub async fn upload_files(
    State(state): State<AppState>,
    Json(input): Json<UploadInput>,
) -> Result<(StatusCode, Json<UploadReport>), (StatusCode, String)> {
    let sources = input
        .files
        .into_iter()
        .map(|f| UploadSource::Bytes {
            filename: f.filename,
            bytes: f.content.into_bytes(),
        })
        .collect();

    let mut runtime = state.runtime.lock().await;
    match runtime
        .workspace_mut()
        .upload_files(sources, input.folder_id)
        .await
    {
        Ok(report) => Ok((StatusCode::CREATED, Json(report))),
        Err(UploadError::FolderNotFound(_)) => Err(not_found("Folder")),
        Err(e) => Err(internal_error(e)),
    }
}

pub async fn delete_library_file(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state
        .runtime
        .lock()
        .await
        .workspace_mut()
        .delete_library_file(id)
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("File"))
    }
}

// ============================================================
// Context
// ============================================================

pub async fn add_context(
    State(state): State<AppState>,
    Json(input): Json<AddContextInput>,
) -> Result<(StatusCode, Json<ContextFile>), (StatusCode, String)> {
    state
        .runtime
        .lock()
        .await
        .workspace_mut()
        .add_context_from_library(input.library_file_id)
        .map(|f| (StatusCode::CREATED, Json(f)))
        .ok_or_else(|| not_found("Library file"))
}

pub async fn remove_context(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state
        .runtime
        .lock()
        .await
        .workspace_mut()
        .remove_context_file(id)
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Context file"))
    }
}

// ============================================================
// Search and export
// ============================================================

pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<SearchResult>> {
    let mut runtime = state.runtime.lock().await;
    Json(runtime.workspace_mut().set_search_query(query.q).to_vec())
}

pub async fn export(
    State(state): State<AppState>,
    Path(format): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let format = ExportFormat::from_str(&format).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            format!("Unsupported export format: {}", format),
        )
    })?;

    let export = state
        .runtime
        .lock()
        .await
        .export_active(format)
        .ok_or_else(|| not_found("Active tab"))?;

    Ok((
        [
            (header::CONTENT_TYPE, export.mime),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export.filename),
            ),
        ],
        export.body,
    ))
}

// ============================================================
// AI features
// ============================================================

// The runtime lock is released while a request is in flight so edits and
// ghost-text events keep flowing.

pub async fn generate_seeds(
    State(state): State<AppState>,
) -> Result<Json<Vec<Seed>>, (StatusCode, String)> {
    let (completer, text, context) = {
        let runtime = state.runtime.lock().await;
        let workspace = runtime.workspace();
        (
            runtime.completer(),
            workspace.active_plain_text(),
            workspace.context_files().to_vec(),
        )
    };

    let seeds = seeds::generate_seeds(completer.as_ref(), &text, &context)
        .await
        .map_err(ai_error)?;

    state
        .runtime
        .lock()
        .await
        .workspace_mut()
        .replace_seeds(seeds.clone());
    Ok(Json(seeds))
}

pub async fn apply_framework(
    State(state): State<AppState>,
    Json(input): Json<TransformInput>,
) -> Result<Json<TransformResponse>, (StatusCode, String)> {
    let (completer, framework) = {
        let runtime = state.runtime.lock().await;
        let framework = runtime
            .workspace()
            .framework(input.id)
            .cloned()
            .ok_or_else(|| not_found("Framework"))?;
        (runtime.completer(), framework)
    };

    let result = transform::apply_framework(completer.as_ref(), &framework, &input.selection)
        .await
        .map_err(ai_error)?;

    let applied = state
        .runtime
        .lock()
        .await
        .replace_selection(&input.selection, &result);
    Ok(Json(TransformResponse { result, applied }))
}

pub async fn apply_style(
    State(state): State<AppState>,
    Json(input): Json<TransformInput>,
) -> Result<Json<TransformResponse>, (StatusCode, String)> {
    let (completer, style) = {
        let runtime = state.runtime.lock().await;
        let style = runtime
            .workspace()
            .style(input.id)
            .cloned()
            .ok_or_else(|| not_found("Style"))?;
        (runtime.completer(), style)
    };

    let result = transform::apply_style(completer.as_ref(), &style, &input.selection)
        .await
        .map_err(ai_error)?;

    let applied = state
        .runtime
        .lock()
        .await
        .replace_selection(&input.selection, &result);
    Ok(Json(TransformResponse { result, applied }))
}

pub async fn get_ghost(State(state): State<AppState>) -> Json<GhostState> {
    Json(state.runtime.lock().await.ghost_state().clone())
}

pub async fn accept_ghost(
    State(state): State<AppState>,
    Json(key): Json<KeyPress>,
) -> Json<AcceptResponse> {
    let outcome = state.runtime.lock().await.dispatch(Event::KeyPressed(key));
    let inserted = match outcome {
        Outcome::Inserted(text) => Some(text),
        Outcome::None => None,
    };
    Json(AcceptResponse { inserted })
}

// ============================================================
// Catalogs and settings
// ============================================================

/// Frameworks matching the current framework search.
pub async fn list_frameworks(State(state): State<AppState>) -> Json<Vec<Framework>> {
    let runtime = state.runtime.lock().await;
    let frameworks = runtime
        .workspace()
        .filtered_frameworks()
        .into_iter()
        .cloned()
        .collect();
    Json(frameworks)
}

pub async fn create_framework(
    State(state): State<AppState>,
    Json(input): Json<CreateFrameworkInput>,
) -> Result<(StatusCode, Json<Framework>), (StatusCode, String)> {
    if input.name.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Framework name is required".to_string()));
    }
    let framework = state
        .runtime
        .lock()
        .await
        .workspace_mut()
        .add_framework(input);
    Ok((StatusCode::CREATED, Json(framework)))
}

pub async fn delete_framework(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state.runtime.lock().await.workspace_mut().remove_framework(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Framework"))
    }
}

pub async fn create_style(
    State(state): State<AppState>,
    Json(input): Json<StyleInput>,
) -> (StatusCode, Json<Style>) {
    let style = state.runtime.lock().await.workspace_mut().add_style(input);
    (StatusCode::CREATED, Json(style))
}

pub async fn update_style(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<StyleInput>,
) -> Result<Json<Style>, (StatusCode, String)> {
    state
        .runtime
        .lock()
        .await
        .workspace_mut()
        .update_style(id, input)
        .map(Json)
        .ok_or_else(|| not_found("Style"))
}

pub async fn delete_style(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state.runtime.lock().await.workspace_mut().remove_style(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Style"))
    }
}

pub async fn update_role(
    State(state): State<AppState>,
    Json(role): Json<RoleDefinition>,
) -> StatusCode {
    state.runtime.lock().await.set_role_definition(role);
    StatusCode::NO_CONTENT
}

pub async fn update_ai_config(
    State(state): State<AppState>,
    Json(config): Json<AiConfig>,
) -> StatusCode {
    state.runtime.lock().await.set_ai_config(config);
    StatusCode::NO_CONTENT
}
