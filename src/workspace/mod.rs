//! In-memory session state for the writing workspace.
//!
//! [`Workspace`] exclusively owns the tabs, pages, library, context files and
//! catalogs. Every committed mutation writes the affected collection through
//! to the [`Store`] and recomputes the derived headings and search results.

mod upload;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{effective_ai_config, UploadFallback};
use crate::markup::{escape_text, extract_headings, to_plain_text};
use crate::models::*;
use crate::search::{search, SearchResult, SearchScope};
use crate::store::{Store, StoreKey};

pub use upload::{UploadError, UploadFailure, UploadReport, UploadSource};

/// Project title used until the user sets one.
pub const DEFAULT_PROJECT_TITLE: &str = "Untitled Project";

/// Transient UI selections. Not persisted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UiState {
    pub left_sidebar: LeftSidebarTab,
    pub right_sidebar: RightSidebarTab,
    pub framework_search: String,
}

/// Serializable view of the whole workspace, as sent to the front-end.
#[derive(Debug, Clone, Serialize)]
pub struct WorkspaceSnapshot {
    pub project_title: String,
    pub tabs: Vec<DocumentTab>,
    pub active_tab_id: Option<Uuid>,
    pub pages: Vec<Page>,
    pub library: Vec<LibraryFolder>,
    pub context_files: Vec<ContextFile>,
    pub headings: Vec<Heading>,
    pub seeds: Vec<Seed>,
    pub frameworks: Vec<Framework>,
    pub styles: Vec<Style>,
    pub role_definition: RoleDefinition,
    pub ui: UiState,
    pub search_query: String,
    pub search_results: Vec<SearchResult>,
    pub ai_configured: bool,
}

/// Input for adding a framework to the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFrameworkInput {
    pub name: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Input for adding or editing a style. All fields optional on update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StyleInput {
    pub author_name: Option<String>,
    pub preview: Option<String>,
    pub system_prompt: Option<String>,
}

pub struct Workspace {
    store: Store,
    upload_fallback: UploadFallback,

    tabs: Vec<DocumentTab>,
    pages: Vec<Page>,
    library: Vec<LibraryFolder>,
    context_files: Vec<ContextFile>,
    project_title: String,
    role: RoleDefinition,
    frameworks: Vec<Framework>,
    styles: Vec<Style>,
    ai_config: AiConfig,

    seeds: Vec<Seed>,
    headings: Vec<Heading>,
    ui: UiState,
    search_query: String,
    search_results: Vec<SearchResult>,
}

impl Workspace {
    /// Read every collection from the store once, substituting defaults for
    /// anything missing or malformed.
    pub fn load(store: Store, upload_fallback: UploadFallback) -> Self {
        let mut tabs: Vec<DocumentTab> = store.load_or_else(StoreKey::Tabs, Vec::new);
        if tabs.is_empty() {
            tabs.push(DocumentTab::untitled(None));
        }
        normalize_active(&mut tabs);

        let project_title = store
            .load_text(StoreKey::ProjectTitle)
            .unwrap_or_else(|| DEFAULT_PROJECT_TITLE.to_string());

        let mut workspace = Self {
            pages: store.load_or_else(StoreKey::Pages, Vec::new),
            library: store.load_or_else(StoreKey::LibraryFolders, Vec::new),
            context_files: store.load_or_else(StoreKey::ContextFiles, Vec::new),
            role: store.load_or_else(StoreKey::RoleDefinition, RoleDefinition::default),
            frameworks: store.load_or_else(StoreKey::Frameworks, builtin_frameworks),
            styles: store.load_or_else(StoreKey::Styles, Vec::new),
            ai_config: store.load_or_else(StoreKey::AiConfig, AiConfig::default),
            project_title,
            tabs,
            store,
            upload_fallback,
            seeds: Vec::new(),
            headings: Vec::new(),
            ui: UiState::default(),
            search_query: String::new(),
            search_results: Vec::new(),
        };
        workspace.refresh_derived();

        tracing::info!(
            "Loaded workspace: {} tabs, {} pages, {} library folders",
            workspace.tabs.len(),
            workspace.pages.len(),
            workspace.library.len()
        );
        workspace
    }

    fn persist(&self, key: StoreKey) {
        match key {
            StoreKey::Tabs => self.store.save(key, &self.tabs),
            StoreKey::Pages => self.store.save(key, &self.pages),
            StoreKey::ContextFiles => self.store.save(key, &self.context_files),
            StoreKey::LibraryFolders => self.store.save(key, &self.library),
            StoreKey::ProjectTitle => self.store.save_text(key, &self.project_title),
            StoreKey::RoleDefinition => self.store.save(key, &self.role),
            StoreKey::Frameworks => self.store.save(key, &self.frameworks),
            StoreKey::Styles => self.store.save(key, &self.styles),
            StoreKey::AiConfig => self.store.save(key, &self.ai_config),
        }
    }

    /// Regenerate headings from the active tab and rerun the current search.
    fn refresh_derived(&mut self) {
        self.headings = self
            .active_tab()
            .map(|tab| extract_headings(&tab.content))
            .unwrap_or_default();
        self.reindex();
    }

    fn reindex(&mut self) {
        self.search_results = search(
            &self.search_query,
            &SearchScope {
                tabs: &self.tabs,
                context_files: &self.context_files,
                library: &self.library,
                headings: &self.headings,
            },
        );
    }

    // ============================================================
    // Accessors
    // ============================================================

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn tabs(&self) -> &[DocumentTab] {
        &self.tabs
    }

    pub fn tab(&self, id: Uuid) -> Option<&DocumentTab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    pub fn active_tab(&self) -> Option<&DocumentTab> {
        self.tabs.iter().find(|t| t.is_active)
    }

    pub fn active_tab_id(&self) -> Option<Uuid> {
        self.active_tab().map(|t| t.id)
    }

    /// Plain text of the active tab, one line per block.
    pub fn active_plain_text(&self) -> String {
        self.active_tab()
            .map(|t| to_plain_text(&t.content))
            .unwrap_or_default()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page(&self, id: Uuid) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == id)
    }

    pub fn library(&self) -> &[LibraryFolder] {
        &self.library
    }

    pub fn context_files(&self) -> &[ContextFile] {
        &self.context_files
    }

    pub fn project_title(&self) -> &str {
        &self.project_title
    }

    pub fn role_definition(&self) -> &RoleDefinition {
        &self.role
    }

    pub fn frameworks(&self) -> &[Framework] {
        &self.frameworks
    }

    pub fn framework(&self, id: Uuid) -> Option<&Framework> {
        self.frameworks.iter().find(|f| f.id == id)
    }

    /// Frameworks matching the framework search box.
    pub fn filtered_frameworks(&self) -> Vec<&Framework> {
        let needle = self.ui.framework_search.trim().to_lowercase();
        self.frameworks.iter().filter(|f| f.matches(&needle)).collect()
    }

    pub fn styles(&self) -> &[Style] {
        &self.styles
    }

    pub fn style(&self, id: Uuid) -> Option<&Style> {
        self.styles.iter().find(|s| s.id == id)
    }

    pub fn ai_config(&self) -> &AiConfig {
        &self.ai_config
    }

    pub fn seeds(&self) -> &[Seed] {
        &self.seeds
    }

    pub fn headings(&self) -> &[Heading] {
        &self.headings
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn search_results(&self) -> &[SearchResult] {
        &self.search_results
    }

    pub fn snapshot(&self) -> WorkspaceSnapshot {
        WorkspaceSnapshot {
            project_title: self.project_title.clone(),
            tabs: self.tabs.clone(),
            active_tab_id: self.active_tab_id(),
            pages: self.pages.clone(),
            library: self.library.clone(),
            context_files: self.context_files.clone(),
            headings: self.headings.clone(),
            seeds: self.seeds.clone(),
            frameworks: self.frameworks.clone(),
            styles: self.styles.clone(),
            role_definition: self.role.clone(),
            ui: self.ui.clone(),
            search_query: self.search_query.clone(),
            search_results: self.search_results.clone(),
            ai_configured: effective_ai_config(&self.ai_config).has_key(),
        }
    }

    // ============================================================
    // Tab operations
    // ============================================================

    /// Make `id` the only active tab. Returns false for unknown ids.
    pub fn set_active_tab(&mut self, id: Uuid) -> bool {
        if self.tab(id).is_none() {
            return false;
        }
        for tab in &mut self.tabs {
            tab.is_active = tab.id == id;
        }
        self.persist(StoreKey::Tabs);
        self.refresh_derived();
        true
    }

    /// Append a new active "Untitled" tab.
    ///
    /// With a `page_id` the tab records its page, but registering the
    /// [`PageDocument`] is up to the caller (see [`Self::add_document_to_page`]).
    pub fn add_tab(&mut self, page_id: Option<Uuid>) -> DocumentTab {
        let tab = DocumentTab::untitled(page_id);
        for existing in &mut self.tabs {
            existing.is_active = false;
        }
        self.tabs.push(tab.clone());
        self.persist(StoreKey::Tabs);
        self.refresh_derived();
        tracing::debug!("Added tab {}", tab.id);
        tab
    }

    /// Close a tab. The tab list is never left empty, and closing the active
    /// tab activates whichever tab slides into its index (or the new last tab).
    pub fn close_tab(&mut self, id: Uuid) -> bool {
        let Some(index) = self.tabs.iter().position(|t| t.id == id) else {
            return false;
        };
        let removed = self.tabs.remove(index);

        if self.tabs.is_empty() {
            self.tabs.push(DocumentTab::untitled(None));
        } else if removed.is_active {
            let next = index.min(self.tabs.len() - 1);
            self.tabs[next].is_active = true;
        }

        let mut pages_changed = false;
        for page in &mut self.pages {
            let before = page.documents.len();
            page.documents.retain(|d| d.tab_id != id);
            pages_changed |= page.documents.len() != before;
        }

        self.persist(StoreKey::Tabs);
        if pages_changed {
            self.persist(StoreKey::Pages);
        }
        self.refresh_derived();
        tracing::debug!("Closed tab {}", id);
        true
    }

    /// Rename a tab and any page entry pointing at it.
    pub fn update_tab_title(&mut self, id: Uuid, title: impl Into<String>) -> bool {
        let title = title.into();
        let Some(tab) = self.tabs.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        tab.title = title.clone();

        let mut pages_changed = false;
        for doc in self.pages.iter_mut().flat_map(|p| p.documents.iter_mut()) {
            if doc.tab_id == id {
                doc.name = title.clone();
                pages_changed = true;
            }
        }

        self.persist(StoreKey::Tabs);
        if pages_changed {
            self.persist(StoreKey::Pages);
        }
        self.reindex();
        true
    }

    pub fn update_tab_content(&mut self, id: Uuid, content: impl Into<String>) -> bool {
        let Some(tab) = self.tabs.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        tab.content = content.into();
        self.persist(StoreKey::Tabs);
        self.refresh_derived();
        true
    }

    /// Replace the first occurrence of `selection` in the active tab with
    /// plain text, escaped for the editor markup.
    pub fn replace_in_active_tab(&mut self, selection: &str, replacement: &str) -> bool {
        if selection.is_empty() {
            return false;
        }
        let Some(tab) = self.tabs.iter_mut().find(|t| t.is_active) else {
            return false;
        };
        let escaped = escape_text(selection);
        let target = if tab.content.contains(selection) {
            selection
        } else if tab.content.contains(escaped.as_str()) {
            escaped.as_str()
        } else {
            return false;
        };
        tab.content = tab.content.replacen(target, &escape_text(replacement), 1);
        self.persist(StoreKey::Tabs);
        self.refresh_derived();
        true
    }

    /// Insert plain text at the end of the active tab's last block.
    pub fn append_to_active_tab(&mut self, text: &str) -> bool {
        let Some(tab) = self.tabs.iter_mut().find(|t| t.is_active) else {
            return false;
        };
        let text = escape_text(text);
        match tab.content.rfind("</p>") {
            Some(pos) if tab.content[pos..].trim() == "</p>" => tab.content.insert_str(pos, &text),
            _ => tab.content.push_str(&text),
        }
        self.persist(StoreKey::Tabs);
        self.refresh_derived();
        true
    }

    // ============================================================
    // Page operations
    // ============================================================

    pub fn create_page(&mut self, name: impl Into<String>) -> Page {
        let page = Page::new(name);
        self.pages.push(page.clone());
        self.persist(StoreKey::Pages);
        page
    }

    pub fn rename_page(&mut self, id: Uuid, name: impl Into<String>) -> bool {
        let Some(page) = self.pages.iter_mut().find(|p| p.id == id) else {
            return false;
        };
        page.name = name.into();
        self.persist(StoreKey::Pages);
        true
    }

    pub fn toggle_page_expanded(&mut self, id: Uuid) -> bool {
        let Some(page) = self.pages.iter_mut().find(|p| p.id == id) else {
            return false;
        };
        page.is_expanded = !page.is_expanded;
        self.persist(StoreKey::Pages);
        true
    }

    /// Create a tab owned by `page_id` and register it on the page.
    pub fn add_document_to_page(&mut self, page_id: Uuid) -> Option<DocumentTab> {
        self.page(page_id)?;
        let tab = self.add_tab(Some(page_id));
        let page = self.pages.iter_mut().find(|p| p.id == page_id)?;
        page.documents.push(PageDocument {
            id: Uuid::new_v4(),
            name: tab.title.clone(),
            tab_id: tab.id,
        });
        page.is_expanded = true;
        self.persist(StoreKey::Pages);
        Some(tab)
    }

    /// Close every tab the page references, then remove the page.
    pub fn delete_page(&mut self, id: Uuid) -> bool {
        let Some(page) = self.page(id) else {
            return false;
        };
        let tab_ids: Vec<Uuid> = page.documents.iter().map(|d| d.tab_id).collect();
        for tab_id in tab_ids {
            self.close_tab(tab_id);
        }
        self.pages.retain(|p| p.id != id);
        self.persist(StoreKey::Pages);
        tracing::debug!("Deleted page {}", id);
        true
    }

    // ============================================================
    // Library operations
    // ============================================================

    pub fn create_folder(&mut self, name: impl Into<String>) -> LibraryFolder {
        let folder = LibraryFolder::new(name);
        self.library.push(folder.clone());
        self.persist(StoreKey::LibraryFolders);
        folder
    }

    pub fn rename_folder(&mut self, id: Uuid, name: impl Into<String>) -> bool {
        let Some(folder) = self.library.iter_mut().find(|f| f.id == id) else {
            return false;
        };
        folder.name = name.into();
        self.persist(StoreKey::LibraryFolders);
        true
    }

    pub fn toggle_folder_expanded(&mut self, id: Uuid) -> bool {
        let Some(folder) = self.library.iter_mut().find(|f| f.id == id) else {
            return false;
        };
        folder.is_expanded = !folder.is_expanded;
        self.persist(StoreKey::LibraryFolders);
        true
    }

    /// Remove a folder and its files. Context copies are unaffected.
    pub fn delete_folder(&mut self, id: Uuid) -> bool {
        let before = self.library.len();
        self.library.retain(|f| f.id != id);
        if self.library.len() == before {
            return false;
        }
        self.persist(StoreKey::LibraryFolders);
        self.reindex();
        true
    }

    pub fn library_file(&self, id: Uuid) -> Option<&LibraryFile> {
        self.library
            .iter()
            .flat_map(|f| f.files.iter())
            .find(|f| f.id == id)
    }

    pub fn add_library_file(&mut self, folder_id: Uuid, file: LibraryFile) -> bool {
        let Some(folder) = self.library.iter_mut().find(|f| f.id == folder_id) else {
            return false;
        };
        folder.files.push(file);
        self.persist(StoreKey::LibraryFolders);
        self.reindex();
        true
    }

    pub fn delete_library_file(&mut self, id: Uuid) -> bool {
        let mut removed = false;
        for folder in &mut self.library {
            let before = folder.files.len();
            folder.files.retain(|f| f.id != id);
            removed |= folder.files.len() != before;
        }
        if removed {
            self.persist(StoreKey::LibraryFolders);
            self.reindex();
        }
        removed
    }

    // ============================================================
    // Context operations
    // ============================================================

    /// Copy a library file into the context working set.
    pub fn add_context_from_library(&mut self, file_id: Uuid) -> Option<ContextFile> {
        let context = ContextFile::from(self.library_file(file_id)?);
        self.context_files.push(context.clone());
        self.persist(StoreKey::ContextFiles);
        self.reindex();
        Some(context)
    }

    pub fn remove_context_file(&mut self, id: Uuid) -> bool {
        let before = self.context_files.len();
        self.context_files.retain(|f| f.id != id);
        if self.context_files.len() == before {
            return false;
        }
        self.persist(StoreKey::ContextFiles);
        self.reindex();
        true
    }

    // ============================================================
    // Project, UI and search
    // ============================================================

    pub fn set_project_title(&mut self, title: impl Into<String>) {
        self.project_title = title.into();
        self.persist(StoreKey::ProjectTitle);
    }

    pub fn set_left_sidebar_tab(&mut self, tab: LeftSidebarTab) {
        self.ui.left_sidebar = tab;
    }

    pub fn set_right_sidebar_tab(&mut self, tab: RightSidebarTab) {
        self.ui.right_sidebar = tab;
    }

    pub fn set_framework_search(&mut self, query: impl Into<String>) {
        self.ui.framework_search = query.into();
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) -> &[SearchResult] {
        self.search_query = query.into();
        self.reindex();
        &self.search_results
    }

    // ============================================================
    // Catalogs and settings
    // ============================================================

    pub fn add_framework(&mut self, input: CreateFrameworkInput) -> Framework {
        let framework = Framework {
            id: Uuid::new_v4(),
            name: input.name,
            subtitle: input.subtitle,
            description: input.description,
            prompt: input.prompt,
        };
        self.frameworks.push(framework.clone());
        self.persist(StoreKey::Frameworks);
        framework
    }

    pub fn remove_framework(&mut self, id: Uuid) -> bool {
        let before = self.frameworks.len();
        self.frameworks.retain(|f| f.id != id);
        if self.frameworks.len() == before {
            return false;
        }
        self.persist(StoreKey::Frameworks);
        true
    }

    pub fn add_style(&mut self, input: StyleInput) -> Style {
        let style = Style {
            id: Uuid::new_v4(),
            author_name: input.author_name.unwrap_or_default(),
            preview: input.preview.unwrap_or_default(),
            system_prompt: input.system_prompt,
        };
        self.styles.push(style.clone());
        self.persist(StoreKey::Styles);
        style
    }

    pub fn update_style(&mut self, id: Uuid, input: StyleInput) -> Option<Style> {
        let style = self.styles.iter_mut().find(|s| s.id == id)?;
        if let Some(author_name) = input.author_name {
            style.author_name = author_name;
        }
        if let Some(preview) = input.preview {
            style.preview = preview;
        }
        if input.system_prompt.is_some() {
            style.system_prompt = input.system_prompt;
        }
        let updated = style.clone();
        self.persist(StoreKey::Styles);
        Some(updated)
    }

    pub fn remove_style(&mut self, id: Uuid) -> bool {
        let before = self.styles.len();
        self.styles.retain(|s| s.id != id);
        if self.styles.len() == before {
            return false;
        }
        self.persist(StoreKey::Styles);
        true
    }

    pub fn set_role_definition(&mut self, role: RoleDefinition) {
        self.role = role;
        self.persist(StoreKey::RoleDefinition);
    }

    pub fn set_ai_config(&mut self, config: AiConfig) {
        self.ai_config = config;
        self.persist(StoreKey::AiConfig);
    }

    /// Swap in a freshly generated seed set. Never merged with the old one.
    pub fn replace_seeds(&mut self, seeds: Vec<Seed>) {
        self.seeds = seeds;
    }
}

/// Leave exactly one active tab: the first flagged one, else the first tab.
fn normalize_active(tabs: &mut [DocumentTab]) {
    let active = tabs.iter().position(|t| t.is_active).unwrap_or(0);
    for (index, tab) in tabs.iter_mut().enumerate() {
        tab.is_active = index == active;
    }
}
