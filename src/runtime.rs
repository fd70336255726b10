//! Single-writer event loop owning the workspace and the ghost pipeline.
//!
//! Input handlers, the debounce timer and in-flight AI requests all report
//! back through one channel of [`Event`]s. [`Runtime::dispatch`] applies one
//! event at a time, so a completion that arrives late re-validates its
//! generation against whatever happened in between.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver};
use uuid::Uuid;

use crate::ai::{AiClient, AiError, Completer};
use crate::config::effective_ai_config;
use crate::export::{export_tab, Export, ExportFormat};
use crate::ghost::{GhostPipeline, GhostState, KeyPress};
use crate::models::{AiConfig, RoleDefinition};
use crate::workspace::Workspace;

/// The closed set of events the runtime reacts to.
#[derive(Debug)]
pub enum Event {
    /// The editor reported new markup for a tab.
    EditorChanged { tab_id: Uuid, content: String },
    /// The user closed a tab.
    TabClosed { tab_id: Uuid },
    /// A key press while the editor surface is mounted.
    KeyPressed(KeyPress),
    /// The ghost-text debounce timer for `generation` expired.
    TimerFired { generation: u64 },
    /// A ghost-text completion for `generation` finished.
    SuggestionArrived {
        generation: u64,
        result: Result<String, AiError>,
    },
}

/// What a dispatched event produced, for callers that need to react.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    None,
    /// Ghost text was accepted and inserted into the active tab.
    Inserted(String),
}

/// Builds the completer used for AI calls from the current settings.
pub type CompleterFactory = Arc<dyn Fn(&AiConfig, &RoleDefinition) -> Arc<dyn Completer> + Send + Sync>;

pub struct Runtime {
    workspace: Workspace,
    ghost: GhostPipeline,
    completer: Arc<dyn Completer>,
    factory: CompleterFactory,
    receiver: Option<UnboundedReceiver<Event>>,
}

impl Runtime {
    /// A runtime whose AI calls go through [`AiClient`].
    pub fn new(workspace: Workspace, ghost_delay: Duration) -> Self {
        Self::with_factory(workspace, ghost_delay, Arc::new(default_completer))
    }

    pub fn with_factory(workspace: Workspace, ghost_delay: Duration, factory: CompleterFactory) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let completer = factory(workspace.ai_config(), workspace.role_definition());
        let ghost = GhostPipeline::new(Arc::clone(&completer), sender, ghost_delay);
        Self {
            workspace,
            ghost,
            completer,
            factory,
            receiver: Some(receiver),
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Direct access for mutations that don't involve the ghost pipeline.
    pub fn workspace_mut(&mut self) -> &mut Workspace {
        &mut self.workspace
    }

    pub fn ghost_state(&self) -> &GhostState {
        self.ghost.state()
    }

    // ============================================================
    // Dispatch
    // ============================================================

    pub fn dispatch(&mut self, event: Event) -> Outcome {
        match event {
            Event::EditorChanged { tab_id, content } => {
                if !self.workspace.update_tab_content(tab_id, content) {
                    tracing::debug!("Editor update for unknown tab {}", tab_id);
                    return Outcome::None;
                }
                if self.workspace.active_tab_id() == Some(tab_id) {
                    let text = self.workspace.active_plain_text();
                    self.ghost.on_edit(&text);
                } else {
                    self.ghost.clear();
                }
            }
            Event::TabClosed { tab_id } => {
                let was_active = self.workspace.active_tab_id() == Some(tab_id);
                if self.workspace.close_tab(tab_id) && was_active {
                    self.ghost.clear();
                }
            }
            Event::KeyPressed(key) => {
                if let Some(text) = self.ghost.accept(&key) {
                    self.workspace.append_to_active_tab(&text);
                    return Outcome::Inserted(text);
                }
            }
            Event::TimerFired { generation } => self.ghost.on_timer(generation),
            Event::SuggestionArrived { generation, result } => {
                self.ghost.on_suggestion(generation, result)
            }
        }
        Outcome::None
    }

    /// Wait for the next queued event and dispatch it.
    pub async fn step(&mut self) -> Outcome {
        let Some(receiver) = self.receiver.as_mut() else {
            return Outcome::None;
        };
        match receiver.recv().await {
            Some(event) => self.dispatch(event),
            None => Outcome::None,
        }
    }

    /// Dispatch events for as long as the runtime owns its queue.
    pub async fn run(&mut self) {
        while let Some(receiver) = self.receiver.as_mut() {
            let Some(event) = receiver.recv().await else {
                break;
            };
            self.dispatch(event);
        }
    }

    /// Hand the event queue to an external pump, e.g. when the runtime lives
    /// behind a lock and can't await its own receiver.
    pub fn detach_events(&mut self) -> Option<UnboundedReceiver<Event>> {
        self.receiver.take()
    }

    // ============================================================
    // Mutations that can move the active tab
    // ============================================================

    pub fn activate_tab(&mut self, id: Uuid) -> bool {
        self.update_workspace(|ws| ws.set_active_tab(id))
    }

    pub fn delete_page(&mut self, id: Uuid) -> bool {
        self.update_workspace(|ws| ws.delete_page(id))
    }

    /// Replace the first occurrence of `selection` in the active tab.
    pub fn replace_selection(&mut self, selection: &str, replacement: &str) -> bool {
        let replaced = self.workspace.replace_in_active_tab(selection, replacement);
        if replaced {
            self.ghost.clear();
        }
        replaced
    }

    /// Run a workspace mutation and drop ghost text if the active tab changed.
    pub fn update_workspace<R>(&mut self, f: impl FnOnce(&mut Workspace) -> R) -> R {
        let before = self.workspace.active_tab_id();
        let result = f(&mut self.workspace);
        if self.workspace.active_tab_id() != before {
            self.ghost.clear();
        }
        result
    }

    // ============================================================
    // AI operations
    // ============================================================

    /// Apply new AI settings and rebuild the completer.
    pub fn set_ai_config(&mut self, config: AiConfig) {
        self.workspace.set_ai_config(config);
        self.rebuild_completer();
    }

    pub fn set_role_definition(&mut self, role: RoleDefinition) {
        self.workspace.set_role_definition(role);
        self.rebuild_completer();
    }

    fn rebuild_completer(&mut self) {
        self.completer = (self.factory)(self.workspace.ai_config(), self.workspace.role_definition());
        self.ghost.set_completer(Arc::clone(&self.completer));
    }

    pub fn completer(&self) -> Arc<dyn Completer> {
        Arc::clone(&self.completer)
    }

    pub fn export_active(&self, format: ExportFormat) -> Option<Export> {
        self.workspace.active_tab().map(|tab| export_tab(tab, format))
    }
}

/// [`AiClient`] built from the stored settings, falling back to the
/// environment key when none is stored.
pub fn default_completer(config: &AiConfig, role: &RoleDefinition) -> Arc<dyn Completer> {
    Arc::new(AiClient::new(effective_ai_config(config)).with_default_system(role.thesis.clone()))
}
