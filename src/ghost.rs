//! Debounced ghost-text suggestions.
//!
//! Every edit bumps a generation counter and aborts the pending timer. Only
//! the last edit in a burst survives the quiet period and triggers a
//! completion request; a result is applied only if its generation is still
//! current, so edits made while a request is in flight discard it.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::ai::{AiError, Completer, Message};
use crate::runtime::Event;

/// Quiet period between the last qualifying edit and the request.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(2000);

/// Plain-text length must be strictly between these bounds.
pub const MIN_TEXT_CHARS: usize = 20;
pub const MAX_TEXT_CHARS: usize = 5000;

/// Key that accepts a ready suggestion.
pub const ACCEPT_KEY: &str = "Tab";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GhostState {
    Idle,
    Pending,
    Ready { suggestion: String },
}

/// A key press reported by the editor surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPress {
    pub key: String,
    #[serde(default)]
    pub editor_focused: bool,
    #[serde(default)]
    pub shift: bool,
}

impl KeyPress {
    pub fn accepts_ghost_text(&self) -> bool {
        self.key == ACCEPT_KEY && self.editor_focused && !self.shift
    }
}

pub struct GhostPipeline {
    completer: Arc<dyn Completer>,
    events: UnboundedSender<Event>,
    delay: Duration,
    generation: u64,
    state: GhostState,
    timer: Option<JoinHandle<()>>,
    context: Option<String>,
}

impl GhostPipeline {
    pub fn new(completer: Arc<dyn Completer>, events: UnboundedSender<Event>, delay: Duration) -> Self {
        Self {
            completer,
            events,
            delay,
            generation: 0,
            state: GhostState::Idle,
            timer: None,
            context: None,
        }
    }

    /// Swap the completer, e.g. after the AI settings change. Clears any suggestion.
    pub fn set_completer(&mut self, completer: Arc<dyn Completer>) {
        self.completer = completer;
        self.clear();
    }

    pub fn state(&self) -> &GhostState {
        &self.state
    }

    pub fn suggestion(&self) -> Option<&str> {
        match &self.state {
            GhostState::Ready { suggestion } => Some(suggestion),
            _ => None,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Drop any pending or ready suggestion and invalidate in-flight results.
    pub fn clear(&mut self) {
        self.generation += 1;
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.state = GhostState::Idle;
        self.context = None;
    }

    /// React to an edit of the document whose plain text is `text`.
    pub fn on_edit(&mut self, text: &str) {
        self.clear();

        if !self.completer.is_configured() || !qualifies(text) {
            return;
        }
        let Some(paragraph) = last_paragraph(text) else {
            return;
        };

        let generation = self.generation;
        let delay = self.delay;
        let events = self.events.clone();
        self.context = Some(paragraph.to_string());
        self.state = GhostState::Pending;
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(Event::TimerFired { generation });
        }));
        tracing::debug!("Ghost text scheduled (generation {})", generation);
    }

    /// The debounce timer for `generation` expired.
    pub fn on_timer(&mut self, generation: u64) {
        if generation != self.generation || self.state != GhostState::Pending {
            tracing::debug!("Ignoring stale ghost timer (generation {})", generation);
            return;
        }
        self.timer = None;
        let Some(context) = self.context.take() else {
            self.state = GhostState::Idle;
            return;
        };

        let completer = Arc::clone(&self.completer);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = completer
                .complete(vec![Message::user(continuation_prompt(&context))], None)
                .await;
            let _ = events.send(Event::SuggestionArrived { generation, result });
        });
        tracing::debug!("Ghost text requested (generation {})", generation);
    }

    /// A completion for `generation` came back.
    pub fn on_suggestion(&mut self, generation: u64, result: Result<String, AiError>) {
        if generation != self.generation || self.state != GhostState::Pending {
            tracing::debug!("Discarding superseded ghost text (generation {})", generation);
            return;
        }

        self.state = match result {
            Ok(text) if !text.trim().is_empty() => GhostState::Ready {
                suggestion: format!(" {}", text.trim()),
            },
            Ok(_) => GhostState::Idle,
            Err(e) => {
                tracing::warn!("Ghost text failed: {}", e);
                GhostState::Idle
            }
        };
    }

    /// Take the ready suggestion if `key` accepts it.
    pub fn accept(&mut self, key: &KeyPress) -> Option<String> {
        if !key.accepts_ghost_text() {
            return None;
        }
        let suggestion = self.suggestion()?.to_string();
        self.clear();
        Some(suggestion)
    }
}

/// Whether `text` is worth completing: a non-blank line and a length in bounds.
pub fn qualifies(text: &str) -> bool {
    let len = text.chars().count();
    len > MIN_TEXT_CHARS && len < MAX_TEXT_CHARS && text.lines().any(|l| !l.trim().is_empty())
}

/// The last non-blank line, trimmed.
pub fn last_paragraph(text: &str) -> Option<&str> {
    text.lines().map(str::trim).rev().find(|l| !l.is_empty())
}

fn continuation_prompt(paragraph: &str) -> String {
    format!(
        "Continue the following text with 1-2 sentences. Only output the continuation, \
         nothing else.\n\nText: {}",
        paragraph
    )
}
