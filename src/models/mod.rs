//! Domain models for Scriptorium.
//!
//! # Core Concepts
//!
//! ## Persisted Entities
//!
//! - [`DocumentTab`]: An open document editing session. Exactly one tab is active
//!   whenever any tab exists.
//! - [`Page`]: A named grouping of tabs, referencing them through [`PageDocument`]s.
//! - [`LibraryFolder`] / [`LibraryFile`]: The durable file catalog, separate from open tabs.
//! - [`ContextFile`]: A working-set copy of a library file fed to AI prompts.
//! - [`Framework`] / [`Style`]: Reusable AI prompt presets.
//! - [`RoleDefinition`] and [`AiConfig`]: Free-text role prompt and AI credentials.
//!
//! ## Derived and Ephemeral Entities
//!
//! These are never written to the store:
//!
//! - [`Heading`]: Regenerated from the active tab's markup on every editor update.
//! - [`Seed`]: AI writing suggestions, replaced wholesale by each generation call.

mod catalog;
mod document;
mod library;
mod page;
mod seed;
mod settings;

pub use catalog::*;
pub use document::*;
pub use library::*;
pub use page::*;
pub use seed::*;
pub use settings::*;
