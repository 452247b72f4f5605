//! mdpreview - live Markdown preview core
//!
//! Keeps a set of open documents and an optional directory tree in sync with
//! the filesystem, and renders the selected document to an HTML preview.

pub mod app;
pub mod config;
pub mod error;
pub mod files;
pub mod preview;
pub mod state;
pub mod workspaces;

pub use app::App;
pub use error::{Error, Result};
pub use state::{EngineOptions, WorkspaceEngine, WorkspaceSnapshot};
