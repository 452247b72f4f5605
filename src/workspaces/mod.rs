//! Workspace building blocks for mdpreview
//!
//! This module provides:
//! - File tree data structures and scanning
//! - The open-document (tab) registry
//! - Session persistence through a key-value store
//! - Debounced single-file watching for external changes

mod file_tree;
mod persistence;
mod tabs;
mod watcher;

pub use file_tree::{
    build_tree, file_count, natural_cmp, FileTreeNode, FileTreeNodeKind, SKIPPED_DIRECTORIES,
};
pub use persistence::{JsonFileStore, MemoryStore, SessionState, SessionStore};
pub use tabs::{Tab, TabId, TabRegistry};
pub use watcher::{FileWatcher, DEFAULT_DEBOUNCE_INTERVAL, DEFAULT_RENAME_GRACE};
