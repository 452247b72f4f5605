//! File helpers for mdpreview
//!
//! This module provides path resolution for user-supplied paths and
//! text/binary classification used when dispatching files to the renderer.

pub mod classify;
pub mod paths;

pub use classify::{classify_path, is_markdown_path, language_for_path, FileClass};
pub use paths::{resolve, standardize};
