//! Preview rendering for mdpreview
//!
//! This module provides:
//! - Relative link rewriting and broken-link detection
//! - Syntax highlighting for source files
//! - The renderer seam and a standalone HTML file renderer

pub mod highlight;
pub mod links;
pub mod render;

pub use highlight::{get_highlighter, SourceHighlighter};
pub use links::{extract_local_links, rewrite_relative_paths};
pub use render::{DocumentKind, HtmlFileRenderer, RenderRequest, Renderer};
