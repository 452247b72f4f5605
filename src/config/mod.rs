//! Configuration module for mdpreview
//!
//! This module handles user preferences (watch timings, load thresholds,
//! preview output), including serialization to/from JSON and persistent
//! storage in platform-specific directories.

mod persistence;
mod settings;

pub use persistence::*;
pub use settings::*;

pub(crate) use persistence::write_atomic;
