//! User settings for mdpreview
//!
//! This module defines the `Settings` struct that holds all user-configurable
//! options, with serde support for JSON persistence.

use crate::state::EngineOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

// ─────────────────────────────────────────────────────────────────────────────
// Main Settings Struct
// ─────────────────────────────────────────────────────────────────────────────

/// User preferences and application settings.
///
/// This struct is serialized to JSON and persisted to the user's config directory.
/// All fields have sensible defaults via the `Default` trait and `#[serde(default)]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // ─────────────────────────────────────────────────────────────────────────
    // File Watching
    // ─────────────────────────────────────────────────────────────────────────
    /// Quiet period before a burst of change events triggers a reload
    pub debounce_interval_ms: u64,

    /// Delay before re-opening a watch after the file was replaced
    pub rename_grace_ms: u64,

    // ─────────────────────────────────────────────────────────────────────────
    // Loading
    // ─────────────────────────────────────────────────────────────────────────
    /// Files larger than this many bytes are read off the owner thread
    pub async_load_threshold: u64,

    // ─────────────────────────────────────────────────────────────────────────
    // Session & Preview
    // ─────────────────────────────────────────────────────────────────────────
    /// Reopen the previous session when launched without paths
    pub restore_session: bool,

    /// Open the rendered preview in the default browser after the first render
    pub open_preview: bool,

    /// Where the rendered HTML preview is written (None = cache directory)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_output: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            // File Watching
            debounce_interval_ms: 150,
            rename_grace_ms: 50,

            // Loading
            async_load_threshold: 1_000_000,

            // Session & Preview
            restore_session: true,
            open_preview: true,
            preview_output: None,
        }
    }
}

impl Settings {
    // ─────────────────────────────────────────────────────────────────────────
    // Validation Constants and Sanitization
    // ─────────────────────────────────────────────────────────────────────────

    /// Minimum allowed debounce interval.
    pub const MIN_DEBOUNCE_MS: u64 = 10;
    /// Maximum allowed debounce interval.
    pub const MAX_DEBOUNCE_MS: u64 = 5_000;
    /// Maximum rename grace period.
    pub const MAX_RENAME_GRACE_MS: u64 = 1_000;
    /// Minimum async load threshold.
    pub const MIN_ASYNC_THRESHOLD: u64 = 1;
    /// Maximum async load threshold (1 GiB).
    pub const MAX_ASYNC_THRESHOLD: u64 = 1 << 30;

    /// Sanitize settings by clamping values to valid ranges.
    ///
    /// This is useful after loading settings from a file that might have
    /// been manually edited with invalid values.
    pub fn sanitize(&mut self) {
        self.debounce_interval_ms = self
            .debounce_interval_ms
            .clamp(Self::MIN_DEBOUNCE_MS, Self::MAX_DEBOUNCE_MS);

        self.rename_grace_ms = self.rename_grace_ms.min(Self::MAX_RENAME_GRACE_MS);

        self.async_load_threshold = self
            .async_load_threshold
            .clamp(Self::MIN_ASYNC_THRESHOLD, Self::MAX_ASYNC_THRESHOLD);
    }

    /// Load settings and sanitize them to ensure validity.
    ///
    /// This is a convenience method that deserializes and then sanitizes.
    pub fn from_json_sanitized(json: &str) -> Result<Self, serde_json::Error> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.sanitize();
        Ok(settings)
    }

    /// Timing and loading parameters for the workspace engine.
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            debounce_interval: Duration::from_millis(self.debounce_interval_ms),
            rename_grace: Duration::from_millis(self.rename_grace_ms),
            async_load_threshold: self.async_load_threshold,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
