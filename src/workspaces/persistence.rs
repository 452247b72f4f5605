//! Session persistence.
//!
//! The workspace remembers its open tabs, directory and a few preferences
//! between runs through a small key-value store. Values are JSON-encoded
//! bytes so any byte-oriented backend can hold them.

use crate::config::{get_session_file_path, write_atomic};
use crate::error::{Error, Result};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

// ─────────────────────────────────────────────────────────────────────────────
// Keys
// ─────────────────────────────────────────────────────────────────────────────

pub const KEY_OPEN_TABS: &str = "open_tabs";
pub const KEY_LAST_DIRECTORY: &str = "last_directory";
pub const KEY_SHOW_HIDDEN_FILES: &str = "show_hidden_files";
pub const KEY_SELECTED_TAB: &str = "selected_tab";
pub const KEY_CUSTOM_CSS_PATH: &str = "custom_css_path";

// ─────────────────────────────────────────────────────────────────────────────
// Store Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Minimal key-value store for session data.
pub trait SessionStore {
    /// Raw bytes stored under `key`, if any.
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: Vec<u8>) -> Result<()>;
}

/// In-memory store. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Vec<u8>) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| Error::Application("session store lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// Store backed by a JSON object file, rewritten atomically on every `set`.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Open the store at the default location in the config directory.
    pub fn open_default() -> Result<Self> {
        Ok(Self::open(get_session_file_path()?))
    }

    /// Open the store at `path`.
    ///
    /// A missing file starts empty; a corrupt one is logged and starts empty.
    pub fn open(path: PathBuf) -> Self {
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("Ignoring corrupt session file {}: {}", path.display(), e);
                BTreeMap::new()
            }),
            Err(e) => {
                debug!("No session file at {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.get(key).map(|v| v.clone().into_bytes())
    }

    fn set(&mut self, key: &str, value: Vec<u8>) -> Result<()> {
        let value = String::from_utf8(value).map_err(|_| {
            Error::Application(format!("Session value for '{}' is not UTF-8", key))
        })?;
        self.entries.insert(key.to_string(), value);

        let json = serde_json::to_string_pretty(&self.entries)?;
        write_atomic(&self.path, "session.json.tmp", json.as_bytes())?;
        debug!("Saved session key '{}' to {}", key, self.path.display());
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session State
// ─────────────────────────────────────────────────────────────────────────────

/// Everything the workspace restores on the next launch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Open tab paths in tab-bar order
    pub open_tabs: Vec<PathBuf>,
    pub last_directory: Option<PathBuf>,
    pub show_hidden_files: bool,
    /// Index of the selected tab within `open_tabs`
    pub selected_tab: Option<usize>,
    pub custom_css_path: Option<PathBuf>,
}

impl SessionState {
    /// Read the session from `store`.
    ///
    /// Missing or malformed keys fall back to their defaults individually.
    pub fn load(store: &dyn SessionStore) -> Self {
        Self {
            open_tabs: read_key(store, KEY_OPEN_TABS).unwrap_or_default(),
            last_directory: read_key::<Option<PathBuf>>(store, KEY_LAST_DIRECTORY).flatten(),
            show_hidden_files: read_key(store, KEY_SHOW_HIDDEN_FILES).unwrap_or(false),
            selected_tab: read_key::<Option<usize>>(store, KEY_SELECTED_TAB).flatten(),
            custom_css_path: read_key::<Option<PathBuf>>(store, KEY_CUSTOM_CSS_PATH).flatten(),
        }
    }

    /// Write every key to `store`.
    pub fn save(&self, store: &mut dyn SessionStore) -> Result<()> {
        write_key(store, KEY_OPEN_TABS, &self.open_tabs)?;
        write_key(store, KEY_LAST_DIRECTORY, &self.last_directory)?;
        write_key(store, KEY_SHOW_HIDDEN_FILES, &self.show_hidden_files)?;
        write_key(store, KEY_SELECTED_TAB, &self.selected_tab)?;
        write_key(store, KEY_CUSTOM_CSS_PATH, &self.custom_css_path)
    }
}

fn read_key<T: DeserializeOwned>(store: &dyn SessionStore, key: &str) -> Option<T> {
    let bytes = store.get(key)?;
    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring malformed session value for '{}': {}", key, e);
            None
        }
    }
}

fn write_key<T: Serialize>(store: &mut dyn SessionStore, key: &str, value: &T) -> Result<()> {
    store.set(key, serde_json::to_vec(value)?)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
