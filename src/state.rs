//! Workspace state engine for mdpreview
//!
//! This module contains the `WorkspaceEngine`, which owns the open tabs, the
//! selection, the optional associated directory tree and the content of the
//! selected document. It keeps that content live by watching the selected
//! file, loads large files off the owner thread without ever letting a stale
//! result overwrite a newer selection, and persists the session through a
//! `SessionStore`.
//!
//! All mutation happens on the thread that owns the engine. Watcher callbacks
//! and background reads only send `EngineMessage`s into the engine's channel;
//! the owner applies them with `poll_events()` or `wait_for_events()`.

use crate::error::{Error, Result};
use crate::files::paths::{self, display_name};
use crate::workspaces::{
    build_tree, file_count, FileTreeNode, FileWatcher, SessionState, SessionStore, Tab, TabId,
    TabRegistry, DEFAULT_DEBOUNCE_INTERVAL, DEFAULT_RENAME_GRACE,
};
use log::{debug, info, warn};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;

/// Files larger than this many bytes are read on a background thread.
pub const DEFAULT_ASYNC_LOAD_THRESHOLD: u64 = 1_000_000;

/// Window title used when nothing is open.
pub const APP_DISPLAY_NAME: &str = "MDPreview";

// ─────────────────────────────────────────────────────────────────────────────
// Options, Messages & Snapshots
// ─────────────────────────────────────────────────────────────────────────────

/// Timing and loading parameters for the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Quiet period before a file change triggers a reload
    pub debounce_interval: Duration,
    /// Delay before re-watching a file that was replaced on disk
    pub rename_grace: Duration,
    /// Size above which documents load asynchronously
    pub async_load_threshold: u64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            debounce_interval: DEFAULT_DEBOUNCE_INTERVAL,
            rename_grace: DEFAULT_RENAME_GRACE,
            async_load_threshold: DEFAULT_ASYNC_LOAD_THRESHOLD,
        }
    }
}

/// Work delivered to the owner thread.
#[derive(Debug)]
pub enum EngineMessage {
    /// The selected document changed on disk
    FileChanged,
    /// The custom stylesheet changed on disk
    StylesheetChanged,
    /// A background read finished
    Loaded {
        tab: TabId,
        ticket: u64,
        reload: bool,
        result: Result<String>,
    },
}

/// Immutable view of the workspace, sent to subscribers after each change.
#[derive(Debug, Clone)]
pub struct WorkspaceSnapshot {
    /// Increases by one with every snapshot sent
    pub revision: u64,
    pub tabs: Vec<Tab>,
    pub selected: Option<TabId>,
    pub directory: Option<PathBuf>,
    pub file_tree: Arc<Vec<FileTreeNode>>,
    pub content: Arc<str>,
    /// Changes only when `content` changes
    pub content_revision: u64,
    pub error: Option<String>,
    pub show_hidden_files: bool,
    pub custom_css: Arc<str>,
    pub custom_css_path: Option<PathBuf>,
    pub is_loading: bool,
    pub display_name: String,
}

impl WorkspaceSnapshot {
    pub fn selected_tab(&self) -> Option<&Tab> {
        self.selected
            .and_then(|id| self.tabs.iter().find(|t| t.id() == id))
    }
}

/// The observable parts of the state, compared to decide whether to publish.
#[derive(Debug, Clone, PartialEq)]
struct StateKey {
    tabs: Vec<TabId>,
    selected: Option<TabId>,
    directory: Option<PathBuf>,
    tree_revision: u64,
    content_revision: u64,
    error: Option<String>,
    show_hidden_files: bool,
    css_revision: u64,
    custom_css_path: Option<PathBuf>,
    loading: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Engine
// ─────────────────────────────────────────────────────────────────────────────

/// Tabs, selection, directory tree and live content of one workspace.
pub struct WorkspaceEngine {
    options: EngineOptions,

    // Documents
    tabs: TabRegistry,
    content: Arc<str>,
    content_revision: u64,
    /// Tab whose background read is in flight
    loading: Option<TabId>,
    /// Identifies the most recent load; older results are discarded
    load_ticket: u64,
    error: Option<String>,

    // Directory
    directory: Option<PathBuf>,
    file_tree: Arc<Vec<FileTreeNode>>,
    tree_revision: u64,
    show_hidden_files: bool,

    // Stylesheet
    custom_css_path: Option<PathBuf>,
    custom_css: Arc<str>,
    css_revision: u64,

    // Watching
    watcher: FileWatcher,
    css_watcher: FileWatcher,

    // Plumbing
    store: Box<dyn SessionStore>,
    restoring: bool,
    events_tx: Sender<EngineMessage>,
    events_rx: Receiver<EngineMessage>,
    subscribers: Vec<Sender<WorkspaceSnapshot>>,
    revision: u64,
    published: StateKey,
}

impl WorkspaceEngine {
    /// Create an empty workspace persisting its session to `store`.
    pub fn new(options: EngineOptions, store: impl SessionStore + 'static) -> Self {
        let (events_tx, events_rx) = channel();
        let mut engine = Self {
            options,
            tabs: TabRegistry::new(),
            content: Arc::from(""),
            content_revision: 0,
            loading: None,
            load_ticket: 0,
            error: None,
            directory: None,
            file_tree: Arc::new(Vec::new()),
            tree_revision: 0,
            show_hidden_files: false,
            custom_css_path: None,
            custom_css: Arc::from(""),
            css_revision: 0,
            watcher: FileWatcher::new(options.debounce_interval, options.rename_grace),
            css_watcher: FileWatcher::new(options.debounce_interval, options.rename_grace),
            store: Box::new(store),
            restoring: false,
            events_tx,
            events_rx,
            subscribers: Vec::new(),
            revision: 0,
            published: StateKey {
                tabs: Vec::new(),
                selected: None,
                directory: None,
                tree_revision: 0,
                content_revision: 0,
                error: None,
                show_hidden_files: false,
                css_revision: 0,
                custom_css_path: None,
                loading: false,
            },
        };
        engine.published = engine.state_key();
        engine
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// All tabs in tab-bar order.
    pub fn tabs(&self) -> &[Tab] {
        self.tabs.tabs()
    }

    pub fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    pub fn selected_tab_id(&self) -> Option<TabId> {
        self.tabs.selected()
    }

    pub fn selected_tab(&self) -> Option<&Tab> {
        self.tabs.selected_tab()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.tabs.selected_index()
    }

    /// Content of the selected document as of its last successful load.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn content_revision(&self) -> u64 {
        self.content_revision
    }

    /// The unacknowledged error message, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    pub fn file_tree(&self) -> &[FileTreeNode] {
        &self.file_tree
    }

    pub fn show_hidden_files(&self) -> bool {
        self.show_hidden_files
    }

    pub fn custom_css(&self) -> &str {
        &self.custom_css
    }

    pub fn custom_css_path(&self) -> Option<&Path> {
        self.custom_css_path.as_deref()
    }

    /// True while a background read for the selected tab is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    /// True while the selected document's watch is open.
    pub fn is_watching(&self) -> bool {
        self.watcher.is_watching()
    }

    /// Directory of the selected document, the base for relative links.
    pub fn current_file_directory(&self) -> Option<&Path> {
        self.tabs.selected_tab().and_then(Tab::directory)
    }

    /// Window title from the selected tab and directory names.
    pub fn display_name(&self) -> String {
        let dir_name = self.directory.as_deref().map(display_name);
        match (self.tabs.selected_tab(), dir_name) {
            (Some(tab), Some(dir)) => format!("{} — {}", tab.name(), dir),
            (Some(tab), None) => tab.name(),
            (None, Some(dir)) => dir,
            (None, None) => APP_DISPLAY_NAME.to_string(),
        }
    }

    /// Current state as an immutable snapshot.
    pub fn snapshot(&self) -> WorkspaceSnapshot {
        WorkspaceSnapshot {
            revision: self.revision,
            tabs: self.tabs.tabs().to_vec(),
            selected: self.tabs.selected(),
            directory: self.directory.clone(),
            file_tree: Arc::clone(&self.file_tree),
            content: Arc::clone(&self.content),
            content_revision: self.content_revision,
            error: self.error.clone(),
            show_hidden_files: self.show_hidden_files,
            custom_css: Arc::clone(&self.custom_css),
            custom_css_path: self.custom_css_path.clone(),
            is_loading: self.loading.is_some(),
            display_name: self.display_name(),
        }
    }

    /// Receive a snapshot after every change to the workspace.
    pub fn subscribe(&mut self) -> Receiver<WorkspaceSnapshot> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Opening
    // ─────────────────────────────────────────────────────────────────────────

    /// Open `path` in a tab, or select the tab that already shows it.
    ///
    /// Unreadable files set the error slot and create no tab.
    pub fn open_file(&mut self, path: &Path) -> Option<TabId> {
        let id = self.open_file_inner(path);
        self.publish();
        id
    }

    /// Associate `path` as the workspace directory and build its tree.
    pub fn open_directory(&mut self, path: &Path) {
        self.open_directory_inner(path);
        self.publish();
    }

    /// Open a file or directory, depending on what is at `path`.
    pub fn open_url(&mut self, path: &Path) {
        self.open_url_inner(path);
        self.publish();
    }

    /// Resolve a user-supplied path string, then open it.
    pub fn open_from_path(&mut self, input: &str, working_dir: &Path) {
        let path = paths::resolve(input, working_dir);
        self.open_url(&path);
    }

    fn open_url_inner(&mut self, path: &Path) {
        match std::fs::metadata(path) {
            Ok(meta) if meta.is_dir() => self.open_directory_inner(path),
            Ok(_) => {
                self.open_file_inner(path);
            }
            Err(_) => {
                let err = Error::NotFound {
                    path: path.to_path_buf(),
                };
                warn!("{}", err);
                self.error = Some(err.to_string());
            }
        }
    }

    fn open_file_inner(&mut self, path: &Path) -> Option<TabId> {
        let path = paths::standardize(path);

        if let Some(existing) = self.tabs.find_by_path(&path) {
            debug!("{} already open in tab {}", path.display(), existing);
            self.select_inner(existing);
            return Some(existing);
        }

        let preloaded = match preflight_document(&path, self.options.async_load_threshold) {
            Ok(text) => text,
            Err(err) => {
                warn!("Cannot open {}: {}", path.display(), err);
                self.error = Some(err.to_string());
                return None;
            }
        };

        info!("Opened file: {}", path.display());
        let id = self.tabs.insert(Tab::new(path));
        self.select_with(id, preloaded);
        self.persist();
        Some(id)
    }

    fn open_directory_inner(&mut self, path: &Path) {
        let path = paths::standardize(path);
        self.directory = Some(path);
        self.rebuild_tree();
        if let Some(dir) = &self.directory {
            info!(
                "Opened directory: {} ({} files)",
                dir.display(),
                file_count(&self.file_tree)
            );
        }
        self.persist();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Tab Management
    // ─────────────────────────────────────────────────────────────────────────

    /// Select the tab `id`, load its content and watch its file.
    ///
    /// Unknown ids are ignored.
    pub fn select_tab(&mut self, id: TabId) {
        if self.select_inner(id) {
            self.persist();
            self.publish();
        }
    }

    /// Select the tab at `index` in tab-bar order; out of range is ignored.
    pub fn select_tab_at(&mut self, index: usize) {
        if let Some(id) = self.tabs.id_at(index) {
            self.select_tab(id);
        }
    }

    /// Select the next tab, wrapping around.
    pub fn select_next_tab(&mut self) {
        if let Some(id) = self.tabs.cycle_from_selected(1) {
            self.select_tab(id);
        }
    }

    /// Select the previous tab, wrapping around.
    pub fn select_previous_tab(&mut self) {
        if let Some(id) = self.tabs.cycle_from_selected(-1) {
            self.select_tab(id);
        }
    }

    /// Close the tab `id`.
    ///
    /// Closing the selected tab selects the tab that slid into its place,
    /// or the new last tab; closing the only tab clears the content.
    pub fn close_tab(&mut self, id: TabId) {
        let was_selected = self.tabs.selected() == Some(id);
        let Some((index, tab)) = self.tabs.remove(id) else {
            return;
        };
        debug!("Closed tab {} ({})", id, tab.path().display());

        if was_selected {
            match self.tabs.len() {
                0 => self.clear_document(),
                len => {
                    if let Some(next) = self.tabs.id_at(index.min(len - 1)) {
                        self.select_inner(next);
                    }
                }
            }
        }

        self.persist();
        self.publish();
    }

    /// Close every tab.
    pub fn close_all_tabs(&mut self) {
        self.tabs.clear();
        self.clear_document();
        self.persist();
        self.publish();
    }

    fn select_inner(&mut self, id: TabId) -> bool {
        self.select_with(id, None)
    }

    /// Select `id`, using `preloaded` as its content instead of reading it again.
    fn select_with(&mut self, id: TabId, preloaded: Option<String>) -> bool {
        if !self.tabs.select(id) {
            debug!("Ignoring selection of unknown tab {}", id);
            return false;
        }
        let Some(path) = self.tabs.get(id).map(|t| t.path().to_path_buf()) else {
            return false;
        };

        debug!("Selected tab {} ({})", id, path.display());
        match preloaded {
            Some(text) => {
                self.load_ticket += 1;
                self.loading = None;
                let ticket = self.load_ticket;
                self.apply_loaded(id, ticket, false, Ok(text));
            }
            None => self.load(id, &path, false),
        }

        let tx = self.events_tx.clone();
        self.watcher.watch(&path, move || {
            let _ = tx.send(EngineMessage::FileChanged);
        });
        true
    }

    fn clear_document(&mut self) {
        self.set_content(String::new());
        self.loading = None;
        self.load_ticket += 1;
        self.watcher.stop();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Loading
    // ─────────────────────────────────────────────────────────────────────────

    /// Load `path` for tab `id`, synchronously or on a background thread.
    fn load(&mut self, id: TabId, path: &Path, reload: bool) {
        self.load_ticket += 1;
        let ticket = self.load_ticket;
        self.loading = None;

        let size = match std::fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(e) => {
                self.apply_loaded(id, ticket, reload, Err(Error::read(path, e)));
                return;
            }
        };

        if size <= self.options.async_load_threshold {
            let result = read_document(path);
            self.apply_loaded(id, ticket, reload, result);
            return;
        }

        debug!(
            "Loading {} ({} bytes) in the background",
            path.display(),
            size
        );
        if !reload {
            self.set_content(String::new());
        }
        self.loading = Some(id);

        let tx = self.events_tx.clone();
        let owned = path.to_path_buf();
        let spawned = std::thread::Builder::new()
            .name("mdpreview-loader".to_string())
            .spawn(move || {
                let result = read_document(&owned);
                let _ = tx.send(EngineMessage::Loaded {
                    tab: id,
                    ticket,
                    reload,
                    result,
                });
            });

        if let Err(e) = spawned {
            warn!("Failed to start loader thread, reading inline: {}", e);
            let result = read_document(path);
            self.apply_loaded(id, ticket, reload, result);
        }
    }

    /// Apply a finished read unless the selection moved on since it started.
    fn apply_loaded(&mut self, id: TabId, ticket: u64, reload: bool, result: Result<String>) {
        if self.tabs.selected() != Some(id) || ticket != self.load_ticket {
            debug!("Discarding stale load result for tab {}", id);
            return;
        }
        self.loading = None;

        match result {
            Ok(text) => {
                self.set_content(text);
                self.error = None;
            }
            Err(err) => {
                warn!("{}", err);
                self.error = Some(err.to_string());
                // A failed reload keeps the last good content on screen
                if !reload {
                    self.set_content(String::new());
                }
            }
        }
    }

    fn reload_selected(&mut self) {
        let Some(tab) = self.tabs.selected_tab() else {
            return;
        };
        let (id, path) = (tab.id(), tab.path().to_path_buf());
        debug!("Reloading {}", path.display());
        self.load(id, &path, true);
    }

    fn set_content(&mut self, text: String) {
        if *self.content != *text {
            self.content = Arc::from(text);
            self.content_revision += 1;
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Directory Tree
    // ─────────────────────────────────────────────────────────────────────────

    /// Flip the hidden-files preference and rebuild the tree.
    pub fn toggle_hidden_files(&mut self) {
        self.show_hidden_files = !self.show_hidden_files;
        debug!("Show hidden files: {}", self.show_hidden_files);
        self.rebuild_tree();
        self.persist();
        self.publish();
    }

    /// Rebuild the tree for the associated directory, if any.
    pub fn refresh_file_tree(&mut self) {
        self.rebuild_tree();
        self.publish();
    }

    fn rebuild_tree(&mut self) {
        let Some(dir) = &self.directory else {
            return;
        };
        self.file_tree = Arc::new(build_tree(dir, self.show_hidden_files));
        self.tree_revision += 1;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Custom Stylesheet
    // ─────────────────────────────────────────────────────────────────────────

    /// Use the stylesheet at `path` for previews and keep it live.
    ///
    /// An empty path removes the custom stylesheet. An unreadable file gives
    /// an empty stylesheet without touching the error slot.
    pub fn set_custom_css_path(&mut self, path: &Path) {
        self.set_custom_css_inner(path);
        self.persist();
        self.publish();
    }

    fn set_custom_css_inner(&mut self, path: &Path) {
        if path.as_os_str().is_empty() {
            debug!("Custom stylesheet removed");
            self.custom_css_path = None;
            self.set_css(String::new());
            self.css_watcher.stop();
            return;
        }

        let path = paths::standardize(path);
        info!("Using custom stylesheet: {}", path.display());
        self.custom_css_path = Some(path.clone());
        self.reload_css();

        let tx = self.events_tx.clone();
        self.css_watcher.watch(&path, move || {
            let _ = tx.send(EngineMessage::StylesheetChanged);
        });
    }

    fn reload_css(&mut self) {
        let Some(path) = &self.custom_css_path else {
            return;
        };
        let css = match std::fs::read_to_string(path) {
            Ok(css) => css,
            Err(e) => {
                warn!("Could not read stylesheet {}: {}", path.display(), e);
                String::new()
            }
        };
        self.set_css(css);
    }

    fn set_css(&mut self, css: String) {
        if *self.custom_css != *css {
            self.custom_css = Arc::from(css);
            self.css_revision += 1;
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Errors
    // ─────────────────────────────────────────────────────────────────────────

    /// Acknowledge the current error message.
    pub fn dismiss_error(&mut self) {
        self.error = None;
        self.publish();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Event Processing
    // ─────────────────────────────────────────────────────────────────────────

    /// Apply every pending message without blocking.
    ///
    /// Returns the number of messages handled.
    pub fn poll_events(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(message) = self.events_rx.try_recv() {
            self.handle_message(message);
            handled += 1;
        }
        handled
    }

    /// Block up to `timeout` for the first message, then drain the rest.
    pub fn wait_for_events(&mut self, timeout: Duration) -> usize {
        match self.events_rx.recv_timeout(timeout) {
            Ok(message) => {
                self.handle_message(message);
                1 + self.poll_events()
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => 0,
        }
    }

    fn handle_message(&mut self, message: EngineMessage) {
        match message {
            EngineMessage::FileChanged => self.reload_selected(),
            EngineMessage::StylesheetChanged => self.reload_css(),
            EngineMessage::Loaded {
                tab,
                ticket,
                reload,
                result,
            } => self.apply_loaded(tab, ticket, reload, result),
        }
        self.publish();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Session
    // ─────────────────────────────────────────────────────────────────────────

    /// Current session, as it would be persisted.
    pub fn session_state(&self) -> SessionState {
        SessionState {
            open_tabs: self
                .tabs
                .tabs()
                .iter()
                .map(|t| t.path().to_path_buf())
                .collect(),
            last_directory: self.directory.clone(),
            show_hidden_files: self.show_hidden_files,
            selected_tab: self.tabs.selected_index(),
            custom_css_path: self.custom_css_path.clone(),
        }
    }

    /// Persist the session to the store.
    pub fn save_state(&mut self) {
        let state = self.session_state();
        if let Err(e) = state.save(self.store.as_mut()) {
            warn!("Failed to save session: {}", e);
        }
    }

    fn persist(&mut self) {
        if !self.restoring {
            self.save_state();
        }
    }

    /// Reopen the remembered directory, tabs and stylesheet.
    ///
    /// Entries that no longer exist on disk or cannot be read as text are
    /// skipped.
    pub fn restore_state(&mut self) {
        let session = SessionState::load(self.store.as_ref());
        self.restoring = true;

        self.show_hidden_files = session.show_hidden_files;

        if let Some(dir) = session.last_directory.as_deref() {
            if dir.is_dir() {
                self.open_directory_inner(dir);
            } else {
                debug!("Skipping vanished directory {}", dir.display());
            }
        }

        let mut restored: Vec<(usize, TabId)> = Vec::new();
        for (index, path) in session.open_tabs.iter().enumerate() {
            let path = paths::standardize(path);
            if let Err(err) = preflight_document(&path, self.options.async_load_threshold) {
                debug!("Skipping {}: {}", path.display(), err);
                continue;
            }
            let id = match self.tabs.find_by_path(&path) {
                Some(id) => id,
                None => self.tabs.insert(Tab::new(path)),
            };
            restored.push((index, id));
        }

        let selected = session.selected_tab.unwrap_or(0);
        let target = restored
            .iter()
            .find(|(index, _)| *index == selected)
            .or_else(|| restored.get(selected.min(restored.len().saturating_sub(1))))
            .map(|(_, id)| *id);
        if let Some(id) = target {
            self.select_inner(id);
        }

        if let Some(css) = session.custom_css_path.as_deref() {
            if css.is_file() {
                self.set_custom_css_inner(css);
            }
        }

        info!(
            "Restored session: {} tab(s), directory {}",
            restored.len(),
            self.directory
                .as_deref()
                .map(|d| d.display().to_string())
                .unwrap_or_else(|| "none".to_string())
        );

        self.restoring = false;
        self.persist();
        self.publish();
    }

    /// Persist the session and stop all watching.
    pub fn shutdown(&mut self) {
        self.save_state();
        self.watcher.stop();
        self.css_watcher.stop();
        debug!("Workspace shut down");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Notification
    // ─────────────────────────────────────────────────────────────────────────

    fn state_key(&self) -> StateKey {
        StateKey {
            tabs: self.tabs.tabs().iter().map(Tab::id).collect(),
            selected: self.tabs.selected(),
            directory: self.directory.clone(),
            tree_revision: self.tree_revision,
            content_revision: self.content_revision,
            error: self.error.clone(),
            show_hidden_files: self.show_hidden_files,
            css_revision: self.css_revision,
            custom_css_path: self.custom_css_path.clone(),
            loading: self.loading.is_some(),
        }
    }

    /// Send one snapshot to every subscriber if anything observable changed.
    fn publish(&mut self) {
        let key = self.state_key();
        if key == self.published {
            return;
        }
        self.published = key;
        self.revision += 1;

        let snapshot = self.snapshot();
        self.subscribers
            .retain(|subscriber| subscriber.send(snapshot.clone()).is_ok());
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File Access
// ─────────────────────────────────────────────────────────────────────────────

/// Bytes checked for valid UTF-8 before a large file gets a tab.
const PREFLIGHT_CHUNK: u64 = 64 * 1024;

/// Check that `path` is a readable UTF-8 file before a tab is created for it.
///
/// Files within `threshold` are read in full and their text is returned for
/// reuse as the first content. Larger files only have their leading chunk
/// checked, and the full read is left to the background loader.
fn preflight_document(path: &Path, threshold: u64) -> Result<Option<String>> {
    let meta = std::fs::metadata(path).map_err(|e| Error::read(path, e))?;
    if meta.is_dir() {
        return Err(Error::NotAFile {
            path: path.to_path_buf(),
        });
    }
    if meta.len() <= threshold {
        return read_document(path).map(Some);
    }

    let mut head = Vec::new();
    std::fs::File::open(path)
        .and_then(|file| file.take(PREFLIGHT_CHUNK).read_to_end(&mut head))
        .map_err(|e| Error::read(path, e))?;
    match std::str::from_utf8(&head) {
        Ok(_) => Ok(None),
        // Character cut off at the end of the chunk
        Err(e) if e.error_len().is_none() => Ok(None),
        Err(_) => Err(Error::InvalidEncoding {
            path: path.to_path_buf(),
        }),
    }
}

/// Read a document as UTF-8 text.
pub fn read_document(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| Error::read(path, e))?;
    String::from_utf8(bytes).map_err(|_| Error::InvalidEncoding {
        path: path.to_path_buf(),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspaces::MemoryStore;
    use std::fs;
    use std::time::Instant;
    use tempfile::TempDir;

    fn fast_options() -> EngineOptions {
        EngineOptions {
            debounce_interval: Duration::from_millis(50),
            rename_grace: Duration::from_millis(20),
            async_load_threshold: DEFAULT_ASYNC_LOAD_THRESHOLD,
        }
    }

    fn engine() -> WorkspaceEngine {
        WorkspaceEngine::new(fast_options(), MemoryStore::new())
    }

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    /// Pump events until `cond` holds or `timeout` elapses.
    fn pump_until(
        engine: &mut WorkspaceEngine,
        timeout: Duration,
        cond: impl Fn(&WorkspaceEngine) -> bool,
    ) -> bool {
        let start = Instant::now();
        while start.elapsed() < timeout {
            if cond(engine) {
                return true;
            }
            engine.wait_for_events(Duration::from_millis(20));
        }
        cond(engine)
    }

    fn drain(rx: &Receiver<WorkspaceSnapshot>) -> Vec<WorkspaceSnapshot> {
        rx.try_iter().collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Opening
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_open_file_loads_content() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "a.md", "v1");
        let mut engine = engine();

        let id = engine.open_file(&file).unwrap();
        assert_eq!(engine.content(), "v1");
        assert_eq!(engine.selected_tab_id(), Some(id));
        assert_eq!(engine.tabs()[0].path(), paths::standardize(&file));
        assert!(engine.is_watching());
        assert!(engine.error().is_none());
    }

    #[test]
    fn test_open_same_path_dedupes() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "a.md", "x");
        let other = write(&dir, "b.md", "y");
        let mut engine = engine();

        let first = engine.open_file(&file).unwrap();
        engine.open_file(&other);
        let again = engine.open_file(&dir.path().join(".").join("a.md")).unwrap();
        let third = engine.open_file(&file).unwrap();

        assert_eq!(engine.tab_count(), 2);
        assert_eq!(first, again);
        assert_eq!(first, third);
        assert_eq!(engine.selected_tab_id(), Some(first));
    }

    #[test]
    fn test_open_missing_file_sets_error() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine();
        let missing = dir.path().join("missing.md");

        assert!(engine.open_file(&missing).is_none());
        assert_eq!(engine.tab_count(), 0);
        let error = engine.error().unwrap();
        assert!(error.contains("File not found"));
        assert!(error.contains("missing.md"));
    }

    #[test]
    fn test_open_file_on_directory_is_error() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine();
        assert!(engine.open_file(dir.path()).is_none());
        assert_eq!(engine.tab_count(), 0);
        assert!(engine.error().unwrap().starts_with("Not a file"));
    }

    #[test]
    fn test_invalid_utf8_reports_error() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("bad.md");
        fs::write(&file, [0xFF, 0xFE, 0xFD]).unwrap();
        let mut engine = engine();

        assert!(engine.open_file(&file).is_none());
        assert_eq!(engine.tab_count(), 0);
        assert!(engine.selected_tab_id().is_none());
        assert!(!engine.is_watching());
        let error = engine.error().unwrap();
        assert!(error.contains("bad.md"));
        assert!(error.contains("UTF-8"));
    }

    #[test]
    fn test_invalid_utf8_large_file_creates_no_tab() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("bad.md");
        let mut bytes = b"# Heading\n".repeat(10);
        bytes.extend_from_slice(&[0xFF, 0xFE, 0xFD]);
        fs::write(&file, bytes).unwrap();
        let mut engine = WorkspaceEngine::new(small_threshold(), MemoryStore::new());

        assert!(engine.open_file(&file).is_none());
        assert_eq!(engine.tab_count(), 0);
        assert!(!engine.is_loading());
        assert!(engine.error().unwrap().contains("bad.md"));
    }

    #[test]
    fn test_preflight_accepts_char_split_at_chunk_end() {
        let dir = TempDir::new().unwrap();
        let mut body = "a".repeat(PREFLIGHT_CHUNK as usize - 1);
        body.push('é');
        body.push_str("tail");
        let file = write(&dir, "split.md", &body);

        assert!(preflight_document(&file, 16).unwrap().is_none());
        assert_eq!(
            preflight_document(&file, u64::MAX).unwrap().as_deref(),
            Some(body.as_str())
        );
    }

    #[test]
    fn test_open_url_dispatches() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "a.md", "x");
        let mut engine = engine();

        engine.open_url(dir.path());
        assert_eq!(engine.tab_count(), 0);
        assert_eq!(engine.directory(), Some(paths::standardize(dir.path()).as_path()));

        engine.open_url(&file);
        assert_eq!(engine.tab_count(), 1);
        assert_eq!(engine.directory(), Some(paths::standardize(dir.path()).as_path()));
    }

    #[test]
    fn test_open_url_missing_sets_error_only() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine();
        let missing = dir.path().join("nope");

        engine.open_url(&missing);
        assert_eq!(
            engine.error(),
            Some(format!("File not found: {}", missing.display()).as_str())
        );
        assert_eq!(engine.tab_count(), 0);
        assert!(engine.directory().is_none());
    }

    #[test]
    fn test_open_from_path_relative() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        write(&dir, "docs/readme.md", "hello");
        let mut engine = engine();

        engine.open_from_path("docs/readme.md", dir.path());
        assert_eq!(engine.content(), "hello");
    }

    #[test]
    fn test_successful_load_clears_error() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "valid.md", "valid content");
        let mut engine = engine();

        engine.open_file(&dir.path().join("nonexistent.md"));
        assert!(engine.error().is_some());

        engine.open_file(&file);
        assert!(engine.error().is_none());
        assert_eq!(engine.content(), "valid content");
    }

    #[test]
    fn test_dismiss_error() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine();
        engine.open_url(&dir.path().join("gone.md"));
        assert!(engine.error().is_some());
        engine.dismiss_error();
        assert!(engine.error().is_none());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Tab Management
    // ─────────────────────────────────────────────────────────────────────────

    fn open_many(engine: &mut WorkspaceEngine, dir: &TempDir, count: usize) -> Vec<TabId> {
        (0..count)
            .map(|i| {
                let file = write(dir, &format!("doc{}.md", i), &format!("content {}", i));
                engine.open_file(&file).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_close_selected_picks_slid_in_tab() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine();
        let ids = open_many(&mut engine, &dir, 4);

        engine.select_tab(ids[1]);
        engine.close_tab(ids[1]);
        assert_eq!(engine.selected_tab_id(), Some(ids[2]));
        assert_eq!(engine.content(), "content 2");

        // Closing the last tab clamps to the new last index
        engine.select_tab(ids[3]);
        engine.close_tab(ids[3]);
        assert_eq!(engine.selected_tab_id(), Some(ids[2]));
        assert_eq!(engine.selected_index(), Some(1));
    }

    #[test]
    fn test_close_unselected_keeps_selection() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine();
        let ids = open_many(&mut engine, &dir, 3);

        engine.select_tab(ids[2]);
        engine.close_tab(ids[0]);
        assert_eq!(engine.selected_tab_id(), Some(ids[2]));
        assert_eq!(engine.tab_count(), 2);
    }

    #[test]
    fn test_close_last_tab_clears() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine();
        let ids = open_many(&mut engine, &dir, 1);

        engine.close_tab(ids[0]);
        assert_eq!(engine.tab_count(), 0);
        assert!(engine.selected_tab_id().is_none());
        assert_eq!(engine.content(), "");
        assert!(!engine.is_watching());
    }

    #[test]
    fn test_close_all_tabs() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine();
        open_many(&mut engine, &dir, 3);

        engine.close_all_tabs();
        assert_eq!(engine.tab_count(), 0);
        assert!(engine.selected_tab_id().is_none());
        assert_eq!(engine.content(), "");
        assert!(!engine.is_watching());
    }

    #[test]
    fn test_cycle_returns_to_start() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine();
        let ids = open_many(&mut engine, &dir, 3);
        engine.select_tab(ids[1]);

        for _ in 0..ids.len() {
            engine.select_next_tab();
        }
        assert_eq!(engine.selected_tab_id(), Some(ids[1]));

        engine.select_next_tab();
        assert_eq!(engine.selected_tab_id(), Some(ids[2]));
        engine.select_next_tab();
        assert_eq!(engine.selected_tab_id(), Some(ids[0]));

        for _ in 0..ids.len() {
            engine.select_previous_tab();
        }
        assert_eq!(engine.selected_tab_id(), Some(ids[0]));

        engine.select_previous_tab();
        assert_eq!(engine.selected_tab_id(), Some(ids[2]));
        assert_eq!(engine.content(), "content 2");
    }

    #[test]
    fn test_cycle_noop_with_single_tab() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine();
        let ids = open_many(&mut engine, &dir, 1);
        let rx = engine.subscribe();

        engine.select_next_tab();
        engine.select_previous_tab();
        assert_eq!(engine.selected_tab_id(), Some(ids[0]));
        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn test_select_by_index() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine();
        let ids = open_many(&mut engine, &dir, 3);

        engine.select_tab_at(0);
        assert_eq!(engine.selected_tab_id(), Some(ids[0]));
        engine.select_tab_at(7);
        assert_eq!(engine.selected_tab_id(), Some(ids[0]));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Loading
    // ─────────────────────────────────────────────────────────────────────────

    fn small_threshold() -> EngineOptions {
        EngineOptions {
            async_load_threshold: 16,
            ..fast_options()
        }
    }

    #[test]
    fn test_large_file_loads_in_background() {
        let dir = TempDir::new().unwrap();
        let body = "Line of markdown content.\n".repeat(100);
        let file = write(&dir, "large.md", &body);
        let mut engine = WorkspaceEngine::new(small_threshold(), MemoryStore::new());

        engine.open_file(&file);
        assert!(engine.is_loading());
        assert_eq!(engine.content(), "");

        assert!(pump_until(&mut engine, Duration::from_secs(3), |e| !e
            .is_loading()));
        assert_eq!(engine.content(), body);
    }

    #[test]
    fn test_stale_background_load_is_discarded() {
        let dir = TempDir::new().unwrap();
        let large = write(&dir, "large.md", &"A".repeat(4096));
        let small = write(&dir, "small.md", "tiny");
        let mut engine = WorkspaceEngine::new(small_threshold(), MemoryStore::new());

        engine.open_file(&large);
        assert!(engine.is_loading());

        // Switch away before the background read is applied
        let small_id = engine.open_file(&small).unwrap();
        assert_eq!(engine.content(), "tiny");
        assert!(!engine.is_loading());

        std::thread::sleep(Duration::from_millis(200));
        engine.poll_events();
        assert_eq!(engine.selected_tab_id(), Some(small_id));
        assert_eq!(engine.content(), "tiny");
    }

    #[test]
    fn test_stale_background_reload_is_discarded() {
        let dir = TempDir::new().unwrap();
        let large_body = "A".repeat(4096);
        let large = write(&dir, "large.md", &large_body);
        let small = write(&dir, "small.md", "tiny");
        let mut engine = WorkspaceEngine::new(small_threshold(), MemoryStore::new());

        let small_id = engine.open_file(&small).unwrap();
        engine.open_file(&large);
        assert!(pump_until(&mut engine, Duration::from_secs(3), |e| !e
            .is_loading()));
        assert_eq!(engine.content(), large_body);

        // Reload of the large file goes to the background
        engine.handle_message(EngineMessage::FileChanged);
        assert!(engine.is_loading());

        engine.select_tab(small_id);
        assert_eq!(engine.content(), "tiny");

        std::thread::sleep(Duration::from_millis(200));
        engine.poll_events();
        assert_eq!(engine.selected_tab_id(), Some(small_id));
        assert_eq!(engine.content(), "tiny");
        assert!(!engine.is_loading());
    }

    #[test]
    fn test_external_change_reloads() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "a.md", "v1");
        let mut engine = engine();

        engine.open_file(&file);
        assert_eq!(engine.content(), "v1");

        std::thread::sleep(Duration::from_millis(100));
        fs::write(&file, "v2").unwrap();

        assert!(pump_until(&mut engine, Duration::from_secs(3), |e| e
            .content()
            == "v2"));
    }

    #[test]
    fn test_failed_reload_keeps_content() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "a.md", "good");
        let mut engine = engine();
        engine.open_file(&file);

        fs::remove_file(&file).unwrap();
        engine.events_tx.send(EngineMessage::FileChanged).unwrap();
        engine.poll_events();

        assert_eq!(engine.content(), "good");
        assert!(engine.error().unwrap().contains("a.md"));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Directory Tree
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_toggle_hidden_rebuilds_tree() {
        let dir = TempDir::new().unwrap();
        write(&dir, ".secret.md", "s");
        write(&dir, "visible.md", "v");
        let mut engine = engine();

        engine.open_directory(dir.path());
        assert_eq!(engine.file_tree().len(), 1);

        engine.toggle_hidden_files();
        assert!(engine.show_hidden_files());
        assert_eq!(engine.file_tree().len(), 2);
    }

    #[test]
    fn test_refresh_picks_up_new_files() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.md", "a");
        let mut engine = engine();
        engine.open_directory(dir.path());
        assert_eq!(engine.file_tree().len(), 1);

        write(&dir, "b.md", "b");
        engine.refresh_file_tree();
        assert_eq!(engine.file_tree().len(), 2);
    }

    #[test]
    fn test_display_name() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "notes.md", "x");
        let mut engine = engine();
        assert_eq!(engine.display_name(), "MDPreview");

        engine.open_file(&file);
        assert_eq!(engine.display_name(), "notes.md");

        engine.open_directory(dir.path());
        let dir_name = display_name(&paths::standardize(dir.path()));
        assert_eq!(engine.display_name(), format!("notes.md — {}", dir_name));

        engine.close_all_tabs();
        assert_eq!(engine.display_name(), dir_name);
    }

    #[test]
    fn test_current_file_directory() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "a.md", "x");
        let mut engine = engine();
        assert!(engine.current_file_directory().is_none());

        engine.open_file(&file);
        assert_eq!(
            engine.current_file_directory(),
            Some(paths::standardize(dir.path()).as_path())
        );
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Custom Stylesheet
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_custom_css_set_and_clear() {
        let dir = TempDir::new().unwrap();
        let css = write(&dir, "custom.css", "body { font-size: 18px; }");
        let mut engine = engine();
        assert_eq!(engine.custom_css(), "");

        engine.set_custom_css_path(&css);
        assert_eq!(engine.custom_css(), "body { font-size: 18px; }");
        assert_eq!(engine.custom_css_path(), Some(paths::standardize(&css).as_path()));

        engine.set_custom_css_path(Path::new(""));
        assert_eq!(engine.custom_css(), "");
        assert!(engine.custom_css_path().is_none());
    }

    #[test]
    fn test_custom_css_missing_file_is_empty() {
        let mut engine = engine();
        engine.set_custom_css_path(Path::new("/nonexistent/path/custom.css"));
        assert_eq!(engine.custom_css(), "");
        assert!(engine.error().is_none());
    }

    #[test]
    fn test_custom_css_live_reload() {
        let dir = TempDir::new().unwrap();
        let css = write(&dir, "live.css", "body { color: blue; }");
        let mut engine = engine();
        engine.set_custom_css_path(&css);

        std::thread::sleep(Duration::from_millis(100));
        fs::write(&css, "body { color: green; }").unwrap();

        assert!(pump_until(&mut engine, Duration::from_secs(3), |e| e
            .custom_css()
            == "body { color: green; }"));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Notification
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_one_snapshot_per_operation() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "a.md", "hello");
        let mut engine = engine();
        let rx = engine.subscribe();

        engine.open_file(&file);
        let snapshots = drain(&rx);
        assert_eq!(snapshots.len(), 1);
        assert_eq!(&*snapshots[0].content, "hello");
        assert_eq!(snapshots[0].tabs.len(), 1);
        assert_eq!(snapshots[0].selected_tab().unwrap().name(), "a.md");

        engine.open_directory(dir.path());
        assert_eq!(drain(&rx).len(), 1);
    }

    #[test]
    fn test_noops_send_nothing() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "a.md", "x");
        let mut engine = engine();
        engine.open_file(&file);
        let rx = engine.subscribe();

        engine.select_tab(Tab::new(PathBuf::from("/elsewhere.md")).id());
        engine.select_tab_at(5);
        engine.close_tab(Tab::new(PathBuf::from("/other.md")).id());
        engine.dismiss_error();
        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn test_revisions_increase() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.md", "one");
        let b = write(&dir, "b.md", "two");
        let mut engine = engine();
        let rx = engine.subscribe();

        engine.open_file(&a);
        engine.open_file(&b);
        engine.open_directory(dir.path());

        let snapshots = drain(&rx);
        assert_eq!(snapshots.len(), 3);
        assert!(snapshots[0].revision < snapshots[1].revision);
        assert!(snapshots[1].revision < snapshots[2].revision);
        assert!(snapshots[0].content_revision < snapshots[1].content_revision);
        assert_eq!(snapshots[1].content_revision, snapshots[2].content_revision);
    }

    #[test]
    fn test_dropped_subscriber_is_removed() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "a.md", "x");
        let mut engine = engine();
        drop(engine.subscribe());
        let rx = engine.subscribe();

        engine.open_file(&file);
        assert_eq!(engine.subscribers.len(), 1);
        assert_eq!(drain(&rx).len(), 1);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Session
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_session_roundtrip() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.md", "first");
        let b = write(&dir, "b.md", "second");
        let css = write(&dir, "style.css", "h1 { color: red; }");
        let store = MemoryStore::new();

        {
            let mut engine = WorkspaceEngine::new(fast_options(), store.clone());
            engine.open_directory(dir.path());
            engine.open_file(&a);
            engine.open_file(&b);
            engine.toggle_hidden_files();
            engine.set_custom_css_path(&css);
            engine.select_tab_at(0);
            engine.shutdown();
        }

        let mut engine = WorkspaceEngine::new(fast_options(), store);
        let rx = engine.subscribe();
        engine.restore_state();

        assert_eq!(drain(&rx).len(), 1);
        assert_eq!(engine.tab_count(), 2);
        assert_eq!(engine.selected_index(), Some(0));
        assert_eq!(engine.content(), "first");
        assert!(engine.show_hidden_files());
        assert_eq!(engine.directory(), Some(paths::standardize(dir.path()).as_path()));
        assert_eq!(engine.custom_css(), "h1 { color: red; }");
    }

    #[test]
    fn test_restore_skips_vanished_entries() {
        let dir = TempDir::new().unwrap();
        let keep = write(&dir, "keep.md", "kept");
        let store = MemoryStore::new();
        let mut seed = store.clone();
        SessionState {
            open_tabs: vec![dir.path().join("gone.md"), keep.clone()],
            last_directory: Some(dir.path().join("vanished-dir")),
            show_hidden_files: false,
            selected_tab: Some(5),
            custom_css_path: None,
        }
        .save(&mut seed)
        .unwrap();

        let mut engine = WorkspaceEngine::new(fast_options(), store);
        engine.restore_state();

        assert_eq!(engine.tab_count(), 1);
        assert_eq!(engine.content(), "kept");
        assert!(engine.directory().is_none());
        assert!(engine.error().is_none());
    }

    #[test]
    fn test_restore_skips_unreadable_text() {
        let dir = TempDir::new().unwrap();
        let bad = dir.path().join("bad.md");
        fs::write(&bad, [0xFF, 0xFE, 0xFD]).unwrap();
        let keep = write(&dir, "keep.md", "kept");
        let store = MemoryStore::new();
        let mut seed = store.clone();
        SessionState {
            open_tabs: vec![bad, keep.clone()],
            last_directory: None,
            show_hidden_files: false,
            selected_tab: Some(0),
            custom_css_path: None,
        }
        .save(&mut seed)
        .unwrap();

        let mut engine = WorkspaceEngine::new(fast_options(), store);
        engine.restore_state();

        assert_eq!(engine.tab_count(), 1);
        assert_eq!(engine.tabs()[0].path(), paths::standardize(&keep));
        assert_eq!(engine.content(), "kept");
        assert!(engine.error().is_none());
    }

    #[test]
    fn test_operations_persist_session() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.md", "x");
        let store = MemoryStore::new();
        let mut engine = WorkspaceEngine::new(fast_options(), store.clone());

        engine.open_file(&a);
        let saved = SessionState::load(&store);
        assert_eq!(saved.open_tabs, vec![paths::standardize(&a)]);

        engine.close_all_tabs();
        assert!(SessionState::load(&store).open_tabs.is_empty());
    }
}
