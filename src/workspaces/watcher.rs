//! Single-file watcher with debounced change notification.
//!
//! Watches one path at a time and calls back once a burst of change events
//! has gone quiet. Editors that save by writing a temp file and renaming it
//! over the original leave the OS watch attached to a dead inode; the watcher
//! notices the replacement and re-opens the watch on whatever file now lives
//! at the path.

use log::{debug, warn};
use notify::event::{AccessKind, AccessMode, ModifyKind};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Default quiet period before a change is reported.
pub const DEFAULT_DEBOUNCE_INTERVAL: Duration = Duration::from_millis(150);

/// Default delay before re-opening a watch on a replaced file.
pub const DEFAULT_RENAME_GRACE: Duration = Duration::from_millis(50);

// ─────────────────────────────────────────────────────────────────────────────
// Public Watcher
// ─────────────────────────────────────────────────────────────────────────────

/// Watches a single file and reports changes after a debounce interval.
///
/// The callback runs on the watcher's worker thread. Once `stop()` returns,
/// no further callbacks are made.
#[derive(Debug)]
pub struct FileWatcher {
    debounce_interval: Duration,
    rename_grace: Duration,
    active: Option<ActiveWatch>,
}

#[derive(Debug)]
struct ActiveWatch {
    path: PathBuf,
    signals: Sender<Signal>,
    watching: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

/// Messages delivered to the worker thread.
enum Signal {
    Raw(notify::Result<Event>),
    Stop,
}

impl Default for FileWatcher {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_INTERVAL, DEFAULT_RENAME_GRACE)
    }
}

impl FileWatcher {
    /// Create an idle watcher with the given timings.
    pub fn new(debounce_interval: Duration, rename_grace: Duration) -> Self {
        Self {
            debounce_interval,
            rename_grace,
            active: None,
        }
    }

    pub fn debounce_interval(&self) -> Duration {
        self.debounce_interval
    }

    pub fn rename_grace(&self) -> Duration {
        self.rename_grace
    }

    /// Start watching `path`, replacing any active watch.
    ///
    /// If the OS watch cannot be opened (missing file, permissions) the
    /// watcher stays idle and `on_change` is never called. This is not an
    /// error; check `is_watching()` to observe it.
    pub fn watch<F>(&mut self, path: &Path, on_change: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.stop();

        let (tx, rx) = channel();
        let handle = match open_handle(path, tx.clone()) {
            Ok(handle) => handle,
            Err(e) => {
                debug!("Cannot watch {}: {}", path.display(), e);
                return;
            }
        };

        let watching = Arc::new(AtomicBool::new(true));
        let worker = Worker {
            path: path.to_path_buf(),
            debounce_interval: self.debounce_interval,
            rename_grace: self.rename_grace,
            signals: rx,
            sender: tx.clone(),
            watching: Arc::clone(&watching),
            identity: file_identity(path),
            handle: Some(handle),
            on_change,
        };

        let thread = std::thread::Builder::new()
            .name("mdpreview-watcher".to_string())
            .spawn(move || worker.run());

        match thread {
            Ok(thread) => {
                debug!("Watching {}", path.display());
                self.active = Some(ActiveWatch {
                    path: path.to_path_buf(),
                    signals: tx,
                    watching,
                    thread: Some(thread),
                });
            }
            Err(e) => warn!("Failed to start watcher thread for {}: {}", path.display(), e),
        }
    }

    /// Cancel any pending notification and release the OS watch.
    ///
    /// Idempotent.
    pub fn stop(&mut self) {
        let Some(mut active) = self.active.take() else {
            return;
        };

        active.watching.store(false, Ordering::SeqCst);
        let _ = active.signals.send(Signal::Stop);

        if let Some(thread) = active.thread.take() {
            // Called from inside the callback: the worker exits on its own
            if thread.thread().id() != std::thread::current().id() && thread.join().is_err() {
                warn!("Watcher thread for {} panicked", active.path.display());
            }
        }
        debug!("Stopped watching {}", active.path.display());
    }

    /// True while an OS watch handle is open.
    pub fn is_watching(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|a| a.watching.load(Ordering::SeqCst))
    }

    /// The path of the active watch, if any.
    pub fn path(&self) -> Option<&Path> {
        self.active.as_ref().map(|a| a.path.as_path())
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Worker Thread
// ─────────────────────────────────────────────────────────────────────────────

/// How a raw event affects the watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reaction {
    /// The file at the path was deleted or replaced
    Replaced,
    /// Contents or metadata changed in place
    Changed,
    Ignored,
}

fn reaction_for(kind: &EventKind) -> Reaction {
    match kind {
        EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(_)) => Reaction::Replaced,
        EventKind::Modify(_)
        | EventKind::Create(_)
        | EventKind::Access(AccessKind::Close(AccessMode::Write))
        | EventKind::Any => Reaction::Changed,
        EventKind::Access(_) | EventKind::Other => Reaction::Ignored,
    }
}

struct Worker<F> {
    path: PathBuf,
    debounce_interval: Duration,
    rename_grace: Duration,
    signals: Receiver<Signal>,
    sender: Sender<Signal>,
    watching: Arc<AtomicBool>,
    identity: Option<FileIdentity>,
    handle: Option<RecommendedWatcher>,
    on_change: F,
}

impl<F: FnMut()> Worker<F> {
    fn run(mut self) {
        let mut debounce_at: Option<Instant> = None;
        let mut reopen_at: Option<Instant> = None;

        loop {
            let deadline = match (debounce_at, reopen_at) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };

            let signal = match deadline {
                Some(deadline) => {
                    let wait = deadline.saturating_duration_since(Instant::now());
                    match self.signals.recv_timeout(wait) {
                        Ok(signal) => Some(signal),
                        Err(RecvTimeoutError::Timeout) => None,
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                None => match self.signals.recv() {
                    Ok(signal) => Some(signal),
                    Err(_) => break,
                },
            };

            match signal {
                Some(Signal::Stop) => break,
                Some(Signal::Raw(Ok(event))) => match self.classify(&event.kind) {
                    Reaction::Replaced => {
                        debug!("{} was replaced, re-opening watch", self.path.display());
                        self.handle = None;
                        debounce_at = None;
                        reopen_at = Some(Instant::now() + self.rename_grace);
                    }
                    Reaction::Changed => {
                        debounce_at = Some(Instant::now() + self.debounce_interval);
                    }
                    Reaction::Ignored => {}
                },
                Some(Signal::Raw(Err(e))) => {
                    debug!("Watch error for {}: {}", self.path.display(), e);
                }
                None => {}
            }

            let now = Instant::now();
            if reopen_at.is_some_and(|at| at <= now) {
                reopen_at = None;
                self.reopen();
                debounce_at = Some(Instant::now() + self.debounce_interval);
            }
            if debounce_at.is_some_and(|at| at <= now) {
                debounce_at = None;
                (self.on_change)();
            }
        }

        self.handle = None;
    }

    /// Classify an event, upgrading in-place changes to replacements when
    /// the file at the path is no longer the one being watched.
    fn classify(&self, kind: &EventKind) -> Reaction {
        match reaction_for(kind) {
            Reaction::Changed if self.identity.is_some() => {
                if file_identity(&self.path) != self.identity {
                    Reaction::Replaced
                } else {
                    Reaction::Changed
                }
            }
            other => other,
        }
    }

    fn reopen(&mut self) {
        self.handle = None;
        match open_handle(&self.path, self.sender.clone()) {
            Ok(handle) => {
                self.handle = Some(handle);
                self.identity = file_identity(&self.path);
                self.watching.store(true, Ordering::SeqCst);
                debug!("Re-opened watch on {}", self.path.display());
            }
            Err(e) => {
                self.identity = None;
                self.watching.store(false, Ordering::SeqCst);
                debug!("Cannot re-open watch on {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Open a non-recursive OS watch on `path` that forwards raw events.
fn open_handle(path: &Path, sender: Sender<Signal>) -> notify::Result<RecommendedWatcher> {
    let mut watcher = RecommendedWatcher::new(
        move |result: notify::Result<Event>| {
            let _ = sender.send(Signal::Raw(result));
        },
        Config::default(),
    )?;
    watcher.watch(path, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}

// ─────────────────────────────────────────────────────────────────────────────
// File Identity
// ─────────────────────────────────────────────────────────────────────────────

/// Device and inode of a file, used to detect replacement under the same path.
type FileIdentity = (u64, u64);

#[cfg(unix)]
fn file_identity(path: &Path) -> Option<FileIdentity> {
    use std::os::unix::fs::MetadataExt;
    std::fs::metadata(path).ok().map(|m| (m.dev(), m.ino()))
}

#[cfg(not(unix))]
fn file_identity(_path: &Path) -> Option<FileIdentity> {
    None
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
