//! Open-document registry.
//!
//! Tabs are kept in tab-bar order; that order is also the cycling order for
//! next/previous navigation. The registry owns the selection pointer and
//! guarantees it always names a tab that is present.

use crate::files::paths::display_name;
use log::debug;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

// ─────────────────────────────────────────────────────────────────────────────
// Tab
// ─────────────────────────────────────────────────────────────────────────────

static NEXT_TAB_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique tab identifier.
///
/// Never reused and never derived from the path, so a result tagged with a
/// closed tab's id can't be mistaken for a later tab on the same file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TabId(u64);

impl TabId {
    fn next() -> Self {
        Self(NEXT_TAB_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One open document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    id: TabId,
    /// Standardized absolute path; fixed for the tab's lifetime
    path: PathBuf,
}

impl Tab {
    /// Create a tab with a fresh identifier.
    pub fn new(path: PathBuf) -> Self {
        Self {
            id: TabId::next(),
            path,
        }
    }

    pub fn id(&self) -> TabId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last path component, shown in the tab bar.
    pub fn name(&self) -> String {
        display_name(&self.path)
    }

    /// Directory containing the file.
    pub fn directory(&self) -> Option<&Path> {
        self.path.parent()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────────────────────────────────────

/// Ordered tab collection with a selection pointer.
#[derive(Debug, Default)]
pub struct TabRegistry {
    tabs: Vec<Tab>,
    selected: Option<TabId>,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of open tabs.
    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    /// Get all tabs (read-only), in tab-bar order.
    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn get(&self, id: TabId) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    pub fn position(&self, id: TabId) -> Option<usize> {
        self.tabs.iter().position(|t| t.id == id)
    }

    /// Find a tab by its standardized path.
    pub fn find_by_path(&self, path: &Path) -> Option<TabId> {
        self.tabs.iter().find(|t| t.path == path).map(|t| t.id)
    }

    /// Tab at `index`, bounds-checked.
    pub fn id_at(&self, index: usize) -> Option<TabId> {
        self.tabs.get(index).map(|t| t.id)
    }

    pub fn selected(&self) -> Option<TabId> {
        self.selected
    }

    pub fn selected_tab(&self) -> Option<&Tab> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected.and_then(|id| self.position(id))
    }

    /// Append a tab to the end of the tab bar. Does not change the selection.
    pub fn insert(&mut self, tab: Tab) -> TabId {
        let id = tab.id;
        debug!("Added tab {} for {}", id, tab.path.display());
        self.tabs.push(tab);
        id
    }

    /// Point the selection at `id`.
    ///
    /// Returns `false` and leaves the selection alone if `id` is unknown.
    pub fn select(&mut self, id: TabId) -> bool {
        if self.position(id).is_none() {
            return false;
        }
        self.selected = Some(id);
        true
    }

    /// Remove a tab, returning its former index and the tab.
    ///
    /// If it was selected the selection is cleared; the caller decides what
    /// to select next.
    pub fn remove(&mut self, id: TabId) -> Option<(usize, Tab)> {
        let index = self.position(id)?;
        let tab = self.tabs.remove(index);
        if self.selected == Some(id) {
            self.selected = None;
        }
        debug!("Removed tab {} at index {}", id, index);
        Some((index, tab))
    }

    /// Remove every tab and clear the selection.
    pub fn clear(&mut self) {
        self.tabs.clear();
        self.selected = None;
    }

    /// The tab `offset` places away from the selection, wrapping around.
    ///
    /// `None` with fewer than two tabs or no selection.
    pub fn cycle_from_selected(&self, offset: isize) -> Option<TabId> {
        if self.tabs.len() < 2 {
            return None;
        }
        let index = self.selected_index()?;
        let len = self.tabs.len() as isize;
        let next = (index as isize + offset).rem_euclid(len) as usize;
        self.id_at(next)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
