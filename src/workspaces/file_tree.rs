//! File tree data structures and directory scanning.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

/// Generated and vendored directory names that are never listed.
///
/// Version-control internals such as `.git` are not on this list; they are
/// governed by the hidden-files preference like any other dot entry.
pub const SKIPPED_DIRECTORIES: &[&str] = &[
    "node_modules",
    "build",
    ".build",
    "DerivedData",
    "Pods",
    ".next",
    "dist",
    "target",
    "__pycache__",
    ".venv",
    "venv",
    ".tox",
    ".cache",
];

// ─────────────────────────────────────────────────────────────────────────────
// File Tree Node
// ─────────────────────────────────────────────────────────────────────────────

/// A node in the file tree representing a file or directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTreeNode {
    /// Display name of the file or folder
    pub name: String,

    /// Full path to this item
    pub path: PathBuf,

    /// Type of node (file or directory with children)
    pub kind: FileTreeNodeKind,
}

/// The kind of file tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileTreeNodeKind {
    /// A regular file
    File,

    /// A directory with children (never empty)
    Directory {
        /// Child nodes (files and subdirectories)
        children: Vec<FileTreeNode>,
    },
}

impl FileTreeNode {
    /// Create a new file node.
    pub fn file(name: String, path: PathBuf) -> Self {
        Self {
            name,
            path,
            kind: FileTreeNodeKind::File,
        }
    }

    /// Create a new directory node.
    pub fn directory(name: String, path: PathBuf, children: Vec<FileTreeNode>) -> Self {
        Self {
            name,
            path,
            kind: FileTreeNodeKind::Directory { children },
        }
    }

    /// Check if this node is a directory.
    pub fn is_directory(&self) -> bool {
        matches!(self.kind, FileTreeNodeKind::Directory { .. })
    }

    /// Check if this node is a file.
    pub fn is_file(&self) -> bool {
        matches!(self.kind, FileTreeNodeKind::File)
    }

    /// Get children if this is a directory.
    pub fn children(&self) -> Option<&[FileTreeNode]> {
        match &self.kind {
            FileTreeNodeKind::Directory { children } => Some(children),
            FileTreeNodeKind::File => None,
        }
    }

    /// Find a node by path.
    pub fn find(&self, target_path: &Path) -> Option<&FileTreeNode> {
        if self.path == target_path {
            return Some(self);
        }

        if let FileTreeNodeKind::Directory { children } = &self.kind {
            for child in children {
                if let Some(found) = child.find(target_path) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Count all files in this tree (recursive).
    pub fn file_count(&self) -> usize {
        match &self.kind {
            FileTreeNodeKind::File => 1,
            FileTreeNodeKind::Directory { children } => {
                children.iter().map(|c| c.file_count()).sum()
            }
        }
    }
}

/// Count all files across a forest of nodes.
pub fn file_count(nodes: &[FileTreeNode]) -> usize {
    nodes.iter().map(FileTreeNode::file_count).sum()
}

// ─────────────────────────────────────────────────────────────────────────────
// Directory Scanning
// ─────────────────────────────────────────────────────────────────────────────

/// Build the sorted tree of entries below `root`.
///
/// Directories come before files; names compare case-insensitively with digit
/// runs ordered numerically. Empty directories are pruned. An unreadable root
/// yields an empty tree.
pub fn build_tree(root: &Path, show_hidden: bool) -> Vec<FileTreeNode> {
    let mut entries: Vec<FileTreeNode> = Vec::new();

    let Ok(read_dir) = std::fs::read_dir(root) else {
        return entries;
    };

    for entry in read_dir.flatten() {
        let path = entry.path();
        let name = match entry.file_name().into_string() {
            Ok(n) => n,
            Err(_) => continue, // Skip entries with invalid UTF-8 names
        };

        if !show_hidden && name.starts_with('.') {
            continue;
        }

        // Symlinks are listed as leaves and never followed
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);

        let node = if is_dir {
            if SKIPPED_DIRECTORIES.contains(&name.as_str()) {
                continue;
            }
            let children = build_tree(&path, show_hidden);
            if children.is_empty() {
                continue;
            }
            FileTreeNode::directory(name, path, children)
        } else {
            FileTreeNode::file(name, path)
        };

        entries.push(node);
    }

    entries.sort_by(|a, b| match (a.is_directory(), b.is_directory()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => natural_cmp(&a.name, &b.name),
    });

    entries
}

/// Finder-style name ordering.
///
/// Case-insensitive, with runs of ASCII digits compared by numeric value so
/// that `file2` sorts before `file10`. Names equal under that rule fall back
/// to plain byte order to keep the sort total.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let lhs = take_digits(&mut left);
                let rhs = take_digits(&mut right);
                let ord = compare_digit_runs(&lhs, &rhs);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                let ord = x.to_lowercase().cmp(y.to_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
        run.push(c);
        chars.next();
    }
    run
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
