//! Path resolution and standardization.
//!
//! Turns user-supplied path strings (command-line arguments, drag targets)
//! into absolute paths, and produces the standardized form used as tab
//! identity.

use std::path::{Component, Path, PathBuf};

/// Resolve a user-supplied path string to an absolute path.
///
/// Checked in order:
/// 1. absolute paths are returned unchanged
/// 2. `~` and `~/...` expand against the user's home directory
/// 3. anything else is joined onto `working_dir`
///
/// No filesystem access beyond reading the home directory.
pub fn resolve(input: &str, working_dir: &Path) -> PathBuf {
    let path = Path::new(input);
    if path.is_absolute() {
        return path.to_path_buf();
    }

    if let Some(expanded) = expand_home(input) {
        return expanded;
    }

    working_dir.join(path)
}

/// Expand a leading `~` against the home directory.
///
/// Returns `None` when the input has no tilde prefix or the home directory
/// cannot be determined. `~user` forms are left alone.
fn expand_home(input: &str) -> Option<PathBuf> {
    let rest = if input == "~" {
        ""
    } else {
        input
            .strip_prefix("~/")
            .or_else(|| input.strip_prefix("~\\"))?
    };
    let home = dirs::home_dir()?;
    Some(if rest.is_empty() { home } else { home.join(rest) })
}

/// Standardize a path for identity comparison.
///
/// Symlinks and `.`/`..` components are resolved through the filesystem when
/// the path exists; otherwise the path is normalized lexically so that two
/// spellings of the same missing path still compare equal.
pub fn standardize(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| normalize_lexically(path))
}

/// Remove `.` components and fold `..` into the preceding component.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Last path component as a display string.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
