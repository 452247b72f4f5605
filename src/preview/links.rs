//! Relative link handling for rendered documents.
//!
//! Markdown written next to its assets refers to them with relative paths.
//! Once rendered into a standalone HTML file somewhere else those paths no
//! longer resolve, so they are rewritten to absolute `file://` URLs against
//! the document's directory. The same scan also finds links to local files
//! that do not exist.

use log::warn;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// `[text](target)` or `![alt](target "title")`.
const LINK_PATTERN: &str = r#"(!?)\[[^\]]*\]\(([^)\s]+)(?:\s+"[^"]*")?\)"#;

/// Target prefixes that are left untouched.
const ABSOLUTE_PREFIXES: &[&str] = &[
    "/", "#", "http://", "https://", "file://", "data:", "mailto:",
];

static LINK_REGEX: OnceLock<Option<Regex>> = OnceLock::new();

fn link_regex() -> Option<&'static Regex> {
    LINK_REGEX
        .get_or_init(|| match Regex::new(LINK_PATTERN) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!("Invalid link pattern: {}", e);
                None
            }
        })
        .as_ref()
}

/// A link or image target found in Markdown text.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LinkTarget<'a> {
    is_image: bool,
    target: &'a str,
    /// Byte range of `target` in the source text
    start: usize,
    end: usize,
}

fn scan(markdown: &str) -> Vec<LinkTarget<'_>> {
    let Some(re) = link_regex() else {
        return Vec::new();
    };
    re.captures_iter(markdown)
        .filter_map(|caps| {
            let bang = caps.get(1)?;
            let target = caps.get(2)?;
            Some(LinkTarget {
                is_image: !bang.as_str().is_empty(),
                target: target.as_str(),
                start: target.start(),
                end: target.end(),
            })
        })
        .collect()
}

/// Whether `target` is relative to the document's directory.
fn is_relative_target(target: &str) -> bool {
    let lower = target.to_ascii_lowercase();
    !ABSOLUTE_PREFIXES.iter().any(|p| lower.starts_with(p)) && !Path::new(target).is_absolute()
}

// ─────────────────────────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────────────────────────

/// Rewrite relative link and image targets to `file://` URLs under `base_dir`.
///
/// Absolute paths, URLs with a known scheme and same-page anchors are kept.
pub fn rewrite_relative_paths(markdown: &str, base_dir: &Path) -> String {
    let base = base_dir.to_string_lossy();
    let base = base.trim_end_matches('/');
    let mut output = markdown.to_string();

    // Back to front so earlier offsets stay valid
    for link in scan(markdown).into_iter().rev() {
        if !is_relative_target(link.target) {
            continue;
        }
        let relative = link.target.strip_prefix("./").unwrap_or(link.target);
        let absolute = format!("file://{}/{}", base, relative);
        output.replace_range(link.start..link.end, &absolute);
    }

    output
}

/// Relative link targets (not images) with no file under `base_dir`.
///
/// Fragments are ignored when checking existence. Each target is reported
/// once, in document order.
pub fn extract_local_links(markdown: &str, base_dir: &Path) -> Vec<String> {
    let mut missing: Vec<String> = Vec::new();

    for link in scan(markdown) {
        if link.is_image || !is_relative_target(link.target) {
            continue;
        }
        let without_fragment = link.target.split('#').next().unwrap_or_default();
        let relative = without_fragment
            .strip_prefix("./")
            .unwrap_or(without_fragment);
        if relative.is_empty() || base_dir.join(relative).exists() {
            continue;
        }
        if !missing.iter().any(|m| m == relative) {
            missing.push(relative.to_string());
        }
    }

    missing
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
