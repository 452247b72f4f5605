//! Syntax highlighting for source previews
//!
//! This module integrates syntect to highlight non-Markdown text files:
//! - Loads and caches syntect SyntaxSet and ThemeSet
//! - Emits class-annotated HTML spans
//! - Generates matching light and dark stylesheets

use log::{debug, warn};
use std::sync::OnceLock;
use syntect::highlighting::ThemeSet;
use syntect::html::{css_for_theme_with_class_style, ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

/// Prefix for every generated CSS class, keeping them apart from page styles.
const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "hl-" };

/// Built-in theme used with a light color scheme
const LIGHT_THEME: &str = "InspiredGitHub";

/// Built-in theme used with a dark color scheme
const DARK_THEME: &str = "base16-ocean.dark";

/// Highlighter holding the loaded syntax definitions and theme stylesheet.
pub struct SourceHighlighter {
    syntax_set: SyntaxSet,
    css: String,
}

impl Default for SourceHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceHighlighter {
    /// Load the syntaxes and themes bundled with syntect.
    pub fn new() -> Self {
        debug!("Loading syntect syntax and theme sets");
        let syntax_set = SyntaxSet::load_defaults_newlines();
        let theme_set = ThemeSet::load_defaults();

        let theme_css = |name: &str| {
            let theme = theme_set.themes.get(name)?;
            match css_for_theme_with_class_style(theme, CLASS_STYLE) {
                Ok(css) => Some(css),
                Err(e) => {
                    warn!("Could not generate CSS for theme {}: {}", name, e);
                    None
                }
            }
        };

        let mut css = theme_css(LIGHT_THEME).unwrap_or_default();
        if let Some(dark) = theme_css(DARK_THEME) {
            css.push_str("\n@media (prefers-color-scheme: dark) {\n");
            css.push_str(&dark);
            css.push_str("\n}\n");
        }

        Self { syntax_set, css }
    }

    /// Stylesheet for the classes emitted by `highlight_html`.
    pub fn theme_css(&self) -> &str {
        &self.css
    }

    /// Highlight `code` as `language`, returning HTML spans.
    ///
    /// `None` when the language is unknown or highlighting fails; callers fall
    /// back to escaped plain text.
    pub fn highlight_html(&self, code: &str, language: &str) -> Option<String> {
        let syntax = self.find_syntax(language)?;
        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, &self.syntax_set, CLASS_STYLE);
        for line in LinesWithEndings::from(code) {
            if let Err(e) = generator.parse_html_for_line_which_includes_newline(line) {
                warn!("Highlighting as {} failed: {}", language, e);
                return None;
            }
        }
        Some(generator.finalize())
    }

    /// Find a syntax for a language name from the classification tables.
    fn find_syntax(&self, language: &str) -> Option<&SyntaxReference> {
        let extension = match language {
            "" | "plaintext" => return None,
            "rust" => "rs",
            "python" => "py",
            "ruby" => "rb",
            "javascript" => "js",
            "typescript" => "ts",
            "objectivec" => "m",
            "shell" => "sh",
            "makefile" => "Makefile",
            "markdown" => "md",
            other => other,
        };

        self.syntax_set
            .find_syntax_by_extension(extension)
            .or_else(|| self.syntax_set.find_syntax_by_token(language))
    }
}

static HIGHLIGHTER: OnceLock<SourceHighlighter> = OnceLock::new();

/// Get or create the global highlighter.
pub fn get_highlighter() -> &'static SourceHighlighter {
    HIGHLIGHTER.get_or_init(SourceHighlighter::new)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
