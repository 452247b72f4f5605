//! HTML preview rendering
//!
//! This module turns the selected document into a standalone HTML page with
//! inlined base and custom CSS, written to a fixed output file that a browser
//! can keep open and refresh.

use super::highlight::get_highlighter;
use super::links::{extract_local_links, rewrite_relative_paths};
use crate::config::write_atomic;
use crate::error::Result;
use comrak::{markdown_to_html, Options};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

// ─────────────────────────────────────────────────────────────────────────────
// Render Request
// ─────────────────────────────────────────────────────────────────────────────

/// How the content of a document should be presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentKind {
    /// Rendered Markdown
    Markdown,
    /// Plain text shown verbatim, optionally tagged with a language
    Source { language: Option<String> },
}

/// Everything a renderer needs to present one document.
#[derive(Debug, Clone)]
pub struct RenderRequest<'a> {
    pub content: &'a str,
    pub title: &'a str,
    /// Directory that relative links resolve against
    pub base_dir: Option<&'a Path>,
    pub custom_css: &'a str,
    pub kind: DocumentKind,
}

/// Presents documents. Output is not inspected by the caller.
pub trait Renderer {
    fn render(&mut self, request: &RenderRequest<'_>) -> Result<()>;
}

// ─────────────────────────────────────────────────────────────────────────────
// HTML File Renderer
// ─────────────────────────────────────────────────────────────────────────────

/// Renders to a standalone HTML file, optionally opened in the browser once.
#[derive(Debug)]
pub struct HtmlFileRenderer {
    output: PathBuf,
    open_in_browser: bool,
    opened: bool,
}

impl HtmlFileRenderer {
    pub fn new(output: PathBuf, open_in_browser: bool) -> Self {
        Self {
            output,
            open_in_browser,
            opened: false,
        }
    }

    /// Path of the generated HTML file.
    pub fn output(&self) -> &Path {
        &self.output
    }
}

impl Renderer for HtmlFileRenderer {
    fn render(&mut self, request: &RenderRequest<'_>) -> Result<()> {
        let (body, syntax_css) = match &request.kind {
            DocumentKind::Markdown => {
                if let Some(base) = request.base_dir {
                    for link in extract_local_links(request.content, base) {
                        warn!("Broken link in {}: {}", request.title, link);
                    }
                }
                (markdown_to_html_body(request.content, request.base_dir), "")
            }
            DocumentKind::Source { language } => (
                source_to_html_body(request.content, language.as_deref()),
                get_highlighter().theme_css(),
            ),
        };

        let html = generate_html_document(&body, request.title, syntax_css, request.custom_css);
        write_atomic(&self.output, "preview.html.tmp", html.as_bytes())?;
        debug!("Rendered {} to {}", request.title, self.output.display());

        if self.open_in_browser && !self.opened {
            self.opened = true;
            match open::that(&self.output) {
                Ok(()) => info!("Opened preview {}", self.output.display()),
                Err(e) => warn!("Could not open preview in browser: {}", e),
            }
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HTML Generation
// ─────────────────────────────────────────────────────────────────────────────

/// Convert markdown to an HTML fragment, resolving relative links first.
pub fn markdown_to_html_body(markdown: &str, base_dir: Option<&Path>) -> String {
    let mut options = Options::default();

    // Enable common extensions
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;
    options.extension.header_ids = Some(String::new());

    // Render options
    options.render.unsafe_ = true; // Allow raw HTML

    match base_dir {
        Some(base) => markdown_to_html(&rewrite_relative_paths(markdown, base), &options),
        None => markdown_to_html(markdown, &options),
    }
}

/// Wrap source text in a code block, highlighted when the language is known.
pub fn source_to_html_body(source: &str, language: Option<&str>) -> String {
    let class = language
        .map(|lang| format!(" class=\"language-{}\"", html_escape(lang)))
        .unwrap_or_default();
    let code = language
        .and_then(|lang| get_highlighter().highlight_html(source, lang))
        .unwrap_or_else(|| html_escape(source));
    format!("<pre><code{}>{}</code></pre>\n", class, code)
}

/// Generate a complete HTML document around a rendered body.
///
/// `custom_css` comes last so user rules override the built-in ones.
pub fn generate_html_document(
    body: &str,
    title: &str,
    syntax_css: &str,
    custom_css: &str,
) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <meta name="generator" content="mdpreview">
    <title>{title}</title>
    <style>
{base_css}
{syntax_css}
    </style>
    <style id="custom-css">
{custom_css}
    </style>
</head>
<body>
    <article class="markdown-body">
{body}
    </article>
</body>
</html>"#,
        title = html_escape(title),
        base_css = BASE_CSS,
        syntax_css = syntax_css,
        custom_css = custom_css,
        body = body,
    )
}

/// HTML-escape a string.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

// ─────────────────────────────────────────────────────────────────────────────
// CSS
// ─────────────────────────────────────────────────────────────────────────────

/// Base CSS for the preview (layout, typography, light and dark colors).
const BASE_CSS: &str = r#"
*, *::before, *::after {
    box-sizing: border-box;
}

:root {
    color-scheme: light dark;
    --fg: #1f2328;
    --bg: #ffffff;
    --muted: #59636e;
    --border: #d1d9e0;
    --code-bg: #f6f8fa;
    --link: #0969da;
}

@media (prefers-color-scheme: dark) {
    :root {
        --fg: #e6edf3;
        --bg: #0d1117;
        --muted: #9198a1;
        --border: #3d444d;
        --code-bg: #151b23;
        --link: #4493f8;
    }
}

body {
    margin: 0;
    padding: 0;
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Noto Sans', Helvetica, Arial, sans-serif;
    font-size: 16px;
    line-height: 1.6;
    color: var(--fg);
    background-color: var(--bg);
}

.markdown-body {
    max-width: 900px;
    margin: 0 auto;
    padding: 32px 24px;
}

.markdown-body h1,
.markdown-body h2,
.markdown-body h3,
.markdown-body h4,
.markdown-body h5,
.markdown-body h6 {
    margin-top: 24px;
    margin-bottom: 16px;
    font-weight: 600;
    line-height: 1.25;
}

.markdown-body h1 { font-size: 2em; border-bottom: 1px solid var(--border); padding-bottom: 0.3em; }
.markdown-body h2 { font-size: 1.5em; border-bottom: 1px solid var(--border); padding-bottom: 0.3em; }
.markdown-body h3 { font-size: 1.25em; }

.markdown-body p,
.markdown-body ul,
.markdown-body ol,
.markdown-body table,
.markdown-body pre {
    margin-top: 0;
    margin-bottom: 16px;
}

.markdown-body a { color: var(--link); text-decoration: none; }
.markdown-body a:hover { text-decoration: underline; }

.markdown-body ul,
.markdown-body ol {
    padding-left: 2em;
}

.markdown-body ul.contains-task-list {
    list-style-type: none;
    padding-left: 0;
}

.markdown-body blockquote {
    margin: 0 0 16px 0;
    padding: 0 1em;
    color: var(--muted);
    border-left: 4px solid var(--border);
}

.markdown-body code {
    font-family: 'JetBrains Mono', 'Fira Code', 'Consolas', 'Monaco', monospace;
    font-size: 0.9em;
    padding: 0.2em 0.4em;
    border-radius: 4px;
    background-color: var(--code-bg);
}

.markdown-body pre {
    padding: 16px;
    overflow: auto;
    border-radius: 6px;
    line-height: 1.45;
    background-color: var(--code-bg);
}

.markdown-body pre code {
    padding: 0;
    background: transparent;
}

.markdown-body table {
    border-collapse: collapse;
}

.markdown-body th,
.markdown-body td {
    padding: 8px 12px;
    border: 1px solid var(--border);
}

.markdown-body img {
    max-width: 100%;
    height: auto;
}

.markdown-body hr {
    height: 2px;
    margin: 24px 0;
    border: none;
    background-color: var(--border);
}
"#;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
