//! Application lifecycle for mdpreview
//!
//! `App` is constructed once at process start and owns the workspace engine,
//! the renderer and the launch state. It turns command-line arguments into
//! open documents, pumps engine events, and re-renders the selected document
//! whenever its content or the custom stylesheet changes.

use crate::config::Settings;
use crate::files::{classify_path, is_markdown_path, language_for_path, FileClass};
use crate::preview::{DocumentKind, RenderRequest, Renderer};
use crate::state::{WorkspaceEngine, WorkspaceSnapshot};
use crate::workspaces::{SessionStore, TabId};
use log::{debug, info, warn};
use std::path::Path;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Duration;

/// What was last handed to the renderer.
#[derive(Debug, Clone, PartialEq)]
struct RenderKey {
    tab: TabId,
    content_revision: u64,
    custom_css: Arc<str>,
}

/// The application: one workspace presented through one renderer.
pub struct App {
    settings: Settings,
    engine: WorkspaceEngine,
    updates: Receiver<WorkspaceSnapshot>,
    renderer: Box<dyn Renderer>,
    /// Set by the first `launch`; later launches are ignored
    first_window_initialized: bool,
    last_render: Option<RenderKey>,
}

impl App {
    pub fn new(
        settings: Settings,
        store: impl SessionStore + 'static,
        renderer: impl Renderer + 'static,
    ) -> Self {
        let mut engine = WorkspaceEngine::new(settings.engine_options(), store);
        let updates = engine.subscribe();
        Self {
            settings,
            engine,
            updates,
            renderer: Box::new(renderer),
            first_window_initialized: false,
            last_render: None,
        }
    }

    pub fn engine(&self) -> &WorkspaceEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut WorkspaceEngine {
        &mut self.engine
    }

    pub fn is_first_window_initialized(&self) -> bool {
        self.first_window_initialized
    }

    /// Whether there is anything to show: an open tab or a directory.
    pub fn has_documents(&self) -> bool {
        self.engine.tab_count() > 0 || self.engine.directory().is_some()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Open the paths in `args`, or restore the last session if there are none.
    ///
    /// Arguments starting with `-` are reserved and skipped. Only the first
    /// call does anything.
    pub fn launch(&mut self, args: &[String], working_dir: &Path) {
        if self.first_window_initialized {
            debug!("Ignoring repeated launch");
            return;
        }
        self.first_window_initialized = true;

        let paths: Vec<&str> = args
            .iter()
            .map(String::as_str)
            .filter(|arg| !arg.starts_with('-'))
            .collect();

        if paths.is_empty() {
            if self.settings.restore_session {
                info!("Restoring previous session");
                self.engine.restore_state();
            }
        } else {
            for path in paths {
                self.engine.open_from_path(path, working_dir);
            }
        }

        self.pump(Duration::ZERO);
    }

    /// Apply pending engine events, waiting up to `timeout` for the first.
    ///
    /// Returns `true` if the renderer was invoked.
    pub fn pump(&mut self, timeout: Duration) -> bool {
        self.engine.wait_for_events(timeout);

        if let Some(error) = self.engine.error() {
            warn!("{}", error);
            self.engine.dismiss_error();
        }

        match self.updates.try_iter().last() {
            Some(snapshot) => self.render(&snapshot),
            None => false,
        }
    }

    /// Persist the session and stop watching.
    pub fn shutdown(&mut self) {
        info!("Shutting down");
        self.engine.shutdown();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Rendering
    // ─────────────────────────────────────────────────────────────────────────

    fn render(&mut self, snapshot: &WorkspaceSnapshot) -> bool {
        let Some(tab) = snapshot.selected_tab() else {
            return false;
        };
        if snapshot.is_loading {
            return false;
        }

        let key = RenderKey {
            tab: tab.id(),
            content_revision: snapshot.content_revision,
            custom_css: Arc::clone(&snapshot.custom_css),
        };
        if self.last_render.as_ref() == Some(&key) {
            return false;
        }

        let Some(kind) = document_kind(tab.path()) else {
            info!("Not previewing binary file {}", tab.path().display());
            self.last_render = Some(key);
            return false;
        };

        let title = tab.name();
        let request = RenderRequest {
            content: &snapshot.content,
            title: &title,
            base_dir: tab.directory(),
            custom_css: &snapshot.custom_css,
            kind,
        };

        match self.renderer.render(&request) {
            Ok(()) => {
                self.last_render = Some(key);
                true
            }
            Err(e) => {
                warn!("Failed to render {}: {}", title, e);
                false
            }
        }
    }
}

/// How to present the file at `path`; `None` for binary files.
pub fn document_kind(path: &Path) -> Option<DocumentKind> {
    if is_markdown_path(path) {
        return Some(DocumentKind::Markdown);
    }
    match classify_path(path) {
        FileClass::Text => Some(DocumentKind::Source {
            language: language_for_path(path).map(str::to_string),
        }),
        FileClass::Binary => None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::workspaces::{MemoryStore, SessionState};
    use std::fs;
    use std::sync::Mutex;
    use std::time::Instant;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq)]
    struct Rendered {
        title: String,
        content: String,
        css: String,
        kind: DocumentKind,
    }

    #[derive(Clone, Default)]
    struct RecordingRenderer {
        calls: Arc<Mutex<Vec<Rendered>>>,
    }

    impl RecordingRenderer {
        fn calls(&self) -> Vec<Rendered> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Renderer for RecordingRenderer {
        fn render(&mut self, request: &RenderRequest<'_>) -> Result<()> {
            self.calls.lock().unwrap().push(Rendered {
                title: request.title.to_string(),
                content: request.content.to_string(),
                css: request.custom_css.to_string(),
                kind: request.kind.clone(),
            });
            Ok(())
        }
    }

    fn settings() -> Settings {
        Settings {
            debounce_interval_ms: 50,
            rename_grace_ms: 20,
            ..Settings::default()
        }
    }

    fn app(store: MemoryStore) -> (App, RecordingRenderer) {
        let renderer = RecordingRenderer::default();
        (App::new(settings(), store, renderer.clone()), renderer)
    }

    #[test]
    fn test_launch_opens_arguments() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.md"), "# A").unwrap();
        let (mut app, renderer) = app(MemoryStore::new());

        let args = vec!["--verbose".to_string(), "a.md".to_string()];
        app.launch(&args, dir.path());

        assert!(app.is_first_window_initialized());
        assert!(app.has_documents());
        assert_eq!(app.engine().tab_count(), 1);

        let calls = renderer.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].title, "a.md");
        assert_eq!(calls[0].content, "# A");
        assert_eq!(calls[0].kind, DocumentKind::Markdown);
    }

    #[test]
    fn test_launch_only_once() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.md"), "a").unwrap();
        fs::write(dir.path().join("b.md"), "b").unwrap();
        let (mut app, _) = app(MemoryStore::new());

        app.launch(&["a.md".to_string()], dir.path());
        app.launch(&["b.md".to_string()], dir.path());
        assert_eq!(app.engine().tab_count(), 1);
    }

    #[test]
    fn test_launch_without_arguments_restores() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("notes.md");
        fs::write(&file, "remembered").unwrap();

        let store = MemoryStore::new();
        let mut seed = store.clone();
        SessionState {
            open_tabs: vec![file],
            selected_tab: Some(0),
            ..SessionState::default()
        }
        .save(&mut seed)
        .unwrap();

        let (mut app, renderer) = app(store);
        app.launch(&[], dir.path());

        assert_eq!(app.engine().content(), "remembered");
        assert_eq!(renderer.calls().len(), 1);
    }

    #[test]
    fn test_launch_without_restore() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("notes.md");
        fs::write(&file, "remembered").unwrap();
        let store = MemoryStore::new();
        let mut seed = store.clone();
        SessionState {
            open_tabs: vec![file],
            ..SessionState::default()
        }
        .save(&mut seed)
        .unwrap();

        let mut app = App::new(
            Settings {
                restore_session: false,
                ..settings()
            },
            store,
            RecordingRenderer::default(),
        );
        app.launch(&[], dir.path());
        assert!(!app.has_documents());
    }

    #[test]
    fn test_pump_renders_external_change() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("live.md");
        fs::write(&file, "v1").unwrap();
        let (mut app, renderer) = app(MemoryStore::new());
        app.launch(&["live.md".to_string()], dir.path());

        std::thread::sleep(Duration::from_millis(100));
        fs::write(&file, "v2").unwrap();

        let start = Instant::now();
        while start.elapsed() < Duration::from_secs(3) {
            if app.pump(Duration::from_millis(20)) {
                break;
            }
        }
        let calls = renderer.calls();
        assert_eq!(calls.last().unwrap().content, "v2");
    }

    #[test]
    fn test_pump_without_changes_does_not_render() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.md"), "a").unwrap();
        let (mut app, renderer) = app(MemoryStore::new());
        app.launch(&["a.md".to_string()], dir.path());

        assert!(!app.pump(Duration::from_millis(10)));
        assert_eq!(renderer.calls().len(), 1);
    }

    #[test]
    fn test_stylesheet_change_rerenders() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.md"), "a").unwrap();
        let css = dir.path().join("style.css");
        fs::write(&css, "p { margin: 0; }").unwrap();
        let (mut app, renderer) = app(MemoryStore::new());
        app.launch(&["a.md".to_string()], dir.path());

        app.engine_mut().set_custom_css_path(&css);
        assert!(app.pump(Duration::ZERO));
        assert_eq!(renderer.calls().last().unwrap().css, "p { margin: 0; }");
    }

    #[test]
    fn test_source_file_rendered_as_source() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("main.rs"), "fn main() {}").unwrap();
        let (mut app, renderer) = app(MemoryStore::new());
        app.launch(&["main.rs".to_string()], dir.path());

        assert_eq!(
            renderer.calls()[0].kind,
            DocumentKind::Source {
                language: Some("rust".to_string())
            }
        );
    }

    #[test]
    fn test_binary_file_skipped_and_error_acknowledged() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("image.png"), [0x89, b'P', b'N', b'G', 0, 0]).unwrap();
        let (mut app, renderer) = app(MemoryStore::new());
        app.launch(&["image.png".to_string()], dir.path());

        assert!(renderer.calls().is_empty());
        assert!(app.engine().error().is_none());
    }

    #[test]
    fn test_missing_argument_reports_and_clears() {
        let dir = TempDir::new().unwrap();
        let (mut app, renderer) = app(MemoryStore::new());
        app.launch(&["missing.md".to_string()], dir.path());

        assert!(!app.has_documents());
        assert!(app.engine().error().is_none());
        assert!(renderer.calls().is_empty());
    }

    #[test]
    fn test_shutdown_saves_session_and_stops_watching() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.md"), "# A").unwrap();
        let store = MemoryStore::new();
        let (mut app, _renderer) = app(store.clone());
        app.launch(&["a.md".to_string()], dir.path());
        assert!(app.engine().is_watching());

        app.shutdown();

        assert!(!app.engine().is_watching());
        let session = SessionState::load(&store);
        assert_eq!(session.open_tabs.len(), 1);
        assert_eq!(session.selected_tab, Some(0));
    }

    #[test]
    fn test_document_kind() {
        let dir = TempDir::new().unwrap();
        let unknown_text = dir.path().join("NOTES");
        fs::write(&unknown_text, "plain words").unwrap();

        assert_eq!(document_kind(Path::new("/x/readme.MD")), Some(DocumentKind::Markdown));
        assert_eq!(
            document_kind(&unknown_text),
            Some(DocumentKind::Source { language: None })
        );
        assert_eq!(document_kind(Path::new("/x/photo.png")), None);
    }
}
