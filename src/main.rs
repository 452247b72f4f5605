//! mdpreview - Main Entry Point
//!
//! Opens the files and directories given on the command line (or the previous
//! session) and keeps an HTML preview of the selected document up to date.

use log::{error, info, warn};
use mdpreview::config::{
    default_preview_path, get_config_file_path, load_config, save_config, Settings,
};
use mdpreview::preview::HtmlFileRenderer;
use mdpreview::workspaces::JsonFileStore;
use mdpreview::App;
use signal_hook::consts::{SIGINT, SIGTERM};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Application name constant.
const APP_NAME: &str = "mdpreview";

/// How long each loop iteration waits for filesystem events.
const PUMP_INTERVAL: Duration = Duration::from_millis(250);

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Starting {}", APP_NAME);

    let settings = load_config();
    write_default_config(&settings);

    let store = match JsonFileStore::open_default() {
        Ok(store) => store,
        Err(e) => {
            error!("Cannot open session store: {}", e);
            std::process::exit(1);
        }
    };

    let output = settings
        .preview_output
        .clone()
        .unwrap_or_else(default_preview_path);
    info!("Writing preview to {}", output.display());
    let renderer = HtmlFileRenderer::new(output, settings.open_preview);

    let working_dir = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            error!("Cannot determine working directory: {}", e);
            std::process::exit(1);
        }
    };
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut app = App::new(settings, store, renderer);
    app.launch(&args, &working_dir);

    if !app.has_documents() {
        eprintln!("Usage: {} [FILE|DIRECTORY]...", APP_NAME);
        eprintln!("Nothing to preview.");
        app.shutdown();
        std::process::exit(2);
    }

    let stop = Arc::new(AtomicBool::new(false));
    for signal in [SIGINT, SIGTERM] {
        if let Err(e) = signal_hook::flag::register(signal, Arc::clone(&stop)) {
            warn!("Cannot handle signal {}: {}", signal, e);
        }
    }

    while !stop.load(Ordering::Relaxed) {
        app.pump(PUMP_INTERVAL);
        if !app.has_documents() {
            info!("Nothing left to preview");
            break;
        }
    }

    info!("Shutting down {}", APP_NAME);
    app.shutdown();
}

/// Leave an editable config file behind on first run.
fn write_default_config(settings: &Settings) {
    match get_config_file_path() {
        Ok(path) if !path.exists() => {
            if let Err(e) = save_config(settings) {
                warn!("Could not write default configuration: {}", e);
            }
        }
        Ok(_) => {}
        Err(e) => warn!("Configuration directory unavailable: {}", e),
    }
}
