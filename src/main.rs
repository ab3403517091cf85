use anyhow::Result;
use std::env;
use std::path::PathBuf;
use trail_renderer::{TrailApp, TrailOptions};

fn main() -> Result<()> {
    env_logger::init();

    log::info!("Starting trail renderer demo...");

    // Optional RON options file as the first argument
    let options_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("trail_options.ron"));

    log::info!("Using options file: {}", options_path.display());
    let options = TrailOptions::load(&options_path)?;

    let app = TrailApp::new(options);
    app.run()
}
