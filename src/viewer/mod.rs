//! simview desktop UI

mod app;
mod gpu;
mod viewport;

use std::path::PathBuf;
use anyhow::Result;

use crate::settings::Settings;

/// Run the viewer, optionally loading `initial_dir` on startup
pub fn run(initial_dir: Option<PathBuf>) -> Result<()> {
    env_logger::init();
    log::info!(
        "simview {} (built {})",
        env!("CARGO_PKG_VERSION"),
        env!("SIMVIEW_BUILD_DATE")
    );

    let settings = Settings::load();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([settings.window_width, settings.window_height])
            .with_min_inner_size([480.0, 320.0])
            .with_title("simview"),
        renderer: eframe::Renderer::Wgpu,
        ..Default::default()
    };

    eframe::run_native(
        "simview",
        options,
        Box::new(move |cc| Ok(Box::new(app::ViewerApp::new(cc, settings, initial_dir)))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run: {}", e))
}
