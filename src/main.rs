mod analysis;
mod app;
mod color;
mod data;
mod state;
mod ui;

use app::ContinuumLabApp;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([640.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Continuum Lab – Spectral Band Analysis",
        options,
        Box::new(|_cc| Ok(Box::new(ContinuumLabApp::default()))),
    )
}
