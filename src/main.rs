mod app;
mod color;
mod config;
mod data;
mod error;
mod pipeline;
mod session;
mod state;
mod tuning;
mod ui;

use app::ColorSenseApp;
use config::AppConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = match AppConfig::from_args() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e:#}; falling back to defaults");
            AppConfig::default()
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Color Sense – Colour Pose Recognizer",
        options,
        Box::new(move |_cc| Ok(Box::new(ColorSenseApp::new(config)))),
    )
}
