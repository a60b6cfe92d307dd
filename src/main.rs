mod app;
mod color;
mod config;
mod data;
mod error;
mod export;
mod render;
mod state;
mod ui;

use app::IvGrapherApp;
use config::AppConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();
    let config = AppConfig::load();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Smart I-V & J-V Grapher",
        options,
        Box::new(|_cc| Ok(Box::new(IvGrapherApp::new(config)))),
    )
}
