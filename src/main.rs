#![cfg_attr(all(not(debug_assertions), target_os = "windows"), windows_subsystem = "windows")]

use bulk_image_converter::{app::ConverterApp, config::AppConfig, logging, preferences::JsonFileStore};
use eframe::egui;

fn main() -> eframe::Result<()> {
    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }
    let config = AppConfig::load();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([640.0, 480.0])
            .with_drag_and_drop(true)
            .with_title("Bulk Image Converter"),
        ..Default::default()
    };
    eframe::run_native(
        "Bulk Image Converter",
        options,
        Box::new(move |cc| {
            Ok(Box::new(ConverterApp::new(
                cc,
                config,
                Box::new(JsonFileStore::user_default()),
            )))
        }),
    )
}
