use eframe::egui;
use parallel_explorer::app::ExplorerApp;
use parallel_explorer::config::ExplorerConfig;

fn main() -> eframe::Result {
    env_logger::init();

    let config = ExplorerConfig::default();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_min_inner_size(config.min_window_size),
        ..Default::default()
    };

    eframe::run_native(
        "Parallel Explorer",
        options,
        Box::new(|_cc| Ok(Box::new(ExplorerApp::new(config)))),
    )
}
