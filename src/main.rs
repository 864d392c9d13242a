mod app;
mod color;
mod state;
mod ui;

use anyhow::Context;
use app::RustyDashApp;
use clap::Parser;
use eframe::egui;
use rusty_dash::config::{Cli, DashboardConfig};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = DashboardConfig::resolve(&cli)?;
    let title = config.title.clone();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(|cc| {
            // Install image loaders so egui can render the logo from disk.
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(RustyDashApp::new(config)))
        }),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
    .context("running the dashboard window")
}
