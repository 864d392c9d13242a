use eframe::egui;

use rusty_dash::config::DashboardConfig;

use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct RustyDashApp {
    pub state: AppState,
}

impl RustyDashApp {
    /// Build the app, opening the configured dataset if there is one.
    pub fn new(config: DashboardConfig) -> Self {
        let dataset = config.dataset.clone();
        let mut state = AppState::new(config);
        if let Some(path) = dataset {
            state.load_path(&path);
        }
        Self { state }
    }
}

impl eframe::App for RustyDashApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: charts ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::charts(ui, &self.state);
        });
    }
}
