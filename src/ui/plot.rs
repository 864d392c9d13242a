use eframe::egui::{Color32, RichText, ScrollArea, Ui};
use egui_plot::{Legend, Line, Plot, PlotPoints, Points};

use rusty_dash::viz::{ChartData, ChartSpec};

use crate::state::AppState;

const MIN_RADIUS: f32 = 2.0;
const MAX_RADIUS: f32 = 12.0;

// ---------------------------------------------------------------------------
// Charts (central panel)
// ---------------------------------------------------------------------------

/// Render every configured chart over the current view.
pub fn charts(ui: &mut Ui, state: &AppState) {
    ui.heading(&state.config.title);

    let Some(view) = state.view() else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to explore it  (File → Open…)");
        });
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for (idx, chart) in state.config.charts.iter().enumerate() {
                ui.separator();
                ui.strong(&chart.title);
                match chart.series(view) {
                    Ok(data) => chart_plot(ui, state, idx, chart, &data),
                    Err(e) => {
                        ui.label(RichText::new(format!("Cannot draw chart: {e}")).color(Color32::RED));
                    }
                }
                if let Some(caption) = &chart.caption {
                    ui.label(caption);
                }
            }
        });
}

fn chart_plot(ui: &mut Ui, state: &AppState, idx: usize, chart: &ChartSpec, data: &ChartData) {
    let color_map = chart.color.as_ref().and_then(|c| state.color_maps.get(c));
    let radius = size_scale(data);

    Plot::new(("chart", idx))
        .legend(Legend::default())
        .x_axis_label(chart.x.as_str())
        .y_axis_label(chart.y.as_str())
        .height(320.0)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for point in &data.points {
                // Determine colour from the colour-by column.
                let color = point
                    .color
                    .as_ref()
                    .and_then(|v| Some(color_map?.color_for(v)))
                    .unwrap_or(Color32::LIGHT_BLUE);

                // Legend entries group by colour value.
                let name = point
                    .color
                    .as_ref()
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| chart.y.clone());

                let marker = Points::new(vec![[point.x, point.y]])
                    .name(name)
                    .color(color)
                    .filled(true)
                    .radius(radius(point.size));
                plot_ui.points(marker);
            }

            if let Some((slope, intercept)) = data.trend {
                let (lo, hi) = data
                    .points
                    .iter()
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                        (lo.min(p.x), hi.max(p.x))
                    });
                let line: PlotPoints = [lo, hi]
                    .iter()
                    .map(|&x| [x, slope * x + intercept])
                    .collect();
                plot_ui.line(Line::new(line).name("OLS trend").color(Color32::RED).width(1.5));
            }
        });
}

/// Map size values linearly onto marker radii.
fn size_scale(data: &ChartData) -> impl Fn(Option<f64>) -> f32 {
    let (min, max) = data
        .points
        .iter()
        .filter_map(|p| p.size)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| (lo.min(s), hi.max(s)));
    let range = max - min;
    move |size| match size {
        Some(s) if range.is_finite() && range > f64::EPSILON => {
            MIN_RADIUS + (MAX_RADIUS - MIN_RADIUS) * ((s - min) / range) as f32
        }
        Some(_) => (MIN_RADIUS + MAX_RADIUS) / 2.0,
        None => 3.0,
    }
}
