use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use rusty_dash::data::predicate::numeric_control;
use rusty_dash::{ColumnKind, FilterParams};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    // ---- Logo (centered) ----
    if let Some(logo) = &state.config.logo {
        let uri = format!("file://{}", logo.display());
        ui.vertical_centered(|ui: &mut Ui| {
            ui.add(
                egui::Image::new(uri)
                    .max_width(ui.available_width() * 0.8)
                    .max_height(120.0)
                    .rounding(4.0),
            );
        });
        ui.add_space(4.0);
    }

    ui.heading("Filters");
    ui.separator();

    let Some(prepared) = &state.prepared else {
        ui.label("No dataset loaded.");
        return;
    };

    // Clone what we need so we can mutate state inside the loop.
    let columns: Vec<(String, ColumnKind)> = prepared
        .schema
        .iter()
        .map(|(name, kind)| (name.to_string(), kind))
        .collect();

    let mut enabled = state.filters.enabled;
    if ui.checkbox(&mut enabled, "Add filters").changed() {
        state.set_filtering_enabled(enabled);
    }
    if !state.filters.enabled {
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Column selection ----
            egui::CollapsingHeader::new(RichText::new("Filter dataframe on").strong())
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    for (col, kind) in &columns {
                        let mut selected = state.filters.is_selected(col);
                        let label = format!("{col}  ({kind})");
                        if ui.checkbox(&mut selected, label).changed() {
                            state.toggle_column(col);
                        }
                    }
                });
            ui.separator();

            // ---- Per-column filter widgets, in selection order ----
            let specs = state.filters.specs().to_vec();
            for spec in specs {
                let col = spec.column.as_str();
                match spec.params {
                    FilterParams::Categorical { .. } => categorical_control(ui, state, col),
                    FilterParams::Numeric { lo, hi } => numeric_filter(ui, state, col, lo, hi),
                    FilterParams::Temporal { start, end } => {
                        temporal_filter(ui, state, col, start, end);
                    }
                    FilterParams::Text { pattern, literal } => {
                        text_filter(ui, state, col, pattern, literal);
                    }
                }
                ui.add_space(4.0);
            }

            if let Some(err) = &state.filter_error {
                ui.label(RichText::new(err).color(Color32::RED));
            }
        });
}

/// Multi-select checkboxes over the column's distinct values.
fn categorical_control(ui: &mut Ui, state: &mut AppState, col: &str) {
    let Some(all_values) = state.unique_values.get(col).cloned() else {
        return;
    };
    let n_total = all_values.len();
    let n_selected = match state.filters.get(col) {
        Some(FilterParams::Categorical { allowed }) => allowed.len(),
        _ => 0,
    };
    let header_text = format!("Values for {col}  ({n_selected}/{n_total})");

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(col)
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            // Select all / none buttons
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    state.select_all(col);
                }
                if ui.small_button("None").clicked() {
                    state.select_none(col);
                }
            });

            for val in &all_values {
                let mut checked = match state.filters.get(col) {
                    Some(FilterParams::Categorical { allowed }) => allowed.contains(val),
                    _ => false,
                };
                if ui.checkbox(&mut checked, val.to_string()).changed() {
                    state.toggle_filter_value(col, val);
                }
            }
        });
}

/// Two sliders over the column's range, stepping by a hundredth of it.
fn numeric_filter(ui: &mut Ui, state: &mut AppState, col: &str, mut lo: f64, mut hi: f64) {
    let Some(control) = state
        .prepared
        .as_ref()
        .and_then(|p| p.table.column(col))
        .and_then(numeric_control)
    else {
        return;
    };

    ui.strong(format!("Values for {col}"));
    let range = control.min..=control.max;
    let mut changed = false;
    for (label, value) in [("from", &mut lo), ("to", &mut hi)] {
        let mut slider = egui::Slider::new(value, range.clone()).text(label);
        if control.step > 0.0 {
            slider = slider.step_by(control.step);
        }
        changed |= ui.add(slider).changed();
    }
    if changed {
        state.update_params(col, FilterParams::Numeric { lo, hi });
    }
}

/// Start and end date pickers. Either end can be cleared, which switches the
/// filter off until both are set again.
fn temporal_filter(
    ui: &mut Ui,
    state: &mut AppState,
    col: &str,
    mut start: Option<NaiveDateTime>,
    mut end: Option<NaiveDateTime>,
) {
    let bounds = state
        .prepared
        .as_ref()
        .and_then(|p| p.table.column(col))
        .and_then(|c| c.temporal_bounds());

    ui.strong(format!("Values for {col}"));
    let mut changed = false;
    for (label, value, fallback) in [
        ("start", &mut start, bounds.map(|b| b.0)),
        ("end", &mut end, bounds.map(|b| b.1)),
    ] {
        ui.horizontal(|ui: &mut Ui| {
            ui.label(label);
            match *value {
                Some(dt) => {
                    let mut date: NaiveDate = dt.date();
                    let salt = format!("{col}_{label}");
                    if ui.add(DatePickerButton::new(&mut date).id_salt(&salt)).changed() {
                        *value = Some(date.and_time(NaiveTime::MIN));
                        changed = true;
                    }
                    if ui.small_button("✕").clicked() {
                        *value = None;
                        changed = true;
                    }
                }
                None => {
                    if ui.small_button("set").clicked() {
                        *value = fallback;
                        changed = true;
                    }
                }
            }
        });
    }
    if start.is_none() || end.is_none() {
        ui.weak("Pick both dates to apply this filter.");
    }
    if changed {
        state.update_params(col, FilterParams::Temporal { start, end });
    }
}

/// Substring or regular expression box.
fn text_filter(ui: &mut Ui, state: &mut AppState, col: &str, mut pattern: String, mut literal: bool) {
    ui.strong(format!("Substring or regex in {col}"));
    let edited = ui
        .add(egui::TextEdit::singleline(&mut pattern).hint_text("e.g. ^Sen"))
        .changed();
    let toggled = ui.checkbox(&mut literal, "Match literally").changed();
    if edited || toggled {
        state.update_params(col, FilterParams::Text { pattern, literal });
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.source.is_some(), egui::Button::new("Reload"))
                .clicked()
            {
                state.reload();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(table) = &state.table {
            ui.label(format!(
                "{} rows loaded, {} visible",
                table.len(),
                state.visible_rows
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open tabular data")
        .add_filter(
            "Supported files",
            &["xlsx", "xlsm", "xls", "ods", "csv", "json", "parquet", "pq"],
        )
        .add_filter("Spreadsheet", &["xlsx", "xlsm", "xls", "ods"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.load_path(&path);
    }
}
