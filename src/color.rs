use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use rusty_dash::Value;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: cell value → Color32
// ---------------------------------------------------------------------------

/// Maps the distinct values of a chart's colour column to distinct colours.
///
/// Built from the unfiltered table so a value keeps its colour while filters
/// change.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<Value, Color32>,
    default_color: Color32,
}

impl ColorMap {
    pub fn new(distinct_values: &BTreeSet<Value>) -> Self {
        let palette = generate_palette(distinct_values.len());
        let mapping = distinct_values.iter().cloned().zip(palette).collect();
        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a given value.
    pub fn color_for(&self, value: &Value) -> Color32 {
        self.mapping
            .get(value)
            .copied()
            .unwrap_or(self.default_color)
    }
}
