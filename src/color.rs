use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::ClassLabel;

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

/// Plot colour for a sensor channel: its own colour for red/green/blue,
/// a palette entry otherwise.
pub fn channel_color(name: &str, index: usize, total: usize) -> Color32 {
    match name.to_ascii_lowercase().as_str() {
        "red" | "r" => Color32::from_rgb(220, 60, 60),
        "green" | "g" => Color32::from_rgb(60, 180, 75),
        "blue" | "b" => Color32::from_rgb(70, 110, 230),
        _ => generate_palette(total.max(1))
            .get(index)
            .copied()
            .unwrap_or(Color32::GRAY),
    }
}

/// Colour swatch for a raw reading, scaled so the brightest channel is 255.
pub fn reading_color(raw: &[f64]) -> Color32 {
    let max = raw.iter().cloned().fold(0.0_f64, f64::max);
    if max <= 0.0 || raw.len() < 3 {
        return Color32::BLACK;
    }
    let scale = |v: f64| ((v / max).clamp(0.0, 1.0) * 255.0) as u8;
    Color32::from_rgb(scale(raw[0]), scale(raw[1]), scale(raw[2]))
}

// ---------------------------------------------------------------------------
// Color mapping: class label → Color32
// ---------------------------------------------------------------------------

/// Maps trained class labels to distinct colours; the null class is grey.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<ClassLabel, Color32>,
    default_color: Color32,
}

impl Default for ColorMap {
    fn default() -> Self {
        Self::new(&BTreeSet::new())
    }
}

impl ColorMap {
    /// Build a colour map from the set of known class labels.
    pub fn new(labels: &BTreeSet<ClassLabel>) -> Self {
        let palette = generate_palette(labels.len());
        let mapping: BTreeMap<ClassLabel, Color32> = labels
            .iter()
            .zip(palette)
            .map(|(l, c)| (*l, c))
            .collect();

        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a prediction.
    pub fn color_for(&self, label: Option<ClassLabel>) -> Color32 {
        label
            .and_then(|l| self.mapping.get(&l).copied())
            .unwrap_or(self.default_color)
    }

    /// Return the legend entries (label → colour) for the UI.
    pub fn legend_entries(&self) -> Vec<(String, Color32)> {
        self.mapping
            .iter()
            .map(|(l, c)| (format!("class {l}"), *c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_colours_per_class_and_grey_for_null() {
        let labels: BTreeSet<ClassLabel> = [ClassLabel(1), ClassLabel(2), ClassLabel(3)].into();
        let map = ColorMap::new(&labels);
        let c1 = map.color_for(Some(ClassLabel(1)));
        let c2 = map.color_for(Some(ClassLabel(2)));
        assert_ne!(c1, c2);
        assert_eq!(map.color_for(None), Color32::GRAY);
        assert_eq!(map.color_for(Some(ClassLabel(9))), Color32::GRAY);
        assert_eq!(map.legend_entries().len(), 3);
    }

    #[test]
    fn reading_colour_scales_to_brightest_channel() {
        assert_eq!(reading_color(&[100.0, 50.0, 0.0]), Color32::from_rgb(255, 127, 0));
        assert_eq!(reading_color(&[0.0, 0.0, 0.0]), Color32::BLACK);
    }
}
