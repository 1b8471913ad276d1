use eframe::egui::{self, Color32, RichText, Ui};
use egui_plot::{Legend, Line, Plot, PlotPoints};

use crate::color::{channel_color, reading_color};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Live channel plot (central panel)
// ---------------------------------------------------------------------------

/// Render the current reading and a plot of recent normalized channels.
pub fn channel_plot(ui: &mut Ui, state: &AppState) {
    let Some(latest) = state.latest() else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a recording to start  (File → Open recording…)");
        });
        return;
    };

    // ---- Current reading: swatch + prediction ----
    ui.horizontal(|ui: &mut Ui| {
        let (rect, _) = ui.allocate_exact_size(egui::vec2(48.0, 48.0), egui::Sense::hover());
        ui.painter().rect_filled(rect, 4.0, reading_color(&latest.raw));

        ui.vertical(|ui: &mut Ui| {
            let values: Vec<String> = latest.raw.iter().map(|v| format!("{v:.0}")).collect();
            ui.label(format!("raw: {}", values.join(" / ")));

            let (text, color) = match latest.prediction {
                Some(label) => (format!("class {label}"), state.color_map.color_for(Some(label))),
                None => ("no prediction".to_string(), Color32::GRAY),
            };
            ui.label(RichText::new(text).strong().size(18.0).color(color));
        });

        ui.separator();
        ui.vertical(|ui: &mut Ui| {
            for (name, color) in state.color_map.legend_entries() {
                ui.label(RichText::new(name).color(color));
            }
        });
    });
    ui.separator();

    let channels = state.session.feature_names();
    let n_features = latest.features.len();

    Plot::new("channel_plot")
        .legend(Legend::default())
        .x_axis_label("Sample")
        .y_axis_label("Normalized value")
        .include_y(0.0)
        .include_y(1.0)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for dim in 0..n_features {
                let Some(name) = channels.get(dim) else {
                    continue;
                };
                let color = channel_color(name, dim, n_features);

                let points: PlotPoints = state
                    .history
                    .iter()
                    .filter_map(|(idx, o)| o.features.get(dim).map(|&v| [*idx as f64, v]))
                    .collect();

                let line = Line::new(points).name(name).color(color).width(1.5);
                plot_ui.line(line);
            }
        });
}
