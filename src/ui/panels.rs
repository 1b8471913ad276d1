use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::loader::samples_per_class;
use crate::pipeline::PostProcessing;
use crate::state::AppState;
use crate::tuning::TuneableValue;

// ---------------------------------------------------------------------------
// Left side panel – tuneables, pipeline state, training
// ---------------------------------------------------------------------------

/// Render the left panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Tuneables");
            ui.separator();
            tuneables(ui, state);

            ui.add_space(8.0);
            ui.heading("Pipeline");
            ui.separator();
            pipeline_summary(ui, state);

            ui.add_space(8.0);
            ui.heading("Training");
            ui.separator();
            training_controls(ui, state);
        });
}

/// One widget per registered tuneable; the description is the hover text.
fn tuneables(ui: &mut Ui, state: &mut AppState) {
    let mut changes = Vec::new();

    for (index, t) in state.tuneables.iter().enumerate() {
        let changed = match (t.value(), t.bounds()) {
            (TuneableValue::Bool(mut v), _) => ui
                .checkbox(&mut v, t.name.as_str())
                .on_hover_text(t.description.as_str())
                .changed()
                .then_some(TuneableValue::Bool(v)),
            (TuneableValue::Float(mut v), Some((TuneableValue::Float(min), TuneableValue::Float(max)))) => ui
                .add(egui::Slider::new(&mut v, min..=max).text(t.name.as_str()))
                .on_hover_text(t.description.as_str())
                .changed()
                .then_some(TuneableValue::Float(v)),
            (TuneableValue::Int(mut v), Some((TuneableValue::Int(min), TuneableValue::Int(max)))) => ui
                .add(egui::Slider::new(&mut v, min..=max).text(t.name.as_str()))
                .on_hover_text(t.description.as_str())
                .changed()
                .then_some(TuneableValue::Int(v)),
            _ => None,
        };
        if let Some(value) = changed {
            changes.push((index, value));
        }
    }

    for (index, value) in changes {
        state.set_tuneable(index, value);
    }
}

fn pipeline_summary(ui: &mut Ui, state: &AppState) {
    let pipeline = state.session.pipeline();
    let classifier = pipeline.classifier();

    ui.label(format!(
        "Pre-processing: {} stage(s)",
        pipeline.num_pre_processing_modules()
    ));
    match pipeline.post_processing_module(0) {
        Some(stage) => {
            let PostProcessing::Timeout(filter) = stage;
            ui.label(format!(
                "Post-processing: {} ({} ms)",
                stage.name(),
                filter.timeout_duration().as_millis()
            ));
        }
        None => {
            ui.label("Post-processing: none");
        }
    }

    if !classifier.is_trained() {
        ui.label(RichText::new("Classifier not trained").italics());
        return;
    }

    ui.label(format!(
        "Null rejection: {} (coeff {:.1})",
        if classifier.null_rejection_enabled() { "on" } else { "off" },
        classifier.null_rejection_coeff()
    ));

    egui::Grid::new("thresholds").striped(true).show(ui, |ui: &mut Ui| {
        ui.strong("Class");
        ui.strong("Threshold");
        ui.end_row();
        for (label, threshold) in classifier
            .class_labels()
            .into_iter()
            .zip(classifier.null_rejection_thresholds())
        {
            ui.label(RichText::new(label.to_string()).color(state.color_map.color_for(Some(label))));
            ui.label(format!("{threshold:.2}"));
            ui.end_row();
        }
    });
}

fn training_controls(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Class");
        ui.add(egui::DragValue::new(&mut state.recording_label).range(1..=99));
        let text = if state.recording { "■ Stop" } else { "● Record" };
        ui.toggle_value(&mut state.recording, text);
    });

    ui.horizontal(|ui: &mut Ui| {
        if ui.button("Train").clicked() {
            if let Err(e) = state.train() {
                state.report_error(e);
            }
        }
        if ui.button("Clear").clicked() {
            state.clear_training();
        }
    });

    let counts = samples_per_class(&state.training);
    if counts.is_empty() {
        ui.label("No training samples.");
    }
    for (label, n) in counts {
        ui.label(
            RichText::new(format!("class {label}: {n} samples"))
                .color(state.color_map.color_for(Some(label))),
        );
    }
}

// ---------------------------------------------------------------------------
// Bottom panel – sent predictions
// ---------------------------------------------------------------------------

pub fn prediction_table(ui: &mut Ui, state: &AppState) {
    ui.strong("Sent predictions");
    TableBuilder::new(ui)
        .striped(true)
        .column(Column::auto().at_least(80.0))
        .column(Column::remainder())
        .header(20.0, |mut header| {
            header.col(|ui: &mut Ui| {
                ui.strong("Sample");
            });
            header.col(|ui: &mut Ui| {
                ui.strong("Class");
            });
        })
        .body(|mut body| {
            for p in &state.sent {
                body.row(18.0, |mut row| {
                    row.col(|ui: &mut Ui| {
                        ui.label(p.sample_index.to_string());
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(
                            RichText::new(p.label.to_string())
                                .color(state.color_map.color_for(Some(p.label))),
                        );
                    });
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open training data…").clicked() {
                open_training_dialog(state);
                ui.close_menu();
            }
            if ui.button("Open recording…").clicked() {
                open_recording_dialog(state);
                ui.close_menu();
            }
            if ui.button("Save training data…").clicked() {
                save_training_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(stream) = &state.stream {
            ui.label(format!(
                "Replay {}/{} samples",
                stream.position(),
                stream.len()
            ));
            if ui.small_button("⟲").on_hover_text("Restart replay").clicked() {
                if let Some(stream) = state.stream.as_mut() {
                    stream.rewind();
                }
            }
        }

        ui.separator();
        ui.label(format!("{} training samples", state.training.len()));

        if let Some(msg) = &state.status_message {
            let color = if msg.starts_with("Error") {
                Color32::RED
            } else {
                ui.visuals().text_color()
            };
            ui.label(RichText::new(msg).color(color));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

fn sample_file_dialog(title: &str) -> rfd::FileDialog {
    rfd::FileDialog::new()
        .set_title(title)
        .add_filter("Supported files", &["parquet", "pq", "json", "csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .add_filter("CSV", &["csv"])
}

pub fn open_training_dialog(state: &mut AppState) {
    if let Some(path) = sample_file_dialog("Open training data").pick_file() {
        if let Err(e) = state.load_training(&path) {
            state.report_error(e);
        }
    }
}

pub fn open_recording_dialog(state: &mut AppState) {
    if let Some(path) = sample_file_dialog("Open recording").pick_file() {
        if let Err(e) = state.open_recording(&path) {
            state.report_error(e);
        }
    }
}

pub fn save_training_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Save training data")
        .add_filter("CSV", &["csv"])
        .set_file_name("training.csv")
        .save_file();

    if let Some(path) = file {
        if let Err(e) = state.save_training(&path) {
            state.report_error(e);
        }
    }
}
