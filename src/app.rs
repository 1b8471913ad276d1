use std::time::Duration;

use eframe::egui;

use crate::config::AppConfig;
use crate::state::AppState;
use crate::ui::{panels, plot};

/// Repaint cadence while a recording is being replayed.
const STREAM_REPAINT: Duration = Duration::from_millis(16);

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct ColorSenseApp {
    pub state: AppState,
}

impl ColorSenseApp {
    pub fn new(config: AppConfig) -> Self {
        Self {
            state: AppState::new(config),
        }
    }
}

impl eframe::App for ColorSenseApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Samples are processed between frames, never while widgets mutate
        // the session.
        self.state.tick();

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: tuneables, pipeline, training ----
        egui::SidePanel::left("tuning_panel")
            .default_width(280.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Bottom panel: sent predictions ----
        egui::TopBottomPanel::bottom("predictions")
            .resizable(true)
            .default_height(180.0)
            .show(ctx, |ui| {
                panels::prediction_table(ui, &self.state);
            });

        // ---- Central panel: live channels ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::channel_plot(ui, &self.state);
        });

        if self.state.is_streaming() {
            ctx.request_repaint_after(STREAM_REPAINT);
        }
    }
}
