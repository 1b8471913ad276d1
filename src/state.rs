use std::collections::VecDeque;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::color::ColorMap;
use crate::config::AppConfig;
use crate::data::loader::{load_file, save_csv};
use crate::data::model::{ClassLabel, Sample, SampleSet};
use crate::session::sink::{CsvSink, LogSink, SinkSet};
use crate::session::stream::{ReplayStream, SensorStream};
use crate::session::{SampleOutcome, Session};
use crate::tuning::{register_color_sensor_tuneables, TuneableValue, Tuneables};

/// Samples kept for the live plot.
pub const HISTORY_LEN: usize = 500;
/// Sent predictions kept for the table.
pub const PREDICTION_LOG_LEN: usize = 100;
/// Upper bound on samples processed per UI frame.
const SAMPLES_PER_FRAME: usize = 64;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// A prediction forwarded to the sinks, as shown in the table.
#[derive(Debug, Clone, Copy)]
pub struct SentPrediction {
    pub sample_index: u64,
    pub label: ClassLabel,
}

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: AppConfig,

    /// Pipeline, tuning controller and output gate.
    pub session: Session,

    /// Tuneables rendered in the side panel.
    pub tuneables: Tuneables<Session>,

    /// Replay source (None until the user opens a recording).
    pub stream: Option<ReplayStream>,

    sinks: SinkSet,

    /// Raw labelled readings used for training.
    pub training: SampleSet,

    /// Label assigned to readings while recording.
    pub recording_label: u32,

    /// Whether incoming readings are appended to `training`.
    pub recording: bool,

    /// Recent outcomes, oldest first.
    pub history: VecDeque<(u64, SampleOutcome)>,

    /// Recent sent predictions, newest first.
    pub sent: VecDeque<SentPrediction>,

    /// Total samples processed.
    pub sample_count: u64,

    /// Class → colour, rebuilt after training.
    pub color_map: ColorMap,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let session = Session::new(&config.sensor, config.settings);
        let mut tuneables = Tuneables::new();
        register_color_sensor_tuneables(&mut tuneables, session.settings());

        let mut sinks = SinkSet::default();
        sinks.push(Box::new(LogSink));

        let mut state = Self {
            training: SampleSet::new(config.sensor.channels.clone()),
            config,
            session,
            tuneables,
            stream: None,
            sinks,
            recording_label: 1,
            recording: false,
            history: VecDeque::with_capacity(HISTORY_LEN),
            sent: VecDeque::with_capacity(PREDICTION_LOG_LEN),
            sample_count: 0,
            color_map: ColorMap::default(),
            status_message: None,
        };

        if let Some(path) = state.config.predictions_csv.clone() {
            match CsvSink::create(&path) {
                Ok(sink) => state.sinks.push(Box::new(sink)),
                Err(e) => state.report_error(e),
            }
        }
        if let Some(path) = state.config.training_path.clone() {
            if let Err(e) = state.load_training(&path) {
                state.report_error(e);
            }
        }
        if let Some(path) = state.config.replay.path.clone() {
            if let Err(e) = state.open_recording(&path) {
                state.report_error(e);
            }
        }
        state
    }

    /// Log an error and show it in the status line.
    pub fn report_error(&mut self, e: anyhow::Error) {
        log::error!("{e:#}");
        self.status_message = Some(format!("Error: {e:#}"));
    }

    // -- Tuneables --

    pub fn set_tuneable(&mut self, index: usize, value: TuneableValue) {
        if let Err(e) = self.tuneables.set(index, value, &mut self.session) {
            self.report_error(e.into());
        }
    }

    // -- Training data --

    /// Load labelled readings from a file, replace the training set and train.
    pub fn load_training(&mut self, path: &Path) -> Result<()> {
        let set = load_file(path, &self.config.sensor.channels)?;
        self.training = set;
        self.train()
    }

    pub fn save_training(&mut self, path: &Path) -> Result<()> {
        save_csv(path, &self.training)?;
        self.status_message = Some(format!("Saved {} samples", self.training.len()));
        Ok(())
    }

    /// Train on the current training set and refresh class colours.
    pub fn train(&mut self) -> Result<()> {
        self.session
            .train(&self.training)
            .context("training classifier")?;
        self.color_map = ColorMap::new(&self.training.class_labels());
        self.status_message = Some(format!(
            "Trained on {} samples, {} classes",
            self.training.labelled().count(),
            self.training.class_labels().len()
        ));
        Ok(())
    }

    pub fn clear_training(&mut self) {
        self.training = SampleSet::new(self.config.sensor.channels.clone());
        self.recording = false;
    }

    // -- Sensor stream --

    pub fn open_recording(&mut self, path: &Path) -> Result<()> {
        let set = load_file(path, &self.config.sensor.channels)?;
        let interval = Duration::from_millis(self.config.sensor.sample_interval_ms);
        self.stream = Some(ReplayStream::new(set, interval, self.config.replay.looping));
        self.history.clear();
        Ok(())
    }

    /// Process the samples that are due. Called once per UI frame.
    pub fn tick(&mut self) {
        let Some(stream) = self.stream.as_mut() else {
            return;
        };
        let outcomes = match self
            .session
            .poll(stream, &mut self.sinks, SAMPLES_PER_FRAME, Duration::ZERO)
        {
            Ok(outcomes) => outcomes,
            Err(e) => {
                self.stream = None;
                self.report_error(e.context("processing sensor stream"));
                return;
            }
        };

        for outcome in outcomes {
            self.ingest(outcome);
        }
    }

    fn ingest(&mut self, outcome: SampleOutcome) {
        let index = self.sample_count;
        self.sample_count += 1;

        if self.recording {
            self.training.push(Sample::labelled(
                ClassLabel(self.recording_label),
                outcome.raw.clone(),
            ));
        }
        if let Some(label) = outcome.sent {
            if self.sent.len() == PREDICTION_LOG_LEN {
                self.sent.pop_back();
            }
            self.sent.push_front(SentPrediction {
                sample_index: index,
                label,
            });
        }
        if self.history.len() == HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back((index, outcome));
    }

    /// Whether the stream may still produce samples.
    pub fn is_streaming(&self) -> bool {
        self.stream.as_ref().is_some_and(|s| !s.is_finished())
    }

    /// Most recent outcome, if any.
    pub fn latest(&self) -> Option<&SampleOutcome> {
        self.history.back().map(|(_, o)| o)
    }
}
