//! Recognition session: the context object owning the pipeline, the tuning
//! controller and the output gate for one run of the application.

pub mod sink;
pub mod stream;

use std::time::Duration;

use anyhow::Result;

use crate::config::SensorConfig;
use crate::data::model::{ClassLabel, Sample, SampleSet};
use crate::error::PipelineError;
use crate::pipeline::classifier::NaiveBayes;
use crate::pipeline::moving_average::MovingAverageFilter;
use crate::pipeline::normalize::{Normalizer, MAGNITUDE_FEATURE};
use crate::pipeline::{Pipeline, PreProcessing};
use crate::tuning::{Settings, TuningController};

use sink::PredictionSink;
use stream::SensorStream;

// ---------------------------------------------------------------------------
// Output gate
// ---------------------------------------------------------------------------

/// Forwards a prediction only on transition: when it is non-null and differs
/// from the previous pipeline output.
#[derive(Debug, Default, Clone)]
pub struct OutputGate {
    previous: Option<ClassLabel>,
}

impl OutputGate {
    pub fn gate(&mut self, current: Option<ClassLabel>) -> Option<ClassLabel> {
        let send = current.filter(|c| self.previous != Some(*c));
        self.previous = current;
        send
    }

    pub fn reset(&mut self) {
        self.previous = None;
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Result of processing one raw reading.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleOutcome {
    pub raw: Vec<f64>,
    /// Normalized features handed to the pipeline.
    pub features: Vec<f64>,
    /// Pipeline output (None when rejected, filtered or untrained).
    pub prediction: Option<ClassLabel>,
    /// What was forwarded to the sink, if anything.
    pub sent: Option<ClassLabel>,
}

pub struct Session {
    pipeline: Pipeline,
    controller: TuningController,
    normalizer: Normalizer,
    gate: OutputGate,
    channel_names: Vec<String>,
}

impl Session {
    /// Build the colour-sensor pipeline: moving average → naive Bayes → optional
    /// timeout filter, configured from `settings`.
    pub fn new(sensor: &SensorConfig, settings: Settings) -> Self {
        let normalizer = Normalizer::new(sensor.append_magnitude);
        let dims = normalizer.output_dimensions(sensor.channels.len());

        let controller = TuningController::new(settings);
        let settings = controller.settings();
        let mut pipeline = Pipeline::new(Box::new(NaiveBayes::new(
            !settings.always_pick_something,
            settings.color_variability,
        )));
        pipeline.add_pre_processing_module(PreProcessing::MovingAverage(MovingAverageFilter::new(
            sensor.moving_average_window,
            dims,
        )));

        controller.configure(&mut pipeline);

        log::info!(
            "Session ready: channels {:?}, {} features, window {}",
            sensor.channels,
            dims,
            sensor.moving_average_window
        );

        Self {
            pipeline,
            controller,
            normalizer,
            gate: OutputGate::default(),
            channel_names: sensor.channels.clone(),
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn settings(&self) -> &Settings {
        self.controller.settings()
    }

    pub fn channel_names(&self) -> &[String] {
        &self.channel_names
    }

    /// Names of the features fed to the pipeline: the channels, plus
    /// `magnitude` when the normalizer appends it.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = self.channel_names.clone();
        if self.normalizer.append_magnitude {
            names.push(MAGNITUDE_FEATURE.to_string());
        }
        names
    }

    // -- Tuneable updates --

    pub fn set_always_pick_something(&mut self, new_val: bool) {
        self.controller.set_always_pick_something(&mut self.pipeline, new_val);
    }

    pub fn set_color_variability(&mut self, new_val: f64) {
        self.controller.set_color_variability(&mut self.pipeline, new_val);
    }

    pub fn set_send_repeated_predictions(&mut self, new_val: bool) {
        self.controller.set_send_repeated_predictions(&mut self.pipeline, new_val);
    }

    pub fn set_timeout(&mut self, new_val: i64) {
        self.controller.set_timeout(&mut self.pipeline, new_val);
    }

    // -- Training --

    /// Normalize raw labelled readings and train the pipeline on them.
    pub fn train(&mut self, raw: &SampleSet) -> Result<(), PipelineError> {
        let mut normalized = SampleSet::new(self.feature_names());
        for (label, features) in raw.labelled() {
            normalized.push(Sample::labelled(label, self.normalizer.apply(features.to_vec())));
        }
        self.pipeline.train(&normalized)?;
        self.gate.reset();
        Ok(())
    }

    // -- Sample processing --

    /// Normalize, classify and gate one raw reading. An untrained classifier
    /// yields no prediction rather than an error.
    pub fn process_sample(&mut self, raw: Vec<f64>) -> Result<SampleOutcome, PipelineError> {
        if raw.len() != self.channel_names.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: self.channel_names.len(),
                actual: raw.len(),
            });
        }
        let features = self.normalizer.apply(raw.clone());

        let prediction = if self.pipeline.classifier().is_trained() {
            self.pipeline.predict(&features)?
        } else {
            None
        };
        let sent = self.gate.gate(prediction);
        log::trace!("{raw:?} -> {prediction:?} (sent {sent:?})");

        Ok(SampleOutcome {
            raw,
            features,
            prediction,
            sent,
        })
    }

    /// Read and process up to `budget` samples, forwarding gated predictions
    /// to `sink`. Returns early when the stream has nothing within `wait`.
    pub fn poll(
        &mut self,
        stream: &mut dyn SensorStream,
        sink: &mut dyn PredictionSink,
        budget: usize,
        wait: Duration,
    ) -> Result<Vec<SampleOutcome>> {
        let mut outcomes = Vec::new();
        for _ in 0..budget {
            let Some(raw) = stream.read(wait)? else {
                break;
            };
            let outcome = self.process_sample(raw)?;
            if let Some(label) = outcome.sent {
                sink.send(label)?;
            }
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }
}
