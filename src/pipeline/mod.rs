//! Recognition pipeline: pre-processing → classifier → post-processing.
//!
//! ```text
//!  normalized sample
//!        │
//!        ▼
//!  ┌──────────────────┐
//!  │ PreProcessing     │  moving average (per channel)
//!  └──────────────────┘
//!        │
//!        ▼
//!  ┌──────────────────┐
//!  │ dyn Classifier    │  Option<ClassLabel>
//!  └──────────────────┘
//!        │
//!        ▼
//!  ┌──────────────────┐
//!  │ post-processing   │  0 or 1 tagged stage (timeout filter)
//!  └──────────────────┘
//! ```

pub mod classifier;
pub mod moving_average;
pub mod normalize;
pub mod timeout;

use crate::data::model::{ClassLabel, Sample, SampleSet};
use crate::error::PipelineError;

use classifier::Classifier;
use moving_average::MovingAverageFilter;
use timeout::ClassLabelTimeoutFilter;

// ---------------------------------------------------------------------------
// Stage kinds
// ---------------------------------------------------------------------------

/// Feature-space stages applied before classification.
#[derive(Debug, Clone)]
pub enum PreProcessing {
    MovingAverage(MovingAverageFilter),
}

impl PreProcessing {
    fn process(&mut self, x: &[f64]) -> Result<Vec<f64>, PipelineError> {
        match self {
            PreProcessing::MovingAverage(f) => f.filter(x),
        }
    }

    fn reset(&mut self) {
        match self {
            PreProcessing::MovingAverage(f) => f.reset(),
        }
    }
}

/// Label-space stages applied after classification.
#[derive(Debug, Clone)]
pub enum PostProcessing {
    Timeout(ClassLabelTimeoutFilter),
}

impl PostProcessing {
    fn process(&mut self, label: Option<ClassLabel>) -> Option<ClassLabel> {
        match self {
            PostProcessing::Timeout(f) => f.filter(label),
        }
    }

    fn reset(&mut self) {
        match self {
            PostProcessing::Timeout(f) => f.reset(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PostProcessing::Timeout(_) => "Class label timeout",
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

pub struct Pipeline {
    pre_processing: Vec<PreProcessing>,
    classifier: Box<dyn Classifier>,
    /// At most one post-processing stage.
    post_processing: Option<PostProcessing>,
}

impl Pipeline {
    pub fn new(classifier: Box<dyn Classifier>) -> Self {
        Self {
            pre_processing: Vec::new(),
            classifier,
            post_processing: None,
        }
    }

    pub fn set_classifier(&mut self, classifier: Box<dyn Classifier>) {
        self.classifier = classifier;
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    pub fn classifier_mut(&mut self) -> &mut dyn Classifier {
        self.classifier.as_mut()
    }

    pub fn add_pre_processing_module(&mut self, stage: PreProcessing) {
        self.pre_processing.push(stage);
    }

    pub fn num_pre_processing_modules(&self) -> usize {
        self.pre_processing.len()
    }

    pub fn add_post_processing_module(&mut self, stage: PostProcessing) -> Result<(), PipelineError> {
        if self.post_processing.is_some() {
            return Err(PipelineError::SlotOccupied);
        }
        self.post_processing = Some(stage);
        Ok(())
    }

    pub fn remove_post_processing_module(&mut self, index: usize) -> Result<PostProcessing, PipelineError> {
        match (index, self.post_processing.take()) {
            (0, Some(stage)) => Ok(stage),
            (_, slot) => {
                self.post_processing = slot;
                Err(PipelineError::NoSuchStage(index))
            }
        }
    }

    pub fn post_processing_module(&self, index: usize) -> Option<&PostProcessing> {
        match index {
            0 => self.post_processing.as_ref(),
            _ => None,
        }
    }

    pub fn post_processing_module_mut(&mut self, index: usize) -> Option<&mut PostProcessing> {
        match index {
            0 => self.post_processing.as_mut(),
            _ => None,
        }
    }

    pub fn num_post_processing_modules(&self) -> usize {
        usize::from(self.post_processing.is_some())
    }

    /// Train the classifier on `data` after running it through pre-processing.
    ///
    /// Filter state is reset whenever the label changes so that smoothing never
    /// blends two classes' recordings.
    pub fn train(&mut self, data: &SampleSet) -> Result<(), PipelineError> {
        self.reset();
        let mut processed = SampleSet::new(data.channel_names.clone());
        let mut previous = None;
        for (label, features) in data.labelled() {
            if previous != Some(label) {
                self.reset();
                previous = Some(label);
            }
            let x = self.pre_process(features)?;
            processed.push(Sample::labelled(label, x));
        }
        self.reset();
        self.classifier.train(&processed)
    }

    /// Run one sample through the full chain.
    pub fn predict(&mut self, x: &[f64]) -> Result<Option<ClassLabel>, PipelineError> {
        if x.is_empty() {
            return Err(PipelineError::EmptyInput);
        }
        let features = self.pre_process(x)?;
        let label = self.classifier.predict(&features)?;
        Ok(match self.post_processing.as_mut() {
            Some(stage) => stage.process(label),
            None => label,
        })
    }

    /// Clear all filter state.
    pub fn reset(&mut self) {
        self.pre_processing.iter_mut().for_each(PreProcessing::reset);
        if let Some(stage) = self.post_processing.as_mut() {
            stage.reset();
        }
    }

    fn pre_process(&mut self, x: &[f64]) -> Result<Vec<f64>, PipelineError> {
        let mut features = x.to_vec();
        for stage in &mut self.pre_processing {
            features = stage.process(&features)?;
        }
        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::classifier::tests::two_colour_set;
    use crate::pipeline::classifier::NaiveBayes;

    fn pipeline() -> Pipeline {
        let mut p = Pipeline::new(Box::new(NaiveBayes::default()));
        p.add_pre_processing_module(PreProcessing::MovingAverage(MovingAverageFilter::new(5, 3)));
        p
    }

    #[test]
    fn slot_holds_at_most_one_stage() {
        let mut p = pipeline();
        assert_eq!(p.num_post_processing_modules(), 0);
        p.add_post_processing_module(PostProcessing::Timeout(ClassLabelTimeoutFilter::new(100)))
            .unwrap();
        assert_eq!(p.num_post_processing_modules(), 1);
        assert_eq!(
            p.add_post_processing_module(PostProcessing::Timeout(ClassLabelTimeoutFilter::new(5))),
            Err(PipelineError::SlotOccupied)
        );
    }

    #[test]
    fn remove_checks_index_and_occupancy() {
        let mut p = pipeline();
        assert!(matches!(p.remove_post_processing_module(0), Err(PipelineError::NoSuchStage(0))));

        p.add_post_processing_module(PostProcessing::Timeout(ClassLabelTimeoutFilter::new(100)))
            .unwrap();
        assert!(matches!(p.remove_post_processing_module(1), Err(PipelineError::NoSuchStage(1))));
        assert_eq!(p.num_post_processing_modules(), 1);
        assert!(p.remove_post_processing_module(0).is_ok());
        assert_eq!(p.num_post_processing_modules(), 0);
        assert!(p.post_processing_module(0).is_none());
    }

    #[test]
    fn trains_and_predicts_through_pre_processing() {
        let mut p = pipeline();
        p.train(&two_colour_set()).unwrap();
        assert!(p.classifier().is_trained());
        for _ in 0..5 {
            p.predict(&[0.2, 0.3, 0.9]).unwrap();
        }
        assert_eq!(p.predict(&[0.2, 0.3, 0.9]).unwrap(), Some(ClassLabel(2)));
    }

    #[test]
    fn timeout_stage_blanks_repeats() {
        let mut p = pipeline();
        p.train(&two_colour_set()).unwrap();
        p.add_post_processing_module(PostProcessing::Timeout(ClassLabelTimeoutFilter::new(60_000)))
            .unwrap();
        assert_eq!(p.predict(&[0.9, 0.3, 0.2]).unwrap(), Some(ClassLabel(1)));
        assert_eq!(p.predict(&[0.9, 0.3, 0.2]).unwrap(), None);
    }

    #[test]
    fn empty_input_rejected() {
        let mut p = pipeline();
        assert_eq!(p.predict(&[]), Err(PipelineError::EmptyInput));
    }
}
