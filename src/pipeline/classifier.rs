use std::collections::BTreeMap;
use std::f64::consts::PI;

use crate::data::model::{ClassLabel, SampleSet};
use crate::error::PipelineError;

/// Smallest per-dimension standard deviation; keeps a class whose training
/// samples are identical from collapsing into a zero-width Gaussian.
const MIN_SIGMA: f64 = 1e-3;

// ---------------------------------------------------------------------------
// Classifier seam
// ---------------------------------------------------------------------------

/// The narrow classifier interface the pipeline and tuning controller drive.
pub trait Classifier {
    /// Fit the model to the labelled samples in `data`.
    fn train(&mut self, data: &SampleSet) -> Result<(), PipelineError>;

    /// Best class for `x`, or `None` when null rejection refuses every class.
    fn predict(&mut self, x: &[f64]) -> Result<Option<ClassLabel>, PipelineError>;

    fn enable_null_rejection(&mut self, enabled: bool);
    fn null_rejection_enabled(&self) -> bool;

    fn set_null_rejection_coeff(&mut self, coeff: f64);
    fn null_rejection_coeff(&self) -> f64;

    /// Recompute thresholds from stored training statistics and the current
    /// coefficient. Returns false when the model is untrained.
    fn recompute_null_rejection_thresholds(&mut self) -> bool;

    /// One threshold per class, in `class_labels` order. Empty when untrained.
    fn null_rejection_thresholds(&self) -> Vec<f64>;

    fn class_labels(&self) -> Vec<ClassLabel>;

    fn is_trained(&self) -> bool;
}

// ---------------------------------------------------------------------------
// Naive Bayes nearest-class model
// ---------------------------------------------------------------------------

/// Per-class Gaussian model with training log-likelihood statistics.
#[derive(Debug, Clone)]
struct ClassModel {
    mu: Vec<f64>,
    sigma: Vec<f64>,
    /// Mean log-likelihood of this class's own training samples.
    training_mu: f64,
    /// Standard deviation of those log-likelihoods.
    training_sigma: f64,
    threshold: f64,
}

impl ClassModel {
    fn fit(samples: &[&[f64]], dims: usize) -> Self {
        let n = samples.len() as f64;
        let mut mu = vec![0.0; dims];
        for s in samples {
            for (m, v) in mu.iter_mut().zip(s.iter()) {
                *m += v;
            }
        }
        mu.iter_mut().for_each(|m| *m /= n);

        let mut sigma = vec![0.0; dims];
        for s in samples {
            for ((sd, v), m) in sigma.iter_mut().zip(s.iter()).zip(&mu) {
                *sd += (v - m).powi(2);
            }
        }
        let denom = (n - 1.0).max(1.0);
        sigma
            .iter_mut()
            .for_each(|sd| *sd = (*sd / denom).sqrt().max(MIN_SIGMA));

        let mut model = Self {
            mu,
            sigma,
            training_mu: 0.0,
            training_sigma: 0.0,
            threshold: 0.0,
        };

        let lls: Vec<f64> = samples.iter().map(|s| model.log_likelihood(s)).collect();
        model.training_mu = lls.iter().sum::<f64>() / n;
        model.training_sigma = if lls.len() > 1 {
            (lls.iter()
                .map(|ll| (ll - model.training_mu).powi(2))
                .sum::<f64>()
                / (n - 1.0))
                .sqrt()
        } else {
            0.0
        };
        model
    }

    fn log_likelihood(&self, x: &[f64]) -> f64 {
        x.iter()
            .zip(self.mu.iter().zip(&self.sigma))
            .map(|(v, (m, s))| {
                -0.5 * (2.0 * PI * s * s).ln() - (v - m).powi(2) / (2.0 * s * s)
            })
            .sum()
    }

    fn recompute_threshold(&mut self, coeff: f64) {
        self.threshold = self.training_mu - self.training_sigma * coeff;
    }
}

/// Bayesian nearest-class classifier with null rejection.
///
/// Each class is a diagonal Gaussian. A sample is assigned to the class with
/// the highest log-likelihood; with null rejection enabled it is rejected when
/// that likelihood falls below `mean - coeff * std` of the class's own
/// training log-likelihoods. Larger coefficients make rejection looser.
///
/// A class trained on a single sample has no log-likelihood spread, so its
/// threshold is that sample's log-likelihood whatever the coefficient.
#[derive(Debug, Clone)]
pub struct NaiveBayes {
    use_null_rejection: bool,
    null_rejection_coeff: f64,
    dimensions: usize,
    models: BTreeMap<ClassLabel, ClassModel>,
}

impl NaiveBayes {
    pub fn new(use_null_rejection: bool, null_rejection_coeff: f64) -> Self {
        Self {
            use_null_rejection,
            null_rejection_coeff,
            dimensions: 0,
            models: BTreeMap::new(),
        }
    }

    /// Log-likelihood of `x` under each class, in label order.
    pub fn log_likelihoods(&self, x: &[f64]) -> Vec<(ClassLabel, f64)> {
        self.models
            .iter()
            .map(|(label, m)| (*label, m.log_likelihood(x)))
            .collect()
    }
}

impl Default for NaiveBayes {
    fn default() -> Self {
        Self::new(true, 5.0)
    }
}

impl Classifier for NaiveBayes {
    fn train(&mut self, data: &SampleSet) -> Result<(), PipelineError> {
        let dims = data.num_dimensions();
        let mut grouped: BTreeMap<ClassLabel, Vec<&[f64]>> = BTreeMap::new();
        for (label, features) in data.labelled() {
            if features.len() != dims {
                return Err(PipelineError::DimensionMismatch {
                    expected: dims,
                    actual: features.len(),
                });
            }
            grouped.entry(label).or_default().push(features);
        }
        if grouped.is_empty() {
            return Err(PipelineError::NoTrainingData);
        }

        self.dimensions = dims;
        self.models = grouped
            .into_iter()
            .map(|(label, samples)| (label, ClassModel::fit(&samples, dims)))
            .collect();
        self.recompute_null_rejection_thresholds();

        for (label, model) in &self.models {
            if model.training_sigma == 0.0 {
                log::debug!(
                    "Class {label} has no training spread; its threshold ignores the null rejection coefficient"
                );
            }
        }
        log::info!(
            "Trained classifier on {} classes ({} dims)",
            self.models.len(),
            dims
        );
        Ok(())
    }

    fn predict(&mut self, x: &[f64]) -> Result<Option<ClassLabel>, PipelineError> {
        if !self.is_trained() {
            return Err(PipelineError::NotTrained);
        }
        if x.len() != self.dimensions {
            return Err(PipelineError::DimensionMismatch {
                expected: self.dimensions,
                actual: x.len(),
            });
        }

        let best = self
            .models
            .iter()
            .map(|(label, m)| (*label, m, m.log_likelihood(x)))
            .max_by(|a, b| a.2.total_cmp(&b.2));

        Ok(best.and_then(|(label, model, ll)| {
            if self.use_null_rejection && ll < model.threshold {
                log::trace!("Rejected {label}: ll {ll:.3} < threshold {:.3}", model.threshold);
                None
            } else {
                Some(label)
            }
        }))
    }

    fn enable_null_rejection(&mut self, enabled: bool) {
        self.use_null_rejection = enabled;
    }

    fn null_rejection_enabled(&self) -> bool {
        self.use_null_rejection
    }

    fn set_null_rejection_coeff(&mut self, coeff: f64) {
        self.null_rejection_coeff = coeff;
    }

    fn null_rejection_coeff(&self) -> f64 {
        self.null_rejection_coeff
    }

    fn recompute_null_rejection_thresholds(&mut self) -> bool {
        if !self.is_trained() {
            return false;
        }
        let coeff = self.null_rejection_coeff;
        self.models
            .values_mut()
            .for_each(|m| m.recompute_threshold(coeff));
        true
    }

    fn null_rejection_thresholds(&self) -> Vec<f64> {
        self.models.values().map(|m| m.threshold).collect()
    }

    fn class_labels(&self) -> Vec<ClassLabel> {
        self.models.keys().copied().collect()
    }

    fn is_trained(&self) -> bool {
        !self.models.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::model::Sample;

    /// Two well separated colour clusters with a little spread.
    pub(crate) fn two_colour_set() -> SampleSet {
        let mut set = SampleSet::new(vec!["red".into(), "green".into(), "blue".into()]);
        let jitter = [-0.02, 0.0, 0.015, -0.01, 0.02, 0.005];
        for j in jitter {
            set.push(Sample::labelled(ClassLabel(1), vec![0.9 + j, 0.3 - j, 0.2 + j / 2.0]));
            set.push(Sample::labelled(ClassLabel(2), vec![0.2 - j, 0.3 + j, 0.9 + j]));
        }
        set
    }

    #[test]
    fn untrained_predict_fails() {
        let mut nb = NaiveBayes::default();
        assert_eq!(nb.predict(&[1.0, 0.0, 0.0]), Err(PipelineError::NotTrained));
        assert!(!nb.recompute_null_rejection_thresholds());
        assert!(nb.null_rejection_thresholds().is_empty());
    }

    #[test]
    fn single_sample_class_threshold_ignores_coeff() {
        let mut set = two_colour_set();
        set.push(Sample::labelled(ClassLabel(3), vec![0.5, 0.5, 0.5]));
        let mut nb = NaiveBayes::new(true, 1.0);
        nb.train(&set).unwrap();
        let before = nb.null_rejection_thresholds();

        nb.set_null_rejection_coeff(20.0);
        nb.recompute_null_rejection_thresholds();
        let after = nb.null_rejection_thresholds();

        assert_eq!(after[2], before[2]);
        assert_ne!(after[0], before[0]);
    }

    #[test]
    fn training_without_labels_fails() {
        let mut set = SampleSet::new(vec!["red".into()]);
        set.push(Sample::unlabelled(vec![1.0]));
        assert_eq!(NaiveBayes::default().train(&set), Err(PipelineError::NoTrainingData));
    }

    #[test]
    fn predicts_nearest_class() {
        let mut nb = NaiveBayes::default();
        nb.train(&two_colour_set()).unwrap();
        assert_eq!(nb.class_labels(), vec![ClassLabel(1), ClassLabel(2)]);
        assert_eq!(nb.predict(&[0.9, 0.3, 0.2]).unwrap(), Some(ClassLabel(1)));
        assert_eq!(nb.predict(&[0.2, 0.3, 0.9]).unwrap(), Some(ClassLabel(2)));
    }

    #[test]
    fn null_rejection_refuses_far_samples_unless_disabled() {
        let mut nb = NaiveBayes::new(true, 2.0);
        nb.train(&two_colour_set()).unwrap();
        let far = [0.0, 1.0, 0.0];
        assert_eq!(nb.predict(&far).unwrap(), None);

        nb.enable_null_rejection(false);
        assert!(nb.predict(&far).unwrap().is_some());
    }

    #[test]
    fn larger_coefficient_lowers_thresholds() {
        let mut nb = NaiveBayes::new(true, 5.0);
        nb.train(&two_colour_set()).unwrap();
        let before = nb.null_rejection_thresholds();

        nb.set_null_rejection_coeff(10.0);
        assert!(nb.recompute_null_rejection_thresholds());
        let after = nb.null_rejection_thresholds();

        assert_eq!(before.len(), 2);
        for (b, a) in before.iter().zip(&after) {
            assert!(a < b, "threshold {a} should be below {b}");
        }
    }

    #[test]
    fn dimension_mismatch_on_predict() {
        let mut nb = NaiveBayes::default();
        nb.train(&two_colour_set()).unwrap();
        assert_eq!(
            nb.predict(&[1.0, 0.0]),
            Err(PipelineError::DimensionMismatch { expected: 3, actual: 2 })
        );
    }
}
