use std::collections::BTreeSet;
use std::fmt;

// ---------------------------------------------------------------------------
// ClassLabel – a trained pose / colour class
// ---------------------------------------------------------------------------

/// Identifier of a trained class. Predictions are `Option<ClassLabel>`, where
/// `None` is the null (rejected) class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassLabel(pub u32);

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Sample – one reading from the sensor
// ---------------------------------------------------------------------------

/// A single sensor reading, optionally labelled with the class it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Class this reading was recorded for (None for unlabelled recordings).
    pub label: Option<ClassLabel>,
    /// One value per channel, in `SampleSet::channel_names` order.
    pub features: Vec<f64>,
}

impl Sample {
    pub fn labelled(label: ClassLabel, features: Vec<f64>) -> Self {
        Self {
            label: Some(label),
            features,
        }
    }

    pub fn unlabelled(features: Vec<f64>) -> Self {
        Self {
            label: None,
            features,
        }
    }
}

// ---------------------------------------------------------------------------
// SampleSet – a recording or training set
// ---------------------------------------------------------------------------

/// An ordered collection of samples sharing the same channel layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSet {
    /// Channel names, e.g. `["red", "green", "blue"]`.
    pub channel_names: Vec<String>,
    /// Samples in recording order.
    pub samples: Vec<Sample>,
}

impl SampleSet {
    pub fn new(channel_names: Vec<String>) -> Self {
        Self {
            channel_names,
            samples: Vec::new(),
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of channels per sample.
    pub fn num_dimensions(&self) -> usize {
        self.channel_names.len()
    }

    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    /// Iterate over labelled samples only.
    pub fn labelled(&self) -> impl Iterator<Item = (ClassLabel, &[f64])> {
        self.samples
            .iter()
            .filter_map(|s| s.label.map(|l| (l, s.features.as_slice())))
    }

    /// Sorted set of class labels present in the set.
    pub fn class_labels(&self) -> BTreeSet<ClassLabel> {
        self.labelled().map(|(l, _)| l).collect()
    }

    /// Number of samples recorded for `label`.
    pub fn count_for(&self, label: ClassLabel) -> usize {
        self.labelled().filter(|(l, _)| *l == label).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labelled_skips_unlabelled_samples() {
        let mut set = SampleSet::new(vec!["red".into(), "green".into(), "blue".into()]);
        set.push(Sample::labelled(ClassLabel(2), vec![1.0, 0.0, 0.0]));
        set.push(Sample::unlabelled(vec![0.0, 1.0, 0.0]));
        set.push(Sample::labelled(ClassLabel(1), vec![0.0, 0.0, 1.0]));

        assert_eq!(set.len(), 3);
        assert_eq!(set.labelled().count(), 2);
        assert_eq!(
            set.class_labels().into_iter().collect::<Vec<_>>(),
            vec![ClassLabel(1), ClassLabel(2)]
        );
        assert_eq!(set.count_for(ClassLabel(2)), 1);
        assert_eq!(set.num_dimensions(), 3);
    }
}
