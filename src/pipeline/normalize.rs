//! Unit-magnitude normalization of raw colour readings.
//!
//! Dividing by the Euclidean norm removes overall brightness so that the
//! classifier only sees hue/saturation. The magnitude itself can optionally be
//! kept as a trailing feature.

/// Name of the appended magnitude feature.
pub const MAGNITUDE_FEATURE: &str = "magnitude";

/// Divide each element by the vector's Euclidean norm.
///
/// Only the all-zero vector (typically a covered sensor) is mapped to zeros
/// instead of NaN. Elements are scaled by the largest absolute value first so
/// tiny and huge readings neither underflow nor overflow.
pub fn normalize(mut input: Vec<f64>) -> Vec<f64> {
    let max = max_abs(&input);
    if max == 0.0 {
        input.iter_mut().for_each(|v| *v = 0.0);
        return input;
    }
    input.iter_mut().for_each(|v| *v /= max);
    let norm = sum_of_squares(&input).sqrt();
    for v in &mut input {
        *v /= norm;
    }
    input
}

/// Euclidean norm, computed without intermediate overflow.
pub fn magnitude(input: &[f64]) -> f64 {
    let max = max_abs(input);
    if max == 0.0 {
        return 0.0;
    }
    let scaled: f64 = input.iter().map(|v| (v / max).powi(2)).sum();
    max * scaled.sqrt()
}

fn max_abs(input: &[f64]) -> f64 {
    input.iter().fold(0.0, |m: f64, v| m.max(v.abs()))
}

fn sum_of_squares(input: &[f64]) -> f64 {
    input.iter().map(|v| v * v).sum()
}

/// Normalizer attached to the sensor stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    /// Append the pre-normalization magnitude as an extra feature.
    pub append_magnitude: bool,
}

impl Normalizer {
    pub fn new(append_magnitude: bool) -> Self {
        Self { append_magnitude }
    }

    /// Number of features produced for `input_dims` raw channels.
    pub fn output_dimensions(&self, input_dims: usize) -> usize {
        if self.append_magnitude {
            input_dims + 1
        } else {
            input_dims
        }
    }

    pub fn apply(&self, input: Vec<f64>) -> Vec<f64> {
        if self.append_magnitude {
            let m = magnitude(&input);
            let mut out = normalize(input);
            out.push(m);
            out
        } else {
            normalize(input)
        }
    }
}
