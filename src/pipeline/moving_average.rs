use std::collections::VecDeque;

use crate::error::PipelineError;

/// Per-dimension moving average over the last `window` samples.
///
/// Until the window has filled, the average is taken over the samples seen
/// so far.
#[derive(Debug, Clone)]
pub struct MovingAverageFilter {
    window: usize,
    dimensions: usize,
    buffer: VecDeque<Vec<f64>>,
}

impl MovingAverageFilter {
    /// `window` is clamped to at least 1.
    pub fn new(window: usize, dimensions: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            dimensions,
            buffer: VecDeque::with_capacity(window),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Push one sample and return the current average.
    pub fn filter(&mut self, x: &[f64]) -> Result<Vec<f64>, PipelineError> {
        if x.len() != self.dimensions {
            return Err(PipelineError::DimensionMismatch {
                expected: self.dimensions,
                actual: x.len(),
            });
        }
        if self.buffer.len() == self.window {
            self.buffer.pop_front();
        }
        self.buffer.push_back(x.to_vec());

        let n = self.buffer.len() as f64;
        let mut mean = vec![0.0; self.dimensions];
        for sample in &self.buffer {
            for (m, v) in mean.iter_mut().zip(sample) {
                *m += v;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);
        Ok(mean)
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}
