use std::time::{Duration, Instant};

use crate::data::model::ClassLabel;

/// Suppresses predictions for a fixed duration after one is emitted.
///
/// While a pose is held, the classifier keeps producing the same label. This
/// filter lets one through, blanks the output for `timeout`, then lets the
/// next one through, so downstream consumers see a repeat once per timeout.
#[derive(Debug, Clone)]
pub struct ClassLabelTimeoutFilter {
    timeout: Duration,
    last_emitted: Option<Instant>,
}

impl ClassLabelTimeoutFilter {
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            timeout: Duration::from_millis(timeout_ms),
            last_emitted: None,
        }
    }

    pub fn timeout_duration(&self) -> Duration {
        self.timeout
    }

    /// Update the duration in place. A running timeout keeps its start time.
    pub fn set_timeout_duration(&mut self, timeout_ms: u64) {
        self.timeout = Duration::from_millis(timeout_ms);
    }

    pub fn filter(&mut self, predicted: Option<ClassLabel>) -> Option<ClassLabel> {
        self.filter_at(predicted, Instant::now())
    }

    pub fn filter_at(&mut self, predicted: Option<ClassLabel>, now: Instant) -> Option<ClassLabel> {
        let label = predicted?;
        if let Some(since) = self.last_emitted {
            if now.saturating_duration_since(since) < self.timeout {
                return None;
            }
        }
        self.last_emitted = Some(now);
        Some(label)
    }

    pub fn reset(&mut self) {
        self.last_emitted = None;
    }
}
