use std::time::{Duration, Instant};

use anyhow::Result;

use crate::data::model::SampleSet;

/// Source of raw sensor readings, one feature vector per sample.
pub trait SensorStream {
    /// Next reading, waiting at most `wait`. `Ok(None)` means nothing arrived
    /// in time (or the stream has ended; see `is_finished`).
    fn read(&mut self, wait: Duration) -> Result<Option<Vec<f64>>>;

    /// Per-dimension labels.
    fn channel_names(&self) -> &[String];

    /// Whether the stream will never produce another sample.
    fn is_finished(&self) -> bool {
        false
    }
}

/// Replays a recorded sample set at a fixed interval.
pub struct ReplayStream {
    set: SampleSet,
    cursor: usize,
    interval: Duration,
    looping: bool,
    next_due: Option<Instant>,
}

impl ReplayStream {
    pub fn new(set: SampleSet, interval: Duration, looping: bool) -> Self {
        Self {
            set,
            cursor: 0,
            interval,
            looping,
            next_due: None,
        }
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn rewind(&mut self) {
        self.cursor = 0;
        self.next_due = None;
    }
}

impl SensorStream for ReplayStream {
    fn read(&mut self, wait: Duration) -> Result<Option<Vec<f64>>> {
        if self.cursor >= self.set.len() {
            if !self.looping || self.set.is_empty() {
                return Ok(None);
            }
            self.cursor = 0;
        }

        let now = Instant::now();
        let due = self.next_due.unwrap_or(now);
        if due > now {
            let remaining = due - now;
            if remaining > wait {
                std::thread::sleep(wait);
                return Ok(None);
            }
            std::thread::sleep(remaining);
        }

        // Never schedule the next sample in the past; a stalled host should
        // not receive a burst of backlog.
        let next = due + self.interval;
        self.next_due = Some(if next < now { now } else { next });

        let features = self.set.samples[self.cursor].features.clone();
        self.cursor += 1;
        Ok(Some(features))
    }

    fn channel_names(&self) -> &[String] {
        &self.set.channel_names
    }

    fn is_finished(&self) -> bool {
        !self.looping && self.cursor >= self.set.len()
    }
}
