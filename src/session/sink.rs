use std::fs::{File, OpenOptions};
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};

use crate::data::model::ClassLabel;

/// Destination for predictions that pass the output gate.
pub trait PredictionSink {
    fn send(&mut self, label: ClassLabel) -> Result<()>;
}

/// Logs each prediction at info level.
#[derive(Debug, Default)]
pub struct LogSink;

impl PredictionSink for LogSink {
    fn send(&mut self, label: ClassLabel) -> Result<()> {
        log::info!("Prediction: class {label}");
        Ok(())
    }
}

/// Appends `elapsed_ms,label` rows to a CSV file.
pub struct CsvSink {
    writer: csv::Writer<File>,
    started: Instant,
}

impl CsvSink {
    pub fn create(path: &Path) -> Result<Self> {
        let exists = path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening {}", path.display()))?;
        let mut writer = csv::Writer::from_writer(file);
        if !exists {
            writer
                .write_record(["elapsed_ms", "label"])
                .context("writing predictions header")?;
            writer.flush().context("flushing predictions header")?;
        }
        Ok(Self {
            writer,
            started: Instant::now(),
        })
    }
}

impl PredictionSink for CsvSink {
    fn send(&mut self, label: ClassLabel) -> Result<()> {
        let elapsed = self.started.elapsed().as_millis().to_string();
        self.writer
            .write_record([elapsed, label.to_string()])
            .context("writing prediction")?;
        self.writer.flush().context("flushing prediction")?;
        Ok(())
    }
}

/// Fans a prediction out to several sinks; stops at the first failure.
#[derive(Default)]
pub struct SinkSet {
    sinks: Vec<Box<dyn PredictionSink>>,
}

impl SinkSet {
    pub fn push(&mut self, sink: Box<dyn PredictionSink>) {
        self.sinks.push(sink);
    }
}

impl PredictionSink for SinkSet {
    fn send(&mut self, label: ClassLabel) -> Result<()> {
        for sink in &mut self.sinks {
            sink.send(label)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn csv_sink_writes_header_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("predictions.csv");

        let mut sink = CsvSink::create(&path).unwrap();
        sink.send(ClassLabel(2)).unwrap();
        drop(sink);

        let mut sink = CsvSink::create(&path).unwrap();
        sink.send(ClassLabel(5)).unwrap();
        drop(sink);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(reader.headers().unwrap(), vec!["elapsed_ms", "label"]);
        let labels: Vec<String> = reader
            .records()
            .map(|r| r.unwrap().get(1).unwrap().to_string())
            .collect();
        assert_eq!(labels, vec!["2", "5"]);
    }
}
