use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::tuning::Settings;

// ---------------------------------------------------------------------------
// Application configuration
// ---------------------------------------------------------------------------

/// Top-level configuration, read from an optional JSON file.
///
/// Every field has a default, so `{}` is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sensor: SensorConfig,
    /// Initial tuneable values.
    pub settings: Settings,
    pub replay: ReplayConfig,
    /// Labelled samples to train on at startup.
    pub training_path: Option<PathBuf>,
    /// Append sent predictions to this CSV file (in addition to the log).
    pub predictions_csv: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Per-dimension labels, also used to select columns from data files.
    pub channels: Vec<String>,
    /// Nominal time between two samples.
    pub sample_interval_ms: u64,
    /// Moving-average window applied before classification.
    pub moving_average_window: usize,
    /// Keep the reading's magnitude as an extra feature after normalization.
    pub append_magnitude: bool,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            channels: vec!["red".into(), "green".into(), "blue".into()],
            sample_interval_ms: 10,
            moving_average_window: 5,
            append_magnitude: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Recording replayed as the sensor stream.
    pub path: Option<PathBuf>,
    /// Restart from the beginning when the recording ends.
    pub looping: bool,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: AppConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Load from the first CLI argument if given, otherwise use defaults.
    pub fn from_args() -> Result<Self> {
        match std::env::args_os().nth(1) {
            Some(path) => {
                let path = PathBuf::from(path);
                log::info!("Using config {}", path.display());
                Self::load(&path)
            }
            None => Ok(Self::default()),
        }
    }
}
