//! Writes synthetic colour-sensor data:
//! * `sample_training.parquet` – labelled readings for three colour classes
//! * `sample_recording.csv`    – an unlabelled session cycling through the colours

use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Mean raw reading per class: (label, red, green, blue).
const CLASSES: [(i64, [f64; 3]); 3] = [
    (1, [620.0, 140.0, 110.0]), // red card
    (2, [150.0, 480.0, 190.0]), // green card
    (3, [120.0, 200.0, 650.0]), // blue card
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// One reading: the class colour scaled by a random brightness plus sensor noise.
fn reading(base: &[f64; 3], rng: &mut SimpleRng) -> [f64; 3] {
    let brightness = 0.6 + 0.8 * rng.next_f64();
    let mut out = [0.0; 3];
    for (o, b) in out.iter_mut().zip(base) {
        *o = (b * brightness + rng.gauss(0.0, 8.0)).max(0.0).round();
    }
    out
}

fn write_training(path: &str, rng: &mut SimpleRng) -> Result<usize> {
    let per_class = 60;
    let mut labels = Vec::new();
    let mut channels: [Vec<f64>; 3] = Default::default();

    for (label, base) in &CLASSES {
        for _ in 0..per_class {
            let r = reading(base, rng);
            labels.push(*label);
            for (col, v) in channels.iter_mut().zip(r) {
                col.push(v);
            }
        }
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("label", DataType::Int64, true),
        Field::new("red", DataType::Float64, false),
        Field::new("green", DataType::Float64, false),
        Field::new("blue", DataType::Float64, false),
    ]));

    let [red, green, blue] = channels;
    let rows = labels.len();
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(labels)),
            Arc::new(Float64Array::from(red)),
            Arc::new(Float64Array::from(green)),
            Arc::new(Float64Array::from(blue)),
        ],
    )
    .context("creating record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(rows)
}

fn write_recording(path: &str, rng: &mut SimpleRng) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    writer.write_record(["red", "green", "blue"])?;

    // Hold each colour for two seconds at 100 Hz, with a short gap of an
    // uncovered sensor (ambient light) in between.
    let mut rows = 0;
    for round in 0..3 {
        for (_, base) in CLASSES.iter().cycle().skip(round).take(CLASSES.len()) {
            for _ in 0..200 {
                let r = reading(base, rng);
                writer.write_record(r.iter().map(|v| v.to_string()))?;
                rows += 1;
            }
            for _ in 0..50 {
                let r = reading(&[300.0, 300.0, 300.0], rng);
                writer.write_record(r.iter().map(|v| v.to_string()))?;
                rows += 1;
            }
        }
    }
    writer.flush()?;
    Ok(rows)
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    let training_path = "sample_training.parquet";
    let n = write_training(training_path, &mut rng)?;
    println!("Wrote {n} labelled readings to {training_path}");

    let recording_path = "sample_recording.csv";
    let n = write_recording(recording_path, &mut rng)?;
    println!("Wrote {n} readings to {recording_path}");

    Ok(())
}
