use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, Float32Array, Float64Array, Int32Array, Int64Array};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{ClassLabel, Sample, SampleSet};

/// Name of the optional column holding the class label.
pub const LABEL_COLUMN: &str = "label";

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a sample set from a file.  Dispatch by extension.
///
/// `channels` selects and orders the feature columns.  When empty, every
/// column except `label` is a channel, in file order (sorted keys for JSON).
///
/// Supported formats:
/// * `.parquet` – `label` Int32/Int64 column plus Float32/Float64 channel columns
/// * `.json`    – `[{ "label": 1, "red": 0.4, "green": 0.2, "blue": 0.1 }, ...]`
/// * `.csv`     – header row, `label` column plus one column per channel
pub fn load_file(path: &Path, channels: &[String]) -> Result<SampleSet> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let set = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path, channels),
        "json" => load_json(path, channels),
        "csv" => load_csv(path, channels),
        other => bail!("Unsupported file extension: .{other}"),
    }?;

    log::info!(
        "Loaded {} samples ({} labelled) from {} with channels {:?}",
        set.len(),
        set.labelled().count(),
        path.display(),
        set.channel_names
    );
    Ok(set)
}

/// Write a sample set as CSV (`label` first, then one column per channel).
/// Unlabelled samples get an empty label cell.
pub fn save_csv(path: &Path, set: &SampleSet) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;

    let mut header = vec![LABEL_COLUMN.to_string()];
    header.extend(set.channel_names.iter().cloned());
    writer.write_record(&header).context("writing CSV header")?;

    for (row, sample) in set.samples.iter().enumerate() {
        if sample.features.len() != set.channel_names.len() {
            bail!(
                "Row {row}: {} features but {} channels",
                sample.features.len(),
                set.channel_names.len()
            );
        }
        let mut record = Vec::with_capacity(header.len());
        record.push(sample.label.map(|l| l.to_string()).unwrap_or_default());
        record.extend(sample.features.iter().map(|v| v.to_string()));
        writer
            .write_record(&record)
            .with_context(|| format!("writing CSV row {row}"))?;
    }

    writer.flush().context("flushing CSV")?;
    log::info!("Saved {} samples to {}", set.len(), path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented):
///
/// ```json
/// [
///   { "label": 1, "red": 0.81, "green": 0.12, "blue": 0.09 },
///   { "red": 0.10, "green": 0.75, "blue": 0.20 },
///   ...
/// ]
/// ```
fn load_json(path: &Path, channels: &[String]) -> Result<SampleSet> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let channel_names: Vec<String> = if channels.is_empty() {
        records
            .first()
            .and_then(|r| r.as_object())
            .map(|obj| {
                obj.keys()
                    .filter(|k| k.as_str() != LABEL_COLUMN)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    } else {
        channels.to_vec()
    };

    let mut set = SampleSet::new(channel_names);

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let features = set
            .channel_names
            .iter()
            .map(|ch| {
                obj.get(ch)
                    .and_then(|v| v.as_f64())
                    .with_context(|| format!("Row {i}: missing or non-numeric '{ch}'"))
            })
            .collect::<Result<Vec<f64>>>()?;

        let label = match obj.get(LABEL_COLUMN) {
            None | Some(JsonValue::Null) => None,
            Some(v) => Some(json_to_label(v).with_context(|| format!("Row {i}: bad label"))?),
        };

        set.push(Sample { label, features });
    }

    Ok(set)
}

fn json_to_label(val: &JsonValue) -> Result<ClassLabel> {
    let n = match val {
        JsonValue::Number(n) => n.as_u64().context("label must be a non-negative integer")?,
        JsonValue::String(s) => s.trim().parse::<u64>().context("label must be an integer")?,
        other => bail!("unexpected label value {other}"),
    };
    let n = u32::try_from(n).context("label out of range")?;
    Ok(ClassLabel(n))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout:  header row with column names.
/// `label` holds an integer class label (may be empty); every selected
/// channel column holds one float per row.
fn load_csv(path: &Path, channels: &[String]) -> Result<SampleSet> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let label_idx = headers.iter().position(|h| h == LABEL_COLUMN);
    let channel_cols = select_columns(&headers, label_idx, channels)?;

    let mut set = SampleSet::new(channel_cols.iter().map(|(_, n)| n.clone()).collect());

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let features = channel_cols
            .iter()
            .map(|(idx, name)| {
                let tok = record.get(*idx).unwrap_or("").trim();
                tok.parse::<f64>()
                    .with_context(|| format!("Row {row_no}, {name}: '{tok}' is not a number"))
            })
            .collect::<Result<Vec<f64>>>()?;

        let label = match label_idx.map(|i| record.get(i).unwrap_or("").trim()) {
            None | Some("") => None,
            Some(tok) => Some(ClassLabel(
                tok.parse::<u32>()
                    .with_context(|| format!("Row {row_no}: '{tok}' is not a class label"))?,
            )),
        };

        set.push(Sample { label, features });
    }

    Ok(set)
}

/// Resolve channel column indices by name, or take every non-label column.
fn select_columns(
    headers: &[String],
    label_idx: Option<usize>,
    channels: &[String],
) -> Result<Vec<(usize, String)>> {
    if channels.is_empty() {
        return Ok(headers
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != label_idx)
            .map(|(i, h)| (i, h.clone()))
            .collect());
    }
    channels
        .iter()
        .map(|ch| {
            headers
                .iter()
                .position(|h| h == ch)
                .map(|i| (i, ch.clone()))
                .with_context(|| format!("missing channel column '{ch}'"))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of colour samples.
///
/// Expected schema:
/// - `label`: Int32 or Int64, nullable, optional
/// - channel columns: Float32 or Float64
fn load_parquet(path: &Path, channels: &[String]) -> Result<SampleSet> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;

    let schema = builder.schema().clone();
    let headers: Vec<String> = schema.fields().iter().map(|f| f.name().clone()).collect();
    let label_idx = headers.iter().position(|h| h == LABEL_COLUMN);
    let channel_cols = select_columns(&headers, label_idx, channels)?;

    let reader = builder.build().context("building parquet reader")?;
    let mut set = SampleSet::new(channel_cols.iter().map(|(_, n)| n.clone()).collect());

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;

        let label_col = label_idx.map(|i| batch.column(i));
        let value_cols: Vec<&Arc<dyn Array>> =
            channel_cols.iter().map(|(i, _)| batch.column(*i)).collect();

        for row in 0..batch.num_rows() {
            let features = value_cols
                .iter()
                .zip(&channel_cols)
                .map(|(col, (_, name))| {
                    extract_f64(col, row).with_context(|| format!("Row {row}: failed to read '{name}'"))
                })
                .collect::<Result<Vec<f64>>>()?;

            let label = match label_col {
                Some(col) => extract_label(col, row).with_context(|| format!("Row {row}: bad label"))?,
                None => None,
            };

            set.push(Sample { label, features });
        }
    }

    Ok(set)
}

// -- Parquet / Arrow helpers --

fn extract_f64(col: &Arc<dyn Array>, row: usize) -> Result<f64> {
    if col.is_null(row) {
        bail!("null value in channel column");
    }
    match col.data_type() {
        DataType::Float64 => col
            .as_any()
            .downcast_ref::<Float64Array>()
            .map(|a| a.value(row))
            .context("expected Float64Array"),
        DataType::Float32 => col
            .as_any()
            .downcast_ref::<Float32Array>()
            .map(|a| a.value(row) as f64)
            .context("expected Float32Array"),
        other => bail!("Expected Float32 or Float64 channel column, got {other:?}"),
    }
}

fn extract_label(col: &Arc<dyn Array>, row: usize) -> Result<Option<ClassLabel>> {
    if col.is_null(row) {
        return Ok(None);
    }
    let raw: i64 = match col.data_type() {
        DataType::Int32 => col
            .as_any()
            .downcast_ref::<Int32Array>()
            .map(|a| a.value(row) as i64)
            .context("expected Int32Array")?,
        DataType::Int64 => col
            .as_any()
            .downcast_ref::<Int64Array>()
            .map(|a| a.value(row))
            .context("expected Int64Array")?,
        other => bail!("Expected Int32 or Int64 label column, got {other:?}"),
    };
    let label = u32::try_from(raw).with_context(|| format!("label {raw} out of range"))?;
    Ok(Some(ClassLabel(label)))
}

/// Group a sample set's labelled rows by class; handy for per-class stats in the UI.
pub fn samples_per_class(set: &SampleSet) -> BTreeMap<ClassLabel, usize> {
    let mut counts = BTreeMap::new();
    for (label, _) in set.labelled() {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use arrow::array::{Float64Array, Int64Array};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use tempfile::tempdir;

    fn rgb() -> Vec<String> {
        vec!["red".into(), "green".into(), "blue".into()]
    }

    #[test]
    fn csv_with_optional_labels() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("colors.csv");
        fs::write(&path, "label,red,green,blue\n1,0.9,0.1,0.1\n,0.1,0.8,0.2\n2,0.1,0.1,0.9\n").unwrap();

        let set = load_file(&path, &[]).unwrap();
        assert_eq!(set.channel_names, rgb());
        assert_eq!(set.len(), 3);
        assert_eq!(set.samples[0].label, Some(ClassLabel(1)));
        assert_eq!(set.samples[1].label, None);
        assert_eq!(set.samples[2].features, vec![0.1, 0.1, 0.9]);
    }

    #[test]
    fn csv_channel_selection_reorders_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("colors.csv");
        fs::write(&path, "blue,red,green\n0.3,0.1,0.2\n").unwrap();

        let set = load_file(&path, &rgb()).unwrap();
        assert_eq!(set.samples[0].features, vec![0.1, 0.2, 0.3]);
        assert_eq!(set.samples[0].label, None);
    }

    #[test]
    fn csv_missing_channel_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("colors.csv");
        fs::write(&path, "label,red,green\n1,0.1,0.2\n").unwrap();

        let err = load_file(&path, &rgb()).unwrap_err();
        assert!(format!("{err:#}").contains("blue"));
    }

    #[test]
    fn json_uses_requested_channel_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("colors.json");
        fs::write(
            &path,
            r#"[{"label": 3, "red": 0.5, "green": 0.4, "blue": 0.3},
                {"red": 0.1, "green": 0.2, "blue": 0.3, "label": null}]"#,
        )
        .unwrap();

        let set = load_file(&path, &rgb()).unwrap();
        assert_eq!(set.samples[0].label, Some(ClassLabel(3)));
        assert_eq!(set.samples[0].features, vec![0.5, 0.4, 0.3]);
        assert_eq!(set.samples[1].label, None);
    }

    #[test]
    fn saved_csv_loads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("saved.csv");
        let mut set = SampleSet::new(rgb());
        set.push(Sample::labelled(ClassLabel(4), vec![0.25, 0.5, 0.75]));
        set.push(Sample::unlabelled(vec![1.0, 0.0, 0.0]));

        save_csv(&path, &set).unwrap();
        let loaded = load_file(&path, &[]).unwrap();
        assert_eq!(loaded, set);
    }

    #[test]
    fn parquet_with_label_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("colors.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new("label", DataType::Int64, true),
            Field::new("red", DataType::Float64, false),
            Field::new("green", DataType::Float64, false),
            Field::new("blue", DataType::Float64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![Some(1), None])),
                Arc::new(Float64Array::from(vec![0.9, 0.1])),
                Arc::new(Float64Array::from(vec![0.1, 0.9])),
                Arc::new(Float64Array::from(vec![0.0, 0.1])),
            ],
        )
        .unwrap();
        let file = fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let set = load_file(&path, &[]).unwrap();
        assert_eq!(set.channel_names, rgb());
        assert_eq!(set.samples[0].label, Some(ClassLabel(1)));
        assert_eq!(set.samples[1].label, None);
        assert_eq!(set.samples[1].features, vec![0.1, 0.9, 0.1]);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_file(Path::new("colors.txt"), &[]).unwrap_err();
        assert!(err.to_string().contains(".txt"));
    }

    #[test]
    fn counts_samples_per_class() {
        let mut set = SampleSet::new(rgb());
        set.push(Sample::labelled(ClassLabel(1), vec![0.0; 3]));
        set.push(Sample::labelled(ClassLabel(1), vec![0.0; 3]));
        set.push(Sample::labelled(ClassLabel(2), vec![0.0; 3]));
        let counts = samples_per_class(&set);
        assert_eq!(counts[&ClassLabel(1)], 2);
        assert_eq!(counts[&ClassLabel(2)], 1);
    }
}
