/// Data layer: sample types, loading and saving.
///
/// Architecture:
/// ```text
///  .parquet / .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → SampleSet   (save_csv for the way back)
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ SampleSet  │  Vec<Sample>, channel names, optional class labels
///   └───────────┘
///        │
///        ├──► training (Pipeline::train)
///        └──► replay   (session::ReplayStream)
/// ```

pub mod loader;
pub mod model;
