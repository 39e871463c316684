/// Data layer: core types, loading, and filtering.
///
/// Architecture:
/// ```text
///  .parquet / .json / .csv / .txt
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → SpectralDataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ SpectralDataset│  Vec<Spectrum>, column index
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  apply metadata predicates → curves included in a run
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
