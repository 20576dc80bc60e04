/// Data layer: manifest-driven loading, merging and selection.
///
/// Architecture:
/// ```text
///  manifest.json ──► [{path, type}, ...] per experiment
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  .csv / .tsv / .parquet → RawTable (`data` column)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  merger   │  tag experiment / measurement, concatenate,
///   └──────────┘  assign the global time axis → UnifiedTable
///        │
///        ├──► store    save / load the unified table as CSV
///        └──► filter   select rows by experiment / measurement
/// ```

pub mod filter;
pub mod loader;
pub mod merger;
pub mod model;
pub mod store;
