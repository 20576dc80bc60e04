//! Turn multi-experiment sensor recordings into filtered, normalized,
//! fixed-length windows.

pub mod config;
pub mod data;
pub mod error;
pub mod labels;
pub mod signal;

pub use config::{Experiment, FileDescriptor, FileFormat, Manifest, PreprocessConfig};
pub use data::merger::merge_experiments;
pub use data::model::{MeasurementKey, MeasurementSlice, Sample, UnifiedTable};
pub use error::{PipelineError, Result};
pub use signal::preprocessor::{CleanedWindow, Preprocessor, RunSummary};
