use std::path::PathBuf;

use thiserror::Error;

/// Failures raised anywhere in the ingest → window pipeline.
///
/// `Format`, `UnsupportedFormat`, `Parse` and `Filter` are recovered locally
/// (the offending file or window is skipped); `Config` and `Persistence`
/// reach the caller.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("format error in {}: {message}", .path.display())]
    Format { path: PathBuf, message: String },

    #[error("unsupported file type '{0}' (expected csv, tsv or parquet)")]
    UnsupportedFormat(String),

    #[error("parse error in {}, row {row}: '{value}' is not a number", .path.display())]
    Parse {
        path: PathBuf,
        row: usize,
        value: String,
    },

    #[error("cannot filter window of {len} samples (need at least {required})")]
    Filter { len: usize, required: usize },

    #[error("cannot write {}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub(crate) fn format(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        PipelineError::Format {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Persistence {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
