use std::fmt;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;

use crate::error::{PipelineError, Result};

/// Acquisition rate every recording is assumed to share.
pub const SAMPLING_RATE_HZ: f64 = 10_000.0;

/// Experiment whose raw column is named `RawData` unless the manifest says otherwise.
pub const DEFAULT_RAW_COLUMN_EXPERIMENT: &str = "experiment4";

// ---------------------------------------------------------------------------
// FileFormat – closed set of readable file types
// ---------------------------------------------------------------------------

/// Declared on-disk format of one recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum FileFormat {
    /// Comma-delimited text with a header row.
    Csv,
    /// Tab-delimited text with a header row.
    Tsv,
    /// Apache Parquet snapshot of a table.
    Parquet,
}

impl FileFormat {
    /// Field delimiter for the text formats.
    pub fn delimiter(self) -> Option<u8> {
        match self {
            FileFormat::Csv => Some(b','),
            FileFormat::Tsv => Some(b'\t'),
            FileFormat::Parquet => None,
        }
    }
}

impl FromStr for FileFormat {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(FileFormat::Csv),
            "tsv" => Ok(FileFormat::Tsv),
            "parquet" | "pq" => Ok(FileFormat::Parquet),
            other => Err(PipelineError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl TryFrom<String> for FileFormat {
    type Error = PipelineError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFormat::Csv => write!(f, "csv"),
            FileFormat::Tsv => write!(f, "tsv"),
            FileFormat::Parquet => write!(f, "parquet"),
        }
    }
}

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

/// One `{path, type}` entry of an experiment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FileDescriptor {
    #[serde(deserialize_with = "deserialize_host_path")]
    pub path: PathBuf,
    #[serde(rename = "type")]
    pub format: FileFormat,
}

impl FileDescriptor {
    pub fn new(path: impl AsRef<str>, format: FileFormat) -> Self {
        FileDescriptor {
            path: to_host_path(path.as_ref()),
            format,
        }
    }

    /// Measurement name: the file's base name up to the first dot.
    pub fn measurement_name(&self) -> String {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.split('.').next())
            .unwrap_or_default()
            .to_string()
    }
}

/// A named experiment and its recordings, in manifest order.
#[derive(Debug, Clone, PartialEq)]
pub struct Experiment {
    pub name: String,
    pub files: Vec<FileDescriptor>,
}

/// The validated experiment manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    experiments: Vec<Experiment>,
    /// Experiment whose `RawData` column is taken as `data`.
    pub raw_column_experiment: Option<String>,
    pub preprocessing: PreprocessConfig,
}

#[derive(Deserialize)]
struct RawManifest {
    experiments: serde_json::Map<String, JsonValue>,
    #[serde(default = "default_raw_column_experiment")]
    raw_column_experiment: Option<String>,
    #[serde(default)]
    preprocessing: PreprocessConfig,
}

fn default_raw_column_experiment() -> Option<String> {
    Some(DEFAULT_RAW_COLUMN_EXPERIMENT.to_string())
}

impl Manifest {
    /// Read and validate a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("cannot read manifest {}: {e}", path.display()))
        })?;
        let manifest = Self::from_json_str(&text)?;
        log::info!(
            "Loaded manifest {} with {} experiment(s)",
            path.display(),
            manifest.experiments.len()
        );
        Ok(manifest)
    }

    /// Parse a manifest document. Every entry is checked here so that a bad
    /// `path` or `type` is reported before any file is opened.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let raw: RawManifest = serde_json::from_str(text)
            .map_err(|e| PipelineError::Config(format!("invalid manifest: {e}")))?;

        let mut experiments = Vec::with_capacity(raw.experiments.len());
        for (name, files) in raw.experiments {
            let files: Vec<FileDescriptor> = serde_json::from_value(files).map_err(|e| {
                PipelineError::Config(format!("experiment '{name}': invalid file list: {e}"))
            })?;
            experiments.push(Experiment { name, files });
        }

        // Reject unusable window settings now rather than at the first window.
        raw.preprocessing.window_size_points()?;

        Ok(Manifest {
            experiments,
            raw_column_experiment: raw.raw_column_experiment,
            preprocessing: raw.preprocessing,
        })
    }

    /// Build a manifest in code, with default settings.
    pub fn from_experiments(experiments: Vec<Experiment>) -> Self {
        Manifest {
            experiments,
            raw_column_experiment: default_raw_column_experiment(),
            preprocessing: PreprocessConfig::default(),
        }
    }

    pub fn experiments(&self) -> &[Experiment] {
        &self.experiments
    }

    pub fn experiment(&self, name: &str) -> Option<&Experiment> {
        self.experiments.iter().find(|e| e.name == name)
    }

    /// Experiments to load: all of them, or exactly the requested one.
    pub fn resolve(&self, name: Option<&str>) -> Result<Vec<&Experiment>> {
        match name {
            None => Ok(self.experiments.iter().collect()),
            Some(name) => self
                .experiment(name)
                .map(|e| vec![e])
                .ok_or_else(|| {
                    PipelineError::Config(format!("experiment '{name}' not found in manifest"))
                }),
        }
    }

    /// Whether `experiment` reads its samples from a `RawData` column.
    pub fn uses_raw_column(&self, experiment: &str) -> bool {
        self.raw_column_experiment.as_deref() == Some(experiment)
    }
}

/// Map both separator conventions onto the host's.
pub fn to_host_path(raw: &str) -> PathBuf {
    raw.chars()
        .map(|c| if c == '\\' || c == '/' { MAIN_SEPARATOR } else { c })
        .collect::<String>()
        .into()
}

fn deserialize_host_path<'de, D>(deserializer: D) -> std::result::Result<PathBuf, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if raw.trim().is_empty() {
        return Err(serde::de::Error::custom("empty path"));
    }
    Ok(to_host_path(&raw))
}

// ---------------------------------------------------------------------------
// Preprocessing settings
// ---------------------------------------------------------------------------

/// Window and filter settings for the preprocessing stage.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    pub window_length_ms: u32,
    pub sampling_rate_hz: u32,
    /// Accepted for compatibility; the low-pass stage always uses 40 Hz.
    pub cutoff_hz: f64,
    pub output_dir: PathBuf,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            window_length_ms: 100,
            sampling_rate_hz: 10_000,
            cutoff_hz: 150.0,
            output_dir: PathBuf::from(".data/preprocessed"),
        }
    }
}

impl PreprocessConfig {
    /// `sampling_rate_hz / 1000 * window_length_ms`, truncated.
    pub fn window_size_points(&self) -> Result<NonZeroUsize> {
        let points = (self.sampling_rate_hz as f64 / 1000.0) * self.window_length_ms as f64;
        NonZeroUsize::new(points as usize).ok_or_else(|| {
            PipelineError::Config(format!(
                "window of {} ms at {} Hz holds no samples",
                self.window_length_ms, self.sampling_rate_hz
            ))
        })
    }
}
