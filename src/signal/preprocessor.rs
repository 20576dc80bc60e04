use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::lowpass::LowPassFilter;
use super::normalize::normalize_min_max;
use super::window::{segment, Window};
use crate::config::PreprocessConfig;
use crate::data::model::{MeasurementKey, MeasurementSlice, UnifiedTable};
use crate::error::{PipelineError, Result};

/// A filtered, normalized window ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedWindow {
    pub index: usize,
    /// Re-based seconds, rounded to 4 decimals.
    pub time: Vec<f64>,
    pub data_filtered_normalized: Vec<f64>,
}

#[derive(Serialize)]
struct CleanedRow {
    time: f64,
    data_filtered_normalized: f64,
}

/// Outcome of [`Preprocessor::run`].
#[derive(Debug, Default)]
pub struct RunSummary {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(MeasurementKey, PipelineError)>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Segment → low-pass → normalize → persist, one measurement at a time.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    window_size: NonZeroUsize,
    filter: LowPassFilter,
    output_dir: PathBuf,
}

impl Preprocessor {
    pub fn new(config: &PreprocessConfig) -> Result<Self> {
        Ok(Preprocessor {
            window_size: config.window_size_points()?,
            filter: LowPassFilter::new(config.cutoff_hz, config.sampling_rate_hz as f64)?,
            output_dir: config.output_dir.clone(),
        })
    }

    pub fn window_size(&self) -> NonZeroUsize {
        self.window_size
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Where the windows of `key` are written.
    pub fn output_path(&self, key: &MeasurementKey) -> PathBuf {
        self.output_dir.join(format!("{key}.csv"))
    }

    /// Clean every window of `slice`.  Windows too short to filter are
    /// logged and left out; the others keep their original indices.
    pub fn preprocess(&self, slice: &MeasurementSlice) -> Vec<CleanedWindow> {
        segment(slice, self.window_size)
            .filter_map(|window| match self.clean_window(window) {
                Ok(cleaned) => Some(cleaned),
                Err(e) => {
                    log::warn!(
                        "Skipping window {} of experiment {}, measurement {}: {e}",
                        window.index,
                        slice.key.experiment,
                        slice.key.measurement
                    );
                    None
                }
            })
            .collect()
    }

    fn clean_window(&self, window: Window<'_>) -> Result<CleanedWindow> {
        let mut values = window.data.to_vec();
        self.filter.apply(&mut values)?;
        normalize_min_max(&mut values);
        Ok(CleanedWindow {
            index: window.index,
            time: window.time.iter().map(|&t| round4(t)).collect(),
            data_filtered_normalized: values,
        })
    }

    /// Write all windows of one measurement, in order, to a single CSV file
    /// with columns `time,data_filtered_normalized`.
    pub fn save(&self, key: &MeasurementKey, windows: &[CleanedWindow]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)
            .map_err(|e| PipelineError::persistence(&self.output_dir, e))?;

        let path = self.output_path(key);
        let mut writer = csv::Writer::from_path(&path).map_err(|e| to_persistence(&path, e))?;
        for window in windows {
            for (&time, &value) in window.time.iter().zip(&window.data_filtered_normalized) {
                writer
                    .serialize(CleanedRow {
                        time,
                        data_filtered_normalized: value,
                    })
                    .map_err(|e| to_persistence(&path, e))?;
            }
        }
        writer
            .flush()
            .map_err(|e| PipelineError::persistence(&path, e))?;

        log::info!(
            "Saved {} window(s) of {} to {}",
            windows.len(),
            key,
            path.display()
        );
        Ok(path)
    }

    /// Preprocess and persist one measurement.  `Ok(None)` when no window
    /// survived filtering and nothing was written.
    pub fn process_measurement(&self, slice: &MeasurementSlice) -> Result<Option<PathBuf>> {
        log::info!(
            "Processing experiment {}, measurement {} ({} samples)",
            slice.key.experiment,
            slice.key.measurement,
            slice.len()
        );
        let windows = self.preprocess(slice);
        if windows.is_empty() {
            log::warn!("No usable windows for {}; nothing written", slice.key);
            return Ok(None);
        }
        self.save(&slice.key, &windows).map(Some)
    }

    /// Process every measurement of `table` in order of first appearance.
    /// A measurement that cannot be written is logged and reported in the
    /// summary; the rest still run.
    pub fn run(&self, table: &UnifiedTable) -> RunSummary {
        let mut summary = RunSummary::default();
        for key in table.measurement_keys() {
            let slice = table.measurement_slice(&key);
            match self.process_measurement(&slice) {
                Ok(Some(path)) => summary.written.push(path),
                Ok(None) => {}
                Err(e) => {
                    log::error!(
                        "Failed experiment {}, measurement {}: {e}",
                        key.experiment,
                        key.measurement
                    );
                    summary.failed.push((key, e));
                }
            }
        }
        summary
    }
}

fn round4(t: f64) -> f64 {
    (t * 10_000.0).round() / 10_000.0
}

fn to_persistence(path: &Path, err: csv::Error) -> PipelineError {
    PipelineError::persistence(path, std::io::Error::other(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: &Path) -> PreprocessConfig {
        PreprocessConfig {
            output_dir: dir.join("preprocessed"),
            ..PreprocessConfig::default()
        }
    }

    fn slice(n: usize) -> MeasurementSlice {
        MeasurementSlice {
            key: MeasurementKey::new("experiment1", "measurement_1"),
            time: (0..n).map(|i| i as f64 / 10_000.0).collect(),
            data: (0..n)
                .map(|i| (i as f64 * 0.01).sin() + (i as f64 * 0.9).cos())
                .collect(),
        }
    }

    #[test]
    fn rounds_time_to_four_decimals() {
        assert_eq!(round4(0.000_149_9), 0.0001);
        assert_eq!(round4(0.123_46), 0.1235);
        assert_eq!(round4(0.0003 - 0.0001), 0.0002);
    }

    #[test]
    fn windows_are_cleaned_and_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let pre = Preprocessor::new(&config(dir.path())).unwrap();
        let windows = pre.preprocess(&slice(2_500));

        assert_eq!(windows.len(), 3);
        assert_eq!(windows[2].data_filtered_normalized.len(), 500);
        for w in &windows {
            assert_eq!(w.time.len(), w.data_filtered_normalized.len());
            assert!(w.data_filtered_normalized.iter().all(|v| (0.0..=1.0).contains(v)));
        }
        // Time keeps running across windows.
        assert_eq!(windows[1].time[0], 0.1);
    }

    #[test]
    fn short_tail_window_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let pre = Preprocessor::new(&config(dir.path())).unwrap();
        let windows = pre.preprocess(&slice(2_003));
        let indices: Vec<usize> = windows.iter().map(|w| w.index).collect();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn writes_one_file_per_measurement() {
        let dir = tempfile::tempdir().unwrap();
        let pre = Preprocessor::new(&config(dir.path())).unwrap();
        let path = pre.process_measurement(&slice(1_200)).unwrap().unwrap();

        assert_eq!(
            path,
            dir.path()
                .join("preprocessed")
                .join("experiment1_measurement_1.csv")
        );
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("time,data_filtered_normalized"));
        assert_eq!(lines.count(), 1_200);
    }

    #[test]
    fn nothing_written_when_all_windows_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let pre = Preprocessor::new(&config(dir.path())).unwrap();
        assert_eq!(pre.process_measurement(&slice(3)).unwrap(), None);
        assert!(!dir.path().join("preprocessed").exists());
    }

    #[test]
    fn unwritable_output_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let pre = Preprocessor::new(&PreprocessConfig {
            output_dir: blocker.join("sub"),
            ..PreprocessConfig::default()
        })
        .unwrap();
        assert!(matches!(
            pre.process_measurement(&slice(1_000)),
            Err(PipelineError::Persistence { .. })
        ));
    }
}
