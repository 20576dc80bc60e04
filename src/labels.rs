//! Window-level labelling helpers for the downstream feature and
//! classification stages.
//!
//! Labels are configured per measurement as a `{start, end}` span in seconds
//! and applied to window indices, so window numbering produced by the
//! preprocessor must stay stable and ordered.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use serde::Deserialize;

/// Positive-label span of one measurement, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LabelRange {
    pub start: f64,
    pub end: f64,
}

/// Spans keyed by `"{experiment}_{measurement}"`.
pub type LabelConfig = BTreeMap<String, LabelRange>;

/// Window indices covered by `range`: `start·1000 / window_length_ms` through
/// `end·1000 / window_length_ms`, both truncated, both inclusive.
pub fn window_index_range(range: LabelRange, window_length_ms: u32) -> RangeInclusive<usize> {
    let to_index = |seconds: f64| (seconds * 1000.0 / window_length_ms as f64).max(0.0) as usize;
    to_index(range.start)..=to_index(range.end)
}

/// One label per window: 1 inside the configured span, 0 elsewhere.
pub fn window_labels(window_count: usize, range: LabelRange, window_length_ms: u32) -> Vec<u8> {
    let span = window_index_range(range, window_length_ms);
    (0..window_count)
        .map(|i| u8::from(span.contains(&i)))
        .collect()
}

/// Series id of each persisted row: rows are grouped `window_size_points` at
/// a time.
pub fn series_ids(row_count: usize, window_size_points: usize) -> Vec<usize> {
    (0..row_count).map(|row| row / window_size_points.max(1)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_to_window_indices() {
        let range = LabelRange {
            start: 9.0,
            end: 11.4,
        };
        assert_eq!(window_index_range(range, 100), 90..=114);
    }

    #[test]
    fn labels_clip_to_window_count() {
        let range = LabelRange {
            start: 0.25,
            end: 10.0,
        };
        let labels = window_labels(5, range, 100);
        assert_eq!(labels, vec![0, 0, 1, 1, 1]);
    }

    #[test]
    fn ids_group_rows_by_window() {
        assert_eq!(series_ids(5, 2), vec![0, 0, 1, 1, 2]);
    }

    #[test]
    fn config_from_json() {
        let config: LabelConfig = serde_json::from_str(
            r#"{"experiment1_measurement_5": {"start": 9.0, "end": 11.4}}"#,
        )
        .unwrap();
        assert_eq!(config["experiment1_measurement_5"].end, 11.4);
    }
}
