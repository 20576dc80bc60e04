use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// RawTable – one file's worth of samples
// ---------------------------------------------------------------------------

/// The single `data` column read from one recording.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub data: Vec<f64>,
}

impl RawTable {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Sample – one row of the unified table
// ---------------------------------------------------------------------------

/// One tagged sample of the merged dataset.
///
/// Identity strings are shared between all rows of a file.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub data: f64,
    pub experiment: Arc<str>,
    pub measurement: Arc<str>,
    /// Seconds on the global synthetic clock.
    pub time: f64,
}

/// `(experiment, measurement)` identity of a recording.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeasurementKey {
    pub experiment: String,
    pub measurement: String,
}

impl MeasurementKey {
    pub fn new(experiment: impl Into<String>, measurement: impl Into<String>) -> Self {
        MeasurementKey {
            experiment: experiment.into(),
            measurement: measurement.into(),
        }
    }

    fn matches(&self, sample: &Sample) -> bool {
        *sample.experiment == *self.experiment && *sample.measurement == *self.measurement
    }
}

impl fmt::Display for MeasurementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.experiment, self.measurement)
    }
}

// ---------------------------------------------------------------------------
// UnifiedTable – every experiment's rows on one clock
// ---------------------------------------------------------------------------

/// Merged rows in manifest-then-file-then-row order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnifiedTable {
    pub rows: Vec<Sample>,
}

impl UnifiedTable {
    pub fn from_rows(rows: Vec<Sample>) -> Self {
        UnifiedTable { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct `(experiment, measurement)` pairs in order of first appearance.
    pub fn measurement_keys(&self) -> Vec<MeasurementKey> {
        let mut seen = BTreeSet::new();
        let mut keys = Vec::new();
        for row in &self.rows {
            let key = MeasurementKey::new(&*row.experiment, &*row.measurement);
            if seen.insert(key.clone()) {
                keys.push(key);
            }
        }
        keys
    }

    /// All rows of one measurement with `time` shifted to start at zero.
    pub fn measurement_slice(&self, key: &MeasurementKey) -> MeasurementSlice {
        let mut time = Vec::new();
        let mut data = Vec::new();
        for row in self.rows.iter().filter(|r| key.matches(r)) {
            time.push(row.time);
            data.push(row.data);
        }
        if let Some(&t0) = time.first() {
            time.iter_mut().for_each(|t| *t -= t0);
        }
        MeasurementSlice {
            key: key.clone(),
            time,
            data,
        }
    }
}

// ---------------------------------------------------------------------------
// MeasurementSlice – input of the window segmenter
// ---------------------------------------------------------------------------

/// One measurement's samples, `time` re-based to zero. `time` and `data`
/// always have the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementSlice {
    pub key: MeasurementKey,
    pub time: Vec<f64>,
    pub data: Vec<f64>,
}

impl MeasurementSlice {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(exp: &str, meas: &str, data: f64, time: f64) -> Sample {
        Sample {
            data,
            experiment: Arc::from(exp),
            measurement: Arc::from(meas),
            time,
        }
    }

    fn table() -> UnifiedTable {
        UnifiedTable::from_rows(vec![
            row("e1", "m1", 1.0, 0.0001),
            row("e1", "m1", 2.0, 0.0002),
            row("e1", "m2", 3.0, 0.0003),
            row("e2", "m1", 4.0, 0.0004),
            row("e2", "m1", 5.0, 0.0005),
        ])
    }

    #[test]
    fn keys_in_first_appearance_order() {
        let keys = table().measurement_keys();
        assert_eq!(
            keys,
            vec![
                MeasurementKey::new("e1", "m1"),
                MeasurementKey::new("e1", "m2"),
                MeasurementKey::new("e2", "m1"),
            ]
        );
        assert_eq!(keys[2].to_string(), "e2_m1");
    }

    #[test]
    fn slice_is_rebased_to_zero() {
        let slice = table().measurement_slice(&MeasurementKey::new("e2", "m1"));
        assert_eq!(slice.data, vec![4.0, 5.0]);
        assert_eq!(slice.time[0], 0.0);
        assert!((slice.time[1] - 0.0001).abs() < 1e-12);
    }

    #[test]
    fn unknown_key_gives_empty_slice() {
        let slice = table().measurement_slice(&MeasurementKey::new("e3", "m1"));
        assert!(slice.is_empty());
        assert!(slice.time.is_empty());
    }
}
