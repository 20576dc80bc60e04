use super::model::{Sample, UnifiedTable};

// ---------------------------------------------------------------------------
// Selection predicate: which experiment / measurement to keep
// ---------------------------------------------------------------------------

/// Row selection on identity columns.  A `None` field places no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub experiment: Option<String>,
    pub measurement: Option<String>,
}

impl Selection {
    pub fn experiment(name: impl Into<String>) -> Self {
        Selection {
            experiment: Some(name.into()),
            measurement: None,
        }
    }

    pub fn measurement(experiment: impl Into<String>, measurement: impl Into<String>) -> Self {
        Selection {
            experiment: Some(experiment.into()),
            measurement: Some(measurement.into()),
        }
    }

    fn accepts(&self, sample: &Sample) -> bool {
        let exp_ok = self
            .experiment
            .as_deref()
            .map_or(true, |e| *sample.experiment == *e);
        let meas_ok = self
            .measurement
            .as_deref()
            .map_or(true, |m| *sample.measurement == *m);
        exp_ok && meas_ok
    }
}

/// Return indices of rows that pass the selection, in table order.
pub fn filtered_indices(table: &UnifiedTable, selection: &Selection) -> Vec<usize> {
    table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| selection.accepts(row))
        .map(|(i, _)| i)
        .collect()
}

/// Copy out the selected rows.  `time` values are kept as they are.
pub fn select(table: &UnifiedTable, selection: &Selection) -> UnifiedTable {
    UnifiedTable::from_rows(
        table
            .rows
            .iter()
            .filter(|row| selection.accepts(row))
            .cloned()
            .collect(),
    )
}
