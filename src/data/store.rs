use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::model::{Sample, UnifiedTable};
use crate::error::{PipelineError, Result};

/// CSV row layout of a saved unified table.
#[derive(Debug, Serialize, Deserialize)]
struct SampleRecord {
    data: f64,
    experiment: String,
    measurement: String,
    time: f64,
}

/// Write the merged table as `data,experiment,measurement,time`.
pub fn save_unified_table(table: &UnifiedTable, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| PipelineError::persistence(parent, e))?;
    }

    let mut writer = csv::Writer::from_path(path).map_err(|e| csv_to_persistence(path, e))?;
    for row in &table.rows {
        writer
            .serialize(SampleRecord {
                data: row.data,
                experiment: row.experiment.to_string(),
                measurement: row.measurement.to_string(),
                time: row.time,
            })
            .map_err(|e| csv_to_persistence(path, e))?;
    }
    writer
        .flush()
        .map_err(|e| PipelineError::persistence(path, e))?;

    log::info!("Saved {} rows to {}", table.len(), path.display());
    Ok(())
}

/// Read a table written by [`save_unified_table`].
pub fn load_unified_table(path: &Path) -> Result<UnifiedTable> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| PipelineError::format(path, format!("opening table: {e}")))?;

    // Rows of one file share their identity strings.
    let mut interned: HashMap<String, Arc<str>> = HashMap::new();
    let mut intern = |s: String| -> Arc<str> {
        interned
            .entry(s)
            .or_insert_with_key(|k| Arc::from(k.as_str()))
            .clone()
    };

    let mut rows = Vec::new();
    for (row_no, result) in reader.deserialize::<SampleRecord>().enumerate() {
        let record =
            result.map_err(|e| PipelineError::format(path, format!("row {row_no}: {e}")))?;
        rows.push(Sample {
            data: record.data,
            experiment: intern(record.experiment),
            measurement: intern(record.measurement),
            time: record.time,
        });
    }

    log::info!("Loaded {} rows from {}", rows.len(), path.display());
    Ok(UnifiedTable::from_rows(rows))
}

fn csv_to_persistence(path: &Path, err: csv::Error) -> PipelineError {
    PipelineError::persistence(path, std::io::Error::other(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load_keeps_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("full_dataframe.csv");
        let e: Arc<str> = Arc::from("experiment1");
        let m: Arc<str> = Arc::from("measurement_1");
        let table = UnifiedTable::from_rows(vec![
            Sample {
                data: 1.5,
                experiment: e.clone(),
                measurement: m.clone(),
                time: 0.0001,
            },
            Sample {
                data: -0.25,
                experiment: e,
                measurement: m,
                time: 0.0002,
            },
        ]);

        save_unified_table(&table, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("data,experiment,measurement,time\n"));

        assert_eq!(load_unified_table(&path).unwrap(), table);
    }

    #[test]
    fn malformed_row_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        std::fs::write(&path, "data,experiment,measurement,time\nx,e,m,0.1\n").unwrap();
        assert!(matches!(
            load_unified_table(&path),
            Err(PipelineError::Format { .. })
        ));
    }
}
