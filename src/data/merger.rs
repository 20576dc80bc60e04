use std::sync::Arc;

use super::loader::read_file;
use super::model::{Sample, UnifiedTable};
use crate::config::{Manifest, SAMPLING_RATE_HZ};
use crate::error::Result;

/// Load every file of the requested experiment (or of all experiments) and
/// concatenate the rows in manifest order.
///
/// A file that fails to load is logged and skipped.  Once all rows are
/// accumulated, `time` is assigned as `row / SAMPLING_RATE_HZ` with rows
/// counted from 1 across the whole table, ignoring file boundaries.
///
/// Returns a `Config` error only when `experiment` is not in the manifest.
pub fn merge_experiments(manifest: &Manifest, experiment: Option<&str>) -> Result<UnifiedTable> {
    let experiments = manifest.resolve(experiment)?;

    let mut rows: Vec<Sample> = Vec::new();
    for exp in experiments {
        let exp_name: Arc<str> = Arc::from(exp.name.as_str());
        let use_raw_column = manifest.uses_raw_column(&exp.name);

        for file in &exp.files {
            let measurement = file.measurement_name();
            let table = match read_file(&file.path, file.format, use_raw_column) {
                Ok(table) => table,
                Err(e) => {
                    log::error!(
                        "Skipping {} (experiment {}, measurement {}): {e}",
                        file.path.display(),
                        exp.name,
                        measurement
                    );
                    continue;
                }
            };

            let measurement: Arc<str> = Arc::from(measurement);
            rows.extend(table.data.into_iter().map(|data| Sample {
                data,
                experiment: Arc::clone(&exp_name),
                measurement: Arc::clone(&measurement),
                time: 0.0,
            }));
        }
    }

    if rows.is_empty() {
        log::warn!(
            "No data loaded for {}",
            experiment.unwrap_or("any experiment")
        );
        return Ok(UnifiedTable::default());
    }

    for (i, row) in rows.iter_mut().enumerate() {
        row.time = (i + 1) as f64 / SAMPLING_RATE_HZ;
    }

    log::info!("Merged {} samples", rows.len());
    Ok(UnifiedTable::from_rows(rows))
}
