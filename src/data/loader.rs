use std::fs::File;
use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::RawTable;
use crate::config::FileFormat;
use crate::error::{PipelineError, Result};

/// Name of the value column every reader produces.
pub const DATA_COLUMN: &str = "data";
/// Alternative raw column name used by one designated experiment.
pub const RAW_DATA_COLUMN: &str = "RawData";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Read one recording into a single `data` column.  Dispatch by declared format.
///
/// Column choice, in order:
/// * `RawData`, when `use_raw_column` is set and the column exists
/// * `data`, when present
/// * otherwise the first column
///
/// Text cells may use a comma as decimal separator (`"0,25"`).  An empty
/// file yields an empty table, not an error.
pub fn read_file(path: &Path, format: FileFormat, use_raw_column: bool) -> Result<RawTable> {
    let table = match format {
        FileFormat::Csv | FileFormat::Tsv => {
            // Text formats always carry a delimiter.
            let delimiter = format.delimiter().unwrap_or(b',');
            read_delimited(path, delimiter, use_raw_column)?
        }
        FileFormat::Parquet => read_parquet(path, use_raw_column)?,
    };

    if table.is_empty() {
        log::warn!("No data found in {}", path.display());
    } else {
        log::debug!("Read {} samples from {}", table.len(), path.display());
    }
    Ok(table)
}

/// Index of the column that holds the samples.
fn data_column_index<S: AsRef<str>>(names: &[S], use_raw_column: bool) -> Option<usize> {
    let position = |wanted: &str| names.iter().position(|n| n.as_ref() == wanted);
    if use_raw_column {
        if let Some(idx) = position(RAW_DATA_COLUMN) {
            return Some(idx);
        }
    }
    position(DATA_COLUMN).or(if names.is_empty() { None } else { Some(0) })
}

/// Parse a number that may use `,` as decimal separator.
pub fn parse_decimal(s: &str) -> Option<f64> {
    s.trim().replace(',', ".").parse::<f64>().ok()
}

// ---------------------------------------------------------------------------
// CSV / TSV reader
// ---------------------------------------------------------------------------

/// Header row with column names, one sample per record.  Columns other than
/// the chosen data column are ignored.
fn read_delimited(path: &Path, delimiter: u8, use_raw_column: bool) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .map_err(|e| PipelineError::format(path, format!("opening file: {e}")))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| PipelineError::format(path, format!("reading header: {e}")))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let Some(col) = data_column_index(&headers, use_raw_column) else {
        return Ok(RawTable::default());
    };

    let mut data = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record =
            result.map_err(|e| PipelineError::format(path, format!("row {row_no}: {e}")))?;
        let cell = record.get(col).unwrap_or("");
        let value = parse_decimal(cell).ok_or_else(|| PipelineError::Parse {
            path: path.to_path_buf(),
            row: row_no,
            value: cell.to_string(),
        })?;
        data.push(value);
    }

    Ok(RawTable { data })
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Load the data column of a Parquet snapshot.
///
/// Accepted column types: Float64, Float32, Int32, Int64 and Utf8 /
/// LargeUtf8 (parsed like text cells).  Null cells become NaN.
fn read_parquet(path: &Path, use_raw_column: bool) -> Result<RawTable> {
    let file =
        File::open(path).map_err(|e| PipelineError::format(path, format!("opening file: {e}")))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| PipelineError::format(path, format!("reading parquet metadata: {e}")))?;

    let names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let Some(col) = data_column_index(&names, use_raw_column) else {
        return Ok(RawTable::default());
    };

    let reader = builder
        .build()
        .map_err(|e| PipelineError::format(path, format!("building parquet reader: {e}")))?;

    let mut data = Vec::new();
    for batch_result in reader {
        let batch = batch_result
            .map_err(|e| PipelineError::format(path, format!("reading record batch: {e}")))?;
        let offset = data.len();
        append_f64_column(batch.column(col), path, offset, &mut data)?;
    }

    Ok(RawTable { data })
}

// -- Arrow helpers --

/// Convert an Arrow column to floats, appending to `out`.  `offset` is the
/// row number of the column's first cell, for error messages.
fn append_f64_column(col: &ArrayRef, path: &Path, offset: usize, out: &mut Vec<f64>) -> Result<()> {
    match col.data_type() {
        DataType::Float64 => out.extend(
            col.as_primitive::<Float64Type>()
                .iter()
                .map(|v| v.unwrap_or(f64::NAN)),
        ),
        DataType::Float32 => out.extend(
            col.as_primitive::<Float32Type>()
                .iter()
                .map(|v| v.map_or(f64::NAN, f64::from)),
        ),
        DataType::Int32 => out.extend(
            col.as_primitive::<Int32Type>()
                .iter()
                .map(|v| v.map_or(f64::NAN, f64::from)),
        ),
        DataType::Int64 => out.extend(
            col.as_primitive::<Int64Type>()
                .iter()
                .map(|v| v.map_or(f64::NAN, |i| i as f64)),
        ),
        DataType::Utf8 => append_text_cells(col.as_string::<i32>().iter(), path, offset, out)?,
        DataType::LargeUtf8 => {
            append_text_cells(col.as_string::<i64>().iter(), path, offset, out)?
        }
        other => {
            return Err(PipelineError::format(
                path,
                format!("data column has unsupported type {other:?}"),
            ))
        }
    }
    Ok(())
}

fn append_text_cells<'a>(
    cells: impl Iterator<Item = Option<&'a str>>,
    path: &Path,
    offset: usize,
    out: &mut Vec<f64>,
) -> Result<()> {
    for (i, cell) in cells.enumerate() {
        let value = match cell {
            None => f64::NAN,
            Some(s) => parse_decimal(s).ok_or_else(|| PipelineError::Parse {
                path: path.to_path_buf(),
                row: offset + i,
                value: s.to_string(),
            })?,
        };
        out.push(value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{Float32Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    use super::*;

    fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn write_parquet(path: &Path, fields: Vec<Field>, columns: Vec<ArrayRef>) {
        let schema = Arc::new(Schema::new(fields));
        let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();
        let file = File::create(path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn tsv_with_comma_decimals() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "m.tsv", "time\tdata\n0,0\t1,5\n0,1\t-2,25\n");
        let table = read_file(&path, FileFormat::Tsv, false).unwrap();
        assert_eq!(table.data, vec![1.5, -2.25]);
    }

    #[test]
    fn csv_without_data_column_uses_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "m.csv", "value,other\n1.0,9\n\"2,5\",9\n");
        let table = read_file(&path, FileFormat::Csv, false).unwrap();
        assert_eq!(table.data, vec![1.0, 2.5]);
    }

    #[test]
    fn raw_column_only_for_designated_experiment() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "m.tsv", "Index\tRawData\n7\t0,5\n8\t0,75\n");

        let designated = read_file(&path, FileFormat::Tsv, true).unwrap();
        assert_eq!(designated.data, vec![0.5, 0.75]);

        // Elsewhere the first column wins.
        let other = read_file(&path, FileFormat::Tsv, false).unwrap();
        assert_eq!(other.data, vec![7.0, 8.0]);
    }

    #[test]
    fn unparsable_value_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "m.csv", "data\n1.0\nabc\n");
        match read_file(&path, FileFormat::Csv, false) {
            Err(PipelineError::Parse { row, value, .. }) => {
                assert_eq!(row, 1);
                assert_eq!(value, "abc");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn empty_file_is_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let header_only = write(dir.path(), "h.tsv", "time\tdata\n");
        assert!(read_file(&header_only, FileFormat::Tsv, false).unwrap().is_empty());
        let blank = write(dir.path(), "b.csv", "");
        assert!(read_file(&blank, FileFormat::Csv, false).unwrap().is_empty());
    }

    #[test]
    fn parquet_float_and_text_columns() {
        let dir = tempfile::tempdir().unwrap();

        let floats = dir.path().join("f.parquet");
        write_parquet(
            &floats,
            vec![Field::new("data", DataType::Float32, true)],
            vec![Arc::new(Float32Array::from(vec![Some(1.5), None, Some(-3.0)]))],
        );
        let table = read_file(&floats, FileFormat::Parquet, false).unwrap();
        assert_eq!(table.data[0], 1.5);
        assert!(table.data[1].is_nan());
        assert_eq!(table.data[2], -3.0);

        let text = dir.path().join("t.parquet");
        write_parquet(
            &text,
            vec![Field::new("RawData", DataType::Utf8, false)],
            vec![Arc::new(StringArray::from(vec!["0,5", "1,25"]))],
        );
        let table = read_file(&text, FileFormat::Parquet, true).unwrap();
        assert_eq!(table.data, vec![0.5, 1.25]);
    }

    #[test]
    fn parquet_unsupported_column_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("b.parquet");
        write_parquet(
            &path,
            vec![Field::new("data", DataType::Boolean, false)],
            vec![Arc::new(arrow::array::BooleanArray::from(vec![true]))],
        );
        assert!(matches!(
            read_file(&path, FileFormat::Parquet, false),
            Err(PipelineError::Format { .. })
        ));
    }
}
