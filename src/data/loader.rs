use std::io::{BufReader, Read, Seek};
use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::{
    DataType, Date32Type, TimeUnit, TimestampMicrosecondType, TimestampMillisecondType,
    TimestampNanosecondType, TimestampSecondType,
};
use calamine::{Data, DataType as _, Ods, Reader, Xls, Xlsx};
use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{Column, Table, TableError, Value};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),
    #[error("CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("Arrow: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
    #[error("spreadsheet: {0}")]
    Spreadsheet(#[from] calamine::Error),
    #[error("{0}")]
    Malformed(String),
    #[error(transparent)]
    Table(#[from] TableError),
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with column names
/// * `.json`    – `[{ "country": "Senegal", "HDI_XXI": 0.51, ... }, ...]`
/// * `.parquet` – any flat schema of scalar columns
/// * `.xlsx` / `.xls` / `.ods` – first sheet, header row with column names
pub fn load_file(path: &Path) -> Result<Table, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let open = || {
        std::fs::File::open(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })
    };

    let table = match ext.as_str() {
        "parquet" | "pq" => load_parquet(open()?)?,
        "json" => load_json_reader(open()?)?,
        "csv" => load_csv_reader(open()?)?,
        "xlsx" | "xlsm" => load_sheet::<_, Xlsx<_>>(BufReader::new(open()?))?,
        "xls" => load_sheet::<_, Xls<_>>(BufReader::new(open()?))?,
        "ods" => load_sheet::<_, Ods<_>>(BufReader::new(open()?))?,
        other => return Err(LoadError::UnsupportedFormat(other.to_string())),
    };
    log::info!(
        "loaded {} rows x {} columns from {}",
        table.len(),
        table.columns().len(),
        path.display()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one record per row.
/// Each cell's type is guessed on its own; see [`guess_value`].
pub fn load_csv_reader<R: Read>(reader: R) -> Result<Table, LoadError> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let mut columns: Vec<Vec<Value>> = vec![Vec::new(); headers.len()];
    for (row_no, result) in reader.records().enumerate() {
        let record = result?;
        if record.len() != headers.len() {
            return Err(LoadError::Malformed(format!(
                "CSV row {row_no}: {} fields, header has {}",
                record.len(),
                headers.len()
            )));
        }
        for (values, cell) in columns.iter_mut().zip(record.iter()) {
            values.push(guess_value(cell));
        }
    }

    let columns = headers
        .into_iter()
        .zip(columns)
        .map(|(name, values)| Column::new(name, values))
        .collect();
    Ok(Table::new(columns)?)
}

/// Guess a cell's type: empty is null, then integer, float, boolean, text.
pub fn guess_value(s: &str) -> Value {
    if s.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return Value::Float(f);
    }
    if s == "true" || s == "false" {
        return Value::Bool(s == "true");
    }
    Value::String(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "country": "Senegal", "HDI_XXI": 0.511 },
///   { "country": "France",  "HDI_XXI": 0.903 }
/// ]
/// ```
///
/// Columns appear in first-seen order; keys missing from a record are null.
pub fn load_json_reader<R: Read>(reader: R) -> Result<Table, LoadError> {
    let root: JsonValue = serde_json::from_reader(reader)?;
    let records = root
        .as_array()
        .ok_or_else(|| LoadError::Malformed("expected top-level JSON array".into()))?;

    let mut names: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| LoadError::Malformed(format!("row {i} is not a JSON object")))?;
        for key in obj.keys() {
            if !names.contains(key) {
                names.push(key.clone());
            }
        }
    }

    let columns = names
        .into_iter()
        .map(|name| {
            let values = records
                .iter()
                .map(|rec| rec.get(&name).map(json_to_value).unwrap_or(Value::Null))
                .collect();
            Column::new(name, values)
        })
        .collect();
    Ok(Table::new(columns)?)
}

fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::String(s) => Value::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Null => Value::Null,
        other => Value::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

/// Read the first sheet of a workbook. The first row holds the column
/// names; blank header cells are named after their position.
pub fn load_sheet<RS, R>(reader: RS) -> Result<Table, LoadError>
where
    RS: Read + Seek,
    R: Reader<RS>,
    calamine::Error: From<R::Error>,
{
    let mut workbook = R::new(reader).map_err(calamine::Error::from)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LoadError::Malformed("workbook has no sheets".into()))?
        .map_err(calamine::Error::from)?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Table::new(Vec::new())?);
    };
    let names: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(i, cell)| match cell {
            Data::Empty => format!("Unnamed: {i}"),
            other => other.to_string(),
        })
        .collect();

    let mut columns: Vec<Vec<Value>> = vec![Vec::new(); names.len()];
    for row in rows {
        for (values, cell) in columns.iter_mut().zip(row) {
            values.push(cell_to_value(cell));
        }
    }

    let columns = names
        .into_iter()
        .zip(columns)
        .map(|(name, values)| Column::new(name, values))
        .collect();
    Ok(Table::new(columns)?)
}

fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Int(i) => Value::Integer(*i),
        Data::Float(f) => Value::Float(*f),
        Data::String(s) => Value::String(s.clone()),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_datetime()
            .map_or_else(|| Value::String(cell.to_string()), Value::Timestamp),
        Data::DurationIso(s) => Value::String(s.clone()),
        // #N/A, #DIV/0! and friends read as missing, like blank cells.
        Data::Error(_) | Data::Empty => Value::Null,
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of scalar columns.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(file: std::fs::File) -> Result<Table, LoadError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build()?;

    let mut columns: Vec<Vec<Value>> = vec![Vec::new(); names.len()];
    for batch_result in reader {
        let batch = batch_result?;
        for (values, col) in columns.iter_mut().zip(batch.columns()) {
            values.extend((0..batch.num_rows()).map(|row| extract_value(col, row)));
        }
    }

    let columns = names
        .into_iter()
        .zip(columns)
        .map(|(name, values)| Column::new(name, values))
        .collect();
    Ok(Table::new(columns)?)
}

// -- Arrow helpers --

/// Extract a single value from an Arrow column at a given row.
fn extract_value(col: &Arc<dyn Array>, row: usize) -> Value {
    if col.is_null(row) {
        return Value::Null;
    }
    match col.data_type() {
        DataType::Utf8 => match col.as_any().downcast_ref::<StringArray>() {
            Some(s) => Value::String(s.value(row).to_string()),
            None => Value::Null,
        },
        DataType::LargeUtf8 => Value::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => col
            .as_any()
            .downcast_ref::<Int32Array>()
            .map_or(Value::Null, |a| Value::Integer(a.value(row) as i64)),
        DataType::Int64 => col
            .as_any()
            .downcast_ref::<Int64Array>()
            .map_or(Value::Null, |a| Value::Integer(a.value(row))),
        DataType::Float32 => col
            .as_any()
            .downcast_ref::<Float32Array>()
            .map_or(Value::Null, |a| Value::Float(a.value(row) as f64)),
        DataType::Float64 => col
            .as_any()
            .downcast_ref::<Float64Array>()
            .map_or(Value::Null, |a| Value::Float(a.value(row))),
        DataType::Boolean => col
            .as_any()
            .downcast_ref::<BooleanArray>()
            .map_or(Value::Null, |a| Value::Bool(a.value(row))),
        DataType::Date32 => col
            .as_primitive::<Date32Type>()
            .value_as_datetime(row)
            .map_or(Value::Null, Value::Timestamp),
        DataType::Timestamp(unit, tz) => {
            let naive = match unit {
                TimeUnit::Second => col.as_primitive::<TimestampSecondType>().value_as_datetime(row),
                TimeUnit::Millisecond => col
                    .as_primitive::<TimestampMillisecondType>()
                    .value_as_datetime(row),
                TimeUnit::Microsecond => col
                    .as_primitive::<TimestampMicrosecondType>()
                    .value_as_datetime(row),
                TimeUnit::Nanosecond => col
                    .as_primitive::<TimestampNanosecondType>()
                    .value_as_datetime(row),
            };
            match (naive, tz) {
                (None, _) => Value::Null,
                (Some(utc), Some(tz)) => with_offset(utc, tz)
                    .map_or(Value::Timestamp(utc), Value::TimestampTz),
                (Some(utc), None) => Value::Timestamp(utc),
            }
        }
        // Nested and exotic types are kept as their rendered text.
        _ => arrow::util::display::array_value_to_string(col, row)
            .map_or(Value::Null, Value::String),
    }
}

/// Attach the column's timezone to a UTC wall-clock reading.
fn with_offset(utc: NaiveDateTime, tz: &str) -> Option<DateTime<FixedOffset>> {
    let tz: arrow::array::timezone::Tz = tz.parse().ok()?;
    let offset = tz.offset_from_utc_datetime(&utc).fix();
    Some(DateTime::from_naive_utc_and_offset(utc, offset))
}
