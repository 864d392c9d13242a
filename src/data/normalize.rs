use chrono::{NaiveDate, NaiveDateTime, ParseError};

use super::model::{Column, Table, Value};

/// Default pattern text columns are parsed against, e.g. `2022/01/15 00:01:02`.
pub const DEFAULT_DATE_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Normalize every column of `table` in place. See [`normalize_column`].
pub fn normalize_table(table: &mut Table, date_format: &str) {
    for col in table.columns_mut() {
        normalize_column(col, date_format);
    }
}

/// Best-effort conversion of a column into the canonical temporal form.
///
/// * A textual column is parsed value by value against `date_format`. If any
///   value fails, the column is left exactly as it was.
/// * Offset-carrying timestamps lose their offset and keep their local
///   wall-clock time.
pub fn normalize_column(col: &mut Column, date_format: &str) {
    if is_textual(col) {
        match parse_all(col, date_format) {
            Ok(values) => {
                log::debug!("column '{}' normalized to timestamps", col.name);
                col.values = values;
            }
            Err(e) => {
                log::debug!("column '{}' kept as text: {e}", col.name);
            }
        }
    }

    for v in &mut col.values {
        if let Value::TimestampTz(t) = v {
            *v = Value::Timestamp(t.naive_local());
        }
    }
}

/// All present values are strings, and there is at least one.
fn is_textual(col: &Column) -> bool {
    let mut present = col.present().peekable();
    present.peek().is_some() && present.all(|v| matches!(v, Value::String(_)))
}

fn parse_all(col: &Column, date_format: &str) -> Result<Vec<Value>, ParseError> {
    col.values
        .iter()
        .map(|v| match v {
            Value::String(s) => parse_datetime(s, date_format).map(Value::Timestamp),
            _ => Ok(Value::Null),
        })
        .collect()
}

/// Parse with the full pattern, falling back to a date-only reading at
/// midnight so patterns like `%Y-%m-%d` work too.
pub fn parse_datetime(s: &str, date_format: &str) -> Result<NaiveDateTime, ParseError> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, date_format).or_else(|e| {
        NaiveDate::parse_from_str(s, date_format)
            .map(|d| d.and_time(chrono::NaiveTime::MIN))
            .map_err(|_| e)
    })
}
