use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use regex::Regex;

use super::classify::ColumnKind;
use super::filter::FilterError;
use super::model::{Column, Value};

// ---------------------------------------------------------------------------
// Filter parameters, as supplied by the UI
// ---------------------------------------------------------------------------

/// Live widget values for one filtered column.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterParams {
    /// Keep rows whose value is one of `allowed`.
    Categorical { allowed: BTreeSet<Value> },
    /// Keep rows with `lo <= value <= hi`.
    Numeric { lo: f64, hi: f64 },
    /// Keep rows with `start <= value <= end`. Inactive unless both ends are set.
    Temporal {
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    },
    /// Keep rows whose label contains a match of `pattern`. Empty is inactive.
    Text { pattern: String, literal: bool },
}

impl FilterParams {
    pub fn kind(&self) -> ColumnKind {
        match self {
            FilterParams::Categorical { .. } => ColumnKind::Categorical,
            FilterParams::Numeric { .. } => ColumnKind::Numeric,
            FilterParams::Temporal { .. } => ColumnKind::Temporal,
            FilterParams::Text { .. } => ColumnKind::Text,
        }
    }

    /// Parameters that let every row through: the full distinct set, the
    /// column's full range, or an empty pattern.
    pub fn defaults(col: &Column, kind: ColumnKind) -> Self {
        match kind {
            ColumnKind::Categorical => FilterParams::Categorical {
                allowed: col.choices(),
            },
            ColumnKind::Numeric => {
                let (lo, hi) = col.numeric_bounds().unwrap_or((0.0, 0.0));
                FilterParams::Numeric { lo, hi }
            }
            ColumnKind::Temporal => {
                let bounds = col.temporal_bounds();
                FilterParams::Temporal {
                    start: bounds.map(|(lo, _)| lo),
                    end: bounds.map(|(_, hi)| hi),
                }
            }
            ColumnKind::Text => FilterParams::Text {
                pattern: String::new(),
                literal: false,
            },
        }
    }
}

/// Slider bounds for a numeric column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericControl {
    pub min: f64,
    pub max: f64,
    /// Suggested granularity, a hundredth of the range.
    pub step: f64,
}

pub fn numeric_control(col: &Column) -> Option<NumericControl> {
    let (min, max) = col.numeric_bounds()?;
    Some(NumericControl {
        min,
        max,
        step: (max - min) / 100.0,
    })
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// A per-value test bound to one column.
#[derive(Debug, Clone)]
pub enum Predicate {
    Membership(BTreeSet<Value>),
    NumericRange { lo: f64, hi: f64 },
    TemporalRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    Pattern(Regex),
}

impl Predicate {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Predicate::Membership(allowed) if value.is_missing() => {
                allowed.contains(&Value::Null)
            }
            Predicate::Membership(allowed) => allowed.contains(value),
            Predicate::NumericRange { lo, hi } => value
                .as_f64()
                .is_some_and(|v| *lo <= v && v <= *hi),
            Predicate::TemporalRange { start, end } => value
                .as_timestamp()
                .is_some_and(|t| *start <= t && t <= *end),
            Predicate::Pattern(re) => {
                if value.is_missing() {
                    return false;
                }
                match value {
                    Value::String(s) => re.is_match(s),
                    other => re.is_match(&other.to_string()),
                }
            }
        }
    }
}

/// Build the predicate for `col` from live parameters.
///
/// Returns `Ok(None)` when the parameters describe no filter at all: an empty
/// pattern, or a date range with a missing endpoint.
pub fn build(col: &Column, params: &FilterParams) -> Result<Option<Predicate>, FilterError> {
    match params {
        FilterParams::Categorical { allowed } => Ok(Some(Predicate::Membership(allowed.clone()))),
        FilterParams::Numeric { lo, hi } => {
            // NaN bounds fail this comparison too.
            if !(lo <= hi) {
                return Err(FilterError::InvalidRange {
                    column: col.name.clone(),
                    lo: lo.to_string(),
                    hi: hi.to_string(),
                });
            }
            Ok(Some(Predicate::NumericRange { lo: *lo, hi: *hi }))
        }
        FilterParams::Temporal { start, end } => {
            let (Some(start), Some(end)) = (start, end) else {
                return Ok(None);
            };
            if start > end {
                return Err(FilterError::InvalidRange {
                    column: col.name.clone(),
                    lo: start.to_string(),
                    hi: end.to_string(),
                });
            }
            Ok(Some(Predicate::TemporalRange {
                start: *start,
                end: *end,
            }))
        }
        FilterParams::Text { pattern, literal } => {
            if pattern.is_empty() {
                return Ok(None);
            }
            let source = if *literal {
                regex::escape(pattern)
            } else {
                pattern.clone()
            };
            let re = Regex::new(&source).map_err(|e| FilterError::InvalidPattern {
                column: col.name.clone(),
                pattern: pattern.clone(),
                source: e,
            })?;
            Ok(Some(Predicate::Pattern(re)))
        }
    }
}
