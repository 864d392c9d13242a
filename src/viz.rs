//! Chart adapters: project a filtered table onto the columns one chart needs
//! and turn them into plottable points.

use serde::{Deserialize, Serialize};

use crate::data::model::{Table, TableError, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mark {
    Scatter,
    /// Scatter plus an ordinary least squares line.
    ScatterTrend,
}

/// Declarative description of one chart and the columns it binds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub title: String,
    pub mark: Mark,
    pub x: String,
    pub y: String,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
    pub x: f64,
    pub y: f64,
    pub size: Option<f64>,
    pub color: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartData {
    pub points: Vec<ChartPoint>,
    /// `(slope, intercept)` when the mark asks for a trend line and one exists.
    pub trend: Option<(f64, f64)>,
}

impl ChartSpec {
    pub fn scatter(title: impl Into<String>, x: impl Into<String>, y: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            mark: Mark::Scatter,
            x: x.into(),
            y: y.into(),
            size: None,
            color: None,
            caption: None,
        }
    }

    /// Column names this chart reads, x and y first.
    pub fn required_columns(&self) -> Vec<&str> {
        let mut cols = vec![self.x.as_str(), self.y.as_str()];
        for extra in [&self.size, &self.color].into_iter().flatten() {
            if !cols.contains(&extra.as_str()) {
                cols.push(extra);
            }
        }
        cols
    }

    /// The sub-table this chart is drawn from.
    pub fn project(&self, table: &Table) -> Result<Table, TableError> {
        table.project(self.required_columns().as_slice())
    }

    /// Extract points. Rows without a numeric x and y are skipped.
    pub fn series(&self, table: &Table) -> Result<ChartData, TableError> {
        let sub = self.project(table)?;
        let get = |name: &str| sub.column(name).map(|c| c.values.as_slice());
        let xs = get(self.x.as_str()).unwrap_or_default();
        let ys = get(self.y.as_str()).unwrap_or_default();
        let sizes = self.size.as_deref().and_then(get);
        let colors = self.color.as_deref().and_then(get);

        let points: Vec<ChartPoint> = (0..sub.len())
            .filter_map(|row| {
                Some(ChartPoint {
                    x: xs.get(row)?.as_f64()?,
                    y: ys.get(row)?.as_f64()?,
                    size: sizes.and_then(|s| s.get(row)?.as_f64()),
                    color: colors
                        .and_then(|c| c.get(row))
                        .filter(|v| !v.is_missing())
                        .cloned(),
                })
            })
            .collect();

        let trend = match self.mark {
            Mark::ScatterTrend => linear_fit(points.iter().map(|p| (p.x, p.y))),
            Mark::Scatter => None,
        };
        Ok(ChartData { points, trend })
    }
}

/// Ordinary least squares fit `y = slope * x + intercept`.
///
/// `None` with fewer than two points or when every x is the same.
pub fn linear_fit(points: impl IntoIterator<Item = (f64, f64)>) -> Option<(f64, f64)> {
    let points: Vec<(f64, f64)> = points.into_iter().collect();
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;
    let (sxy, sxx) = points.iter().fold((0.0, 0.0), |(sxy, sxx), &(x, y)| {
        let dx = x - mean_x;
        (sxy + dx * (y - mean_y), sxx + dx * dx)
    });
    if sxx.abs() < f64::EPSILON {
        return None;
    }
    let slope = sxy / sxx;
    Some((slope, mean_y - slope * mean_x))
}

/// The three world-data charts the dashboard opens with.
pub fn default_charts() -> Vec<ChartSpec> {
    vec![
        ChartSpec {
            size: Some("unemployement".into()),
            color: Some("country".into()),
            caption: Some(
                "Each point is a country: share of GDP spent on education against the share \
                 of children out of school. Point size is the unemployment rate."
                    .into(),
            ),
            ..ChartSpec::scatter(
                "Education spending vs. children out of school",
                "gdp_perc_education",
                "kids_perc_dropout",
            )
        },
        ChartSpec {
            size: Some("infant_mortality".into()),
            color: Some("country".into()),
            caption: Some(
                "Human Development Index against share of GDP spent on health. Point size is \
                 infant mortality."
                    .into(),
            ),
            ..ChartSpec::scatter(
                "HDI, health spending and infant mortality",
                "HDI_XXI",
                "gdp_perc_health",
            )
        },
        ChartSpec {
            mark: Mark::ScatterTrend,
            caption: Some(
                "Women's representation in parliament against HDI, with an ordinary least \
                 squares trend line."
                    .into(),
            ),
            ..ChartSpec::scatter(
                "HDI vs. women in parliament",
                "parliament_gender_equity",
                "HDI_XXI",
            )
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Column;

    fn world() -> Table {
        Table::new(vec![
            Column::new(
                "country",
                ["Senegal", "France", "Chile"]
                    .iter()
                    .map(|s| Value::String(s.to_string()))
                    .collect(),
            ),
            Column::new("x", vec![Value::Float(1.0), Value::Null, Value::Integer(3)]),
            Column::new("y", vec![Value::Float(2.0), Value::Float(4.0), Value::Float(6.0)]),
            Column::new("pop", vec![Value::Integer(17), Value::Integer(68), Value::Null]),
        ])
        .unwrap()
    }

    #[test]
    fn projection_keeps_only_bound_columns() {
        let spec = ChartSpec {
            color: Some("country".into()),
            ..ChartSpec::scatter("t", "x", "y")
        };
        let projected = spec.project(&world()).unwrap();
        assert_eq!(projected.column_names(), vec!["x", "y", "country"]);
    }

    #[test]
    fn projection_reports_missing_columns() {
        let spec = ChartSpec::scatter("t", "x", "HDI_XXI");
        assert_eq!(
            spec.series(&world()),
            Err(TableError::UnknownColumn("HDI_XXI".into()))
        );
    }

    #[test]
    fn rows_without_numeric_xy_are_skipped() {
        let spec = ChartSpec {
            size: Some("pop".into()),
            color: Some("country".into()),
            ..ChartSpec::scatter("t", "x", "y")
        };
        let data = spec.series(&world()).unwrap();
        assert_eq!(data.points.len(), 2);
        assert_eq!(data.points[0].size, Some(17.0));
        assert_eq!(data.points[1].size, None);
        assert_eq!(data.points[1].color, Some(Value::String("Chile".into())));
        assert_eq!(data.trend, None);
    }

    #[test]
    fn trend_line_fits_exact_data() {
        let (slope, intercept) = linear_fit([(1.0, 3.0), (2.0, 5.0), (3.0, 7.0)]).unwrap();
        assert!((slope - 2.0).abs() < 1e-12);
        assert!((intercept - 1.0).abs() < 1e-12);
        assert_eq!(linear_fit([(1.0, 1.0)]), None);
        assert_eq!(linear_fit([(1.0, 1.0), (1.0, 2.0)]), None);
    }

    #[test]
    fn default_charts_round_trip_through_json() {
        let charts = default_charts();
        let json = serde_json::to_string(&charts).unwrap();
        let back: Vec<ChartSpec> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, charts);
        assert_eq!(charts[2].required_columns(), vec!["parliament_gender_equity", "HDI_XXI"]);
    }
}
