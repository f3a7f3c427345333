//! Per-column summary reports.
//!
//! [`report_profile`] is a pure function: it holds no state and never
//! modifies the frame it reads.

use crate::error::Result;
use crate::utils::{ColumnKind, column_kind, observed_f64};
use polars::prelude::*;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Summary of one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnReport {
    pub column: String,
    pub dtype: String,
    /// Percentage of null (or numeric NaN) cells, rounded to two decimals.
    pub missing_pct: f64,
    /// Distinct observed values.
    pub distinct: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// One [`ColumnReport`] per input column, in input column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileReport {
    pub rows: usize,
    pub columns: Vec<ColumnReport>,
}

impl ProfileReport {
    /// Look up the report for `name`.
    pub fn column(&self, name: &str) -> Option<&ColumnReport> {
        self.columns.iter().find(|c| c.column == name)
    }

    /// The report as a frame with columns
    /// `column, dtype, missing_%, distinct, mean, std, min, max`.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let pick = |f: fn(&ColumnReport) -> Option<f64>| -> Vec<Option<f64>> {
            self.columns.iter().map(f).collect()
        };

        let df = df![
            "column" => self.columns.iter().map(|c| c.column.clone()).collect::<Vec<_>>(),
            "dtype" => self.columns.iter().map(|c| c.dtype.clone()).collect::<Vec<_>>(),
            "missing_%" => self.columns.iter().map(|c| c.missing_pct).collect::<Vec<_>>(),
            "distinct" => self.columns.iter().map(|c| c.distinct as u64).collect::<Vec<_>>(),
            "mean" => pick(|c| c.mean),
            "std" => pick(|c| c.std),
            "min" => pick(|c| c.min),
            "max" => pick(|c| c.max),
        ]?;
        Ok(df)
    }
}

impl fmt::Display for ProfileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stat = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{:.4}", v));

        writeln!(
            f,
            "{:<20} {:<10} {:>9} {:>9} {:>12} {:>12} {:>12} {:>12}",
            "Column", "Type", "Missing %", "Distinct", "Mean", "Std", "Min", "Max"
        )?;
        writeln!(f, "{}", "-".repeat(103))?;
        for c in &self.columns {
            writeln!(
                f,
                "{:<20} {:<10} {:>9.2} {:>9} {:>12} {:>12} {:>12} {:>12}",
                truncate(&c.column, 20),
                truncate(&c.dtype, 10),
                c.missing_pct,
                c.distinct,
                stat(c.mean),
                stat(c.std),
                stat(c.min),
                stat(c.max),
            )?;
        }
        write!(f, "{} rows, {} columns", self.rows, self.columns.len())
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Summarize every column of `df`.
///
/// NaN in a numeric column counts as missing. Numeric columns also get mean,
/// population std, min and max over their observed values; all four are
/// `None` when the column has none.
pub fn report_profile(df: &DataFrame) -> Result<ProfileReport> {
    let rows = df.height();
    let mut columns = Vec::with_capacity(df.width());

    for column in df.get_columns() {
        let series = column.as_materialized_series();
        let numeric = column_kind(series.dtype()) == ColumnKind::Numeric;
        let observed = if numeric {
            observed_f64(series)?.into_series()
        } else {
            series.drop_nulls()
        };

        let missing = rows - observed.len();
        let missing_pct = if rows == 0 {
            0.0
        } else {
            round2(missing as f64 / rows as f64 * 100.0)
        };

        let (mean, std, min, max) = if numeric {
            let values = observed.f64()?;
            (values.mean(), values.std(0), values.min(), values.max())
        } else {
            (None, None, None, None)
        };

        let report = ColumnReport {
            column: series.name().to_string(),
            dtype: series.dtype().to_string(),
            missing_pct,
            distinct: observed.n_unique()?,
            mean,
            std,
            min,
            max,
        };
        debug!("Profiled column '{}': {:?}", report.column, report);
        columns.push(report);
    }

    Ok(ProfileReport { rows, columns })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_percentage() {
        let df = df!["x" => [Some(1), Some(2), None]].unwrap();

        let report = report_profile(&df).unwrap();

        assert_eq!(report.column("x").unwrap().missing_pct, 33.33);
    }

    #[test]
    fn test_numeric_statistics_ignore_nulls() {
        let df = df!["x" => [Some(2.0), None, Some(4.0), Some(6.0)]].unwrap();

        let x = report_profile(&df).unwrap().columns.remove(0);

        assert_eq!(x.mean, Some(4.0));
        assert_eq!(x.min, Some(2.0));
        assert_eq!(x.max, Some(6.0));
        assert!((x.std.unwrap() - (8.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(x.distinct, 3);
    }

    #[test]
    fn test_nan_counts_as_missing() {
        let df = df!["x" => [Some(1.0), Some(f64::NAN), None, Some(3.0)]].unwrap();

        let x = report_profile(&df).unwrap().columns.remove(0);

        assert_eq!(x.missing_pct, 50.0);
        assert_eq!(x.distinct, 2);
        assert_eq!((x.mean, x.std, x.min, x.max), (Some(2.0), Some(1.0), Some(1.0), Some(3.0)));
    }

    #[test]
    fn test_all_null_numeric_has_no_statistics() {
        let df = df!["x" => [Option::<f64>::None, None]].unwrap();

        let x = report_profile(&df).unwrap().columns.remove(0);

        assert_eq!(x.missing_pct, 100.0);
        assert_eq!(x.distinct, 0);
        assert_eq!((x.mean, x.std, x.min, x.max), (None, None, None, None));
    }

    #[test]
    fn test_categorical_column_and_order() {
        let df = df![
            "b" => [Some("x"), Some("y"), Some("x"), None],
            "a" => [1, 2, 3, 4],
        ]
        .unwrap();

        let report = report_profile(&df).unwrap();

        let names: Vec<&str> = report.columns.iter().map(|c| c.column.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(report.columns[0].distinct, 2);
        assert_eq!(report.columns[0].missing_pct, 25.0);
        assert_eq!(report.columns[0].mean, None);
    }

    #[test]
    fn test_empty_frame_reports_zero_missing() {
        let df = df!["x" => Vec::<f64>::new()].unwrap();

        let x = report_profile(&df).unwrap().columns.remove(0);

        assert_eq!(x.missing_pct, 0.0);
        assert_eq!(x.mean, None);
    }

    #[test]
    fn test_to_dataframe_and_display() {
        let df = df![
            "x" => [Some(1.0), None],
            "name" => ["a", "b"],
        ]
        .unwrap();
        let report = report_profile(&df).unwrap();

        let frame = report.to_dataframe().unwrap();
        assert_eq!(frame.shape(), (2, 8));
        assert!(frame.column("missing_%").is_ok());

        let text = report.to_string();
        assert!(text.contains("Missing %"));
        assert!(text.contains("2 rows, 2 columns"));
    }
}
