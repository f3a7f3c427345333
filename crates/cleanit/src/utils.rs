//! Shared column helpers for the cleaning steps and the profiler.

use crate::error::{CleanError, Result};
use polars::prelude::*;
use std::collections::HashMap;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// How a column participates in cleaning, decided by its dtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Integer or floating point numbers
    Numeric,
    /// String or categorical text
    Categorical,
    /// Boolean, temporal, nested; passed through untouched
    Other,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Categorical => "categorical",
            Self::Other => "other",
        }
    }
}

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType holds categorical text.
#[inline]
pub fn is_categorical_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::String | DataType::Categorical(_, _))
}

/// Get the cleaning kind of a DataType.
pub fn column_kind(dtype: &DataType) -> ColumnKind {
    if is_numeric_dtype(dtype) {
        ColumnKind::Numeric
    } else if is_categorical_dtype(dtype) {
        ColumnKind::Categorical
    } else {
        ColumnKind::Other
    }
}

/// Names of all columns in frame order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Names of the columns of the given kind, in frame order.
pub fn columns_of_kind(df: &DataFrame, kind: ColumnKind) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|col| column_kind(col.dtype()) == kind)
        .map(|col| col.name().to_string())
        .collect()
}

/// Fail with a schema mismatch unless `series` has the expected kind.
pub fn ensure_kind(series: &Series, expected: ColumnKind) -> Result<()> {
    if column_kind(series.dtype()) == expected {
        Ok(())
    } else {
        Err(CleanError::schema_mismatch(
            series.name().as_str(),
            expected.as_str(),
            format!("{:?}", series.dtype()),
        ))
    }
}

// =============================================================================
// Value Extraction
// =============================================================================

/// Values of a numeric Series as `f64`, nulls kept as `None`.
pub fn numeric_values(series: &Series) -> Result<Vec<Option<f64>>> {
    let float_series = series.cast(&DataType::Float64)?;
    Ok(float_series.f64()?.into_iter().collect())
}

/// Observed values of a numeric Series as Float64, with nulls and NaN removed.
///
/// Every fit-time statistic is computed on this, so NaN counts as missing.
pub fn observed_f64(series: &Series) -> Result<Float64Chunked> {
    let float_series = series.cast(&DataType::Float64)?;
    let values = float_series.f64()?;
    Ok(values.filter(&values.is_not_nan())?)
}

/// Number of null or NaN cells in a numeric Series.
pub fn numeric_missing(series: &Series) -> Result<usize> {
    Ok(series.len() - observed_f64(series)?.len())
}

/// Values of a text Series as owned strings, nulls kept as `None`.
pub fn string_values(series: &Series) -> Result<Vec<Option<String>>> {
    let str_series = series.cast(&DataType::String)?;
    Ok(str_series
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

// =============================================================================
// Statistics
// =============================================================================

/// Linearly interpolated quantile of the observed values.
pub fn quantile(values: &Float64Chunked, q: f64) -> Result<Option<f64>> {
    Ok(values.quantile(q, QuantileMethod::Linear)?)
}

/// Most frequent non-null value. Ties go to the lexicographically smallest.
pub fn string_mode(values: &[Option<String>]) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for val in values.iter().flatten() {
        *counts.entry(val.as_str()).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .max_by(|(a_val, a_count), (b_val, b_count)| {
            a_count.cmp(b_count).then_with(|| b_val.cmp(a_val))
        })
        .map(|(val, _)| val.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_kind() {
        assert_eq!(column_kind(&DataType::Int64), ColumnKind::Numeric);
        assert_eq!(column_kind(&DataType::Float32), ColumnKind::Numeric);
        assert_eq!(column_kind(&DataType::String), ColumnKind::Categorical);
        assert_eq!(column_kind(&DataType::Boolean), ColumnKind::Other);
        assert_eq!(column_kind(&DataType::Date), ColumnKind::Other);
    }

    #[test]
    fn test_columns_of_kind_keeps_frame_order() {
        let df = df![
            "b" => [1, 2],
            "name" => ["x", "y"],
            "a" => [0.5, 1.5],
            "flag" => [true, false],
        ]
        .unwrap();

        assert_eq!(columns_of_kind(&df, ColumnKind::Numeric), vec!["b", "a"]);
        assert_eq!(columns_of_kind(&df, ColumnKind::Categorical), vec!["name"]);
    }

    #[test]
    fn test_ensure_kind_mismatch() {
        let series = Series::new("age".into(), &["ten", "eleven"]);
        let err = ensure_kind(&series, ColumnKind::Numeric).unwrap_err();
        assert!(matches!(err, CleanError::SchemaMismatch { ref column, .. } if column == "age"));
    }

    #[test]
    fn test_numeric_values_keeps_nulls() {
        let series = Series::new("x".into(), &[Some(1i64), None, Some(3)]);
        assert_eq!(
            numeric_values(&series).unwrap(),
            vec![Some(1.0), None, Some(3.0)]
        );
    }

    #[test]
    fn test_observed_drops_nulls_and_nan() {
        let series = Series::new("x".into(), &[Some(1.0), None, Some(f64::NAN), Some(3.0)]);

        let observed = observed_f64(&series).unwrap();

        assert_eq!(observed.into_iter().collect::<Vec<_>>(), vec![Some(1.0), Some(3.0)]);
        assert_eq!(numeric_missing(&series).unwrap(), 2);
    }

    #[test]
    fn test_quantile_is_linear() {
        let series = Series::new("x".into(), &[4.0, 1.0, 3.0, 2.0]);
        let observed = observed_f64(&series).unwrap();

        assert_eq!(quantile(&observed, 0.5).unwrap(), Some(2.5));
        assert_eq!(quantile(&observed, 0.25).unwrap(), Some(1.75));
        assert_eq!(quantile(&observed, 0.75).unwrap(), Some(3.25));
    }

    #[test]
    fn test_quantile_of_nothing_is_none() {
        let series = Series::new("x".into(), &[Option::<f64>::None, Some(f64::NAN)]);
        let observed = observed_f64(&series).unwrap();

        assert_eq!(quantile(&observed, 0.5).unwrap(), None);
        assert_eq!(observed.std(0), None);
    }

    #[test]
    fn test_string_mode_tie_breaks_lexicographically() {
        let values = vec![
            Some("b".to_string()),
            Some("a".to_string()),
            None,
            Some("b".to_string()),
            Some("a".to_string()),
        ];
        assert_eq!(string_mode(&values), Some("a".to_string()));
        assert_eq!(string_mode(&[None, None]), None);
    }
}
