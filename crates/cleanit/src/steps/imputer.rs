//! Missing value imputation.
//!
//! Numeric columns are filled with their median, mean, or a constant;
//! categorical columns with their mode or a constant. Fill values are
//! computed once in `fit` and reused by every `transform`.

use super::Step;
use crate::config::{CategoricalStrategy, ImputerConfig, NumericStrategy};
use crate::error::{CleanError, Result};
use crate::utils::{
    ColumnKind, columns_of_kind, ensure_kind, numeric_missing, observed_f64, string_mode,
    string_values,
};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Fill values captured by [`Imputer::fit`], keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImputerState {
    pub numeric: BTreeMap<String, f64>,
    pub categorical: BTreeMap<String, String>,
}

/// Replaces missing values with per-column fill values learned at fit time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Imputer {
    config: ImputerConfig,
    state: Option<ImputerState>,
}

impl Imputer {
    pub fn new(config: ImputerConfig) -> Self {
        Self {
            config,
            state: None,
        }
    }

    pub fn config(&self) -> &ImputerConfig {
        &self.config
    }

    /// Fitted fill values, `None` before the first `fit`.
    pub fn state(&self) -> Option<&ImputerState> {
        self.state.as_ref()
    }

    fn numeric_fill(&self, series: &Series) -> Result<Option<f64>> {
        let observed = observed_f64(series)?;
        Ok(match self.config.numeric {
            NumericStrategy::Median => observed.median(),
            NumericStrategy::Mean => observed.mean(),
            NumericStrategy::Constant => Some(self.config.numeric_constant),
        })
    }

    fn categorical_fill(&self, series: &Series) -> Result<String> {
        let fill = match self.config.categorical {
            CategoricalStrategy::Mode => string_mode(&string_values(series)?),
            CategoricalStrategy::Constant => None,
        };
        Ok(fill.unwrap_or_else(|| self.config.categorical_constant.clone()))
    }
}

/// Fill the nulls and NaN of a numeric Series, producing a Float64 Series.
fn fill_numeric(series: &Series, fill_value: f64) -> Result<Series> {
    let float_series = series.cast(&DataType::Float64)?;
    let filled: Float64Chunked = float_series
        .f64()?
        .into_iter()
        .map(|v| Some(v.filter(|x| !x.is_nan()).unwrap_or(fill_value)))
        .collect();
    Ok(filled.with_name(series.name().clone()).into_series())
}

/// Fill the nulls of a text Series, producing a String Series.
fn fill_categorical(series: &Series, fill_value: &str) -> Result<Series> {
    let filled: Vec<String> = string_values(series)?
        .into_iter()
        .map(|v| v.unwrap_or_else(|| fill_value.to_string()))
        .collect();
    Ok(Series::new(series.name().clone(), filled))
}

impl Step for Imputer {
    fn name(&self) -> &'static str {
        "Imputer"
    }

    fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        self.config.validate()?;
        let mut state = ImputerState::default();

        for name in columns_of_kind(df, ColumnKind::Numeric) {
            let series = df.column(&name)?.as_materialized_series();
            match self.numeric_fill(series)? {
                Some(value) => {
                    debug!("Imputer: '{}' numeric fill {:.4}", name, value);
                    state.numeric.insert(name, value);
                }
                None => warn!(
                    "Imputer: '{}' has no observed values, leaving it unfilled",
                    name
                ),
            }
        }

        for name in columns_of_kind(df, ColumnKind::Categorical) {
            let series = df.column(&name)?.as_materialized_series();
            let value = self.categorical_fill(series)?;
            debug!("Imputer: '{}' categorical fill '{}'", name, value);
            state.categorical.insert(name, value);
        }

        info!(
            step = "Imputer",
            numeric = state.numeric.len(),
            categorical = state.categorical.len(),
            "Fitted fill values for {} numeric and {} categorical columns",
            state.numeric.len(),
            state.categorical.len()
        );
        self.state = Some(state);
        Ok(self)
    }

    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let state = self
            .state
            .as_ref()
            .ok_or(CleanError::NotFitted { step: self.name() })?;
        let mut out = df.clone();
        let mut filled_cells = 0usize;
        let mut filled_columns = 0usize;

        for (name, value) in &state.numeric {
            let Ok(column) = df.column(name) else {
                continue;
            };
            let series = column.as_materialized_series();
            ensure_kind(series, ColumnKind::Numeric)?;
            let missing = numeric_missing(series)?;
            if missing > 0 {
                filled_cells += missing;
                filled_columns += 1;
                out.replace(name, fill_numeric(series, *value)?)?;
            }
        }

        for (name, value) in &state.categorical {
            let Ok(column) = df.column(name) else {
                continue;
            };
            let series = column.as_materialized_series();
            ensure_kind(series, ColumnKind::Categorical)?;
            if series.null_count() > 0 {
                filled_cells += series.null_count();
                filled_columns += 1;
                out.replace(name, fill_categorical(series, value)?)?;
            }
        }

        info!(
            step = "Imputer",
            filled_cells,
            filled_columns,
            "Filled {} missing values in {} columns",
            filled_cells,
            filled_columns
        );
        Ok(out)
    }

    fn is_fitted(&self) -> bool {
        self.state.is_some()
    }
}
