//! Numeric feature scaling.
//!
//! Every method is stored as a per-column affine map `(x - center) / scale`:
//!
//! | method   | center | scale     |
//! |----------|--------|-----------|
//! | standard | mean   | std (n)   |
//! | min-max  | min    | max - min |
//! | robust   | median | q75 - q25 |
//!
//! Parameters are computed over the observed values only: nulls and NaN are
//! skipped at fit time and passed through unchanged at transform time.
//!
//! A zero scale is replaced by 1.0, so a column that was constant at fit
//! time maps to 0.0 instead of dividing by zero. A column with no observed
//! values at fit time gets the identity map.

use super::Step;
use crate::config::{ScalerConfig, ScalingMethod};
use crate::error::{CleanError, Result};
use crate::utils::{
    ColumnKind, columns_of_kind, ensure_kind, numeric_values, observed_f64, quantile,
};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Affine parameters for one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnScale {
    pub center: f64,
    pub scale: f64,
}

impl ColumnScale {
    const IDENTITY: ColumnScale = ColumnScale {
        center: 0.0,
        scale: 1.0,
    };

    fn new(center: f64, scale: f64) -> Self {
        if !center.is_finite() {
            return Self::IDENTITY;
        }
        let scale = if scale == 0.0 || !scale.is_finite() {
            1.0
        } else {
            scale
        };
        Self { center, scale }
    }

    #[inline]
    pub fn apply(&self, value: f64) -> f64 {
        (value - self.center) / self.scale
    }
}

/// Fitted parameters, in the column order seen during fit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScalerState {
    pub columns: Vec<(String, ColumnScale)>,
}

/// Scales numeric columns with parameters learned at fit time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    config: ScalerConfig,
    state: Option<ScalerState>,
}

impl Scaler {
    pub fn new(config: ScalerConfig) -> Self {
        Self {
            config,
            state: None,
        }
    }

    pub fn with_method(method: ScalingMethod) -> Self {
        Self::new(ScalerConfig { method })
    }

    pub fn config(&self) -> &ScalerConfig {
        &self.config
    }

    pub fn state(&self) -> Option<&ScalerState> {
        self.state.as_ref()
    }

    fn column_scale(&self, observed: &Float64Chunked) -> Result<ColumnScale> {
        let (Some(min), Some(max)) = (observed.min(), observed.max()) else {
            return Ok(ColumnScale::IDENTITY);
        };
        let params = match self.config.method {
            ScalingMethod::Standard => ColumnScale::new(
                observed.mean().unwrap_or(0.0),
                observed.std(0).unwrap_or(1.0),
            ),
            ScalingMethod::MinMax => ColumnScale::new(min, max - min),
            ScalingMethod::Robust => {
                let q25 = quantile(observed, 0.25)?.unwrap_or(0.0);
                let q75 = quantile(observed, 0.75)?.unwrap_or(0.0);
                ColumnScale::new(quantile(observed, 0.5)?.unwrap_or(0.0), q75 - q25)
            }
        };
        Ok(params)
    }
}

impl Step for Scaler {
    fn name(&self) -> &'static str {
        "Scaler"
    }

    fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        let mut state = ScalerState::default();

        for name in columns_of_kind(df, ColumnKind::Numeric) {
            let observed = observed_f64(df.column(&name)?.as_materialized_series())?;
            let params = self.column_scale(&observed)?;
            debug!(
                "Scaler: '{}' center {:.4} scale {:.4}",
                name, params.center, params.scale
            );
            state.columns.push((name, params));
        }

        info!(
            step = "Scaler",
            columns = state.columns.len(),
            "Fitted {:?} scaling on {} numeric columns",
            self.config.method,
            state.columns.len()
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

        for (name, params) in &state.columns {
            let column = df
                .column(name)
                .map_err(|_| CleanError::schema_mismatch(name, "numeric", "missing column"))?;
            let series = column.as_materialized_series();
            ensure_kind(series, ColumnKind::Numeric)?;

            let scaled: Float64Chunked = numeric_values(series)?
                .into_iter()
                .map(|v| v.map(|x| params.apply(x)))
                .collect();
            out.replace(name, scaled.with_name(name.as_str().into()).into_series())?;
        }

        info!(
            step = "Scaler",
            columns = state.columns.len(),
            "Scaled {} numeric columns using {:?}",
            state.columns.len(),
            self.config.method
        );
        Ok(out)
    }

    fn is_fitted(&self) -> bool {
        self.state.is_some()
    }
}
