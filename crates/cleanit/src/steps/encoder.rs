//! Categorical encoding: one-hot indicators or ordinal codes.
//!
//! In the default [`OneHotColumns::Observed`] mode, indicator columns are
//! derived from the categories present in the frame being transformed, not
//! from those seen during fit. Two transforms of differently populated
//! frames can therefore produce different columns. [`OneHotColumns::Fitted`]
//! pins the indicator set to the fitted vocabulary instead.
//!
//! An indicator name that is already taken, by a retained column or by an
//! indicator of another column, is a schema mismatch; nothing is overwritten.

use super::Step;
use crate::config::{EncoderConfig, EncodingMethod, OneHotColumns};
use crate::error::{CleanError, Result};
use crate::utils::{ColumnKind, column_names, columns_of_kind, ensure_kind, string_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, info};

/// Categorical columns and their sorted vocabularies, as seen during fit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncoderState {
    pub columns: Vec<String>,
    pub vocabulary: BTreeMap<String, Vec<String>>,
}

impl EncoderState {
    /// Ordinal code of `category` in `column`, if it was seen during fit.
    pub fn code(&self, column: &str, category: &str) -> Option<i64> {
        self.vocabulary
            .get(column)?
            .binary_search_by(|known| known.as_str().cmp(category))
            .ok()
            .map(|idx| idx as i64)
    }
}

/// Encodes categorical columns with the configured method.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Encoder {
    config: EncoderConfig,
    state: Option<EncoderState>,
}

impl Encoder {
    pub fn new(config: EncoderConfig) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// One-hot encoder with transform-time categories.
    pub fn one_hot() -> Self {
        Self::new(EncoderConfig::default())
    }

    /// Ordinal encoder mapping unseen categories to -1.
    pub fn ordinal() -> Self {
        Self::new(EncoderConfig {
            method: EncodingMethod::Ordinal,
            ..Default::default()
        })
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    pub fn state(&self) -> Option<&EncoderState> {
        self.state.as_ref()
    }

    fn encode_ordinal(
        &self,
        state: &EncoderState,
        df: &DataFrame,
        columns: &[String],
    ) -> Result<DataFrame> {
        let mut out = df.clone();
        let mut unknown = 0usize;

        for name in columns {
            let values = string_values(df.column(name)?.as_materialized_series())?;
            let codes: Vec<Option<i64>> = values
                .iter()
                .map(|value| {
                    value.as_deref().map(|category| {
                        state.code(name, category).unwrap_or_else(|| {
                            unknown += 1;
                            self.config.unknown_value
                        })
                    })
                })
                .collect();
            out.replace(name, Series::new(name.as_str().into(), codes))?;
        }

        info!(
            step = "Encoder",
            columns = columns.len(),
            unknown,
            "Ordinal encoded {} columns ({} unseen values)",
            columns.len(),
            unknown
        );
        Ok(out)
    }

    fn encode_one_hot(
        &self,
        state: &EncoderState,
        df: &DataFrame,
        columns: &[String],
    ) -> Result<DataFrame> {
        let mut out = df.drop_many(columns.iter().map(|s| PlSmallStr::from(s.as_str())));
        let mut taken: HashSet<String> = column_names(&out).into_iter().collect();
        let mut created = 0usize;

        for name in columns {
            let values = string_values(df.column(name)?.as_materialized_series())?;
            let categories: Vec<String> = match self.config.one_hot_columns {
                OneHotColumns::Observed => values
                    .iter()
                    .flatten()
                    .cloned()
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect(),
                OneHotColumns::Fitted => state.vocabulary.get(name).cloned().unwrap_or_default(),
            };

            for category in &categories {
                let indicator: Vec<u8> = values
                    .iter()
                    .map(|value| u8::from(value.as_deref() == Some(category.as_str())))
                    .collect();
                let indicator_name = format!("{}_{}", name, category);
                if !taken.insert(indicator_name.clone()) {
                    return Err(CleanError::schema_mismatch(
                        indicator_name,
                        "a new indicator column",
                        "a column with that name",
                    ));
                }
                debug!("Encoder: adding indicator '{}'", indicator_name);
                out.with_column(Series::new(indicator_name.into(), indicator))?;
                created += 1;
            }
        }

        info!(
            step = "Encoder",
            columns = columns.len(),
            created,
            "One-hot encoded {} columns into {} indicators",
            columns.len(),
            created
        );
        Ok(out)
    }
}

impl Step for Encoder {
    fn name(&self) -> &'static str {
        "Encoder"
    }

    fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        let mut state = EncoderState::default();

        for name in columns_of_kind(df, ColumnKind::Categorical) {
            let values = string_values(df.column(&name)?.as_materialized_series())?;
            let vocabulary: Vec<String> = values
                .into_iter()
                .flatten()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            debug!("Encoder: '{}' has {} categories", name, vocabulary.len());
            state.vocabulary.insert(name.clone(), vocabulary);
            state.columns.push(name);
        }

        info!(
            step = "Encoder",
            columns = state.columns.len(),
            "Fitted {:?} encoder on {} categorical columns",
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

        let mut columns = Vec::new();
        for name in &state.columns {
            if let Ok(column) = df.column(name) {
                ensure_kind(column.as_materialized_series(), ColumnKind::Categorical)?;
                columns.push(name.clone());
            }
        }

        if columns.is_empty() {
            debug!("Encoder: no fitted categorical columns present");
            return Ok(df.clone());
        }

        match self.config.method {
            EncodingMethod::OneHot => self.encode_one_hot(state, df, &columns),
            EncodingMethod::Ordinal => self.encode_ordinal(state, df, &columns),
        }
    }

    fn is_fitted(&self) -> bool {
        self.state.is_some()
    }
}
