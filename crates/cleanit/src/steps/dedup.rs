//! Duplicate row removal.

use super::Step;
use crate::config::{ConfigValidationError, DeduplicatorConfig, KeepPolicy};
use crate::error::Result;
use crate::utils::column_names;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Drops rows whose duplicate key was already seen.
///
/// Stateless: `fit` only validates the key columns against the frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Deduplicator {
    config: DeduplicatorConfig,
}

impl Deduplicator {
    pub fn new(config: DeduplicatorConfig) -> Self {
        Self { config }
    }

    /// Deduplicate on a subset of columns, keeping the first occurrence.
    pub fn on<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(DeduplicatorConfig {
            subset: Some(columns.into_iter().map(Into::into).collect()),
            keep: KeepPolicy::First,
        })
    }

    /// Change which occurrence of a duplicate group is kept.
    pub fn keep(mut self, keep: KeepPolicy) -> Self {
        self.config.keep = keep;
        self
    }

    pub fn config(&self) -> &DeduplicatorConfig {
        &self.config
    }

    /// Resolve the key columns against `df`.
    fn key_columns(&self, df: &DataFrame) -> Result<Vec<String>> {
        self.config.validate()?;
        let available = column_names(df);
        match &self.config.subset {
            None => Ok(available),
            Some(subset) => {
                if let Some(missing) = subset.iter().find(|col| !available.contains(col)) {
                    return Err(ConfigValidationError::UnknownColumn(missing.clone()).into());
                }
                Ok(subset.clone())
            }
        }
    }
}

impl Step for Deduplicator {
    fn name(&self) -> &'static str {
        "Deduplicator"
    }

    fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        let keys = self.key_columns(df)?;
        debug!("Deduplicator keyed on {:?}", keys);
        Ok(self)
    }

    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let keys = self.key_columns(df)?;
        let keep = match self.config.keep {
            KeepPolicy::First => UniqueKeepStrategy::First,
            KeepPolicy::Last => UniqueKeepStrategy::Last,
        };

        let out = df.unique_stable(Some(keys.as_slice()), keep, None)?;

        let removed = df.height() - out.height();
        info!(step = "Deduplicator", removed, "Removed {} duplicate rows", removed);
        Ok(out)
    }

    fn is_fitted(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CleanError;

    fn ids(df: &DataFrame) -> Vec<i32> {
        df.column("id")
            .unwrap()
            .i32()
            .unwrap()
            .into_iter()
            .flatten()
            .collect()
    }

    #[test]
    fn test_dedup_on_subset() {
        let df = df![
            "id" => [1, 1, 2],
            "v" => [10, 10, 20],
        ]
        .unwrap();

        let out = Deduplicator::on(["id"]).transform(&df).unwrap();

        assert_eq!(out.height(), 2);
        assert_eq!(ids(&out), vec![1, 2]);
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let df = df![
            "id" => [2, 1, 2, 1, 3],
            "v" => [20, 10, 21, 11, 30],
        ]
        .unwrap();

        let out = Deduplicator::on(["id"]).transform(&df).unwrap();

        assert_eq!(ids(&out), vec![2, 1, 3]);
        let v: Vec<i32> = out.column("v").unwrap().i32().unwrap().into_iter().flatten().collect();
        assert_eq!(v, vec![20, 10, 30]);
    }

    #[test]
    fn test_dedup_keep_last_preserves_relative_order() {
        let df = df![
            "id" => [2, 1, 2, 1, 3],
            "v" => [20, 10, 21, 11, 30],
        ]
        .unwrap();

        let out = Deduplicator::on(["id"])
            .keep(KeepPolicy::Last)
            .transform(&df)
            .unwrap();

        let v: Vec<i32> = out.column("v").unwrap().i32().unwrap().into_iter().flatten().collect();
        assert_eq!(v, vec![21, 11, 30]);
    }

    #[test]
    fn test_dedup_whole_rows_by_default() {
        let df = df![
            "id" => [1, 1, 1],
            "name" => [Some("a"), Some("a"), Some("b")],
        ]
        .unwrap();

        let out = Deduplicator::default().transform(&df).unwrap();

        assert_eq!(out.height(), 2);
    }

    #[test]
    fn test_dedup_treats_nulls_as_equal() {
        let df = df![
            "name" => [None, Some("a"), None],
        ]
        .unwrap();

        let out = Deduplicator::default().transform(&df).unwrap();

        assert_eq!(out.height(), 2);
    }

    #[test]
    fn test_dedup_non_string_keys() {
        let df = df![
            "score" => [Some(1.5), Some(1.5), None, Some(2.5), None],
            "flag" => [true, true, false, true, false],
            "v" => [1, 2, 3, 4, 5],
        ]
        .unwrap();

        let out = Deduplicator::on(["score", "flag"]).transform(&df).unwrap();

        let v: Vec<i32> = out.column("v").unwrap().i32().unwrap().into_iter().flatten().collect();
        assert_eq!(v, vec![1, 3, 4]);
    }

    #[test]
    fn test_dedup_unknown_subset_column() {
        let df = df!["id" => [1, 2]].unwrap();
        let mut step = Deduplicator::on(["PassengerId"]);

        let fit_err = step.fit(&df).unwrap_err();
        assert!(matches!(
            fit_err,
            CleanError::Configuration(ConfigValidationError::UnknownColumn(ref col)) if col == "PassengerId"
        ));
        assert_eq!(step.transform(&df).unwrap_err().error_code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_dedup_does_not_mutate_input() {
        let df = df!["id" => [1, 1]].unwrap();
        let _ = Deduplicator::default().transform(&df).unwrap();
        assert_eq!(df.height(), 2);
    }
}
