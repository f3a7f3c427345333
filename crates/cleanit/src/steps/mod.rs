//! Cleaning steps and the fit/transform contract they share.
//!
//! A step learns whatever it needs from a frame in [`Step::fit`] and replays
//! it on any frame in [`Step::transform`]. `transform` never mutates the
//! fitted parameters and never mutates its input; it returns a new frame.
//!
//! The set of steps is closed: [`CleaningStep`] enumerates them and is what
//! the pipeline stores and persists.

mod dedup;
mod encoder;
mod imputer;
mod scaler;

pub use dedup::Deduplicator;
pub use encoder::{Encoder, EncoderState};
pub use imputer::{Imputer, ImputerState};
pub use scaler::{ColumnScale, Scaler, ScalerState};

use crate::config::StepConfig;
use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// A single stateful transformation unit.
pub trait Step {
    /// Stable identity used in logs and persisted snapshots.
    fn name(&self) -> &'static str;

    /// Recompute the fitted parameters from `df`, replacing any prior state.
    fn fit(&mut self, df: &DataFrame) -> Result<&mut Self>;

    /// Apply the fitted parameters to `df`, producing a new frame.
    fn transform(&self, df: &DataFrame) -> Result<DataFrame>;

    /// Whether `transform` can run. Stateless steps are always fitted.
    fn is_fitted(&self) -> bool;

    /// Fit on `df`, then transform it.
    fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        self.fit(df)?.transform(df)
    }
}

/// Every step the pipeline knows how to run and persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CleaningStep {
    Deduplicator(Deduplicator),
    Imputer(Imputer),
    Encoder(Encoder),
    Scaler(Scaler),
}

static_assertions::assert_impl_all!(CleaningStep: Send, Sync);

impl CleaningStep {
    /// Check the step's configuration without touching any data.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Deduplicator(step) => step.config().validate()?,
            Self::Imputer(step) => step.config().validate()?,
            Self::Encoder(_) | Self::Scaler(_) => {}
        }
        Ok(())
    }
}

impl Step for CleaningStep {
    fn name(&self) -> &'static str {
        match self {
            Self::Deduplicator(step) => step.name(),
            Self::Imputer(step) => step.name(),
            Self::Encoder(step) => step.name(),
            Self::Scaler(step) => step.name(),
        }
    }

    fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        match self {
            Self::Deduplicator(step) => {
                step.fit(df)?;
            }
            Self::Imputer(step) => {
                step.fit(df)?;
            }
            Self::Encoder(step) => {
                step.fit(df)?;
            }
            Self::Scaler(step) => {
                step.fit(df)?;
            }
        }
        Ok(self)
    }

    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        match self {
            Self::Deduplicator(step) => step.transform(df),
            Self::Imputer(step) => step.transform(df),
            Self::Encoder(step) => step.transform(df),
            Self::Scaler(step) => step.transform(df),
        }
    }

    fn is_fitted(&self) -> bool {
        match self {
            Self::Deduplicator(step) => step.is_fitted(),
            Self::Imputer(step) => step.is_fitted(),
            Self::Encoder(step) => step.is_fitted(),
            Self::Scaler(step) => step.is_fitted(),
        }
    }
}

impl From<StepConfig> for CleaningStep {
    fn from(config: StepConfig) -> Self {
        match config {
            StepConfig::Deduplicate(config) => Self::Deduplicator(Deduplicator::new(config)),
            StepConfig::Impute(config) => Self::Imputer(Imputer::new(config)),
            StepConfig::Encode(config) => Self::Encoder(Encoder::new(config)),
            StepConfig::Scale(config) => Self::Scaler(Scaler::new(config)),
        }
    }
}

impl From<Deduplicator> for CleaningStep {
    fn from(step: Deduplicator) -> Self {
        Self::Deduplicator(step)
    }
}

impl From<Imputer> for CleaningStep {
    fn from(step: Imputer) -> Self {
        Self::Imputer(step)
    }
}

impl From<Encoder> for CleaningStep {
    fn from(step: Encoder) -> Self {
        Self::Encoder(step)
    }
}

impl From<Scaler> for CleaningStep {
    fn from(step: Scaler) -> Self {
        Self::Scaler(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ImputerConfig, ScalerConfig};

    #[test]
    fn test_step_from_config() {
        let step = CleaningStep::from(StepConfig::Impute(ImputerConfig::default()));
        assert_eq!(step.name(), "Imputer");
        assert!(!step.is_fitted());
    }

    #[test]
    fn test_dispatch_fit_transform() {
        let df = df!["x" => [0.0, 5.0, 10.0]].unwrap();
        let mut step = CleaningStep::from(StepConfig::Scale(ScalerConfig::default()));

        let out = step.fit_transform(&df).unwrap();

        assert!(step.is_fitted());
        assert_eq!(out.height(), 3);
    }

    #[test]
    fn test_step_serializes_with_kind_tag() {
        let step = CleaningStep::from(Deduplicator::default());
        let json = serde_json::to_string(&step).unwrap();
        assert!(json.contains(r#""kind":"deduplicator""#));
        let back: CleaningStep = serde_json::from_str(&json).unwrap();
        assert_eq!(back, step);
    }
}
