//! Configuration types for the cleaning steps and pipeline recipes.
//!
//! Each step has a plain serde config struct. A [`PipelineConfig`] is an
//! ordered list of those configs, loadable from JSON or assembled with
//! [`PipelineConfig::builder()`].

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Normalize a user supplied method name: trimmed, lowercase, `-` as `_`.
fn normalize_name(value: &str) -> String {
    value.trim().to_ascii_lowercase().replace('-', "_")
}

/// Which occurrence of a duplicate group survives deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum KeepPolicy {
    /// Keep the earliest row of each duplicate group
    #[default]
    First,
    /// Keep the latest row of each duplicate group
    Last,
}

impl FromStr for KeepPolicy {
    type Err = ConfigValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_name(s).as_str() {
            "first" => Ok(Self::First),
            "last" => Ok(Self::Last),
            _ => Err(ConfigValidationError::unknown_method("keep policy", s)),
        }
    }
}

/// Strategy for imputing missing numeric values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NumericStrategy {
    /// Use the median of non-null values
    #[default]
    Median,
    /// Use the mean of non-null values
    Mean,
    /// Use the configured numeric constant
    Constant,
}

impl FromStr for NumericStrategy {
    type Err = ConfigValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_name(s).as_str() {
            "median" => Ok(Self::Median),
            "mean" => Ok(Self::Mean),
            "constant" => Ok(Self::Constant),
            _ => Err(ConfigValidationError::unknown_method("numeric strategy", s)),
        }
    }
}

/// Strategy for imputing missing categorical values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalStrategy {
    /// Use the most frequent value, falling back to the constant
    #[default]
    Mode,
    /// Use the configured categorical constant
    Constant,
}

impl FromStr for CategoricalStrategy {
    type Err = ConfigValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_name(s).as_str() {
            "mode" => Ok(Self::Mode),
            "constant" => Ok(Self::Constant),
            _ => Err(ConfigValidationError::unknown_method(
                "categorical strategy",
                s,
            )),
        }
    }
}

/// Encoding method for categorical columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EncodingMethod {
    /// One binary indicator column per category
    #[default]
    #[serde(alias = "onehot", alias = "one-hot")]
    OneHot,
    /// One integer code per category
    Ordinal,
}

impl FromStr for EncodingMethod {
    type Err = ConfigValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_name(s).as_str() {
            "one_hot" | "onehot" => Ok(Self::OneHot),
            "ordinal" => Ok(Self::Ordinal),
            _ => Err(ConfigValidationError::unknown_method("encoding method", s)),
        }
    }
}

/// Which categories produce one-hot indicator columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OneHotColumns {
    /// Categories present in the frame being transformed. The output schema
    /// can differ between calls.
    #[default]
    Observed,
    /// Categories seen during fit. Unseen values get all-zero indicators.
    Fitted,
}

/// Feature scaling method for numeric columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScalingMethod {
    /// Zero mean, unit variance
    #[default]
    Standard,
    /// Rescale to [0, 1] using the fitted min and max
    #[serde(alias = "minmax", alias = "min-max")]
    MinMax,
    /// Center on the median, scale by the interquartile range
    Robust,
}

impl FromStr for ScalingMethod {
    type Err = ConfigValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_name(s).as_str() {
            "standard" => Ok(Self::Standard),
            "min_max" | "minmax" => Ok(Self::MinMax),
            "robust" => Ok(Self::Robust),
            _ => Err(ConfigValidationError::unknown_method("scaling method", s)),
        }
    }
}

/// Configuration for the deduplication step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeduplicatorConfig {
    /// Columns forming the duplicate key. `None` compares whole rows.
    pub subset: Option<Vec<String>>,
    /// Which row of a duplicate group is retained.
    pub keep: KeepPolicy,
}

impl DeduplicatorConfig {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if matches!(&self.subset, Some(cols) if cols.is_empty()) {
            return Err(ConfigValidationError::EmptySubset);
        }
        Ok(())
    }
}

/// Configuration for the missing value imputation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImputerConfig {
    pub numeric: NumericStrategy,
    /// Fill value for `NumericStrategy::Constant`.
    pub numeric_constant: f64,
    pub categorical: CategoricalStrategy,
    /// Fill value for `CategoricalStrategy::Constant`, and the fallback when
    /// a categorical column has no observed values.
    pub categorical_constant: String,
}

impl Default for ImputerConfig {
    fn default() -> Self {
        Self {
            numeric: NumericStrategy::default(),
            numeric_constant: 0.0,
            categorical: CategoricalStrategy::default(),
            categorical_constant: "missing".to_string(),
        }
    }
}

impl ImputerConfig {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !self.numeric_constant.is_finite() {
            return Err(ConfigValidationError::NonFiniteConstant {
                field: "numeric_constant".to_string(),
                value: self.numeric_constant,
            });
        }
        Ok(())
    }
}

/// Configuration for the categorical encoding step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub method: EncodingMethod,
    /// Ordinal code assigned to categories unseen during fit.
    pub unknown_value: i64,
    /// Which categories get one-hot indicator columns.
    pub one_hot_columns: OneHotColumns,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            method: EncodingMethod::default(),
            unknown_value: -1,
            one_hot_columns: OneHotColumns::default(),
        }
    }
}

/// Configuration for the numeric scaling step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalerConfig {
    pub method: ScalingMethod,
}

/// One entry of a pipeline recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum StepConfig {
    Deduplicate(DeduplicatorConfig),
    Impute(ImputerConfig),
    Encode(EncoderConfig),
    Scale(ScalerConfig),
}

impl StepConfig {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        match self {
            Self::Deduplicate(config) => config.validate(),
            Self::Impute(config) => config.validate(),
            Self::Encode(_) | Self::Scale(_) => Ok(()),
        }
    }
}

/// An ordered recipe of cleaning steps.
///
/// # Example
///
/// ```rust,ignore
/// use cleanit::config::*;
///
/// let config = PipelineConfig::builder()
///     .deduplicate(DeduplicatorConfig { subset: Some(vec!["id".into()]), ..Default::default() })
///     .impute(ImputerConfig::default())
///     .encode(EncoderConfig { method: EncodingMethod::Ordinal, ..Default::default() })
///     .scale(ScalerConfig { method: ScalingMethod::Robust })
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub steps: Vec<StepConfig>,
}

impl Default for PipelineConfig {
    /// Deduplicate, impute (median/mode), one-hot encode, standard scale.
    fn default() -> Self {
        Self {
            steps: vec![
                StepConfig::Deduplicate(DeduplicatorConfig::default()),
                StepConfig::Impute(ImputerConfig::default()),
                StepConfig::Encode(EncoderConfig::default()),
                StepConfig::Scale(ScalerConfig::default()),
            ],
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder with no steps.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Parse and validate a JSON recipe.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigValidationError> {
        let config: PipelineConfig = serde_json::from_str(json)
            .map_err(|e| ConfigValidationError::Malformed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a JSON recipe file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigValidationError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigValidationError::Malformed(format!("{}: {}", path.display(), e))
        })?;
        Self::from_json_str(&content)
    }

    /// Validate every step in the recipe.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.steps.iter().try_for_each(StepConfig::validate)
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Unknown {kind} '{value}'")]
    UnknownMethod { kind: &'static str, value: String },

    #[error("Deduplication subset must name at least one column")]
    EmptySubset,

    #[error("Deduplication key column '{0}' not found in frame")]
    UnknownColumn(String),

    #[error("Invalid value for '{field}': {value} (must be finite)")]
    NonFiniteConstant { field: String, value: f64 },

    #[error("Malformed recipe: {0}")]
    Malformed(String),
}

impl ConfigValidationError {
    fn unknown_method(kind: &'static str, value: &str) -> Self {
        Self::UnknownMethod {
            kind,
            value: value.to_string(),
        }
    }
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    steps: Vec<StepConfig>,
}

impl PipelineConfigBuilder {
    /// Append a deduplication step.
    pub fn deduplicate(mut self, config: DeduplicatorConfig) -> Self {
        self.steps.push(StepConfig::Deduplicate(config));
        self
    }

    /// Append a missing value imputation step.
    pub fn impute(mut self, config: ImputerConfig) -> Self {
        self.steps.push(StepConfig::Impute(config));
        self
    }

    /// Append a categorical encoding step.
    pub fn encode(mut self, config: EncoderConfig) -> Self {
        self.steps.push(StepConfig::Encode(config));
        self
    }

    /// Append a numeric scaling step.
    pub fn scale(mut self, config: ScalerConfig) -> Self {
        self.steps.push(StepConfig::Scale(config));
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let config = PipelineConfig { steps: self.steps };
        config.validate()?;
        Ok(config)
    }
}
