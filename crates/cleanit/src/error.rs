//! Error types for the cleaning pipeline.
//!
//! Every fallible operation in the crate returns [`CleanError`]. Errors are
//! serializable as `{code, message}` so drivers can emit them as JSON.

use crate::config::ConfigValidationError;
use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the cleaning pipeline.
#[derive(Error, Debug)]
pub enum CleanError {
    /// Invalid step configuration.
    #[error("Invalid configuration: {0}")]
    Configuration(#[from] ConfigValidationError),

    /// A stateful step was asked to transform before it was fitted.
    #[error("Step '{step}' must be fitted before transform")]
    NotFitted { step: &'static str },

    /// A column captured during fit has an incompatible shape at transform time.
    #[error("Column '{column}' expected {expected}, found {found}")]
    SchemaMismatch {
        column: String,
        expected: String,
        found: String,
    },

    /// A persisted snapshot was written by a newer format version.
    #[error("Snapshot format version {found} is not supported (max {supported})")]
    IncompatibleSnapshot { found: u32, supported: u32 },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<CleanError>,
    },
}

impl CleanError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        CleanError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Shorthand for a [`CleanError::SchemaMismatch`].
    pub fn schema_mismatch(
        column: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        CleanError::SchemaMismatch {
            column: column.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// The innermost error, with every context layer removed.
    pub fn root(&self) -> &CleanError {
        match self {
            Self::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Stable error code for machine consumers.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::NotFitted { .. } => "NOT_FITTED",
            Self::SchemaMismatch { .. } => "SCHEMA_MISMATCH",
            Self::IncompatibleSnapshot { .. } => "INCOMPATIBLE_SNAPSHOT",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }
}

impl Serialize for CleanError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("CleanError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for cleaning operations.
pub type Result<T> = std::result::Result<T, CleanError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| CleanError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            CleanError::NotFitted { step: "Imputer" }.error_code(),
            "NOT_FITTED"
        );
        assert_eq!(
            CleanError::schema_mismatch("age", "numeric", "String").error_code(),
            "SCHEMA_MISMATCH"
        );
        assert_eq!(
            CleanError::from(ConfigValidationError::EmptySubset).error_code(),
            "CONFIGURATION_ERROR"
        );
    }

    #[test]
    fn test_error_serialization() {
        let error = CleanError::schema_mismatch("Age", "numeric", "String");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("SCHEMA_MISMATCH"));
        assert!(json.contains("Age"));
    }

    #[test]
    fn test_with_context_preserves_code_and_root() {
        let error = CleanError::NotFitted { step: "Scaler" }
            .with_context("Scaler transform")
            .with_context("pipeline");
        assert!(error.to_string().contains("Scaler transform"));
        assert_eq!(error.error_code(), "NOT_FITTED");
        assert!(matches!(error.root(), CleanError::NotFitted { step: "Scaler" }));
    }
}
