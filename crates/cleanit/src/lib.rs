//! Tabular Data Cleaning Pipeline Library
//!
//! A composable fit/transform cleaning pipeline built with Rust and Polars.
//!
//! # Overview
//!
//! This library chains stateful cleaning steps over a [`polars`] DataFrame:
//!
//! - **Deduplication**: drop repeated rows, keyed on all or a subset of columns
//! - **Imputation**: fill missing values with statistics learned at fit time
//! - **Encoding**: one-hot indicators or ordinal codes for categorical columns
//! - **Scaling**: standard, min-max or robust scaling of numeric columns
//! - **Persistence**: save fitted state to JSON and replay it on new data
//! - **Profiling**: per-column missing %, distinct count and numeric summary
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use cleanit::{Deduplicator, Encoder, Imputer, Pipeline, Scaler, ScalingMethod};
//! use polars::prelude::*;
//!
//! let train = CsvReadOptions::default()
//!     .try_into_reader_with_file_path(Some("train.csv".into()))?
//!     .finish()?;
//!
//! let mut pipeline = Pipeline::builder()
//!     .step(Deduplicator::on(["PassengerId"]))
//!     .step(Imputer::default())
//!     .step(Encoder::one_hot())
//!     .step(Scaler::with_method(ScalingMethod::MinMax))
//!     .build()?;
//!
//! let clean = pipeline.fit_transform(&train)?;
//! pipeline.save("pipeline.json")?;
//!
//! // Later, on new data, without refitting
//! let pipeline = Pipeline::from_snapshot("pipeline.json")?;
//! let clean_test = pipeline.transform(&test)?;
//! ```
//!
//! # Configuration
//!
//! Pipelines can also be described by a JSON recipe:
//!
//! ```rust,ignore
//! use cleanit::config::*;
//!
//! let config = PipelineConfig::builder()
//!     .deduplicate(DeduplicatorConfig::default())
//!     .impute(ImputerConfig {
//!         numeric: NumericStrategy::Mean,
//!         ..Default::default()
//!     })
//!     .encode(EncoderConfig::default())
//!     .scale(ScalerConfig { method: ScalingMethod::Robust })
//!     .build()?;
//!
//! let pipeline = Pipeline::from_config(config)?;
//! ```
//!
//! # Logging
//!
//! All steps log through [`tracing`]. Pass a span with
//! [`PipelineBuilder::span`] to tag every fit and transform; the library
//! never installs a subscriber itself.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod profiler;
pub mod steps;
pub mod utils;

pub use config::{
    CategoricalStrategy, ConfigValidationError, DeduplicatorConfig, EncoderConfig, EncodingMethod,
    ImputerConfig, KeepPolicy, NumericStrategy, OneHotColumns, PipelineConfig,
    PipelineConfigBuilder, ScalerConfig, ScalingMethod, StepConfig,
};
pub use error::{CleanError, Result, ResultExt};
pub use pipeline::{FittedStep, Pipeline, PipelineBuilder, PipelineSnapshot};
pub use profiler::{ColumnReport, ProfileReport, report_profile};
pub use steps::{CleaningStep, Deduplicator, Encoder, Imputer, Scaler, Step};
