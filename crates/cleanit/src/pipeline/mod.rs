//! Pipeline module.
//!
//! This module provides the step pipeline and its persisted snapshot format.

mod builder;
pub mod persistence;

pub use builder::{Pipeline, PipelineBuilder};
pub use persistence::{FittedStep, PipelineSnapshot, SNAPSHOT_FORMAT_VERSION};
