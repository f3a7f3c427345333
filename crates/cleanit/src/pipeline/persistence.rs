//! On-disk representation of a fitted pipeline.
//!
//! A snapshot is a versioned JSON envelope around the ordered fitted steps.
//! Each step serializes its configuration and fitted state explicitly, so
//! a loaded pipeline transforms exactly like the one that was saved.

use crate::error::{CleanError, Result};
use crate::steps::CleaningStep;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Newest snapshot format this build reads and the one it writes.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// A step together with the fitted parameters it carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedStep {
    pub name: String,
    pub step: CleaningStep,
}

/// Serialized form of a pipeline's fitted state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSnapshot {
    pub format_version: u32,
    pub created_at: DateTime<Utc>,
    pub steps: Vec<FittedStep>,
}

impl PipelineSnapshot {
    pub fn new(steps: Vec<FittedStep>) -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            created_at: Utc::now(),
            steps,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: PipelineSnapshot = serde_json::from_str(json)?;
        snapshot.check_version()
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    pub fn read_from(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let snapshot: PipelineSnapshot = serde_json::from_reader(reader)?;
        snapshot.check_version()
    }

    fn check_version(self) -> Result<Self> {
        if self.format_version > SNAPSHOT_FORMAT_VERSION {
            return Err(CleanError::IncompatibleSnapshot {
                found: self.format_version,
                supported: SNAPSHOT_FORMAT_VERSION,
            });
        }
        Ok(self)
    }
}
