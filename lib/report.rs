//! Outcome reporting for a pipeline run.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::PathBuf;

use crate::scan::SkippedSource;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Result of one deployment step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Success,
    Skipped { reason: String },
    Failed { reason: String },
}

/// A named step and how it went.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    /// Short step label, e.g. `clear` or `aux:util.ts`.
    pub name: String,

    #[serde(flatten)]
    pub outcome: StepOutcome,
}

/// Everything a run did, in order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineReport {
    /// Directory the mod was deployed into.
    pub deploy_root: PathBuf,

    /// Number of patch descriptors rendered into the manifest.
    pub descriptors: usize,

    /// Sources the scanner could not read or parse.
    pub skipped_sources: Vec<SkippedSource>,

    /// Steps in execution order.
    pub steps: Vec<StepReport>,

    /// Auxiliary scripts deployed, as file names under `extra_lua/`.
    pub aux_scripts: Vec<String>,

    /// SHA-256 of the rendered `patches.toml`.
    pub manifest_sha256: String,

    /// SHA-256 of the rendered metadata document.
    pub metadata_sha256: String,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl StepOutcome {
    pub fn failed(reason: impl ToString) -> Self {
        StepOutcome::Failed {
            reason: reason.to_string(),
        }
    }

    pub fn skipped(reason: impl ToString) -> Self {
        StepOutcome::Skipped {
            reason: reason.to_string(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, StepOutcome::Failed { .. })
    }
}

impl PipelineReport {
    pub fn new(deploy_root: PathBuf) -> Self {
        Self {
            deploy_root,
            ..Default::default()
        }
    }

    /// Record a step outcome.
    pub fn record(&mut self, name: impl Into<String>, outcome: StepOutcome) {
        self.steps.push(StepReport {
            name: name.into(),
            outcome,
        });
    }

    /// Returns true if any step failed.
    pub fn has_failures(&self) -> bool {
        self.steps.iter().any(|s| s.outcome.is_failure())
    }

    /// Steps that failed, in execution order.
    pub fn failed_steps(&self) -> impl Iterator<Item = &StepReport> {
        self.steps.iter().filter(|s| s.outcome.is_failure())
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Compute SHA-256 hash of data.
pub fn compute_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
