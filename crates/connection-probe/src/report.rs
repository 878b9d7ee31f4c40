//! Probe results and the aggregated run report.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::SourceSpec;
use crate::probes::ProbeOutcome;

/// Outcome of one probe, stamped with the identity of its source.
///
/// Constructed exactly once per probed source and never mutated afterwards;
/// there is no merging, retrying or re-stamping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    /// Catalog identifier of the source.
    pub source_id: String,
    /// Owning system label.
    pub system: String,
    /// Connector family.
    pub source_type: String,
    /// Whether the probe passed.
    pub ok: bool,
    /// Human-readable outcome.
    pub details: String,
}

impl ProbeResult {
    /// Stamp a probe outcome with `spec`'s identity fields.
    #[must_use]
    pub fn new(spec: &SourceSpec, outcome: ProbeOutcome) -> Self {
        Self {
            source_id: spec.source_id.clone(),
            system: spec.system.clone(),
            source_type: spec.source_type.clone(),
            ok: outcome.ok,
            details: outcome.details,
        }
    }
}

/// Aggregated report for one environment run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeReport {
    /// Environment the run targeted.
    pub environment: String,
    /// Number of sources actually probed.
    pub total_sources_probed: usize,
    /// Count of passing results.
    pub passed: usize,
    /// Count of failing results.
    pub failed: usize,
    /// Per-source results in catalog order.
    pub results: Vec<ProbeResult>,
}

impl ProbeReport {
    /// Build a report from an ordered result sequence.
    ///
    /// The counts are derived from `results` here, so every constructed
    /// report satisfies `passed + failed == total_sources_probed`.
    #[must_use]
    pub fn from_results(environment: impl Into<String>, results: Vec<ProbeResult>) -> Self {
        let passed = results.iter().filter(|r| r.ok).count();

        Self {
            environment: environment.into(),
            total_sources_probed: results.len(),
            passed,
            failed: results.len() - passed,
            results,
        }
    }

    /// Whether every probed source passed.
    ///
    /// True for an empty run: a catalog with nothing to probe gates
    /// nothing.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Render the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize probe report")
    }

    /// Write the report to `<output_dir>/connection_probe_<env>.json`.
    ///
    /// Creates the directory if needed and returns the written path.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file
    /// cannot be written.
    pub fn write_to(&self, output_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(output_dir).with_context(|| {
            format!(
                "Failed to create output directory {}",
                output_dir.display()
            )
        })?;

        let path = output_dir.join(format!("connection_probe_{}.json", self.environment));
        std::fs::write(&path, self.to_json()?)
            .with_context(|| format!("Failed to write probe report {}", path.display()))?;

        Ok(path)
    }
}
