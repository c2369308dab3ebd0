//! Persisted plan reports.
//!
//! A report wraps a [`MotionPlan`] with enough provenance to tell which
//! source text and robot produced it.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::motion::MotionPlan;
use crate::storage;
use crate::tdl::SkippedLine;

/// Plan plus provenance, as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanReport {
    /// Unique report id.
    pub id: Uuid,
    /// When the report was produced.
    pub generated_at: DateTime<Utc>,
    /// Source file, when planned from a file.
    pub source: Option<PathBuf>,
    /// BLAKE3 hex digest of the source text.
    pub source_digest: String,
    /// Robot model name the plan was computed for.
    pub robot: String,
    /// Lines the parser dropped.
    pub skipped: Vec<SkippedLine>,
    /// The plan itself.
    pub plan: MotionPlan,
}

impl PlanReport {
    /// Wrap `plan` computed from `source_text`.
    pub fn new(
        source_text: &str,
        robot: impl Into<String>,
        skipped: Vec<SkippedLine>,
        plan: MotionPlan,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            generated_at: Utc::now(),
            source: None,
            source_digest: source_digest(source_text),
            robot: robot.into(),
            skipped,
            plan,
        }
    }

    /// Record the source path.
    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    /// Whether `source_text` is the text this report was planned from.
    pub fn matches_source(&self, source_text: &str) -> bool {
        self.source_digest == source_digest(source_text)
    }
}

/// BLAKE3 hex digest of program text.
pub fn source_digest(source_text: &str) -> String {
    blake3::hash(source_text.as_bytes()).to_hex().to_string()
}

/// Write a report atomically as pretty JSON.
pub fn write_report(path: &Path, report: &PlanReport) -> Result<()> {
    storage::write_json(path, report)
        .with_context(|| format!("Failed to write plan report {}", report.id))
}

/// Load a report written by [`write_report`].
pub fn load_report(path: &Path) -> Result<PlanReport> {
    storage::read_json(path).context("Failed to load plan report")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::{GoalPlan, PlanBuilder, PlanRecord};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn sample_plan() -> MotionPlan {
        let mut goal = GoalPlan::new("Weld", 1);
        goal.push(PlanRecord::Event {
            command: "ArcOn".into(),
            args: BTreeMap::new(),
            duration: 0.1,
        });
        let mut builder = PlanBuilder::new();
        builder.push_goal(goal);
        builder.finish()
    }

    #[test]
    fn digest_identifies_source_text() {
        let report = PlanReport::new("GOAL A() {}", "Generic6DOF", Vec::new(), sample_plan());
        assert!(report.matches_source("GOAL A() {}"));
        assert!(!report.matches_source("GOAL B() {}"));
        assert_eq!(report.source_digest.len(), 64);
    }

    #[test]
    fn report_survives_disk_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("plan.json");
        let report = PlanReport::new("source", "H2017", Vec::new(), sample_plan())
            .with_source("job.tdl");

        write_report(&path, &report).unwrap();
        let loaded = load_report(&path).unwrap();

        assert_eq!(loaded, report);
        assert_eq!(loaded.plan.goals[0].name, "Weld");
        assert_eq!(loaded.source.as_deref(), Some(Path::new("job.tdl")));
    }

    #[test]
    fn reports_get_distinct_ids() {
        let a = PlanReport::new("x", "r", Vec::new(), sample_plan());
        let b = PlanReport::new("x", "r", Vec::new(), sample_plan());
        assert_ne!(a.id, b.id);
        assert_eq!(a.source_digest, b.source_digest);
    }
}
