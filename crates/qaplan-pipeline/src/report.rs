//! Run reports.
//!
//! A [`RunLog`] is opened when orchestration starts and appended to as
//! stages complete. Finishing consumes it, so a [`RunReport`] is immutable
//! once the run ends.

use std::time::Instant;

use chrono::{DateTime, Utc};
use qaplan_core::ExportMetadata;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::artifacts::{ArtifactRef, ArtifactRole};
use crate::error::StageError;
use crate::stage::Stage;

/// How a completed stage got its output.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    Executed,

    /// A prior artifact stood in for running the stage.
    Reused,
}

/// A stage that completed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StageResult {
    pub stage: Stage,
    pub outcome: StageOutcome,

    /// Duration in milliseconds.
    pub duration_ms: u64,
}

impl StageResult {
    pub fn reused(&self) -> bool {
        self.outcome == StageOutcome::Reused
    }
}

/// The failure that ended a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StageFailure {
    pub stage: Stage,
    pub message: String,

    /// Remediation shown to the user.
    pub hint: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Failed,
}

/// Result of one pipeline execution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: RunStatus,

    /// Completed stages, in order.
    pub stages: Vec<StageResult>,

    /// At most one entry: the first failure halts the run.
    pub errors: Vec<StageFailure>,

    /// Total duration in milliseconds.
    pub duration_ms: u64,

    /// Artifacts produced or reused, one per role.
    pub artifacts: Vec<ArtifactRef>,

    /// Export summary, present once Export has completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ExportMetadata>,
}

impl RunReport {
    pub fn success(&self) -> bool {
        self.status == RunStatus::Completed
    }

    /// Number of stages that completed, executed or reused.
    pub fn completed_count(&self) -> usize {
        self.stages.len()
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.stage.name()).collect()
    }

    pub fn completed(&self, stage: Stage) -> bool {
        self.stages.iter().any(|s| s.stage == stage)
    }

    pub fn failure(&self) -> Option<&StageFailure> {
        self.errors.first()
    }

    pub fn failed_stage(&self) -> Option<Stage> {
        self.failure().map(|f| f.stage)
    }

    pub fn artifact(&self, role: ArtifactRole) -> Option<&ArtifactRef> {
        self.artifacts.iter().find(|a| a.role == role)
    }
}

/// In-progress report for a running pipeline.
#[derive(Debug)]
pub(crate) struct RunLog {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    clock: Instant,
    stages: Vec<StageResult>,
    artifacts: Vec<ArtifactRef>,
    summary: Option<ExportMetadata>,
}

impl RunLog {
    pub(crate) fn start() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            clock: Instant::now(),
            stages: Vec::new(),
            artifacts: Vec::new(),
            summary: None,
        }
    }

    pub(crate) fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub(crate) fn record_stage(&mut self, stage: Stage, outcome: StageOutcome, started: Instant) {
        let duration_ms = started.elapsed().as_millis() as u64;
        info!(stage = %stage, ?outcome, duration_ms, "Stage completed");
        self.stages.push(StageResult {
            stage,
            outcome,
            duration_ms,
        });
    }

    /// Track an artifact, replacing any earlier one with the same role.
    pub(crate) fn record_artifact(&mut self, artifact: ArtifactRef) {
        match self.artifacts.iter_mut().find(|a| a.role == artifact.role) {
            Some(existing) => *existing = artifact,
            None => self.artifacts.push(artifact),
        }
    }

    pub(crate) fn set_summary(&mut self, summary: ExportMetadata) {
        self.summary = Some(summary);
    }

    /// Finalize the run as completed.
    pub(crate) fn finish_ok(self) -> RunReport {
        info!(run_id = %self.run_id, "Pipeline completed successfully");
        self.finish(RunStatus::Completed, Vec::new())
    }

    /// Finalize the run as failed at `stage`.
    pub(crate) fn finish_err(self, stage: Stage, err: &StageError) -> RunReport {
        warn!(run_id = %self.run_id, stage = %stage, error = %err, "Pipeline failed");
        let failure = StageFailure {
            stage,
            message: err.to_string(),
            hint: err.hint().to_string(),
        };
        self.finish(RunStatus::Failed, vec![failure])
    }

    fn finish(self, status: RunStatus, errors: Vec<StageFailure>) -> RunReport {
        RunReport {
            run_id: self.run_id,
            started_at: self.started_at,
            finished_at: Utc::now(),
            status,
            stages: self.stages,
            errors,
            duration_ms: self.clock.elapsed().as_millis() as u64,
            artifacts: self.artifacts,
            summary: self.summary,
        }
    }
}
