//! Pipeline stage definitions and contracts.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::artifacts::ArtifactRole;

/// The four pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Document -> raw text
    Extract,

    /// Raw text -> test case records (language model)
    Structure,

    /// Records -> scored and ranked records
    Score,

    /// Scored records -> JSON + YAML exports
    Export,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Stage; 4] = [Stage::Extract, Stage::Structure, Stage::Score, Stage::Export];

    /// Get the stage name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Extract => "extract",
            Stage::Structure => "structure",
            Stage::Score => "score",
            Stage::Export => "export",
        }
    }

    /// Human-readable label for status output.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Extract => "Text Extraction",
            Stage::Structure => "LLM Structuring",
            Stage::Score => "Risk Scoring",
            Stage::Export => "JSON & YAML Export",
        }
    }

    /// 1-based position in the pipeline.
    pub fn position(&self) -> usize {
        match self {
            Stage::Extract => 1,
            Stage::Structure => 2,
            Stage::Score => 3,
            Stage::Export => 4,
        }
    }

    /// Whether a prior artifact may stand in for running this stage.
    pub fn skippable(&self) -> bool {
        matches!(self, Stage::Extract | Stage::Structure)
    }

    /// Declared inputs and outputs of this stage.
    pub fn contract(&self) -> StageContract {
        match self {
            Stage::Extract => StageContract {
                stage: *self,
                consumes: ArtifactRole::SourceDocument,
                produces: &[ArtifactRole::ExtractedText],
                skippable: true,
            },
            Stage::Structure => StageContract {
                stage: *self,
                consumes: ArtifactRole::ExtractedText,
                produces: &[ArtifactRole::StructuredRecords],
                skippable: true,
            },
            Stage::Score => StageContract {
                stage: *self,
                consumes: ArtifactRole::StructuredRecords,
                produces: &[ArtifactRole::ScoredRecords],
                skippable: false,
            },
            Stage::Export => StageContract {
                stage: *self,
                consumes: ArtifactRole::ScoredRecords,
                produces: &[ArtifactRole::ExportJson, ArtifactRole::ExportYaml],
                skippable: false,
            },
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inputs, outputs and skippability of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageContract {
    pub stage: Stage,

    /// Artifact the stage reads.
    pub consumes: ArtifactRole,

    /// Artifacts the stage writes (or reuses when skipped).
    pub produces: &'static [ArtifactRole],

    /// Whether a reuse flag may skip the stage.
    pub skippable: bool,
}
