//! qaplan pipeline
//!
//! Turns a QA document into prioritized test cases in four stages:
//! - Extract: document -> raw text
//! - Structure: raw text -> test case records (language model)
//! - Score: records -> risk-scored, ranked records
//! - Export: ranked records -> JSON and YAML with summary metadata
//!
//! Every stage persists its output to an [`ArtifactStore`], so a later run
//! can resume from the extracted text or the structured records.

pub mod artifacts;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod fakes;
pub mod pipeline;
pub mod report;
pub mod sample;
pub mod stage;

// Re-export key types
pub use artifacts::{ArtifactRef, ArtifactRole, ArtifactStore};
pub use collaborators::{
    DocumentExporter, DocumentExtractor, ExportBundle, Exporter, Extractor, OpenAiStructurer,
    Structurer,
};
pub use config::{LlmSettings, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
pub use error::{
    ArtifactError, ExtractError, PreconditionError, StageError, StructureError,
};
pub use pipeline::{DocumentSource, Pipeline, RunOptions};
pub use report::{RunReport, RunStatus, StageFailure, StageOutcome, StageResult};
pub use sample::SAMPLE_QA_DOCUMENT;
pub use stage::{Stage, StageContract};
