//! Error taxonomy for pipeline stages.
//!
//! Every variant is fatal to a run. The orchestrator converts the first one
//! it sees into a single [`StageFailure`](crate::report::StageFailure) with a
//! remediation hint from [`StageError::hint`].

use std::path::PathBuf;

use qaplan_core::ExportError;
use thiserror::Error;

use crate::artifacts::ArtifactRole;
use crate::stage::Stage;

/// A stage's inputs are not in a usable state.
#[derive(Debug, Error)]
pub enum PreconditionError {
    #[error("source document not found: {}", .0.display())]
    DocumentNotFound(PathBuf),

    #[error("cannot reuse {role}: no artifact at {}", path.display())]
    MissingArtifact { role: ArtifactRole, path: PathBuf },

    #[error("extracted text is empty; nothing to structure")]
    EmptyText,

    #[error("no test cases to score")]
    NoRecords,

    #[error("the {0} stage cannot be skipped")]
    NotSkippable(Stage),
}

/// Failures of the text extraction collaborator.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("document not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("could not read {}: {message}", path.display())]
    Unreadable { path: PathBuf, message: String },
}

/// Failures of the language-model collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StructureError {
    #[error("no API key configured for the language model")]
    MissingCredential,

    #[error("invalid API key: {0}")]
    InvalidCredential(String),

    #[error("API quota exceeded or no credits: {0}")]
    QuotaExhausted(String),

    #[error("API rate limit reached: {0}")]
    RateLimited(String),

    #[error("model response is not valid test case JSON: {0}")]
    MalformedResponse(String),

    #[error("provider error: {0}")]
    Provider(String),
}

/// Failures reading or writing the artifact directory.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid test case file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode test cases: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Any error that ends a run.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("precondition failed: {0}")]
    Precondition(#[from] PreconditionError),

    #[error("extraction failed: {0}")]
    Extract(#[from] ExtractError),

    #[error("structuring failed: {0}")]
    Structure(#[from] StructureError),

    #[error("export failed: {0}")]
    Export(#[from] ExportError),

    #[error("artifact error: {0}")]
    Artifact(#[from] ArtifactError),
}

impl StageError {
    /// One-line remediation shown to the user.
    pub fn hint(&self) -> &'static str {
        match self {
            StageError::Precondition(e) => match e {
                PreconditionError::DocumentNotFound(_) => {
                    "Check the --pdf path, or omit it to use the bundled sample document"
                }
                PreconditionError::MissingArtifact { role, .. } => match role {
                    ArtifactRole::ExtractedText => {
                        "Run once without --skip-extract so the extracted text is saved"
                    }
                    ArtifactRole::StructuredRecords => {
                        "Run once without --skip-llm so testcases.json is generated"
                    }
                    _ => "Rerun the earlier stages without skip flags",
                },
                PreconditionError::EmptyText => {
                    "The document has no machine-readable text; supply a text-based PDF or a .txt file"
                }
                PreconditionError::NoRecords => {
                    "No test cases were found; check that the document contains a test plan"
                }
                PreconditionError::NotSkippable(_) => {
                    "Only extraction and structuring can reuse a previous run's output"
                }
            },
            StageError::Extract(e) => match e {
                ExtractError::NotFound(_) => "Check that the document path exists",
                ExtractError::Unreadable { .. } => {
                    "Make sure the file is a valid PDF or UTF-8 text document"
                }
            },
            StageError::Structure(e) => match e {
                StructureError::MissingCredential => {
                    "Set OPENAI_API_KEY in the environment or a .env file, or pass --api-key"
                }
                StructureError::InvalidCredential(_) => {
                    "Check OPENAI_API_KEY; keys are managed at https://platform.openai.com/api-keys"
                }
                StructureError::QuotaExhausted(_) => {
                    "Add billing or credits at https://platform.openai.com/account/billing"
                }
                StructureError::RateLimited(_) => {
                    "Wait a bit, then rerun with --skip-extract to reuse the extracted text"
                }
                StructureError::MalformedResponse(_) => {
                    "Rerun, or try a different --model; the reply was not the expected JSON"
                }
                StructureError::Provider(_) => {
                    "Check the provider status and the --base-url and --model settings"
                }
            },
            StageError::Export(_) => {
                "The scored test cases could not be serialized; rerun to regenerate them"
            }
            StageError::Artifact(e) => match e {
                ArtifactError::Parse { .. } => {
                    "The stored test case file is corrupt; rerun without the skip flag to regenerate it"
                }
                _ => "Check that the data directory is writable and has free space",
            },
        }
    }
}
