//! External collaborators of the pipeline.
//!
//! The orchestrator only sees these traits; concrete services are injected
//! when the [`Pipeline`](crate::Pipeline) is built, so tests can substitute
//! deterministic stand-ins (see [`crate::fakes`]).

pub mod document;
pub mod export;
pub mod openai;

use std::path::Path;

use async_trait::async_trait;
use qaplan_core::{ExportError, ExportMetadata, TestCase};

use crate::config::LlmSettings;
use crate::error::{ExtractError, StructureError};

pub use document::DocumentExtractor;
pub use export::DocumentExporter;
pub use openai::OpenAiStructurer;

/// Document -> raw text.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Extract all machine-readable text. An empty string is a valid result.
    async fn extract(&self, path: &Path) -> Result<String, ExtractError>;
}

/// Raw text -> test case records.
#[async_trait]
pub trait Structurer: Send + Sync {
    /// Ask the language model for records matching the extraction schema.
    ///
    /// May block on provider latency; retries, if any, happen in here.
    async fn structure(
        &self,
        text: &str,
        settings: &LlmSettings,
    ) -> Result<Vec<TestCase>, StructureError>;
}

/// Serialized export payloads plus summary metadata.
#[derive(Debug, Clone)]
pub struct ExportBundle {
    pub json: Vec<u8>,
    pub yaml: Vec<u8>,
    pub metadata: ExportMetadata,
}

/// Scored records -> JSON and YAML.
#[async_trait]
pub trait Exporter: Send + Sync {
    async fn export(&self, records: &[TestCase]) -> Result<ExportBundle, ExportError>;
}
