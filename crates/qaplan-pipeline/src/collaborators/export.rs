use async_trait::async_trait;
use qaplan_core::{ExportDocument, ExportError, TestCase};

use super::{ExportBundle, Exporter};

/// Renders [`ExportDocument`] as pretty JSON and block YAML.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentExporter;

impl DocumentExporter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Exporter for DocumentExporter {
    async fn export(&self, records: &[TestCase]) -> Result<ExportBundle, ExportError> {
        let doc = ExportDocument::new(records.to_vec());
        Ok(ExportBundle {
            json: doc.to_json()?,
            yaml: doc.to_yaml()?,
            metadata: doc.metadata,
        })
    }
}
