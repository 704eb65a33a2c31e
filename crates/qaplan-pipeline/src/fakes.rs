//! Deterministic collaborators (testing only)
//!
//! Provides `StaticExtractor`, `ScriptedStructurer` and `RecordingExporter`,
//! which satisfy the collaborator traits without touching documents or the
//! network. Each counts its calls so tests can assert which stages ran, and
//! each can be built to fail so every stage's error path is reachable.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use qaplan_core::{ExportError, TestCase};

use crate::collaborators::{DocumentExporter, ExportBundle, Exporter, Extractor, Structurer};
use crate::config::LlmSettings;
use crate::error::{ExtractError, StructureError};

// ---------------------------------------------------------------------------
// StaticExtractor
// ---------------------------------------------------------------------------

/// Returns fixed text for any path that exists.
#[derive(Debug, Default)]
pub struct StaticExtractor {
    text: String,
    unreadable: Option<String>,
    calls: AtomicUsize,
}

impl StaticExtractor {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            unreadable: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Reports every existing path as unreadable with `message`.
    pub fn unreadable(message: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            unreadable: Some(message.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Extractor for StaticExtractor {
    async fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !path.exists() {
            return Err(ExtractError::NotFound(path.to_path_buf()));
        }
        if let Some(message) = &self.unreadable {
            return Err(ExtractError::Unreadable {
                path: path.to_path_buf(),
                message: message.clone(),
            });
        }
        Ok(self.text.clone())
    }
}

// ---------------------------------------------------------------------------
// ScriptedStructurer
// ---------------------------------------------------------------------------

/// Returns the same records, or the same error, on every call.
#[derive(Debug)]
pub struct ScriptedStructurer {
    reply: Result<Vec<TestCase>, StructureError>,
    calls: AtomicUsize,
    last_model: Mutex<Option<String>>,
}

impl ScriptedStructurer {
    pub fn returning(records: Vec<TestCase>) -> Self {
        Self {
            reply: Ok(records),
            calls: AtomicUsize::new(0),
            last_model: Mutex::new(None),
        }
    }

    pub fn failing(err: StructureError) -> Self {
        Self {
            reply: Err(err),
            calls: AtomicUsize::new(0),
            last_model: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Model id passed on the most recent call.
    pub fn last_model(&self) -> Option<String> {
        self.last_model.lock().unwrap().clone()
    }
}

#[async_trait]
impl Structurer for ScriptedStructurer {
    async fn structure(
        &self,
        _text: &str,
        settings: &LlmSettings,
    ) -> Result<Vec<TestCase>, StructureError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_model.lock().unwrap() = Some(settings.model.clone());
        self.reply.clone()
    }
}

// ---------------------------------------------------------------------------
// RecordingExporter
// ---------------------------------------------------------------------------

/// Delegates to [`DocumentExporter`] and keeps what it was given.
#[derive(Debug, Default)]
pub struct RecordingExporter {
    inner: DocumentExporter,
    failure: Option<String>,
    calls: AtomicUsize,
    received: Mutex<Vec<TestCase>>,
}

impl RecordingExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records its input, then fails with a JSON serialization error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Records passed on the most recent call.
    pub fn received(&self) -> Vec<TestCase> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl Exporter for RecordingExporter {
    async fn export(&self, records: &[TestCase]) -> Result<ExportBundle, ExportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.received.lock().unwrap() = records.to_vec();
        if let Some(message) = &self.failure {
            return Err(ExportError::Json(serde::ser::Error::custom(message)));
        }
        self.inner.export(records).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_structurer_repeats_reply() {
        let fake = ScriptedStructurer::failing(StructureError::RateLimited("429".into()));
        let settings = LlmSettings::new("m1", None);
        for _ in 0..2 {
            let err = fake.structure("text", &settings).await.unwrap_err();
            assert!(matches!(err, StructureError::RateLimited(_)));
        }
        assert_eq!(fake.calls(), 2);
        assert_eq!(fake.last_model().as_deref(), Some("m1"));
    }

    #[tokio::test]
    async fn test_static_extractor_checks_path() {
        let fake = StaticExtractor::new("TC-001");
        let err = fake
            .extract(Path::new("/nonexistent/plan.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::NotFound(_)));
        assert_eq!(fake.calls(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_extractor() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let fake = StaticExtractor::unreadable("encrypted");
        let err = fake.extract(file.path()).await.unwrap_err();
        assert!(matches!(err, ExtractError::Unreadable { ref message, .. } if message == "encrypted"));
    }

    #[tokio::test]
    async fn test_failing_exporter_still_records_input() {
        let fake = RecordingExporter::failing("unsupported value");
        let records = vec![TestCase::new("TC-001", "Login")];
        let err = fake.export(&records).await.unwrap_err();
        assert!(matches!(err, ExportError::Json(_)));
        assert!(err.to_string().contains("unsupported value"));
        assert_eq!(fake.calls(), 1);
        assert_eq!(fake.received(), records);
    }
}
