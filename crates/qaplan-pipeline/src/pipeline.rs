//! Pipeline orchestration.
//!
//! Stages run strictly in order. The first failure ends the run and is
//! recorded as the report's single error; nothing is retried or rolled back.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use qaplan_core::{rank, TestCase};
use tracing::{info, info_span, warn, Instrument};

use crate::artifacts::{ArtifactRef, ArtifactRole, ArtifactStore};
use crate::collaborators::{
    DocumentExporter, DocumentExtractor, Exporter, Extractor, OpenAiStructurer, Structurer,
};
use crate::config::LlmSettings;
use crate::error::{PreconditionError, StageError};
use crate::report::{RunLog, RunReport, StageOutcome};
use crate::sample;
use crate::stage::Stage;

/// Where the input document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    /// A user-supplied document, used in place.
    Path(PathBuf),

    /// The bundled sample, written into the store. With `reuse_existing`
    /// an already-written sample is left as is.
    Sample { reuse_existing: bool },
}

impl Default for DocumentSource {
    fn default() -> Self {
        DocumentSource::Sample {
            reuse_existing: false,
        }
    }
}

/// Options for one run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub source: DocumentSource,

    /// Reuse the stored extracted text instead of running Extract.
    pub reuse_extraction: bool,

    /// Reuse the stored structured records instead of running Structure.
    pub reuse_structure: bool,

    pub llm: LlmSettings,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = DocumentSource::Path(path.into());
        self
    }

    pub fn with_sample(mut self, reuse_existing: bool) -> Self {
        self.source = DocumentSource::Sample { reuse_existing };
        self
    }

    pub fn reuse_extraction(mut self, reuse: bool) -> Self {
        self.reuse_extraction = reuse;
        self
    }

    pub fn reuse_structure(mut self, reuse: bool) -> Self {
        self.reuse_structure = reuse;
        self
    }

    pub fn with_llm(mut self, llm: LlmSettings) -> Self {
        self.llm = llm;
        self
    }
}

type StageOutput<T> = Result<T, StageError>;

/// Four-stage orchestrator over injected collaborators.
#[derive(Clone)]
pub struct Pipeline {
    store: ArtifactStore,
    extractor: Arc<dyn Extractor>,
    structurer: Arc<dyn Structurer>,
    exporter: Arc<dyn Exporter>,
}

impl Pipeline {
    pub fn new(
        store: ArtifactStore,
        extractor: Arc<dyn Extractor>,
        structurer: Arc<dyn Structurer>,
        exporter: Arc<dyn Exporter>,
    ) -> Self {
        Self {
            store,
            extractor,
            structurer,
            exporter,
        }
    }

    /// Pipeline with the PDF/text extractor, OpenAI structurer and file exporter.
    pub fn with_defaults(store: ArtifactStore) -> Self {
        Self::new(
            store,
            Arc::new(DocumentExtractor::new()),
            Arc::new(OpenAiStructurer::new()),
            Arc::new(DocumentExporter::new()),
        )
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Execute all stages and report the outcome.
    ///
    /// Never returns an error: failures are captured in the report.
    pub async fn run(&self, options: &RunOptions) -> RunReport {
        let mut log = RunLog::start();
        let span = info_span!("pipeline", run_id = %log.run_id());

        let outcome = self
            .execute(options, &mut log)
            .instrument(span.clone())
            .await;

        span.in_scope(|| match outcome {
            Ok(()) => log.finish_ok(),
            Err((stage, err)) => log.finish_err(stage, &err),
        })
    }

    async fn execute(&self, options: &RunOptions, log: &mut RunLog) -> Result<(), (Stage, StageError)> {
        info!(root = %self.store.root().display(), "Starting pipeline");

        let text = self
            .extract(options, log)
            .await
            .map_err(|e| (Stage::Extract, e))?;

        let records = self
            .structure(options, &text, log)
            .await
            .map_err(|e| (Stage::Structure, e))?;

        let scored = self.score(records, log).map_err(|e| (Stage::Score, e))?;

        self.export(&scored, log)
            .await
            .map_err(|e| (Stage::Export, e))
    }

    async fn extract(&self, options: &RunOptions, log: &mut RunLog) -> StageOutput<String> {
        let started = Instant::now();

        if options.reuse_extraction {
            let reused = self.reusable_output(Stage::Extract)?;
            info!(stage = %Stage::Extract, "Reusing extracted text");
            let text = self.store.read_text(reused.role)?;
            log.record_artifact(reused);
            log.record_stage(Stage::Extract, StageOutcome::Reused, started);
            return Ok(text);
        }

        let source = self.resolve_source(&options.source)?;
        log.record_artifact(source.clone());

        info!(stage = %Stage::Extract, path = %source.path.display(), "Extracting text");
        let text = self.extractor.extract(&source.path).await?;
        log.record_artifact(
            self.store
                .write(ArtifactRole::ExtractedText, text.as_bytes())?,
        );

        info!(stage = %Stage::Extract, chars = text.len(), "Extracted text");
        log.record_stage(Stage::Extract, StageOutcome::Executed, started);
        Ok(text)
    }

    fn resolve_source(&self, source: &DocumentSource) -> StageOutput<ArtifactRef> {
        match source {
            DocumentSource::Path(path) => {
                if !path.is_file() {
                    return Err(PreconditionError::DocumentNotFound(path.clone()).into());
                }
                Ok(ArtifactRef::from_file(ArtifactRole::SourceDocument, path)?)
            }
            DocumentSource::Sample { reuse_existing } => {
                Ok(sample::materialize(&self.store, *reuse_existing)?)
            }
        }
    }

    async fn structure(
        &self,
        options: &RunOptions,
        text: &str,
        log: &mut RunLog,
    ) -> StageOutput<Vec<TestCase>> {
        let started = Instant::now();

        if options.reuse_structure {
            let reused = self.reusable_output(Stage::Structure)?;
            info!(stage = %Stage::Structure, "Reusing structured test cases");
            let records = self.store.read_records(reused.role)?;
            log.record_artifact(reused);
            log.record_stage(Stage::Structure, StageOutcome::Reused, started);
            return Ok(records);
        }

        if text.trim().is_empty() {
            return Err(PreconditionError::EmptyText.into());
        }

        info!(stage = %Stage::Structure, model = %options.llm.model, "Structuring test cases");
        let records = self.structurer.structure(text, &options.llm).await?;
        log.record_artifact(
            self.store
                .write_records(ArtifactRole::StructuredRecords, &records)?,
        );

        info!(stage = %Stage::Structure, records = records.len(), "Structured test cases");
        log.record_stage(Stage::Structure, StageOutcome::Executed, started);
        Ok(records)
    }

    fn score(&self, records: Vec<TestCase>, log: &mut RunLog) -> StageOutput<Vec<TestCase>> {
        let started = Instant::now();

        if records.is_empty() {
            return Err(PreconditionError::NoRecords.into());
        }

        let scored = rank(records);
        log.record_artifact(
            self.store
                .write_records(ArtifactRole::ScoredRecords, &scored)?,
        );

        if let Some(top) = scored.first() {
            info!(
                stage = %Stage::Score,
                records = scored.len(),
                top = %top.id,
                top_score = top.risk_score().unwrap_or_default(),
                "Scored test cases"
            );
        }
        log.record_stage(Stage::Score, StageOutcome::Executed, started);
        Ok(scored)
    }

    async fn export(&self, records: &[TestCase], log: &mut RunLog) -> StageOutput<()> {
        let started = Instant::now();

        let bundle = self.exporter.export(records).await?;
        log.record_artifact(self.store.write(ArtifactRole::ExportJson, &bundle.json)?);
        log.record_artifact(self.store.write(ArtifactRole::ExportYaml, &bundle.yaml)?);

        info!(
            stage = %Stage::Export,
            records = bundle.metadata.total_test_cases,
            "Exported test cases"
        );
        log.set_summary(bundle.metadata);
        log.record_stage(Stage::Export, StageOutcome::Executed, started);
        Ok(())
    }

    /// The stored output that stands in for a skipped `stage`.
    ///
    /// Only skippable stages with a single output qualify, and that output
    /// must already be on disk.
    fn reusable_output(&self, stage: Stage) -> StageOutput<ArtifactRef> {
        let contract = stage.contract();
        let role = match contract.produces {
            [role] if contract.skippable => *role,
            _ => return Err(PreconditionError::NotSkippable(stage).into()),
        };
        if !self.store.exists(role) {
            let path = self.store.path(role);
            warn!(%stage, %role, path = %path.display(), "Requested reuse but artifact is missing");
            return Err(PreconditionError::MissingArtifact { role, path }.into());
        }
        Ok(self.store.reference(role)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{RecordingExporter, ScriptedStructurer, StaticExtractor};
    use tempfile::TempDir;

    fn pipeline(dir: &TempDir) -> Pipeline {
        Pipeline::new(
            ArtifactStore::new(dir.path()),
            Arc::new(StaticExtractor::new("plan")),
            Arc::new(ScriptedStructurer::returning(Vec::new())),
            Arc::new(RecordingExporter::new()),
        )
    }

    #[test]
    fn test_reusable_output_follows_stage_contract() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        pipeline
            .store()
            .write(ArtifactRole::ExtractedText, b"saved text")
            .unwrap();

        let reused = pipeline.reusable_output(Stage::Extract).unwrap();
        assert_eq!(reused.role, ArtifactRole::ExtractedText);
        assert_eq!(reused.size_bytes, 10);

        for stage in [Stage::Score, Stage::Export] {
            let err = pipeline.reusable_output(stage).unwrap_err();
            assert!(matches!(
                err,
                StageError::Precondition(PreconditionError::NotSkippable(s)) if s == stage
            ));
        }
    }

    #[test]
    fn test_reusable_output_requires_artifact_on_disk() {
        let dir = TempDir::new().unwrap();
        let err = pipeline(&dir).reusable_output(Stage::Structure).unwrap_err();
        assert!(matches!(
            err,
            StageError::Precondition(PreconditionError::MissingArtifact {
                role: ArtifactRole::StructuredRecords,
                ..
            })
        ));
    }

    #[test]
    fn test_default_options_use_fresh_sample() {
        let opts = RunOptions::new();
        assert_eq!(
            opts.source,
            DocumentSource::Sample {
                reuse_existing: false
            }
        );
        assert!(!opts.reuse_extraction);
        assert!(!opts.reuse_structure);
    }

    #[test]
    fn test_option_builders() {
        let opts = RunOptions::new()
            .with_document("plan.pdf")
            .reuse_extraction(true)
            .reuse_structure(true)
            .with_llm(LlmSettings::new("gpt-4o", None));
        assert_eq!(opts.source, DocumentSource::Path(PathBuf::from("plan.pdf")));
        assert!(opts.reuse_extraction && opts.reuse_structure);
        assert_eq!(opts.llm.model, "gpt-4o");
    }
}
