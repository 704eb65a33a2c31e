//! Persisted pipeline artifacts.
//!
//! Every run works inside one data directory:
//!
//! ```text
//! <root>/raw_docs/sample_qa_doc.txt        generated sample document
//! <root>/intermediate/ocr_text.txt         extracted text
//! <root>/outputs/testcases.json            structured records (pre-score)
//! <root>/outputs/testcases_scored.json     scored records (pre-export)
//! <root>/outputs/testcases_final.json      export
//! <root>/outputs/testcases_final.yaml      export
//! ```
//!
//! Concurrent runs must use distinct roots, otherwise one run's artifacts
//! become valid reuse sources for another.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use qaplan_core::{TestCase, TestCaseSet};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::error::ArtifactError;

/// What an artifact is for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactRole {
    SourceDocument,
    ExtractedText,
    StructuredRecords,
    ScoredRecords,
    ExportJson,
    ExportYaml,
}

impl ArtifactRole {
    /// Location relative to the store root.
    ///
    /// For `SourceDocument` this is where the generated sample lives; a
    /// user-supplied document stays wherever it is.
    pub fn relative_path(&self) -> &'static str {
        match self {
            ArtifactRole::SourceDocument => "raw_docs/sample_qa_doc.txt",
            ArtifactRole::ExtractedText => "intermediate/ocr_text.txt",
            ArtifactRole::StructuredRecords => "outputs/testcases.json",
            ArtifactRole::ScoredRecords => "outputs/testcases_scored.json",
            ArtifactRole::ExportJson => "outputs/testcases_final.json",
            ArtifactRole::ExportYaml => "outputs/testcases_final.yaml",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ArtifactRole::SourceDocument => "source document",
            ArtifactRole::ExtractedText => "extracted text",
            ArtifactRole::StructuredRecords => "structured test cases",
            ArtifactRole::ScoredRecords => "scored test cases",
            ArtifactRole::ExportJson => "final JSON",
            ArtifactRole::ExportYaml => "final YAML",
        }
    }
}

impl fmt::Display for ArtifactRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Reference to an artifact a run produced or reused.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArtifactRef {
    pub role: ArtifactRole,
    pub path: PathBuf,

    /// Hex SHA-256 of the content.
    pub sha256: String,

    pub size_bytes: u64,
}

impl ArtifactRef {
    /// Describe `data` stored at `path`.
    pub fn from_bytes(role: ArtifactRole, path: impl Into<PathBuf>, data: &[u8]) -> Self {
        Self {
            role,
            path: path.into(),
            sha256: hex::encode(Sha256::digest(data)),
            size_bytes: data.len() as u64,
        }
    }

    /// Read and digest the file at `path`.
    pub fn from_file(role: ArtifactRole, path: &Path) -> Result<Self, ArtifactError> {
        let data = read_file(path)?;
        Ok(Self::from_bytes(role, path, &data))
    }

    /// Size in KiB, for display.
    pub fn size_kib(&self) -> f64 {
        self.size_bytes as f64 / 1024.0
    }
}

#[derive(Serialize)]
struct TestCaseSetRef<'a> {
    test_cases: &'a [TestCase],
}

/// Filesystem-backed artifact directory for one run.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Create a store rooted at `root`. Directories are created on write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, role: ArtifactRole) -> PathBuf {
        self.root.join(role.relative_path())
    }

    pub fn exists(&self, role: ArtifactRole) -> bool {
        self.path(role).is_file()
    }

    pub fn read(&self, role: ArtifactRole) -> Result<Vec<u8>, ArtifactError> {
        read_file(&self.path(role))
    }

    pub fn read_text(&self, role: ArtifactRole) -> Result<String, ArtifactError> {
        let path = self.path(role);
        fs::read_to_string(&path).map_err(|source| ArtifactError::Read { path, source })
    }

    /// Atomically replace the artifact with `data`.
    pub fn write(&self, role: ArtifactRole, data: &[u8]) -> Result<ArtifactRef, ArtifactError> {
        let path = self.path(role);
        let dir = path.parent().unwrap_or(&self.root);
        let write_err = |source| ArtifactError::Write {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(dir).map_err(write_err)?;

        // Write to a temp file in the same directory, then rename over.
        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(data).map_err(write_err)?;
        tmp.persist(&path).map_err(|e| write_err(e.error))?;

        Ok(ArtifactRef::from_bytes(role, path, data))
    }

    /// Load a `{ "test_cases": [...] }` artifact.
    pub fn read_records(&self, role: ArtifactRole) -> Result<Vec<TestCase>, ArtifactError> {
        let path = self.path(role);
        let data = read_file(&path)?;
        let set: TestCaseSet =
            serde_json::from_slice(&data).map_err(|source| ArtifactError::Parse { path, source })?;
        Ok(set.test_cases)
    }

    /// Store records as pretty-printed `{ "test_cases": [...] }`.
    pub fn write_records(
        &self,
        role: ArtifactRole,
        records: &[TestCase],
    ) -> Result<ArtifactRef, ArtifactError> {
        let data = serde_json::to_vec_pretty(&TestCaseSetRef {
            test_cases: records,
        })
        .map_err(ArtifactError::Encode)?;
        self.write(role, &data)
    }

    /// Reference to an artifact already on disk.
    pub fn reference(&self, role: ArtifactRole) -> Result<ArtifactRef, ArtifactError> {
        ArtifactRef::from_file(role, &self.path(role))
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    fs::read(path).map_err(|source| ArtifactError::Read {
        path: path.to_path_buf(),
        source,
    })
}
