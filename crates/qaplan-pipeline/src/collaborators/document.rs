//! Text extraction from PDF and plain text documents.

use std::fs;
use std::path::Path;

use async_trait::async_trait;
use lopdf::Document;
use tracing::{debug, warn};

use super::Extractor;
use crate::error::ExtractError;

/// Separator written after every PDF page.
const PAGE_SEPARATOR_WIDTH: usize = 80;

/// Extracts `.pdf` files page by page with `lopdf`; any other file is read
/// as UTF-8 text.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentExtractor;

impl DocumentExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Extractor for DocumentExtractor {
    async fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        if !path.is_file() {
            return Err(ExtractError::NotFound(path.to_path_buf()));
        }

        let owned = path.to_path_buf();
        tokio::task::spawn_blocking(move || extract_blocking(&owned))
            .await
            .map_err(|e| ExtractError::Unreadable {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

fn unreadable(path: &Path, message: impl ToString) -> ExtractError {
    ExtractError::Unreadable {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

fn extract_blocking(path: &Path) -> Result<String, ExtractError> {
    if is_pdf(path) {
        extract_pdf(path)
    } else {
        fs::read_to_string(path).map_err(|e| unreadable(path, e))
    }
}

fn extract_pdf(path: &Path) -> Result<String, ExtractError> {
    let document = Document::load(path).map_err(|e| unreadable(path, e))?;
    let pages = document.get_pages();
    debug!(path = %path.display(), pages = pages.len(), "Loaded PDF");

    let separator = "=".repeat(PAGE_SEPARATOR_WIDTH);
    let mut text = String::new();
    for page_number in pages.keys() {
        match document.extract_text(&[*page_number]) {
            Ok(page_text) if !page_text.trim().is_empty() => {
                text.push_str(page_text.trim_end());
                text.push_str("\n\n");
                text.push_str(&separator);
                text.push_str("\n\n");
            }
            Ok(_) => debug!(page = page_number, "Page has no text layer"),
            Err(e) => warn!(page = page_number, error = %e, "Skipping unreadable page"),
        }
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_plain_text_passthrough() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.txt");
        fs::write(&path, "TC-001: Login works\nPriority: HIGH\n").unwrap();

        let text = DocumentExtractor::new().extract(&path).await.unwrap();
        assert!(text.contains("TC-001"));
    }

    #[tokio::test]
    async fn test_missing_document_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = DocumentExtractor::new()
            .extract(&dir.path().join("missing.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_corrupt_pdf_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.PDF");
        fs::write(&path, b"definitely not a pdf").unwrap();

        let err = DocumentExtractor::new().extract(&path).await.unwrap_err();
        assert!(matches!(err, ExtractError::Unreadable { .. }));
    }

    #[tokio::test]
    async fn test_empty_text_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        fs::write(&path, "").unwrap();

        let text = DocumentExtractor::new().extract(&path).await.unwrap();
        assert!(text.is_empty());
    }

    #[test]
    fn test_is_pdf() {
        assert!(is_pdf(Path::new("a/b/plan.pdf")));
        assert!(is_pdf(Path::new("PLAN.Pdf")));
        assert!(!is_pdf(Path::new("plan.txt")));
        assert!(!is_pdf(Path::new("plan")));
    }
}
