use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("only PDF resumes can be analysed, got '{0}'")]
    Unsupported(String),

    #[error("failed to parse PDF content: {0}")]
    Parse(String),

    #[error("extraction task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Turns an uploaded resume document into plain text.
#[async_trait]
pub trait ResumeTextExtractor: Send + Sync {
    async fn extract_text(&self, bytes: Bytes, file_name: &str) -> Result<String, ExtractError>;
}

pub struct PdfTextExtractor;

fn is_pdf(file_name: &str, bytes: &[u8]) -> bool {
    file_name.to_ascii_lowercase().ends_with(".pdf") || bytes.starts_with(b"%PDF")
}

#[async_trait]
impl ResumeTextExtractor for PdfTextExtractor {
    async fn extract_text(&self, bytes: Bytes, file_name: &str) -> Result<String, ExtractError> {
        if !is_pdf(file_name, &bytes) {
            return Err(ExtractError::Unsupported(file_name.to_string()));
        }
        // pdf-extract is synchronous and CPU bound
        let text = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem(&bytes).map_err(|e| ExtractError::Parse(e.to_string()))
        })
        .await??;
        debug!(chars = text.len(), "resume text extracted");
        Ok(text.trim().to_string())
    }
}

#[cfg(test)]
mod extract_tests {
    use super::*;

    #[test]
    fn pdf_detection_by_name_or_magic() {
        assert!(is_pdf("CV.PDF", b""));
        assert!(is_pdf("resume", b"%PDF-1.7\n"));
        assert!(!is_pdf("resume.docx", b"PK\x03\x04"));
    }

    #[tokio::test]
    async fn word_documents_are_unsupported() {
        let err = PdfTextExtractor
            .extract_text(Bytes::from_static(b"PK\x03\x04"), "resume.docx")
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Unsupported(_)));
    }

    #[tokio::test]
    async fn garbage_pdf_fails_to_parse() {
        let err = PdfTextExtractor
            .extract_text(Bytes::from_static(b"%PDF-1.4 not really"), "cv.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Parse(_) | ExtractError::Join(_)));
    }
}
