//! Decoding raw submissions into plain email text.

use tracing::{debug, warn};

use crate::error::PipelineError;
use crate::pipeline::types::RawSubmission;

/// Upload types the pipeline accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Text,
    Pdf,
}

impl FileKind {
    /// Detect the kind from the filename extension (case-insensitive).
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, extension) = filename.rsplit_once('.')?;
        match extension.to_lowercase().as_str() {
            "txt" => Some(Self::Text),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

/// Decode a submission without stalling the async workers.
///
/// Uploads are decoded on the blocking pool since PDF parsing is
/// CPU-bound and can take a while on large documents.
pub async fn decode(submission: RawSubmission) -> Result<String, PipelineError> {
    match submission {
        RawSubmission::Text(text) => Ok(text),
        upload => tokio::task::spawn_blocking(move || extract_text(upload))
            .await
            .map_err(|e| {
                warn!(error = %e, "Upload decoding task failed");
                PipelineError::InvalidInput("Could not decode the uploaded file".to_string())
            })?,
    }
}

/// Turn a submission into text, or explain why there is none.
pub fn extract_text(submission: RawSubmission) -> Result<String, PipelineError> {
    match submission {
        RawSubmission::Text(text) => Ok(text),
        RawSubmission::File { filename, bytes } => {
            let kind = FileKind::from_filename(&filename).ok_or_else(|| {
                PipelineError::InvalidInput(format!(
                    "Unsupported file type: {filename} (expected .txt or .pdf)"
                ))
            })?;
            debug!(filename = %filename, size = bytes.len(), ?kind, "Decoding upload");

            match kind {
                FileKind::Text => String::from_utf8(bytes).map_err(|_| {
                    PipelineError::InvalidInput(format!("{filename} is not valid UTF-8 text"))
                }),
                FileKind::Pdf => extract_pdf(&filename, &bytes),
            }
        }
    }
}

fn extract_pdf(filename: &str, bytes: &[u8]) -> Result<String, PipelineError> {
    // pdf-extract panics on some malformed documents.
    let outcome = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes));
    match outcome {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => {
            warn!(filename = %filename, error = %e, "PDF text extraction failed");
            Err(PipelineError::InvalidInput(format!(
                "Could not read text from {filename}"
            )))
        }
        Err(_) => {
            warn!(filename = %filename, "PDF text extraction panicked");
            Err(PipelineError::InvalidInput(format!(
                "Could not read text from {filename}"
            )))
        }
    }
}
