//! Document loading: turns a CV or job posting file into plain text.
//!
//! Supported: `.pdf`, `.docx`, `.txt`, `.md`, `.json`. Everything here is
//! blocking I/O; callers on the async runtime go through `spawn_blocking`.

mod docx;

use std::path::Path;

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to extract text from {path}: {message}")]
    Extraction { path: String, message: String },
}

/// Source of document text. The workflow's `load_documents` stage depends on
/// this rather than on the filesystem directly.
pub trait DocumentLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<String, DocumentError>;
}

/// Recognized document kinds, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    PlainText,
    Json,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Result<Self, DocumentError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => Ok(DocumentFormat::Pdf),
            "docx" => Ok(DocumentFormat::Docx),
            "txt" | "md" => Ok(DocumentFormat::PlainText),
            "json" => Ok(DocumentFormat::Json),
            "" => Err(DocumentError::UnsupportedFormat("(no extension)".to_string())),
            other => Err(DocumentError::UnsupportedFormat(format!(".{other}"))),
        }
    }
}

/// Reads documents from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsDocumentLoader;

impl DocumentLoader for FsDocumentLoader {
    fn load(&self, path: &Path) -> Result<String, DocumentError> {
        let shown = path.display().to_string();
        if !path.exists() {
            return Err(DocumentError::NotFound(shown));
        }

        let format = DocumentFormat::from_path(path)?;
        let bytes = std::fs::read(path).map_err(|source| DocumentError::Io {
            path: shown.clone(),
            source,
        })?;

        let text = match format {
            DocumentFormat::Pdf => pdf_extract::extract_text_from_mem(&bytes).map_err(|e| {
                DocumentError::Extraction {
                    path: shown.clone(),
                    message: e.to_string(),
                }
            })?,
            DocumentFormat::Docx => docx::extract_text(&bytes).map_err(|message| {
                DocumentError::Extraction {
                    path: shown.clone(),
                    message,
                }
            })?,
            DocumentFormat::PlainText => {
                String::from_utf8(bytes).map_err(|e| DocumentError::Extraction {
                    path: shown.clone(),
                    message: format!("not valid UTF-8: {e}"),
                })?
            }
            DocumentFormat::Json => {
                // Structured job postings are re-emitted pretty-printed
                let value: serde_json::Value =
                    serde_json::from_slice(&bytes).map_err(|e| DocumentError::Extraction {
                        path: shown.clone(),
                        message: e.to_string(),
                    })?;
                serde_json::to_string_pretty(&value).map_err(|e| DocumentError::Extraction {
                    path: shown.clone(),
                    message: e.to_string(),
                })?
            }
        };

        let text = text.trim().to_string();
        debug!("Loaded {} ({:?}): {} characters", shown, format, text.len());
        Ok(text)
    }
}
