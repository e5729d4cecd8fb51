//! Text Extractor: turns an uploaded PDF or DOCX into plain text.
//!
//! Pages and paragraphs are joined with a line break in document order. A unit that cannot be
//! decoded is skipped; only a document that cannot be opened at all is an error.

pub mod docx;
pub mod pdf;

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ExtractError {
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Corrupt document: {0}")]
    CorruptDocument(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    /// Legacy binary Word. Recognised so it can be rejected explicitly.
    Doc,
}

impl DocumentFormat {
    /// Resolves a format hint: an extension ("pdf", ".docx"), a filename, or a MIME type.
    pub fn from_hint(hint: &str) -> Result<Self, ExtractError> {
        let hint = hint.trim().to_lowercase();
        let by_mime = match hint.as_str() {
            "application/pdf" => Some(DocumentFormat::Pdf),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(DocumentFormat::Docx)
            }
            "application/msword" => Some(DocumentFormat::Doc),
            _ => None,
        };
        if let Some(format) = by_mime {
            return Ok(format);
        }

        let ext = Path::new(&hint)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_else(|| hint.trim_start_matches('.'));

        match ext {
            "pdf" => Ok(DocumentFormat::Pdf),
            "docx" => Ok(DocumentFormat::Docx),
            "doc" => Ok(DocumentFormat::Doc),
            other => Err(ExtractError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
            DocumentFormat::Doc => "doc",
        };
        f.write_str(name)
    }
}

/// Extracts plain text from a document held in memory.
pub fn extract(bytes: &[u8], format: DocumentFormat) -> Result<String, ExtractError> {
    match format {
        DocumentFormat::Pdf => pdf::extract_pdf(bytes),
        DocumentFormat::Docx => docx::extract_docx(bytes),
        DocumentFormat::Doc => Err(ExtractError::UnsupportedFormat(
            "doc (legacy Word documents are not supported, convert to docx)".to_string(),
        )),
    }
}

/// Joins decoded units with single line breaks, dropping units that failed to decode.
pub(crate) fn join_units<I>(units: I) -> String
where
    I: IntoIterator<Item = Option<String>>,
{
    units.into_iter().flatten().collect::<Vec<_>>().join("\n")
}
