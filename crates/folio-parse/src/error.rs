//! Error types for the parsing and interpreter layers.
//!
//! Uses [`thiserror`] for derivation. [`BackendError`] converts into the
//! fatal [`CorpusError`] used by the pipelines.

use folio_core::CorpusError;
use thiserror::Error;

/// Error type for PDF parsing backend operations.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Error from PDF parsing (structure, syntax, object resolution).
    #[error("PDF parse error: {0}")]
    Parse(String),

    /// Error reading PDF data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error resolving font or encoding information.
    #[error("font error: {0}")]
    Font(String),

    /// Error during content stream interpretation.
    #[error("interpreter error: {0}")]
    Interpreter(String),

    /// A core library error.
    #[error(transparent)]
    Core(#[from] CorpusError),
}

impl From<BackendError> for CorpusError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Io(e) => CorpusError::Io(e.to_string()),
            BackendError::Core(e) => e,
            other => CorpusError::Pdf(other.to_string()),
        }
    }
}
