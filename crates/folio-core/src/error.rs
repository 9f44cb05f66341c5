//! Fatal error type for folio pipelines.
//!
//! Only conditions that stop a whole run are errors. Per-chapter and
//! per-figure failures are recovered where they happen and never surface
//! here.

use std::fmt;

/// Fatal error types for corpus processing.
#[derive(Debug, Clone, PartialEq)]
pub enum CorpusError {
    /// No chapter-heading cluster could be detected in the input text.
    NoTocCluster,
    /// I/O error reading the source or writing output.
    Io(String),
    /// The source PDF could not be opened or interpreted.
    Pdf(String),
    /// The caller supplied input that cannot be processed.
    InvalidInput(String),
}

impl fmt::Display for CorpusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorpusError::NoTocCluster => write!(f, "no valid TOC sequence found"),
            CorpusError::Io(msg) => write!(f, "I/O error: {msg}"),
            CorpusError::Pdf(msg) => write!(f, "PDF error: {msg}"),
            CorpusError::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
        }
    }
}

impl std::error::Error for CorpusError {}

impl From<std::io::Error> for CorpusError {
    fn from(err: std::io::Error) -> Self {
        CorpusError::Io(err.to_string())
    }
}
