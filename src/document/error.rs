//! Document engine error types

use thiserror::Error;

/// Errors raised at the MuPDF boundary
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Page index outside the document
    #[error("Page not found: index {0}")]
    PageNotFound(usize),

    /// Failed to open or parse document bytes
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Annotation table manipulation failed
    #[error("Annotation error: {0}")]
    AnnotationError(String),

    /// Text extraction error
    #[error("Text extraction error: {0}")]
    TextExtractionError(String),

    /// MuPDF context error
    #[error("MuPDF context error: {0}")]
    ContextError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for document operations
pub type DocumentResult<T> = std::result::Result<T, DocumentError>;

impl From<mupdf::Error> for DocumentError {
    fn from(err: mupdf::Error) -> Self {
        DocumentError::ContextError(err.to_string())
    }
}
