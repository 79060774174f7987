//! Application error taxonomy
//!
//! Three caller-visible classes: validation errors (the request itself is
//! wrong), not-found errors (unsupported extension, artifact not yet
//! available) and processing errors (an internal fault; the request aborts
//! with no partial output).

use thiserror::Error;

use crate::document::DocumentError;
use crate::storage::StorageError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Caller-visible error class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request is malformed; report to the client, nothing was produced
    Validation,
    /// The requested artifact or format does not exist (yet)
    NotFound,
    /// An internal fault; the whole request aborted
    Processing,
}

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),
}

impl AppError {
    /// Map this error onto its caller-visible class
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Processing(_) => ErrorKind::Processing,
            AppError::Storage(StorageError::ObjectNotFound(_)) => ErrorKind::NotFound,
            AppError::Storage(_) => ErrorKind::Processing,
            AppError::Document(DocumentError::UnsupportedFormat(_)) => ErrorKind::NotFound,
            AppError::Document(_) => ErrorKind::Processing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_expected_classes() {
        assert_eq!(
            AppError::Validation("bad mapping".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            AppError::NotFound("no such artifact".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            AppError::Processing("page scan failed".into()).kind(),
            ErrorKind::Processing
        );
        assert_eq!(
            AppError::Storage(StorageError::ObjectNotFound("jobs/x.pdf".into())).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            AppError::Document(DocumentError::ParseError("truncated xref".into())).kind(),
            ErrorKind::Processing
        );
    }
}
