use std::fmt;
use std::io;
use std::path::PathBuf;

use serde::Serialize;

/// Errors produced while validating and applying header edits.
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    /// Malformed numeric input such as NaN. Always fatal to the call.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation parameters that fail structural rules. Fatal to the whole
    /// invocation and raised before any file is opened.
    #[error("illegal input data: {0}")]
    IllegalInputData(String),

    /// A record-format invariant would be violated.
    #[error("validation failed: {0}")]
    ValidationFailure(String),

    #[error("keyword not found: {0}")]
    KeywordNotFound(String),

    #[error("index {index} out of range (header has {len} records)")]
    IndexOutOfRange { index: usize, len: usize },

    /// The header or one of its values could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, EditError>;

impl EditError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        EditError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EditError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            EditError::IllegalInputData(_) => ErrorKind::IllegalInputData,
            EditError::ValidationFailure(_) => ErrorKind::ValidationFailure,
            EditError::KeywordNotFound(_) => ErrorKind::KeywordNotFound,
            EditError::IndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
            EditError::Parse(_) => ErrorKind::Parse,
            EditError::Io { .. } => ErrorKind::Io,
        }
    }

    /// Absence errors are the ones a `skip_if_missing` switch may suppress.
    pub fn is_absence(&self) -> bool {
        matches!(
            self,
            EditError::KeywordNotFound(_) | EditError::IndexOutOfRange { .. }
        )
    }
}

/// Flat error classification used in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidArgument,
    IllegalInputData,
    ValidationFailure,
    KeywordNotFound,
    IndexOutOfRange,
    Parse,
    Io,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::IllegalInputData => "illegal_input_data",
            ErrorKind::ValidationFailure => "validation_failure",
            ErrorKind::KeywordNotFound => "keyword_not_found",
            ErrorKind::IndexOutOfRange => "index_out_of_range",
            ErrorKind::Parse => "parse",
            ErrorKind::Io => "io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absence_errors() {
        assert!(EditError::KeywordNotFound("OBJECT".into()).is_absence());
        assert!(EditError::IndexOutOfRange { index: 9, len: 3 }.is_absence());
        assert!(!EditError::ValidationFailure("x".into()).is_absence());
    }

    #[test]
    fn test_error_kind_names() {
        let err = EditError::io("a.fits", io::Error::other("disk full"));
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.kind().to_string(), "io");
        assert!(err.to_string().contains("a.fits"));
        assert_eq!(
            EditError::IndexOutOfRange { index: 4, len: 2 }.to_string(),
            "index 4 out of range (header has 2 records)"
        );
    }
}
