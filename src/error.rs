//! Error types for the tagcast pipeline.

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, TagcastError>;

/// Errors that can occur while loading, resampling, forecasting or writing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TagcastError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Timestamp-related error.
    #[error("timestamp error: {0}")]
    TimestampError(String),

    /// A required input column is absent from the header.
    #[error("missing required column `{column}`")]
    MissingColumn { column: String },

    /// A raw row failed validation. `row` is the 1-based line in the source.
    #[error("invalid row {row}, column `{column}`: {reason}")]
    InvalidRow {
        row: usize,
        column: String,
        reason: String,
    },

    /// The observed weeks span more than the resampler will allocate.
    #[error("calendar spans {weeks} weeks, more than the {max} allowed")]
    CalendarTooLong { weeks: usize, max: usize },

    /// Filesystem failure.
    #[error("i/o error: {0}")]
    Io(String),

    /// CSV framing failure (unbalanced quotes, ragged rows, ...).
    #[error("csv error: {0}")]
    Csv(String),

    /// Configuration could not be loaded or is inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// Computation error (e.g., numerical issues).
    #[error("computation error: {0}")]
    ComputationError(String),
}

impl From<std::io::Error> for TagcastError {
    fn from(err: std::io::Error) -> Self {
        TagcastError::Io(err.to_string())
    }
}

impl From<csv::Error> for TagcastError {
    fn from(err: csv::Error) -> Self {
        match err.kind() {
            csv::ErrorKind::Io(io) => TagcastError::Io(io.to_string()),
            _ => TagcastError::Csv(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = TagcastError::EmptyData;
        assert_eq!(err.to_string(), "empty input data");

        let err = TagcastError::InsufficientData { needed: 10, got: 5 };
        assert_eq!(
            err.to_string(),
            "insufficient data: need at least 10, got 5"
        );

        let err = TagcastError::MissingColumn {
            column: "question_count".to_string(),
        };
        assert_eq!(err.to_string(), "missing required column `question_count`");

        let err = TagcastError::InvalidRow {
            row: 7,
            column: "question_count".to_string(),
            reason: "`-3` is not a non-negative integer".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid row 7, column `question_count`: `-3` is not a non-negative integer"
        );

        let err = TagcastError::CalendarTooLong {
            weeks: 521_723,
            max: 10_400,
        };
        assert_eq!(
            err.to_string(),
            "calendar spans 521723 weeks, more than the 10400 allowed"
        );
    }

    #[test]
    fn io_errors_convert_to_strings() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err: TagcastError = io.into();
        assert_eq!(err, TagcastError::Io("no such file".to_string()));
    }

    #[test]
    fn errors_are_clonable_and_comparable() {
        let err1 = TagcastError::EmptyData;
        let err2 = err1.clone();
        assert_eq!(err1, err2);
    }
}
