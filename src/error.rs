//! Error types for icefold operations.
//!
//! Provides rich error context for library consumers.

use std::fmt;

/// Main error type for icefold operations.
///
/// Covers dimension mismatches between batches and label vectors, invalid
/// hyperparameters, dataset problems, and I/O or serialization failures from
/// checkpointing and submission output.
///
/// # Examples
///
/// ```
/// use icefold::error::IcefoldError;
///
/// let err = IcefoldError::DimensionMismatch {
///     expected: "1604 labels".to_string(),
///     actual: "1600 labels".to_string(),
/// };
/// assert!(err.to_string().contains("dimension mismatch"));
/// ```
#[derive(Debug)]
pub enum IcefoldError {
    /// Batch/label/feature dimensions don't match for the operation.
    DimensionMismatch {
        /// Expected dimensions description
        expected: String,
        /// Actual dimensions found
        actual: String,
    },

    /// Invalid hyperparameter value provided.
    InvalidHyperparameter {
        /// Parameter name
        param: String,
        /// Provided value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// Dataset is malformed (ragged bands, missing labels, empty file).
    InvalidDataset {
        /// Error description
        message: String,
    },

    /// I/O error (file not found, permission denied, etc.).
    Io(std::io::Error),

    /// Serialization/deserialization error.
    Serialization(String),

    /// Generic error with string message.
    Other(String),
}

impl fmt::Display for IcefoldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IcefoldError::DimensionMismatch { expected, actual } => {
                write!(f, "dimension mismatch: expected {expected}, got {actual}")
            }
            IcefoldError::InvalidHyperparameter {
                param,
                value,
                constraint,
            } => {
                write!(
                    f,
                    "invalid hyperparameter {param}={value}: must satisfy {constraint}"
                )
            }
            IcefoldError::InvalidDataset { message } => {
                write!(f, "invalid dataset: {message}")
            }
            IcefoldError::Io(e) => write!(f, "I/O error: {e}"),
            IcefoldError::Serialization(msg) => write!(f, "serialization error: {msg}"),
            IcefoldError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for IcefoldError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IcefoldError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for IcefoldError {
    fn from(e: std::io::Error) -> Self {
        IcefoldError::Io(e)
    }
}

impl From<serde_json::Error> for IcefoldError {
    fn from(e: serde_json::Error) -> Self {
        IcefoldError::Serialization(e.to_string())
    }
}

impl From<String> for IcefoldError {
    fn from(msg: String) -> Self {
        IcefoldError::Other(msg)
    }
}

impl From<&str> for IcefoldError {
    fn from(msg: &str) -> Self {
        IcefoldError::Other(msg.to_string())
    }
}

/// Result type alias for icefold operations.
pub type Result<T> = std::result::Result<T, IcefoldError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_display() {
        let err = IcefoldError::DimensionMismatch {
            expected: "100 samples".to_string(),
            actual: "90 samples".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("100 samples"));
        assert!(msg.contains("90 samples"));
    }

    #[test]
    fn test_invalid_hyperparameter_display() {
        let err = IcefoldError::InvalidHyperparameter {
            param: "num_folds".to_string(),
            value: "1".to_string(),
            constraint: ">= 2".to_string(),
        };
        assert!(err.to_string().contains("num_folds"));
        assert!(err.to_string().contains(">= 2"));
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: IcefoldError = io.into();
        assert!(matches!(err, IcefoldError::Io(_)));
    }

    #[test]
    fn test_from_str() {
        let err: IcefoldError = "something went wrong".into();
        assert_eq!(err.to_string(), "something went wrong");
    }

    #[test]
    fn test_error_source_io() {
        use std::error::Error;
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        let err = IcefoldError::Io(io);
        assert!(err.source().is_some());
    }
}
