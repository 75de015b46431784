//! Error types for rover_nav

use std::fmt;

/// Main error type for mapping and navigation setup faults.
///
/// Planning failures are not errors: an unreachable target yields an
/// empty path, see [`crate::path_planning::PlanOutcome`].
#[derive(Debug)]
pub enum NavError {
    /// Invalid configuration parameter
    InvalidParameter(String),
    /// Mapping origin is missing or not finite
    InvalidOrigin(String),
    /// I/O error
    IoError(std::io::Error),
    /// Snapshot or configuration (de)serialization failed
    SerializationError(serde_json::Error),
}

impl fmt::Display for NavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            NavError::InvalidOrigin(msg) => write!(f, "Invalid origin: {}", msg),
            NavError::IoError(e) => write!(f, "I/O error: {}", e),
            NavError::SerializationError(e) => write!(f, "Serialization error: {}", e),
        }
    }
}

impl std::error::Error for NavError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NavError::IoError(e) => Some(e),
            NavError::SerializationError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for NavError {
    fn from(e: std::io::Error) -> Self {
        NavError::IoError(e)
    }
}

impl From<serde_json::Error> for NavError {
    fn from(e: serde_json::Error) -> Self {
        NavError::SerializationError(e)
    }
}

/// Result type alias for mapping and navigation operations
pub type NavResult<T> = Result<T, NavError>;
