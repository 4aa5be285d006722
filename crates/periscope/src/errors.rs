//! Error types for the exploration core

use thiserror::Error;

/// Result type alias for exploration operations
pub type Result<T> = std::result::Result<T, ExplorationError>;

/// Error types that can occur while exploring a mirrored surface
#[derive(Debug, Error)]
pub enum ExplorationError {
    /// OCR returned nothing or the recognizer failed; the step may be retried
    #[error("Transient failure: {0}")]
    Transient(String),

    /// A synthesized input call was rejected by the provider
    #[error("Input error: {0}")]
    Input(String),

    /// A coordinate falls outside the mirrored window
    #[error("Coordinate ({x:.1}, {y:.1}) outside window {width:.0}x{height:.0}")]
    OutOfBounds {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },

    /// Depth, screen or wall-clock cap reached
    #[error("Budget exhausted: {0}")]
    BudgetExhausted(String),

    /// An explicitly requested strategy name is unknown
    #[error("Unknown strategy '{0}'")]
    UnknownStrategy(String),

    /// Session used outside its lifecycle (capture before start, etc.)
    #[error("Session error: {0}")]
    Session(String),

    /// Operation was cancelled via the cancellation token
    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error (component catalogs, debug log)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal invariant violation (poisoned lock, missing node)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExplorationError {
    /// True for errors the step loop treats as retryable on the next tick.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::Input(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ExplorationError::Transient("empty ocr".into()).is_transient());
        assert!(ExplorationError::Input("tap failed".into()).is_transient());
        assert!(!ExplorationError::BudgetExhausted("time".into()).is_transient());
    }

    #[test]
    fn test_out_of_bounds_message() {
        let err = ExplorationError::OutOfBounds {
            x: 500.0,
            y: 10.0,
            width: 390.0,
            height: 844.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("500.0"));
        assert!(msg.contains("390"));
    }
}
