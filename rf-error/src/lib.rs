//! Unified error handling for rfsite
//!
//! This crate provides the single error type used by the monitoring core,
//! the request multiplexer and the poller. Variants map one to one onto the
//! failure kinds the core distinguishes when deciding whether to propagate a
//! failure or absorb it into a component's state.

use std::io;

/// Result type alias using RfError
pub type Result<T> = std::result::Result<T, RfError>;

/// Unified error type for all rfsite operations
#[derive(thiserror::Error, Debug)]
pub enum RfError {
    // ============================================================================
    // Construction and Programmer Errors
    // ============================================================================
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid address template: {0}")]
    InvalidTemplate(String),

    #[error("Invalid address index: {0}")]
    InvalidIndex(String),

    #[error("Operation not supported: {0}")]
    UnsupportedOperation(String),

    // ============================================================================
    // Request Multiplexer Errors
    // ============================================================================
    #[error("Request with this name is already registered: {0}")]
    DuplicateName(String),

    #[error("Request with this name does not exist: {0}")]
    UnknownRequest(String),

    // ============================================================================
    // Agent and Acquisition Errors
    // ============================================================================
    #[error("{0}")]
    Protocol(String),

    #[error("Data acquisition failed: {0}")]
    DataAcquisitionFailed(String),

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl RfError {
    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a protocol error from an agent failure description
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create a data acquisition error for a value count mismatch
    pub fn count_mismatch(expected: usize, got: usize) -> Self {
        Self::DataAcquisitionFailed(format!("expected {} values, got {}", expected, got))
    }

    /// Create a config error from a string
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Failures that belong to a single poll cycle.
    ///
    /// These are absorbed at the component boundary and turned into an
    /// `UNKNOWN` state or an invalid-data flag. Everything else is a
    /// construction or usage error and propagates.
    pub fn is_poll_failure(&self) -> bool {
        matches!(self, Self::Protocol(_) | Self::DataAcquisitionFailed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_failure_classification() {
        assert!(RfError::protocol("timeout").is_poll_failure());
        assert!(RfError::count_mismatch(4, 3).is_poll_failure());
        assert!(!RfError::DuplicateName("AMPs".into()).is_poll_failure());
        assert!(!RfError::invalid_argument("bad").is_poll_failure());
    }

    #[test]
    fn test_protocol_message_is_verbatim() {
        let err = RfError::protocol("No response from agent");
        assert_eq!(err.to_string(), "No response from agent");
    }

    #[test]
    fn test_count_mismatch_message() {
        let err = RfError::count_mismatch(5, 2);
        assert_eq!(err.to_string(), "Data acquisition failed: expected 5 values, got 2");
    }
}
