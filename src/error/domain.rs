//! Domain-specific error types using `thiserror`.
//!
//! Runtime captures never fail: bad thrown values are dropped silently. The
//! errors here belong to the surfaces around the pipeline, namely request
//! header parsing and trace loading.

use std::{io::Error as IoError, result::Result as StdResult};

use {anyhow::Error, serde_json::Error as SerdeJsonError, thiserror::Error};

/// Request header errors.
#[derive(Error, Debug)]
pub enum HeaderError {
    /// More than one router state tree header was sent.
    #[error("Multiple router state headers were sent. This is not allowed.")]
    MultipleRouterStateHeaders,
    /// The router state tree header exceeded the size limit.
    #[error("The router state header was too large ({len} bytes, limit {limit}).")]
    RouterStateTooLarge { len: usize, limit: usize },
    /// The router state tree header could not be decoded or validated.
    #[error("The router state header was sent but could not be parsed: {reason}")]
    InvalidRouterState { reason: String },
    /// A header name or value is not valid HTTP.
    #[error("Invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },
}

impl HeaderError {
    /// Creates a new `InvalidRouterState` error.
    ///
    /// # Arguments
    ///
    /// * `reason` - Why the router state was rejected.
    ///
    /// # Returns
    ///
    /// A new `HeaderError::InvalidRouterState`.
    pub fn invalid_router_state(reason: impl Into<String>) -> Self {
        Self::InvalidRouterState {
            reason: reason.into(),
        }
    }
}

/// Trace loading errors.
#[derive(Error, Debug)]
pub enum TraceError {
    /// Failed to read the trace file.
    #[error("IO error: {0}")]
    IoError(#[from] IoError),
    /// The trace is not valid JSON or has an unknown step.
    #[error("Malformed trace: {0}")]
    Malformed(#[from] SerdeJsonError),
    /// A step referenced a consumer that is not mounted.
    #[error("Consumer not mounted: {name}")]
    UnknownConsumer { name: String },
}

/// Operational error context propagation with `anyhow`.
pub type Result<T> = StdResult<T, Error>;

#[cfg(test)]
mod tests {
    use crate::error::domain::{HeaderError, TraceError};

    #[test]
    fn test_header_error_display() {
        assert_eq!(
            HeaderError::MultipleRouterStateHeaders.to_string(),
            "Multiple router state headers were sent. This is not allowed."
        );

        let too_large = HeaderError::RouterStateTooLarge {
            len: 90_000,
            limit: 80_000,
        };
        assert_eq!(
            too_large.to_string(),
            "The router state header was too large (90000 bytes, limit 80000)."
        );

        let invalid = HeaderError::invalid_router_state("expected array");
        assert_eq!(
            invalid.to_string(),
            "The router state header was sent but could not be parsed: expected array"
        );
    }

    #[test]
    fn test_trace_error_display() {
        let unknown = TraceError::UnknownConsumer {
            name: "overlay".to_string(),
        };
        assert_eq!(unknown.to_string(), "Consumer not mounted: overlay");

        let malformed: TraceError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(malformed.to_string().starts_with("Malformed trace:"));
    }
}
