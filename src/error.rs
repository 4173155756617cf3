//! Classified errors for remote-service calls.
//!
//! Every network operation in the client returns a [`RemoteError`] instead of
//! a raw `reqwest::Error`, so callers can distinguish "the remote could not
//! be reached" from "the remote refused the request". Background probe
//! workers fold these into health status; interactive flows surface them to
//! the user without retrying.

use thiserror::Error;

/// A classified failure from the remote store or assistant service.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The endpoint could not be reached at all (DNS, connect, TLS).
    #[error("remote unreachable: {0}")]
    Unreachable(String),

    /// The request exceeded its bounded timeout.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// The remote answered with a non-success status. The message is the
    /// response body (or status text) verbatim, for user-facing display.
    #[error("remote rejected request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },
}

impl RemoteError {
    /// Classify a `reqwest` transport error.
    ///
    /// Status-bearing errors become [`RemoteError::Rejected`]; timeouts keep
    /// the configured bound for the message; everything else is treated as
    /// unreachable.
    pub fn classify(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            return RemoteError::Timeout(timeout_secs);
        }
        if let Some(status) = err.status() {
            return RemoteError::Rejected {
                status: status.as_u16(),
                message: err.to_string(),
            };
        }
        RemoteError::Unreachable(err.to_string())
    }

    /// True for failures of transport (unreachable, timeout) as opposed to
    /// an explicit refusal by the remote.
    pub fn is_transport(&self) -> bool {
        matches!(self, RemoteError::Unreachable(_) | RemoteError::Timeout(_))
    }
}
