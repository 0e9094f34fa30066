//! Error types for peer notification.

use std::time::Duration;

use thiserror::Error;

/// Why a notification did not reach a peer. Logged, never retried.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("peer {peer} unreachable: {reason}")]
    Unreachable { peer: String, reason: String },

    #[error("peer {peer} answered {status}")]
    Status { peer: String, status: http::StatusCode },

    #[error("peer {peer} did not answer within {after:?}")]
    Timeout { peer: String, after: Duration },

    #[error("notification queue full, message for {peer} dropped")]
    Saturated { peer: String },

    #[error("notifier stopped, message for {peer} dropped")]
    Stopped { peer: String },

    #[error("invalid peer uri {uri:?}: {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to build request: {0}")]
    Request(#[from] http::Error),
}
