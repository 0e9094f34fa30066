//! Error types for the coordination core.

use thiserror::Error;

/// Invalid static peer configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("node id must not be empty")]
    EmptyNodeId,

    #[error("node {0} lists itself as a peer")]
    SelfInPeers(String),

    #[error("peer {0} is configured more than once")]
    DuplicatePeer(String),

    #[error("peer {id} has invalid address {url:?}: expected http://host[:port]")]
    InvalidAddress { id: String, url: String },
}
