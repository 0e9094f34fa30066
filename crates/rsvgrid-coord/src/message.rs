//! Peer protocol messages.
//!
//! Field names on the wire are `NodeID`, `Timestamp`, `UserID` and
//! `RequesterID`, identical in both directions.

use serde::{Deserialize, Serialize};

/// Opaque node identity. Never used as a network address; see
/// [`PeerDirectory`](crate::PeerDirectory).
pub type NodeId = String;

/// A request to enter the critical section, stamped at send time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRequest {
    #[serde(rename = "NodeID")]
    pub node_id: NodeId,
    #[serde(rename = "Timestamp")]
    pub timestamp: u64,
    #[serde(rename = "UserID")]
    pub user_id: String,
}

impl PendingRequest {
    pub fn new(node_id: impl Into<NodeId>, timestamp: u64, user_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            timestamp,
            user_id: user_id.into(),
        }
    }
}

/// Grant sent by a releasing node to the requester it selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyMessage {
    /// Sender of the grant.
    #[serde(rename = "NodeID")]
    pub node_id: NodeId,
    /// Node the grant is addressed to.
    #[serde(rename = "RequesterID")]
    pub requester_id: NodeId,
}

/// An outbound peer notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerMessage {
    Request(PendingRequest),
    Reply(ReplyMessage),
    Release,
}

impl PeerMessage {
    /// Route on the receiving node.
    pub fn path(&self) -> &'static str {
        match self {
            PeerMessage::Request(_) => "/request",
            PeerMessage::Reply(_) => "/reply",
            PeerMessage::Release => "/release",
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            PeerMessage::Request(_) => "request",
            PeerMessage::Reply(_) => "reply",
            PeerMessage::Release => "release",
        }
    }

    /// JSON body. `release` carries no body.
    pub fn to_body(&self) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            PeerMessage::Request(req) => serde_json::to_vec(req),
            PeerMessage::Reply(reply) => serde_json::to_vec(reply),
            PeerMessage::Release => Ok(Vec::new()),
        }
    }
}
