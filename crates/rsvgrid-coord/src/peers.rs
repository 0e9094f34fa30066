//! Static peer directory.
//!
//! Maps peer node IDs to the base URL their peer protocol is served on.
//! Built once at startup and never mutated, so it is shared without a lock.

use std::collections::HashSet;

use crate::error::DirectoryError;
use crate::message::NodeId;

/// A configured peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    pub id: NodeId,
    /// Base URL without a trailing slash, e.g. `http://10.0.0.2:8080`.
    pub url: String,
}

impl Peer {
    pub fn new(id: impl Into<NodeId>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
        }
    }
}

/// This node's identity plus its ordered peer list.
#[derive(Debug, Clone)]
pub struct PeerDirectory {
    self_id: NodeId,
    peers: Vec<Peer>,
}

impl PeerDirectory {
    /// Validate and build the directory.
    ///
    /// Rejects an empty own ID, an own ID that appears among the peers,
    /// duplicate peer IDs, and URLs that are not `http://`.
    pub fn new(self_id: impl Into<NodeId>, peers: Vec<Peer>) -> Result<Self, DirectoryError> {
        let self_id = self_id.into();
        if self_id.trim().is_empty() {
            return Err(DirectoryError::EmptyNodeId);
        }

        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(peers.len());
        for peer in peers {
            if peer.id.trim().is_empty() {
                return Err(DirectoryError::EmptyNodeId);
            }
            if peer.id == self_id {
                return Err(DirectoryError::SelfInPeers(self_id));
            }
            if !seen.insert(peer.id.clone()) {
                return Err(DirectoryError::DuplicatePeer(peer.id));
            }

            let url = peer.url.trim().trim_end_matches('/');
            let authority = url.strip_prefix("http://").unwrap_or_default();
            if authority.is_empty() || authority.contains('/') {
                return Err(DirectoryError::InvalidAddress {
                    id: peer.id,
                    url: peer.url,
                });
            }

            normalized.push(Peer::new(peer.id, url));
        }

        Ok(Self {
            self_id,
            peers: normalized,
        })
    }

    /// A directory with no peers (single-node operation).
    pub fn solo(self_id: impl Into<NodeId>) -> Result<Self, DirectoryError> {
        Self::new(self_id, Vec::new())
    }

    pub fn self_id(&self) -> &str {
        &self.self_id
    }

    /// Look up a peer by node ID.
    pub fn get(&self, id: &str) -> Option<&Peer> {
        self.peers.iter().find(|p| p.id == id)
    }

    /// Peers in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &Peer> {
        self.peers.iter()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
