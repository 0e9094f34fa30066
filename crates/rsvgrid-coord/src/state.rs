//! Mutable per-node coordination state.

use serde::Serialize;

use crate::clock::LogicalClock;
use crate::message::{NodeId, PendingRequest};

/// Coordination state guarded by the coordinator's lock.
///
/// Invariant: `held ⇒ in_cs ⇒ any_cs`.
#[derive(Debug, Clone)]
pub struct NodeState {
    pub id: NodeId,
    pub clock: LogicalClock,
    /// This node owns the section, either held by a local caller or
    /// granted by a reply and not yet claimed.
    pub in_cs: bool,
    /// Best-effort belief that the section is held or contended somewhere.
    pub any_cs: bool,
    /// A local caller is between a granted `acquire` and its `release`.
    pub held: bool,
    /// Pending requests, in arrival order. Unbounded.
    pub queue: Vec<PendingRequest>,
}

impl NodeState {
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            clock: LogicalClock::new(),
            in_cs: false,
            any_cs: false,
            held: false,
            queue: Vec::new(),
        }
    }

    /// Stamp a new request from this node.
    pub fn stamp_request(&mut self, user_id: &str) -> PendingRequest {
        let timestamp = self.clock.tick();
        PendingRequest::new(self.id.clone(), timestamp, user_id)
    }

    /// Remove and return the earliest queued request.
    ///
    /// Ordered by `(timestamp, node_id)`; among exact duplicates the one
    /// queued first wins.
    pub fn take_earliest(&mut self) -> Option<PendingRequest> {
        let mut earliest: Option<(usize, &PendingRequest)> = None;
        for (idx, req) in self.queue.iter().enumerate() {
            let better = match earliest {
                None => true,
                Some((_, best)) => {
                    (req.timestamp, &req.node_id) < (best.timestamp, &best.node_id)
                }
            };
            if better {
                earliest = Some((idx, req));
            }
        }
        let idx = earliest.map(|(idx, _)| idx)?;
        Some(self.queue.remove(idx))
    }

    pub fn invariant_holds(&self) -> bool {
        (!self.held || self.in_cs) && (!self.in_cs || self.any_cs)
    }

    pub fn snapshot(&self) -> NodeSnapshot {
        NodeSnapshot {
            node_id: self.id.clone(),
            clock: self.clock.now(),
            in_cs: self.in_cs,
            any_cs: self.any_cs,
            held: self.held,
            queue: self.queue.clone(),
        }
    }
}

/// Read-only copy of [`NodeState`] for status reporting and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeSnapshot {
    pub node_id: NodeId,
    pub clock: u64,
    pub in_cs: bool,
    pub any_cs: bool,
    pub held: bool,
    pub queue: Vec<PendingRequest>,
}
