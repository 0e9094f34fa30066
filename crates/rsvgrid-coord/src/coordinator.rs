//! Critical-section state machine.
//!
//! Local states are IDLE (`!in_cs`), WAITING (a local request sits in the
//! queue) and ACTIVE (`in_cs`). ACTIVE is split on `held`: a local caller
//! is inside, or a grant arrived and the next local `acquire` will claim it.
//!
//! Every transition runs under the node lock and is a total function of the
//! current state. Peer notifications are submitted after the guard is
//! dropped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::message::{NodeId, PeerMessage, PendingRequest, ReplyMessage};
use crate::notifier::Notifier;
use crate::peers::PeerDirectory;
use crate::state::{NodeSnapshot, NodeState};

/// Result of a local [`Coordinator::acquire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// The caller may enter; it must call `release` afterwards.
    Granted,
    /// The section is busy or contended. The request was queued; the caller
    /// decides how to surface this (e.g. redirect and retry).
    Denied,
}

/// How an inbound peer request was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestDisposition {
    /// No local occupancy; the requester has implicit permission (HTTP 200).
    Permitted,
    /// Queued behind local occupancy or contention (HTTP 202).
    Queued,
}

/// Coordinates one node's view of the shared critical section.
pub struct Coordinator {
    node_id: NodeId,
    state: Mutex<NodeState>,
    peers: Arc<PeerDirectory>,
    notifier: Arc<dyn Notifier>,
}

impl Coordinator {
    pub fn new(peers: PeerDirectory, notifier: Arc<dyn Notifier>) -> Self {
        let node_id = peers.self_id().to_string();
        Self {
            state: Mutex::new(NodeState::new(node_id.clone())),
            node_id,
            peers: Arc::new(peers),
            notifier,
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn peers(&self) -> &PeerDirectory {
        &self.peers
    }

    /// Try to enter the critical section on behalf of `user_id`.
    ///
    /// Never waits for peers. Denied when a local caller already holds the
    /// section, or when another node is believed to hold or contend it and
    /// no grant is waiting here; the request is queued in both cases.
    pub fn acquire(&self, user_id: &str) -> AcquireOutcome {
        let request = {
            let mut state = self.lock();
            if state.held || (state.any_cs && !state.in_cs) {
                let queued = state.stamp_request(user_id);
                debug!(
                    node_id = %self.node_id,
                    user_id,
                    timestamp = queued.timestamp,
                    held = state.held,
                    queue_len = state.queue.len() + 1,
                    "critical section busy, request queued"
                );
                state.queue.push(queued);
                return AcquireOutcome::Denied;
            }

            let request = state.stamp_request(user_id);
            state.in_cs = true;
            state.any_cs = true;
            state.held = true;
            debug_assert!(state.invariant_holds());
            request
        };

        info!(
            node_id = %self.node_id,
            user_id,
            timestamp = request.timestamp,
            "critical section granted"
        );
        self.broadcast(&PeerMessage::Request(request));
        AcquireOutcome::Granted
    }

    /// Leave the critical section.
    ///
    /// Hands the section to the earliest queued request, if any, and always
    /// broadcasts `release`. Safe to call when nothing is held.
    pub fn release(&self) {
        let next = {
            let mut state = self.lock();
            state.in_cs = false;
            state.held = false;
            let next = state.take_earliest();
            if next.is_none() {
                state.any_cs = false;
            }
            debug_assert!(state.invariant_holds());
            next
        };

        match &next {
            Some(req) => info!(
                node_id = %self.node_id,
                next = %req.node_id,
                timestamp = req.timestamp,
                "critical section released, granting earliest request"
            ),
            None => info!(node_id = %self.node_id, "critical section released"),
        }

        if let Some(req) = next {
            self.grant(req);
        }
        self.broadcast(&PeerMessage::Release);
    }

    /// Scoped acquisition: `release` runs when the returned guard drops.
    pub fn enter(&self, user_id: &str) -> Option<CriticalSection<'_>> {
        match self.acquire(user_id) {
            AcquireOutcome::Granted => Some(CriticalSection {
                coordinator: self,
                user_id: user_id.to_string(),
            }),
            AcquireOutcome::Denied => None,
        }
    }

    /// Inbound `request` from a peer.
    pub fn on_peer_request(&self, request: PendingRequest) -> RequestDisposition {
        let mut state = self.lock();
        let clock = state.clock.observe(request.timestamp);

        if state.in_cs || state.any_cs {
            debug!(
                node_id = %self.node_id,
                from = %request.node_id,
                timestamp = request.timestamp,
                clock,
                "peer request queued"
            );
            state.queue.push(request);
            return RequestDisposition::Queued;
        }

        state.any_cs = true;
        debug!(
            node_id = %self.node_id,
            from = %request.node_id,
            timestamp = request.timestamp,
            clock,
            "peer request permitted"
        );
        RequestDisposition::Permitted
    }

    /// Inbound `reply`. Only a reply addressed to this node while it does
    /// not own the section has an effect.
    pub fn on_peer_reply(&self, reply: &ReplyMessage) {
        let mut state = self.lock();
        if reply.requester_id == self.node_id && !state.in_cs {
            state.in_cs = true;
            state.any_cs = true;
            debug!(node_id = %self.node_id, from = %reply.node_id, "grant received");
        }
    }

    /// Inbound `release`. Liveness signal only; the sender is not checked.
    ///
    /// A node that owns the section keeps `any_cs` so that `in_cs ⇒ any_cs`
    /// holds.
    pub fn on_peer_release(&self) {
        let mut state = self.lock();
        if state.queue.is_empty() && !state.in_cs {
            state.any_cs = false;
        }
        debug_assert!(state.invariant_holds());
    }

    pub fn snapshot(&self) -> NodeSnapshot {
        self.lock().snapshot()
    }

    fn grant(&self, next: PendingRequest) {
        let reply = ReplyMessage {
            node_id: self.node_id.clone(),
            requester_id: next.node_id,
        };

        if reply.requester_id == self.node_id {
            self.on_peer_reply(&reply);
            return;
        }

        match self.peers.get(&reply.requester_id) {
            Some(peer) => self.notifier.notify(peer, PeerMessage::Reply(reply)),
            None => warn!(
                node_id = %self.node_id,
                requester = %reply.requester_id,
                "no address for queued requester, grant dropped"
            ),
        }
    }

    fn broadcast(&self, message: &PeerMessage) {
        for peer in self.peers.iter() {
            self.notifier.notify(peer, message.clone());
        }
    }

    // The guarded data is flags and a queue; every transition leaves it
    // consistent, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, NodeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A granted critical section. Dropping it releases the section exactly once.
#[must_use = "the critical section is released as soon as the guard drops"]
pub struct CriticalSection<'a> {
    coordinator: &'a Coordinator,
    user_id: String,
}

impl CriticalSection<'_> {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

impl Drop for CriticalSection<'_> {
    fn drop(&mut self) {
        self.coordinator.release();
    }
}
