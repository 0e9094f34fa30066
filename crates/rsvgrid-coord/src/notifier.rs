//! Outbound transport seam.

use crate::message::PeerMessage;
use crate::peers::Peer;

/// Fire-and-forget delivery of a message to one peer.
///
/// Implementations must not block: `notify` is called right after the node
/// lock is dropped, from request handlers and from `Drop` of a
/// [`CriticalSection`](crate::CriticalSection). Failures are the
/// implementation's to log; the coordinator never learns the outcome.
pub trait Notifier: Send + Sync {
    fn notify(&self, peer: &Peer, message: PeerMessage);
}
