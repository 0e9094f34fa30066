//! rsvgrid-coord — cross-node critical-section coordination.
//!
//! Each node keeps a Lamport clock, its occupancy flags and a queue
//! of pending requests behind a single lock. The [`Coordinator`] drives the
//! state machine; outbound peer traffic goes through the [`Notifier`] seam
//! and is never awaited by the caller.
//!
//! # Architecture
//!
//! ```text
//! Booking handler
//!   └── Coordinator
//!       ├── acquire(user)   → Granted | Denied
//!       ├── release()       → reply to earliest queued requester, broadcast release
//!       ├── on_peer_request / on_peer_reply / on_peer_release
//!       ├── Mutex<NodeState>
//!       │   ├── LogicalClock
//!       │   ├── in_cs / any_cs / held
//!       │   └── queue: Vec<PendingRequest>
//!       ├── PeerDirectory (immutable NodeId → base URL)
//!       └── Arc<dyn Notifier> (fire-and-forget transport)
//! ```
//!
//! # Consistency
//!
//! Mutual exclusion is exact within one node and approximate across
//! nodes: `acquire` grants entry optimistically whenever no conflicting
//! local state is observed, and all peer messages are best-effort.

pub mod clock;
pub mod coordinator;
pub mod error;
pub mod message;
pub mod notifier;
pub mod peers;
pub mod state;

pub use clock::LogicalClock;
pub use coordinator::{AcquireOutcome, Coordinator, CriticalSection, RequestDisposition};
pub use error::DirectoryError;
pub use message::{NodeId, PeerMessage, PendingRequest, ReplyMessage};
pub use notifier::Notifier;
pub use peers::{Peer, PeerDirectory};
pub use state::{NodeSnapshot, NodeState};
