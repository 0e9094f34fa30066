//! rsvgrid-notify — fire-and-forget peer notification over HTTP.
//!
//! The coordinator hands each outbound message to [`HttpNotifier`], which
//! queues it for a fixed pool of worker tasks. Each worker posts one
//! message at a time with a per-call timeout and logs the outcome; nothing
//! is retried and the caller never waits.
//!
//! # Architecture
//!
//! ```text
//! Coordinator ──notify()──► bounded mpsc queue ──► worker 0..N
//!                  │                                 └── deliver() → POST {peer}{path}
//!                  └── queue full → warn, drop
//! ```

pub mod client;
pub mod error;
pub mod pool;

pub use client::{PeerClient, deliver, peer_client};
pub use error::NotifyError;
pub use pool::{HttpNotifier, NotifierConfig, NotifierHandle};
