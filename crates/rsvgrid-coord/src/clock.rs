//! Lamport logical clock.

/// Per-node Lamport counter.
///
/// Not internally synchronized: the clock lives inside [`NodeState`] and is
/// only touched while the node lock is held.
///
/// [`NodeState`]: crate::NodeState
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogicalClock(u64);

impl LogicalClock {
    pub fn new() -> Self {
        Self(0)
    }

    /// Advance for a local event and return the new value.
    ///
    /// Saturates at `u64::MAX` instead of wrapping.
    pub fn tick(&mut self) -> u64 {
        self.0 = self.0.saturating_add(1);
        self.0
    }

    /// Merge a remote timestamp: `max(local, remote) + 1`, saturating.
    pub fn observe(&mut self, remote: u64) -> u64 {
        self.0 = self.0.max(remote).saturating_add(1);
        self.0
    }

    /// Current value, without advancing.
    pub fn now(&self) -> u64 {
        self.0
    }
}
