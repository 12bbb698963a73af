//! Epoch counters and stamped memo entries.
//!
//! The object space keeps a single structural epoch that is bumped on every
//! topology change (type creation, mixin operation, constant definition or
//! removal). Memoized results carry the epoch they were computed in and are
//! valid only while it is still current, so one bump invalidates every cache
//! at once.

use std::fmt;

/// A point in the mutation history of an object space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Epoch(u64);

impl Epoch {
    /// The epoch of a freshly created counter.
    pub const ZERO: Epoch = Epoch(0);

    /// Get the raw counter value.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Monotonically increasing mutation counter.
///
/// Only ever reset by constructing a new counter. Wraparound is not handled.
#[derive(Debug, Default)]
pub struct EpochCounter {
    current: Epoch,
}

impl EpochCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current epoch.
    #[inline]
    pub fn current(&self) -> Epoch {
        self.current
    }

    /// Advance to and return the next epoch.
    #[inline]
    pub fn bump(&mut self) -> Epoch {
        self.current = Epoch(self.current.0 + 1);
        self.current
    }
}

/// A memoized value tagged with the epoch it was computed in.
#[derive(Debug, Clone)]
pub struct Stamped<T> {
    epoch: Epoch,
    value: T,
}

impl<T> Stamped<T> {
    pub fn new(epoch: Epoch, value: T) -> Self {
        Self { epoch, value }
    }

    /// Whether the value is still valid at `epoch`.
    #[inline]
    pub fn is_current(&self, epoch: Epoch) -> bool {
        self.epoch == epoch
    }

    /// The value, if it is still valid at `epoch`.
    #[inline]
    pub fn get_if_current(&self, epoch: Epoch) -> Option<&T> {
        self.is_current(epoch).then_some(&self.value)
    }
}
