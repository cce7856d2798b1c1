use std::time::Duration;

use crate::error::QueueError;

/// Fixed poll interval used by every variant's `read` when it observes an
/// empty queue. Not exposed as configuration; a compile-time constant is
/// adequate.
pub const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// The abstract contract all five queue variants realize identically.
pub trait DedupQueue<K, V> {
    /// Pre: `capacity > 0`. Post: empty, not stopped.
    fn new(capacity: u32) -> Self;

    /// Current pending item count. May be sampled approximately in
    /// sharded variants.
    fn size(&self) -> u32;

    /// `true` iff the write was accepted, either newly inserted or
    /// deduplicated into an existing entry. `false` iff the queue is at
    /// capacity and the key is not already present.
    fn try_write(&self, key: K, value: V) -> bool;

    /// Blocks by cooperative polling until an item is available or the
    /// queue is stopped and observed empty.
    fn read(&self) -> Result<(K, V), QueueError>;

    /// Idempotently latches the stop flag.
    fn stop(&self);

    fn capacity(&self) -> u32;

    fn stopped(&self) -> bool;
}
