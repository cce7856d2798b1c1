use std::sync::atomic::{AtomicBool, Ordering};

/// Shared state common to every queue variant: a fixed capacity and a
/// monotonic stop flag.
///
/// Single-instance variants (V1, V2) derive `size()` from their ordering
/// structure's length and hold no counter of their own here; sharded
/// variants layer an additional atomic size counter on top of a
/// `BaseState` per shard-array (not per shard).
#[derive(Debug)]
pub struct BaseState {
    capacity: u32,
    stop: AtomicBool,
}

impl BaseState {
    /// Panics if `capacity` is zero, per the construction precondition.
    pub fn new(capacity: u32) -> Self {
        assert!(capacity > 0, "queue capacity must be greater than zero");
        log::info!("creating queue with capacity of {capacity}");

        Self {
            capacity,
            stop: AtomicBool::new(false),
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn stopped(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// Idempotently latches the stop flag. Logs only on the false→true
    /// transition.
    pub fn stop(&self) {
        if !self.stop.swap(true, Ordering::AcqRel) {
            log::info!("stopping queue");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_open() {
        let base = BaseState::new(4);
        assert!(!base.stopped());
        assert_eq!(base.capacity(), 4);
    }

    #[test]
    fn stop_is_idempotent() {
        let base = BaseState::new(1);
        base.stop();
        base.stop();
        assert!(base.stopped());
    }

    #[test]
    #[should_panic]
    fn zero_capacity_panics() {
        BaseState::new(0);
    }
}
