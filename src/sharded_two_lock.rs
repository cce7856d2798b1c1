use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use crate::base::BaseState;
use crate::contract::{DedupQueue, POLL_INTERVAL};
use crate::dedup::DedupIndex;
use crate::error::QueueError;
use crate::hash::shard_index;
use crate::order::Order;

enum WriteOutcome {
    Inserted,
    Deduped,
    Rejected,
}

/// One independent two-lock sub-queue: the same `index → order` write
/// ordering and `order → index` read ordering as `TwoLockQueue`, scoped
/// to a single shard.
struct Shard<K, V> {
    index: Mutex<DedupIndex<K, V>>,
    order: Mutex<Order<K>>,
}

impl<K: Ord + Clone, V> Shard<K, V> {
    fn new() -> Self {
        Self {
            index: Mutex::new(DedupIndex::new()),
            order: Mutex::new(Order::new()),
        }
    }

    fn write(&self, key: K, value: V, dedup_only: bool) -> WriteOutcome {
        let mut index = self.index.lock().unwrap();

        if dedup_only {
            return if index.assign_if_present(&key, value) {
                WriteOutcome::Deduped
            } else {
                WriteOutcome::Rejected
            };
        }

        let inserted = index.insert_or_assign(key.clone(), value);
        drop(index);

        if inserted {
            self.order.lock().unwrap().push_back(key);
            WriteOutcome::Inserted
        } else {
            WriteOutcome::Deduped
        }
    }

    fn try_read(&self) -> Option<(K, V)> {
        let key = self.order.lock().unwrap().pop_front()?;
        let value = self.index.lock().unwrap().remove(&key);
        Some((key, value))
    }
}

/// V4 — identical global structure to V3, but each shard internally uses
/// the two-lock protocol. The capacity check uses the same atomic global
/// counter rather than per-shard index size, since shard contents are
/// balanced only in expectation.
pub struct ShardedTwoLockQueue<K, V, const N_SHARDS: usize = 16> {
    base: BaseState,
    shards: Vec<Shard<K, V>>,
    size: AtomicU32,
}

impl<K: Ord + Clone + std::hash::Hash, V, const N_SHARDS: usize> DedupQueue<K, V>
    for ShardedTwoLockQueue<K, V, N_SHARDS>
{
    fn new(capacity: u32) -> Self {
        let shards = (0..N_SHARDS).map(|_| Shard::new()).collect();
        log::info!("creating sharded two-lock queue with {N_SHARDS} shards");
        Self {
            base: BaseState::new(capacity),
            shards,
            size: AtomicU32::new(0),
        }
    }

    fn size(&self) -> u32 {
        self.size.load(Ordering::Acquire)
    }

    fn try_write(&self, key: K, value: V) -> bool {
        let old_size = self.size.fetch_add(1, Ordering::AcqRel);
        let overflow = old_size >= self.base.capacity();

        let shard = &self.shards[shard_index(&key, N_SHARDS)];
        if overflow {
            log::debug!("write overflow, attempting dedup-only path");
        }
        let outcome = shard.write(key, value, overflow);

        match outcome {
            WriteOutcome::Inserted => true,
            WriteOutcome::Deduped => {
                self.size.fetch_sub(1, Ordering::AcqRel);
                true
            }
            WriteOutcome::Rejected => {
                self.size.fetch_sub(1, Ordering::AcqRel);
                false
            }
        }
    }

    fn read(&self) -> Result<(K, V), QueueError> {
        loop {
            for shard in &self.shards {
                if let Some(pair) = shard.try_read() {
                    self.size.fetch_sub(1, Ordering::AcqRel);
                    return Ok(pair);
                }
            }

            if self.base.stopped() {
                return Err(QueueError::Stopped);
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    fn stop(&self) {
        self.base.stop();
    }

    fn capacity(&self) -> u32 {
        self.base.capacity()
    }

    fn stopped(&self) -> bool {
        self.base.stopped()
    }
}

impl<K, V, const N_SHARDS: usize> Drop for ShardedTwoLockQueue<K, V, N_SHARDS> {
    fn drop(&mut self) {
        self.base.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sharded_dedup_at_capacity_one() {
        let q: ShardedTwoLockQueue<&str, i32, 2> = ShardedTwoLockQueue::new(1);
        assert!(q.try_write("k", 1));
        assert!(q.try_write("k", 2));
        assert_eq!(q.size(), 1);
    }

    #[test]
    fn overflow_rejects_new_key_at_capacity() {
        let q: ShardedTwoLockQueue<&str, i32, 1> = ShardedTwoLockQueue::new(1);
        assert!(q.try_write("k1", 1));
        assert!(!q.try_write("k2", 2));
        assert_eq!(q.size(), 1);
    }

    #[test]
    fn read_drains_value() {
        let q: ShardedTwoLockQueue<&str, i32, 4> = ShardedTwoLockQueue::new(4);
        q.try_write("a", 1);
        assert_eq!(q.read().unwrap(), ("a", 1));
        assert_eq!(q.size(), 0);
    }
}
