use std::sync::Mutex;

use crate::base::BaseState;
use crate::contract::{DedupQueue, POLL_INTERVAL};
use crate::dedup::DedupIndex;
use crate::error::QueueError;
use crate::order::Order;

/// V2 — two global locks, ordered `index → order` on write and
/// `order → index` on read.
///
/// The chain `write(index) → write(order) → read(order) → read(index)`
/// means an item can only be dequeued after it was enqueued, and its value
/// can only be removed from the index after that. The only transient
/// state is a key present in the index but not yet pushed to the
/// ordering structure; it is invisible to readers (nothing to pop yet)
/// and to `size()` (which counts the ordering structure). A write for the
/// same key during that window is serialized by the index lock and
/// behaves as dedup.
pub struct TwoLockQueue<K, V> {
    base: BaseState,
    index: Mutex<DedupIndex<K, V>>,
    order: Mutex<Order<K>>,
}

impl<K: Ord + Clone, V> DedupQueue<K, V> for TwoLockQueue<K, V> {
    fn new(capacity: u32) -> Self {
        Self {
            base: BaseState::new(capacity),
            index: Mutex::new(DedupIndex::new()),
            order: Mutex::new(Order::new()),
        }
    }

    fn size(&self) -> u32 {
        self.order.lock().unwrap().len()
    }

    fn try_write(&self, key: K, value: V) -> bool {
        let mut index = self.index.lock().unwrap();

        if index.len() >= self.base.capacity() {
            // Dedup-only path: no room for a new key.
            return index.assign_if_present(&key, value);
        }

        let inserted = index.insert_or_assign(key.clone(), value);
        drop(index);

        if inserted {
            self.order.lock().unwrap().push_back(key);
        }
        true
    }

    fn read(&self) -> Result<(K, V), QueueError> {
        loop {
            let popped = self.order.lock().unwrap().pop_front();

            if let Some(key) = popped {
                let value = self.index.lock().unwrap().remove(&key);
                return Ok((key, value));
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

impl<K, V> Drop for TwoLockQueue<K, V> {
    fn drop(&mut self) {
        self.base.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_scenario_1() {
        let q: TwoLockQueue<String, i64> = TwoLockQueue::new(2);
        assert_eq!(q.size(), 0);
        assert!(q.try_write("1".into(), 968137));
        assert!(q.try_write("1".into(), -41123));
        assert_eq!(q.size(), 1);
        assert!(q.try_write("2".into(), 34905));
        assert_eq!(q.size(), 2);
        assert!(!q.try_write("3".into(), -34905));
        assert_eq!(q.read().unwrap(), ("1".to_string(), -41123));
        assert_eq!(q.size(), 1);
        assert_eq!(q.read().unwrap(), ("2".to_string(), 34905));
        assert_eq!(q.size(), 0);
    }

    #[test]
    fn seed_scenario_3() {
        let q: TwoLockQueue<String, i64> = TwoLockQueue::new(2);
        assert!(q.try_write("859".into(), 69821));
        assert!(q.try_write("312".into(), 9752));
        assert!(!q.try_write("592".into(), 5823));
        assert!(!q.try_write("4124".into(), 978736));
        assert!(q.try_write("312".into(), 21));
        assert_eq!(q.size(), 2);
    }

    #[test]
    fn post_stop_writes_continue_under_capacity_rules() {
        let q: TwoLockQueue<&str, i32> = TwoLockQueue::new(1);
        q.stop();
        assert!(q.try_write("a", 1));
        assert!(q.try_write("a", 2));
        assert!(!q.try_write("b", 3));
    }

    #[test]
    fn fifo_within_instance() {
        let q: TwoLockQueue<&str, i32> = TwoLockQueue::new(4);
        q.try_write("k1", 1);
        q.try_write("k2", 2);
        assert_eq!(q.read().unwrap().0, "k1");
        assert_eq!(q.read().unwrap().0, "k2");
    }

    #[test]
    fn overflow_dedups_without_growing_order() {
        let q: TwoLockQueue<&str, i32> = TwoLockQueue::new(1);
        assert!(q.try_write("k1", 1));
        assert!(q.try_write("k1", 2));
        assert_eq!(q.size(), 1);
        assert_eq!(q.read().unwrap(), ("k1", 2));
    }
}
