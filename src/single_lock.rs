use std::sync::Mutex;

use crate::base::BaseState;
use crate::contract::{DedupQueue, POLL_INTERVAL};
use crate::dedup::DedupIndex;
use crate::error::QueueError;
use crate::order::Order;

struct Inner<K, V> {
    order: Order<K>,
    dedup: DedupIndex<K, V>,
}

/// V1 — single global lock. One mutex guards both the ordering structure
/// and the dedup index, so the insert-and-enqueue pair is trivially
/// atomic with respect to other writers and readers.
///
/// This is the simplest variant and acts as a correctness reference for
/// the others.
pub struct SingleLockQueue<K, V> {
    base: BaseState,
    inner: Mutex<Inner<K, V>>,
}

impl<K: Ord + Clone, V> DedupQueue<K, V> for SingleLockQueue<K, V> {
    fn new(capacity: u32) -> Self {
        Self {
            base: BaseState::new(capacity),
            inner: Mutex::new(Inner {
                order: Order::new(),
                dedup: DedupIndex::new(),
            }),
        }
    }

    fn size(&self) -> u32 {
        self.inner.lock().unwrap().order.len()
    }

    fn try_write(&self, key: K, value: V) -> bool {
        let mut inner = self.inner.lock().unwrap();

        if inner.dedup.contains(&key) {
            inner.dedup.assign_if_present(&key, value);
            return true;
        }

        if inner.order.len() >= self.base.capacity() {
            return false;
        }

        inner.dedup.insert_or_assign(key.clone(), value);
        inner.order.push_back(key);
        true
    }

    fn read(&self) -> Result<(K, V), QueueError> {
        loop {
            {
                let mut inner = self.inner.lock().unwrap();
                if let Some(key) = inner.order.pop_front() {
                    let value = inner.dedup.remove(&key);
                    return Ok((key, value));
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

impl<K, V> Drop for SingleLockQueue<K, V> {
    fn drop(&mut self) {
        self.base.stop();
    }
}
