use std::collections::BTreeMap;

/// Key→value deduplication index.
///
/// Backed by `BTreeMap`, an ordered map, so the key bound (`Ord`) is
/// explicit at every call site.
#[derive(Debug, Default)]
pub struct DedupIndex<K, V> {
    map: BTreeMap<K, V>,
}

impl<K: Ord, V> DedupIndex<K, V> {
    pub fn new() -> Self {
        Self { map: BTreeMap::new() }
    }

    pub fn len(&self) -> u32 {
        self.map.len() as u32
    }

    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Inserts `value` under `key` if absent, otherwise assigns over the
    /// existing value in place. Returns `true` iff the key was newly
    /// inserted (i.e. this was not a dedup).
    pub fn insert_or_assign(&mut self, key: K, value: V) -> bool {
        match self.map.insert(key, value) {
            Some(_) => false,
            None => true,
        }
    }

    /// Assigns over an existing entry only; returns `false` if the key is
    /// absent (used by the sharded variants' dedup-only overflow path).
    pub fn assign_if_present(&mut self, key: &K, value: V) -> bool {
        match self.map.get_mut(key) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Removes and returns the value for `key`.
    ///
    /// Panics if the key is absent: every caller first popped this key
    /// from the corresponding ordering structure, so it must resolve here.
    pub fn remove(&mut self, key: &K) -> V {
        match self.map.remove(key) {
            Some(value) => value,
            None => unreachable!("dedup index missing entry for a key popped from ordering"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_dedup() {
        let mut idx: DedupIndex<&str, i32> = DedupIndex::new();
        assert!(idx.insert_or_assign("k", 1));
        assert!(!idx.insert_or_assign("k", 2));
        assert_eq!(idx.len(), 1);
        assert_eq!(idx.remove(&"k"), 2);
    }

    #[test]
    fn assign_if_present_respects_absence() {
        let mut idx: DedupIndex<&str, i32> = DedupIndex::new();
        assert!(!idx.assign_if_present(&"missing", 1));
        idx.insert_or_assign("present", 1);
        assert!(idx.assign_if_present(&"present", 2));
        assert_eq!(idx.remove(&"present"), 2);
    }

    #[test]
    #[should_panic]
    fn remove_missing_panics() {
        let mut idx: DedupIndex<&str, i32> = DedupIndex::new();
        idx.remove(&"missing");
    }
}
