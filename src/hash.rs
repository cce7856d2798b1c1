use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Raw 64-bit hash of `key`, used as the common basis for every shard
/// selector this crate derives.
pub fn hash_u64<K: Hash>(key: &K) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}

/// `hash(key) mod n_shards`, used to route every occurrence of a key to the
/// same shard. Any hash with good avalanche suffices; stability across
/// process runs is not required.
pub fn shard_index<K: Hash>(key: &K, n_shards: usize) -> usize {
    (hash_u64(key) % n_shards as u64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_key_same_shard() {
        let a = shard_index(&"stable-key", 16);
        let b = shard_index(&"stable-key", 16);
        assert_eq!(a, b);
    }

    #[test]
    fn index_in_range() {
        for n in 1..=32usize {
            let idx = shard_index(&"k", n);
            assert!(idx < n);
        }
    }
}
