//! Bounded insertion-ordered cache
//!
//! **Eviction Policy**: when size exceeds `max_size`, the oldest inserted
//! entries are removed until it fits. Reads do not refresh an entry, so this
//! is oldest-first rather than strict LRU.
//!
//! **Access Pattern**: HashMap for O(1) lookup, VecDeque for insertion order.
//! Explicit removals leave stale keys in the order queue; they are skipped on
//! eviction and compacted once the queue grows past twice the bound.
//! **Memory**: O(max_size) bounded growth.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash as StdHash;

#[derive(Debug, Clone)]
pub struct BoundedCache<K: StdHash + Eq + Clone, V: Clone> {
    /// HashMap for O(1) lookup
    entries: HashMap<K, V>,
    /// front = oldest, back = newest
    insertion_order: VecDeque<K>,
    /// Maximum number of entries kept after an insert
    max_size: usize,
    insert_count: u64,
    evicted_count: u64,
}

impl<K: StdHash + Eq + Clone, V: Clone> BoundedCache<K, V> {
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: HashMap::new(),
            insertion_order: VecDeque::new(),
            max_size,
            insert_count: 0,
            evicted_count: 0,
        }
    }

    /// Insert or update an entry, returning how many entries were evicted.
    ///
    /// Updating an existing key keeps its original position.
    pub fn insert(&mut self, key: K, value: V) -> usize {
        self.insert_count += 1;

        if let Some(existing) = self.entries.get_mut(&key) {
            *existing = value;
            return 0;
        }

        self.entries.insert(key.clone(), value);
        self.insertion_order.push_back(key);

        let mut evicted = 0;
        while self.entries.len() > self.max_size {
            match self.insertion_order.pop_front() {
                Some(oldest) => {
                    if self.entries.remove(&oldest).is_some() {
                        evicted += 1;
                    }
                }
                None => break,
            }
        }
        self.evicted_count += evicted as u64;

        if self.insertion_order.len() > self.max_size.saturating_mul(2).max(16) {
            let entries = &self.entries;
            self.insertion_order.retain(|k| entries.contains_key(k));
        }
        evicted
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.get(key).cloned()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.insertion_order.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            current_size: self.entries.len(),
            max_size: self.max_size,
            total_insertions: self.insert_count,
            total_evictions: self.evicted_count,
        }
    }
}

/// Cache statistics
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheStats {
    pub current_size: usize,
    pub max_size: usize,
    pub total_insertions: u64,
    pub total_evictions: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_insert_and_get() {
        let mut cache: BoundedCache<String, u32> = BoundedCache::new(100);
        cache.insert("key1".to_string(), 42);
        assert_eq!(cache.get(&"key1".to_string()), Some(42));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_oldest_evicted_first() {
        let mut cache: BoundedCache<u32, u32> = BoundedCache::new(3);
        for i in 0..3 {
            cache.insert(i, i * 10);
        }
        // reads do not refresh
        assert_eq!(cache.get(&0), Some(0));
        assert_eq!(cache.insert(3, 30), 1);
        assert!(!cache.contains(&0));
        assert!(cache.contains(&1));
        assert!(cache.contains(&3));
    }

    #[test]
    fn test_never_exceeds_bound() {
        let mut cache: BoundedCache<u32, u32> = BoundedCache::new(10);
        for i in 0..1_000 {
            cache.insert(i, i);
            assert!(cache.len() <= 10);
        }
        let stats = cache.stats();
        assert_eq!(stats.current_size, 10);
        assert_eq!(stats.total_evictions, 990);
    }

    #[test]
    fn test_update_keeps_position() {
        let mut cache: BoundedCache<u32, u32> = BoundedCache::new(2);
        cache.insert(1, 1);
        cache.insert(2, 2);
        assert_eq!(cache.insert(1, 100), 0);
        cache.insert(3, 3);
        assert!(!cache.contains(&1));
        assert_eq!(cache.get(&2), Some(2));
    }

    #[test]
    fn test_removed_keys_are_skipped_on_eviction() {
        let mut cache: BoundedCache<u32, u32> = BoundedCache::new(2);
        cache.insert(1, 1);
        cache.insert(2, 2);
        assert_eq!(cache.remove(&1), Some(1));
        cache.insert(3, 3);
        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&2));
        assert!(cache.contains(&3));
    }

    #[test]
    fn test_stale_order_is_compacted() {
        let mut cache: BoundedCache<u32, u32> = BoundedCache::new(2);
        for i in 0..100 {
            cache.insert(i, i);
            cache.remove(&i);
        }
        assert!(cache.insertion_order.len() <= 17);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut cache: BoundedCache<u32, u32> = BoundedCache::new(5);
        cache.insert(1, 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
