use indexmap::IndexMap;
use parking_lot::RwLock;
use rand::Rng;
use std::{collections::hash_map::RandomState, hash::BuildHasher, hash::Hash, sync::Arc};

/// A bounded, thread safe memo of verification outcomes. Clones share the same storage.
///
/// When full, inserting evicts a random entry.
#[derive(Clone)]
pub struct Cache<K: Clone + Hash + Eq + Send + Sync, V: Clone + Send + Sync, S = RandomState> {
    // IndexMap makes removing a random element O(1)
    map: Arc<RwLock<IndexMap<K, V, S>>>,
    capacity: usize,
}

impl<K: Clone + Hash + Eq + Send + Sync, V: Clone + Send + Sync, S: BuildHasher + Default> Cache<K, V, S> {
    /// A cache holding at most `capacity` entries. A zero capacity disables caching.
    pub fn new(capacity: u64) -> Self {
        let capacity = capacity as usize;
        Self { map: Arc::new(RwLock::new(IndexMap::with_capacity_and_hasher(capacity, S::default()))), capacity }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.map.read().get(key).cloned()
    }

    pub fn insert(&self, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }
        let mut map = self.map.write();
        if map.len() >= self.capacity && !map.contains_key(&key) {
            let victim = rand::thread_rng().gen_range(0..map.len());
            map.swap_remove_index(victim);
        }
        map.insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        self.map.write().clear();
    }
}
