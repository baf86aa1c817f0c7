//! Memoization of leaf encode/decode results.
//!
//! Every [`Codec`][crate::codec::Codec] keeps two of these caches, one per
//! direction, so that a leaf is translated at most once per codec instance.

use std::collections::HashMap;
use std::hash::Hash;

/// A cache backed by [HashMap], counting hits and misses.
#[derive(Debug, Clone)]
pub struct LeafCache<K, V> {
    map: HashMap<K, V>,
    hits: usize,
    misses: usize,
}

impl<K, V> Default for LeafCache<K, V> {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }
}

impl<K, V> LeafCache<K, V> {
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }
}

impl<K, V> LeafCache<K, V>
where
    K: Hash + Eq,
    V: Clone,
{
    /// Looks up a key, returning a copy of the cached value.
    #[inline]
    pub fn get(&mut self, key: &K) -> Option<V> {
        match self.map.get(key) {
            Some(v) => {
                self.hits += 1;
                Some(v.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    #[inline]
    pub fn insert(&mut self, key: K, value: V) {
        self.map.insert(key, value);
    }
}
