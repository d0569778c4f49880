//! Memoization cache for counting results.
//!
//! Counting functions are pure in their small integer arguments, so their results can be kept
//! for the lifetime of the owning [`Enumerator`][crate::enumerator::Enumerator]. The cache is
//! per instance: two enumerators never share entries, and a snapshot never carries them.

use std::collections::HashMap;
use std::hash::Hash;

/// Largest accepted `bits` for [`HashMapCache::new`]; larger requests are clamped.
pub const MAX_CAPACITY_BITS: usize = 24;

/// A cache backed by [HashMap], counting hits and misses.
#[derive(Debug)]
pub struct HashMapCache<K, V> {
    map: HashMap<K, V>,
    hits: usize,
    misses: usize,
}

impl<K, V> Default for HashMapCache<K, V> {
    fn default() -> Self {
        Self::new(12)
    }
}

impl<K, V> HashMapCache<K, V> {
    /// Creates a cache with room for `2^bits` entries before the first reallocation.
    ///
    /// `bits` above [`MAX_CAPACITY_BITS`] are clamped to it.
    pub fn new(bits: usize) -> Self {
        let bits = bits.min(MAX_CAPACITY_BITS);
        Self {
            map: HashMap::with_capacity(1 << bits),
            hits: 0,
            misses: 0,
        }
    }

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

    /// Removes all entries and resets the counters.
    pub fn clear(&mut self) {
        self.map.clear();
        self.hits = 0;
        self.misses = 0;
    }
}

impl<K, V> HashMapCache<K, V>
where
    K: Hash + Eq,
    V: Clone,
{
    /// Checks for an entry without touching the hit/miss counters.
    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

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

/// Hit/miss counters of the caches owned by one enumerator.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: usize,
    pub misses: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl std::ops::Add for CacheStats {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        CacheStats {
            entries: self.entries + other.entries,
            hits: self.hits + other.hits,
            misses: self.misses + other.misses,
        }
    }
}

impl<K, V> From<&HashMapCache<K, V>> for CacheStats {
    fn from(cache: &HashMapCache<K, V>) -> Self {
        CacheStats {
            entries: cache.len(),
            hits: cache.hits(),
            misses: cache.misses(),
        }
    }
}
