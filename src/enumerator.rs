//! The [`Enumerator`]: counting, decoding and search over one frozen [`PrimitiveSet`].
//!
//! An enumerator carries no search progress. Every operation is a function of its arguments and
//! the primitive set; the only interior state is a memoization cache that never changes results.
//! A shared `&Enumerator` can therefore be used from any number of threads, and workers that
//! need their own copy can [`Clone`] it or ship an [`EnumeratorSnapshot`].
//!
//! The operations themselves live next to the concepts they implement:
//! - topologies: [`crate::shape`]
//! - counting: [`crate::counter`]
//! - decoding: [`crate::decode`]
//! - search drivers: [`crate::search`]

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use log::debug;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::cache::{CacheStats, HashMapCache, MAX_CAPACITY_BITS};
use crate::counter::StructureCounts;
use crate::error::{EnumerationError, Result};
use crate::primitives::{PrimitiveSet, PrimitiveSetSnapshot, SNAPSHOT_VERSION};

/// How structure counts are computed.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CountingMode {
    /// Index arithmetic on machine words, memoized per instance.
    #[default]
    Memoized,
    /// Materializes every topology through the literal base-m codec and never memoizes.
    /// Slow; kept for cross-checking.
    Reference,
}

/// Configuration for an [`Enumerator`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumeratorConfig {
    pub mode: CountingMode,
    /// Initial capacity of each memoization cache, as a power of two.
    pub cache_capacity_bits: usize,
}

impl EnumeratorConfig {
    pub fn new(mode: CountingMode) -> Self {
        Self {
            mode,
            cache_capacity_bits: 12,
        }
    }

    pub fn with_mode(mut self, mode: CountingMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the initial cache capacity (`2^bits` entries). Clamped to [`MAX_CAPACITY_BITS`].
    pub fn with_cache_capacity_bits(mut self, bits: usize) -> Self {
        self.cache_capacity_bits = bits.min(MAX_CAPACITY_BITS);
        self
    }
}

impl Default for EnumeratorConfig {
    fn default() -> Self {
        Self::new(CountingMode::Memoized)
    }
}

/// Cache key for combination counts.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub(crate) enum CombinationKey {
    Operators(u64),
    Terminals(u64),
}

/// One resolved (topology, operator rank, terminal rank) triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Configuration {
    pub i: u64,
    pub r: BigUint,
    pub s: BigUint,
}

impl Configuration {
    pub fn new(i: u64, r: impl Into<BigUint>, s: impl Into<BigUint>) -> Self {
        Self {
            i,
            r: r.into(),
            s: s.into(),
        }
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(i={}, r={}, s={})", self.i, self.r, self.s)
    }
}

pub struct Enumerator {
    pset: Arc<PrimitiveSet>,
    arities: Vec<usize>,
    config: EnumeratorConfig,
    structure_cache: Mutex<HashMapCache<u64, StructureCounts>>,
    combination_cache: Mutex<HashMapCache<CombinationKey, BigUint>>,
}

impl Enumerator {
    pub fn new(pset: impl Into<Arc<PrimitiveSet>>) -> Self {
        Self::with_config(pset, EnumeratorConfig::default())
    }

    pub fn with_config(pset: impl Into<Arc<PrimitiveSet>>, config: EnumeratorConfig) -> Self {
        let pset = pset.into();
        let arities = pset.get_arities();
        debug!("Enumerator::with_config(arities = {:?}, config = {:?})", arities, config);

        Self {
            pset,
            arities,
            config,
            structure_cache: Mutex::new(HashMapCache::new(config.cache_capacity_bits)),
            combination_cache: Mutex::new(HashMapCache::new(config.cache_capacity_bits)),
        }
    }

    /// An enumerator in [`CountingMode::Reference`].
    pub fn reference(pset: impl Into<Arc<PrimitiveSet>>) -> Self {
        Self::with_config(pset, EnumeratorConfig::new(CountingMode::Reference))
    }
}

impl Enumerator {
    pub fn primitive_set(&self) -> &PrimitiveSet {
        &self.pset
    }

    pub fn shared_primitive_set(&self) -> Arc<PrimitiveSet> {
        Arc::clone(&self.pset)
    }

    pub fn config(&self) -> &EnumeratorConfig {
        &self.config
    }

    pub fn mode(&self) -> CountingMode {
        self.config.mode
    }

    /// Admissible arities, ascending. Bucket `b` holds operators of arity `arities()[b]`.
    pub fn arities(&self) -> &[usize] {
        &self.arities
    }

    pub fn num_buckets(&self) -> usize {
        self.arities.len()
    }

    pub fn num_terminals(&self) -> usize {
        self.pset.num_terminals()
    }
}

impl Enumerator {
    // The caches only ever hold pure results, so a poisoned lock is still consistent.
    pub(crate) fn structure_cache(&self) -> MutexGuard<'_, HashMapCache<u64, StructureCounts>> {
        self.structure_cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn combination_cache(
        &self,
    ) -> MutexGuard<'_, HashMapCache<CombinationKey, BigUint>> {
        self.combination_cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn cache_stats(&self) -> CacheStats {
        let structure = CacheStats::from(&*self.structure_cache());
        let combination = CacheStats::from(&*self.combination_cache());
        structure + combination
    }

    pub fn clear_cache(&self) {
        self.structure_cache().clear();
        self.combination_cache().clear();
    }
}

impl Clone for Enumerator {
    /// Clones share the frozen primitive set and start with a cold cache.
    fn clone(&self) -> Self {
        Self::with_config(Arc::clone(&self.pset), self.config)
    }
}

impl fmt::Debug for Enumerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Enumerator")
            .field("arities", &self.arities)
            .field("num_terminals", &self.num_terminals())
            .field("config", &self.config)
            .field("cache", &self.cache_stats())
            .finish()
    }
}

/// Plain-data form of an [`Enumerator`]: its primitive set and configuration, never its cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumeratorSnapshot {
    pub version: u32,
    pub primitive_set: PrimitiveSetSnapshot,
    pub config: EnumeratorConfig,
}

impl EnumeratorSnapshot {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl Enumerator {
    pub fn snapshot(&self) -> EnumeratorSnapshot {
        EnumeratorSnapshot {
            version: SNAPSHOT_VERSION,
            primitive_set: self.pset.snapshot(),
            config: self.config,
        }
    }

    pub fn restore(snapshot: &EnumeratorSnapshot) -> Result<Self> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(EnumerationError::SnapshotVersion {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        let bits = snapshot.config.cache_capacity_bits;
        if bits > MAX_CAPACITY_BITS {
            return Err(EnumerationError::out_of_range(
                "cache capacity bits",
                bits,
                MAX_CAPACITY_BITS,
            ));
        }
        let pset = PrimitiveSet::restore(&snapshot.primitive_set)?;
        Ok(Self::with_config(pset, snapshot.config))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.snapshot().to_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::restore(&EnumeratorSnapshot::from_bytes(bytes)?)
    }
}
