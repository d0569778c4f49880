//! Counting the configurations of a topology without enumerating them.
//!
//! For topology `i` and arity bucket `b` (holding `f_b` operators), with `N` terminals:
//!
//! | Quantity   | Meaning                                            | Formula                    |
//! |------------|----------------------------------------------------|----------------------------|
//! | `l(i, b)`  | internal nodes of bucket `b`                       | sum over children, +1 at the root's bucket |
//! | `a(i)`     | leaves                                             | sum over children, `1` for the leaf |
//! | `G(i, b)`  | operator assignments of bucket `b`                 | `f_b ^ l(i, b)`            |
//! | `R(i)`     | operator assignments of the whole topology         | `prod_b G(i, b)`           |
//! | `S(i)`     | terminal assignments                               | `N ^ a(i)`                 |
//!
//! Combination counts are [`BigUint`], since they outgrow any machine word quickly. Structure
//! counts stay on `u64` and fail with [`EnumerationError::Overflow`] instead of wrapping.

use log::debug;
use num_bigint::BigUint;

use crate::enumerator::{CombinationKey, Configuration, CountingMode, Enumerator};
use crate::error::{EnumerationError, Result};

/// Leaf and per-bucket internal node counts of one topology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureCounts {
    pub leaves: u64,
    pub internal_per_bucket: Vec<u64>,
}

impl StructureCounts {
    fn leaf(buckets: usize) -> Self {
        StructureCounts {
            leaves: 1,
            internal_per_bucket: vec![0; buckets],
        }
    }

    fn absorb(&mut self, child: &StructureCounts) -> Result<()> {
        let overflow = || EnumerationError::Overflow { what: "node count" };
        self.leaves = self.leaves.checked_add(child.leaves).ok_or_else(overflow)?;
        for (own, theirs) in self.internal_per_bucket.iter_mut().zip(&child.internal_per_bucket) {
            *own = own.checked_add(*theirs).ok_or_else(overflow)?;
        }
        Ok(())
    }
}

/// Number of configurations per topology up to some complexity bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaceSize {
    /// `weights[i] = R(i) * S(i)`.
    pub weights: Vec<BigUint>,
    pub total: BigUint,
}

fn to_exponent(count: u64) -> Result<u32> {
    u32::try_from(count).map_err(|_| EnumerationError::Overflow { what: "exponent" })
}

impl Enumerator {
    /// Counting needs at least one operator and one terminal.
    pub(crate) fn check_supported(&self) -> Result<()> {
        self.check_operators()?;
        if self.num_terminals() == 0 {
            return Err(EnumerationError::unsupported("no terminals registered"));
        }
        Ok(())
    }

    fn check_bucket(&self, b: usize) -> Result<()> {
        if b >= self.num_buckets() {
            return Err(EnumerationError::out_of_range("bucket", b, self.num_buckets()));
        }
        Ok(())
    }

    pub(crate) fn bucket_size(&self, b: usize) -> usize {
        self.primitive_set().buckets()[b].names.len()
    }

    /// Structure counts of topology `i`.
    pub fn structure(&self, i: u64) -> Result<StructureCounts> {
        self.check_supported()?;
        match self.mode() {
            CountingMode::Memoized => self.structure_memoized(i),
            CountingMode::Reference => self.structure_reference(i),
        }
    }

    fn structure_reference(&self, i: u64) -> Result<StructureCounts> {
        let shape = self.ith_shape(i)?;
        let internal_per_bucket = self
            .arities()
            .iter()
            .map(|&arity| shape.count_of_arity(arity) as u64)
            .collect();
        Ok(StructureCounts {
            leaves: shape.leaf_count() as u64,
            internal_per_bucket,
        })
    }

    /// Post-order over child indices with an explicit stack, so that deep unary chains do not
    /// exhaust the call stack.
    fn structure_memoized(&self, i: u64) -> Result<StructureCounts> {
        if let Some(counts) = self.structure_cache().get(&i) {
            return Ok(counts);
        }

        let buckets = self.num_buckets();
        let mut stack = vec![i];
        while let Some(&top) = stack.last() {
            if self.structure_cache().contains(&top) {
                stack.pop();
                continue;
            }
            let Some((bucket, children)) = self.children_of(top)? else {
                self.structure_cache().insert(top, StructureCounts::leaf(buckets));
                stack.pop();
                continue;
            };

            let mut counts = StructureCounts {
                leaves: 0,
                internal_per_bucket: vec![0; buckets],
            };
            counts.internal_per_bucket[bucket] = 1;

            let mut pending = Vec::new();
            {
                let mut cache = self.structure_cache();
                for &child in &children {
                    match cache.get(&child) {
                        Some(child_counts) => counts.absorb(&child_counts)?,
                        None => pending.push(child),
                    }
                }
            }

            if pending.is_empty() {
                self.structure_cache().insert(top, counts);
                stack.pop();
            } else {
                stack.extend(pending);
            }
        }

        self.structure_cache()
            .get(&i)
            .ok_or_else(|| EnumerationError::unsupported("structure cache lost an entry"))
    }

    /// Number of internal nodes of bucket `b` in topology `i`.
    pub fn calculate_l_i_b(&self, i: u64, b: usize) -> Result<u64> {
        self.check_supported()?;
        self.check_bucket(b)?;
        Ok(self.structure(i)?.internal_per_bucket[b])
    }

    /// Number of leaves of topology `i`.
    pub fn calculate_a_i(&self, i: u64) -> Result<u64> {
        Ok(self.structure(i)?.leaves)
    }

    /// Ways to assign bucket `b`'s operators to its nodes in topology `i`.
    pub fn calculate_g_i_b(&self, i: u64, b: usize) -> Result<BigUint> {
        let l = self.calculate_l_i_b(i, b)?;
        Ok(BigUint::from(self.bucket_size(b)).pow(to_exponent(l)?))
    }

    /// `G(i, b)` for every bucket, in ascending-arity order.
    pub fn calculate_all_g_i_b(&self, i: u64) -> Result<Vec<BigUint>> {
        let counts = self.structure(i)?;
        counts
            .internal_per_bucket
            .iter()
            .enumerate()
            .map(|(b, &l)| Ok(BigUint::from(self.bucket_size(b)).pow(to_exponent(l)?)))
            .collect()
    }

    /// Operator assignments of topology `i`.
    pub fn calculate_r_i(&self, i: u64) -> Result<BigUint> {
        debug!("calculate_r_i(i = {})", i);
        self.combinations(CombinationKey::Operators(i), || {
            Ok(self.calculate_all_g_i_b(i)?.iter().product())
        })
    }

    /// Terminal assignments of topology `i`.
    pub fn calculate_s_i(&self, i: u64) -> Result<BigUint> {
        debug!("calculate_s_i(i = {})", i);
        self.combinations(CombinationKey::Terminals(i), || {
            let a = self.calculate_a_i(i)?;
            Ok(BigUint::from(self.num_terminals()).pow(to_exponent(a)?))
        })
    }

    fn combinations(
        &self,
        key: CombinationKey,
        compute: impl FnOnce() -> Result<BigUint>,
    ) -> Result<BigUint> {
        if self.mode() == CountingMode::Reference {
            return compute();
        }
        if let Some(count) = self.combination_cache().get(&key) {
            return Ok(count);
        }
        let count = compute()?;
        self.combination_cache().insert(key, count.clone());
        Ok(count)
    }

    /// Configurations per topology for `i` in `0..=max_complexity`, and their total.
    pub fn calculate_q(&self, max_complexity: u64) -> Result<SpaceSize> {
        debug!("calculate_q(max_complexity = {})", max_complexity);
        let weights = (0..=max_complexity)
            .map(|i| Ok(self.calculate_r_i(i)? * self.calculate_s_i(i)?))
            .collect::<Result<Vec<_>>>()?;
        let total = weights.iter().sum();
        Ok(SpaceSize { weights, total })
    }

    /// The configuration at position `rank` of the exhaustive order (`i`, then `r`, then `s`),
    /// found by skipping whole topologies instead of enumerating them.
    pub fn configuration_at(&self, rank: &BigUint) -> Result<Configuration> {
        self.check_supported()?;
        let mut rest = rank.clone();
        let mut i: u64 = 0;
        loop {
            let s_i = self.calculate_s_i(i)?;
            let weight = self.calculate_r_i(i)? * &s_i;
            if rest < weight {
                let r = &rest / &s_i;
                let s = &rest % &s_i;
                return Ok(Configuration { i, r, s });
            }
            rest -= weight;
            i = i
                .checked_add(1)
                .ok_or(EnumerationError::Overflow { what: "complexity index" })?;
        }
    }

    /// Position of a configuration in the exhaustive order; the inverse of
    /// [`configuration_at`][Self::configuration_at].
    pub fn rank_of(&self, configuration: &Configuration) -> Result<BigUint> {
        let r_i = self.calculate_r_i(configuration.i)?;
        let s_i = self.calculate_s_i(configuration.i)?;
        if configuration.r >= r_i {
            return Err(EnumerationError::out_of_range("operator rank", &configuration.r, r_i));
        }
        if configuration.s >= s_i {
            return Err(EnumerationError::out_of_range("terminal rank", &configuration.s, s_i));
        }

        let mut rank = BigUint::ZERO;
        for i in 0..configuration.i {
            rank += self.calculate_r_i(i)? * self.calculate_s_i(i)?;
        }
        Ok(rank + &configuration.r * s_i + &configuration.s)
    }
}
