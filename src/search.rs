//! Search drivers over the decoded space.
//!
//! Drivers are lazy iterators borrowing an [`Enumerator`]. They hold only a cursor, so dropping
//! one mid-sequence is a complete cancellation, and cloning one restarts from the same cursor.
//!
//! - [`ExhaustiveSearch`] walks configurations in the canonical order: `i` ascending, then the
//!   operator rank `r`, then the terminal rank `s` (innermost).
//! - [`RandomSearch`] draws one configuration per seed: `i` uniform over `0..=max_complexity`,
//!   then `r` uniform below `R(i)` and `s` uniform below `S(i)`. This is uniform *per topology*;
//!   small topologies are over-represented relative to the flat union of all solutions. Use
//!   [`Enumerator::globally_uniform_random_once`] for draws uniform over that union.
//!
//! Draws are independent, so a sequence may repeat a solution.

use log::debug;
use num_bigint::BigUint;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::enumerator::{Configuration, Enumerator};
use crate::error::{EnumerationError, Result};

/// Uniform draw from `0..bound` by rejection sampling over `bound.bits()` random bits.
pub fn random_below<R: RngCore + ?Sized>(rng: &mut R, bound: &BigUint) -> Result<BigUint> {
    if *bound == BigUint::ZERO {
        return Err(EnumerationError::out_of_range("sampling bound", bound, "a positive count"));
    }

    let bits = bound.bits();
    let words = bits.div_ceil(32) as usize;
    let excess = (words as u64 * 32 - bits) as u32;
    loop {
        let mut digits: Vec<u32> = (0..words).map(|_| rng.next_u32()).collect();
        if let Some(top) = digits.last_mut() {
            *top >>= excess;
        }
        let candidate = BigUint::from_slice(&digits);
        if candidate < *bound {
            return Ok(candidate);
        }
    }
}

/// `n` distinct seeds derived from `base_seed` with the SplitMix64 finalizer, which is a
/// bijection on `u64`.
pub fn create_seeds(base_seed: u64, n: usize) -> Vec<u64> {
    (0..n as u64)
        .map(|k| {
            let mut z = base_seed.wrapping_add(k.wrapping_mul(0x9E37_79B9_7F4A_7C15));
            z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
            z ^ (z >> 31)
        })
        .collect()
}

#[derive(Debug, Clone)]
enum Bound {
    Complexity(u64),
    Count(BigUint),
}

/// Exhaustive walk over configurations in canonical order.
#[derive(Debug, Clone)]
pub struct ExhaustiveSearch<'a> {
    enumerator: &'a Enumerator,
    cursor: Configuration,
    /// `R(i)` and `S(i)` of the cursor's topology; `None` until computed.
    limits: Option<(BigUint, BigUint)>,
    bound: Bound,
    done: bool,
}

impl<'a> ExhaustiveSearch<'a> {
    fn new(enumerator: &'a Enumerator, start: Configuration, bound: Bound) -> Self {
        Self {
            enumerator,
            cursor: start,
            limits: None,
            bound,
            done: false,
        }
    }

    /// The configuration the next item decodes.
    pub fn cursor(&self) -> &Configuration {
        &self.cursor
    }

    fn exhausted(&self) -> bool {
        match &self.bound {
            Bound::Complexity(max) => self.cursor.i > *max,
            Bound::Count(remaining) => *remaining == BigUint::ZERO,
        }
    }

    fn advance(&mut self) -> Result<()> {
        let (r_i, s_i) = self
            .limits
            .take()
            .ok_or_else(|| EnumerationError::unsupported("missing limits"))?;

        self.cursor.s += 1u32;
        if self.cursor.s == s_i {
            self.cursor.s = BigUint::ZERO;
            self.cursor.r += 1u32;
            if self.cursor.r == r_i {
                self.cursor.r = BigUint::ZERO;
                self.cursor.i = self
                    .cursor
                    .i
                    .checked_add(1)
                    .ok_or(EnumerationError::Overflow { what: "complexity index" })?;
                return Ok(());
            }
        }
        self.limits = Some((r_i, s_i));
        Ok(())
    }

    fn step(&mut self) -> Result<String> {
        if self.limits.is_none() {
            let r_i = self.enumerator.calculate_r_i(self.cursor.i)?;
            let s_i = self.enumerator.calculate_s_i(self.cursor.i)?;
            self.limits = Some((r_i, s_i));
        }
        let solution = self.enumerator.generate_solution(&self.cursor)?;
        if let Bound::Count(remaining) = &mut self.bound {
            *remaining -= 1u32;
        }
        self.advance()?;
        Ok(solution)
    }
}

impl Iterator for ExhaustiveSearch<'_> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.exhausted() {
            return None;
        }
        let item = self.step();
        if item.is_err() {
            self.done = true;
        }
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.bound {
            Bound::Count(remaining) if !self.done => match usize::try_from(remaining) {
                Ok(n) => (n, Some(n)),
                Err(_) => (usize::MAX, None),
            },
            Bound::Count(_) => (0, Some(0)),
            Bound::Complexity(_) => (0, None),
        }
    }
}

/// Independent seeded draws, one per seed.
#[derive(Debug, Clone)]
pub struct RandomSearch<'a> {
    enumerator: &'a Enumerator,
    max_complexity: u64,
    seeds: Vec<u64>,
    position: usize,
}

impl RandomSearch<'_> {
    pub fn seeds(&self) -> &[u64] {
        &self.seeds
    }
}

impl Iterator for RandomSearch<'_> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let seed = *self.seeds.get(self.position)?;
        self.position += 1;
        Some(self.enumerator.uniform_random_global_search_once(self.max_complexity, seed))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.seeds.len() - self.position;
        (n, Some(n))
    }
}

impl ExactSizeIterator for RandomSearch<'_> {}

impl Enumerator {
    /// Every configuration with complexity index at most `max_complexity`, in canonical order.
    ///
    /// Yields exactly `calculate_q(max_complexity).total` items.
    pub fn exhaustive_global_search(&self, max_complexity: u64) -> Result<ExhaustiveSearch<'_>> {
        debug!("exhaustive_global_search(max_complexity = {})", max_complexity);
        self.check_supported()?;
        Ok(ExhaustiveSearch::new(
            self,
            Configuration::new(0, 0u32, 0u32),
            Bound::Complexity(max_complexity),
        ))
    }

    /// `count` configurations of the canonical order, starting at position `start`.
    ///
    /// The space is infinite, so the window is always available.
    pub fn exhaustive_window(&self, start: &BigUint, count: u64) -> Result<ExhaustiveSearch<'_>> {
        debug!("exhaustive_window(start = {}, count = {})", start, count);
        let cursor = self.configuration_at(start)?;
        Ok(ExhaustiveSearch::new(self, cursor, Bound::Count(BigUint::from(count))))
    }

    /// Like [`exhaustive_window`][Self::exhaustive_window], restricted to complexity indices up
    /// to `max_complexity`. Fails if the window reaches past the last such configuration.
    pub fn exhaustive_window_within(
        &self,
        max_complexity: u64,
        start: &BigUint,
        count: u64,
    ) -> Result<ExhaustiveSearch<'_>> {
        let total = self.calculate_q(max_complexity)?.total;
        let end = start + count;
        if end > total {
            return Err(EnumerationError::out_of_range("window end", end, total));
        }
        self.exhaustive_window(start, count)
    }

    /// One configuration drawn from `rng`: `i` uniform over `0..=max_complexity`, then `r` and `s`
    /// uniform below `R(i)` and `S(i)`.
    pub fn uniform_random_configuration<R: Rng>(
        &self,
        max_complexity: u64,
        rng: &mut R,
    ) -> Result<Configuration> {
        self.check_supported()?;
        let i = rng.random_range(0..=max_complexity);
        let r = random_below(rng, &self.calculate_r_i(i)?)?;
        let s = random_below(rng, &self.calculate_s_i(i)?)?;
        Ok(Configuration { i, r, s })
    }

    /// One seeded draw, uniform per topology.
    pub fn uniform_random_global_search_once(
        &self,
        max_complexity: u64,
        seed: u64,
    ) -> Result<String> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let configuration = self.uniform_random_configuration(max_complexity, &mut rng)?;
        debug!("uniform_random_global_search_once(seed = {}) -> {}", seed, configuration);
        self.generate_solution(&configuration)
    }

    /// `n` seeded draws, one per seed. Fails if fewer than `n` seeds are given.
    pub fn uniform_random_global_search(
        &self,
        max_complexity: u64,
        n: usize,
        seeds: &[u64],
    ) -> Result<RandomSearch<'_>> {
        debug!("uniform_random_global_search(max_complexity = {}, n = {})", max_complexity, n);
        self.check_supported()?;
        if seeds.len() < n {
            return Err(EnumerationError::out_of_range("draw count", n, seeds.len()));
        }
        Ok(RandomSearch {
            enumerator: self,
            max_complexity,
            seeds: seeds[..n].to_vec(),
            position: 0,
        })
    }

    /// One seeded draw, uniform over all configurations with complexity index at most
    /// `max_complexity`.
    pub fn globally_uniform_random_once(&self, max_complexity: u64, seed: u64) -> Result<String> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let total = self.calculate_q(max_complexity)?.total;
        let rank = random_below(&mut rng, &total)?;
        let configuration = self.configuration_at(&rank)?;
        debug!("globally_uniform_random_once(seed = {}) -> {}", seed, configuration);
        self.generate_solution(&configuration)
    }
}
