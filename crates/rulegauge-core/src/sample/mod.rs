//! Index-selection sampling over a fixed candidate list.
//!
//! A [`Sampler`] is parameterized by a shuffle-first flag, a
//! with/without-replacement flag, and an optional known sample size.
//! With a known size the whole sample is materialized in one streaming
//! pass (Tillé's classical algorithms): a binomially distributed
//! per-slot repeat count with replacement, a per-slot acceptance
//! probability `(n - j) / (N - k + 1)` without. With an unknown size,
//! draws are lazy: uniform picks with replacement, cycling through the
//! shuffled order without.

use rand::prelude::*;
use rand_distr::Binomial;
use tracing::warn;

/// Streaming index-selection sampler.
pub struct Sampler<T> {
    shuffle: bool,
    replacement: bool,
    size: Option<usize>,
    rng: StdRng,
    items: Vec<T>,
    order: Vec<usize>,
    sample: Vec<T>,
    cursor: usize,
}

impl<T: Copy> Sampler<T> {
    /// Creates a sampler seeded from the system entropy source.
    #[must_use]
    pub fn new(shuffle: bool, replacement: bool, size: Option<usize>) -> Self {
        Self::with_rng(shuffle, replacement, size, StdRng::from_entropy())
    }

    /// Creates a sampler with a fixed seed, for reproducible runs.
    #[must_use]
    pub fn with_seed(shuffle: bool, replacement: bool, size: Option<usize>, seed: u64) -> Self {
        Self::with_rng(shuffle, replacement, size, StdRng::seed_from_u64(seed))
    }

    fn with_rng(shuffle: bool, replacement: bool, size: Option<usize>, rng: StdRng) -> Self {
        Self {
            shuffle,
            replacement,
            size,
            rng,
            items: Vec::new(),
            order: Vec::new(),
            sample: Vec::new(),
            cursor: 0,
        }
    }

    /// Initializes the sampler over a candidate list. With a known
    /// sample size this also materializes the sample.
    pub fn init(&mut self, items: Vec<T>) {
        self.items = items;
        self.order = (0..self.items.len()).collect();
        self.sample.clear();
        self.cursor = 0;

        if self.shuffle {
            self.order.shuffle(&mut self.rng);
        }

        let Some(n) = self.size else {
            return;
        };

        let total = self.order.len();

        if self.replacement {
            // Per-slot binomial repeat counts.
            let mut drawn = 0u64;

            for k in 1..=total {
                let item = self.items[self.order[k - 1]];

                let remaining = (n as u64).saturating_sub(drawn);
                let p = 1.0 / (total - k + 1) as f64;

                let repeats = match Binomial::new(remaining, p) {
                    Ok(dist) => dist.sample(&mut self.rng),
                    Err(_) => 0,
                };

                for _ in 0..repeats {
                    self.sample.push(item);
                }
                drawn += repeats;

                if self.sample.len() == n {
                    break;
                }
            }
        } else {
            // Per-slot acceptance probability.
            let mut accepted = 0usize;

            for k in 1..=total {
                let item = self.items[self.order[k - 1]];

                let p = (n - accepted) as f64 / (total - (k - 1)) as f64;
                if self.rng.gen::<f64>() <= p {
                    self.sample.push(item);
                    accepted += 1;
                }

                if self.sample.len() == n {
                    break;
                }
            }
        }
    }

    /// Returns the next draw, or `None` if the candidate list is empty.
    pub fn next_draw(&mut self) -> Option<T> {
        if self.size.is_none() {
            if self.items.is_empty() {
                return None;
            }

            if self.replacement {
                let idx = self.rng.gen_range(0..self.items.len());
                return Some(self.items[idx]);
            }

            // Without replacement and without a known size we cycle
            // through the shuffled order.
            if self.cursor >= self.order.len() {
                self.cursor = 0;
            }

            let item = self.items[self.order[self.cursor]];
            self.cursor += 1;
            return Some(item);
        }

        if self.sample.is_empty() {
            return None;
        }

        if self.cursor >= self.sample.len() {
            // A caller exceeding its own sample size indicates a
            // stopping-rule problem upstream.
            warn!(
                size = self.sample.len(),
                "sample exhausted; cursor wrapped to the start"
            );
            self.cursor = 0;
        }

        let item = self.sample[self.cursor];
        self.cursor += 1;
        Some(item)
    }
}
