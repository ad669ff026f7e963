// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Seed sources: the process-wide draw for unspecified seeds and the
//! per-request deterministic noise stream handed to the backend

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Exclusive upper bound for drawn seeds
pub const SEED_RANGE: u64 = 1_000_000_000;

/// Uniform source of non-negative seeds
pub trait SeedSource: Send + Sync {
    fn next_seed(&self) -> u64;
}

/// Process-wide seed source seeded once at startup
pub struct RandomSeedSource {
    rng: Mutex<StdRng>,
}

impl RandomSeedSource {
    /// Seed from OS entropy
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Seed deterministically (tests and reproducible deployments)
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomSeedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SeedSource for RandomSeedSource {
    fn next_seed(&self) -> u64 {
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            // The RNG state is valid even if a holder panicked mid-draw.
            Err(poisoned) => poisoned.into_inner(),
        };
        rng.gen_range(0..SEED_RANGE)
    }
}

/// Deterministic per-request noise stream.
///
/// The first draw is the request seed itself so attempt 1 is reproducible
/// from the seed alone; later draws continue a `StdRng` seeded with it.
pub struct NoiseGenerator {
    seed: u64,
    draws: u32,
    rng: StdRng,
}

impl NoiseGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            draws: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seed the generator was created with
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of seeds drawn so far
    pub fn draws(&self) -> u32 {
        self.draws
    }

    /// Draw the seed for the next backend call
    pub fn next_seed(&mut self) -> u64 {
        self.draws += 1;
        if self.draws == 1 {
            self.seed
        } else {
            self.rng.gen_range(0..SEED_RANGE)
        }
    }
}
