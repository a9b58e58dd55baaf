//! Context of the leveled slot scheme.

use std::sync::{Mutex, MutexGuard};

use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;

use crate::BgvParameters;

/// Define the context of the scheme.
///
/// The context owns the parameter set and the csrng used for key generation.
/// Evaluation never touches the csrng, so a context behind a shared reference
/// can serve concurrent evaluation tasks once key generation has finished.
#[derive(Debug)]
pub struct BgvContext {
    params: BgvParameters,
    csrng: Mutex<ChaCha12Rng>,
}

impl BgvContext {
    /// Creates a new instance.
    #[inline]
    pub fn new(params: BgvParameters) -> Self {
        Self {
            params,
            csrng: Mutex::new(ChaCha12Rng::from_entropy()),
        }
    }

    /// Creates a new instance with a fixed csrng seed, for reproducible runs.
    #[inline]
    pub fn new_seeded(params: BgvParameters, seed: u64) -> Self {
        Self {
            params,
            csrng: Mutex::new(ChaCha12Rng::seed_from_u64(seed)),
        }
    }

    /// Returns the parameter set.
    #[inline]
    pub fn params(&self) -> BgvParameters {
        self.params
    }

    /// Returns the csrng of [`BgvContext`].
    #[inline]
    pub fn csrng_mut(&self) -> MutexGuard<'_, ChaCha12Rng> {
        self.csrng.lock().expect("csrng lock poisoned")
    }
}
