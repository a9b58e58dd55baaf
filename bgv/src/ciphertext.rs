//! Ciphertexts of the leveled slot scheme.

use serde::{Deserialize, Serialize};

/// An encrypted slot vector.
///
/// `level` is the remaining multiplicative-depth budget. Every multiplication
/// lowers it by one; only a refresh under the secret key restores it. The
/// scheme never mutates a ciphertext in place, operations return new values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BgvCiphertext {
    key_id: u64,
    level: usize,
    slots: Vec<u64>,
}

impl BgvCiphertext {
    #[inline]
    pub(crate) fn new(key_id: u64, level: usize, slots: Vec<u64>) -> Self {
        Self {
            key_id,
            level,
            slots,
        }
    }

    /// Returns the remaining multiplicative-depth budget.
    #[inline]
    pub fn level(&self) -> usize {
        self.level
    }

    /// Returns the number of slots.
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) fn key_id(&self) -> u64 {
        self.key_id
    }

    #[inline]
    pub(crate) fn slots(&self) -> &[u64] {
        &self.slots
    }
}
