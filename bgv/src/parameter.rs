//! Public parameters of the leveled slot scheme.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::BgvError;

/// Parameters fixed at context creation.
///
/// A ciphertext packs `slots` integers modulo `plaintext_modulus` and starts
/// with a budget of `max_depth` multiplications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BgvParameters {
    /// Number of plaintext slots per ciphertext.
    slots: usize,
    /// The prime modulus of the packed integers, refers to **`p`**.
    plaintext_modulus: u64,
    /// Multiplicative depth supported before a refresh is required.
    max_depth: usize,
}

impl BgvParameters {
    /// Creates a validated parameter set.
    pub fn new(slots: usize, plaintext_modulus: u64, max_depth: usize) -> Result<Self, BgvError> {
        if slots < 2 {
            return Err(BgvError::SlotCountUnValid(slots));
        }
        if !is_odd_prime(plaintext_modulus) {
            return Err(BgvError::PlaintextModulusUnValid(plaintext_modulus));
        }
        if max_depth == 0 {
            return Err(BgvError::DepthUnValid(max_depth));
        }
        Ok(Self {
            slots,
            plaintext_modulus,
            max_depth,
        })
    }

    /// Returns the number of plaintext slots per ciphertext.
    #[inline]
    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Returns the plaintext modulus `p`.
    #[inline]
    pub fn plaintext_modulus(&self) -> u64 {
        self.plaintext_modulus
    }

    /// Returns the maximum multiplicative depth.
    #[inline]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

/// Default demo parameters: 64 slots over p = 65537 at depth 12.
pub static DEMO_PARAMETERS: Lazy<BgvParameters> =
    Lazy::new(|| BgvParameters::new(64, 65537, 12).unwrap());

fn is_odd_prime(n: u64) -> bool {
    if n < 3 || n % 2 == 0 {
        return false;
    }
    let mut d = 3;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_parameters() {
        assert!(BgvParameters::new(1, 65537, 12).is_err());
        assert!(BgvParameters::new(64, 65536, 12).is_err());
        assert!(BgvParameters::new(64, 65537, 0).is_err());
        assert!(BgvParameters::new(64, 786433, 20).is_ok());
    }
}
