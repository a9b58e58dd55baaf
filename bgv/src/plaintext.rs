//! Packed plaintexts.

use serde::{Deserialize, Serialize};

use crate::utils::reduce_signed;

/// A packed plaintext: one integer in `[0, p)` per slot.
///
/// Negative logical values are carried as `p - |v|`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BgvPlaintext(
    /// The packed slot values.
    pub Vec<u64>,
);

impl BgvPlaintext {
    /// Creates a packed plaintext from canonical slot values.
    #[inline]
    pub fn new(values: Vec<u64>) -> Self {
        Self(values)
    }

    /// Packs signed values, mapping each into `[0, p)`.
    pub fn from_signed(values: &[i64], modulus: u64) -> Self {
        Self(values.iter().map(|&v| reduce_signed(v, modulus)).collect())
    }

    /// Unpacks into signed values by centered lift.
    pub fn to_signed(&self, modulus: u64) -> Vec<i64> {
        self.0
            .iter()
            .map(|&v| {
                if v > modulus / 2 {
                    v as i64 - modulus as i64
                } else {
                    v as i64
                }
            })
            .collect()
    }

    /// Returns the packed slot values.
    #[inline]
    pub fn values(&self) -> &[u64] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_round_trip() {
        let p = 65537;
        let values = [-1, 0, 3, -32768, 32768];
        let packed = BgvPlaintext::from_signed(&values, p);
        assert_eq!(packed.values()[0], p - 1);
        assert_eq!(packed.to_signed(p), values);
    }
}
