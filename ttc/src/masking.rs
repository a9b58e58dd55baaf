//! Rotation-key registration, slot replication and unit-basis masks.

use bgv::{
    BgvCiphertext, BgvContext, BgvPlaintext, BgvPublicKey, BgvScheme, BgvSecretKey, EvalKeySet,
};
use rayon::prelude::*;

use crate::TtcError;

/// Unit-basis extraction masks for a logical slot width, together with the
/// rotation-key registrations every later component relies on.
///
/// Setup must run once, before any rotation or masking operation, and must
/// cover the superset of offsets requested later: plus and minus every step
/// up to the width, and the powers of two the prefix circuits rotate by.
#[derive(Debug, Clone)]
pub struct SlotMasks {
    slots: usize,
    masks: Vec<BgvCiphertext>,
}

impl SlotMasks {
    /// Registers rotation and sum keys and encrypts the unit-basis masks.
    pub fn setup(
        ctx: &BgvContext,
        sk: &BgvSecretKey,
        pk: &BgvPublicKey,
        keys: &mut EvalKeySet,
        slots: usize,
    ) -> Result<Self, TtcError> {
        if slots == 0 || slots > ctx.params().slots() {
            return Err(TtcError::DimensionMismatch {
                expected: ctx.params().slots(),
                found: slots,
            });
        }
        let mut offsets = Vec::with_capacity(2 * slots + 2);
        for i in 0..=slots as i64 {
            offsets.push(i);
            offsets.push(-i);
        }
        for k in 0..=ceil_log2(slots) {
            let step = 1i64 << k;
            offsets.push(step);
            offsets.push(-step);
        }
        keys.gen_rotation_keys(sk, &offsets)?;
        keys.gen_sum_key(sk)?;

        let masks = (0..slots)
            .into_par_iter()
            .map(|elem| {
                let mut mask = vec![0; slots];
                mask[elem] = 1;
                BgvScheme::encrypt(ctx, pk, &BgvPlaintext::new(mask))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { slots, masks })
    }

    /// Returns the logical slot width the masks were built for.
    #[inline]
    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Returns the mask isolating slot `index`.
    #[inline]
    pub fn mask(&self, index: usize) -> &BgvCiphertext {
        &self.masks[index]
    }

    /// Returns all unit-basis masks.
    #[inline]
    pub fn masks(&self) -> &[BgvCiphertext] {
        &self.masks
    }
}

/// Tiles a logical pattern periodically across `total` slots.
///
/// Cyclic rotation of the tiled vector then acts as exact cyclic rotation of
/// the logical pattern, which the diagonal product layer depends on; the
/// pattern length must therefore divide the slot count.
pub fn rep_fill_slots(pattern: &[u64], total: usize) -> Result<Vec<u64>, TtcError> {
    if pattern.is_empty() || total % pattern.len() != 0 {
        return Err(TtcError::ReplicationMisfit {
            slots: total,
            pattern_len: pattern.len(),
        });
    }
    Ok(pattern
        .iter()
        .copied()
        .cycle()
        .take(total)
        .collect())
}

/// Ceiling of the base-two logarithm, with `ceil_log2(1) == 0`.
#[inline]
pub(crate) fn ceil_log2(n: usize) -> u32 {
    if n <= 1 {
        0
    } else {
        usize::BITS - (n - 1).leading_zeros()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rep_fill_tiles_exactly() {
        let tiled = rep_fill_slots(&[1, 2, 3], 9).unwrap();
        assert_eq!(tiled, vec![1, 2, 3, 1, 2, 3, 1, 2, 3]);
        assert!(rep_fill_slots(&[1, 2, 3], 10).is_err());
        assert!(rep_fill_slots(&[], 10).is_err());
    }

    #[test]
    fn ceil_log2_values() {
        assert_eq!(ceil_log2(1), 0);
        assert_eq!(ceil_log2(2), 1);
        assert_eq!(ceil_log2(5), 3);
        assert_eq!(ceil_log2(8), 3);
        assert_eq!(ceil_log2(9), 4);
    }
}
