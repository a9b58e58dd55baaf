//! Encrypted dense matrix products.
//!
//! The square-by-square product uses the diagonal decomposition of the
//! row-linearization and column-linearization permutations, so a d x d
//! product costs O(d) rotations and multiplications on d^2-slot packed
//! operands instead of O(d^2) slot-by-slot products. Matrix-vector products
//! over row encryptions go through per-row inner products instead.

use std::collections::BTreeMap;

use bgv::{BgvCiphertext, BgvContext, BgvPlaintext, BgvPublicKey, BgvScheme, EvalKeySet};

use crate::masking::rep_fill_slots;
use crate::{SlotMasks, TtcError};

/// Precomputed encryptions of the diagonal-indicator families for one matrix
/// dimension.
///
/// Operand matrices are expected row-major flattened into d^2 slots and tiled
/// periodically across the ciphertext, as produced by
/// [`rep_fill_slots`](crate::rep_fill_slots); the indicator families are tiled
/// the same way so every rotation acts cyclically on the logical d^2 window.
#[derive(Debug, Clone)]
pub struct MatrixProductContext {
    dim: usize,
    u_sigma: BTreeMap<i64, BgvCiphertext>,
    u_tau: BTreeMap<i64, BgvCiphertext>,
    v1: BTreeMap<i64, BgvCiphertext>,
    v2: BTreeMap<i64, BgvCiphertext>,
}

impl MatrixProductContext {
    /// Precomputes the encrypted indicator families for dimension `dim`.
    pub fn new(ctx: &BgvContext, pk: &BgvPublicKey, dim: usize) -> Result<Self, TtcError> {
        if dim == 0 {
            return Err(TtcError::EmptyMatrix);
        }
        let d = dim as i64;
        let n = dim * dim;
        let total = ctx.params().slots();
        if total % n != 0 {
            return Err(TtcError::ReplicationMisfit {
                slots: total,
                pattern_len: n,
            });
        }

        let encrypt = |pattern: &[u64]| -> Result<BgvCiphertext, TtcError> {
            let tiled = rep_fill_slots(pattern, total)?;
            BgvScheme::encrypt(ctx, pk, &BgvPlaintext::new(tiled)).map_err(TtcError::from)
        };

        let mut u_sigma = BTreeMap::new();
        for k in -d..=d {
            let mut pattern = vec![0; n];
            for (l, slot) in pattern.iter_mut().enumerate() {
                let l = l as i64;
                let hit = if k < 0 {
                    let t = l - (d + k) * d;
                    -k <= t && t < d
                } else {
                    let t = l - d * k;
                    0 <= t && t < d - k
                };
                if hit {
                    *slot = 1;
                }
            }
            u_sigma.insert(k, encrypt(&pattern)?);
        }

        let mut u_tau = BTreeMap::new();
        for k in 0..dim {
            let mut pattern = vec![0; n];
            for i in 0..dim {
                pattern[k + dim * i] = 1;
            }
            u_tau.insert((dim * k) as i64, encrypt(&pattern)?);
        }

        let mut v1 = BTreeMap::new();
        let mut v2 = BTreeMap::new();
        for k in 1..dim {
            let mut v1_pattern = vec![0; n];
            let mut v2_pattern = vec![0; n];
            for l in 0..n {
                if l % dim < dim - k {
                    v1_pattern[l] = 1;
                } else {
                    v2_pattern[l] = 1;
                }
            }
            v1.insert(k as i64, encrypt(&v1_pattern)?);
            v2.insert(k as i64 - d, encrypt(&v2_pattern)?);
        }

        Ok(Self {
            dim,
            u_sigma,
            u_tau,
            v1,
            v2,
        })
    }

    /// Returns the matrix dimension the context was initialized for.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }
}

/// Multiplies two encrypted d x d matrices packed as d^2-slot tiles.
///
/// Consumes three depth levels: the linearization masking, the shift masking
/// and the final sum of products.
pub fn eval_matrix_product(
    ctx: &BgvContext,
    keys: &EvalKeySet,
    mm: &MatrixProductContext,
    enc_a: &BgvCiphertext,
    enc_b: &BgvCiphertext,
) -> Result<BgvCiphertext, TtcError> {
    let dim = mm.dim;
    let d = dim as i64;

    let mut a0_parts = Vec::with_capacity(2 * dim + 1);
    for (&k, indicator) in &mm.u_sigma {
        let rotated = BgvScheme::rotate(ctx, keys, enc_a, k)?;
        a0_parts.push(BgvScheme::mul(ctx, keys, &rotated, indicator)?);
    }
    let a0 = BgvScheme::add_many(ctx, &a0_parts)?;

    let mut b0_parts = Vec::with_capacity(dim);
    for (&k, indicator) in &mm.u_tau {
        let rotated = BgvScheme::rotate(ctx, keys, enc_b, k)?;
        b0_parts.push(BgvScheme::mul(ctx, keys, &rotated, indicator)?);
    }
    let b0 = BgvScheme::add_many(ctx, &b0_parts)?;

    let mut products = Vec::with_capacity(dim);
    products.push(BgvScheme::mul(ctx, keys, &a0, &b0)?);
    for k in 1..d {
        let a_lo = BgvScheme::mul(
            ctx,
            keys,
            &mm.v1[&k],
            &BgvScheme::rotate(ctx, keys, &a0, k)?,
        )?;
        let a_hi = BgvScheme::mul(
            ctx,
            keys,
            &mm.v2[&(k - d)],
            &BgvScheme::rotate(ctx, keys, &a0, k - d)?,
        )?;
        let a_k = BgvScheme::add(ctx, &a_lo, &a_hi)?;
        let b_k = BgvScheme::rotate(ctx, keys, &b0, d * k)?;
        products.push(BgvScheme::mul(ctx, keys, &a_k, &b_k)?);
    }
    BgvScheme::add_many(ctx, &products).map_err(TtcError::from)
}

/// Multiplies a matrix in generalized-diagonal encryption by a packed vector.
///
/// `diagonals[l]` encrypts the l-th generalized diagonal, slot i holding
/// `M[i][(i + l) mod d]`, tiled like the vector. Costs one depth level.
pub fn eval_diag_matrix_vec_mult(
    ctx: &BgvContext,
    keys: &EvalKeySet,
    diagonals: &[BgvCiphertext],
    enc_vec: &BgvCiphertext,
) -> Result<BgvCiphertext, TtcError> {
    if diagonals.is_empty() {
        return Err(TtcError::EmptyMatrix);
    }
    let mut parts = Vec::with_capacity(diagonals.len());
    for (l, diagonal) in diagonals.iter().enumerate() {
        let rotated = BgvScheme::rotate(ctx, keys, enc_vec, l as i64)?;
        parts.push(BgvScheme::mul(ctx, keys, diagonal, &rotated)?);
    }
    BgvScheme::add_many(ctx, &parts).map_err(TtcError::from)
}

/// Multiplies a row-encrypted matrix by a packed vector.
///
/// One inner product per row, isolated to slot zero and rotated into the
/// row's position of the packed result. Costs two depth levels.
pub fn eval_matrix_vec_mult(
    ctx: &BgvContext,
    keys: &EvalKeySet,
    masks: &SlotMasks,
    enc_rows: &[BgvCiphertext],
    enc_vec: &BgvCiphertext,
) -> Result<BgvCiphertext, TtcError> {
    let n = check_width(masks, enc_rows)?;
    let mut parts = Vec::with_capacity(n);
    for (row, row_ct) in enc_rows.iter().enumerate() {
        let product = BgvScheme::inner_product(ctx, keys, row_ct, enc_vec, n)?;
        let isolated = BgvScheme::mul(ctx, keys, &product, masks.mask(0))?;
        parts.push(BgvScheme::rotate(ctx, keys, &isolated, -(row as i64))?);
    }
    BgvScheme::add_many(ctx, &parts).map_err(TtcError::from)
}

/// Multiplies a packed vector by a row-encrypted matrix.
///
/// Re-encodes the matrix by columns once, then proceeds as the matrix-vector
/// product. Costs three depth levels.
pub fn eval_vec_matrix_mult(
    ctx: &BgvContext,
    keys: &EvalKeySet,
    masks: &SlotMasks,
    enc_vec: &BgvCiphertext,
    enc_rows: &[BgvCiphertext],
) -> Result<BgvCiphertext, TtcError> {
    let enc_cols = crate::recode::rows_to_cols(ctx, keys, masks, enc_rows)?;
    eval_matrix_vec_mult(ctx, keys, masks, &enc_cols, enc_vec)
}

fn check_width(masks: &SlotMasks, rows: &[BgvCiphertext]) -> Result<usize, TtcError> {
    if rows.is_empty() {
        return Err(TtcError::EmptyMatrix);
    }
    if rows.len() > masks.slots() {
        return Err(TtcError::DimensionMismatch {
            expected: masks.slots(),
            found: rows.len(),
        });
    }
    Ok(rows.len())
}
