//! Matrix exponentiation in logarithmic multiplicative depth.
//!
//! A row-encrypted matrix is raised to a public exponent by square and
//! multiply: an arena of successive squarings feeds a pairwise product tree
//! over the squarings selected by the exponent's set bits. Each tree stage
//! costs two depth levels (the inner products and the slot-zero isolation),
//! so the whole exponentiation stays within O(log exponent) depth where
//! naive repeated multiplication would need a level per factor.

use bgv::{BgvCiphertext, BgvContext, BgvScheme, EvalKeySet};
use rayon::prelude::*;

use crate::recode::{check_square, elems_to_cols, elems_to_rows, rows_to_cols, rows_to_elems};
use crate::{SlotMasks, TtcError};

type ElemGrid = Vec<Vec<BgvCiphertext>>;

/// Computes the arena of element-packed squarings `A^(2^i)` for
/// `i = 0..=count`.
///
/// Index 0 is the element-isolated input itself; index 1 is squared directly
/// from the row and column encryptions; higher indices square the previous
/// entry through the product tree.
pub fn eval_squarings(
    ctx: &BgvContext,
    keys: &EvalKeySet,
    masks: &SlotMasks,
    enc_rows: &[BgvCiphertext],
    count: usize,
) -> Result<Vec<ElemGrid>, TtcError> {
    let n = enc_rows.len();
    let mut arena = Vec::with_capacity(count + 1);
    arena.push(rows_to_elems(ctx, keys, masks, enc_rows)?);
    if count >= 1 {
        let enc_cols = rows_to_cols(ctx, keys, masks, enc_rows)?;
        let squared = (0..n)
            .into_par_iter()
            .map(|row| {
                (0..n)
                    .map(|col| {
                        let elem = BgvScheme::inner_product(
                            ctx,
                            keys,
                            &enc_rows[row],
                            &enc_cols[col],
                            n,
                        )?;
                        BgvScheme::mul(ctx, keys, &elem, masks.mask(0)).map_err(TtcError::from)
                    })
                    .collect::<Result<Vec<_>, TtcError>>()
            })
            .collect::<Result<Vec<_>, TtcError>>()?;
        arena.push(squared);
    }
    for _ in 2..=count {
        let previous = arena.last().expect("arena is never empty");
        let squared = eval_pair_product(ctx, keys, masks, previous, previous)?;
        arena.push(squared);
    }
    Ok(arena)
}

/// Multiplies a power-of-two number of element-packed matrices pairwise
/// until a single product remains.
///
/// The input count must be a power of two greater than one; anything else is
/// a caller contract breach, there is no padding fallback.
pub fn eval_product_tree(
    ctx: &BgvContext,
    keys: &EvalKeySet,
    masks: &SlotMasks,
    mats: Vec<ElemGrid>,
) -> Result<ElemGrid, TtcError> {
    let count = mats.len();
    if count < 2 || !count.is_power_of_two() {
        return Err(TtcError::ProductTreeSize(count));
    }
    let mut layer = mats;
    while layer.len() > 1 {
        let mut next = Vec::with_capacity(layer.len() / 2);
        let mut iter = layer.chunks_exact(2);
        for pair in &mut iter {
            next.push(eval_pair_product(ctx, keys, masks, &pair[0], &pair[1])?);
        }
        layer = next;
    }
    Ok(layer.pop().expect("tree reduces to one matrix"))
}

/// Raises a row-encrypted matrix to the power `exponent`, returning the
/// row-encrypted result.
///
/// Exponents 0 and 1 are rejected before any ciphertext operation: the
/// squaring-selection logic below is undefined for them and the mechanism
/// never asks for them.
pub fn eval_matrix_power(
    ctx: &BgvContext,
    keys: &EvalKeySet,
    masks: &SlotMasks,
    enc_rows: &[BgvCiphertext],
    exponent: u32,
) -> Result<Vec<BgvCiphertext>, TtcError> {
    if exponent < 2 {
        return Err(TtcError::ExponentOutOfRange(exponent));
    }
    let msb = (u32::BITS - exponent.leading_zeros()) as usize;

    let arena = eval_squarings(ctx, keys, masks, enc_rows, msb - 1)?;
    let mut selected: Vec<ElemGrid> = (0..msb)
        .filter(|i| exponent >> i & 1 == 1)
        .map(|i| arena[i].clone())
        .collect();

    // Group the selected squarings into power-of-two batches following the
    // binary decomposition of their count, reduce each batch through the
    // tree, then fold the batch results pairwise.
    let count = selected.len();
    let mut batches = Vec::new();
    for i in 0..usize::BITS as usize {
        if count >> i & 1 == 1 {
            if i == 0 {
                batches.push(selected.pop().expect("selection accounting"));
            } else {
                let group = selected.split_off(selected.len() - (1 << i));
                batches.push(eval_product_tree(ctx, keys, masks, group)?);
            }
        }
    }
    let mut result = batches.pop().expect("at least one set bit in exponent");
    while let Some(batch) = batches.pop() {
        result = eval_product_tree(ctx, keys, masks, vec![result, batch])?;
    }
    elems_to_rows(ctx, keys, &result)
}

/// One stage of the product tree: the element grid of `left * right`.
fn eval_pair_product(
    ctx: &BgvContext,
    keys: &EvalKeySet,
    masks: &SlotMasks,
    left: &ElemGrid,
    right: &ElemGrid,
) -> Result<ElemGrid, TtcError> {
    let n = check_square(left)?;
    let m = check_square(right)?;
    if n != m {
        return Err(TtcError::DimensionMismatch {
            expected: n,
            found: m,
        });
    }
    let enc_rows = elems_to_rows(ctx, keys, left)?;
    let enc_cols = elems_to_cols(ctx, keys, right)?;
    (0..n)
        .into_par_iter()
        .map(|row| {
            (0..n)
                .map(|col| {
                    let elem =
                        BgvScheme::inner_product(ctx, keys, &enc_rows[row], &enc_cols[col], n)?;
                    BgvScheme::mul(ctx, keys, &elem, masks.mask(0)).map_err(TtcError::from)
                })
                .collect::<Result<Vec<_>, TtcError>>()
        })
        .collect()
}
