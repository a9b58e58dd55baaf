//! Conversions between the row-packed, column-packed and element-packed
//! encodings of an encrypted square matrix.

use bgv::{BgvCiphertext, BgvContext, BgvScheme, EvalKeySet};
use itertools::iproduct;

use crate::{SlotMasks, TtcError};

/// Transforms row encryptions into encryptions of the columns.
///
/// Every matrix element is masked out of its row and rotated into its
/// position within the destination column; one addition tree per column
/// collects the contributions. Costs one depth level for the masking.
pub fn rows_to_cols(
    ctx: &BgvContext,
    keys: &EvalKeySet,
    masks: &SlotMasks,
    rows: &[BgvCiphertext],
) -> Result<Vec<BgvCiphertext>, TtcError> {
    let n = check_rows(masks, rows)?;
    let mut col_parts: Vec<Vec<BgvCiphertext>> = vec![Vec::with_capacity(n); n];
    for (row, elem) in iproduct!(0..n, 0..n) {
        let masked = BgvScheme::mul(ctx, keys, &rows[row], masks.mask(elem))?;
        let rotated = BgvScheme::rotate(ctx, keys, &masked, elem as i64 - row as i64)?;
        col_parts[elem].push(rotated);
    }
    col_parts
        .iter()
        .map(|parts| BgvScheme::add_many(ctx, parts).map_err(TtcError::from))
        .collect()
}

/// Transforms row encryptions into an element-packed grid, each matrix
/// element isolated in slot zero of its own ciphertext.
///
/// Costs one depth level for the masking.
pub fn rows_to_elems(
    ctx: &BgvContext,
    keys: &EvalKeySet,
    masks: &SlotMasks,
    rows: &[BgvCiphertext],
) -> Result<Vec<Vec<BgvCiphertext>>, TtcError> {
    let n = check_rows(masks, rows)?;
    rows.iter()
        .map(|row_ct| {
            (0..n)
                .map(|col| {
                    let masked = BgvScheme::mul(ctx, keys, row_ct, masks.mask(col))?;
                    BgvScheme::rotate(ctx, keys, &masked, col as i64).map_err(TtcError::from)
                })
                .collect()
        })
        .collect()
}

/// Transforms an element-packed grid into row encryptions.
///
/// Elements are already isolated, so no masking is needed: each element is
/// rotated into its slot position and the row is collected by an addition
/// tree. Free of depth cost.
pub fn elems_to_rows(
    ctx: &BgvContext,
    keys: &EvalKeySet,
    elems: &[Vec<BgvCiphertext>],
) -> Result<Vec<BgvCiphertext>, TtcError> {
    let n = check_square(elems)?;
    (0..n)
        .map(|row| {
            let parts = (0..n)
                .map(|col| BgvScheme::rotate(ctx, keys, &elems[row][col], -(col as i64)))
                .collect::<Result<Vec<_>, _>>()?;
            BgvScheme::add_many(ctx, &parts).map_err(TtcError::from)
        })
        .collect()
}

/// Transforms an element-packed grid into column encryptions.
pub fn elems_to_cols(
    ctx: &BgvContext,
    keys: &EvalKeySet,
    elems: &[Vec<BgvCiphertext>],
) -> Result<Vec<BgvCiphertext>, TtcError> {
    let n = check_square(elems)?;
    (0..n)
        .map(|col| {
            let parts = (0..n)
                .map(|row| BgvScheme::rotate(ctx, keys, &elems[row][col], -(row as i64)))
                .collect::<Result<Vec<_>, _>>()?;
            BgvScheme::add_many(ctx, &parts).map_err(TtcError::from)
        })
        .collect()
}

fn check_rows(masks: &SlotMasks, rows: &[BgvCiphertext]) -> Result<usize, TtcError> {
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

pub(crate) fn check_square(elems: &[Vec<BgvCiphertext>]) -> Result<usize, TtcError> {
    if elems.is_empty() {
        return Err(TtcError::EmptyMatrix);
    }
    let n = elems.len();
    for row in elems {
        if row.len() != n {
            return Err(TtcError::NonSquareMatrix {
                rows: n,
                cols: row.len(),
            });
        }
    }
    Ok(n)
}
