//! Encrypted combinatorial predicates.
//!
//! Data-dependent selection cannot branch on encrypted values, so the
//! mechanism emulates it with fixed arithmetic circuits: running prefix
//! products, first-set-bit preservation and a bounded zero test. All of them
//! keep the `cond * a + (1 - cond) * b` shape; none inspects a slot value.

use bgv::{
    inv_mod, mul_mod, BgvCiphertext, BgvContext, BgvPlaintext, BgvPublicKey, BgvScheme, EvalKeySet,
};

use crate::masking::ceil_log2;
use crate::TtcError;

/// Working head-room a width-`w` prefix circuit needs: the right rotations
/// spill at most `2w - 1` slots past the logical region and must never wrap
/// back into it.
fn check_headroom(ctx: &BgvContext, width: usize) -> Result<(), TtcError> {
    let slots = ctx.params().slots();
    if slots < 4 * width {
        return Err(TtcError::InsufficientSlots { slots, width });
    }
    Ok(())
}

/// Computes in slot i the product of slots 0..=i of the first `width` slots.
///
/// `ceil(log2 width)` rounds of rotate-and-multiply, padding each rotation's
/// vacated prefix with ones; costs one depth level per round.
pub fn eval_prefix_mult(
    ctx: &BgvContext,
    keys: &EvalKeySet,
    ciphertext: &BgvCiphertext,
    width: usize,
) -> Result<BgvCiphertext, TtcError> {
    check_headroom(ctx, width)?;
    let mut acc = ciphertext.clone();
    for round in 0..ceil_log2(width) {
        let step = 1i64 << round;
        let rotated = BgvScheme::rotate(ctx, keys, &acc, -step)?;
        let padded = BgvScheme::add_plain(ctx, &rotated, &BgvPlaintext::new(vec![1; step as usize]))?;
        acc = BgvScheme::mul(ctx, keys, &acc, &padded)?;
    }
    Ok(acc)
}

/// Precomputed constants for [`eval_preserve_lead_one`].
#[derive(Debug, Clone)]
pub struct PreserveLeadOneContext {
    width: usize,
    enc_ones: BgvCiphertext,
    enc_neg_ones: BgvCiphertext,
    enc_leading_one: BgvCiphertext,
}

impl PreserveLeadOneContext {
    /// Encrypts the constant vectors for logical width `width`.
    pub fn new(ctx: &BgvContext, pk: &BgvPublicKey, width: usize) -> Result<Self, TtcError> {
        check_headroom(ctx, width)?;
        let p = ctx.params().plaintext_modulus();
        let mut leading_one = vec![0; width];
        leading_one[0] = 1;
        Ok(Self {
            width,
            enc_ones: BgvScheme::encrypt(ctx, pk, &BgvPlaintext::new(vec![1; width]))?,
            enc_neg_ones: BgvScheme::encrypt(ctx, pk, &BgvPlaintext::new(vec![p - 1; width]))?,
            enc_leading_one: BgvScheme::encrypt(ctx, pk, &BgvPlaintext::new(leading_one))?,
        })
    }

    /// Returns the logical width.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the encrypted all-ones constant.
    #[inline]
    pub fn enc_ones(&self) -> &BgvCiphertext {
        &self.enc_ones
    }

    /// Returns the encrypted all-minus-ones constant.
    #[inline]
    pub fn enc_neg_ones(&self) -> &BgvCiphertext {
        &self.enc_neg_ones
    }
}

/// Zeroes every 1 of a 0/1 vector except the leftmost.
///
/// Slot i survives exactly when no earlier slot was set:
/// `x_i * prefix((1 - x_0) ... (1 - x_(i-1)))`. Costs the prefix depth plus
/// two levels, and is idempotent on 0/1 inputs.
pub fn eval_preserve_lead_one(
    ctx: &BgvContext,
    keys: &EvalKeySet,
    ciphertext: &BgvCiphertext,
    pctx: &PreserveLeadOneContext,
) -> Result<BgvCiphertext, TtcError> {
    let flipped = BgvScheme::mul(ctx, keys, ciphertext, &pctx.enc_neg_ones)?;
    let complements = BgvScheme::add(ctx, &flipped, &pctx.enc_ones)?;
    let prefix = eval_prefix_mult(ctx, keys, &complements, pctx.width)?;
    let shifted = BgvScheme::rotate(ctx, keys, &prefix, -1)?;
    let gate = BgvScheme::add(ctx, &pctx.enc_leading_one, &shifted)?;
    BgvScheme::mul(ctx, keys, ciphertext, &gate).map_err(TtcError::from)
}

/// Precomputed constants for [`eval_not_equal_zero`] over a declared range.
#[derive(Debug, Clone)]
pub struct NotEqualZeroContext {
    range: u64,
    enc_one: BgvCiphertext,
    enc_neg_range: Vec<BgvCiphertext>,
    enc_inv_factorial: BgvCiphertext,
}

impl NotEqualZeroContext {
    /// Encrypts the range constants and the sign-corrected inverse of the
    /// range factorial for inputs in `[0, range]` packed in `width` slots.
    pub fn new(
        ctx: &BgvContext,
        pk: &BgvPublicKey,
        width: usize,
        range: u64,
    ) -> Result<Self, TtcError> {
        let p = ctx.params().plaintext_modulus();
        if range == 0 || range >= p {
            return Err(TtcError::RangeTooLarge { range, modulus: p });
        }
        let mut factorial = 1;
        for i in 2..=range {
            factorial = mul_mod(factorial, i, p);
        }
        // The product (x-1)...(x-r) evaluates to (-1)^r * r! at zero, so the
        // factorial inverse absorbs the opposite sign to make the indicator
        // land exactly on 0 and 1 for even and odd ranges alike.
        let mut inv_factorial = inv_mod(factorial, p)?;
        if range % 2 == 0 {
            inv_factorial = p - inv_factorial;
        }
        let enc_neg_range = (1..=range)
            .map(|i| {
                BgvScheme::encrypt(ctx, pk, &BgvPlaintext::new(vec![p - i; width]))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            range,
            enc_one: BgvScheme::encrypt(ctx, pk, &BgvPlaintext::new(vec![1; width]))?,
            enc_neg_range,
            enc_inv_factorial: BgvScheme::encrypt(
                ctx,
                pk,
                &BgvPlaintext::new(vec![inv_factorial; width]),
            )?,
        })
    }

    /// Returns the declared input range.
    #[inline]
    pub fn range(&self) -> u64 {
        self.range
    }
}

/// Maps every slot value in `[0, range]` to 1 if nonzero, 0 if zero.
///
/// `1 - (-1)^r * (x-1)(x-2)...(x-r) / r!`: the falling product vanishes on
/// [1, r] and equals `(-1)^r * r!` at zero. One multiplication tree of
/// `range + 1` factors plus one addition. Slot values outside the declared
/// range produce unspecified results; the caller guarantees the bound.
pub fn eval_not_equal_zero(
    ctx: &BgvContext,
    keys: &EvalKeySet,
    ciphertext: &BgvCiphertext,
    nctx: &NotEqualZeroContext,
) -> Result<BgvCiphertext, TtcError> {
    let mut factors = Vec::with_capacity(nctx.enc_neg_range.len() + 1);
    for offset in &nctx.enc_neg_range {
        factors.push(BgvScheme::add(ctx, ciphertext, offset)?);
    }
    factors.push(nctx.enc_inv_factorial.clone());
    let product = BgvScheme::mul_many(ctx, keys, &factors)?;
    BgvScheme::add(ctx, &nctx.enc_one, &product).map_err(TtcError::from)
}

/// Raises every slot to the power `exponent` by square and multiply.
///
/// Costs `ceil(log2 exponent)` squaring levels plus the selection tree.
pub fn eval_exponentiate(
    ctx: &BgvContext,
    keys: &EvalKeySet,
    ciphertext: &BgvCiphertext,
    exponent: u32,
) -> Result<BgvCiphertext, TtcError> {
    if exponent == 0 {
        return Err(TtcError::ExponentOutOfRange(exponent));
    }
    let msb = (u32::BITS - exponent.leading_zeros()) as usize;
    let mut squarings = Vec::with_capacity(msb);
    squarings.push(ciphertext.clone());
    for i in 1..msb {
        let next = BgvScheme::mul(ctx, keys, &squarings[i - 1], &squarings[i - 1])?;
        squarings.push(next);
    }
    let selected: Vec<BgvCiphertext> = (0..msb)
        .filter(|i| exponent >> i & 1 == 1)
        .map(|i| squarings[i].clone())
        .collect();
    BgvScheme::mul_many(ctx, keys, &selected).map_err(TtcError::from)
}
