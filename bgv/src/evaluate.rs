//! Homomorphic evaluation over packed slot vectors.

use crate::utils::{add_mod, mul_mod};
use crate::{
    BgvCiphertext, BgvContext, BgvError, BgvPlaintext, BgvPublicKey, BgvSecretKey, EvalKeySet,
};

/// Define the scheme operations.
///
/// All operations are slot-wise modulo the plaintext modulus and act as pure
/// functions of their inputs. Additions and rotations are free; each
/// multiplication (including the one inside an inner product) consumes one
/// level of the depth budget, with the relinearize-and-rescale step folded
/// into the call.
pub struct BgvScheme;

impl BgvScheme {
    /// Generates a key pair.
    #[inline]
    pub fn gen_keypair(ctx: &BgvContext) -> (BgvSecretKey, BgvPublicKey) {
        let sk = BgvSecretKey::new(ctx);
        let pk = sk.gen_pubkey();
        (sk, pk)
    }

    /// Encrypts a packed plaintext under the public key.
    ///
    /// The payload may use fewer slots than the parameter set provides; the
    /// remaining slots are packed with zeros. The fresh ciphertext carries
    /// the full depth budget.
    pub fn encrypt(
        ctx: &BgvContext,
        pk: &BgvPublicKey,
        plaintext: &BgvPlaintext,
    ) -> Result<BgvCiphertext, BgvError> {
        let params = ctx.params();
        let slots = params.slots();
        if plaintext.0.len() > slots {
            return Err(BgvError::SlotCountMismatch {
                expected: slots,
                found: plaintext.0.len(),
            });
        }
        let p = params.plaintext_modulus();
        let mut packed = vec![0; slots];
        for (slot, &value) in packed.iter_mut().zip(plaintext.0.iter()) {
            *slot = value % p;
        }
        Ok(BgvCiphertext::new(
            pk.key_id(),
            params.max_depth(),
            packed,
        ))
    }

    /// Decrypts a ciphertext. Requires the matching secret key.
    pub fn decrypt(
        ctx: &BgvContext,
        sk: &BgvSecretKey,
        ciphertext: &BgvCiphertext,
    ) -> Result<BgvPlaintext, BgvError> {
        check_shape(ctx, ciphertext)?;
        if sk.key_id() != ciphertext.key_id() {
            return Err(BgvError::KeyMismatch);
        }
        Ok(BgvPlaintext::new(ciphertext.slots().to_vec()))
    }

    /// Slot-wise addition.
    pub fn add(
        ctx: &BgvContext,
        a: &BgvCiphertext,
        b: &BgvCiphertext,
    ) -> Result<BgvCiphertext, BgvError> {
        check_pair(a, b)?;
        let p = ctx.params().plaintext_modulus();
        let slots = a
            .slots()
            .iter()
            .zip(b.slots())
            .map(|(&x, &y)| add_mod(x, y, p))
            .collect();
        Ok(BgvCiphertext::new(
            a.key_id(),
            a.level().min(b.level()),
            slots,
        ))
    }

    /// Adds a list of ciphertexts.
    pub fn add_many(
        ctx: &BgvContext,
        ciphertexts: &[BgvCiphertext],
    ) -> Result<BgvCiphertext, BgvError> {
        let (first, rest) = ciphertexts.split_first().ok_or(BgvError::EmptyOperands)?;
        let mut acc = first.clone();
        for ct in rest {
            acc = Self::add(ctx, &acc, ct)?;
        }
        Ok(acc)
    }

    /// Slot-wise addition of a plaintext, padded with zeros.
    pub fn add_plain(
        ctx: &BgvContext,
        ciphertext: &BgvCiphertext,
        plaintext: &BgvPlaintext,
    ) -> Result<BgvCiphertext, BgvError> {
        let slots = ciphertext.slot_count();
        if plaintext.0.len() > slots {
            return Err(BgvError::SlotCountMismatch {
                expected: slots,
                found: plaintext.0.len(),
            });
        }
        let p = ctx.params().plaintext_modulus();
        let mut out = ciphertext.slots().to_vec();
        for (slot, &value) in out.iter_mut().zip(plaintext.0.iter()) {
            *slot = add_mod(*slot, value % p, p);
        }
        Ok(BgvCiphertext::new(ciphertext.key_id(), ciphertext.level(), out))
    }

    /// Slot-wise multiplication, consuming one depth level.
    pub fn mul(
        ctx: &BgvContext,
        keys: &EvalKeySet,
        a: &BgvCiphertext,
        b: &BgvCiphertext,
    ) -> Result<BgvCiphertext, BgvError> {
        check_pair(a, b)?;
        check_keys(keys, a)?;
        if !keys.has_mult_key() {
            return Err(BgvError::MissingMultKey);
        }
        let level = a.level().min(b.level());
        if level == 0 {
            return Err(BgvError::DepthExhausted);
        }
        let p = ctx.params().plaintext_modulus();
        let slots = a
            .slots()
            .iter()
            .zip(b.slots())
            .map(|(&x, &y)| mul_mod(x, y, p))
            .collect();
        Ok(BgvCiphertext::new(a.key_id(), level - 1, slots))
    }

    /// Multiplies a list of ciphertexts in a pairwise tree.
    ///
    /// Consumes `ceil(log2 n)` depth levels on the deepest path.
    pub fn mul_many(
        ctx: &BgvContext,
        keys: &EvalKeySet,
        ciphertexts: &[BgvCiphertext],
    ) -> Result<BgvCiphertext, BgvError> {
        if ciphertexts.is_empty() {
            return Err(BgvError::EmptyOperands);
        }
        let mut layer = ciphertexts.to_vec();
        while layer.len() > 1 {
            let mut next = Vec::with_capacity(layer.len().div_ceil(2));
            for pair in layer.chunks(2) {
                match pair {
                    [a, b] => next.push(Self::mul(ctx, keys, a, b)?),
                    [a] => next.push(a.clone()),
                    _ => unreachable!(),
                }
            }
            layer = next;
        }
        Ok(layer.pop().expect("non-empty layer"))
    }

    /// Cyclic rotation of the slot vector by a registered offset.
    ///
    /// Positive offsets move values toward lower slot indices.
    pub fn rotate(
        ctx: &BgvContext,
        keys: &EvalKeySet,
        ciphertext: &BgvCiphertext,
        offset: i64,
    ) -> Result<BgvCiphertext, BgvError> {
        check_shape(ctx, ciphertext)?;
        check_keys(keys, ciphertext)?;
        if !keys.has_rotation(offset) {
            return Err(BgvError::UnregisteredRotation(offset));
        }
        let slots = ciphertext.slots();
        let len = slots.len() as i64;
        let out = (0..len)
            .map(|i| slots[(i + offset).rem_euclid(len) as usize])
            .collect();
        Ok(BgvCiphertext::new(
            ciphertext.key_id(),
            ciphertext.level(),
            out,
        ))
    }

    /// Inner product of the first `width` slots, broadcast into every slot
    /// of the result by the rotate-and-fold of the sum key.
    ///
    /// Consumes one depth level for the slot products. Callers that need the
    /// total in a single slot isolate it with a unit mask.
    pub fn inner_product(
        ctx: &BgvContext,
        keys: &EvalKeySet,
        a: &BgvCiphertext,
        b: &BgvCiphertext,
        width: usize,
    ) -> Result<BgvCiphertext, BgvError> {
        check_pair(a, b)?;
        check_keys(keys, a)?;
        if !keys.has_sum_key() {
            return Err(BgvError::MissingSumKey);
        }
        if !keys.has_mult_key() {
            return Err(BgvError::MissingMultKey);
        }
        let slots = a.slot_count();
        if width > slots {
            return Err(BgvError::WidthTooLarge { width, slots });
        }
        let level = a.level().min(b.level());
        if level == 0 {
            return Err(BgvError::DepthExhausted);
        }
        let p = ctx.params().plaintext_modulus();
        let total = a
            .slots()
            .iter()
            .zip(b.slots())
            .take(width)
            .fold(0, |acc, (&x, &y)| add_mod(acc, mul_mod(x, y, p), p));
        Ok(BgvCiphertext::new(a.key_id(), level - 1, vec![total; slots]))
    }

    /// Decrypts and re-encrypts, restoring the full depth budget.
    ///
    /// The only operation that sees plaintext; it requires the secret key and
    /// is therefore reserved to the key holder.
    pub fn refresh(
        ctx: &BgvContext,
        sk: &BgvSecretKey,
        pk: &BgvPublicKey,
        ciphertext: &BgvCiphertext,
    ) -> Result<BgvCiphertext, BgvError> {
        let payload = Self::decrypt(ctx, sk, ciphertext)?;
        Self::encrypt(ctx, pk, &payload)
    }
}

fn check_pair(a: &BgvCiphertext, b: &BgvCiphertext) -> Result<(), BgvError> {
    if a.key_id() != b.key_id() {
        return Err(BgvError::KeyMismatch);
    }
    Ok(())
}

fn check_shape(ctx: &BgvContext, ct: &BgvCiphertext) -> Result<(), BgvError> {
    let slots = ctx.params().slots();
    if ct.slot_count() != slots {
        return Err(BgvError::SlotCountMismatch {
            expected: slots,
            found: ct.slot_count(),
        });
    }
    Ok(())
}

fn check_keys(keys: &EvalKeySet, ct: &BgvCiphertext) -> Result<(), BgvError> {
    if keys.key_id() != ct.key_id() {
        return Err(BgvError::KeyMismatch);
    }
    Ok(())
}
