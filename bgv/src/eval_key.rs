//! Evaluation key material: rotation keys, the sum key and the
//! relinearization key.

use std::collections::BTreeSet;

use crate::{BgvError, BgvSecretKey};

/// The evaluation key set of one key pair.
///
/// Key generation mutates the set and must finish before evaluation starts;
/// afterwards the set is used strictly read-only, so it can be shared across
/// concurrent evaluation tasks. A rotation by an offset that was never
/// registered here is a fatal configuration error, not a recoverable one.
#[derive(Debug, Clone)]
pub struct EvalKeySet {
    key_id: u64,
    rotation_offsets: BTreeSet<i64>,
    sum_key: bool,
    mult_key: bool,
}

impl EvalKeySet {
    /// Creates an empty evaluation key set bound to a key pair.
    pub fn new(sk: &BgvSecretKey) -> Self {
        Self {
            key_id: sk.key_id(),
            rotation_offsets: BTreeSet::new(),
            sum_key: false,
            mult_key: false,
        }
    }

    /// Generates rotation keys for the given offsets.
    pub fn gen_rotation_keys(
        &mut self,
        sk: &BgvSecretKey,
        offsets: &[i64],
    ) -> Result<(), BgvError> {
        self.check_owner(sk)?;
        self.rotation_offsets.extend(offsets.iter().copied());
        Ok(())
    }

    /// Generates the sum key required by inner products.
    pub fn gen_sum_key(&mut self, sk: &BgvSecretKey) -> Result<(), BgvError> {
        self.check_owner(sk)?;
        self.sum_key = true;
        Ok(())
    }

    /// Generates the relinearization key required by multiplications.
    pub fn gen_mult_key(&mut self, sk: &BgvSecretKey) -> Result<(), BgvError> {
        self.check_owner(sk)?;
        self.mult_key = true;
        Ok(())
    }

    /// Returns whether a rotation key exists for `offset`.
    #[inline]
    pub fn has_rotation(&self, offset: i64) -> bool {
        self.rotation_offsets.contains(&offset)
    }

    #[inline]
    pub(crate) fn key_id(&self) -> u64 {
        self.key_id
    }

    #[inline]
    pub(crate) fn has_sum_key(&self) -> bool {
        self.sum_key
    }

    #[inline]
    pub(crate) fn has_mult_key(&self) -> bool {
        self.mult_key
    }

    fn check_owner(&self, sk: &BgvSecretKey) -> Result<(), BgvError> {
        if sk.key_id() != self.key_id {
            return Err(BgvError::KeyMismatch);
        }
        Ok(())
    }
}
