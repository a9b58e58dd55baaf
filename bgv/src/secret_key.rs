//! The secret key of the scheme.

use rand::Rng;

use crate::{BgvContext, BgvPublicKey};

/// Define the secret key of the scheme.
///
/// Decryption and refresh are the only operations that take it; everything
/// else works from the public key and the evaluation key set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BgvSecretKey {
    key_id: u64,
}

impl BgvSecretKey {
    /// Generates a new secret key.
    pub fn new(ctx: &BgvContext) -> Self {
        let key_id = ctx.csrng_mut().gen();
        Self { key_id }
    }

    /// Generates the matching public key.
    #[inline]
    pub fn gen_pubkey(&self) -> BgvPublicKey {
        BgvPublicKey::new(self.key_id)
    }

    #[inline]
    pub(crate) fn key_id(&self) -> u64 {
        self.key_id
    }
}
