//! The public key of the scheme.

/// Define the public key of the scheme.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BgvPublicKey {
    key_id: u64,
}

impl BgvPublicKey {
    #[inline]
    pub(crate) fn new(key_id: u64) -> Self {
        Self { key_id }
    }

    #[inline]
    pub(crate) fn key_id(&self) -> u64 {
        self.key_id
    }
}
