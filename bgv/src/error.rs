/// Errors that may occur inside the scheme.
#[derive(thiserror::Error, Debug)]
pub enum BgvError {
    /// Error that occurs when the requested slot count is not usable.
    #[error("slot count {0} is not valid!")]
    SlotCountUnValid(
        /// The requested slot count.
        usize,
    ),
    /// Error that occurs when the plaintext modulus is not an odd prime.
    #[error("plaintext modulus {0} is not an odd prime!")]
    PlaintextModulusUnValid(
        /// The requested plaintext modulus.
        u64,
    ),
    /// Error that occurs when the maximum multiplicative depth is zero.
    #[error("multiplicative depth {0} is not valid!")]
    DepthUnValid(
        /// The requested depth.
        usize,
    ),
    /// Error that occurs when a payload does not fit the slot vector.
    #[error("payload length {found} exceeds the {expected} available slots!")]
    SlotCountMismatch {
        /// Available slots.
        expected: usize,
        /// Payload length.
        found: usize,
    },
    /// Error that occurs when ciphertexts or keys from different key pairs meet.
    #[error("ciphertext and key material belong to different key pairs!")]
    KeyMismatch,
    /// Error that occurs when a rotation offset was never registered.
    #[error("rotation offset {0} has no generated rotation key!")]
    UnregisteredRotation(i64),
    /// Error that occurs when a multiplication is requested with no depth budget left.
    #[error("multiplicative depth budget exhausted!")]
    DepthExhausted,
    /// Error that occurs when an inner product is taken without a sum key.
    #[error("no sum key was generated for this key pair!")]
    MissingSumKey,
    /// Error that occurs when a multiplication is taken without a relinearization key.
    #[error("no multiplication key was generated for this key pair!")]
    MissingMultKey,
    /// Error that occurs when an n-ary operation receives no operands.
    #[error("operation requires at least one operand!")]
    EmptyOperands,
    /// Error that occurs when an inner-product width exceeds the slot count.
    #[error("inner-product width {width} exceeds the {slots} available slots!")]
    WidthTooLarge {
        /// Requested width.
        width: usize,
        /// Available slots.
        slots: usize,
    },
    /// Error that occurs when inverting a multiple of the plaintext modulus.
    #[error("{0} has no multiplicative inverse modulo the plaintext modulus!")]
    NotInvertible(u64),
}
