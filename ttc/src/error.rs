/// Errors that may occur in the encrypted-computation layer.
///
/// Every variant is a caller contract breach or an engine failure; none is
/// retryable. Callers are expected to abort the run on any of them.
#[derive(thiserror::Error, Debug)]
pub enum TtcError {
    /// An engine operation failed.
    #[error(transparent)]
    Engine(#[from] bgv::BgvError),
    /// Error that occurs when a matrix operation receives no rows.
    #[error("matrix operation requires at least one row!")]
    EmptyMatrix,
    /// Error that occurs when an element grid is not square.
    #[error("matrix with {rows} rows and {cols} columns is not square!")]
    NonSquareMatrix {
        /// Number of rows.
        rows: usize,
        /// Number of columns in the offending row.
        cols: usize,
    },
    /// Error that occurs when a dimension disagrees with the initialized setup.
    #[error("dimension {found} is not compatible with the initialized {expected}!")]
    DimensionMismatch {
        /// Dimension the setup was initialized for.
        expected: usize,
        /// Dimension found at the call.
        found: usize,
    },
    /// Error that occurs when a pattern cannot tile the slot vector exactly.
    #[error("pattern of length {pattern_len} does not tile {slots} slots exactly!")]
    ReplicationMisfit {
        /// Available slots.
        slots: usize,
        /// Length of the pattern.
        pattern_len: usize,
    },
    /// Error that occurs when the slot vector leaves no head-room for
    /// rotation spill.
    #[error("{slots} slots leave no head-room for a width-{width} prefix circuit!")]
    InsufficientSlots {
        /// Available slots.
        slots: usize,
        /// Logical width of the circuit.
        width: usize,
    },
    /// Error that occurs when a matrix exponent below two is requested.
    #[error("matrix exponent {0} is out of range, exponents start at 2!")]
    ExponentOutOfRange(u32),
    /// Error that occurs when a product tree is given a non-power-of-two
    /// number of matrices.
    #[error("product tree requires a power-of-two number of matrices, got {0}!")]
    ProductTreeSize(usize),
    /// Error that occurs when a predicate range reaches the plaintext modulus.
    #[error("predicate range {range} is not representable modulo {modulus}!")]
    RangeTooLarge {
        /// Requested range.
        range: u64,
        /// Plaintext modulus.
        modulus: u64,
    },
    /// Error that occurs when a user ranking is not a permutation of the items.
    #[error("ranking of user {user} is not a permutation of the item indices!")]
    RankingNotPermutation {
        /// Index of the offending user.
        user: usize,
    },
    /// Error that occurs when round transitions are driven out of order.
    #[error("round transition expected phase {expected}, found {found}!")]
    WrongPhase {
        /// Phase the transition requires.
        expected: &'static str,
        /// Phase the round is actually in.
        found: &'static str,
    },
    /// Error that occurs when persisting or restoring mechanism state.
    #[error("mechanism state codec failed: {0}")]
    StateCodec(#[from] bincode::Error),
}
