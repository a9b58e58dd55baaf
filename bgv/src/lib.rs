#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![deny(missing_docs)]

//! An exact-arithmetic model of a leveled BGV-style SIMD encryption engine.
//!
//! The crate provides the primitive service an encrypted-computation layer
//! consumes: packed slot vectors modulo a prime plaintext modulus, slot-wise
//! addition and multiplication, cyclic slot rotation under registered
//! rotation keys, inner products, and a key-holder-only refresh. Ciphertexts
//! carry a multiplicative-depth budget that every multiplication lowers and
//! only a refresh restores; the lattice machinery of a production scheme
//! (NTT, noise and modulus management) is intentionally absent, the contract
//! it enforces is not.

mod ciphertext;
mod context;
mod error;
mod eval_key;
mod evaluate;
mod parameter;
mod plaintext;
mod public_key;
mod secret_key;
mod utils;

pub use ciphertext::BgvCiphertext;
pub use context::BgvContext;
pub use error::BgvError;
pub use eval_key::EvalKeySet;
pub use evaluate::BgvScheme;
pub use parameter::{BgvParameters, DEMO_PARAMETERS};
pub use plaintext::BgvPlaintext;
pub use public_key::BgvPublicKey;
pub use secret_key::BgvSecretKey;
pub use utils::*;
