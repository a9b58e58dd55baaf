#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![deny(missing_docs)]

//! An encrypted top-trading-cycle mechanism over the [`bgv`] slot engine.
//!
//! Everything below the round logic is a reusable encrypted-arithmetic
//! toolkit: unit-mask packing, row/column/element re-encodings of encrypted
//! matrices, diagonal-decomposition matrix products, logarithmic-depth
//! matrix exponentiation and the branch-free combinatorial predicates that
//! emulate data-dependent selection. The round logic composes them into one
//! state transition of the allocation mechanism, with refresh points placed
//! where the depth budget requires them.

mod error;
mod masking;
mod matexp;
mod matmul;
mod predicates;
mod recode;
mod round;

pub use error::TtcError;
pub use masking::{rep_fill_slots, SlotMasks};
pub use matexp::{eval_matrix_power, eval_product_tree, eval_squarings};
pub use matmul::{
    eval_diag_matrix_vec_mult, eval_matrix_product, eval_matrix_vec_mult, eval_vec_matrix_mult,
    MatrixProductContext,
};
pub use predicates::{
    eval_exponentiate, eval_not_equal_zero, eval_prefix_mult, eval_preserve_lead_one,
    NotEqualZeroContext, PreserveLeadOneContext,
};
pub use recode::{elems_to_cols, elems_to_rows, rows_to_cols, rows_to_elems};
pub use round::{
    run_round, run_to_completion, PreferenceTables, RoundPhase, RoundToolkit, TradingRound,
    TradingState, UNASSIGNED,
};
