//! One round of the encrypted top-trading-cycle mechanism.
//!
//! Each user homomorphically points at their most-preferred still-available
//! item, the pointer matrix is raised to the user count to expose completed
//! trading cycles, and the persistent availability and assignment vectors
//! are updated by branch-free selection. The round driver holds the secret
//! key: refresh points between the stages reset the depth budget, and only
//! the key holder may place them.

use bgv::{
    BgvCiphertext, BgvContext, BgvPlaintext, BgvPublicKey, BgvScheme, BgvSecretKey, EvalKeySet,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::matexp::eval_matrix_power;
use crate::matmul::{eval_matrix_vec_mult, eval_vec_matrix_mult};
use crate::predicates::{
    eval_not_equal_zero, eval_preserve_lead_one, NotEqualZeroContext, PreserveLeadOneContext,
};
use crate::{SlotMasks, TtcError};

/// Sentinel output value for a user not yet on a completed cycle.
pub const UNASSIGNED: i64 = -1;

/// Per-user preference-permutation matrices, encrypted row-wise together
/// with their transposes.
#[derive(Debug, Clone)]
pub struct PreferenceTables {
    users: usize,
    rows: Vec<Vec<BgvCiphertext>>,
    transposed: Vec<Vec<BgvCiphertext>>,
}

impl PreferenceTables {
    /// Encrypts the ranking of every user.
    ///
    /// `rankings[u][j]` is the item user `u` ranks in position `j`, most
    /// preferred first. Every ranking must be a permutation of the item
    /// indices `0..n`.
    pub fn encrypt(
        ctx: &BgvContext,
        pk: &BgvPublicKey,
        rankings: &[Vec<usize>],
    ) -> Result<Self, TtcError> {
        let n = rankings.len();
        if n < 2 {
            return Err(TtcError::DimensionMismatch {
                expected: 2,
                found: n,
            });
        }
        let mut rows = Vec::with_capacity(n);
        let mut transposed = Vec::with_capacity(n);
        for (user, ranking) in rankings.iter().enumerate() {
            if ranking.len() != n {
                return Err(TtcError::RankingNotPermutation { user });
            }
            let mut seen = vec![false; n];
            for &item in ranking {
                if item >= n || seen[item] {
                    return Err(TtcError::RankingNotPermutation { user });
                }
                seen[item] = true;
            }
            let mut user_rows = Vec::with_capacity(n);
            let mut user_cols = Vec::with_capacity(n);
            for j in 0..n {
                let mut row = vec![0; n];
                row[ranking[j]] = 1;
                user_rows.push(BgvScheme::encrypt(ctx, pk, &BgvPlaintext::new(row))?);
                // Row k of the transpose: 1 at the rank position of item k.
                let mut col = vec![0; n];
                let rank_of_j = ranking.iter().position(|&item| item == j);
                col[rank_of_j.expect("ranking is a permutation")] = 1;
                user_cols.push(BgvScheme::encrypt(ctx, pk, &BgvPlaintext::new(col))?);
            }
            rows.push(user_rows);
            transposed.push(user_cols);
        }
        Ok(Self {
            users: n,
            rows,
            transposed,
        })
    }

    /// Returns the number of users.
    #[inline]
    pub fn users(&self) -> usize {
        self.users
    }
}

/// The persistent encrypted state of a mechanism run: which items remain
/// available, and each user's finalized assignment or the unassigned
/// sentinel.
///
/// This pair is the complete between-round (and between-process) state; it
/// is opaque to everything but the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingState {
    users: usize,
    availability: BgvCiphertext,
    output: BgvCiphertext,
}

impl TradingState {
    /// Creates the initial state: every item available, every user holding
    /// the unassigned sentinel.
    pub fn initial(ctx: &BgvContext, pk: &BgvPublicKey, users: usize) -> Result<Self, TtcError> {
        let p = ctx.params().plaintext_modulus();
        let availability = BgvScheme::encrypt(ctx, pk, &BgvPlaintext::new(vec![1; users]))?;
        let output = BgvScheme::encrypt(ctx, pk, &BgvPlaintext::new(vec![p - 1; users]))?;
        Ok(Self {
            users,
            availability,
            output,
        })
    }

    /// Returns the number of users the state tracks.
    #[inline]
    pub fn users(&self) -> usize {
        self.users
    }

    /// Returns the encrypted availability vector.
    #[inline]
    pub fn availability(&self) -> &BgvCiphertext {
        &self.availability
    }

    /// Returns the encrypted assignment vector.
    #[inline]
    pub fn output(&self) -> &BgvCiphertext {
        &self.output
    }

    /// Serializes the state for persistence between process runs.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TtcError> {
        bincode::serialize(self).map_err(TtcError::from)
    }

    /// Restores a persisted state.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TtcError> {
        bincode::deserialize(bytes).map_err(TtcError::from)
    }

    /// Decrypts the assignment vector; the key holder's view of the run.
    pub fn reveal_assignments(
        &self,
        ctx: &BgvContext,
        sk: &BgvSecretKey,
    ) -> Result<Vec<i64>, TtcError> {
        let payload = BgvScheme::decrypt(ctx, sk, &self.output)?;
        let mut signed = payload.to_signed(ctx.params().plaintext_modulus());
        signed.truncate(self.users);
        Ok(signed)
    }
}

/// Setup shared by every round: masks, predicate contexts and the encrypted
/// round constants.
#[derive(Debug, Clone)]
pub struct RoundToolkit {
    users: usize,
    masks: SlotMasks,
    preserve: PreserveLeadOneContext,
    not_equal_zero: NotEqualZeroContext,
    enc_ones: BgvCiphertext,
    enc_neg_ones: BgvCiphertext,
    enc_index_range: BgvCiphertext,
    ones_plain: BgvPlaintext,
}

impl RoundToolkit {
    /// Registers all key material and encrypts the per-run constants.
    pub fn setup(
        ctx: &BgvContext,
        sk: &BgvSecretKey,
        pk: &BgvPublicKey,
        keys: &mut EvalKeySet,
        users: usize,
    ) -> Result<Self, TtcError> {
        if users < 2 {
            return Err(TtcError::DimensionMismatch {
                expected: 2,
                found: users,
            });
        }
        keys.gen_mult_key(sk)?;
        let masks = SlotMasks::setup(ctx, sk, pk, keys, users)?;
        let preserve = PreserveLeadOneContext::new(ctx, pk, users)?;
        let not_equal_zero = NotEqualZeroContext::new(ctx, pk, users, users as u64)?;
        let p = ctx.params().plaintext_modulus();
        let index_range: Vec<u64> = (0..users as u64).collect();
        Ok(Self {
            users,
            masks,
            preserve,
            not_equal_zero,
            enc_ones: BgvScheme::encrypt(ctx, pk, &BgvPlaintext::new(vec![1; users]))?,
            enc_neg_ones: BgvScheme::encrypt(ctx, pk, &BgvPlaintext::new(vec![p - 1; users]))?,
            enc_index_range: BgvScheme::encrypt(ctx, pk, &BgvPlaintext::new(index_range))?,
            ones_plain: BgvPlaintext::new(vec![1; users]),
        })
    }

    /// Returns the number of users.
    #[inline]
    pub fn users(&self) -> usize {
        self.users
    }

    /// Returns the mask set.
    #[inline]
    pub fn masks(&self) -> &SlotMasks {
        &self.masks
    }
}

/// The phases a round moves through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// No work done yet.
    Ready,
    /// The pointer matrix rows exist and are refreshed.
    AdjacencyBuilt,
    /// The 0/1 cycle-membership flags exist and are refreshed.
    CycleDetected,
    /// The persistent state has been updated.
    Done,
}

impl RoundPhase {
    fn name(self) -> &'static str {
        match self {
            RoundPhase::Ready => "Ready",
            RoundPhase::AdjacencyBuilt => "AdjacencyBuilt",
            RoundPhase::CycleDetected => "CycleDetected",
            RoundPhase::Done => "Done",
        }
    }
}

/// One mechanism round, driven by the key holder.
///
/// The three transitions must run in order; driving them out of order is a
/// fatal configuration error.
pub struct TradingRound<'a> {
    ctx: &'a BgvContext,
    keys: &'a EvalKeySet,
    toolkit: &'a RoundToolkit,
    prefs: &'a PreferenceTables,
    sk: &'a BgvSecretKey,
    pk: &'a BgvPublicKey,
    phase: RoundPhase,
    adjacency: Vec<BgvCiphertext>,
    cycle_flags: Option<BgvCiphertext>,
}

impl<'a> TradingRound<'a> {
    /// Creates a round over matching preference tables and toolkit.
    pub fn new(
        ctx: &'a BgvContext,
        keys: &'a EvalKeySet,
        toolkit: &'a RoundToolkit,
        prefs: &'a PreferenceTables,
        sk: &'a BgvSecretKey,
        pk: &'a BgvPublicKey,
    ) -> Result<Self, TtcError> {
        if prefs.users() != toolkit.users() {
            return Err(TtcError::DimensionMismatch {
                expected: toolkit.users(),
                found: prefs.users(),
            });
        }
        Ok(Self {
            ctx,
            keys,
            toolkit,
            prefs,
            sk,
            pk,
            phase: RoundPhase::Ready,
            adjacency: Vec::new(),
            cycle_flags: None,
        })
    }

    /// Returns the current phase.
    #[inline]
    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// Ready -> AdjacencyBuilt: builds one pointer-matrix row per user.
    ///
    /// Availability sorted into the user's preference order, collapsed to
    /// the first available choice, and mapped back into item space through
    /// the transposed permutation. The per-user chains are independent and
    /// run as a parallel fan-out.
    pub fn build_adjacency(&mut self, state: &TradingState) -> Result<(), TtcError> {
        self.expect_phase(RoundPhase::Ready)?;
        if state.users() != self.toolkit.users() {
            return Err(TtcError::DimensionMismatch {
                expected: self.toolkit.users(),
                found: state.users(),
            });
        }
        let toolkit = self.toolkit;
        let prefs = self.prefs;
        let (ctx, keys) = (self.ctx, self.keys);
        let (sk, pk) = (self.sk, self.pk);
        let adjacency = (0..toolkit.users())
            .into_par_iter()
            .map(|user| {
                let sorted = eval_matrix_vec_mult(
                    ctx,
                    keys,
                    &toolkit.masks,
                    &prefs.rows[user],
                    state.availability(),
                )?;
                let first = eval_preserve_lead_one(ctx, keys, &sorted, &toolkit.preserve)?;
                let row = eval_matrix_vec_mult(
                    ctx,
                    keys,
                    &toolkit.masks,
                    &prefs.transposed[user],
                    &first,
                )?;
                BgvScheme::refresh(ctx, sk, pk, &row).map_err(TtcError::from)
            })
            .collect::<Result<Vec<_>, TtcError>>()?;
        self.adjacency = adjacency;
        self.phase = RoundPhase::AdjacencyBuilt;
        Ok(())
    }

    /// AdjacencyBuilt -> CycleDetected: marks users on completed cycles.
    ///
    /// Any item on a cycle of length at most n is reached by some n-step
    /// pointer walk, so the column sums of the n-th matrix power are nonzero
    /// exactly on cycle members.
    pub fn detect_cycles(&mut self) -> Result<(), TtcError> {
        self.expect_phase(RoundPhase::AdjacencyBuilt)?;
        let toolkit = self.toolkit;
        let (ctx, keys) = (self.ctx, self.keys);
        let powered = eval_matrix_power(
            ctx,
            keys,
            &toolkit.masks,
            &self.adjacency,
            toolkit.users() as u32,
        )?;
        let powered = powered
            .iter()
            .map(|row| BgvScheme::refresh(ctx, self.sk, self.pk, row))
            .collect::<Result<Vec<_>, _>>()?;
        let reach = eval_vec_matrix_mult(ctx, keys, &toolkit.masks, &toolkit.enc_ones, &powered)?;
        let flags = eval_not_equal_zero(ctx, keys, &reach, &toolkit.not_equal_zero)?;
        self.cycle_flags = Some(BgvScheme::refresh(ctx, self.sk, self.pk, &flags)?);
        self.phase = RoundPhase::CycleDetected;
        Ok(())
    }

    /// CycleDetected -> Done: freezes assignments and retires their items.
    ///
    /// `output <- index * u + output * (1 - u)` keeps a user's assignment
    /// once their cycle completes; availability is recomputed as
    /// `1 - NotEqualZero(output + 1)`, the shift keeping the zero test
    /// inside its declared range in the presence of the -1 sentinel.
    pub fn apply_assignments(&mut self, state: &mut TradingState) -> Result<(), TtcError> {
        self.expect_phase(RoundPhase::CycleDetected)?;
        let toolkit = self.toolkit;
        let (ctx, keys) = (self.ctx, self.keys);
        let flags = self
            .cycle_flags
            .as_ref()
            .expect("cycle flags exist in the CycleDetected phase");

        let mut parts = Vec::with_capacity(toolkit.users());
        for (user, row) in self.adjacency.iter().enumerate() {
            let index = BgvScheme::inner_product(
                ctx,
                keys,
                row,
                &toolkit.enc_index_range,
                toolkit.users(),
            )?;
            let isolated = BgvScheme::mul(ctx, keys, &index, toolkit.masks.mask(0))?;
            parts.push(BgvScheme::rotate(ctx, keys, &isolated, -(user as i64))?);
        }
        let pointed = BgvScheme::add_many(ctx, &parts)?;

        let kept = BgvScheme::mul(ctx, keys, &pointed, flags)?;
        let flipped = BgvScheme::mul(ctx, keys, flags, &toolkit.enc_neg_ones)?;
        let inverted = BgvScheme::add(ctx, &toolkit.enc_ones, &flipped)?;
        let retained = BgvScheme::mul(ctx, keys, state.output(), &inverted)?;
        let output = BgvScheme::add(ctx, &kept, &retained)?;
        let output = BgvScheme::refresh(ctx, self.sk, self.pk, &output)?;

        let shifted = BgvScheme::add_plain(ctx, &output, &toolkit.ones_plain)?;
        let assigned = eval_not_equal_zero(ctx, keys, &shifted, &toolkit.not_equal_zero)?;
        let blocked = BgvScheme::mul(ctx, keys, &assigned, &toolkit.enc_neg_ones)?;
        let availability = BgvScheme::add(ctx, &toolkit.enc_ones, &blocked)?;
        let availability = BgvScheme::refresh(ctx, self.sk, self.pk, &availability)?;

        state.output = output;
        state.availability = availability;
        self.phase = RoundPhase::Done;
        Ok(())
    }

    fn expect_phase(&self, expected: RoundPhase) -> Result<(), TtcError> {
        if self.phase != expected {
            return Err(TtcError::WrongPhase {
                expected: expected.name(),
                found: self.phase.name(),
            });
        }
        Ok(())
    }
}

/// Runs one full round against the persistent state.
pub fn run_round(
    ctx: &BgvContext,
    keys: &EvalKeySet,
    toolkit: &RoundToolkit,
    prefs: &PreferenceTables,
    sk: &BgvSecretKey,
    pk: &BgvPublicKey,
    state: &mut TradingState,
) -> Result<(), TtcError> {
    let mut round = TradingRound::new(ctx, keys, toolkit, prefs, sk, pk)?;
    round.build_adjacency(state)?;
    round.detect_cycles()?;
    round.apply_assignments(state)
}

/// Repeats rounds until every user is assigned or `max_rounds` is reached,
/// returning the number of rounds executed.
pub fn run_to_completion(
    ctx: &BgvContext,
    keys: &EvalKeySet,
    toolkit: &RoundToolkit,
    prefs: &PreferenceTables,
    sk: &BgvSecretKey,
    pk: &BgvPublicKey,
    state: &mut TradingState,
    max_rounds: usize,
) -> Result<usize, TtcError> {
    for round in 1..=max_rounds {
        run_round(ctx, keys, toolkit, prefs, sk, pk, state)?;
        let assignments = state.reveal_assignments(ctx, sk)?;
        if assignments.iter().all(|&a| a != UNASSIGNED) {
            return Ok(round);
        }
    }
    Ok(max_rounds)
}
