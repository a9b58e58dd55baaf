//! Five users trade five items without the server ever seeing a preference.
//!
//! The key holder drives the rounds and decrypts only the final view.

use bgv::{BgvContext, BgvParameters, BgvScheme, EvalKeySet};
use ttc::{run_round, PreferenceTables, RoundToolkit, TradingState, UNASSIGNED};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let rankings = vec![
        vec![4, 1, 2, 3, 0],
        vec![4, 3, 2, 1, 0],
        vec![4, 1, 0, 2, 3],
        vec![1, 3, 4, 0, 2],
        vec![3, 1, 2, 0, 4],
    ];
    let users = rankings.len();

    let params = BgvParameters::new(64, 65537, 12)?;
    println!(
        "slots = {}, p = {}, depth = {}",
        params.slots(),
        params.plaintext_modulus(),
        params.max_depth()
    );

    let ctx = BgvContext::new(params);
    let (sk, pk) = BgvScheme::gen_keypair(&ctx);
    let mut keys = EvalKeySet::new(&sk);
    let toolkit = RoundToolkit::setup(&ctx, &sk, &pk, &mut keys, users)?;
    let prefs = PreferenceTables::encrypt(&ctx, &pk, &rankings)?;
    let mut state = TradingState::initial(&ctx, &pk, users)?;

    for round in 1..=users {
        run_round(&ctx, &keys, &toolkit, &prefs, &sk, &pk, &mut state)?;
        let assignments = state.reveal_assignments(&ctx, &sk)?;
        println!("round {round}: assignments = {assignments:?}");
        if assignments.iter().all(|&a| a != UNASSIGNED) {
            println!("all users assigned after {round} round(s)");
            break;
        }
    }
    Ok(())
}
