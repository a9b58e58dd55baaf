#![allow(dead_code)]

use bgv::{
    mul_mod, BgvCiphertext, BgvContext, BgvParameters, BgvPlaintext, BgvPublicKey, BgvScheme,
    BgvSecretKey, EvalKeySet,
};
use ttc::SlotMasks;

pub const P: u64 = 65537;

/// Everything a toolkit test needs: a seeded context, a key pair, eval keys
/// with the mask set registered for `width` logical slots.
pub struct TestBench {
    pub ctx: BgvContext,
    pub sk: BgvSecretKey,
    pub pk: BgvPublicKey,
    pub keys: EvalKeySet,
    pub masks: SlotMasks,
}

pub fn bench(engine_slots: usize, width: usize, depth: usize) -> TestBench {
    let params = BgvParameters::new(engine_slots, P, depth).unwrap();
    let ctx = BgvContext::new_seeded(params, 42);
    let (sk, pk) = BgvScheme::gen_keypair(&ctx);
    let mut keys = EvalKeySet::new(&sk);
    keys.gen_mult_key(&sk).unwrap();
    let masks = SlotMasks::setup(&ctx, &sk, &pk, &mut keys, width).unwrap();
    TestBench {
        ctx,
        sk,
        pk,
        keys,
        masks,
    }
}

pub fn encrypt_vec(bench: &TestBench, values: &[u64]) -> BgvCiphertext {
    BgvScheme::encrypt(&bench.ctx, &bench.pk, &BgvPlaintext::new(values.to_vec())).unwrap()
}

pub fn encrypt_rows(bench: &TestBench, rows: &[Vec<u64>]) -> Vec<BgvCiphertext> {
    rows.iter().map(|row| encrypt_vec(bench, row)).collect()
}

pub fn decrypt_prefix(bench: &TestBench, ct: &BgvCiphertext, len: usize) -> Vec<u64> {
    let payload = BgvScheme::decrypt(&bench.ctx, &bench.sk, ct).unwrap();
    payload.values()[..len].to_vec()
}

pub fn mat_mult_mod(a: &[Vec<u64>], b: &[Vec<u64>], p: u64) -> Vec<Vec<u64>> {
    let n = a.len();
    let mut out = vec![vec![0; n]; n];
    for i in 0..n {
        for j in 0..n {
            let mut acc = 0;
            for k in 0..n {
                acc = (acc + mul_mod(a[i][k], b[k][j], p)) % p;
            }
            out[i][j] = acc;
        }
    }
    out
}

pub fn mat_pow_mod(a: &[Vec<u64>], exponent: u32, p: u64) -> Vec<Vec<u64>> {
    let mut acc = a.to_vec();
    for _ in 1..exponent {
        acc = mat_mult_mod(&acc, a, p);
    }
    acc
}

pub fn flatten(rows: &[Vec<u64>]) -> Vec<u64> {
    rows.iter().flatten().copied().collect()
}
