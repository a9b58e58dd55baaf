mod common;

use common::*;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;
use ttc::{eval_matrix_power, eval_product_tree, rows_to_elems, TtcError};

fn ceil_log2(n: usize) -> usize {
    (usize::BITS - (n - 1).leading_zeros()) as usize
}

fn random_adjacency(rng: &mut ChaCha12Rng, dim: usize) -> Vec<Vec<u64>> {
    (0..dim)
        .map(|_| (0..dim).map(|_| rng.gen_range(0..2)).collect())
        .collect()
}

#[test]
fn matrix_power_matches_plaintext_and_stays_shallow() {
    let mut rng = ChaCha12Rng::seed_from_u64(23);
    for dim in [2, 3, 5, 8] {
        let bench = bench(64, dim, 12);
        let matrix = random_adjacency(&mut rng, dim);
        let enc_rows = encrypt_rows(&bench, &matrix);

        let powered = eval_matrix_power(
            &bench.ctx,
            &bench.keys,
            &bench.masks,
            &enc_rows,
            dim as u32,
        )
        .unwrap();

        let expected = mat_pow_mod(&matrix, dim as u32, P);
        for (row, ct) in powered.iter().enumerate() {
            assert_eq!(decrypt_prefix(&bench, ct, dim), expected[row]);
        }

        // Two levels per tree stage keeps the whole exponentiation
        // logarithmic in the exponent.
        let consumed = 12 - powered.iter().map(|ct| ct.level()).min().unwrap();
        assert!(
            consumed <= 2 * ceil_log2(dim) + 3,
            "dim {dim} consumed {consumed} levels"
        );
    }
}

#[test]
fn cyclic_pointer_matrix_returns_to_itself() {
    let bench = bench(64, 5, 12);
    // The pointer graph 0->4, 1->4, 2->4, 3->1, 4->3 has the cycle 4-3-1.
    let matrix = vec![
        vec![0, 0, 0, 0, 1],
        vec![0, 0, 0, 0, 1],
        vec![0, 0, 0, 0, 1],
        vec![0, 1, 0, 0, 0],
        vec![0, 0, 0, 1, 0],
    ];
    let enc_rows = encrypt_rows(&bench, &matrix);
    let powered =
        eval_matrix_power(&bench.ctx, &bench.keys, &bench.masks, &enc_rows, 5).unwrap();
    let expected = mat_pow_mod(&matrix, 5, P);
    for (row, ct) in powered.iter().enumerate() {
        assert_eq!(decrypt_prefix(&bench, ct, 5), expected[row]);
    }
    // Column sums are nonzero exactly on the cycle members.
    let column_sums: Vec<u64> = (0..5)
        .map(|j| (0..5).map(|i| expected[i][j]).sum::<u64>() % P)
        .collect();
    assert_eq!(
        column_sums.iter().map(|&s| u64::from(s != 0)).collect::<Vec<_>>(),
        vec![0, 1, 0, 1, 1]
    );
}

#[test]
fn small_exponents_are_rejected() {
    let bench = bench(64, 3, 12);
    let matrix = vec![vec![1, 0, 0], vec![0, 1, 0], vec![0, 0, 1]];
    let enc_rows = encrypt_rows(&bench, &matrix);
    for exponent in [0, 1] {
        assert!(matches!(
            eval_matrix_power(&bench.ctx, &bench.keys, &bench.masks, &enc_rows, exponent),
            Err(TtcError::ExponentOutOfRange(_))
        ));
    }
}

#[test]
fn product_tree_requires_power_of_two_inputs() {
    let bench = bench(64, 2, 12);
    let matrix = vec![vec![1, 2], vec![3, 4]];
    let enc_rows = encrypt_rows(&bench, &matrix);
    let elems = rows_to_elems(&bench.ctx, &bench.keys, &bench.masks, &enc_rows).unwrap();

    for count in [0, 1, 3] {
        let mats = vec![elems.clone(); count];
        assert!(matches!(
            eval_product_tree(&bench.ctx, &bench.keys, &bench.masks, mats),
            Err(TtcError::ProductTreeSize(_))
        ));
    }

    let squared =
        eval_product_tree(&bench.ctx, &bench.keys, &bench.masks, vec![elems.clone(), elems])
            .unwrap();
    let expected = mat_mult_mod(&matrix, &matrix, P);
    for (row, row_elems) in squared.iter().enumerate() {
        for (col, ct) in row_elems.iter().enumerate() {
            assert_eq!(decrypt_prefix(&bench, ct, 1), vec![expected[row][col]]);
        }
    }
}
