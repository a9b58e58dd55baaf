mod common;

use common::*;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;
use ttc::{
    elems_to_cols, elems_to_rows, eval_diag_matrix_vec_mult, eval_matrix_product,
    eval_matrix_vec_mult, eval_vec_matrix_mult, rep_fill_slots, rows_to_cols, rows_to_elems,
    MatrixProductContext, TtcError,
};

fn random_matrix(rng: &mut ChaCha12Rng, dim: usize, bound: u64) -> Vec<Vec<u64>> {
    (0..dim)
        .map(|_| (0..dim).map(|_| rng.gen_range(0..bound)).collect())
        .collect()
}

#[test]
fn rows_to_cols_transposes() {
    let bench = bench(64, 4, 12);
    let matrix = vec![
        vec![1, 2, 3, 4],
        vec![5, 6, 7, 8],
        vec![9, 10, 11, 12],
        vec![13, 14, 15, 16],
    ];
    let enc_rows = encrypt_rows(&bench, &matrix);
    let enc_cols = rows_to_cols(&bench.ctx, &bench.keys, &bench.masks, &enc_rows).unwrap();
    for (col, ct) in enc_cols.iter().enumerate() {
        let expected: Vec<u64> = (0..4).map(|row| matrix[row][col]).collect();
        assert_eq!(decrypt_prefix(&bench, ct, 4), expected);
    }
}

#[test]
fn element_packing_round_trips() {
    let bench = bench(64, 4, 12);
    let matrix = vec![
        vec![3, 1, 4, 1],
        vec![5, 9, 2, 6],
        vec![5, 3, 5, 8],
        vec![9, 7, 9, 3],
    ];
    let enc_rows = encrypt_rows(&bench, &matrix);
    let elems = rows_to_elems(&bench.ctx, &bench.keys, &bench.masks, &enc_rows).unwrap();
    for (row, row_elems) in elems.iter().enumerate() {
        for (col, ct) in row_elems.iter().enumerate() {
            assert_eq!(decrypt_prefix(&bench, ct, 1), vec![matrix[row][col]]);
        }
    }

    let back_rows = elems_to_rows(&bench.ctx, &bench.keys, &elems).unwrap();
    for (row, ct) in back_rows.iter().enumerate() {
        assert_eq!(decrypt_prefix(&bench, ct, 4), matrix[row]);
    }
    let cols = elems_to_cols(&bench.ctx, &bench.keys, &elems).unwrap();
    for (col, ct) in cols.iter().enumerate() {
        let expected: Vec<u64> = (0..4).map(|row| matrix[row][col]).collect();
        assert_eq!(decrypt_prefix(&bench, ct, 4), expected);
    }
}

#[test]
fn diagonal_product_matches_plaintext() {
    let mut rng = ChaCha12Rng::seed_from_u64(17);
    for dim in [2, 3, 5, 8] {
        let engine_slots = 4 * dim * dim;
        let bench = bench(engine_slots, dim * dim, 12);
        let mm = MatrixProductContext::new(&bench.ctx, &bench.pk, dim).unwrap();

        let a = random_matrix(&mut rng, dim, P);
        let b = random_matrix(&mut rng, dim, P);
        let enc_a = encrypt_vec(&bench, &rep_fill_slots(&flatten(&a), engine_slots).unwrap());
        let enc_b = encrypt_vec(&bench, &rep_fill_slots(&flatten(&b), engine_slots).unwrap());

        let enc_ab = eval_matrix_product(&bench.ctx, &bench.keys, &mm, &enc_a, &enc_b).unwrap();
        let expected = flatten(&mat_mult_mod(&a, &b, P));
        assert_eq!(decrypt_prefix(&bench, &enc_ab, dim * dim), expected);
        // Three levels: linearization, shift masking, final products.
        assert_eq!(enc_ab.level(), 12 - 3);
    }
}

#[test]
fn diagonal_context_rejects_misfit_slot_count() {
    let bench = bench(64, 8, 12);
    assert!(matches!(
        MatrixProductContext::new(&bench.ctx, &bench.pk, 3),
        Err(TtcError::ReplicationMisfit { .. })
    ));
}

#[test]
fn diagonal_matrix_vector_product() {
    let dim = 4;
    let bench = bench(32, dim, 12);
    let matrix = vec![
        vec![1, 2, 3, 4],
        vec![4, 3, 2, 1],
        vec![2, 0, 1, 3],
        vec![0, 5, 0, 7],
    ];
    let vector = [3, 1, 4, 1];

    // diagonals[l] holds M[i][(i + l) mod d] in slot i, tiled like the vector.
    let diagonals: Vec<_> = (0..dim)
        .map(|l| {
            let pattern: Vec<u64> = (0..dim).map(|i| matrix[i][(i + l) % dim]).collect();
            encrypt_vec(&bench, &rep_fill_slots(&pattern, 32).unwrap())
        })
        .collect();
    let enc_vec = encrypt_vec(&bench, &rep_fill_slots(&vector, 32).unwrap());

    let product =
        eval_diag_matrix_vec_mult(&bench.ctx, &bench.keys, &diagonals, &enc_vec).unwrap();
    let expected: Vec<u64> = (0..dim)
        .map(|i| (0..dim).map(|j| matrix[i][j] * vector[j]).sum::<u64>() % P)
        .collect();
    assert_eq!(decrypt_prefix(&bench, &product, dim), expected);
}

#[test]
fn row_matrix_vector_products() {
    let bench = bench(64, 5, 12);
    let matrix = vec![
        vec![0, 1, 0, 0, 0],
        vec![1, 1, 0, 3, 0],
        vec![0, 0, 2, 0, 1],
        vec![0, 2, 0, 1, 0],
        vec![5, 0, 0, 0, 1],
    ];
    let vector = [1, 2, 3, 4, 5];
    let enc_rows = encrypt_rows(&bench, &matrix);
    let enc_vec = encrypt_vec(&bench, &vector);

    let mv =
        eval_matrix_vec_mult(&bench.ctx, &bench.keys, &bench.masks, &enc_rows, &enc_vec).unwrap();
    let expected: Vec<u64> = (0..5)
        .map(|i| (0..5).map(|j| matrix[i][j] * vector[j]).sum::<u64>() % P)
        .collect();
    assert_eq!(decrypt_prefix(&bench, &mv, 5), expected);

    let vm =
        eval_vec_matrix_mult(&bench.ctx, &bench.keys, &bench.masks, &enc_vec, &enc_rows).unwrap();
    let expected: Vec<u64> = (0..5)
        .map(|j| (0..5).map(|i| vector[i] * matrix[i][j]).sum::<u64>() % P)
        .collect();
    assert_eq!(decrypt_prefix(&bench, &vm, 5), expected);
}

#[test]
fn structural_violations_are_fatal() {
    let bench = bench(64, 4, 12);
    let ragged = vec![
        encrypt_rows(&bench, &[vec![1, 2], vec![3, 4]]),
        vec![encrypt_vec(&bench, &[5, 6])],
    ];
    assert!(matches!(
        elems_to_rows(&bench.ctx, &bench.keys, &ragged),
        Err(TtcError::NonSquareMatrix { .. })
    ));
    assert!(matches!(
        rows_to_cols(&bench.ctx, &bench.keys, &bench.masks, &[]),
        Err(TtcError::EmptyMatrix)
    ));

    // More rows than the mask set covers.
    let six = vec![vec![1, 2, 3, 4, 5, 6]; 6];
    let enc_six = encrypt_rows(&bench, &six);
    assert!(matches!(
        rows_to_cols(&bench.ctx, &bench.keys, &bench.masks, &enc_six),
        Err(TtcError::DimensionMismatch { .. })
    ));
}
