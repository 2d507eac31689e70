//! Randomized cross-checks of the decomposition against the naive
//! Ghouila-Houri partition test and exhaustive determinants.

use itertools::Itertools;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use unimodular::matrix::{Matrix, Submatrix};
use unimodular::seymour::SeymourParams;
use unimodular::tu::{partition_test, test_totally_unimodular};

fn random_ternary(rng: &mut SmallRng, m: usize, n: usize, density: f64) -> Matrix {
    let rows: Vec<Vec<i8>> = (0..m)
        .map(|_| {
            (0..n)
                .map(|_| {
                    if rng.gen_bool(density) {
                        if rng.gen_bool(0.5) {
                            1
                        } else {
                            -1
                        }
                    } else {
                        0
                    }
                })
                .collect()
        })
        .collect();
    let slices: Vec<&[i8]> = rows.iter().map(Vec::as_slice).collect();
    Matrix::from_dense(&slices)
}

/// Exhaustively checks all square submatrix determinants.
fn is_tu_by_determinants(matrix: &Matrix) -> bool {
    let m = matrix.num_rows();
    let n = matrix.num_columns();
    for size in 1..=m.min(n) {
        for rows in (0..m).combinations(size) {
            for columns in (0..n).combinations(size) {
                let sub = matrix.filter(&Submatrix::new(rows.clone(), columns));
                let det = sub.determinant().unwrap();
                if det.abs() > 1 {
                    return false;
                }
            }
        }
    }
    true
}

#[test]
fn decomposition_agrees_with_partition_test() {
    let mut rng = SmallRng::seed_from_u64(0x7e57);
    for round in 0..40 {
        let m = rng.gen_range(2..6);
        let n = rng.gen_range(2..6);
        let matrix = random_ternary(&mut rng, m, n, 0.5);
        let expected = partition_test(&matrix, None).unwrap();
        let outcome =
            test_totally_unimodular(&matrix, &SeymourParams::default(), None, None).unwrap();
        assert_eq!(
            outcome.is_totally_unimodular, expected,
            "disagreement in round {round} on {matrix:?}"
        );
    }
}

#[test]
fn positive_answers_are_sound() {
    let mut rng = SmallRng::seed_from_u64(0x50d);
    for _ in 0..25 {
        let m = rng.gen_range(2..5);
        let n = rng.gen_range(2..5);
        let matrix = random_ternary(&mut rng, m, n, 0.6);
        let outcome =
            test_totally_unimodular(&matrix, &SeymourParams::default(), None, None).unwrap();
        if outcome.is_totally_unimodular {
            assert!(is_tu_by_determinants(&matrix));
        }
    }
}

#[test]
fn negative_answers_are_certified() {
    let mut rng = SmallRng::seed_from_u64(0xce27);
    let mut negatives = 0;
    for _ in 0..40 {
        let m = rng.gen_range(2..6);
        let n = rng.gen_range(2..6);
        let matrix = random_ternary(&mut rng, m, n, 0.6);
        let outcome =
            test_totally_unimodular(&matrix, &SeymourParams::default(), None, None).unwrap();
        if outcome.is_totally_unimodular {
            continue;
        }
        negatives += 1;
        let violator = outcome
            .violator
            .expect("negative TU answers carry a violator");
        assert_eq!(violator.rows.len(), violator.columns.len());
        let det = matrix.filter(&violator).determinant().unwrap();
        assert!(det.abs() >= 2);
    }
    assert!(negatives > 0, "sampling should produce non-TU matrices");
}

#[test]
fn binary_matrices_round_through_regularity() {
    use unimodular::regular::test_regular;
    let mut rng = SmallRng::seed_from_u64(0xb1);
    for _ in 0..25 {
        let m = rng.gen_range(2..6);
        let n = rng.gen_range(2..6);
        let matrix = random_ternary(&mut rng, m, n, 0.5).support();
        let regular = test_regular(&matrix, &SeymourParams::default(), None, None).unwrap();
        // Regularity of the support is necessary for some signing of the
        // support to be TU; cross-check via the signed version produced by
        // the Camion algorithm.
        let mut signed = matrix.clone();
        unimodular::camion::compute_camion_signed(&mut signed).unwrap();
        let tu = partition_test(&signed, None).unwrap();
        assert_eq!(regular.is_regular, tu);
    }
}
