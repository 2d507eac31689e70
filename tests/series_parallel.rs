use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use unimodular::matrix::Matrix;
use unimodular::series_parallel::{decompose, SpOutcome};

#[test]
fn fully_reducible_matrix_is_series_parallel() {
    // Built by repeatedly appending unit and parallel rows/columns.
    let matrix = Matrix::from_dense(&[
        &[1, 1, 0, 0, 0],
        &[1, 1, 0, 1, 0],
        &[0, 1, 0, 1, 0],
        &[0, 1, 0, 1, 0],
        &[0, 0, 0, 1, 1],
    ]);
    let result = decompose(&matrix, false, usize::MAX).unwrap();
    assert!(matches!(result.outcome, SpOutcome::SeriesParallel));
    assert!(result.reductions.len() <= matrix.num_rows() + matrix.num_columns());
}

#[test]
fn reduction_count_is_bounded_on_random_matrices() {
    let mut rng = SmallRng::seed_from_u64(0x59);
    for _ in 0..50 {
        let m = rng.gen_range(1..9);
        let n = rng.gen_range(1..9);
        let rows: Vec<Vec<i8>> = (0..m)
            .map(|_| (0..n).map(|_| i8::from(rng.gen_bool(0.4))).collect())
            .collect();
        let slices: Vec<&[i8]> = rows.iter().map(Vec::as_slice).collect();
        let matrix = Matrix::from_dense(&slices);
        let result = decompose(&matrix, false, usize::MAX).unwrap();
        assert!(result.reductions.len() <= m + n);
        // Residual elements and reductions partition the elements.
        assert_eq!(
            result.reductions.len() + result.reduced.rows.len() + result.reduced.columns.len(),
            m + n
        );
    }
}

#[test]
fn wheel_certificate_is_a_chordless_cycle() {
    let w4 = Matrix::from_dense(&[
        &[1, 1, 0, 0],
        &[0, 1, 1, 0],
        &[0, 0, 1, 1],
        &[1, 0, 0, 1],
    ]);
    let result = decompose(&w4, false, usize::MAX).unwrap();
    let SpOutcome::Wheel(sub) = result.outcome else {
        panic!("expected a wheel certificate");
    };
    assert_eq!(sub.rows.len(), sub.columns.len());
    assert!(sub.rows.len() >= 3);
    // Each certified row and column has exactly two nonzeros on the cycle.
    let cycle = w4.filter(&sub);
    for r in 0..cycle.num_rows() {
        assert_eq!(cycle.row_len(r), 2);
    }
}

#[test]
fn articulation_split_yields_two_separation() {
    // Two wheels glued along column 2, which cuts the support graph.
    let matrix = Matrix::from_dense(&[
        &[1, 1, 0, 0, 0],
        &[0, 1, 1, 0, 0],
        &[1, 1, 1, 0, 0],
        &[0, 0, 1, 1, 0],
        &[0, 0, 0, 1, 1],
        &[0, 0, 1, 1, 1],
    ]);
    let result = decompose(&matrix, false, usize::MAX).unwrap();
    assert!(result.reductions.is_empty());
    let SpOutcome::TwoSeparation(separation) = result.outcome else {
        panic!("expected a 2-separation");
    };
    let first = separation.first_rows().len() + separation.first_columns().len();
    let second = separation.second_rows().len() + separation.second_columns().len();
    assert!(first >= 2 && second >= 2);
    assert_eq!(first + second, 11);
}

#[test]
fn single_reduction_limit_is_respected() {
    let matrix = Matrix::from_dense(&[&[1, 0, 0], &[1, 1, 0], &[0, 1, 1], &[0, 1, 1]]);
    let result = decompose(&matrix, false, 1).unwrap();
    assert_eq!(result.reductions.len(), 1);
}
