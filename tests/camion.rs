use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use unimodular::camion::{compute_camion_signed, test_camion_signed};
use unimodular::matrix::Matrix;

fn random_ternary(rng: &mut SmallRng, m: usize, n: usize) -> Matrix {
    let rows: Vec<Vec<i8>> = (0..m)
        .map(|_| {
            (0..n)
                .map(|_| match rng.gen_range(0..4) {
                    0 | 1 => 0,
                    2 => 1,
                    _ => -1,
                })
                .collect()
        })
        .collect();
    let slices: Vec<&[i8]> = rows.iter().map(Vec::as_slice).collect();
    Matrix::from_dense(&slices)
}

#[test]
fn signing_is_idempotent_on_random_matrices() {
    let mut rng = SmallRng::seed_from_u64(0xca310);
    for _ in 0..50 {
        let m = rng.gen_range(1..7);
        let n = rng.gen_range(1..7);
        let mut matrix = random_ternary(&mut rng, m, n);
        compute_camion_signed(&mut matrix).unwrap();
        let signed_once = matrix.clone();

        // A signed matrix stays untouched.
        let outcome = compute_camion_signed(&mut matrix).unwrap();
        assert!(outcome.was_camion_signed);
        assert!(outcome.violator.is_none());
        assert_eq!(matrix, signed_once);
        assert!(test_camion_signed(&matrix).unwrap().was_camion_signed);
    }
}

#[test]
fn signing_preserves_support() {
    let mut rng = SmallRng::seed_from_u64(0x5309);
    for _ in 0..50 {
        let m = rng.gen_range(1..7);
        let n = rng.gen_range(1..7);
        let mut matrix = random_ternary(&mut rng, m, n);
        let support = matrix.support();
        compute_camion_signed(&mut matrix).unwrap();
        assert_eq!(matrix.support(), support);
    }
}

#[test]
fn violators_have_bad_determinants() {
    let mut rng = SmallRng::seed_from_u64(0xbad);
    let mut seen_violator = false;
    for _ in 0..100 {
        let m = rng.gen_range(2..7);
        let n = rng.gen_range(2..7);
        let matrix = random_ternary(&mut rng, m, n);
        let outcome = test_camion_signed(&matrix).unwrap();
        if let Some(violator) = outcome.violator {
            assert!(!outcome.was_camion_signed);
            assert_eq!(violator.rows.len(), violator.columns.len());
            let det = matrix.filter(&violator).determinant().unwrap();
            assert!(det.abs() >= 2, "violator determinant was {det}");
            seen_violator = true;
        }
    }
    assert!(seen_violator, "random sampling should hit a violator");
}

#[test]
fn transposed_wide_matrix_is_handled() {
    // More rows than columns exercises the transpose dispatch.
    let mut matrix = Matrix::from_dense(&[&[1, 1], &[1, -1], &[0, 1], &[1, 0]]);
    let outcome = compute_camion_signed(&mut matrix).unwrap();
    assert!(!outcome.was_camion_signed);
    assert!(test_camion_signed(&matrix).unwrap().was_camion_signed);
}
