use unimodular::matrix::Matrix;
use unimodular::separation::{Separation, SeparationKind, Side};
use unimodular::seymour::sums::{
    delta_sum_compose, delta_sum_decompose, one_sum_compose, three_sum_compose,
    three_sum_decompose, two_sum_compose, two_sum_decompose, y_sum_compose, y_sum_decompose,
};

fn separation(
    matrix: &Matrix,
    kind: SeparationKind,
    first_rows: &[usize],
    first_cols: &[usize],
) -> Separation {
    let rows = (0..matrix.num_rows())
        .map(|r| {
            if first_rows.contains(&r) {
                Side::First
            } else {
                Side::Second
            }
        })
        .collect();
    let columns = (0..matrix.num_columns())
        .map(|c| {
            if first_cols.contains(&c) {
                Side::First
            } else {
                Side::Second
            }
        })
        .collect();
    Separation::new(kind, rows, columns)
}

#[test]
fn one_sum_stacks_blocks() {
    let a = Matrix::from_dense(&[&[1, -1], &[0, 1]]);
    let b = Matrix::from_dense(&[&[1]]);
    let sum = one_sum_compose(&[a.clone(), b.clone()]);
    assert_eq!(sum.num_rows(), 3);
    assert_eq!(sum.num_columns(), 3);
    assert_eq!(sum.get(0, 1), -1);
    assert_eq!(sum.get(2, 2), 1);
    assert_eq!(sum.get(0, 2), 0);
    assert_eq!(sum.get(2, 0), 0);
}

#[test]
fn two_sum_decompose_recovers_children() {
    let first = Matrix::from_dense(&[&[1, 1, 0], &[0, 1, 1], &[1, 0, 1]]);
    let second = Matrix::from_dense(&[&[1, 0, 1], &[1, 1, 0], &[0, -1, 1]]);
    let composite = two_sum_compose(&first, &second).unwrap();

    let sep = separation(&composite, SeparationKind::Two, &[0, 1], &[0, 1, 2]);
    let (c1, c2) = two_sum_decompose(&composite, &sep, true).unwrap().unwrap();

    // The extracted children reproduce the composite, and the element maps
    // are complete.
    assert_eq!(two_sum_compose(&c1.matrix, &c2.matrix).unwrap(), composite);
    assert_eq!(c1.rows_to_parent.len(), c1.matrix.num_rows());
    assert_eq!(c1.columns_to_parent.len(), c1.matrix.num_columns());
    assert_eq!(c2.rows_to_parent.len(), c2.matrix.num_rows());
    assert_eq!(c2.columns_to_parent.len(), c2.matrix.num_columns());
    assert_eq!(c1.special_rows.len() + c1.special_columns.len(), 1);
    assert_eq!(c2.special_rows.len() + c2.special_columns.len(), 1);
}

#[test]
fn two_sum_through_the_top_right_block() {
    // The rank-1 block sits top right; the first child carries a
    // connecting column instead of a row.
    let composite = Matrix::from_dense(&[
        &[1, 1, 0, 1, 1],
        &[0, 1, 1, 1, 1],
        &[0, 0, 0, 1, 0],
        &[0, 0, 0, 1, 1],
    ]);
    let sep = separation(&composite, SeparationKind::Two, &[0, 1], &[0, 1, 2]);
    let (c1, c2) = two_sum_decompose(&composite, &sep, true).unwrap().unwrap();
    assert_eq!(c1.special_columns.len(), 1);
    assert_eq!(c2.special_rows.len(), 1);
}

#[test]
fn delta_sum_roundtrip_with_signs() {
    let composite = Matrix::from_dense(&[
        &[1, -1, 0, 0, 0],
        &[0, 1, 1, -1, -1],
        &[0, 1, 1, -1, -1],
        &[1, 1, 0, 1, 0],
        &[1, 1, 0, 0, 1],
    ]);
    let sep = separation(
        &composite,
        SeparationKind::ThreeDistributed,
        &[0, 1, 2],
        &[0, 1, 2],
    );
    let (c1, c2) = delta_sum_decompose(&composite, &sep, true).unwrap();
    assert_eq!(
        delta_sum_compose(&c1.matrix, &c2.matrix).unwrap(),
        composite
    );
    // Wide children: one extra row and a duplicated extra column each.
    assert_eq!(c1.special_rows.len(), 1);
    assert_eq!(c1.special_columns.len(), 2);
    assert_eq!(c2.special_rows.len(), 1);
    assert_eq!(c2.special_columns.len(), 2);
}

#[test]
fn y_sum_roundtrip() {
    let composite = Matrix::from_dense(&[
        &[1, 0, 0, 1, 1],
        &[1, 1, 1, 1, 1],
        &[0, 1, 1, 0, 0],
        &[0, 1, 1, 1, 0],
        &[0, 1, 1, 0, 1],
    ]);
    let sep = separation(
        &composite,
        SeparationKind::ThreeDistributed,
        &[0, 1, 2],
        &[0, 1, 2],
    );
    let (c1, c2) = y_sum_decompose(&composite, &sep, false).unwrap();
    assert_eq!(y_sum_compose(&c1.matrix, &c2.matrix).unwrap(), composite);
    // Tall children: duplicated extra rows, one extra column each.
    assert_eq!(c1.special_rows.len(), 2);
    assert_eq!(c1.special_columns.len(), 1);
}

#[test]
fn three_sum_roundtrip_binary_and_ternary() {
    let r12_signed = Matrix::from_dense(&[
        &[1, 0, 1, 1, 0, 0],
        &[0, 1, 1, 1, 0, 0],
        &[1, 0, 1, 0, 1, 1],
        &[0, -1, 0, -1, 1, 1],
        &[1, 0, 1, 0, 1, 0],
        &[0, -1, 0, -1, 0, 1],
    ]);
    for ternary in [false, true] {
        let sep = separation(
            &r12_signed,
            SeparationKind::ThreeConcentrated,
            &[0, 1],
            &[0, 1, 2, 3],
        );
        let matrix = if ternary {
            r12_signed.clone()
        } else {
            r12_signed.support()
        };
        let (c1, c2) = three_sum_decompose(&matrix, &sep, ternary).unwrap();
        assert_eq!(three_sum_compose(&c1.matrix, &c2.matrix).unwrap(), matrix);
        assert_eq!(c1.special_rows.len(), 2);
        assert_eq!(c1.special_columns.len(), 2);
        assert_eq!(c2.special_rows.len(), 2);
        assert_eq!(c2.special_columns.len(), 2);
    }
}

#[test]
fn inconsistent_separation_is_a_structure_error() {
    // Both cross blocks nonzero cannot be a 2-separation.
    let matrix = Matrix::from_dense(&[&[1, 1], &[1, 1]]);
    let sep = separation(&matrix, SeparationKind::Two, &[0], &[0]);
    assert!(two_sum_decompose(&matrix, &sep, false).is_err());
}
