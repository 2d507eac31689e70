use unimodular::matrix::Matrix;
use unimodular::regular::test_regular;
use unimodular::seymour::sums::one_sum_compose;
use unimodular::seymour::{NodeKind, SeymourParams};
use unimodular::tu::{partition_test, test_totally_unimodular};
use unimodular::Decision;

fn k33() -> Matrix {
    Matrix::from_dense(&[
        &[1, 1, 0, 0],
        &[1, 1, 1, 0],
        &[1, 0, 0, 1],
        &[0, 1, 1, 1],
        &[0, 0, 1, 1],
    ])
}

fn k33_dual() -> Matrix {
    Matrix::from_dense(&[
        &[1, 1, 1, 0, 0],
        &[1, 1, 0, 1, 0],
        &[0, 1, 0, 1, 1],
        &[0, 0, 1, 1, 1],
    ])
}

#[test]
fn one_sum_of_k33_and_its_dual() {
    let matrix = one_sum_compose(&[k33(), k33_dual()]);
    let params = SeymourParams {
        planarity_check: true,
        ..SeymourParams::default()
    };
    let outcome = test_regular(&matrix, &params, None, None).unwrap();
    assert!(outcome.is_regular);

    let dec = outcome.decomposition;
    let root = dec.node(dec.root());
    assert_eq!(root.kind(), NodeKind::OneSum);
    assert_eq!(root.num_children(), 2);

    let first = dec.node(root.children()[0].node);
    let second = dec.node(root.children()[1].node);
    // One graphic, one cographic leaf with opposite markers.
    assert_eq!(first.graphicness(), Decision::Yes);
    assert_eq!(first.cographicness(), Decision::No);
    assert_eq!(second.graphicness(), Decision::No);
    assert_eq!(second.cographicness(), Decision::Yes);

    // The Camion signing of the support is totally unimodular.
    let mut signed = matrix.clone();
    unimodular::camion::compute_camion_signed(&mut signed).unwrap();
    let tu = test_totally_unimodular(&signed, &params, None, None).unwrap();
    assert!(tu.is_totally_unimodular);
}

#[test]
fn two_sum_of_k33_and_its_dual() {
    // Distinguished row of K33 moved last, distinguished column of the
    // dual already first.
    let first = k33().permute(&[1, 2, 3, 4, 0], &[0, 1, 2, 3]);
    let mut composite =
        unimodular::seymour::sums::two_sum_compose(&first, &k33_dual()).unwrap();
    assert_eq!(composite.num_rows(), 8);
    assert_eq!(composite.num_columns(), 8);
    unimodular::camion::compute_camion_signed(&mut composite).unwrap();

    let outcome = test_totally_unimodular(&composite, &SeymourParams::default(), None, None)
        .unwrap();
    assert!(outcome.is_totally_unimodular);

    let dec = outcome.decomposition.unwrap();
    let two_sum = dec
        .nodes()
        .find(|(_, node)| node.kind() == NodeKind::TwoSum)
        .map(|(_, node)| node)
        .expect("decomposition contains a 2-sum node");
    assert_eq!(two_sum.num_children(), 2);
    for child in two_sum.children() {
        assert_eq!(dec.node(child.node).regularity(), Decision::Yes);
    }
}

#[test]
fn r10_circulant_is_a_single_leaf() {
    let r10 = Matrix::from_dense(&[
        &[1, 0, 0, 1, 1],
        &[1, 1, 0, 0, 1],
        &[0, 1, 1, 0, 1],
        &[0, 0, 1, 1, 1],
        &[1, 1, 1, 1, 1],
    ]);
    let outcome =
        test_totally_unimodular(&r10, &SeymourParams::default(), None, None).unwrap();
    assert!(outcome.is_totally_unimodular);
    let dec = outcome.decomposition.unwrap();
    let root = dec.node(dec.root());
    assert_eq!(root.kind(), NodeKind::R10);
    assert_eq!(root.num_children(), 0);
}

#[test]
fn r10_signed_representation_is_a_single_leaf() {
    let r10 = Matrix::from_dense(&[
        &[1, 1, 0, 0, 1],
        &[1, 1, -1, 0, 0],
        &[0, 1, -1, -1, 0],
        &[0, 0, 1, 1, 1],
        &[1, 0, 0, 1, 1],
    ]);
    let outcome =
        test_totally_unimodular(&r10, &SeymourParams::default(), None, None).unwrap();
    assert!(outcome.is_totally_unimodular);
    let dec = outcome.decomposition.unwrap();
    assert_eq!(dec.node(dec.root()).kind(), NodeKind::R10);
}

#[test]
fn fano_is_irregular_with_certified_violator() {
    let fano = Matrix::from_dense(&[&[1, 1, 0, 1], &[0, 1, 1, 1], &[1, 0, 1, 1]]);

    let regular = test_regular(&fano, &SeymourParams::default(), None, None).unwrap();
    assert!(!regular.is_regular);
    let dec = regular.decomposition;
    assert!(dec
        .nodes()
        .any(|(_, node)| node.kind() == NodeKind::Irregular));

    let tu = test_totally_unimodular(&fano, &SeymourParams::default(), None, None).unwrap();
    assert!(!tu.is_totally_unimodular);
    let violator = tu.violator.expect("violator must be certified");
    assert_eq!(violator.rows.len(), violator.columns.len());
    let det = fano.filter(&violator).determinant().unwrap();
    assert!(det.abs() >= 2, "violator determinant was {det}");
}

#[test]
fn r12_decomposes_through_a_three_sum() {
    let r12 = Matrix::from_dense(&[
        &[1, 0, 1, 1, 0, 0],
        &[0, 1, 1, 1, 0, 0],
        &[1, 0, 1, 0, 1, 1],
        &[0, -1, 0, -1, 1, 1],
        &[1, 0, 1, 0, 1, 0],
        &[0, -1, 0, -1, 0, 1],
    ]);
    let outcome =
        test_totally_unimodular(&r12, &SeymourParams::default(), None, None).unwrap();
    assert!(outcome.is_totally_unimodular);

    let dec = outcome.decomposition.unwrap();
    let three_sum = dec
        .nodes()
        .find(|(_, node)| node.kind() == NodeKind::ThreeSum)
        .map(|(_, node)| node)
        .expect("decomposition contains a 3-sum node");
    assert_eq!(three_sum.num_children(), 2);
    for child in three_sum.children() {
        let child = dec.node(child.node);
        assert_eq!(child.regularity(), Decision::Yes);
        assert!(
            child.graphicness() == Decision::Yes || child.cographicness() == Decision::Yes,
            "each 3-sum child of R12 realises a graph or its dual"
        );
    }
}

#[test]
fn partition_test_agrees_on_the_scenarios() {
    let fano = Matrix::from_dense(&[&[1, 1, 0, 1], &[0, 1, 1, 1], &[1, 0, 1, 1]]);
    assert!(!partition_test(&fano, None).unwrap());

    let r12 = Matrix::from_dense(&[
        &[1, 0, 1, 1, 0, 0],
        &[0, 1, 1, 1, 0, 0],
        &[1, 0, 1, 0, 1, 1],
        &[0, -1, 0, -1, 1, 1],
        &[1, 0, 1, 0, 1, 0],
        &[0, -1, 0, -1, 0, 1],
    ]);
    assert!(partition_test(&r12, None).unwrap());
}

#[test]
fn non_ternary_entry_is_a_one_by_one_violator() {
    let matrix = Matrix::from_dense(&[&[1, 2], &[0, 1]]);
    let outcome =
        test_totally_unimodular(&matrix, &SeymourParams::default(), None, None).unwrap();
    assert!(!outcome.is_totally_unimodular);
    let violator = outcome.violator.unwrap();
    assert_eq!((violator.rows.as_slice(), violator.columns.as_slice()), (&[0][..], &[1][..]));
}
