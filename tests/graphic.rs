use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use unimodular::graph::Graph;
use unimodular::graphic::test_graphic_matrix;
use unimodular::matrix::Matrix;
use unimodular::network::test_network_matrix;
use unimodular::represent::{graph_representation_matrix, network_representation_matrix};

fn assert_graphic_roundtrip(matrix: &Matrix) {
    let outcome = test_graphic_matrix(matrix)
        .unwrap()
        .expect("matrix should be graphic");
    let rep = graph_representation_matrix(&outcome.graph, &outcome.forest, &outcome.coforest);
    assert!(rep.basis_correct);
    assert_eq!(rep.matrix, *matrix);
}

#[test]
fn sequence_with_one_row_one_column_additions() {
    let matrix = Matrix::from_dense(&[
        &[1, 0, 0, 1, 0, 0, 0],
        &[1, 1, 0, 0, 0, 0, 0],
        &[0, 1, 1, 0, 0, 0, 0],
        &[0, 0, 1, 1, 1, 1, 1],
        &[0, 0, 0, 1, 1, 1, 1],
        &[0, 0, 1, 1, 1, 0, 0],
        &[0, 0, 0, 0, 1, 0, 1],
    ]);
    let outcome = test_graphic_matrix(&matrix)
        .unwrap()
        .expect("sequence matrix is graphic");
    // 7 forest edges in one connected graph: 8 nodes, 14 edges total.
    assert_eq!(outcome.graph.num_nodes(), 8);
    assert_eq!(outcome.graph.num_edges(), 14);
    assert_eq!(outcome.forest.len(), 7);
    assert_eq!(outcome.coforest.len(), 7);
    let rep = graph_representation_matrix(&outcome.graph, &outcome.forest, &outcome.coforest);
    assert!(rep.basis_correct);
    assert_eq!(rep.matrix, matrix);
}

#[test]
fn random_graphs_round_trip() {
    let mut rng = SmallRng::seed_from_u64(0x5eed);
    for _ in 0..30 {
        let num_nodes = rng.gen_range(3..9);
        let extra_edges = rng.gen_range(1..7);
        let mut graph = Graph::new();
        let nodes: Vec<_> = (0..num_nodes).map(|_| graph.add_node()).collect();
        let mut forest = Vec::new();
        for i in 1..num_nodes {
            let parent = nodes[rng.gen_range(0..i)];
            forest.push(graph.add_edge(parent, nodes[i]));
        }
        let mut coforest = Vec::new();
        for _ in 0..extra_edges {
            let u = nodes[rng.gen_range(0..num_nodes)];
            let v = nodes[rng.gen_range(0..num_nodes)];
            coforest.push(graph.add_edge(u, v));
        }

        let rep = graph_representation_matrix(&graph, &forest, &coforest);
        assert!(rep.basis_correct);
        assert_graphic_roundtrip(&rep.matrix);
    }
}

#[test]
fn random_digraphs_round_trip_as_network_matrices() {
    let mut rng = SmallRng::seed_from_u64(0xd16);
    for _ in 0..30 {
        let num_nodes = rng.gen_range(3..8);
        let extra_edges = rng.gen_range(1..6);
        let mut graph = Graph::new();
        let nodes: Vec<_> = (0..num_nodes).map(|_| graph.add_node()).collect();
        let mut forest = Vec::new();
        for i in 1..num_nodes {
            let parent = nodes[rng.gen_range(0..i)];
            forest.push(graph.add_edge(parent, nodes[i]));
        }
        let mut coforest = Vec::new();
        for _ in 0..extra_edges {
            let u = nodes[rng.gen_range(0..num_nodes)];
            let mut v = nodes[rng.gen_range(0..num_nodes)];
            if u == v {
                v = nodes[(v.index() + 1) % num_nodes];
            }
            coforest.push(graph.add_edge(u, v));
        }
        let arcs_reversed: Vec<bool> = (0..graph.edge_bound()).map(|_| rng.gen()).collect();

        let rep = network_representation_matrix(&graph, &arcs_reversed, &forest, &coforest);
        assert!(rep.basis_correct);

        let outcome = test_network_matrix(&rep.matrix).unwrap();
        assert!(outcome.is_network, "network matrix must be recognised");
        let digraph = outcome.digraph.unwrap();
        let back = network_representation_matrix(
            &digraph.graph,
            &digraph.arcs_reversed,
            &digraph.forest,
            &digraph.coforest,
        );
        assert!(back.basis_correct);
        assert_eq!(back.matrix, rep.matrix);
    }
}

#[test]
fn non_graphic_matrices_are_rejected() {
    let fano = Matrix::from_dense(&[&[1, 1, 0, 1], &[0, 1, 1, 1], &[1, 0, 1, 1]]);
    assert!(test_graphic_matrix(&fano).unwrap().is_none());

    let k5_dual_like = Matrix::from_dense(&[
        &[1, 1, 1, 0, 0],
        &[1, 1, 0, 1, 0],
        &[0, 1, 0, 1, 1],
        &[0, 0, 1, 1, 1],
    ]);
    assert!(test_graphic_matrix(&k5_dual_like).unwrap().is_none());
}

#[test]
fn disconnected_matrix_is_graphic_per_block() {
    let matrix = Matrix::from_dense(&[
        &[1, 1, 0, 0],
        &[1, 1, 0, 0],
        &[0, 0, 1, 1],
        &[0, 0, 0, 1],
    ]);
    assert_graphic_roundtrip(&matrix);
}
