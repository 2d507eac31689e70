//! Representation matrices of graphs.
//!
//! Given a graph and a spanning forest, the binary representation matrix
//! has one row per forest edge and one column per non-forest edge; the
//! column of edge e = {u, v} has a 1 in every row whose forest edge lies on
//! the unique u-v path in the forest. The ternary (network) variant signs
//! each entry by the orientation of the tree edge relative to the cycle
//! through e.
//!
//! The basis is chosen by a multi-source Dijkstra with edge length 0 for
//! hinted forest edges and 1 otherwise, so that a valid forest hint is
//! reproduced verbatim; `basis_correct` reports whether that succeeded.

use std::collections::BinaryHeap;

use crate::graph::{Graph, GraphEdge, GraphNode};
use crate::matrix::Matrix;
use crate::scored::MinScored;

#[derive(Copy, Clone, PartialEq, Eq)]
enum Stage {
    Unknown,
    Seen,
    Completed,
    Basic,
}

#[derive(Copy, Clone)]
struct DijkstraNode {
    stage: Stage,
    predecessor: usize,
    root_edge: usize,
    reversed: bool,
}

const NONE: usize = usize::MAX;

/// Result of building a representation matrix.
pub struct Representation {
    /// The representation matrix (rows = basis, columns = cobasis).
    pub matrix: Matrix,
    /// Whether the supplied forest hint was used verbatim as the basis.
    pub basis_correct: bool,
}

/// Computes the binary representation matrix of `graph`.
///
/// `forest` and `coforest` are hints: rows are emitted in `forest` order
/// when the hint is a spanning forest, and columns in `coforest` order
/// first.
pub fn graph_representation_matrix(
    graph: &Graph,
    forest: &[GraphEdge],
    coforest: &[GraphEdge],
) -> Representation {
    compute_representation_matrix(graph, false, None, forest, coforest)
}

/// Computes the ternary representation matrix of a digraph given as a graph
/// plus per-edge reversal flags (edge e is directed u→v unless
/// `arcs_reversed[e.index()]`).
pub fn network_representation_matrix(
    graph: &Graph,
    arcs_reversed: &[bool],
    forest: &[GraphEdge],
    coforest: &[GraphEdge],
) -> Representation {
    compute_representation_matrix(graph, true, Some(arcs_reversed), forest, coforest)
}

fn compute_representation_matrix(
    graph: &Graph,
    ternary: bool,
    edges_reversed: Option<&[bool]>,
    forest: &[GraphEdge],
    coforest: &[GraphEdge],
) -> Representation {
    let node_bound = graph.node_bound();
    let edge_bound = graph.edge_bound();
    let mut node_data = vec![
        DijkstraNode {
            stage: Stage::Unknown,
            predecessor: NONE,
            root_edge: NONE,
            reversed: false,
        };
        node_bound
    ];
    let mut lengths = vec![1u32; edge_bound];
    for &e in forest {
        lengths[e.index()] = 0;
    }

    // Shortest-path arborescence per connected component; forest-hinted
    // edges have length 0, so a valid hint becomes the arborescence.
    let mut count_components = 0usize;
    let mut distance = vec![u32::MAX; node_bound];
    let mut heap = BinaryHeap::new();
    for s in graph.nodes() {
        if node_data[s.index()].stage != Stage::Unknown {
            continue;
        }
        count_components += 1;
        distance[s.index()] = 0;
        heap.push(MinScored(0u32, s));
        while let Some(MinScored(d, v)) = heap.pop() {
            if node_data[v.index()].stage == Stage::Completed || d > distance[v.index()] {
                continue;
            }
            node_data[v.index()].stage = Stage::Completed;
            for (e, w) in graph.incident(v) {
                if node_data[w.index()].stage == Stage::Completed {
                    continue;
                }
                let next = d + lengths[e.index()];
                if next < distance[w.index()] {
                    distance[w.index()] = next;
                    node_data[w.index()].stage = Stage::Seen;
                    node_data[w.index()].predecessor = v.index();
                    node_data[w.index()].root_edge = e.index();
                    let mut reversed = edges_reversed.is_some_and(|rev| rev[e.index()]);
                    if w == graph.edge_u(e) {
                        reversed = !reversed;
                    }
                    node_data[w.index()].reversed = reversed;
                    heap.push(MinScored(next, w));
                }
            }
        }
    }

    // Non-root node v is mapped to the row of the edge {v, predecessor(v)},
    // forest-hint edges first.
    let mut nodes_rows = vec![NONE; node_bound];
    let mut nodes_reversed = vec![1i8; node_bound];
    let mut num_rows = 0usize;
    let mut basis_correct = true;
    for &e in forest {
        let u = graph.edge_u(e).index();
        let v = graph.edge_v(e).index();
        let child = if node_data[u].predecessor == v && node_data[u].root_edge == e.index() {
            Some(u)
        } else if node_data[v].predecessor == u && node_data[v].root_edge == e.index() {
            Some(v)
        } else {
            basis_correct = false;
            None
        };
        if let Some(child) = child {
            nodes_rows[child] = num_rows;
            nodes_reversed[child] = if node_data[child].reversed { -1 } else { 1 };
            node_data[child].stage = Stage::Basic;
            num_rows += 1;
        }
    }
    if num_rows < graph.num_nodes() - count_components {
        // Some arborescence edge was not hinted.
        basis_correct = false;
        for v in graph.nodes() {
            let v = v.index();
            if node_data[v].predecessor != NONE && node_data[v].stage != Stage::Basic {
                nodes_rows[v] = num_rows;
                nodes_reversed[v] = if node_data[v].reversed { -1 } else { 1 };
                node_data[v].stage = Stage::Basic;
                num_rows += 1;
            }
        }
    }

    // Mark tree edges; the rest become columns, coforest hints first.
    let mut edge_columns = vec![NONE; edge_bound];
    let mut is_tree_edge = vec![false; edge_bound];
    for v in graph.nodes() {
        let e = node_data[v.index()].root_edge;
        if e != NONE {
            is_tree_edge[e] = true;
        }
    }
    let mut column_order: Vec<GraphEdge> = Vec::with_capacity(graph.num_edges());
    for &e in coforest {
        if !is_tree_edge[e.index()] && edge_columns[e.index()] == NONE {
            edge_columns[e.index()] = column_order.len();
            column_order.push(e);
        }
    }
    for e in graph.edges() {
        if !is_tree_edge[e.index()] && edge_columns[e.index()] == NONE {
            edge_columns[e.index()] = column_order.len();
            column_order.push(e);
        }
    }

    // Build the transpose (one CSR row per column) and transpose once.
    let mut row_slice = Vec::with_capacity(column_order.len() + 1);
    let mut entry_columns = Vec::new();
    let mut entry_values: Vec<i8> = Vec::new();
    row_slice.push(0);
    let mut u_path = Vec::new();
    let mut v_path = Vec::new();
    let mut entries: Vec<(usize, i8)> = Vec::new();
    for &e in &column_order {
        let mut u = graph.edge_u(e).index();
        let mut v = graph.edge_v(e).index();
        if edges_reversed.is_some_and(|rev| rev[e.index()]) {
            core::mem::swap(&mut u, &mut v);
        }

        u_path.clear();
        let mut w = u;
        while node_data[w].predecessor != NONE {
            u_path.push(w);
            w = node_data[w].predecessor;
        }
        v_path.clear();
        let mut w = v;
        while node_data[w].predecessor != NONE {
            v_path.push(w);
            w = node_data[w].predecessor;
        }
        // Cancel the common tail towards the root.
        while let (Some(&a), Some(&b)) = (u_path.last(), v_path.last()) {
            if a != b {
                break;
            }
            u_path.pop();
            v_path.pop();
        }

        entries.clear();
        for &w in &u_path {
            debug_assert!(nodes_rows[w] != NONE);
            entries.push((nodes_rows[w], if ternary { -nodes_reversed[w] } else { 1 }));
        }
        for &w in &v_path {
            debug_assert!(nodes_rows[w] != NONE);
            entries.push((nodes_rows[w], if ternary { nodes_reversed[w] } else { 1 }));
        }
        entries.sort_unstable_by_key(|&(r, _)| r);
        for &(r, x) in &entries {
            entry_columns.push(r);
            entry_values.push(x);
        }
        row_slice.push(entry_columns.len());
    }

    let transpose = Matrix::from_csr(num_rows, row_slice, entry_columns, entry_values)
        .expect("paths yield consistent CSR");
    Representation {
        matrix: transpose.transpose(),
        basis_correct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_with_forest_hint() {
        let mut g = Graph::new();
        let a = g.add_node();
        let b = g.add_node();
        let c = g.add_node();
        let ab = g.add_edge(a, b);
        let bc = g.add_edge(b, c);
        let ca = g.add_edge(c, a);
        let rep = graph_representation_matrix(&g, &[ab, bc], &[ca]);
        assert!(rep.basis_correct);
        assert_eq!(rep.matrix, Matrix::from_dense(&[&[1], &[1]]));
    }

    #[test]
    fn network_matrix_of_directed_triangle() {
        // Arcs a->b, b->c, a->c; forest {a->b, b->c}.
        let mut g = Graph::new();
        let a = g.add_node();
        let b = g.add_node();
        let c = g.add_node();
        let ab = g.add_edge(a, b);
        let bc = g.add_edge(b, c);
        let ac = g.add_edge(a, c);
        let rep = network_representation_matrix(&g, &[false, false, false], &[ab, bc], &[ac]);
        assert!(rep.basis_correct);
        // The cycle through a->c uses both tree arcs forward.
        assert_eq!(rep.matrix, Matrix::from_dense(&[&[1], &[1]]));
    }

    #[test]
    fn wrong_hint_is_flagged() {
        let mut g = Graph::new();
        let a = g.add_node();
        let b = g.add_node();
        let c = g.add_node();
        let ab = g.add_edge(a, b);
        let _bc = g.add_edge(b, c);
        let ca = g.add_edge(c, a);
        // {ab, ca} is a spanning tree, but hint only ab: basis completed.
        let rep = graph_representation_matrix(&g, &[ab], &[ca]);
        assert!(!rep.basis_correct);
        assert_eq!(rep.matrix.num_rows(), 2);
        assert_eq!(rep.matrix.num_columns(), 1);
    }
}
