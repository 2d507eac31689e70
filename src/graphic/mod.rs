//! Graphicness testing via an incremental t-decomposition.
//!
//! A {0,1} matrix M is *graphic* if it is the representation matrix of some
//! graph G with respect to a spanning forest: rows correspond to forest
//! edges, columns to the remaining edges, and column e selects the forest
//! edges on the cycle that e closes. The test feeds the columns of M one at
//! a time into a [t-decomposition](tdec), which maintains all graphs
//! realising the matroid seen so far; if every column is admissible, the
//! final decomposition is collapsed into a concrete realisation.
//!
//! The ternary variant additionally checks Camion signedness and orients
//! the realisation's edges so that the signed representation matrix equals
//! the input.

mod tdec;

use crate::camion::test_camion_signed;
use crate::graph::{Graph, GraphEdge};
use crate::matrix::{Matrix, Submatrix};
use crate::onesum::decompose_one_sum;
use crate::represent::graph_representation_matrix;
use crate::Result;

pub(crate) use tdec::{NewColumn, TDec};

/// A graph realisation of a graphic matrix.
#[derive(Clone, Debug)]
pub struct GraphicOutcome {
    pub graph: Graph,
    /// `forest[r]` is the graph edge of row r.
    pub forest: Vec<GraphEdge>,
    /// `coforest[c]` is the graph edge of column c.
    pub coforest: Vec<GraphEdge>,
}

/// Tests whether a {0,1} matrix is graphic; on success returns the
/// realising graph with its forest and coforest.
pub fn test_graphic_matrix(matrix: &Matrix) -> Result<Option<GraphicOutcome>> {
    if matrix.is_binary().is_err() {
        return Err(crate::Error::InvalidInput("matrix must be binary"));
    }
    Ok(test_graphic_transposed(&matrix.transpose()))
}

/// A digraph realisation of a network matrix: the graph plus per-edge
/// reversal flags giving the arc directions.
#[derive(Clone, Debug)]
pub struct NetworkOutcome {
    pub graph: Graph,
    pub forest: Vec<GraphEdge>,
    pub coforest: Vec<GraphEdge>,
    /// Whether arc e points against its edge's (u, v) orientation.
    pub arcs_reversed: Vec<bool>,
}

/// Internal result of the transposed network test.
pub(crate) enum NetworkInner {
    Network(NetworkOutcome),
    /// The tested matrix is not Camion-signed; the violator refers to the
    /// tested (non-transposed) matrix.
    NotCamion(Submatrix),
    NotGraphic,
}

/// Decides graphicness of the transpose of `transpose`.
///
/// The columns of the tested matrix are exactly the rows of `transpose`,
/// which is the access pattern the column-by-column t-decomposition needs.
pub(crate) fn test_graphic_transposed(transpose: &Matrix) -> Option<GraphicOutcome> {
    let num_rows = transpose.num_columns();
    let num_columns = transpose.num_rows();

    if transpose.num_nonzeros() == 0 {
        // A zero matrix is realised by a path of forest edges with all
        // column loops attached at its first node.
        let mut graph = Graph::new();
        let mut forest = Vec::with_capacity(num_rows);
        let mut coforest = Vec::with_capacity(num_columns);
        let mut s = graph.add_node();
        for _ in 0..num_columns {
            coforest.push(graph.add_edge(s, s));
        }
        for _ in 0..num_rows {
            let t = graph.add_node();
            forest.push(graph.add_edge(s, t));
            s = t;
        }
        return Some(GraphicOutcome {
            graph,
            forest,
            coforest,
        });
    }

    let mut dec = TDec::new(num_rows);
    let mut newcolumn = NewColumn::new();
    for column in 0..num_columns {
        let (rows, _) = transpose.row(column);
        dec.add_column_check(&mut newcolumn, rows);
        if !newcolumn.remains_graphic {
            return None;
        }
        dec.add_column_apply(&mut newcolumn, column, rows);
    }

    // Rows that never occurred in a column become single-edge members.
    for r in dec.num_rows..num_rows {
        dec.add_row_member(r);
    }

    let mut forest = vec![GraphEdge(usize::MAX); num_rows];
    let mut coforest = vec![GraphEdge(usize::MAX); num_columns];
    let graph = dec.to_graph(&mut forest, &mut coforest);
    debug_assert!(forest.iter().all(|e| e.index() != usize::MAX));
    debug_assert!(coforest.iter().all(|e| e.index() != usize::MAX));
    Some(GraphicOutcome {
        graph,
        forest,
        coforest,
    })
}

/// Decides whether the transpose of `transpose` is a network matrix and
/// computes the arc orientations.
pub(crate) fn test_network_transposed(transpose: &Matrix) -> Result<NetworkInner> {
    let camion = test_camion_signed(transpose)?;
    if !camion.was_camion_signed {
        let violator = camion
            .violator
            .expect("test always reports a violator")
            .transposed();
        return Ok(NetworkInner::NotCamion(violator));
    }

    let Some(outcome) = test_graphic_transposed(&transpose.support()) else {
        return Ok(NetworkInner::NotGraphic);
    };
    let GraphicOutcome {
        graph,
        forest,
        coforest,
    } = outcome;

    let mut arcs_reversed = vec![false; graph.edge_bound()];
    let mut forest_index = vec![usize::MAX; graph.edge_bound()];
    for (r, &e) in forest.iter().enumerate() {
        forest_index[e.index()] = r;
    }

    #[derive(Copy, Clone)]
    struct NodeData {
        seen: bool,
        completed: bool,
        fixed: bool,
        predecessor: usize,
        edge: usize,
        distance: u32,
        sign: i8,
    }
    let mut node_data = vec![
        NodeData {
            seen: false,
            completed: false,
            fixed: false,
            predecessor: usize::MAX,
            edge: usize::MAX,
            distance: 0,
            sign: 0,
        };
        graph.node_bound()
    ];
    let mut queue = Vec::new();

    // Fix the orientations component by component, column by column: every
    // column fixes the signs of the still-unfixed tree edges on its cycle.
    for component in decompose_one_sum(transpose) {
        if component.matrix.num_nonzeros() == 0 {
            continue;
        }
        // Rows of `transpose` are columns of the tested matrix and vice
        // versa.
        let component_rows = &component.columns_to_original;
        let component_columns = &component.rows_to_original;

        // BFS over the tree edges of this component's induced subgraph.
        let start = graph.edge_u(forest[component_rows[0]]);
        queue.clear();
        queue.push(start);
        debug_assert!(!node_data[start.index()].seen);
        node_data[start.index()].seen = true;
        let mut head = 0;
        while head < queue.len() {
            let v = queue[head];
            head += 1;
            node_data[v.index()].completed = true;
            for (e, w) in graph.incident(v) {
                if node_data[w.index()].completed || forest_index[e.index()] == usize::MAX {
                    continue;
                }
                if !node_data[w.index()].seen {
                    node_data[w.index()].seen = true;
                    node_data[w.index()].predecessor = v.index();
                    node_data[w.index()].distance = node_data[v.index()].distance + 1;
                    node_data[w.index()].edge = e.index();
                    queue.push(w);
                }
            }
        }

        for &column in component_columns {
            let column_edge = coforest[column];
            let s = graph.edge_u(column_edge);
            let t = graph.edge_v(column_edge);

            // Read the matrix signs of the tree edges on the cycle of this
            // column and find where the two root paths meet.
            let (rows, values) = transpose.row(column);
            let mut min_distance = u32::MAX;
            for (&row, &x) in rows.iter().zip(values) {
                let row_edge = forest[row];
                let u = graph.edge_u(row_edge).index();
                let v = graph.edge_v(row_edge).index();
                if node_data[v].predecessor == u {
                    min_distance = min_distance.min(node_data[u].distance);
                    node_data[v].sign = x;
                } else {
                    debug_assert_eq!(node_data[u].predecessor, v);
                    min_distance = min_distance.min(node_data[v].distance);
                    node_data[u].sign = x;
                }
            }

            // If some cycle edge is already fixed, it decides whether the
            // column's arc is reversed.
            let mut found_fixed = false;
            let mut reversed_column_edge = false;
            let mut v = s.index();
            while node_data[v].distance > min_distance {
                if node_data[v].fixed {
                    let mut current: i8 = if graph.edge_u(GraphEdge(node_data[v].edge)).index() == v
                    {
                        1
                    } else {
                        -1
                    };
                    if arcs_reversed[node_data[v].edge] {
                        current = -current;
                    }
                    found_fixed = true;
                    reversed_column_edge = current != node_data[v].sign;
                    break;
                }
                v = node_data[v].predecessor;
            }
            if !found_fixed {
                let mut v = t.index();
                while node_data[v].distance > min_distance {
                    if node_data[v].fixed {
                        let mut current: i8 =
                            if graph.edge_u(GraphEdge(node_data[v].edge)).index() == v {
                                -1
                            } else {
                                1
                            };
                        if arcs_reversed[node_data[v].edge] {
                            current = -current;
                        }
                        reversed_column_edge = current != node_data[v].sign;
                        break;
                    }
                    v = node_data[v].predecessor;
                }
            }
            arcs_reversed[column_edge.index()] = reversed_column_edge;

            // Fix all tree edges along both root paths.
            let mut v = s.index();
            while node_data[v].distance > min_distance {
                let mut current: i8 = if graph.edge_u(GraphEdge(node_data[v].edge)).index() == v {
                    1
                } else {
                    -1
                };
                if reversed_column_edge {
                    current = -current;
                }
                arcs_reversed[node_data[v].edge] = current != node_data[v].sign;
                node_data[v].fixed = true;
                node_data[v].sign = 0;
                v = node_data[v].predecessor;
            }
            let mut v = t.index();
            while node_data[v].distance > min_distance {
                let mut current: i8 = if graph.edge_u(GraphEdge(node_data[v].edge)).index() == v {
                    -1
                } else {
                    1
                };
                if reversed_column_edge {
                    current = -current;
                }
                arcs_reversed[node_data[v].edge] = current != node_data[v].sign;
                node_data[v].fixed = true;
                node_data[v].sign = 0;
                v = node_data[v].predecessor;
            }
        }
    }

    Ok(NetworkInner::Network(NetworkOutcome {
        graph,
        forest,
        coforest,
        arcs_reversed,
    }))
}

/// Verifies `outcome` against `matrix`: the representation matrix of the
/// returned graph with respect to the returned forest must reproduce the
/// input. Used by tests and kept here next to the producer.
#[doc(hidden)]
pub fn verify_graphic_outcome(matrix: &Matrix, outcome: &GraphicOutcome) -> bool {
    let rep = graph_representation_matrix(&outcome.graph, &outcome.forest, &outcome.coforest);
    rep.basis_correct && rep.matrix == *matrix
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_graphic(rows: &[&[i8]]) {
        let matrix = Matrix::from_dense(rows);
        let outcome = test_graphic_matrix(&matrix).unwrap();
        let outcome = outcome.expect("matrix should be graphic");
        assert_eq!(outcome.forest.len(), matrix.num_rows());
        assert_eq!(outcome.coforest.len(), matrix.num_columns());
        assert!(verify_graphic_outcome(&matrix, &outcome));
    }

    #[test]
    fn wheel_is_graphic() {
        assert_graphic(&[&[1, 1, 0], &[0, 1, 1], &[1, 1, 1]]);
    }

    #[test]
    fn triangle_matrix_is_graphic() {
        assert_graphic(&[&[1, 0, 1], &[1, 1, 0], &[0, 1, 1]]);
    }

    #[test]
    fn k5_representation_is_graphic() {
        // K5 with the star at node 0 as spanning tree; every chord closes
        // a cycle through exactly two spokes.
        assert_graphic(&[
            &[1, 1, 1, 0, 0, 0],
            &[1, 0, 0, 1, 1, 0],
            &[0, 1, 0, 1, 0, 1],
            &[0, 0, 1, 0, 1, 1],
        ]);
    }

    #[test]
    fn fano_is_not_graphic() {
        let fano = Matrix::from_dense(&[&[1, 1, 0, 1], &[0, 1, 1, 1], &[1, 0, 1, 1]]);
        assert!(test_graphic_matrix(&fano).unwrap().is_none());
    }

    #[test]
    fn k33_dual_is_not_graphic() {
        let k33_dual = Matrix::from_dense(&[
            &[1, 1, 1, 0, 0],
            &[1, 1, 0, 1, 0],
            &[0, 1, 0, 1, 1],
            &[0, 0, 1, 1, 1],
        ]);
        assert!(test_graphic_matrix(&k33_dual).unwrap().is_none());
    }

    #[test]
    fn zero_and_unit_columns_are_graphic() {
        assert_graphic(&[&[1, 0, 0], &[0, 0, 1], &[0, 0, 1]]);
    }

    #[test]
    fn seven_by_seven_sequence() {
        assert_graphic(&[
            &[1, 0, 0, 1, 0, 0, 0],
            &[1, 1, 0, 0, 0, 0, 0],
            &[0, 1, 1, 0, 0, 0, 0],
            &[0, 0, 1, 1, 1, 1, 1],
            &[0, 0, 0, 1, 1, 1, 1],
            &[0, 0, 1, 1, 1, 0, 0],
            &[0, 0, 0, 0, 1, 0, 1],
        ]);
    }
}
