//! Network and conetwork matrices.
//!
//! A ternary matrix is a *network matrix* if it is the signed
//! representation matrix of some digraph with respect to a spanning
//! forest. Equivalently, it is Camion-signed and its support is graphic;
//! the test reuses the graphicness engine and then orients the realising
//! graph's arcs.

use crate::graphic::{test_network_transposed, NetworkInner, NetworkOutcome};
use crate::matrix::{Matrix, Submatrix};
use crate::{Error, Result};

/// Result of a network or conetwork test.
#[derive(Debug)]
pub struct NetworkTestOutcome {
    pub is_network: bool,
    /// The realising digraph with forest, coforest and arc reversals.
    pub digraph: Option<NetworkOutcome>,
    /// A submatrix with non-ternary determinant when the signing is not
    /// Camion.
    pub violator: Option<Submatrix>,
}

/// Tests whether `matrix` is a network matrix.
pub fn test_network_matrix(matrix: &Matrix) -> Result<NetworkTestOutcome> {
    if matrix.is_ternary().is_err() {
        return Err(Error::InvalidInput("matrix must be ternary"));
    }
    wrap(test_network_transposed(&matrix.transpose())?, false)
}

/// Tests whether `matrix` is the transpose of a network matrix.
pub fn test_conetwork_matrix(matrix: &Matrix) -> Result<NetworkTestOutcome> {
    if matrix.is_ternary().is_err() {
        return Err(Error::InvalidInput("matrix must be ternary"));
    }
    wrap(test_network_transposed(matrix)?, true)
}

fn wrap(inner: NetworkInner, transpose_violator: bool) -> Result<NetworkTestOutcome> {
    Ok(match inner {
        NetworkInner::Network(outcome) => NetworkTestOutcome {
            is_network: true,
            digraph: Some(outcome),
            violator: None,
        },
        NetworkInner::NotCamion(violator) => NetworkTestOutcome {
            is_network: false,
            digraph: None,
            violator: Some(if transpose_violator {
                violator.transposed()
            } else {
                violator
            }),
        },
        NetworkInner::NotGraphic => NetworkTestOutcome {
            is_network: false,
            digraph: None,
            violator: None,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::represent::network_representation_matrix;

    #[test]
    fn network_roundtrip_on_oriented_k4() {
        // K4 with a star spanning tree and mixed arc directions.
        let mut g = Graph::new();
        let nodes: Vec<_> = (0..4).map(|_| g.add_node()).collect();
        let forest = vec![
            g.add_edge(nodes[0], nodes[1]),
            g.add_edge(nodes[0], nodes[2]),
            g.add_edge(nodes[0], nodes[3]),
        ];
        let coforest = vec![
            g.add_edge(nodes[1], nodes[2]),
            g.add_edge(nodes[2], nodes[3]),
            g.add_edge(nodes[3], nodes[1]),
        ];
        let arcs_reversed = vec![false, true, false, false, true, false];
        let rep = network_representation_matrix(&g, &arcs_reversed, &forest, &coforest);
        assert!(rep.basis_correct);

        let outcome = test_network_matrix(&rep.matrix).unwrap();
        assert!(outcome.is_network);
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

    #[test]
    fn wrong_signing_is_rejected() {
        let matrix = Matrix::from_dense(&[&[1, 1], &[-1, 1]]);
        let outcome = test_network_matrix(&matrix).unwrap();
        assert!(!outcome.is_network);
        let violator = outcome.violator.unwrap();
        assert_eq!(matrix.filter(&violator).determinant().unwrap().abs(), 2);
    }
}
