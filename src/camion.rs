//! Camion signing: decide whether the signs of a ternary matrix are
//! consistent with a totally unimodular signing of its support, and
//! optionally repair them.
//!
//! The algorithm processes the rows of a sequentially connected matrix in
//! order. For the k-th row it marks the columns of the row's nonzeros as
//! targets and runs a BFS over the bipartite row/column graph of the
//! already-processed prefix, starting at the column of the row's first
//! nonzero. Whenever the BFS first reaches another target column, the
//! closed walk through the new row is chordless; its entry sum must be
//! divisible by 4, otherwise the walk induces a square submatrix with
//! determinant ±2 and the sign of the reached column entry must flip.
//!
//! Matrices that are not sequentially connected are dispatched through the
//! one-sum decomposition and the results are stitched back.

use crate::matrix::{Matrix, Submatrix};
use crate::onesum::decompose_one_sum;
use crate::Result;

/// Outcome of a Camion signing check or computation.
#[derive(Clone, Debug)]
pub struct CamionOutcome {
    /// Whether the input matrix was already Camion-signed.
    pub was_camion_signed: bool,
    /// If not signed: a square submatrix of the *input* with determinant
    /// of absolute value ≥ 2.
    pub violator: Option<Submatrix>,
}

/// Tests whether `matrix` is Camion-signed, without modifying it.
pub fn test_camion_signed(matrix: &Matrix) -> Result<CamionOutcome> {
    let mut copy = matrix.clone();
    sign(&mut copy, false)
}

/// Flips signs of `matrix` in place so that it becomes Camion-signed.
///
/// The reported violator refers to the matrix *before* modification.
pub fn compute_camion_signed(matrix: &mut Matrix) -> Result<CamionOutcome> {
    sign(matrix, true)
}

/// Which of the pair (matrix, transpose) was modified.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Modified {
    Nothing,
    Matrix,
    Transpose,
}

#[derive(Copy, Clone)]
struct BfsNode {
    /// 0: not visited, 1: in queue, 2: processed.
    status: u8,
    predecessor: usize,
    predecessor_value: i8,
    /// Entry in the current row if this is a target column node.
    target_value: i8,
}

const NONE: usize = usize::MAX;

/// Signs a sequentially connected matrix.
///
/// Works on the transpose when the matrix has more rows than columns; the
/// violator is transposed back accordingly.
fn sign_sequentially_connected(
    matrix: &mut Matrix,
    transpose: &mut Matrix,
    change: bool,
    violator: Option<&mut Option<Submatrix>>,
) -> Result<Modified> {
    if matrix.num_rows() > matrix.num_columns() {
        let mut sub = None;
        let inner = if violator.is_some() {
            Some(&mut sub)
        } else {
            None
        };
        let modified = sign_sequentially_connected(transpose, matrix, change, inner)?;
        if let Some(out) = violator {
            *out = sub.map(Submatrix::transposed);
        }
        return Ok(match modified {
            Modified::Nothing => Modified::Nothing,
            Modified::Matrix => Modified::Transpose,
            Modified::Transpose => unreachable!("recursion is one level deep"),
        });
    }

    let m = matrix.num_rows();
    let n = matrix.num_columns();
    let first_row_node = n;
    let mut nodes = vec![
        BfsNode {
            status: 0,
            predecessor: NONE,
            predecessor_value: 0,
            target_value: 0,
        };
        m + n
    ];
    let mut queue = vec![0usize; m + n];
    let mut modified = Modified::Nothing;
    let mut violator = violator;

    for row in 1..m {
        for node in nodes.iter_mut() {
            node.status = 0;
            node.predecessor = NONE;
            node.target_value = 0;
        }

        let (row_columns, row_values) = {
            let (c, v) = matrix.row(row);
            (c.to_vec(), v.to_vec())
        };
        if row_columns.is_empty() {
            continue;
        }

        // The first nonzero determines the start node; all columns of the
        // row are targets.
        let start = row_columns[0];
        for (&c, &x) in row_columns.iter().zip(&row_values) {
            nodes[c].target_value = x;
        }
        queue[0] = start;
        nodes[start].status = 1;
        let mut queue_begin = 0;
        let mut queue_end = 1;
        let mut row_changed = false;

        while queue_begin < queue_end {
            let current = queue[queue_begin];
            queue_begin += 1;
            debug_assert_eq!(nodes[current].status, 1);
            nodes[current].status = 2;

            if current >= first_row_node {
                let r = current - first_row_node;
                let (columns, values) = matrix.row(r);
                for (&c, &x) in columns.iter().zip(values) {
                    if nodes[c].status != 0 {
                        continue;
                    }
                    nodes[c].status = 1;
                    nodes[c].predecessor = current;
                    nodes[c].predecessor_value = x;
                    queue[queue_end] = c;
                    queue_end += 1;

                    if nodes[c].target_value == 0 {
                        continue;
                    }

                    // Reached a target column for the first time: trace the
                    // walk back to the previous target and sum the entries.
                    let mut sum = i32::from(nodes[c].target_value);
                    let mut path_node = c;
                    loop {
                        sum += i32::from(nodes[path_node].predecessor_value);
                        path_node = nodes[path_node].predecessor;
                        if path_node < first_row_node && nodes[path_node].target_value != 0 {
                            break;
                        }
                    }
                    sum += i32::from(nodes[path_node].target_value);

                    if sum.rem_euclid(4) != 0 {
                        debug_assert_eq!(sum.rem_euclid(4), 2);

                        if let Some(out) = violator.as_mut() {
                            if out.is_none() {
                                let mut sub = Submatrix::new(vec![row], vec![c]);
                                let mut path_node = c;
                                loop {
                                    path_node = nodes[path_node].predecessor;
                                    if path_node >= first_row_node {
                                        sub.rows.push(path_node - first_row_node);
                                    } else {
                                        sub.columns.push(path_node);
                                    }
                                    if path_node < first_row_node
                                        && nodes[path_node].target_value != 0
                                    {
                                        break;
                                    }
                                }
                                debug_assert_eq!(sub.rows.len(), sub.columns.len());
                                sub.sort();
                                **out = Some(sub);
                            }
                        }

                        nodes[c].target_value = -nodes[c].target_value;
                        modified = Modified::Matrix;
                        if change {
                            row_changed = true;
                        } else {
                            return Ok(modified);
                        }
                    }
                }
            } else {
                let c = current;
                let (rows, values) = transpose.row(c);
                for (&r, &x) in rows.iter().zip(values) {
                    // Only rows before the current iteration row participate.
                    if r >= row {
                        break;
                    }
                    let node = first_row_node + r;
                    if nodes[node].status == 0 {
                        nodes[node].status = 1;
                        nodes[node].predecessor = current;
                        nodes[node].predecessor_value = x;
                        queue[queue_end] = node;
                        queue_end += 1;
                    }
                }
            }
        }

        if row_changed {
            for (&c, &x) in row_columns.iter().zip(&row_values) {
                if x != nodes[c].target_value {
                    matrix.set_existing(row, c, nodes[c].target_value);
                    transpose.set_existing(c, row, nodes[c].target_value);
                }
            }
        }
    }

    Ok(modified)
}

fn sign(matrix: &mut Matrix, change: bool) -> Result<CamionOutcome> {
    debug_assert!(matrix.is_ternary().is_ok());

    let components = decompose_one_sum(matrix);
    let mut outcome = CamionOutcome {
        was_camion_signed: true,
        violator: None,
    };

    for component in components {
        let mut comp_matrix = component.matrix;
        let mut comp_transpose = component.transpose;
        let mut comp_violator = None;
        let want_violator = outcome.violator.is_none();
        let modified = sign_sequentially_connected(
            &mut comp_matrix,
            &mut comp_transpose,
            change,
            want_violator.then_some(&mut comp_violator),
        )?;

        if modified == Modified::Nothing {
            debug_assert!(comp_violator.is_none());
            continue;
        }
        outcome.was_camion_signed = false;

        if let Some(mut sub) = comp_violator {
            sub.translate(&component.rows_to_original, &component.columns_to_original);
            outcome.violator = Some(sub);
        }

        if !change {
            // Without modification there is nothing to stitch back.
            break;
        }

        // Copy the changed signs back into the original matrix.
        let source = match modified {
            Modified::Matrix => &comp_matrix,
            Modified::Transpose => &comp_transpose,
            Modified::Nothing => unreachable!(),
        };
        let transposed = modified == Modified::Transpose;
        for source_row in 0..source.num_rows() {
            let (columns, values) = source.row(source_row);
            for (&source_column, &x) in columns.iter().zip(values) {
                let (comp_row, comp_column) = if transposed {
                    (source_column, source_row)
                } else {
                    (source_row, source_column)
                };
                let row = component.rows_to_original[comp_row];
                let column = component.columns_to_original[comp_column];
                matrix.set_existing(row, column, x);
            }
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_signed_passes() {
        // Network matrix of a small digraph; Camion-signed by construction.
        let a = Matrix::from_dense(&[&[1, -1, 0], &[0, 1, -1], &[1, 0, -1]]);
        let outcome = test_camion_signed(&a).unwrap();
        assert!(outcome.was_camion_signed);
        assert!(outcome.violator.is_none());
    }

    #[test]
    fn bad_square_is_reported_and_fixed() {
        let mut a = Matrix::from_dense(&[&[1, 1], &[-1, 1]]);
        let outcome = test_camion_signed(&a).unwrap();
        assert!(!outcome.was_camion_signed);
        let violator = outcome.violator.unwrap();
        assert_eq!(violator.rows, vec![0, 1]);
        assert_eq!(violator.columns, vec![0, 1]);

        let outcome = compute_camion_signed(&mut a).unwrap();
        assert!(!outcome.was_camion_signed);
        assert!(test_camion_signed(&a).unwrap().was_camion_signed);
    }

    #[test]
    fn signing_is_idempotent() {
        let mut a = Matrix::from_dense(&[
            &[1, 1, 0, 0],
            &[1, -1, 1, 0],
            &[0, 1, 1, 1],
            &[1, 0, 0, -1],
        ]);
        compute_camion_signed(&mut a).unwrap();
        let once = a.clone();
        let outcome = compute_camion_signed(&mut a).unwrap();
        assert!(outcome.was_camion_signed);
        assert_eq!(a, once);
    }
}
