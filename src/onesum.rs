//! One-sum block decomposition: connected components of the bipartite
//! support graph of a matrix.
//!
//! Rows and columns are the two node classes; every nonzero is an edge.
//! Components are discovered by a graph search seeded in row-major order, so the output order
//! is deterministic. An isolated (zero) row or column forms a component of
//! its own with an empty matrix.

use crate::matrix::Matrix;

/// One connected block of a matrix.
#[derive(Clone, Debug)]
pub(crate) struct OneSumComponent {
    pub matrix: Matrix,
    pub transpose: Matrix,
    /// Component row index → row of the original matrix.
    pub rows_to_original: Vec<usize>,
    /// Component column index → column of the original matrix.
    pub columns_to_original: Vec<usize>,
}

/// Decomposes `matrix` into its 1-connected components.
///
/// Component order follows the smallest row/column index they contain.
pub(crate) fn decompose_one_sum(matrix: &Matrix) -> Vec<OneSumComponent> {
    let m = matrix.num_rows();
    let n = matrix.num_columns();
    let transpose = matrix.transpose();

    // Node space: rows are 0..m, columns are m..m+n.
    let mut component = vec![usize::MAX; m + n];
    let mut queue = Vec::with_capacity(m + n);
    let mut components: Vec<(Vec<usize>, Vec<usize>)> = Vec::new();

    for start in 0..m + n {
        if component[start] != usize::MAX {
            continue;
        }
        let id = components.len();
        components.push((Vec::new(), Vec::new()));
        component[start] = id;
        queue.clear();
        queue.push(start);
        while let Some(node) = queue.pop() {
            if node < m {
                components[id].0.push(node);
                let (columns, _) = matrix.row(node);
                for &c in columns {
                    if component[m + c] == usize::MAX {
                        component[m + c] = id;
                        queue.push(m + c);
                    }
                }
            } else {
                components[id].1.push(node - m);
                let (rows, _) = transpose.row(node - m);
                for &r in rows {
                    if component[r] == usize::MAX {
                        component[r] = id;
                        queue.push(r);
                    }
                }
            }
        }
    }

    components
        .into_iter()
        .map(|(mut rows, mut columns)| {
            rows.sort_unstable();
            columns.sort_unstable();
            let sub = crate::matrix::Submatrix::new(rows, columns);
            let block = matrix.filter(&sub);
            OneSumComponent {
                transpose: block.transpose(),
                matrix: block,
                rows_to_original: sub.rows,
                columns_to_original: sub.columns,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_blocks() {
        let a = Matrix::from_dense(&[&[1, 1, 0, 0], &[0, 0, 1, 1], &[0, 0, 1, 0]]);
        let components = decompose_one_sum(&a);
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].rows_to_original, vec![0]);
        assert_eq!(components[0].columns_to_original, vec![0, 1]);
        assert_eq!(components[1].matrix.num_rows(), 2);
    }

    #[test]
    fn zero_row_is_own_component() {
        let a = Matrix::from_dense(&[&[1], &[0]]);
        let components = decompose_one_sum(&a);
        assert_eq!(components.len(), 2);
        assert_eq!(components[1].matrix.num_columns(), 0);
    }
}
