//! Minimal violators of hereditary matrix properties.
//!
//! Given a matrix known to violate a property that is closed under taking
//! submatrices, the search deletes one row or column at a time, keeping
//! the deletion whenever the remainder still violates the property. What
//! survives is a violator that is minimal with respect to deletion; for
//! total unimodularity this is a square submatrix with |det| ≥ 2.

use crate::matrix::{Matrix, Submatrix};
use crate::{Deadline, Result};

/// Shrinks the full matrix to a minimal violating submatrix.
///
/// `has_property` must return `false` for the full matrix.
pub(crate) fn minimal_violating_submatrix<F>(
    matrix: &Matrix,
    mut has_property: F,
    deadline: Deadline,
) -> Result<Submatrix>
where
    F: FnMut(&Matrix) -> Result<bool>,
{
    let mut remaining = Submatrix::full(matrix.num_rows(), matrix.num_columns());

    // Columns first, then rows, mirroring the original element order.
    for round in 0..2 {
        let candidates = if round == 0 {
            remaining.columns.clone()
        } else {
            remaining.rows.clone()
        };
        for candidate in candidates.into_iter().rev() {
            deadline.check()?;
            let mut trial = remaining.clone();
            if round == 0 {
                trial.columns.retain(|&c| c != candidate);
            } else {
                trial.rows.retain(|&r| r != candidate);
            }
            if trial.rows.is_empty() || trial.columns.is_empty() {
                continue;
            }
            if !has_property(&matrix.filter(&trial))? {
                remaining = trial;
            }
        }
    }
    Ok(remaining)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shrinks_to_violating_core() {
        // Property: no entry equals -1. The violator is the single -1.
        let matrix = Matrix::from_dense(&[&[1, 0, 1], &[0, -1, 1], &[1, 1, 0]]);
        let violator = minimal_violating_submatrix(
            &matrix,
            |m| {
                Ok((0..m.num_rows()).all(|r| {
                    let (_, values) = m.row(r);
                    values.iter().all(|&x| x != -1)
                }))
            },
            Deadline::new(None),
        )
        .unwrap();
        assert_eq!(violator.rows, vec![1]);
        assert_eq!(violator.columns, vec![1]);
    }
}
