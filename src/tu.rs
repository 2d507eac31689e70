//! Total unimodularity.
//!
//! A ternary matrix is totally unimodular if and only if it is
//! Camion-signed and its support is regular. The test runs the Camion
//! check first and then the Seymour decomposition of the support; on a
//! negative answer a minimal violating square submatrix is extracted by
//! the hereditary-property search.
//!
//! [`partition_test`] implements the exponential Ghouila-Houri criterion
//! directly; it exists for cross-checking the decomposition on small
//! matrices.

use std::time::Duration;

use crate::camion::test_camion_signed;
use crate::hereditary::minimal_violating_submatrix;
use crate::matrix::{Matrix, Submatrix};
use crate::seymour::{self, Decomposition, SeymourParams, SeymourStats};
use crate::{Deadline, Decision, Result};

/// Result of a total unimodularity test.
#[derive(Debug)]
pub struct TuOutcome {
    pub is_totally_unimodular: bool,
    /// The Seymour decomposition of the support, when the test got past
    /// the signing check.
    pub decomposition: Option<Decomposition>,
    /// A square submatrix with |det| ≥ 2 when the answer is negative.
    pub violator: Option<Submatrix>,
}

/// Tests whether `matrix` is totally unimodular.
pub fn test_totally_unimodular(
    matrix: &Matrix,
    params: &SeymourParams,
    mut stats: Option<&mut SeymourStats>,
    time_limit: Option<Duration>,
) -> Result<TuOutcome> {
    let deadline = Deadline::new(time_limit);

    if let Err(entry) = matrix.is_ternary() {
        // A single entry of absolute value ≥ 2 is already a 1×1 violator.
        return Ok(TuOutcome {
            is_totally_unimodular: false,
            decomposition: None,
            violator: Some(entry),
        });
    }

    let camion = test_camion_signed(matrix)?;
    if !camion.was_camion_signed {
        return Ok(TuOutcome {
            is_totally_unimodular: false,
            decomposition: None,
            violator: camion.violator,
        });
    }

    let decomposition = seymour::decompose(
        matrix.support(),
        false,
        *params,
        stats.as_deref_mut(),
        deadline,
    )?;
    let regularity = decomposition.regularity();
    if regularity == Decision::Yes {
        return Ok(TuOutcome {
            is_totally_unimodular: true,
            decomposition: Some(decomposition),
            violator: None,
        });
    }

    // Search a minimal violator of the signed matrix.
    let violator = if regularity == Decision::No {
        Some(minimal_violating_submatrix(
            matrix,
            |sub| is_totally_unimodular_quick(sub, deadline),
            deadline,
        )?)
    } else {
        None
    };
    Ok(TuOutcome {
        is_totally_unimodular: false,
        decomposition: Some(decomposition),
        violator,
    })
}

/// Plain yes/no TU test used as the oracle of the violator search.
fn is_totally_unimodular_quick(matrix: &Matrix, deadline: Deadline) -> Result<bool> {
    deadline.check()?;
    if matrix.is_ternary().is_err() {
        return Ok(false);
    }
    if !test_camion_signed(matrix)?.was_camion_signed {
        return Ok(false);
    }
    let decomposition = seymour::decompose(
        matrix.support(),
        false,
        SeymourParams::default(),
        None,
        deadline,
    )?;
    Ok(decomposition.regularity() == Decision::Yes)
}

/// Decides total unimodularity by the Ghouila-Houri criterion: every
/// subset of rows admits a {-1,+1} weighting with all weighted column
/// sums in {-1,0,+1}.
///
/// Exponential; meant for cross-checking on small matrices.
pub fn partition_test(matrix: &Matrix, time_limit: Option<Duration>) -> Result<bool> {
    let deadline = Deadline::new(time_limit);
    if matrix.is_ternary().is_err() {
        return Ok(false);
    }
    // Work on the side with fewer rows.
    if matrix.num_rows() > matrix.num_columns() {
        return partition_test_rows(&matrix.transpose(), deadline);
    }
    partition_test_rows(matrix, deadline)
}

fn partition_test_rows(matrix: &Matrix, deadline: Deadline) -> Result<bool> {
    let mut selection = vec![0i8; matrix.num_rows()];
    let mut column_sum = vec![0i32; matrix.num_columns()];
    partition_subset(matrix, &mut selection, 0, &mut column_sum, deadline)
}

/// Recursively selects a subset of rows and checks each selection.
fn partition_subset(
    matrix: &Matrix,
    selection: &mut [i8],
    current: usize,
    column_sum: &mut [i32],
    deadline: Deadline,
) -> Result<bool> {
    if current < matrix.num_rows() {
        selection[current] = 0;
        if !partition_subset(matrix, selection, current + 1, column_sum, deadline)? {
            return Ok(false);
        }

        selection[current] = 1;
        let (columns, values) = matrix.row(current);
        for (&c, &x) in columns.iter().zip(values) {
            column_sum[c] += i32::from(x);
        }
        let result = partition_subset(matrix, selection, current + 1, column_sum, deadline)?;
        let (columns, values) = matrix.row(current);
        for (&c, &x) in columns.iter().zip(values) {
            column_sum[c] -= i32::from(x);
        }
        return Ok(result);
    }

    deadline.check()?;
    partition_search(matrix, selection, 0, column_sum)
}

/// Recursively flips selected rows to -1 searching a feasible signing.
fn partition_search(
    matrix: &Matrix,
    selection: &mut [i8],
    mut current: usize,
    column_sum: &mut [i32],
) -> Result<bool> {
    while current < matrix.num_rows() && selection[current] == 0 {
        current += 1;
    }
    if current >= matrix.num_rows() {
        return Ok(column_sum.iter().all(|&sum| (-1..=1).contains(&sum)));
    }

    if partition_search(matrix, selection, current + 1, column_sum)? {
        return Ok(true);
    }

    selection[current] = -1;
    let (columns, values) = matrix.row(current);
    for (&c, &x) in columns.iter().zip(values) {
        column_sum[c] -= 2 * i32::from(x);
    }
    let found = partition_search(matrix, selection, current + 1, column_sum)?;
    let (columns, values) = matrix.row(current);
    for (&c, &x) in columns.iter().zip(values) {
        column_sum[c] += 2 * i32::from(x);
    }
    selection[current] = 1;
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_test_accepts_network_matrix() {
        let a = Matrix::from_dense(&[&[1, -1, 0], &[0, 1, -1], &[1, 0, -1]]);
        assert!(partition_test(&a, None).unwrap());
    }

    #[test]
    fn partition_test_rejects_bad_square() {
        let a = Matrix::from_dense(&[&[1, 1], &[-1, 1]]);
        assert!(!partition_test(&a, None).unwrap());
    }
}
