//! Regularity of binary matroids.
//!
//! A {0,1} matrix is *regular* if its binary matroid is representable over
//! every field, which by Seymour's theorem holds exactly when the matrix
//! decomposes into graphic, cographic and R10 pieces via 1-, 2- and
//! 3-sums. The test is the decomposition driver run on the support.

use std::time::Duration;

use crate::matrix::Matrix;
use crate::seymour::{self, Decomposition, SeymourParams, SeymourStats};
use crate::{Deadline, Decision, Error, Result};

/// Result of a regularity test.
#[derive(Debug)]
pub struct RegularOutcome {
    pub is_regular: bool,
    pub decomposition: Decomposition,
}

/// Tests whether the support of `matrix` is regular.
pub fn test_regular(
    matrix: &Matrix,
    params: &SeymourParams,
    stats: Option<&mut SeymourStats>,
    time_limit: Option<Duration>,
) -> Result<RegularOutcome> {
    if matrix.is_ternary().is_err() {
        return Err(Error::InvalidInput("matrix must be binary or ternary"));
    }
    let deadline = Deadline::new(time_limit);
    let decomposition = seymour::decompose(matrix.support(), false, *params, stats, deadline)?;
    Ok(RegularOutcome {
        is_regular: decomposition.regularity() == Decision::Yes,
        decomposition,
    })
}
