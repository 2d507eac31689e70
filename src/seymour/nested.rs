//! Nested minor sequences and 3-separation searches.
//!
//! Starting from a wheel minor of an SP-reduced matrix, the sequence grows
//! by one row, one column, or a row/column pair per step until it covers
//! the whole matrix; the per-step extents are recorded on the
//! decomposition node. Separations are found by two searches: the *simple*
//! search recognises two cheap local patterns (an entry whose row and
//! column both have two nonzeros; a 2-nonzero row whose entry removal
//! creates a duplicate column), and the full search runs the bounded
//! exhaustive bipartition enumeration.

use hashbrown::HashMap;

use crate::matrix::{Matrix, Submatrix};
use crate::separation::{self, Separation, SeparationKind, Side};
use crate::{Error, Result};

/// Searches the two cheap 3-separation patterns.
///
/// Pattern A: an entry at (r, c) where row r and column c both carry
/// exactly two nonzeros gives a distributed-rank 3-separation with first
/// part {r, r', c, c'}.
///
/// Pattern B: a row r with exactly two nonzeros such that zeroing one of
/// them makes its column a duplicate of another column gives a
/// concentrated-rank 3-separation with first part {r} and the three
/// columns involved.
pub(crate) fn simple_three_separation(matrix: &Matrix, transpose: &Matrix) -> Option<Separation> {
    let m = matrix.num_rows();
    let n = matrix.num_columns();

    // Pattern A.
    for row1 in 0..m {
        let (row_columns, _) = matrix.row(row1);
        if row_columns.len() != 2 {
            continue;
        }
        for &column1 in row_columns {
            let (col_rows, _) = transpose.row(column1);
            if col_rows.len() != 2 {
                continue;
            }
            let column2 = row_columns[usize::from(row_columns[0] == column1)];
            let row2 = col_rows[usize::from(col_rows[0] == row1)];

            let rows = (0..m)
                .map(|r| {
                    if r == row1 || r == row2 {
                        Side::First
                    } else {
                        Side::Second
                    }
                })
                .collect();
            let columns = (0..n)
                .map(|c| {
                    if c == column1 || c == column2 {
                        Side::First
                    } else {
                        Side::Second
                    }
                })
                .collect();
            return Some(Separation::new(
                SeparationKind::ThreeDistributed,
                rows,
                columns,
            ));
        }
    }

    // Pattern B, via column hashes over the rows they hit.
    let mut hash_vector = vec![0i64; m];
    let mut h = 1i64;
    for slot in hash_vector.iter_mut() {
        *slot = h;
        h = ((3 * h as i128) % ((1i128 << 61) - 1)) as i64;
    }
    let mut column_hash = vec![0i64; n];
    let mut buckets: HashMap<i64, Vec<usize>> = HashMap::new();
    for c in 0..n {
        let (rows, values) = transpose.row(c);
        for (&r, &x) in rows.iter().zip(values) {
            column_hash[c] = column_hash[c].wrapping_add((x as i64).wrapping_mul(hash_vector[r]));
        }
        buckets.entry(column_hash[c]).or_default().push(c);
    }

    for row in 0..m {
        let (row_columns, row_values) = matrix.row(row);
        if row_columns.len() != 2 {
            continue;
        }
        for (&column, &value) in row_columns.iter().zip(row_values) {
            let target = column_hash[column].wrapping_sub((value as i64).wrapping_mul(hash_vector[row]));
            let Some(bucket) = buckets.get(&target) else {
                continue;
            };
            for &dup_column in bucket {
                if dup_column == column {
                    continue;
                }
                // Verify: column minus the (row, column) entry equals the
                // duplicate column.
                let (rows_a, values_a) = transpose.row(column);
                let without: Vec<(usize, i8)> = rows_a
                    .iter()
                    .zip(values_a)
                    .filter(|(&r, _)| r != row)
                    .map(|(&r, &x)| (r, x))
                    .collect();
                let (rows_b, values_b) = transpose.row(dup_column);
                let other: Vec<(usize, i8)> = rows_b
                    .iter()
                    .zip(values_b)
                    .map(|(&r, &x)| (r, x))
                    .collect();
                if without != other {
                    continue;
                }
                let other_column = row_columns[usize::from(row_columns[0] == column)];
                let rows = (0..m)
                    .map(|r| if r == row { Side::First } else { Side::Second })
                    .collect();
                let columns = (0..n)
                    .map(|c| {
                        if c == column || c == other_column || c == dup_column {
                            Side::First
                        } else {
                            Side::Second
                        }
                    })
                    .collect();
                return Some(Separation::new(
                    SeparationKind::ThreeConcentrated,
                    rows,
                    columns,
                ));
            }
        }
    }

    None
}

/// Runs the full bounded 3-separation search; also reports rank-1
/// separations, which the driver turns into 2-sums.
pub(crate) fn search_separation(matrix: &Matrix) -> Result<Option<Separation>> {
    if matrix.num_rows().min(matrix.num_columns()) > separation::ENUMERATION_BOUND {
        return Err(Error::NotImplemented(
            "separation search beyond the enumeration bound",
        ));
    }
    Ok(separation::enumerate(matrix, 2))
}

/// A sequence of nested minors of one matrix, grown from a wheel seed.
#[derive(Clone, Debug, Default)]
pub struct NestedMinorSequence {
    /// Minor rows in addition order.
    pub rows: Vec<usize>,
    /// Minor columns in addition order.
    pub columns: Vec<usize>,
    /// (rows, columns) extent after each step.
    pub extents: Vec<(usize, usize)>,
}

/// Result of one extension step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ExtendOutcome {
    Extended,
    /// The sequence covers the whole matrix.
    Covered,
}

impl NestedMinorSequence {
    /// Seeds the sequence with a wheel submatrix.
    pub(crate) fn from_wheel(wheel: &Submatrix) -> NestedMinorSequence {
        NestedMinorSequence {
            rows: wheel.rows.clone(),
            columns: wheel.columns.clone(),
            extents: vec![(wheel.rows.len(), wheel.columns.len())],
        }
    }

    pub(crate) fn covers(&self, matrix: &Matrix) -> bool {
        self.rows.len() == matrix.num_rows() && self.columns.len() == matrix.num_columns()
    }

    /// Extends the minor by one row, one column, or a row/column pair,
    /// preferring extensions that connect to the minor in at least two
    /// positions (which keep it 3-connected).
    pub(crate) fn extend(&mut self, matrix: &Matrix, transpose: &Matrix) -> ExtendOutcome {
        if self.covers(matrix) {
            return ExtendOutcome::Covered;
        }
        let m = matrix.num_rows();
        let n = matrix.num_columns();
        let mut in_rows = vec![false; m];
        let mut in_columns = vec![false; n];
        for &r in &self.rows {
            in_rows[r] = true;
        }
        for &c in &self.columns {
            in_columns[c] = true;
        }

        let restricted_row = |r: usize| -> Vec<(usize, i8)> {
            let (columns, values) = matrix.row(r);
            columns
                .iter()
                .zip(values)
                .filter(|(&c, _)| in_columns[c])
                .map(|(&c, &x)| (c, x))
                .collect()
        };
        let restricted_column = |c: usize| -> Vec<(usize, i8)> {
            let (rows, values) = transpose.row(c);
            rows.iter()
                .zip(values)
                .filter(|(&r, _)| in_rows[r])
                .map(|(&r, &x)| (r, x))
                .collect()
        };

        // A row whose restriction has two or more nonzeros and duplicates
        // no minor row.
        let minor_rows: Vec<Vec<(usize, i8)>> =
            self.rows.iter().map(|&r| restricted_row(r)).collect();
        for r in 0..m {
            if in_rows[r] {
                continue;
            }
            let restriction = restricted_row(r);
            if restriction.len() >= 2
                && !minor_rows
                    .iter()
                    .any(|mr| supports_match(mr, &restriction))
            {
                self.push_row(r);
                return ExtendOutcome::Extended;
            }
        }
        let minor_columns: Vec<Vec<(usize, i8)>> =
            self.columns.iter().map(|&c| restricted_column(c)).collect();
        for c in 0..n {
            if in_columns[c] {
                continue;
            }
            let restriction = restricted_column(c);
            if restriction.len() >= 2
                && !minor_columns
                    .iter()
                    .any(|mc| supports_match(mc, &restriction))
            {
                self.push_column(c);
                return ExtendOutcome::Extended;
            }
        }

        // A connected row/column pair: the row meets the minor columns,
        // the column meets the minor rows, and their own entry links them.
        for r in 0..m {
            if in_rows[r] || restricted_row(r).is_empty() {
                continue;
            }
            let (columns, _) = matrix.row(r);
            for &c in columns {
                if !in_columns[c] && !restricted_column(c).is_empty() {
                    // One step adding the pair together.
                    self.rows.push(r);
                    self.columns.push(c);
                    self.extents.push((self.rows.len(), self.columns.len()));
                    return ExtendOutcome::Extended;
                }
            }
        }

        // Fall back to any element touching the minor.
        for r in 0..m {
            if !in_rows[r] && !restricted_row(r).is_empty() {
                self.push_row(r);
                return ExtendOutcome::Extended;
            }
        }
        for c in 0..n {
            if !in_columns[c] && !restricted_column(c).is_empty() {
                self.push_column(c);
                return ExtendOutcome::Extended;
            }
        }

        // Disconnected leftovers cannot occur for a connected matrix.
        debug_assert!(self.covers(matrix));
        ExtendOutcome::Covered
    }

    fn push_row(&mut self, r: usize) {
        self.rows.push(r);
        self.extents.push((self.rows.len(), self.columns.len()));
    }

    fn push_column(&mut self, c: usize) {
        self.columns.push(c);
        self.extents.push((self.rows.len(), self.columns.len()));
    }
}

fn supports_match(a: &[(usize, i8)], b: &[(usize, i8)]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.0 == y.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_a_fires_on_corner_entry() {
        let a = Matrix::from_dense(&[
            &[1, 1, 0, 0, 0],
            &[1, 0, 1, 1, 0],
            &[0, 1, 1, 1, 1],
            &[0, 0, 1, 0, 1],
            &[0, 0, 0, 1, 1],
        ]);
        let t = a.transpose();
        let separation = simple_three_separation(&a, &t).expect("pattern A");
        assert_eq!(separation.kind, SeparationKind::ThreeDistributed);
        assert_eq!(separation.first_rows().len(), 2);
        assert_eq!(separation.first_columns().len(), 2);
    }

    #[test]
    fn sequence_covers_matrix() {
        let a = Matrix::from_dense(&[
            &[1, 1, 0, 1],
            &[0, 1, 1, 0],
            &[1, 1, 1, 0],
            &[1, 0, 0, 1],
        ]);
        let t = a.transpose();
        let wheel = Submatrix::new(vec![0, 1, 2], vec![0, 1, 2]);
        let mut sequence = NestedMinorSequence::from_wheel(&wheel);
        let mut guard = 16;
        while sequence.extend(&a, &t) == ExtendOutcome::Extended {
            guard -= 1;
            assert!(guard > 0);
        }
        assert!(sequence.covers(&a));
        let last = *sequence.extents.last().unwrap();
        assert_eq!(last, (4, 4));
    }
}
