//! Sparse ternary matrices in compressed row storage.
//!
//! [`Matrix`] stores entries in {-1, 0, +1} row-major: `row_slice[r]..
//! row_slice[r + 1]` indexes the nonzeros of row `r` in the parallel arrays
//! `entry_columns` / `entry_values`. Within a row, entries are sorted by
//! column and zeros are never stored.

use core::fmt;

use crate::{Error, Result};

/// A sparse matrix with entries in {-1, 0, +1}, stored row-major.
#[derive(Clone, PartialEq, Eq)]
pub struct Matrix {
    num_columns: usize,
    row_slice: Vec<usize>,
    entry_columns: Vec<usize>,
    entry_values: Vec<i8>,
}

impl Matrix {
    /// Creates a matrix from explicit CSR arrays.
    ///
    /// `row_slice` must have length `num_rows + 1`, be non-decreasing and
    /// end at the common length of `entry_columns` and `entry_values`;
    /// within each row, columns must be strictly increasing and values
    /// nonzero.
    pub fn from_csr(
        num_columns: usize,
        row_slice: Vec<usize>,
        entry_columns: Vec<usize>,
        entry_values: Vec<i8>,
    ) -> Result<Matrix> {
        if row_slice.is_empty()
            || *row_slice.last().unwrap() != entry_columns.len()
            || entry_columns.len() != entry_values.len()
        {
            return Err(Error::InvalidInput("inconsistent CSR arrays"));
        }
        for r in 0..row_slice.len() - 1 {
            if row_slice[r] > row_slice[r + 1] {
                return Err(Error::InvalidInput("row slice not monotone"));
            }
            for e in row_slice[r]..row_slice[r + 1] {
                if entry_columns[e] >= num_columns {
                    return Err(Error::InvalidInput("column index out of range"));
                }
                if e > row_slice[r] && entry_columns[e - 1] >= entry_columns[e] {
                    return Err(Error::InvalidInput("row entries not sorted"));
                }
                if entry_values[e] == 0 {
                    return Err(Error::InvalidInput("explicit zero entry"));
                }
            }
        }
        Ok(Matrix {
            num_columns,
            row_slice,
            entry_columns,
            entry_values,
        })
    }

    /// Creates a matrix from a dense row-major array of rows.
    ///
    /// Mostly useful in tests; entries outside {-1, 0, +1} are kept verbatim
    /// so that `is_ternary` can report them.
    pub fn from_dense(rows: &[&[i8]]) -> Matrix {
        let num_columns = rows.first().map_or(0, |r| r.len());
        let mut row_slice = Vec::with_capacity(rows.len() + 1);
        let mut entry_columns = Vec::new();
        let mut entry_values = Vec::new();
        row_slice.push(0);
        for row in rows {
            debug_assert_eq!(row.len(), num_columns);
            for (c, &x) in row.iter().enumerate() {
                if x != 0 {
                    entry_columns.push(c);
                    entry_values.push(x);
                }
            }
            row_slice.push(entry_columns.len());
        }
        Matrix {
            num_columns,
            row_slice,
            entry_columns,
            entry_values,
        }
    }

    /// An all-zero matrix of the given shape.
    pub fn zero(num_rows: usize, num_columns: usize) -> Matrix {
        Matrix {
            num_columns,
            row_slice: vec![0; num_rows + 1],
            entry_columns: Vec::new(),
            entry_values: Vec::new(),
        }
    }

    #[inline]
    pub fn num_rows(&self) -> usize {
        self.row_slice.len() - 1
    }

    #[inline]
    pub fn num_columns(&self) -> usize {
        self.num_columns
    }

    #[inline]
    pub fn num_nonzeros(&self) -> usize {
        self.entry_values.len()
    }

    /// The nonzeros of row `r` as parallel `(columns, values)` slices.
    #[inline]
    pub fn row(&self, r: usize) -> (&[usize], &[i8]) {
        let range = self.row_slice[r]..self.row_slice[r + 1];
        (&self.entry_columns[range.clone()], &self.entry_values[range])
    }

    /// Number of nonzeros in row `r`.
    #[inline]
    pub fn row_len(&self, r: usize) -> usize {
        self.row_slice[r + 1] - self.row_slice[r]
    }

    /// Looks up entry `(r, c)` by binary search within row `r`.
    pub fn get(&self, r: usize, c: usize) -> i8 {
        let (columns, values) = self.row(r);
        match columns.binary_search(&c) {
            Ok(i) => values[i],
            Err(_) => 0,
        }
    }

    /// Replaces the value of an existing nonzero entry. The new value must
    /// be nonzero; the support is immutable.
    pub(crate) fn set_existing(&mut self, r: usize, c: usize, value: i8) {
        debug_assert!(value != 0);
        let first = self.row_slice[r];
        let i = self.entry_columns[first..self.row_slice[r + 1]]
            .binary_search(&c)
            .expect("entry must exist");
        self.entry_values[first + i] = value;
    }

    /// Checks that all entries lie in {-1, 0, +1}; otherwise returns the
    /// position of some violating entry as a 1×1 [`Submatrix`].
    pub fn is_ternary(&self) -> core::result::Result<(), Submatrix> {
        for r in 0..self.num_rows() {
            let (columns, values) = self.row(r);
            for (&c, &x) in columns.iter().zip(values) {
                if !(-1..=1).contains(&x) {
                    return Err(Submatrix {
                        rows: vec![r],
                        columns: vec![c],
                    });
                }
            }
        }
        Ok(())
    }

    /// Checks that all entries lie in {0, 1}.
    pub fn is_binary(&self) -> core::result::Result<(), Submatrix> {
        for r in 0..self.num_rows() {
            let (columns, values) = self.row(r);
            for (&c, &x) in columns.iter().zip(values) {
                if x != 1 {
                    return Err(Submatrix {
                        rows: vec![r],
                        columns: vec![c],
                    });
                }
            }
        }
        Ok(())
    }

    /// The binary support matrix: every nonzero becomes +1.
    pub fn support(&self) -> Matrix {
        Matrix {
            num_columns: self.num_columns,
            row_slice: self.row_slice.clone(),
            entry_columns: self.entry_columns.clone(),
            entry_values: vec![1; self.entry_values.len()],
        }
    }

    /// Computes the transpose in O(nnz + n).
    pub fn transpose(&self) -> Matrix {
        let m = self.num_rows();
        let n = self.num_columns;
        let mut row_slice = vec![0usize; n + 1];
        for &c in &self.entry_columns {
            row_slice[c + 1] += 1;
        }
        for c in 0..n {
            row_slice[c + 1] += row_slice[c];
        }
        let mut next = row_slice.clone();
        let mut entry_columns = vec![0usize; self.entry_values.len()];
        let mut entry_values = vec![0i8; self.entry_values.len()];
        for r in 0..m {
            let (columns, values) = self.row(r);
            for (&c, &x) in columns.iter().zip(values) {
                let e = next[c];
                next[c] += 1;
                entry_columns[e] = r;
                entry_values[e] = x;
            }
        }
        Matrix {
            num_columns: m,
            row_slice,
            entry_columns,
            entry_values,
        }
    }

    /// Applies row and column bijections: entry `(r, c)` of the result is
    /// entry `(row_perm[r], col_perm[c])` of `self`.
    pub fn permute(&self, row_perm: &[usize], col_perm: &[usize]) -> Matrix {
        debug_assert_eq!(row_perm.len(), self.num_rows());
        debug_assert_eq!(col_perm.len(), self.num_columns);
        let mut col_inverse = vec![0usize; self.num_columns];
        for (c, &orig) in col_perm.iter().enumerate() {
            col_inverse[orig] = c;
        }
        let mut row_slice = Vec::with_capacity(row_perm.len() + 1);
        let mut entry_columns = Vec::with_capacity(self.entry_values.len());
        let mut entry_values = Vec::with_capacity(self.entry_values.len());
        row_slice.push(0);
        let mut entries: Vec<(usize, i8)> = Vec::new();
        for &orig_row in row_perm {
            entries.clear();
            let (columns, values) = self.row(orig_row);
            for (&c, &x) in columns.iter().zip(values) {
                entries.push((col_inverse[c], x));
            }
            entries.sort_unstable_by_key(|&(c, _)| c);
            for &(c, x) in &entries {
                entry_columns.push(c);
                entry_values.push(x);
            }
            row_slice.push(entry_columns.len());
        }
        Matrix {
            num_columns: col_perm.len(),
            row_slice,
            entry_columns,
            entry_values,
        }
    }

    /// Materialises the explicit submatrix selected by `submatrix`.
    pub fn filter(&self, submatrix: &Submatrix) -> Matrix {
        let mut col_map = vec![usize::MAX; self.num_columns];
        for (i, &c) in submatrix.columns.iter().enumerate() {
            col_map[c] = i;
        }
        let mut row_slice = Vec::with_capacity(submatrix.rows.len() + 1);
        let mut entry_columns = Vec::new();
        let mut entry_values = Vec::new();
        row_slice.push(0);
        let mut entries: Vec<(usize, i8)> = Vec::new();
        for &r in &submatrix.rows {
            entries.clear();
            let (columns, values) = self.row(r);
            for (&c, &x) in columns.iter().zip(values) {
                if col_map[c] != usize::MAX {
                    entries.push((col_map[c], x));
                }
            }
            entries.sort_unstable_by_key(|&(c, _)| c);
            for &(c, x) in &entries {
                entry_columns.push(c);
                entry_values.push(x);
            }
            row_slice.push(entry_columns.len());
        }
        Matrix {
            num_columns: submatrix.columns.len(),
            row_slice,
            entry_columns,
            entry_values,
        }
    }

    /// Performs a binary pivot at `(pivot_row, pivot_col)` over GF(2).
    ///
    /// Requires the pivot entry to be nonzero. For every other row `i` with
    /// a nonzero in the pivot column and every other column `j` with a
    /// nonzero in the pivot row, entry `(i, j)` is toggled.
    pub fn binary_pivot(&self, pivot_row: usize, pivot_col: usize) -> Result<Matrix> {
        if self.get(pivot_row, pivot_col) == 0 {
            return Err(Error::InvalidInput("pivot entry is zero"));
        }
        self.pivot_with(pivot_row, pivot_col, |base, delta| {
            Ok(if (base != 0) != (delta != 0) { 1 } else { 0 })
        })
        .map(|r| r.expect("binary pivot cannot fail").support())
    }

    /// Performs a ternary pivot at `(pivot_row, pivot_col)`.
    ///
    /// Entry `(i, j)` becomes `M[i,j] - M[i,c]·M[r,j]/M[r,c]`. If some
    /// resulting entry leaves {-1, 0, +1}, the pivot fails and the 2×2
    /// submatrix `{r, i} × {c, j}` witnessing the bad determinant is
    /// returned as `Err` inside the `Ok` payload.
    pub fn ternary_pivot(
        &self,
        pivot_row: usize,
        pivot_col: usize,
    ) -> Result<core::result::Result<Matrix, Submatrix>> {
        let pivot_value = self.get(pivot_row, pivot_col);
        if pivot_value == 0 {
            return Err(Error::InvalidInput("pivot entry is zero"));
        }
        self.pivot_with(pivot_row, pivot_col, move |base, delta| {
            let result = base - delta / pivot_value;
            if !(-1..=1).contains(&result) {
                return Err(());
            }
            Ok(result)
        })
        .map(|inner| {
            inner.map_err(|(i, j)| Submatrix {
                rows: sorted_pair(pivot_row, i),
                columns: sorted_pair(pivot_col, j),
            })
        })
    }

    /// Applies a sequence of ternary pivots in order.
    ///
    /// An intermediate non-ternary entry aborts with the violating 2×2
    /// submatrix (whose indices refer to the intermediate matrix).
    pub fn multi_pivot(
        &self,
        rows: &[usize],
        columns: &[usize],
    ) -> Result<core::result::Result<Matrix, Submatrix>> {
        debug_assert_eq!(rows.len(), columns.len());
        let mut current = self.clone();
        for (&r, &c) in rows.iter().zip(columns) {
            match current.ternary_pivot(r, c)? {
                Ok(next) => current = next,
                Err(violator) => return Ok(Err(violator)),
            }
        }
        Ok(Ok(current))
    }

    /// Shared pivot kernel. `combine(base, M[i,c]·M[r,j])` produces the new
    /// entry for `(i, j)`; an `Err` from it aborts reporting `(i, j)`.
    fn pivot_with<F>(
        &self,
        pivot_row: usize,
        pivot_col: usize,
        mut combine: F,
    ) -> Result<core::result::Result<Matrix, (usize, usize)>>
    where
        F: FnMut(i8, i8) -> core::result::Result<i8, ()>,
    {
        let m = self.num_rows();
        let n = self.num_columns;
        let epsilon = self.get(pivot_row, pivot_col);
        let (pivot_columns, pivot_values) = self.row(pivot_row);
        let mut pivot_row_dense = vec![0i8; n];
        for (&c, &x) in pivot_columns.iter().zip(pivot_values) {
            pivot_row_dense[c] = x;
        }

        let mut row_slice = Vec::with_capacity(m + 1);
        let mut entry_columns = Vec::with_capacity(self.num_nonzeros());
        let mut entry_values = Vec::with_capacity(self.num_nonzeros());
        row_slice.push(0);
        let mut dense = vec![0i8; n];
        for i in 0..m {
            let (columns, values) = self.row(i);
            if i == pivot_row {
                // Exchange scales the pivot row by the pivot sign and
                // negates the pivot entry itself.
                for (&c, &x) in columns.iter().zip(values) {
                    entry_columns.push(c);
                    entry_values.push(if c == pivot_col { -epsilon } else { epsilon * x });
                }
                row_slice.push(entry_columns.len());
                continue;
            }
            let factor = self.get(i, pivot_col);
            if factor == 0 {
                for (&c, &x) in columns.iter().zip(values) {
                    entry_columns.push(c);
                    entry_values.push(x);
                }
                row_slice.push(entry_columns.len());
                continue;
            }
            for (&c, &x) in columns.iter().zip(values) {
                dense[c] = x;
            }
            for j in 0..n {
                let new_value = if j == pivot_col {
                    epsilon * dense[j]
                } else {
                    match combine(dense[j], factor * pivot_row_dense[j]) {
                        Ok(v) => v,
                        Err(()) => return Ok(Err((i, j))),
                    }
                };
                if new_value != 0 {
                    entry_columns.push(j);
                    entry_values.push(new_value);
                }
            }
            row_slice.push(entry_columns.len());
            for &c in columns {
                dense[c] = 0;
            }
        }
        Ok(Ok(Matrix {
            num_columns: n,
            row_slice,
            entry_columns,
            entry_values,
        }))
    }

    /// Exact determinant of a square ternary matrix, with overflow
    /// detection. Intended for certificate checking of small submatrices.
    pub fn determinant(&self) -> Result<i64> {
        let n = self.num_rows();
        if n != self.num_columns {
            return Err(Error::InvalidInput("determinant of non-square matrix"));
        }
        // Fraction-free Gaussian elimination (Bareiss) over i64.
        let mut a = vec![vec![0i64; n]; n];
        for r in 0..n {
            let (columns, values) = self.row(r);
            for (&c, &x) in columns.iter().zip(values) {
                a[r][c] = i64::from(x);
            }
        }
        let mut sign = 1i64;
        let mut prev = 1i64;
        for k in 0..n {
            if a[k][k] == 0 {
                let swap = (k + 1..n).find(|&i| a[i][k] != 0);
                match swap {
                    Some(i) => {
                        a.swap(k, i);
                        sign = -sign;
                    }
                    None => return Ok(0),
                }
            }
            for i in k + 1..n {
                for j in k + 1..n {
                    let lhs = a[k][k].checked_mul(a[i][j]).ok_or(Error::Overflow)?;
                    let rhs = a[i][k].checked_mul(a[k][j]).ok_or(Error::Overflow)?;
                    a[i][j] = lhs.checked_sub(rhs).ok_or(Error::Overflow)? / prev;
                }
                a[i][k] = 0;
            }
            prev = a[k][k];
        }
        Ok(sign * a[n - 1][n - 1])
    }
}

fn sorted_pair(a: usize, b: usize) -> Vec<usize> {
    if a < b {
        vec![a, b]
    } else {
        vec![b, a]
    }
}

impl fmt::Debug for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}x{} matrix", self.num_rows(), self.num_columns)?;
        for r in 0..self.num_rows() {
            for c in 0..self.num_columns {
                write!(f, "{:>3}", self.get(r, c))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// An ordered selection of rows and columns of a host matrix.
///
/// Indices are strictly increasing after [`Submatrix::sort`]; duplicates are
/// forbidden.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submatrix {
    pub rows: Vec<usize>,
    pub columns: Vec<usize>,
}

impl Submatrix {
    pub fn new(rows: Vec<usize>, columns: Vec<usize>) -> Submatrix {
        Submatrix { rows, columns }
    }

    /// Selects all rows and columns of a matrix of the given shape.
    pub fn full(num_rows: usize, num_columns: usize) -> Submatrix {
        Submatrix {
            rows: (0..num_rows).collect(),
            columns: (0..num_columns).collect(),
        }
    }

    /// Sorts both index sequences ascendingly.
    pub fn sort(&mut self) {
        self.rows.sort_unstable();
        self.columns.sort_unstable();
    }

    /// Swaps the roles of rows and columns (submatrix of the transpose).
    pub fn transposed(mut self) -> Submatrix {
        core::mem::swap(&mut self.rows, &mut self.columns);
        self
    }

    /// Translates indices through the given maps (e.g. from a component
    /// back to the original matrix).
    pub fn translate(&mut self, row_map: &[usize], column_map: &[usize]) {
        for r in &mut self.rows {
            *r = row_map[*r];
        }
        for c in &mut self.columns {
            *c = column_map[*c];
        }
        self.sort();
    }

    pub fn is_square(&self) -> bool {
        self.rows.len() == self.columns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transpose_roundtrip() {
        let a = Matrix::from_dense(&[&[1, 0, -1], &[0, 1, 1]]);
        let t = a.transpose();
        assert_eq!(t.num_rows(), 3);
        assert_eq!(t.num_columns(), 2);
        assert_eq!(t.get(2, 0), -1);
        assert_eq!(t.transpose(), a);
    }

    #[test]
    fn filter_extracts_submatrix() {
        let a = Matrix::from_dense(&[&[1, 1, 0], &[0, 1, 1], &[1, 0, 1]]);
        let sub = Submatrix::new(vec![0, 2], vec![0, 2]);
        let b = a.filter(&sub);
        assert_eq!(b, Matrix::from_dense(&[&[1, 0], &[1, 1]]));
    }

    #[test]
    fn binary_pivot_toggles_rectangle() {
        let a = Matrix::from_dense(&[&[1, 1], &[1, 1]]);
        let b = a.binary_pivot(0, 0).unwrap();
        assert_eq!(b.get(1, 1), 0);
    }

    #[test]
    fn ternary_pivot_detects_bad_determinant() {
        let a = Matrix::from_dense(&[&[1, 1], &[-1, 1]]);
        let outcome = a.ternary_pivot(0, 0).unwrap();
        let violator = outcome.unwrap_err();
        assert_eq!(violator.rows, vec![0, 1]);
        assert_eq!(violator.columns, vec![0, 1]);
    }

    #[test]
    fn ternary_pivot_keeps_rows_sorted() {
        let a = Matrix::from_dense(&[&[1, 0, 1], &[1, 1, 0], &[0, 1, 1]]);
        let b = a.ternary_pivot(0, 0).unwrap().unwrap();
        for r in 0..b.num_rows() {
            let (columns, _) = b.row(r);
            assert!(columns.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn determinant_of_fano_submatrix() {
        let a = Matrix::from_dense(&[&[1, 1, 0], &[0, 1, 1], &[1, 0, 1]]);
        assert_eq!(a.determinant().unwrap(), 2);
    }
}
