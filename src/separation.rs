//! Separations of a matrix: a bipartition of rows and columns together
//! with the ranks of the two cross blocks.
//!
//! For a partition into FIRST and SECOND, the *bottom-left* block is
//! SECOND rows × FIRST columns and the *top-right* block is FIRST rows ×
//! SECOND columns. A k-separation has cross-block GF(2) ranks summing to
//! k - 1 and both sides large enough to make the induced sum proper.
//!
//! [`enumerate`] searches for a separation of minimal total cross rank by
//! trying all bipartitions of the smaller index set and assigning the
//! other index set greedily, branching only where an assignment is forced
//! to increase a rank. The search is exhaustive for the bounded sizes the
//! decomposition driver feeds it.

use crate::matrix::Matrix;

/// Which part of a separation an element belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Side {
    First,
    Second,
}

impl Side {
    #[inline]
    pub fn is_first(self) -> bool {
        self == Side::First
    }
}

/// The separation types the driver distinguishes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SeparationKind {
    /// Total cross rank 1.
    Two,
    /// Total cross rank 2, one in each block.
    ThreeDistributed,
    /// Total cross rank 2, concentrated in one block.
    ThreeConcentrated,
}

/// Per-element separation data: the side and whether the element carries
/// the rank-1 / rank-2 representative of the cross block it touches.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SepFlag {
    pub side: Side,
    pub rank1: bool,
    pub rank2: bool,
}

/// A 2- or 3-separation of a matrix.
#[derive(Clone, Debug)]
pub struct Separation {
    pub kind: SeparationKind,
    pub rows: Vec<SepFlag>,
    pub columns: Vec<SepFlag>,
}

impl Separation {
    pub fn new(kind: SeparationKind, rows: Vec<Side>, columns: Vec<Side>) -> Separation {
        let wrap = |side| SepFlag {
            side,
            rank1: false,
            rank2: false,
        };
        Separation {
            kind,
            rows: rows.into_iter().map(wrap).collect(),
            columns: columns.into_iter().map(wrap).collect(),
        }
    }

    pub fn first_rows(&self) -> Vec<usize> {
        side_indices(&self.rows, Side::First)
    }

    pub fn second_rows(&self) -> Vec<usize> {
        side_indices(&self.rows, Side::Second)
    }

    pub fn first_columns(&self) -> Vec<usize> {
        side_indices(&self.columns, Side::First)
    }

    pub fn second_columns(&self) -> Vec<usize> {
        side_indices(&self.columns, Side::Second)
    }
}

fn side_indices(flags: &[SepFlag], side: Side) -> Vec<usize> {
    flags
        .iter()
        .enumerate()
        .filter(|(_, f)| f.side == side)
        .map(|(i, _)| i)
        .collect()
}

// ----- GF(2) vectors as u64 word arrays ----------------------------------

pub(crate) type BitVec = Vec<u64>;

pub(crate) fn bitvec_zero(bits: usize) -> BitVec {
    vec![0; (bits + 63) / 64]
}

#[inline]
pub(crate) fn bitvec_set(v: &mut BitVec, bit: usize) {
    v[bit / 64] ^= 1 << (bit % 64);
}

#[inline]
fn bitvec_is_zero(v: &BitVec) -> bool {
    v.iter().all(|&w| w == 0)
}

fn bitvec_xor(a: &mut BitVec, b: &BitVec) {
    for (x, y) in a.iter_mut().zip(b) {
        *x ^= y;
    }
}

/// Reduces `v` against `basis` (vectors with distinct leading bits);
/// returns the residual.
fn reduce(mut v: BitVec, basis: &[BitVec]) -> BitVec {
    for b in basis {
        let lead = leading_bit(b);
        if lead != usize::MAX && v[lead / 64] & (1 << (lead % 64)) != 0 {
            bitvec_xor(&mut v, b);
        }
    }
    v
}

fn leading_bit(v: &BitVec) -> usize {
    for (i, &w) in v.iter().enumerate() {
        if w != 0 {
            return 64 * i + w.trailing_zeros() as usize;
        }
    }
    usize::MAX
}

/// GF(2) rank of a set of bit vectors.
pub(crate) fn gf2_rank(vectors: &[BitVec]) -> usize {
    let mut basis: Vec<BitVec> = Vec::new();
    for v in vectors {
        let residual = reduce(v.clone(), &basis);
        if !bitvec_is_zero(&residual) {
            basis.push(residual);
        }
    }
    basis.len()
}

// ----- exhaustive separation search ---------------------------------------

/// Largest index-set size for which the bipartition enumeration runs.
pub(crate) const ENUMERATION_BOUND: usize = 17;

/// Searches for a separation of `matrix` with total cross rank at least 1
/// and at most `max_rank`, both sides carrying enough elements for a
/// proper sum. Returns the separation of minimal total rank, preferring
/// concentrated over distributed rank on ties.
///
/// Returns `None` if no such separation exists; the caller must check
/// [`ENUMERATION_BOUND`] beforehand.
pub(crate) fn enumerate(matrix: &Matrix, max_rank: usize) -> Option<Separation> {
    let m = matrix.num_rows();
    let n = matrix.num_columns();
    if m.min(n) > ENUMERATION_BOUND || m < 2 {
        return None;
    }
    if n < m {
        // Enumerate over columns instead by searching the transpose.
        let separation = enumerate(&matrix.transpose(), max_rank)?;
        return Some(Separation {
            kind: separation.kind,
            rows: separation.columns,
            columns: separation.rows,
        });
    }

    // Column restrictions to the two row sets are recomputed per mask from
    // these full-column bit vectors.
    let transpose = matrix.transpose();
    let mut column_bits: Vec<BitVec> = Vec::with_capacity(n);
    for c in 0..n {
        let mut bits = bitvec_zero(m);
        for &r in transpose.row(c).0 {
            bitvec_set(&mut bits, r);
        }
        column_bits.push(bits);
    }

    let mut best: Option<(usize, bool, Separation)> = None;
    for mask in 1..(1u32 << m) - 1 {
        let row_first: Vec<bool> = (0..m).map(|r| mask & (1 << r) != 0).collect();
        let Some((col_first, bl_rank, tr_rank)) =
            assign_columns(&column_bits, &row_first, m, max_rank)
        else {
            continue;
        };
        let total = bl_rank + tr_rank;
        if total == 0 || total > max_rank {
            continue;
        }
        let min_side = if total <= 1 { 2 } else { 4 };
        let first_size = row_first.iter().filter(|&&f| f).count()
            + col_first.iter().filter(|&&f| f).count();
        let second_size = m + n - first_size;
        if first_size < min_side || second_size < min_side {
            continue;
        }
        let concentrated = bl_rank == 0 || tr_rank == 0;
        let better = match &best {
            None => true,
            Some((best_total, best_concentrated, _)) => {
                total < *best_total
                    || (total == *best_total && concentrated && !*best_concentrated)
            }
        };
        if better {
            let kind = if total == 1 {
                SeparationKind::Two
            } else if concentrated {
                SeparationKind::ThreeConcentrated
            } else {
                SeparationKind::ThreeDistributed
            };
            let rows = row_first
                .iter()
                .map(|&f| if f { Side::First } else { Side::Second })
                .collect();
            let columns = col_first
                .iter()
                .map(|&f| if f { Side::First } else { Side::Second })
                .collect();
            let separation = Separation::new(kind, rows, columns);
            let done = total == 1 && max_rank == 1;
            best = Some((total, concentrated, separation));
            if done {
                break;
            }
        }
    }
    best.map(|(_, _, separation)| separation)
}

/// Assigns every column to FIRST or SECOND for the given row bipartition,
/// branching where an assignment is forced to increase a cross rank, with
/// a total budget of `max_rank` increases.
fn assign_columns(
    column_bits: &[BitVec],
    row_first: &[bool],
    m: usize,
    max_rank: usize,
) -> Option<(Vec<bool>, usize, usize)> {
    let mut first_mask = bitvec_zero(m);
    let mut second_mask = bitvec_zero(m);
    for (r, &f) in row_first.iter().enumerate() {
        if f {
            bitvec_set(&mut first_mask, r);
        } else {
            bitvec_set(&mut second_mask, r);
        }
    }
    let restrict = |bits: &BitVec, mask: &BitVec| -> BitVec {
        bits.iter().zip(mask).map(|(b, m)| b & m).collect()
    };

    struct State {
        col_first: Vec<bool>,
        bl_basis: Vec<BitVec>,
        tr_basis: Vec<BitVec>,
    }

    fn recurse(
        column_bits: &[BitVec],
        restrictions: &[(BitVec, BitVec)],
        c: usize,
        state: &mut State,
        budget: usize,
        best: &mut Option<(Vec<bool>, usize, usize)>,
    ) {
        if c == column_bits.len() {
            let candidate = (
                state.col_first.clone(),
                state.bl_basis.len(),
                state.tr_basis.len(),
            );
            let total = candidate.1 + candidate.2;
            if best
                .as_ref()
                .map_or(true, |(_, bl, tr)| total < bl + tr)
            {
                *best = Some(candidate);
            }
            return;
        }
        let (to_second, to_first) = &restrictions[c];
        // `to_second` is the column restricted to SECOND rows (relevant
        // when the column joins FIRST), and vice versa.
        let bl_residual = reduce(to_second.clone(), &state.bl_basis);
        let tr_residual = reduce(to_first.clone(), &state.tr_basis);
        let free_first = bitvec_is_zero(&bl_residual);
        let free_second = bitvec_is_zero(&tr_residual);

        if free_first {
            state.col_first[c] = true;
            recurse(column_bits, restrictions, c + 1, state, budget, best);
        }
        if free_second && !free_first {
            state.col_first[c] = false;
            recurse(column_bits, restrictions, c + 1, state, budget, best);
        }
        if !free_first && !free_second {
            if budget == 0 {
                return;
            }
            state.col_first[c] = true;
            state.bl_basis.push(bl_residual);
            recurse(column_bits, restrictions, c + 1, state, budget - 1, best);
            state.bl_basis.pop();
            state.col_first[c] = false;
            state.tr_basis.push(tr_residual);
            recurse(column_bits, restrictions, c + 1, state, budget - 1, best);
            state.tr_basis.pop();
        }
    }

    let restrictions: Vec<(BitVec, BitVec)> = column_bits
        .iter()
        .map(|bits| (restrict(bits, &second_mask), restrict(bits, &first_mask)))
        .collect();
    let mut state = State {
        col_first: vec![false; column_bits.len()],
        bl_basis: Vec::new(),
        tr_basis: Vec::new(),
    };
    let mut best = None;
    recurse(
        column_bits,
        &restrictions,
        0,
        &mut state,
        max_rank,
        &mut best,
    );
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_of_identity() {
        let vectors: Vec<BitVec> = (0..3)
            .map(|i| {
                let mut v = bitvec_zero(3);
                bitvec_set(&mut v, i);
                v
            })
            .collect();
        assert_eq!(gf2_rank(&vectors), 3);
    }

    #[test]
    fn finds_two_separation_of_two_sum() {
        // Block structure [[A, 0], [b a^T, B]] has a 2-separation.
        let a = Matrix::from_dense(&[
            &[1, 1, 0, 0],
            &[0, 1, 1, 0],
            &[1, 1, 0, 0],
            &[1, 0, 1, 1],
            &[1, 0, 0, 1],
        ]);
        let separation = enumerate(&a, 1).expect("two-separation exists");
        assert_eq!(separation.kind, SeparationKind::Two);
        let first_rows = separation.first_rows().len() + separation.first_columns().len();
        assert!(first_rows >= 2);
    }

    #[test]
    fn three_connected_matrix_has_no_two_separation() {
        // The wheel W3 representation is 3-connected.
        let w3 = Matrix::from_dense(&[&[1, 1, 0], &[0, 1, 1], &[1, 1, 1]]);
        assert!(enumerate(&w3, 1).is_none());
    }

    #[test]
    fn concentrated_rank_preferred_for_r12() {
        let r12 = Matrix::from_dense(&[
            &[1, 0, 1, 1, 0, 0],
            &[0, 1, 1, 1, 0, 0],
            &[1, 0, 1, 0, 1, 1],
            &[0, 1, 0, 1, 1, 1],
            &[1, 0, 1, 0, 1, 0],
            &[0, 1, 0, 1, 0, 1],
        ]);
        let separation = enumerate(&r12, 2).expect("R12 has a 3-separation");
        assert_eq!(separation.kind, SeparationKind::ThreeConcentrated);
    }
}
