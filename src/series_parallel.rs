//! Series-parallel reductions.
//!
//! A series-parallel reduction removes a zero row/column, a unit row/column
//! (exactly one nonzero), or a row/column that is a copy of another one (up
//! to sign in the ternary case). The reducer maintains per-element nonzero
//! counts and a signed rolling hash per row and column; parallel candidates
//! are matched through a hash table and verified exactly, and after every
//! removal the hashes of the touched mates are updated and the mates
//! re-queued.
//!
//! When the worklist drains, the residual matrix is classified: it is
//! either trivial (the matrix was series-parallel), admits a 2-separation
//! (detected through an articulation node of its bipartite support graph),
//! or contains a wheel minor, certified by a chordless cycle of length at
//! least six in the bipartite support graph.

use hashbrown::HashMap;
use indexmap::IndexSet;

use crate::matrix::{Matrix, Submatrix};
use crate::separation::{Separation, SeparationKind, Side};
use crate::{Element, Result};

/// One applied reduction: `element` was removed; `mate` is the column of a
/// unit row, the row of a unit column, or the surviving copy of a parallel
/// element. Zero rows/columns have no mate.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Reduction {
    pub element: Element,
    pub mate: Option<Element>,
}

/// Classification of the residual matrix after reduction.
#[derive(Clone, Debug)]
pub enum SpOutcome {
    /// At most one row and one column remain: the matrix is
    /// series-parallel (graphic and cographic, realised by a planar
    /// graph).
    SeriesParallel,
    /// The residual contains a wheel minor; the submatrix (in host matrix
    /// indices) carries the certifying chordless cycle, or the whole
    /// residual if only short cycles exist.
    Wheel(Submatrix),
    /// The residual admits a 2-separation; flags are indexed by the
    /// *residual* submatrix.
    TwoSeparation(Separation),
    /// Ternary only: two rows/columns share their support but are not
    /// equal up to sign, witnessing a 2×2 submatrix with determinant ±2
    /// (host matrix indices).
    Violator(Submatrix),
}

/// Result of a series-parallel reduction run.
#[derive(Clone, Debug)]
pub struct SpResult {
    /// Reductions in the order applied (at most m + n).
    pub reductions: Vec<Reduction>,
    /// The residual rows and columns, in host matrix indices.
    pub reduced: Submatrix,
    pub outcome: SpOutcome,
}

const HASH_PRIME: i64 = (1 << 61) - 1;

#[inline]
fn project_hash(value: i128) -> i64 {
    (value % HASH_PRIME as i128) as i64
}

/// Reduces `matrix`, applying at most `max_reductions` reductions.
///
/// In ternary mode, parallel means equal up to sign and sign-inconsistent
/// support copies abort with a violator.
pub fn decompose(matrix: &Matrix, ternary: bool, max_reductions: usize) -> Result<SpResult> {
    let m = matrix.num_rows();
    let n = matrix.num_columns();
    let transpose = matrix.transpose();

    // 1, 3, 9, ... projected into the hash range; shared by rows and
    // columns as in the element hash of the separation search.
    let mut hash_vector = vec![0i64; m.max(n)];
    let mut h = 1i64;
    for slot in hash_vector.iter_mut() {
        *slot = h;
        h = project_hash(3 * h as i128);
    }

    let mut row_alive = vec![true; m];
    let mut col_alive = vec![true; n];
    let mut row_nnz = vec![0usize; m];
    let mut col_nnz = vec![0usize; n];
    let mut row_hash = vec![0i64; m];
    let mut col_hash = vec![0i64; n];
    for r in 0..m {
        let (columns, values) = matrix.row(r);
        row_nnz[r] = columns.len();
        for (&c, &x) in columns.iter().zip(values) {
            col_nnz[c] += 1;
            row_hash[r] = project_hash(row_hash[r] as i128 + x as i128 * hash_vector[c] as i128);
            col_hash[c] = project_hash(col_hash[c] as i128 + x as i128 * hash_vector[r] as i128);
        }
    }

    let mut row_buckets: HashMap<i64, Vec<usize>> = HashMap::new();
    let mut col_buckets: HashMap<i64, Vec<usize>> = HashMap::new();
    for r in 0..m {
        row_buckets.entry(row_hash[r].abs()).or_default().push(r);
    }
    for c in 0..n {
        col_buckets.entry(col_hash[c].abs()).or_default().push(c);
    }

    let mut queue: IndexSet<Element> = IndexSet::new();
    for r in 0..m {
        queue.insert(Element::Row(r));
    }
    for c in 0..n {
        queue.insert(Element::Column(c));
    }

    let mut reductions = Vec::new();
    let mut violator = None;

    // Active entries of a row/column, restricted to the alive mates.
    let alive_row_entries = |row_alive: &[bool], col_alive: &[bool], element: Element| {
        let (host, alive): (&Matrix, &[bool]) = match element {
            Element::Row(_) => (matrix, col_alive),
            Element::Column(_) => (&transpose, row_alive),
        };
        let index = match element {
            Element::Row(r) => r,
            Element::Column(c) => c,
        };
        let (mates, values) = host.row(index);
        mates
            .iter()
            .zip(values)
            .filter(|(&mate, _)| alive[mate])
            .map(|(&mate, &x)| (mate, x))
            .collect::<Vec<_>>()
    };

    'worklist: while let Some(element) = queue.pop() {
        if reductions.len() >= max_reductions || violator.is_some() {
            break;
        }
        let (alive, nnz) = match element {
            Element::Row(r) => (row_alive[r], row_nnz[r]),
            Element::Column(c) => (col_alive[c], col_nnz[c]),
        };
        if !alive {
            continue;
        }

        let mate = if nnz == 0 {
            Some(None)
        } else if nnz == 1 {
            let entries = alive_row_entries(&row_alive, &col_alive, element);
            debug_assert_eq!(entries.len(), 1);
            Some(Some(match element {
                Element::Row(_) => Element::Column(entries[0].0),
                Element::Column(_) => Element::Row(entries[0].0),
            }))
        } else {
            // Parallel candidate: look up elements with the same absolute
            // hash and verify.
            let (hash, buckets) = match element {
                Element::Row(r) => (row_hash[r].abs(), &row_buckets),
                Element::Column(c) => (col_hash[c].abs(), &col_buckets),
            };
            let mut found = None;
            if let Some(bucket) = buckets.get(&hash) {
                let own = alive_row_entries(&row_alive, &col_alive, element);
                for &candidate in bucket {
                    let candidate_element = match element {
                        Element::Row(r) => {
                            if candidate == r || !row_alive[candidate] {
                                continue;
                            }
                            Element::Row(candidate)
                        }
                        Element::Column(c) => {
                            if candidate == c || !col_alive[candidate] {
                                continue;
                            }
                            Element::Column(candidate)
                        }
                    };
                    let other = alive_row_entries(&row_alive, &col_alive, candidate_element);
                    if other.len() != own.len()
                        || !other.iter().zip(&own).all(|(a, b)| a.0 == b.0)
                    {
                        continue;
                    }
                    // Supports agree; compare values up to a global sign.
                    let sign = own[0].1 * other[0].1;
                    if !ternary || own.iter().zip(&other).all(|(a, b)| a.1 * b.1 == sign) {
                        found = Some(candidate_element);
                        break;
                    }
                    // Same support, inconsistent signs: a 2×2 violator.
                    let same = own
                        .iter()
                        .zip(&other)
                        .find(|(a, b)| a.1 * b.1 == sign)
                        .expect("first pair matches by choice of sign");
                    let differ = own
                        .iter()
                        .zip(&other)
                        .find(|(a, b)| a.1 * b.1 != sign)
                        .expect("some pair differs");
                    let (e1, e2) = match element {
                        Element::Row(r) => (r, candidate),
                        Element::Column(c) => (c, candidate),
                    };
                    let mut sub = match element {
                        Element::Row(_) => {
                            Submatrix::new(vec![e1, e2], vec![same.0 .0, differ.0 .0])
                        }
                        Element::Column(_) => {
                            Submatrix::new(vec![same.0 .0, differ.0 .0], vec![e1, e2])
                        }
                    };
                    sub.sort();
                    violator = Some(sub);
                    continue 'worklist;
                }
            }
            found.map(Some)
        };

        let Some(mate) = mate else {
            continue;
        };

        // Apply the reduction: kill the element and update its mates.
        reductions.push(Reduction { element, mate });
        let entries = alive_row_entries(&row_alive, &col_alive, element);
        match element {
            Element::Row(r) => row_alive[r] = false,
            Element::Column(c) => col_alive[c] = false,
        }
        let own_index = match element {
            Element::Row(r) => r,
            Element::Column(c) => c,
        };
        for (mate_index, value) in entries {
            match element {
                Element::Row(_) => {
                    col_nnz[mate_index] -= 1;
                    let old = col_hash[mate_index];
                    let new = project_hash(
                        old as i128 - value as i128 * hash_vector[own_index] as i128,
                    );
                    col_hash[mate_index] = new;
                    if let Some(bucket) = col_buckets.get_mut(&old.abs()) {
                        bucket.retain(|&c| c != mate_index);
                    }
                    col_buckets.entry(new.abs()).or_default().push(mate_index);
                    queue.insert(Element::Column(mate_index));
                }
                Element::Column(_) => {
                    row_nnz[mate_index] -= 1;
                    let old = row_hash[mate_index];
                    let new = project_hash(
                        old as i128 - value as i128 * hash_vector[own_index] as i128,
                    );
                    row_hash[mate_index] = new;
                    if let Some(bucket) = row_buckets.get_mut(&old.abs()) {
                        bucket.retain(|&r| r != mate_index);
                    }
                    row_buckets.entry(new.abs()).or_default().push(mate_index);
                    queue.insert(Element::Row(mate_index));
                }
            }
        }
    }

    let reduced = Submatrix::new(
        (0..m).filter(|&r| row_alive[r]).collect(),
        (0..n).filter(|&c| col_alive[c]).collect(),
    );

    if let Some(violator) = violator {
        return Ok(SpResult {
            reductions,
            reduced,
            outcome: SpOutcome::Violator(violator),
        });
    }

    if reduced.rows.len() <= 1 && reduced.columns.len() <= 1 {
        return Ok(SpResult {
            reductions,
            reduced,
            outcome: SpOutcome::SeriesParallel,
        });
    }

    if reductions.len() >= max_reductions {
        // Limit reached: the caller only cares about the reductions; the
        // residual is reported as the seed region.
        let seed = reduced.clone();
        return Ok(SpResult {
            reductions,
            reduced,
            outcome: SpOutcome::Wheel(seed),
        });
    }

    let residual = matrix.filter(&reduced);
    if let Some(separation) = residual_two_separation(&residual) {
        return Ok(SpResult {
            reductions,
            reduced,
            outcome: SpOutcome::TwoSeparation(separation),
        });
    }

    let wheel = find_wheel(&residual)
        .map(|(rows, columns)| {
            let mut sub = Submatrix::new(
                rows.iter().map(|&r| reduced.rows[r]).collect(),
                columns.iter().map(|&c| reduced.columns[c]).collect(),
            );
            sub.sort();
            sub
        })
        .unwrap_or_else(|| reduced.clone());
    Ok(SpResult {
        reductions,
        reduced,
        outcome: SpOutcome::Wheel(wheel),
    })
}

/// Searches for a 2-separation of the residual through an articulation
/// node of its bipartite support graph: the cut element together with one
/// split component forms the first part, leaving at most one connecting
/// row or column, i.e. a rank-1 link.
fn residual_two_separation(residual: &Matrix) -> Option<Separation> {
    let m = residual.num_rows();
    let n = residual.num_columns();
    let num_nodes = m + n;
    if num_nodes < 5 {
        return None;
    }
    let transpose = residual.transpose();
    let neighbors = |v: usize| -> Vec<usize> {
        if v < m {
            residual.row(v).0.iter().map(|&c| m + c).collect()
        } else {
            transpose.row(v - m).0.iter().map(|&r| r).collect()
        }
    };

    // Iterative Tarjan lowpoint computation.
    let mut disc = vec![usize::MAX; num_nodes];
    let mut low = vec![usize::MAX; num_nodes];
    let mut parent = vec![usize::MAX; num_nodes];
    let mut time = 0usize;
    let mut articulation = None;
    let mut stack: Vec<(usize, usize)> = Vec::new();
    for start in 0..num_nodes {
        if disc[start] != usize::MAX {
            continue;
        }
        let mut root_children = 0usize;
        stack.push((start, 0));
        disc[start] = time;
        low[start] = time;
        time += 1;
        while let Some(&(v, next)) = stack.last() {
            let adjacency = neighbors(v);
            if next < adjacency.len() {
                stack.last_mut().expect("nonempty").1 += 1;
                let w = adjacency[next];
                if disc[w] == usize::MAX {
                    parent[w] = v;
                    disc[w] = time;
                    low[w] = time;
                    time += 1;
                    if v == start {
                        root_children += 1;
                    }
                    stack.push((w, 0));
                } else if w != parent[v] {
                    low[v] = low[v].min(disc[w]);
                }
            } else {
                stack.pop();
                if let Some(&(u, _)) = stack.last() {
                    low[u] = low[u].min(low[v]);
                    if u != start && low[v] >= disc[u] && articulation.is_none() {
                        articulation = Some((u, v));
                    }
                }
            }
        }
        if root_children > 1 && articulation.is_none() {
            // The root separates its DFS subtrees.
            articulation = Some((start, usize::MAX));
        }
    }

    let (cut, _child) = articulation?;
    // First part: one component of the graph minus the cut node, plus the
    // cut node itself.
    let mut seen = vec![false; num_nodes];
    seen[cut] = true;
    let start = (0..num_nodes).find(|&v| v != cut)?;
    let mut queue = vec![start];
    seen[start] = true;
    let mut head = 0;
    while head < queue.len() {
        let v = queue[head];
        head += 1;
        for w in neighbors(v) {
            if !seen[w] {
                seen[w] = true;
                queue.push(w);
            }
        }
    }
    // `seen` now covers one component plus the cut; everything else is the
    // second part.
    let mut rows = vec![Side::Second; m];
    let mut columns = vec![Side::Second; n];
    let mut first_count = 0usize;
    for v in 0..num_nodes {
        if seen[v] {
            first_count += 1;
            if v < m {
                rows[v] = Side::First;
            } else {
                columns[v - m] = Side::First;
            }
        }
    }
    if first_count < 2 || num_nodes - first_count < 2 {
        return None;
    }
    Some(Separation::new(SeparationKind::Two, rows, columns))
}

/// Finds a chordless cycle of length at least six in the bipartite support
/// graph of `residual`, returned as (rows, columns) in residual indices.
fn find_wheel(residual: &Matrix) -> Option<(Vec<usize>, Vec<usize>)> {
    let m = residual.num_rows();
    let n = residual.num_columns();
    let num_nodes = m + n;
    let transpose = residual.transpose();
    let neighbors = |v: usize| -> Vec<usize> {
        if v < m {
            residual.row(v).0.iter().map(|&c| m + c).collect()
        } else {
            transpose.row(v - m).0.iter().map(|&r| r).collect()
        }
    };
    let adjacent = |u: usize, v: usize| -> bool {
        let (r, c) = if u < m { (u, v - m) } else { (v, u - m) };
        residual.get(r, c) != 0
    };

    // Shortest cycle through each start node via BFS.
    let mut best: Option<Vec<usize>> = None;
    let mut dist = vec![usize::MAX; num_nodes];
    let mut pred = vec![usize::MAX; num_nodes];
    for start in 0..num_nodes {
        for v in 0..num_nodes {
            dist[v] = usize::MAX;
            pred[v] = usize::MAX;
        }
        dist[start] = 0;
        let mut queue = vec![start];
        let mut head = 0;
        while head < queue.len() {
            let v = queue[head];
            head += 1;
            for w in neighbors(v) {
                if dist[w] == usize::MAX {
                    dist[w] = dist[v] + 1;
                    pred[w] = v;
                    queue.push(w);
                } else if w != pred[v] && pred[w] != v {
                    // Non-tree edge closing a cycle through start.
                    let pv = trace(&pred, v);
                    let pw = trace(&pred, w);
                    let common: usize = pv
                        .iter()
                        .rev()
                        .zip(pw.iter().rev())
                        .take_while(|(a, b)| a == b)
                        .count();
                    if common != 1 {
                        continue;
                    }
                    // Cycle: v .. start .. w plus edge (v, w).
                    let mut cycle = pv;
                    let mut back: Vec<usize> = pw;
                    back.pop();
                    back.reverse();
                    cycle.extend(back);
                    if cycle.len() % 2 != 0 {
                        continue;
                    }
                    if best.as_ref().map_or(true, |b| cycle.len() < b.len()) {
                        best = Some(cycle);
                    }
                }
            }
        }
    }

    let mut cycle = best?;

    // Shrink chords; a chord splits the cycle into two shorter ones and we
    // keep a longest piece, so this terminates.
    let mut guard = 4 * num_nodes;
    'shrink: while cycle.len() >= 6 && guard > 0 {
        guard -= 1;
        let k = cycle.len();
        for i in 0..k {
            for j in i + 2..k {
                if i == 0 && j == k - 1 {
                    continue;
                }
                if (cycle[i] < m) == (cycle[j] < m) {
                    continue;
                }
                if adjacent(cycle[i], cycle[j]) {
                    // Split along the chord; keep the longer piece.
                    let piece_a: Vec<usize> = cycle[i..=j].to_vec();
                    let mut piece_b: Vec<usize> = cycle[j..].to_vec();
                    piece_b.extend_from_slice(&cycle[..=i]);
                    piece_b.pop();
                    cycle = if piece_a.len() >= piece_b.len() {
                        piece_a
                    } else {
                        piece_b
                    };
                    continue 'shrink;
                }
            }
        }
        break;
    }

    if cycle.len() < 6 {
        return None;
    }
    let mut rows = Vec::new();
    let mut columns = Vec::new();
    for &v in &cycle {
        if v < m {
            rows.push(v);
        } else {
            columns.push(v - m);
        }
    }
    Some((rows, columns))
}

fn trace(pred: &[usize], mut v: usize) -> Vec<usize> {
    let mut path = vec![v];
    while pred[v] != usize::MAX {
        v = pred[v];
        path.push(v);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduces_triangle_completely() {
        // Unit column 2 first, then everything collapses.
        let a = Matrix::from_dense(&[&[1, 1, 0], &[1, 1, 1]]);
        let result = decompose(&a, false, usize::MAX).unwrap();
        assert!(matches!(result.outcome, SpOutcome::SeriesParallel));
        assert!(result.reductions.len() <= a.num_rows() + a.num_columns());
    }

    #[test]
    fn wheel_survives_reduction() {
        let wheel = Matrix::from_dense(&[
            &[1, 1, 0, 0],
            &[0, 1, 1, 0],
            &[0, 0, 1, 1],
            &[1, 0, 0, 1],
        ]);
        let result = decompose(&wheel, false, usize::MAX).unwrap();
        match result.outcome {
            SpOutcome::Wheel(sub) => {
                assert!(sub.rows.len() >= 3);
                assert_eq!(sub.rows.len(), sub.columns.len());
            }
            other => panic!("expected wheel, got {other:?}"),
        }
    }

    #[test]
    fn ternary_sign_conflict_is_violator() {
        let a = Matrix::from_dense(&[&[1, 1, 1], &[1, 1, -1], &[1, 0, 1]]);
        let result = decompose(&a, true, usize::MAX).unwrap();
        match result.outcome {
            SpOutcome::Violator(sub) => {
                assert_eq!(sub.rows.len(), 2);
                assert_eq!(sub.columns.len(), 2);
                let det = a.filter(&sub).determinant().unwrap();
                assert_eq!(det.abs(), 2);
            }
            other => panic!("expected violator, got {other:?}"),
        }
    }

    #[test]
    fn terminates_within_bound() {
        let a = Matrix::from_dense(&[&[1, 0, 0], &[1, 0, 0], &[0, 1, 1]]);
        let result = decompose(&a, false, usize::MAX).unwrap();
        assert!(result.reductions.len() <= 6);
        assert!(matches!(result.outcome, SpOutcome::SeriesParallel));
    }
}
