//! A disjoint-set data structure, or "union & find", over `usize` indices.

/// A disjoint-set forest with union by rank and path compression.
///
/// Used standalone for one-sum block bookkeeping; the t-decomposition
/// embeds the same scheme directly in its member and node pools.
#[derive(Clone, Debug)]
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    /// Creates a new `UnionFind` with `n` singleton sets.
    pub fn new(n: usize) -> Self {
        UnionFind {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    /// Returns the representative for `x` without mutating the structure.
    ///
    /// **Panics** if `x` is out of bounds.
    pub fn find(&self, x: usize) -> usize {
        let mut x = x;
        while self.parent[x] != x {
            x = self.parent[x];
        }
        x
    }

    /// Returns the representative for `x`, compressing the path to the
    /// root to quicken future lookups.
    ///
    /// **Panics** if `x` is out of bounds.
    pub fn find_mut(&mut self, x: usize) -> usize {
        let root = self.find(x);
        let mut x = x;
        while self.parent[x] != root {
            let next = self.parent[x];
            self.parent[x] = root;
            x = next;
        }
        root
    }

    /// Unifies the sets containing `x` and `y`.
    ///
    /// Returns `false` if the sets were already the same.
    pub fn union(&mut self, x: usize, y: usize) -> bool {
        let xroot = self.find_mut(x);
        let yroot = self.find_mut(y);
        if xroot == yroot {
            return false;
        }
        // The rank approximates subtree depth; hang the smaller tree below
        // the larger one.
        match self.rank[xroot].cmp(&self.rank[yroot]) {
            core::cmp::Ordering::Less => self.parent[xroot] = yroot,
            core::cmp::Ordering::Greater => self.parent[yroot] = xroot,
            core::cmp::Ordering::Equal => {
                self.parent[yroot] = xroot;
                self.rank[xroot] += 1;
            }
        }
        true
    }

    /// Returns `true` if `x` and `y` are in the same set.
    pub fn equiv(&self, x: usize, y: usize) -> bool {
        self.find(x) == self.find(y)
    }
}

#[cfg(test)]
mod tests {
    use super::UnionFind;

    #[test]
    fn union_find_basics() {
        let mut u = UnionFind::new(8);
        for i in 0..8 {
            assert_eq!(u.find(i), i);
        }
        assert!(u.union(0, 1));
        assert!(u.union(1, 3));
        assert!(!u.union(0, 3));
        assert!(u.union(5, 6));
        assert!(u.equiv(0, 3));
        assert!(!u.equiv(0, 5));
        let roots: std::collections::HashSet<_> = (0..8).map(|i| u.find_mut(i)).collect();
        assert_eq!(roots.len(), 5);
    }
}
