//! Lexicographic combination iterator.
//!
//! Yields every k-combination of the indices `0..n` as a strictly increasing
//! `Vec<usize>`, in lexicographic order. Each unordered subset is produced
//! exactly once. Spacecraft tetrahedra are the `k = 4` case.

/// Number of spacecraft in a tetrahedron.
pub const TETRAHEDRON_SIZE: usize = 4;

/// Iterator over the k-combinations of `0..n` in lexicographic order.
pub struct Combinations {
    n: usize,
    k: usize,
    current: Option<Vec<usize>>,
}

impl Combinations {
    /// Create a new iterator yielding `k`-combinations of `0..n`.
    ///
    /// Yields nothing when `n < k` or `k == 0`.
    pub fn new(n: usize, k: usize) -> Self {
        let current = if n >= k && k > 0 {
            Some((0..k).collect())
        } else {
            None
        };
        Self { n, k, current }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let combo = self.current.take()?;

        // Find the rightmost position that can still be incremented.
        // Position i may hold at most n - k + i.
        let mut successor = combo.clone();
        let mut i = self.k;
        while i > 0 {
            i -= 1;
            if successor[i] < self.n - self.k + i {
                successor[i] += 1;
                for j in (i + 1)..self.k {
                    successor[j] = successor[j - 1] + 1;
                }
                self.current = Some(successor);
                break;
            }
        }

        Some(combo)
    }
}

/// Binomial coefficient C(n, k); zero when `k > n`.
pub fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    (0..k).fold(1usize, |acc, i| acc * (n - i) / (i + 1))
}

/// All 4-spacecraft subsets of `n` spacecraft, lexicographically ordered.
pub fn tetrahedra(n: usize) -> Vec<[usize; TETRAHEDRON_SIZE]> {
    let mut out = Vec::with_capacity(binomial(n, TETRAHEDRON_SIZE));
    out.extend(
        Combinations::new(n, TETRAHEDRON_SIZE).map(|c| [c[0], c[1], c[2], c[3]]),
    );
    out
}
