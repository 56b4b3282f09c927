//! Sparse word-by-context matrix and exact k-nearest-neighbor search.
//!
//! Rows are words, columns are contexts, entries are context counts.
//! Similarity is cosine. Only words sharing at least one context are compared:
//! the column-major copy of the matrix yields those candidates directly, and
//! the top-k result is still exact because non-candidates have similarity 0.
//!
//! Ranking is done in integer arithmetic so that mathematically equal cosines
//! compare equal and fall through to the row-index tie-break.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use ndarray::Array1;
use rayon::prelude::*;
use sprs::{CsMat, TriMat};

/// A candidate neighbor of a fixed query row. Greater means ranked higher:
/// larger cosine first, then lower row index. Rows are in lexicographic word
/// order, so equal scores resolve to the alphabetically smaller word.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    row: usize,
    dot: u64,
    squared_norm: u64,
}

impl Candidate {
    /// `dot² · other_norm²`; comparing these across two candidates compares
    /// their cosines with the shared query.
    fn cross(&self, other: &Candidate) -> u128 {
        let dot = u128::from(self.dot);
        (dot * dot).saturating_mul(u128::from(other.squared_norm))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cross(other)
            .cmp(&other.cross(self))
            .then_with(|| other.row.cmp(&self.row))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

pub struct ContextMatrix {
    /// Row-major, one row per word.
    rows: CsMat<u64>,
    /// Column-major copy, one outer vector per context.
    columns: CsMat<u64>,
    squared_norms: Array1<u64>,
}

impl ContextMatrix {
    /// Build from `(row, column, count)` triplets; duplicates are summed.
    pub fn from_triplets(
        n_rows: usize,
        n_cols: usize,
        triplets: impl IntoIterator<Item = (usize, usize, u64)>,
    ) -> Self {
        let mut tri = TriMat::new((n_rows, n_cols));
        for (row, col, count) in triplets {
            tri.add_triplet(row, col, count);
        }
        let rows: CsMat<u64> = tri.to_csr();
        let columns: CsMat<u64> = tri.to_csc();

        let mut squared_norms = Array1::<u64>::zeros(n_rows);
        for (row_idx, row) in rows.outer_iterator().enumerate() {
            squared_norms[row_idx] = row.iter().map(|(_, &v)| v.saturating_mul(v)).sum();
        }

        Self {
            rows,
            columns,
            squared_norms,
        }
    }

    fn cosine(&self, a: usize, b: usize, dot: u64) -> f64 {
        let denom = (self.squared_norms[a] as f64).sqrt() * (self.squared_norms[b] as f64).sqrt();
        if denom == 0.0 {
            0.0
        } else {
            dot as f64 / denom
        }
    }

    /// Cosine similarity between two rows.
    pub fn similarity(&self, a: usize, b: usize) -> f64 {
        let (Some(row_a), Some(row_b)) = (self.rows.outer_view(a), self.rows.outer_view(b)) else {
            return 0.0;
        };
        let mut a_iter = row_a.iter().peekable();
        let mut b_iter = row_b.iter().peekable();
        let mut dot = 0u64;
        loop {
            let Some(&(ia, &va)) = a_iter.peek() else {
                break;
            };
            let Some(&(ib, &vb)) = b_iter.peek() else {
                break;
            };
            match ia.cmp(&ib) {
                Ordering::Less => {
                    a_iter.next();
                }
                Ordering::Greater => {
                    b_iter.next();
                }
                Ordering::Equal => {
                    dot += va * vb;
                    a_iter.next();
                    b_iter.next();
                }
            }
        }
        self.cosine(a, b, dot)
    }

    /// The `k` rows most similar to `row`, best first. Rows with no shared
    /// context are never returned.
    pub fn knn(&self, row: usize, k: usize) -> Vec<(usize, f64)> {
        if k == 0 {
            return Vec::new();
        }
        let Some(row_view) = self.rows.outer_view(row) else {
            return Vec::new();
        };

        // Dot products with every row sharing a context.
        let mut dots = vec![0u64; self.rows.rows()];
        let mut touched = Vec::new();
        for (col, &weight) in row_view.iter() {
            let Some(column) = self.columns.outer_view(col) else {
                continue;
            };
            for (other, &other_weight) in column.iter() {
                if other == row {
                    continue;
                }
                if dots[other] == 0 {
                    touched.push(other);
                }
                dots[other] += weight * other_weight;
            }
        }

        // Bounded min-heap holding the best k seen so far.
        let mut heap: BinaryHeap<Reverse<Candidate>> = BinaryHeap::with_capacity(k + 1);
        for other in touched {
            if dots[other] == 0 || self.squared_norms[other] == 0 {
                continue;
            }
            heap.push(Reverse(Candidate {
                row: other,
                dot: dots[other],
                squared_norm: self.squared_norms[other],
            }));
            if heap.len() > k {
                heap.pop();
            }
        }

        // Ascending order of Reverse(candidate) is descending rank.
        heap.into_sorted_vec()
            .into_iter()
            .map(|Reverse(c)| (c.row, self.cosine(row, c.row, c.dot)))
            .collect()
    }

    /// Top-k lists for every row, computed in parallel, in row order.
    pub fn batch_knn(&self, k: usize) -> Vec<Vec<(usize, f64)>> {
        (0..self.rows.rows())
            .into_par_iter()
            .map(|row| self.knn(row, k))
            .collect()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows.rows(), self.rows.cols())
    }

    pub fn nnz(&self) -> usize {
        self.rows.nnz()
    }

    pub fn sparsity(&self) -> f64 {
        let total = self.rows.rows() * self.rows.cols();
        if total == 0 {
            0.0
        } else {
            1.0 - (self.rows.nnz() as f64 / total as f64)
        }
    }
}
