use std::fmt::{Display, Formatter, Result};

use crate::distances::{DistanceMatrix, Mat};
use crate::tree::NodeIdx::{self, Internal as Int};

/// Working state of the UPGMA clustering.
///
/// Slot `k` holds an active cluster: its node in the tree, its number of leaves, the height of
/// its root and its row in `distances`. Slots stay ordered by the smallest original matrix
/// index among the members of each cluster.
#[derive(Debug)]
pub(super) struct UpgmaMat {
    pub(super) idx: Vec<NodeIdx>,
    pub(super) sizes: Vec<usize>,
    pub(super) heights: Vec<f64>,
    pub(super) distances: Mat,
}

impl Display for UpgmaMat {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{:?} {:?}\n {}", self.idx, self.sizes, self.distances)
    }
}

impl UpgmaMat {
    pub(super) fn new(distances: &DistanceMatrix) -> Self {
        let n = distances.len();
        Self {
            idx: (0..n).map(NodeIdx::Leaf).collect(),
            sizes: vec![1; n],
            heights: vec![0.0; n],
            distances: distances.matrix().clone(),
        }
    }

    pub(super) fn len(&self) -> usize {
        self.idx.len()
    }

    /// Closest pair of active clusters `(i, j, distance)` with `i < j`.
    ///
    /// Pairs are scanned row by row, so among equally close pairs the first one in matrix order
    /// wins.
    pub(super) fn closest_pair(&self) -> (usize, usize, f64) {
        debug_assert!(self.len() > 1, "Need at least two clusters to merge.");
        let mut closest = (0, 1, f64::INFINITY);
        for i in 0..self.len() {
            for j in (i + 1)..self.len() {
                let dist = self.distances[(i, j)];
                if dist < closest.2 {
                    closest = (i, j, dist);
                }
            }
        }
        closest
    }

    /// Lengths of the branches from clusters `i` and `j` to a parent placed at half their
    /// distance.
    pub(super) fn branch_lengths(&self, i: usize, j: usize, dist: f64) -> (f64, f64) {
        let height = dist / 2.0;
        (
            f64::max(0.0, height - self.heights[i]),
            f64::max(0.0, height - self.heights[j]),
        )
    }

    /// Replaces clusters `i < j` by their union, stored in slot `i` as node `idx_new`.
    ///
    /// Distances to the union are the averages of the distances to both clusters, weighted by
    /// cluster size.
    pub(super) fn merge(mut self, i: usize, j: usize, idx_new: usize, dist: f64) -> Self {
        debug_assert!(i < j);
        let (size_i, size_j) = (self.sizes[i] as f64, self.sizes[j] as f64);
        for k in (0..self.len()).filter(|&k| k != i && k != j) {
            let new_dist = (size_i * self.distances[(i, k)] + size_j * self.distances[(j, k)])
                / (size_i + size_j);
            self.distances[(i, k)] = new_dist;
            self.distances[(k, i)] = new_dist;
        }
        self.distances = self.distances.remove_row(j).remove_column(j);
        self.idx[i] = Int(idx_new);
        self.idx.remove(j);
        self.sizes[i] += self.sizes[j];
        self.sizes.remove(j);
        self.heights[i] = f64::max(dist / 2.0, f64::max(self.heights[i], self.heights[j]));
        self.heights.remove(j);
        self
    }
}
