use log::{debug, info};

use crate::distances::DistanceMatrix;
use crate::tree::{upgma_matrices::UpgmaMat, Tree, TreeBuilder};
use crate::Result;

/// Unweighted pair group method with arithmetic mean.
///
/// Repeatedly joins the two closest clusters under a new node placed at half their distance,
/// which gives an ultrametric binary tree. Leaves are `Leaf(0..n)` in matrix order, internal
/// nodes `Internal(n..2n-1)` in merge order and the root is `Internal(2n-2)`.
///
/// # Example
/// ```
/// use mitophylo::dist_matrix;
/// use mitophylo::tree::{TreeBuilder, UpgmaBuilder};
/// let distances = dist_matrix!(["A", "B", "C"];
///     0.0, 0.1, 0.5;
///     0.1, 0.0, 0.5;
///     0.5, 0.5, 0.0);
/// let tree = UpgmaBuilder.build_tree(&distances).unwrap();
/// assert_eq!(tree.by_id("A").blen, 0.05);
/// assert_eq!(tree.by_id("C").blen, 0.25);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct UpgmaBuilder;

impl TreeBuilder for UpgmaBuilder {
    fn build_tree(&self, distances: &DistanceMatrix) -> Result<Tree> {
        info!("Building UPGMA tree for {} taxa.", distances.len());
        let mut tree = Tree::new(distances.taxa())?;
        let n = distances.len();
        let mut upgma_data = UpgmaMat::new(distances);
        for idx_new in n..(2 * n - 1) {
            let (i, j, dist) = upgma_data.closest_pair();
            let (blen_i, blen_j) = upgma_data.branch_lengths(i, j, dist);
            debug!(
                "Joining {} and {} at height {}.",
                upgma_data.idx[i],
                upgma_data.idx[j],
                dist / 2.0
            );
            tree.add_parent(idx_new, &upgma_data.idx[i], &upgma_data.idx[j], blen_i, blen_j);
            upgma_data = upgma_data.merge(i, j, idx_new, dist);
        }
        tree.complete();
        info!("Finished building the tree.");
        Ok(tree)
    }
}
