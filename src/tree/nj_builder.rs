use log::{debug, info};

use crate::distances::{DistanceMatrix, Mat};
use crate::tree::{nj_matrices::NJMat, Tree, TreeBuilder};
use crate::Result;

/// Neighbour joining (Saitou and Nei, 1987).
///
/// Gives an additive tree that is not necessarily ultrametric. The root is placed at the last
/// join, halfway between the two remaining nodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NJBuilder;

impl TreeBuilder for NJBuilder {
    fn build_tree(&self, distances: &DistanceMatrix) -> Result<Tree> {
        info!("Building NJ tree for {} taxa.", distances.len());
        NJBuilder::build_nj_tree_from_matrix(NJMat::new(distances), distances.taxa())
    }
}

impl NJBuilder {
    /// First minimal off-diagonal entry of the lower triangle, scanning rows top to bottom.
    fn argmin_wo_diagonal(q: Mat) -> (usize, usize) {
        debug_assert!(!q.is_empty(), "The input matrix must not be empty.");
        debug_assert!(
            q.ncols() > 1 && q.nrows() > 1,
            "The input matrix should have more than 1 element."
        );
        let mut arg_min = (1, 0);
        let mut val_min = f64::INFINITY;
        for i in 0..q.nrows() {
            for j in 0..i {
                if q[(i, j)] < val_min {
                    val_min = q[(i, j)];
                    arg_min = (i, j);
                }
            }
        }
        arg_min
    }

    fn build_nj_tree_from_matrix(mut nj_data: NJMat, taxa: &[String]) -> Result<Tree> {
        let mut tree = Tree::new(taxa)?;
        let n = nj_data.distances.ncols();
        let root_idx = usize::from(&tree.root);
        for cur_idx in n..=root_idx {
            let q = nj_data.compute_nj_q();
            let (i, j) = NJBuilder::argmin_wo_diagonal(q);
            let (blen_i, blen_j) = nj_data.branch_lengths(i, j, cur_idx == root_idx);
            debug!("Joining {} and {}.", nj_data.idx[i], nj_data.idx[j]);
            tree.add_parent(cur_idx, &nj_data.idx[i], &nj_data.idx[j], blen_i, blen_j);
            nj_data = nj_data
                .add_merge_node(cur_idx)
                .recompute_new_node_distances(i, j)
                .remove_merged_nodes(i, j);
        }
        tree.complete();
        info!("Finished building the tree.");
        Ok(tree)
    }
}
