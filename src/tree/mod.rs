use std::cmp::Reverse;
use std::fmt::{self, Display};

use anyhow::bail;
use approx::abs_diff_eq;
use fixedbitset::FixedBitSet;
use hashbrown::HashMap;

use crate::error::PhyloError;
use crate::{f64_h, Result};

mod nj_builder;
mod nj_matrices;
mod tree_builder;
mod tree_node;
pub mod tree_parser;
mod upgma_builder;
mod upgma_matrices;

pub use nj_builder::NJBuilder;
pub use tree_builder::{TreeBuilder, TreeMethod};
pub use tree_node::Node;
pub use upgma_builder::UpgmaBuilder;

#[derive(PartialEq, Clone, Copy, PartialOrd, Eq, Ord, Hash)]
pub enum NodeIdx {
    Internal(usize),
    Leaf(usize),
}

use NodeIdx::{Internal as Int, Leaf};

impl From<&NodeIdx> for usize {
    fn from(node_idx: &NodeIdx) -> usize {
        match node_idx {
            Int(idx) | Leaf(idx) => *idx,
        }
    }
}

impl From<NodeIdx> for usize {
    fn from(node_idx: NodeIdx) -> usize {
        usize::from(&node_idx)
    }
}

impl Display for NodeIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Int(idx) => write!(f, "internal node {}", idx),
            Leaf(idx) => write!(f, "leaf node {}", idx),
        }
    }
}

impl fmt::Debug for NodeIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Int(idx) => write!(f, "Int({})", idx),
            Leaf(idx) => write!(f, "Leaf({})", idx),
        }
    }
}

// Characters that force a Newick label to be quoted.
const NEWICK_RESERVED: &[char] = &['(', ')', '[', ']', '\'', ':', ';', ','];

/// Phylogenetic tree stored as an arena of nodes.
///
/// `nodes[i]` holds the node with index `i`, regardless of whether it is a leaf or an internal
/// node. Every node lists its children and refers back to its parent by index, the root is the
/// only node without a parent.
#[derive(Debug, Clone)]
pub struct Tree {
    pub root: NodeIdx,
    pub nodes: Vec<Node>,
    pub postorder: Vec<NodeIdx>,
    pub preorder: Vec<NodeIdx>,
    pub complete: bool,
    pub n: usize,
    rooted: bool,
    leaf_ids: Vec<String>,
}

impl Tree {
    /// Creates the leaves of a tree with one leaf per taxon, in the given order.
    ///
    /// Internal nodes are then added bottom-up with [`Tree::add_parent`]. A single taxon gives a
    /// complete tree consisting of that leaf only. Bails with [`PhyloError::EmptyInput`] if there
    /// are no taxa.
    pub fn new(taxa: &[String]) -> Result<Self> {
        let n = taxa.len();
        if n == 0 {
            bail!(PhyloError::EmptyInput);
        }
        let mut nodes: Vec<Node> = taxa
            .iter()
            .enumerate()
            .map(|(i, id)| Node::new_leaf(i, None, 0.0, id.clone()))
            .collect();
        nodes.reserve(n - 1);
        let mut tree = Self {
            root: if n == 1 { Leaf(0) } else { Int(2 * n - 2) },
            nodes,
            postorder: Vec::new(),
            preorder: Vec::new(),
            complete: false,
            n,
            rooted: false,
            leaf_ids: taxa.to_vec(),
        };
        if n == 1 {
            tree.complete();
        }
        Ok(tree)
    }

    pub(crate) fn new_empty() -> Self {
        Self {
            root: Int(0),
            nodes: Vec::new(),
            postorder: Vec::new(),
            preorder: Vec::new(),
            complete: false,
            n: 0,
            rooted: false,
            leaf_ids: Vec::new(),
        }
    }

    /// Joins two existing nodes under a new internal node with index `parent_idx`.
    pub fn add_parent(
        &mut self,
        parent_idx: usize,
        idx_i: &NodeIdx,
        idx_j: &NodeIdx,
        blen_i: f64,
        blen_j: f64,
    ) {
        debug_assert_eq!(parent_idx, self.nodes.len());
        self.nodes.push(Node::new_internal(
            parent_idx,
            None,
            vec![*idx_i, *idx_j],
            0.0,
            "".to_string(),
        ));
        self.nodes[usize::from(idx_i)].add_parent(&Int(parent_idx), blen_i);
        self.nodes[usize::from(idx_j)].add_parent(&Int(parent_idx), blen_j);
    }

    /// Finalises construction: records the leaves and computes both traversal orders.
    pub(crate) fn complete(&mut self) {
        self.leaf_ids = self
            .nodes
            .iter()
            .filter(|node| node.is_leaf())
            .map(|node| node.id.clone())
            .collect();
        self.n = self.leaf_ids.len();
        self.compute_postorder();
        self.compute_preorder();
        self.complete = true;
    }

    pub fn compute_postorder(&mut self) {
        let mut order = Vec::<NodeIdx>::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(idx) = stack.pop() {
            order.push(idx);
            stack.extend(self.node(&idx).children.iter());
        }
        order.reverse();
        self.postorder = order;
    }

    pub fn compute_preorder(&mut self) {
        self.preorder = self.preorder_subroot(&self.root);
    }

    pub fn preorder_subroot(&self, subroot_idx: &NodeIdx) -> Vec<NodeIdx> {
        let mut order = Vec::<NodeIdx>::with_capacity(self.nodes.len());
        let mut stack = vec![*subroot_idx];
        while let Some(idx) = stack.pop() {
            order.push(idx);
            stack.extend(self.node(&idx).children.iter().rev());
        }
        order
    }

    /// Number of nodes, leaves and internal nodes together.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn leaves(&self) -> Vec<&Node> {
        self.nodes.iter().filter(|node| node.is_leaf()).collect()
    }

    pub fn internals(&self) -> Vec<&Node> {
        self.nodes.iter().filter(|node| !node.is_leaf()).collect()
    }

    pub fn node(&self, node_idx: &NodeIdx) -> &Node {
        &self.nodes[usize::from(node_idx)]
    }

    pub fn node_id(&self, node_idx: &NodeIdx) -> &str {
        &self.node(node_idx).id
    }

    pub fn children(&self, node_idx: &NodeIdx) -> &[NodeIdx] {
        &self.node(node_idx).children
    }

    pub fn parent(&self, node_idx: &NodeIdx) -> Option<&NodeIdx> {
        self.node(node_idx).parent.as_ref()
    }

    pub fn leaf_ids(&self) -> Vec<String> {
        self.leaf_ids.clone()
    }

    pub fn try_idx(&self, id: &str) -> Result<NodeIdx> {
        match self.nodes.iter().find(|node| node.id == id) {
            Some(node) => Ok(node.idx),
            None => bail!("No node with id {} found in the tree", id),
        }
    }

    /// Index of the node with the given id.
    ///
    /// # Panics
    /// Panics if there is no such node, use [`Tree::try_idx`] for a fallible lookup.
    pub fn idx(&self, id: &str) -> NodeIdx {
        self.try_idx(id)
            .unwrap_or_else(|_| panic!("No node with id {} found in the tree", id))
    }

    pub fn by_id(&self, id: &str) -> &Node {
        self.node(&self.idx(id))
    }

    pub fn is_rooted(&self) -> bool {
        self.rooted
    }

    pub fn set_rooted(&mut self, rooted: bool) {
        self.rooted = rooted;
    }

    /// Distance from the root to every node, indexed like `nodes`.
    pub fn depths(&self) -> Vec<f64> {
        let mut depths = vec![0.0; self.nodes.len()];
        for node_idx in &self.preorder {
            let node = self.node(node_idx);
            if let Some(parent) = &node.parent {
                depths[usize::from(node_idx)] = depths[usize::from(parent)] + node.blen;
            }
        }
        depths
    }

    pub fn depth(&self, node_idx: &NodeIdx) -> f64 {
        let mut depth = 0.0;
        let mut cur = self.node(node_idx);
        while let Some(parent) = &cur.parent {
            depth += cur.blen;
            cur = self.node(parent);
        }
        depth
    }

    /// Largest root-to-leaf distance.
    pub fn height(&self) -> f64 {
        let depths = self.depths();
        self.leaves()
            .iter()
            .map(|leaf| f64_h::from(depths[usize::from(&leaf.idx)]))
            .max()
            .map_or(0.0, |height| height.into_inner())
    }

    /// Whether every leaf lies at the same distance from the root, up to `epsilon`.
    pub fn is_ultrametric(&self, epsilon: f64) -> bool {
        let depths = self.depths();
        let height = self.height();
        self.leaves()
            .iter()
            .all(|leaf| abs_diff_eq!(depths[usize::from(&leaf.idx)], height, epsilon = epsilon))
    }

    /// Number of leaves below every node, indexed like `nodes`.
    pub fn leaf_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.nodes.len()];
        for node_idx in &self.postorder {
            let node = self.node(node_idx);
            counts[usize::from(node_idx)] = if node.is_leaf() {
                1
            } else {
                node.children.iter().map(|c| counts[usize::from(c)]).sum()
            };
        }
        counts
    }

    /// Sorts the children of every node by the size of their subtrees, smallest first, or
    /// largest first if `reverse` is set. Children with equal leaf counts keep their order.
    pub fn ladderize(&mut self, reverse: bool) {
        let counts = self.leaf_counts();
        for node in self.nodes.iter_mut() {
            if reverse {
                node.children
                    .sort_by_key(|child| Reverse(counts[usize::from(child)]));
            } else {
                node.children.sort_by_key(|child| counts[usize::from(child)]);
            }
        }
        self.compute_postorder();
        self.compute_preorder();
    }

    /// Clades of the tree as sets of leaves, mapped to the length of the branch above them.
    ///
    /// Bit `i` of a clade stands for the `i`-th leaf id in lexicographic order, so clades of
    /// trees over the same taxa are directly comparable regardless of node numbering.
    pub fn clades(&self) -> HashMap<FixedBitSet, f64> {
        let mut ids = self.leaf_ids.clone();
        ids.sort();
        let n = ids.len();
        let mut sets: Vec<FixedBitSet> = vec![FixedBitSet::with_capacity(n); self.nodes.len()];
        let mut clades = HashMap::with_capacity(self.nodes.len());
        for node_idx in &self.postorder {
            let node = self.node(node_idx);
            let mut set = FixedBitSet::with_capacity(n);
            if node.is_leaf() {
                if let Ok(pos) = ids.binary_search(&node.id) {
                    set.insert(pos);
                }
            } else {
                for child in &node.children {
                    set.union_with(&sets[usize::from(child)]);
                }
            }
            clades.insert(set.clone(), node.blen);
            sets[usize::from(node_idx)] = set;
        }
        clades
    }

    /// Whether both trees have the same leaves, the same clades and the same branch lengths
    /// above each clade, up to `epsilon`.
    pub fn same_clades(&self, other: &Tree, epsilon: f64) -> bool {
        let mut ids = self.leaf_ids();
        let mut other_ids = other.leaf_ids();
        ids.sort();
        other_ids.sort();
        if ids != other_ids {
            return false;
        }
        let (clades, other_clades) = (self.clades(), other.clades());
        clades.len() == other_clades.len()
            && clades.iter().all(|(clade, blen)| {
                other_clades
                    .get(clade)
                    .is_some_and(|other_blen| abs_diff_eq!(*blen, *other_blen, epsilon = epsilon))
            })
    }

    /// Writes the tree in Newick format, prefixed with `[&R]` if it is rooted.
    ///
    /// Internal nodes without a name carry their confidence as label, if they have one.
    ///
    /// # Example
    /// ```
    /// use mitophylo::tree::tree_parser::from_newick;
    /// let tree = from_newick("((A:1,B:2):0.5,C:3);").unwrap().pop().unwrap();
    /// assert_eq!(tree.to_newick(), "((A:1,B:2):0.5,C:3);");
    /// ```
    pub fn to_newick(&self) -> String {
        let mut newick = String::new();
        if self.rooted {
            newick.push_str("[&R] ");
        }
        self.subtree_to_newick(&self.root, &mut newick);
        newick.push(';');
        newick
    }

    fn subtree_to_newick(&self, node_idx: &NodeIdx, newick: &mut String) {
        let node = self.node(node_idx);
        if !node.children.is_empty() {
            newick.push('(');
            for (i, child) in node.children.iter().enumerate() {
                if i > 0 {
                    newick.push(',');
                }
                self.subtree_to_newick(child, newick);
            }
            newick.push(')');
        }
        match (node.is_leaf(), node.id.is_empty(), node.confidence) {
            (false, true, Some(confidence)) => newick.push_str(&confidence.to_string()),
            _ => newick.push_str(&newick_label(&node.id)),
        }
        if node.parent.is_some() || node.blen != 0.0 {
            newick.push_str(&format!(":{}", node.blen));
        }
    }
}

impl Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_newick())
    }
}

fn newick_label(id: &str) -> String {
    if id.contains(NEWICK_RESERVED) || id.contains(char::is_whitespace) {
        format!("'{}'", id.replace('\'', "''"))
    } else {
        id.to_string()
    }
}

#[cfg(test)]
#[cfg_attr(coverage, coverage(off))]
mod tests;
