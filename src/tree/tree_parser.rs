use std::fmt;

use anyhow::bail;
use log::{info, warn};
use pest::{
    error::{Error as PestError, ErrorVariant},
    iterators::Pair,
    Parser,
};
use pest_derive::Parser;

use crate::tree::{
    Node,
    NodeIdx::{self, Internal as Int, Leaf},
    Tree,
};
use crate::Result;

#[derive(Parser)]
#[grammar = "./tree/newick.pest"]
pub struct NewickParser;

#[derive(Debug)]
pub struct ParsingError(pub Box<PestError<Rule>>);

impl fmt::Display for ParsingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Malformed newick string")?;
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ParsingError {}

/// Parses all trees of a Newick string, each terminated by `;`.
///
/// Trees may be multifurcating and carry a leading `[&R]` or `[&U]` rooting tag, trees
/// without one are considered unrooted. Nodes are numbered in preorder, so the root is node 0.
/// Other bracketed comments are skipped, quoted labels may contain any character. Numeric labels
/// of internal nodes are read as confidence values.
pub fn from_newick(newick_string: &str) -> Result<Vec<Tree>> {
    info!("Parsing newick trees.");
    let newick_rule = match NewickParser::parse(Rule::newick, newick_string) {
        Ok(mut pairs) => pairs.next(),
        Err(e) => bail!(ParsingError(Box::new(e))),
    };
    let mut trees = Vec::new();
    for tree_rule in newick_rule.into_iter().flat_map(|rule| rule.into_inner()) {
        if tree_rule.as_rule() != Rule::tree {
            continue;
        }
        let mut tree = Tree::new_empty();
        for rule in tree_rule.into_inner() {
            match rule.as_rule() {
                Rule::rooting => tree.set_rooted(rule.as_str().to_ascii_uppercase().contains('R')),
                Rule::internal | Rule::leaf => {
                    tree.root = tree.parse_node_rule(rule, None)?;
                }
                _ => unreachable!(),
            }
        }
        tree.complete();
        trees.push(tree);
    }
    info!("Finished parsing {} newick tree(s).", trees.len());
    Ok(trees)
}

impl Tree {
    fn parse_node_rule(
        &mut self,
        node_rule: Pair<Rule>,
        parent: Option<NodeIdx>,
    ) -> Result<NodeIdx> {
        let node_idx = self.nodes.len();
        let is_leaf = node_rule.as_rule() == Rule::leaf;
        let idx = if is_leaf {
            self.nodes
                .push(Node::new_leaf(node_idx, parent, 0.0, String::new()));
            Leaf(node_idx)
        } else {
            let mut node = Node::new_empty_internal(node_idx);
            node.parent = parent;
            self.nodes.push(node);
            Int(node_idx)
        };
        let mut children = Vec::new();
        for rule in node_rule.into_inner() {
            match rule.as_rule() {
                Rule::label => self.nodes[node_idx].id = Tree::parse_label_rule(rule),
                Rule::branch_length => {
                    let blen = Tree::parse_branch_length_rule(rule)?;
                    if blen < 0.0 {
                        warn!("Negative branch length {} in newick string.", blen);
                    }
                    self.nodes[node_idx].blen = blen;
                }
                Rule::internal | Rule::leaf => {
                    children.push(self.parse_node_rule(rule, Some(idx))?)
                }
                _ => unreachable!(),
            }
        }
        let node = &mut self.nodes[node_idx];
        node.children = children;
        if !is_leaf {
            if let Some(confidence) = node.id.parse::<f64>().ok().filter(|c| c.is_finite()) {
                node.confidence = Some(confidence);
                node.id.clear();
            }
        }
        Ok(idx)
    }

    fn parse_branch_length_rule(rule: Pair<Rule>) -> Result<f64> {
        let span = rule.as_span();
        match rule.as_str().parse::<f64>() {
            Ok(blen) if blen.is_finite() => Ok(blen),
            _ => bail!(ParsingError(Box::new(PestError::new_from_span(
                ErrorVariant::CustomError {
                    message: format!("Branch length {} is not a finite number", span.as_str()),
                },
                span,
            )))),
        }
    }

    fn parse_label_rule(rule: Pair<Rule>) -> String {
        match rule.into_inner().next() {
            Some(label) if label.as_rule() == Rule::quoted_label => {
                let quoted = label.as_str();
                quoted[1..quoted.len() - 1].replace("''", "'")
            }
            Some(label) => label.as_str().to_string(),
            None => String::new(),
        }
    }
}
