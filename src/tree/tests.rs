use approx::assert_relative_eq;
use assert_matches::assert_matches;
use rand::Rng;

use crate::error::PhyloError;
use crate::tree;
use crate::tree::{
    tree_parser::{from_newick, ParsingError},
    Node,
    NodeIdx::{Internal as I, Leaf as L},
    Tree, TreeMethod,
};

fn taxa(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

fn setup_test_tree() -> Tree {
    let mut tree = Tree::new(&taxa(&["A0", "B1", "C2", "D3", "E4"])).unwrap();
    tree.add_parent(5, &L(0), &L(1), 1.0, 1.0);
    tree.add_parent(6, &L(3), &L(4), 1.0, 1.0);
    tree.add_parent(7, &L(2), &I(6), 1.0, 1.0);
    tree.add_parent(8, &I(5), &I(7), 1.0, 1.0);
    tree.complete();
    tree
}

#[test]
fn single_leaf_tree_complete() {
    let tree = Tree::new(&taxa(&["A0"])).unwrap();
    assert!(tree.complete);
    assert_eq!(tree.postorder.len(), 1);
    assert_eq!(tree.preorder.len(), 1);
    assert_eq!(tree.root, L(0));
    assert_eq!(tree.len(), 1);
    assert_eq!(tree.to_newick(), "A0;");
}

#[test]
fn tree_wo_taxa() {
    let res = Tree::new(&[]);
    assert_matches!(
        res.unwrap_err().downcast_ref::<PhyloError>(),
        Some(PhyloError::EmptyInput)
    );
}

#[test]
fn try_idx_by_id() {
    let tree = tree!("(((A:1.0,B:1.0)E:2.0,C:1.0)F:1.0,D:1.0)G:2.0;");
    let nodes = [
        ("A", L(3)),
        ("B", L(4)),
        ("C", L(5)),
        ("D", L(6)),
        ("E", I(2)),
        ("F", I(1)),
        ("G", I(0)),
    ];
    for (id, idx) in nodes.iter() {
        assert_eq!(tree.try_idx(id).unwrap(), *idx);
        assert_eq!(tree.idx(id), *idx);
        assert_eq!(tree.node_id(idx), *id);
    }
    assert!(tree.try_idx("H").is_err());
}

#[test]
#[should_panic]
fn idx_by_id_invalid() {
    let tree = tree!("((A:1.0,B:1.0)E:2.0,C:1.0)F;");
    tree.idx("H");
}

#[test]
fn subroot_preorder() {
    let tree = setup_test_tree();
    assert_eq!(tree.preorder_subroot(&I(5)), [I(5), L(0), L(1)]);
    assert_eq!(tree.preorder_subroot(&I(6)), [I(6), L(3), L(4)]);
    assert_eq!(
        tree.preorder_subroot(&I(7)),
        [I(7), L(2), I(6), L(3), L(4)]
    );
    assert_eq!(
        tree.preorder_subroot(&I(8)),
        [I(8), I(5), L(0), L(1), I(7), L(2), I(6), L(3), L(4)]
    );
    assert_eq!(tree.preorder_subroot(&I(8)), tree.preorder);
}

#[test]
fn postorder() {
    let tree = setup_test_tree();
    assert_eq!(
        tree.postorder,
        [L(0), L(1), I(5), L(2), L(3), L(4), I(6), I(7), I(8)]
    );
}

#[test]
fn parent_child_links() {
    let tree = setup_test_tree();
    assert_eq!(tree.parent(&L(2)), Some(&I(7)));
    assert_eq!(tree.parent(&I(8)), None);
    assert_eq!(tree.children(&I(7)), [L(2), I(6)]);
    assert!(tree.children(&L(0)).is_empty());
    for node in tree.iter() {
        for child in &node.children {
            assert_eq!(tree.node(child).parent, Some(node.idx));
        }
    }
    assert_eq!(tree.leaf_ids(), taxa(&["A0", "B1", "C2", "D3", "E4"]));
    assert_eq!(tree.leaves().len(), 5);
    assert_eq!(tree.internals().len(), 4);
}

#[test]
fn newick_single_correct() {
    let trees = from_newick("(((A:1.0,B:1.0)E:2.0,C:1.0)F:1.0,D:1.0)G:2.0;").unwrap();
    assert_eq!(trees.len(), 1);
    assert_eq!(trees[0].root, I(0));
    let nodes = vec![
        Node::new_internal(0, None, vec![I(1), L(6)], 2.0, "G".to_string()),
        Node::new_internal(1, Some(I(0)), vec![I(2), L(5)], 1.0, "F".to_string()),
        Node::new_internal(2, Some(I(1)), vec![L(3), L(4)], 2.0, "E".to_string()),
        Node::new_leaf(3, Some(I(2)), 1.0, "A".to_string()),
        Node::new_leaf(4, Some(I(2)), 1.0, "B".to_string()),
        Node::new_leaf(5, Some(I(1)), 1.0, "C".to_string()),
        Node::new_leaf(6, Some(I(0)), 1.0, "D".to_string()),
    ];
    assert_eq!(trees[0].nodes, nodes);
    assert_eq!(trees[0].postorder.len(), 7);
    assert_eq!(trees[0].preorder.len(), 7);
    assert_eq!(trees[0].n, 4);
    assert!(!trees[0].is_rooted());
}

#[test]
fn newick_simple_balanced_correct() {
    let trees = from_newick("((A:1.0,B:2.0)E:5.1,(C:3.0,D:4.0)F:6.2)G:7.3;").unwrap();
    assert_eq!(trees.len(), 1);
    assert_eq!(trees[0].root, I(0));
    let nodes = vec![
        Node::new_internal(0, None, vec![I(1), I(4)], 7.3, "G".to_string()),
        Node::new_internal(1, Some(I(0)), vec![L(2), L(3)], 5.1, "E".to_string()),
        Node::new_leaf(2, Some(I(1)), 1.0, "A".to_string()),
        Node::new_leaf(3, Some(I(1)), 2.0, "B".to_string()),
        Node::new_internal(4, Some(I(0)), vec![L(5), L(6)], 6.2, "F".to_string()),
        Node::new_leaf(5, Some(I(4)), 3.0, "C".to_string()),
        Node::new_leaf(6, Some(I(4)), 4.0, "D".to_string()),
    ];
    assert_eq!(trees[0].nodes, nodes);
}

#[test]
fn newick_tiny_correct() {
    let trees = from_newick("A:1.0;").unwrap();
    assert_eq!(trees.len(), 1);
    assert_eq!(trees[0].root, L(0));
    assert_eq!(trees[0].len(), 1);
}

#[test]
fn newick_multiple_correct() {
    let trees = from_newick(
        "((((A:1.0,B:1.0)F:1.0,C:2.0)G:1.0,D:3.0)H:1.0,E:4.0)I:1.0;\
            ((A:1.0,B:2.0)E:5.1,(C:3.0,D:4.0)F:6.2)G:7.3;\
            (A:1.0,(B:1.0,C:1.0)E:2.0)F:1.0;",
    )
    .unwrap();
    assert_eq!(trees.len(), 3);
    assert_eq!(trees[0].leaves().len(), 5);
    assert_eq!(trees[0].internals().len(), 4);
    assert_eq!(trees[1].leaves().len(), 4);
    assert_eq!(trees[1].internals().len(), 3);
    assert_eq!(trees[2].leaves().len(), 3);
    assert_eq!(trees[2].internals().len(), 2);
}

#[test]
fn newick_empty_string_has_no_trees() {
    assert!(from_newick("").unwrap().is_empty());
    assert!(from_newick("  \n ").unwrap().is_empty());
}

#[test]
fn newick_parse_whitespace() {
    let trees = from_newick(
        "     (     (((  (A:1   , B  :   1.0)  \n \n F:1,C:2.0   )G:1,D:3)H:+1.0  ,  E:4)   I:1)\n;\n   ",
    );
    assert!(trees.is_ok());
    let tree0 = &trees.unwrap()[0];
    let tree1 = &from_newick("(((((A:1,B:1)F:1,C:2)G:1,D:3)H:1,E:4)I:1);").unwrap()[0];
    assert_eq!(tree0.nodes, tree1.nodes);
}

#[test]
fn newick_parse_multifurcation() {
    let tree = tree!("((A:1.0,B:1.0)E:1.0,(C:1.0,D:1.0)F:1.0,G:4.0);");
    assert_eq!(tree.root, I(0));
    assert_eq!(tree.children(&tree.root), [I(1), I(4), L(7)]);
    assert_eq!(tree.len(), 8);
    assert_eq!(tree.leaves().len(), 5);
    assert_eq!(tree.internals().len(), 3);
    assert_eq!(tree.postorder.len(), 8);
    assert_eq!(tree.postorder.last(), Some(&I(0)));
    assert_eq!(
        tree.to_newick(),
        "((A:1,B:1)E:1,(C:1,D:1)F:1,G:4);"
    );
}

#[test]
fn newick_parse_phyml_output() {
    let tree = tree!("((Gorilla:0.06683711,(Orangutan:0.21859880,Gibbon:0.31145586):0.06570906):0.03853171,Human:0.05356244,Chimpanzee:0.05417982);");
    assert_eq!(tree.leaves().len(), 5);
    assert_relative_eq!(tree.by_id("Gibbon").blen, 0.31145586);
}

#[test]
fn newick_rooting_tags() {
    let trees = from_newick("[&R] (A:1,B:2);[&U](A:1,B:2);(A:1,B:2);[&r]A;").unwrap();
    assert_eq!(trees.len(), 4);
    assert!(trees[0].is_rooted());
    assert!(!trees[1].is_rooted());
    assert!(!trees[2].is_rooted());
    assert!(trees[3].is_rooted());
}

#[test]
fn newick_comments_skipped() {
    let tree = tree!("[tree 1] (A:1[first],B[&&NHX:S=human]:2)[root comment];");
    assert_eq!(tree.leaf_ids(), vec!["A", "B"]);
    assert_eq!(tree.by_id("B").blen, 2.0);
    assert!(!tree.is_rooted());
}

#[test]
fn newick_quoted_labels() {
    let newick = "('Homo sapiens':0.1,'it''s':0.2,'a:b,(c)':0.3);";
    let tree = tree!(newick);
    assert_eq!(tree.leaf_ids(), vec!["Homo sapiens", "it's", "a:b,(c)"]);
    assert_eq!(tree.to_newick(), newick);
}

#[test]
fn newick_confidence_labels() {
    let newick = "((A:1,B:1)95:0.5,(C:1,D:1)clade:0.5);";
    let tree = tree!(newick);
    let ab = tree.node(&I(1));
    assert_eq!(ab.confidence, Some(95.0));
    assert!(ab.id.is_empty());
    let cd = tree.by_id("clade");
    assert_eq!(cd.confidence, None);
    assert_eq!(tree.to_newick(), newick);
}

fn check_parsing_error(error: anyhow::Error) {
    assert!(error.downcast_ref::<ParsingError>().is_some());
    assert!(error.to_string().contains("Malformed newick string"));
}

#[test]
fn newick_garbage() {
    check_parsing_error(from_newick(";").unwrap_err());
    check_parsing_error(from_newick("()()();").unwrap_err());
    check_parsing_error(from_newick("((A:1.0,B:1.0);").unwrap_err());
    check_parsing_error(from_newick("(:1.0,:2.0)E:5.1;").unwrap_err());
    check_parsing_error(from_newick("(A:1.0,B:1.0)").unwrap_err());
    check_parsing_error(from_newick("(A:abc,B:1.0);").unwrap_err());
}

#[test]
fn newick_rejects_infinite_branch_lengths() {
    let error = from_newick("(A:1e999,B:1.0);").unwrap_err();
    check_parsing_error(error);
    let error = from_newick("((A:1,B:1):-1e400,C:2);").unwrap_err();
    assert!(error.to_string().contains("not a finite number"));
}

#[test]
fn parse_scientific_floats() {
    let tree = tree!(
        "((((A:.00001,B:1.4e-10)F:2.25e3,C:-0.546)G:1.00030000,D:+003.95)H:1.0e-10,E:4.0e0)I:-.005;"
    );
    assert_eq!(tree.by_id("A").blen, 0.00001);
    assert_eq!(tree.by_id("B").blen, 1.4e-10);
    assert_eq!(tree.by_id("C").blen, -0.546);
    assert_eq!(tree.by_id("D").blen, 3.95);
    assert_eq!(tree.by_id("E").blen, 4.0);
    assert_eq!(tree.by_id("F").blen, 2.25e3);
    assert_eq!(tree.by_id("G").blen, 1.0003);
    assert_eq!(tree.by_id("H").blen, 1.0e-10);
    assert_eq!(tree.by_id("I").blen, -0.005);
}

#[test]
fn check_getting_branch_lengths() {
    let tree = tree!("((((A:0.11,B:0.22)F:0.33,C:0.44)G:0.55,D:0.66)H:0.77,E:0.88)I:0.99;");
    let mut lengths = tree.iter().map(|n| n.blen).collect::<Vec<f64>>();
    lengths.sort_by(crate::cmp_f64());
    assert_eq!(
        lengths,
        vec![0.11, 0.22, 0.33, 0.44, 0.55, 0.66, 0.77, 0.88, 0.99]
    );
}

#[test]
fn test_node_idx_from_usize() {
    let r1 = rand::thread_rng().gen_range(1..100);
    assert_eq!(usize::from(&L(r1)), r1);
    let r2 = rand::thread_rng().gen_range(1..100);
    assert_eq!(usize::from(I(r2)), r2);
}

#[test]
fn test_node_idx_display() {
    let r1 = rand::thread_rng().gen_range(1..100);
    assert_eq!(format!("{}", L(r1)), format!("leaf node {}", r1));
    let r2 = rand::thread_rng().gen_range(1..100);
    assert_eq!(format!("{}", I(r2)), format!("internal node {}", r2));
}

#[test]
fn test_node_idx_debug() {
    let r1 = rand::thread_rng().gen_range(1..100);
    assert_eq!(format!("{:?}", L(r1)), format!("Leaf({})", r1));
    let r2 = rand::thread_rng().gen_range(1..100);
    assert_eq!(format!("{:?}", I(r2)), format!("Int({})", r2));
}

#[test]
fn test_node_display() {
    let tree = tree!("((A:1,B:1)E:2,C:3);");
    assert_eq!(format!("{}", tree.by_id("E")), "internal node 1 with id E");
    assert_eq!(format!("{}", tree.node(&I(0))), "internal node 0");
}

#[test]
fn test_to_newick_simple() {
    let mut tree = Tree::new(&taxa(&["A", "B"])).unwrap();
    tree.add_parent(2, &L(0), &L(1), 1.0, 5.5);
    tree.complete();
    assert_eq!(tree.to_newick(), "(A:1,B:5.5);");
    tree.set_rooted(true);
    assert_eq!(tree.to_newick(), "[&R] (A:1,B:5.5);");
    assert_eq!(tree.to_string(), tree.to_newick());
}

#[test]
fn test_from_newick_to_newick() {
    let newick0 = "(((((A:1,B:1)F:1,C:2)G:1,D:3)H:1,E:4)I:1);";
    let newick1 = "(((A:1.5,B:2.3)E:5.1,(C:3.9,D:4.8)F:6.2)G:7.3);";
    let newick2 = "[&R] ((A:1,(B:1,C:1)E:2)F:1);";
    let newick3 = "((A:1,B:1)E:2,C:3)root:0.5;";

    let trees =
        from_newick(format!("{}\n{}\n{}\n{}", newick0, newick1, newick2, newick3).as_str())
            .unwrap();
    assert_eq!(trees[0].to_newick(), newick0);
    assert_eq!(trees[1].to_newick(), newick1);
    assert_eq!(trees[2].to_newick(), newick2);
    assert_eq!(trees[3].to_newick(), newick3);
}

#[test]
fn check_same_trees_after_newick() {
    let newick = "(((A:1.5,B:2.3)E:5.1,(C:3.9,D:4.8)F:6.2)G:7.3);";
    let tree = &from_newick(newick).unwrap()[0];
    let tree2 = &from_newick(&tree.to_newick()).unwrap()[0];
    assert_eq!(tree.nodes, tree2.nodes);
    assert_eq!(tree.root, tree2.root);
}

#[test]
fn depths_and_height() {
    let tree = tree!("((A:1,B:1):2,C:3);");
    assert_eq!(tree.depth(&tree.idx("A")), 3.0);
    assert_eq!(tree.depth(&tree.root), 0.0);
    assert_eq!(tree.depths()[usize::from(tree.idx("C"))], 3.0);
    assert_eq!(tree.height(), 3.0);
    assert!(tree.is_ultrametric(1e-12));

    let tree = tree!("((A:1,B:2):2,C:3);");
    assert_eq!(tree.height(), 4.0);
    assert!(!tree.is_ultrametric(1e-12));
    assert!(tree.is_ultrametric(1.0));

    assert_eq!(tree!("A:1.5;").height(), 0.0);
}

#[test]
fn leaf_counts() {
    let tree = tree!("((A:1,(B:1,C:1)X:1)Y:1,D:1);");
    let counts = tree.leaf_counts();
    assert_eq!(counts[usize::from(tree.root)], 4);
    assert_eq!(counts[usize::from(tree.idx("Y"))], 3);
    assert_eq!(counts[usize::from(tree.idx("X"))], 2);
    assert_eq!(counts[usize::from(tree.idx("D"))], 1);
}

#[test]
fn ladderize_smallest_first() {
    let mut tree = tree!("((A:1,(B:1,C:1):1):1,D:1);");
    tree.ladderize(false);
    assert_eq!(tree.to_newick(), "(D:1,(A:1,(B:1,C:1):1):1);");
    assert_eq!(tree.preorder.len(), tree.len());
    assert_eq!(tree.postorder.last(), Some(&tree.root));
}

#[test]
fn ladderize_largest_first() {
    let mut tree = tree!("(D:1,(A:1,(B:1,C:1):1):1);");
    tree.ladderize(true);
    assert_eq!(tree.to_newick(), "(((B:1,C:1):1,A:1):1,D:1);");
}

#[test]
fn ladderize_keeps_order_of_ties() {
    let mut tree = tree!("((C:1,D:1):1,(A:1,B:1):1);");
    tree.ladderize(true);
    assert_eq!(tree.to_newick(), "((C:1,D:1):1,(A:1,B:1):1);");
    tree.ladderize(false);
    assert_eq!(tree.to_newick(), "((C:1,D:1):1,(A:1,B:1):1);");
}

#[test]
fn same_clades_ignores_child_order() {
    let tree = tree!("((A:1,B:1):2,C:3);");
    assert!(tree.same_clades(&tree!("(C:3,(B:1,A:1):2);"), 1e-12));
    assert!(!tree.same_clades(&tree!("((A:1,C:1):2,B:3);"), 1e-12));
    assert!(!tree.same_clades(&tree!("((A:1,B:1):2.5,C:3);"), 1e-12));
    assert!(!tree.same_clades(&tree!("((A:1,D:1):2,C:3);"), 1e-12));
    assert_eq!(tree.clades().len(), 5);
}

#[test]
fn tree_method_from_str() {
    assert_eq!("upgma".parse::<TreeMethod>().unwrap(), TreeMethod::Upgma);
    assert_eq!("NJ".parse::<TreeMethod>().unwrap(), TreeMethod::NJ);
    assert!("parsimony".parse::<TreeMethod>().is_err());
    assert_eq!(TreeMethod::Upgma.to_string(), "UPGMA");
}
