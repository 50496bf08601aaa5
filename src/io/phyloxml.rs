use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::bail;
use log::{debug, info};
use pest::{iterators::Pair, Parser};
use pest_derive::Parser;

use crate::io::{check_not_exists, DataError};
use crate::tree::{
    Node,
    NodeIdx::{self, Internal as Int, Leaf},
    Tree,
};
use crate::Result;

#[derive(Parser)]
#[grammar = "./io/phyloxml.pest"]
struct XmlParser;

const PHYLOXML_NAMESPACE: &str = "http://www.phyloxml.org";

/// Writes trees as phylogenies of a single PhyloXML document. Will return an error if the file
/// already exists.
///
/// Leaf and internal node names, branch lengths, confidence values and the rooted flag are
/// preserved.
pub fn write_phyloxml_to_file(trees: &[Tree], path: &Path) -> Result<()> {
    info!("Writing PhyloXML trees to file {}", path.display());
    check_not_exists(path)?;
    let mut writer = File::create(path)?;
    writer.write_all(trees_to_phyloxml(trees).as_bytes())?;
    info!("Finished writing successfully");
    Ok(())
}

pub(super) fn trees_to_phyloxml(trees: &[Tree]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!("<phyloxml xmlns=\"{}\">\n", PHYLOXML_NAMESPACE));
    for tree in trees {
        xml.push_str(&format!(
            "  <phylogeny rooted=\"{}\">\n",
            tree.is_rooted()
        ));
        write_clade(tree, &tree.root, 2, &mut xml);
        xml.push_str("  </phylogeny>\n");
    }
    xml.push_str("</phyloxml>\n");
    xml
}

fn write_clade(tree: &Tree, node_idx: &NodeIdx, level: usize, xml: &mut String) {
    let node = tree.node(node_idx);
    let indent = "  ".repeat(level);
    xml.push_str(&format!("{indent}<clade>\n"));
    if !node.id.is_empty() {
        xml.push_str(&format!("{indent}  <name>{}</name>\n", escape_xml(&node.id)));
    }
    if !node.is_root() || node.blen != 0.0 {
        xml.push_str(&format!(
            "{indent}  <branch_length>{}</branch_length>\n",
            node.blen
        ));
    }
    if let Some(confidence) = node.confidence {
        xml.push_str(&format!(
            "{indent}  <confidence type=\"bootstrap\">{}</confidence>\n",
            confidence
        ));
    }
    for child in &node.children {
        write_clade(tree, child, level + 1, xml);
    }
    xml.push_str(&format!("{indent}</clade>\n"));
}

/// Replaces the characters with a special meaning in XML by entity references.
pub(crate) fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn unescape_xml(text: &str) -> Result<String> {
    let mut unescaped = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        unescaped.push_str(&rest[..start]);
        let Some(end) = rest[start..].find(';') else {
            bail!(DataError::new(format!("Unterminated entity in {}", text)));
        };
        let entity = &rest[start + 1..start + end];
        let c = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .map(|hex| u32::from_str_radix(hex, 16))
                .or_else(|| entity.strip_prefix('#').map(|dec| dec.parse::<u32>()))
                .and_then(|code| code.ok())
                .and_then(char::from_u32),
        };
        let Some(c) = c else {
            bail!(DataError::new(format!("Unknown entity &{};", entity)));
        };
        unescaped.push(c);
        rest = &rest[start + end + 1..];
    }
    unescaped.push_str(rest);
    Ok(unescaped)
}

/// Element of a parsed XML document, with namespace prefixes removed from all names.
#[derive(Debug, Default)]
struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlElement>,
    text: String,
}

fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

impl XmlElement {
    fn from_pair(pair: Pair<Rule>) -> Result<Self> {
        let mut element = XmlElement::default();
        for rule in pair.into_inner() {
            match rule.as_rule() {
                Rule::name => element.name = local_name(rule.as_str()).to_string(),
                Rule::attribute => {
                    let mut inner = rule.into_inner();
                    let (Some(name), Some(value)) = (inner.next(), inner.next()) else {
                        unreachable!()
                    };
                    let value = value
                        .into_inner()
                        .next()
                        .map_or("", |value| value.as_str());
                    element
                        .attributes
                        .push((local_name(name.as_str()).to_string(), unescape_xml(value)?));
                }
                Rule::element => element.children.push(XmlElement::from_pair(rule)?),
                Rule::text => element.text.push_str(&unescape_xml(rule.as_str())?),
                Rule::cdata => element
                    .text
                    .push_str(rule.into_inner().next().map_or("", |cdata| cdata.as_str())),
                _ => unreachable!(),
            }
        }
        Ok(element)
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.name == name)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |child| child.name == name)
    }
}

/// Reads all phylogenies of a PhyloXML document.
///
/// Clade names, branch lengths (as element or attribute), the first confidence value of each
/// clade and the `rooted` attribute of each phylogeny are read, other annotations are skipped.
/// Phylogenies without a `rooted` attribute are unrooted.
///
/// # Example
/// ```
/// use std::path::PathBuf;
/// use mitophylo::io::read_phyloxml_from_file;
/// let trees = read_phyloxml_from_file(&PathBuf::from("./data/tree.xml")).unwrap();
/// # assert_eq!(trees.len(), 1);
/// # assert!(trees[0].is_rooted());
/// # assert_eq!(trees[0].leaves().len(), 4);
/// ```
pub fn read_phyloxml_from_file(path: &Path) -> Result<Vec<Tree>> {
    info!("Reading PhyloXML trees from file {}", path.display());
    let xml = fs::read_to_string(path)?;
    let trees = parse_phyloxml(&xml)?;
    if trees.is_empty() {
        bail!(DataError::new(format!(
            "No phylogenies found in file {}",
            path.display()
        )));
    }
    info!("Read {} tree(s) successfully", trees.len());
    Ok(trees)
}

pub(super) fn parse_phyloxml(xml: &str) -> Result<Vec<Tree>> {
    let document = match XmlParser::parse(Rule::document, xml) {
        Ok(mut pairs) => pairs.next(),
        Err(e) => bail!(DataError::new(format!("Malformed PhyloXML document\n{}", e))),
    };
    let Some(root) = document
        .into_iter()
        .flat_map(|document| document.into_inner())
        .find(|pair| pair.as_rule() == Rule::element)
    else {
        bail!(DataError::new("Empty PhyloXML document"));
    };
    let root = XmlElement::from_pair(root)?;
    if root.name != "phyloxml" {
        bail!(DataError::new(format!(
            "Expected a phyloxml root element, found {}",
            root.name
        )));
    }

    let mut trees = Vec::new();
    for phylogeny in root.children_named("phylogeny") {
        let rooted = matches!(phylogeny.attribute("rooted"), Some("true" | "1"));
        let Some(clade) = phylogeny.child("clade") else {
            bail!(DataError::new("Phylogeny without a root clade"));
        };
        let mut tree = Tree::new_empty();
        tree.root = add_clade(&mut tree, clade, None)?;
        tree.set_rooted(rooted);
        tree.complete();
        debug!("Read phylogeny with {} leaves", tree.n);
        trees.push(tree);
    }
    Ok(trees)
}

fn add_clade(tree: &mut Tree, clade: &XmlElement, parent: Option<NodeIdx>) -> Result<NodeIdx> {
    let node_idx = tree.nodes.len();
    let id = clade
        .child("name")
        .map(|name| name.text.trim().to_string())
        .unwrap_or_default();
    let blen = match clade
        .attribute("branch_length")
        .or_else(|| clade.child("branch_length").map(|blen| blen.text.as_str()))
    {
        Some(blen) => parse_number(blen, "branch length")?,
        None => 0.0,
    };
    let confidence = clade
        .child("confidence")
        .map(|confidence| parse_number(&confidence.text, "confidence"))
        .transpose()?;

    let subclades: Vec<&XmlElement> = clade.children_named("clade").collect();
    let idx = if subclades.is_empty() {
        tree.nodes
            .push(Node::new_leaf(node_idx, parent, blen, id));
        Leaf(node_idx)
    } else {
        tree.nodes
            .push(Node::new_internal(node_idx, parent, Vec::new(), blen, id));
        Int(node_idx)
    };
    tree.nodes[node_idx].confidence = confidence;

    let mut children = Vec::with_capacity(subclades.len());
    for subclade in subclades {
        children.push(add_clade(tree, subclade, Some(idx))?);
    }
    tree.nodes[node_idx].children = children;
    Ok(idx)
}

fn parse_number(text: &str, what: &str) -> Result<f64> {
    match text.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => bail!(DataError::new(format!("Invalid {} {}", what, text.trim()))),
    }
}
