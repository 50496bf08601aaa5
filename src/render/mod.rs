use std::fs::File;
use std::io::Write;
use std::path::Path;

use log::info;

use crate::f64_h;
use crate::io::check_not_exists;
use crate::tree::Tree;
use crate::Result;

mod ascii;
mod svg;

pub use ascii::AsciiRenderer;
pub use svg::SvgRenderer;

/// Turns a tree into a drawing.
pub trait TreeRenderer {
    fn render(&self, tree: &Tree) -> String;
}

/// Renders the tree and writes the drawing to the given path. Will return an error if the file
/// already exists.
pub fn write_rendering_to_file(
    renderer: &dyn TreeRenderer,
    tree: &Tree,
    path: &Path,
) -> Result<()> {
    info!("Writing tree drawing to file {}", path.display());
    check_not_exists(path)?;
    let mut writer = File::create(path)?;
    writer.write_all(renderer.render(tree).as_bytes())?;
    info!("Finished writing successfully");
    Ok(())
}

/// Horizontal positions of all nodes as distances from the root, indexed like `tree.nodes`,
/// together with the largest of them.
///
/// Trees without any branch lengths are laid out with unit branch lengths instead.
pub(crate) fn layout_depths(tree: &Tree) -> (Vec<f64>, f64) {
    let depths = tree.depths();
    let max_depth = deepest(&depths);
    if max_depth > 0.0 {
        return (depths, max_depth);
    }
    let mut depths = vec![0.0; tree.len()];
    for node_idx in &tree.preorder {
        if let Some(parent) = tree.parent(node_idx) {
            depths[usize::from(node_idx)] = depths[usize::from(parent)] + 1.0;
        }
    }
    let max_depth = deepest(&depths);
    (depths, max_depth)
}

fn deepest(depths: &[f64]) -> f64 {
    depths
        .iter()
        .map(|&depth| f64_h::from(depth))
        .max()
        .map_or(0.0, |depth| depth.into_inner())
}
