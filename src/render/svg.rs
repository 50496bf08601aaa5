use crate::io::escape_xml;
use crate::render::{layout_depths, TreeRenderer};
use crate::tree::{NodeIdx, Tree};

const MARGIN: f64 = 20.0;
const SCALE_BAR_SPACE: f64 = 40.0;
// Rough advance of one character relative to the font size.
const CHAR_WIDTH: f64 = 0.6;

/// Draws a rectangular phylogram as an SVG image.
///
/// Branch lengths run horizontally from the root on the left, leaves are spread evenly from
/// top to bottom and labelled on the right. Internal nodes with a confidence value carry it
/// above their branch, and a scale bar shows a round branch length below the tree.
#[derive(Debug, Clone, Copy)]
pub struct SvgRenderer {
    pub width: f64,
    pub min_height: f64,
    pub row_height: f64,
    pub font_size: f64,
}

impl Default for SvgRenderer {
    fn default() -> Self {
        Self {
            width: 1300.0,
            min_height: 500.0,
            row_height: 20.0,
            font_size: 12.0,
        }
    }
}

/// Largest length of the form 1, 2 or 5 times a power of ten that is at most `target`.
fn scale_bar_length(target: f64) -> (f64, usize) {
    let exponent = target.log10().floor() as i32;
    let magnitude = 10f64.powi(exponent);
    let length = [5.0, 2.0, 1.0]
        .into_iter()
        .map(|m| m * magnitude)
        .find(|&length| length <= target * (1.0 + 1e-9))
        .unwrap_or(magnitude);
    (length, exponent.min(0).unsigned_abs() as usize)
}

impl SvgRenderer {
    fn height(&self, n_leaves: usize) -> f64 {
        f64::max(
            self.min_height,
            2.0 * MARGIN + SCALE_BAR_SPACE + n_leaves as f64 * self.row_height,
        )
    }
}

impl TreeRenderer for SvgRenderer {
    fn render(&self, tree: &Tree) -> String {
        let leaves: Vec<&NodeIdx> = tree
            .preorder
            .iter()
            .filter(|idx| matches!(idx, NodeIdx::Leaf(_)))
            .collect();
        let height = self.height(leaves.len());
        let max_label = leaves
            .iter()
            .map(|idx| tree.node_id(idx).chars().count())
            .max()
            .unwrap_or(0);
        let label_space = max_label as f64 * self.font_size * CHAR_WIDTH + 10.0;
        let plot_width = f64::max(self.width - 2.0 * MARGIN - label_space, 1.0);

        let (depths, max_depth) = layout_depths(tree);
        let scale = if max_depth > 0.0 {
            plot_width / max_depth
        } else {
            0.0
        };
        let x: Vec<f64> = depths.iter().map(|depth| MARGIN + depth * scale).collect();

        let row_spacing = (height - 2.0 * MARGIN - SCALE_BAR_SPACE) / leaves.len() as f64;
        let mut y = vec![0.0; tree.len()];
        for (i, leaf) in leaves.iter().enumerate() {
            y[usize::from(*leaf)] = MARGIN + (i as f64 + 0.5) * row_spacing;
        }
        for node_idx in &tree.postorder {
            let children = tree.children(node_idx);
            if let (Some(first), Some(last)) = (children.first(), children.last()) {
                y[usize::from(node_idx)] = (y[usize::from(first)] + y[usize::from(last)]) / 2.0;
            }
        }

        let mut svg = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n",
            w = self.width,
            h = height
        );
        svg.push_str("<rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");

        svg.push_str("<g stroke=\"black\" stroke-width=\"1\" stroke-linecap=\"square\">\n");
        for node_idx in &tree.preorder {
            let i = usize::from(node_idx);
            if let Some(parent) = tree.parent(node_idx) {
                svg.push_str(&line(x[usize::from(parent)], y[i], x[i], y[i]));
            }
            let children = tree.children(node_idx);
            if let (Some(first), Some(last)) = (children.first(), children.last()) {
                svg.push_str(&line(x[i], y[usize::from(first)], x[i], y[usize::from(last)]));
            }
        }
        svg.push_str("</g>\n");

        svg.push_str(&format!(
            "<g font-family=\"sans-serif\" font-size=\"{}\" fill=\"black\">\n",
            self.font_size
        ));
        for leaf in &leaves {
            let i = usize::from(*leaf);
            svg.push_str(&text(
                x[i] + 5.0,
                y[i] + self.font_size / 3.0,
                "start",
                tree.node_id(leaf),
            ));
        }
        for node in tree.internals() {
            if let (Some(confidence), Some(parent)) = (node.confidence, &node.parent) {
                let i = usize::from(&node.idx);
                let label = confidence.to_string();
                svg.push_str(&text(
                    (x[usize::from(parent)] + x[i]) / 2.0,
                    y[i] - 3.0,
                    "middle",
                    &label,
                ));
            }
        }

        if scale > 0.0 {
            let (length, decimals) = scale_bar_length(max_depth / 5.0);
            let bar_y = height - MARGIN - SCALE_BAR_SPACE / 2.0;
            let bar_end = MARGIN + length * scale;
            svg.push_str(&format!(
                "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"black\" stroke-width=\"2\"/>\n",
                MARGIN, bar_y, bar_end, bar_y
            ));
            svg.push_str(&text(
                (MARGIN + bar_end) / 2.0,
                bar_y + self.font_size + 4.0,
                "middle",
                &format!("{:.*}", decimals, length),
            ));
        }
        svg.push_str("</g>\n</svg>\n");
        svg
    }
}

fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> String {
    format!(
        "<line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\"/>\n",
        x1, y1, x2, y2
    )
}

fn text(x: f64, y: f64, anchor: &str, content: &str) -> String {
    format!(
        "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"{}\">{}</text>\n",
        x,
        y,
        anchor,
        escape_xml(content)
    )
}
