use crate::render::{layout_depths, TreeRenderer};
use crate::tree::{NodeIdx, Tree};

/// Draws a tree as plain text, root on the left and leaves on the right.
///
/// Leaves occupy every other row in preorder, each followed by its label. Branches are drawn
/// with `_`, clades are joined by `|` and `,` marks the top of very short branches.
#[derive(Debug, Clone, Copy)]
pub struct AsciiRenderer {
    pub column_width: usize,
}

impl Default for AsciiRenderer {
    fn default() -> Self {
        Self { column_width: 80 }
    }
}

impl AsciiRenderer {
    pub fn new(column_width: usize) -> Self {
        Self { column_width }
    }

    fn columns(&self, tree: &Tree, drawing_width: usize, fudge_margin: usize) -> Vec<usize> {
        let (depths, max_depth) = layout_depths(tree);
        let cols_per_unit = if max_depth > 0.0 {
            (drawing_width - fudge_margin) as f64 / max_depth
        } else {
            0.0
        };
        depths
            .iter()
            .map(|depth| (depth * cols_per_unit + 1.0) as usize)
            .collect()
    }

    fn rows(tree: &Tree) -> Vec<usize> {
        let mut rows = vec![0; tree.len()];
        let leaves = tree.preorder.iter().filter(|idx| matches!(idx, NodeIdx::Leaf(_)));
        for (i, leaf) in leaves.enumerate() {
            rows[usize::from(leaf)] = 2 * i;
        }
        for node_idx in &tree.postorder {
            let children = tree.children(node_idx);
            if let (Some(first), Some(last)) = (children.first(), children.last()) {
                rows[usize::from(node_idx)] =
                    (rows[usize::from(first)] + rows[usize::from(last)]) / 2;
            }
        }
        rows
    }
}

impl TreeRenderer for AsciiRenderer {
    fn render(&self, tree: &Tree) -> String {
        let labels: Vec<&str> = tree
            .preorder
            .iter()
            .filter(|idx| matches!(idx, NodeIdx::Leaf(_)))
            .map(|idx| tree.node_id(idx))
            .collect();
        let max_label_width = labels.iter().map(|label| label.chars().count()).max().unwrap_or(0);
        let fudge_margin = (labels.len() as f64).log2().ceil().max(0.0) as usize;
        let drawing_width = self
            .column_width
            .saturating_sub(max_label_width + 1)
            .max(fudge_margin + 1);

        let cols = self.columns(tree, drawing_width, fudge_margin);
        let rows = Self::rows(tree);
        let mut canvas = vec![vec![' '; drawing_width + 1]; 2 * labels.len().max(1) - 1];

        let mut stack = vec![(tree.root, 0)];
        while let Some((node_idx, start_col)) = stack.pop() {
            let (col, row) = (cols[usize::from(&node_idx)], rows[usize::from(&node_idx)]);
            for cell in canvas[row].iter_mut().take(col).skip(start_col) {
                *cell = '_';
            }
            let children = tree.children(&node_idx);
            if let (Some(first), Some(last)) = (children.first(), children.last()) {
                let (top_row, bottom_row) = (rows[usize::from(first)], rows[usize::from(last)]);
                for line in &mut canvas[top_row + 1..=bottom_row] {
                    line[col] = '|';
                }
                if cols[usize::from(first)] < col + 2 {
                    canvas[top_row][col] = ',';
                }
                stack.extend(children.iter().rev().map(|child| (*child, col + 1)));
            }
        }

        let mut drawing = String::new();
        for (i, line) in canvas.iter().enumerate() {
            let line: String = line.iter().collect();
            drawing.push_str(line.trim_end());
            if i % 2 == 0 {
                drawing.push(' ');
                drawing.push_str(labels.get(i / 2).copied().unwrap_or_default());
            }
            drawing.push('\n');
        }
        drawing
    }
}
