use std::fmt::{self, Display};
use std::str::FromStr;

use anyhow::bail;

use crate::distances::DistanceMatrix;
use crate::tree::{NJBuilder, Tree, UpgmaBuilder};
use crate::Result;

/// Constructs a tree over the taxa of a distance matrix.
///
/// Leaves follow the row order of the matrix, so leaf `i` is the taxon of row `i`. Builders
/// leave the rooting flag unset, callers decide how the result is to be interpreted.
pub trait TreeBuilder {
    fn build_tree(&self, distances: &DistanceMatrix) -> Result<Tree>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeMethod {
    Upgma,
    NJ,
}

impl TreeMethod {
    pub fn builder(&self) -> Box<dyn TreeBuilder> {
        match self {
            TreeMethod::Upgma => Box::new(UpgmaBuilder),
            TreeMethod::NJ => Box::new(NJBuilder),
        }
    }
}

impl FromStr for TreeMethod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "UPGMA" => Ok(TreeMethod::Upgma),
            "NJ" => Ok(TreeMethod::NJ),
            _ => bail!("Unknown tree construction method: {}", s),
        }
    }
}

impl Display for TreeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeMethod::Upgma => write!(f, "UPGMA"),
            TreeMethod::NJ => write!(f, "NJ"),
        }
    }
}
