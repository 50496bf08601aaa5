use std::error::Error;
use std::fmt;

/// Input validation failures of distance estimation and tree construction.
///
/// All of them are deterministic properties of the input, so they are reported
/// immediately and never retried.
#[derive(Debug, Clone, PartialEq)]
pub enum PhyloError {
    /// Two sequences share no position where both carry a residue.
    InsufficientOverlap { first: String, second: String },
    /// No taxa were supplied for tree construction.
    EmptyInput,
    /// A sequence does not have the length of the first sequence of the alignment.
    UnequalSequenceLength {
        id: String,
        expected: usize,
        found: usize,
    },
    /// The same taxon id occurs more than once.
    DuplicateTaxon(String),
    /// A distance matrix is not square, symmetric, finite and non-negative with zero diagonal.
    InvalidDistances(String),
}

impl fmt::Display for PhyloError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhyloError::InsufficientOverlap { first, second } => write!(
                f,
                "Sequences {} and {} share no comparable aligned positions",
                first, second
            ),
            PhyloError::EmptyInput => write!(f, "No taxa provided"),
            PhyloError::UnequalSequenceLength {
                id,
                expected,
                found,
            } => write!(
                f,
                "Sequence {} has length {}, expected aligned length {}",
                id, found, expected
            ),
            PhyloError::DuplicateTaxon(id) => write!(f, "Duplicate taxon id {}", id),
            PhyloError::InvalidDistances(reason) => {
                write!(f, "Invalid distance matrix: {}", reason)
            }
        }
    }
}

impl Error for PhyloError {}
