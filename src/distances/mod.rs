use std::fmt::{self, Display};
use std::str::FromStr;

use anyhow::bail;
use approx::abs_diff_eq;
use log::{debug, info};
use nalgebra::DMatrix;

use crate::alignment::Alignment;
use crate::alphabets::is_gap;
use crate::error::PhyloError;
use crate::Result;

pub type Mat = DMatrix<f64>;

// Largest asymmetry tolerated when a matrix is read from outside, e.g. rounded PHYLIP values.
const SYMMETRY_EPSILON: f64 = 1e-9;

/// Symmetric matrix of pairwise distances between taxa, with a zero diagonal.
///
/// Rows and columns follow the order of `taxa`. The matrix is validated on construction
/// and cannot be changed afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    taxa: Vec<String>,
    distances: Mat,
}

impl DistanceMatrix {
    /// Creates a distance matrix from taxon ids and a full square matrix.
    ///
    /// Bails with [`PhyloError::InvalidDistances`] if the matrix is not square, does not match
    /// the number of taxa, has non-zero diagonal entries, negative or non-finite entries, or is
    /// not symmetric. Entries that differ from their mirror by less than 1e-9 are averaged.
    /// Bails with [`PhyloError::DuplicateTaxon`] if a taxon id is repeated.
    ///
    /// # Example
    /// ```
    /// use nalgebra::dmatrix;
    /// use mitophylo::distances::DistanceMatrix;
    /// let mat = DistanceMatrix::new(
    ///     vec!["A".to_string(), "B".to_string()],
    ///     dmatrix![0.0, 0.3; 0.3, 0.0],
    /// )
    /// .unwrap();
    /// assert_eq!(mat.by_ids("B", "A").unwrap(), 0.3);
    /// ```
    pub fn new(taxa: Vec<String>, mut distances: Mat) -> Result<Self> {
        let n = taxa.len();
        if distances.nrows() != n || distances.ncols() != n {
            bail!(PhyloError::InvalidDistances(format!(
                "expected a {n}x{n} matrix, got {}x{}",
                distances.nrows(),
                distances.ncols()
            )));
        }
        for (i, id) in taxa.iter().enumerate() {
            if taxa[..i].contains(id) {
                bail!(PhyloError::DuplicateTaxon(id.clone()));
            }
        }
        for i in 0..n {
            if distances[(i, i)] != 0.0 {
                bail!(PhyloError::InvalidDistances(format!(
                    "non-zero diagonal entry for {}",
                    taxa[i]
                )));
            }
            for j in 0..i {
                let (d_ij, d_ji) = (distances[(i, j)], distances[(j, i)]);
                if !d_ij.is_finite() || !d_ji.is_finite() || d_ij < 0.0 || d_ji < 0.0 {
                    bail!(PhyloError::InvalidDistances(format!(
                        "distance between {} and {} must be finite and non-negative",
                        taxa[i], taxa[j]
                    )));
                }
                if !abs_diff_eq!(d_ij, d_ji, epsilon = SYMMETRY_EPSILON) {
                    bail!(PhyloError::InvalidDistances(format!(
                        "distance between {} and {} is not symmetric",
                        taxa[i], taxa[j]
                    )));
                }
                let d = (d_ij + d_ji) / 2.0;
                distances[(i, j)] = d;
                distances[(j, i)] = d;
            }
        }
        Ok(Self { taxa, distances })
    }

    /// Creates a distance matrix from the strict lower triangle, row `i` holding the `i`
    /// distances to the taxa before it.
    pub fn from_lower_triangle(taxa: Vec<String>, rows: &[Vec<f64>]) -> Result<Self> {
        let n = taxa.len();
        if rows.len() != n {
            bail!(PhyloError::InvalidDistances(format!(
                "expected {n} rows, got {}",
                rows.len()
            )));
        }
        let mut distances = Mat::zeros(n, n);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != i {
                bail!(PhyloError::InvalidDistances(format!(
                    "row {} of the lower triangle must have {} entries, got {}",
                    i,
                    i,
                    row.len()
                )));
            }
            for (j, &d) in row.iter().enumerate() {
                distances[(i, j)] = d;
                distances[(j, i)] = d;
            }
        }
        Self::new(taxa, distances)
    }

    /// Number of taxa.
    pub fn len(&self) -> usize {
        self.taxa.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taxa.is_empty()
    }

    pub fn taxa(&self) -> &[String] {
        &self.taxa
    }

    pub fn matrix(&self) -> &Mat {
        &self.distances
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.distances[(i, j)]
    }

    pub fn idx(&self, id: &str) -> Option<usize> {
        self.taxa.iter().position(|taxon| taxon == id)
    }

    /// Returns the distance between two taxa given by id, bails if either is unknown.
    pub fn by_ids(&self, first: &str, second: &str) -> Result<f64> {
        match (self.idx(first), self.idx(second)) {
            (Some(i), Some(j)) => Ok(self.distances[(i, j)]),
            (None, _) => bail!("No taxon with id {} in the distance matrix", first),
            (_, None) => bail!("No taxon with id {} in the distance matrix", second),
        }
    }
}

impl Display for DistanceMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, id) in self.taxa.iter().enumerate() {
            write!(f, "{}", id)?;
            for j in 0..=i {
                write!(f, "\t{}", self.distances[(i, j)])?;
            }
            writeln!(f)?;
        }
        for id in &self.taxa {
            write!(f, "\t{}", id)?;
        }
        Ok(())
    }
}

/// Pairwise sequence distance under some substitution model.
pub trait DistanceModel {
    fn name(&self) -> &'static str;

    /// Distance between two aligned sequences, `None` if they share no position where
    /// both carry a residue.
    fn distance(&self, x: &[u8], y: &[u8]) -> Option<f64>;
}

/// Proportion of mismatching residues over the columns where neither sequence has a gap.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

/// Identity proportion with the Jukes-Cantor correction for multiple substitutions.
#[derive(Debug, Clone, Copy, Default)]
pub struct JukesCantor;

fn mismatch_proportion(x: &[u8], y: &[u8]) -> Option<f64> {
    debug_assert_eq!(x.len(), y.len());
    let (mismatches, compared) = x
        .iter()
        .zip(y)
        .filter(|&(&a, &b)| !is_gap(a) && !is_gap(b))
        .fold((0usize, 0usize), |(mismatches, compared), (a, b)| {
            (
                mismatches + usize::from(!a.eq_ignore_ascii_case(b)),
                compared + 1,
            )
        });
    if compared == 0 {
        None
    } else {
        Some(mismatches as f64 / compared as f64)
    }
}

impl DistanceModel for Identity {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn distance(&self, x: &[u8], y: &[u8]) -> Option<f64> {
        mismatch_proportion(x, y)
    }
}

impl DistanceModel for JukesCantor {
    fn name(&self) -> &'static str {
        "JC69"
    }

    fn distance(&self, x: &[u8], y: &[u8]) -> Option<f64> {
        mismatch_proportion(x, y).map(|p| {
            let p = f64::min(p, 0.75 - f64::EPSILON);
            // -0.0 for identical sequences
            f64::max(0.0, -3.0 / 4.0 * (1.0 - 4.0 / 3.0 * p).ln())
        })
    }
}

/// Computes the pairwise distances of all taxa of the alignment under `model`.
///
/// Bails with [`PhyloError::InsufficientOverlap`] naming the first pair of taxa without a
/// single column where both have a residue.
///
/// # Example
/// ```
/// use bio::io::fasta::Record;
/// use mitophylo::alignment::Alignment;
/// use mitophylo::distances::{compute_distance_matrix, Identity};
/// let msa = Alignment::new(vec![
///     Record::with_attrs("A", None, b"ACGT"),
///     Record::with_attrs("B", None, b"ACGA"),
///     Record::with_attrs("C", None, b"TC-A"),
/// ])
/// .unwrap();
/// let mat = compute_distance_matrix(&msa, &Identity).unwrap();
/// assert_eq!(mat.by_ids("A", "B").unwrap(), 0.25);
/// assert_eq!(mat.by_ids("B", "C").unwrap(), 1.0 / 3.0);
/// ```
pub fn compute_distance_matrix(
    msa: &Alignment,
    model: &dyn DistanceModel,
) -> Result<DistanceMatrix> {
    info!(
        "Computing {} distances for {} sequences of length {}",
        model.name(),
        msa.len(),
        msa.msa_len()
    );
    let n = msa.len();
    let mut distances = Mat::zeros(n, n);
    for i in 0..n {
        for j in (i + 1)..n {
            let (rec_i, rec_j) = (msa.record(i), msa.record(j));
            let Some(d) = model.distance(rec_i.seq(), rec_j.seq()) else {
                bail!(PhyloError::InsufficientOverlap {
                    first: rec_i.id().to_string(),
                    second: rec_j.id().to_string(),
                });
            };
            distances[(i, j)] = d;
            distances[(j, i)] = d;
        }
    }
    debug!("Distance matrix:{}", distances);
    DistanceMatrix::new(msa.ids(), distances)
}

/// Distance models selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceMethod {
    Identity,
    JC69,
}

impl DistanceMethod {
    pub fn model(&self) -> Box<dyn DistanceModel> {
        match self {
            DistanceMethod::Identity => Box::new(Identity),
            DistanceMethod::JC69 => Box::new(JukesCantor),
        }
    }
}

impl FromStr for DistanceMethod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "IDENTITY" => Ok(DistanceMethod::Identity),
            "JC69" | "JC" => Ok(DistanceMethod::JC69),
            _ => bail!("Unknown distance model: {}", s),
        }
    }
}

impl Display for DistanceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.model().name())
    }
}
