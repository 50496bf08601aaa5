use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::bail;
use itertools::Itertools;
use log::info;

use crate::distances::{DistanceMatrix, Mat};
use crate::io::{check_not_exists, DataError};
use crate::Result;

// Taxon names are padded to at least this width, as in strict PHYLIP.
const MIN_NAME_WIDTH: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
enum RowShape {
    Square,
    Lower,
    LowerWithDiagonal,
}

impl RowShape {
    fn entries(&self, row: usize, n: usize) -> usize {
        match self {
            RowShape::Square => n,
            RowShape::Lower => row,
            RowShape::LowerWithDiagonal => row + 1,
        }
    }
}

/// Reads a distance matrix in PHYLIP format.
///
/// The first token gives the number of taxa, followed by one line per taxon starting with its
/// name. Full square matrices and lower triangles, with or without the diagonal, are accepted.
///
/// # Example
/// ```
/// use std::path::PathBuf;
/// use mitophylo::io::read_distances_from_file;
/// let mat = read_distances_from_file(&PathBuf::from("./data/distances_square.phy")).unwrap();
/// # assert_eq!(mat.len(), 4);
/// # assert_eq!(mat.by_ids("A", "B").unwrap(), 0.1);
/// ```
pub fn read_distances_from_file(path: &Path) -> Result<DistanceMatrix> {
    info!("Reading distance matrix from file {}", path.display());
    let input = fs::read_to_string(path)?;
    let distances = parse_phylip(&input)?;
    info!("Read distances of {} taxa successfully", distances.len());
    Ok(distances)
}

pub(super) fn parse_phylip(input: &str) -> Result<DistanceMatrix> {
    let mut lines = input.lines().filter(|line| !line.trim().is_empty());
    let Some(n) = lines
        .next()
        .and_then(|line| line.split_whitespace().next())
        .and_then(|token| token.parse::<usize>().ok())
    else {
        bail!(DataError::new(
            "PHYLIP distance file must start with the number of taxa"
        ));
    };
    // the header count is untrusted, bound it by the rows present before allocating
    let rows = lines.clone().count();
    if rows < n {
        bail!(DataError::new(format!(
            "Expected {} taxa in PHYLIP distance file, found {}",
            n, rows
        )));
    }

    let mut taxa = Vec::with_capacity(n);
    let mut distances = Mat::zeros(n, n);
    let mut shape = None;
    for i in 0..n {
        let Some(line) = lines.next() else {
            bail!(DataError::new(format!(
                "Expected {} taxa in PHYLIP distance file, found {}",
                n, i
            )));
        };
        let mut fields = line.split_whitespace();
        let Some(id) = fields.next() else {
            bail!(DataError::new("Missing taxon name in PHYLIP distance file"));
        };
        let values = fields
            .map(|value| {
                value.parse::<f64>().map_err(|_| {
                    DataError::new(format!("Invalid distance {} for taxon {}", value, id))
                })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let row_shape = *shape.get_or_insert(match values.len() {
            0 => RowShape::Lower,
            1 if n > 1 => RowShape::LowerWithDiagonal,
            _ => RowShape::Square,
        });
        if values.len() != row_shape.entries(i, n) {
            bail!(DataError::new(format!(
                "Taxon {} has {} distances, expected {}",
                id,
                values.len(),
                row_shape.entries(i, n)
            )));
        }
        for (j, &d) in values.iter().enumerate() {
            distances[(i, j)] = d;
            if row_shape != RowShape::Square {
                distances[(j, i)] = d;
            }
        }
        taxa.push(id.to_string());
    }
    if lines.next().is_some() {
        bail!(DataError::new(format!(
            "More than {} taxa in PHYLIP distance file",
            n
        )));
    }
    DistanceMatrix::new(taxa, distances)
}

/// Writes a distance matrix as a full square PHYLIP matrix. Will return an error if the file
/// already exists or if a taxon name contains whitespace.
pub fn write_distances_to_file(distances: &DistanceMatrix, path: &Path) -> Result<()> {
    info!("Writing distance matrix to file {}", path.display());
    check_not_exists(path)?;
    let phylip = distances_to_phylip(distances)?;
    let mut writer = File::create(path)?;
    writer.write_all(phylip.as_bytes())?;
    info!("Finished writing successfully");
    Ok(())
}

pub(super) fn distances_to_phylip(distances: &DistanceMatrix) -> Result<String> {
    if let Some(id) = distances
        .taxa()
        .iter()
        .find(|id| id.is_empty() || id.contains(char::is_whitespace))
    {
        bail!(DataError::new(format!(
            "Taxon name '{}' cannot be written to a PHYLIP file",
            id
        )));
    }
    let width = distances
        .taxa()
        .iter()
        .map(|id| id.len())
        .max()
        .unwrap_or_default()
        .max(MIN_NAME_WIDTH);
    let mut phylip = format!("{}\n", distances.len());
    for (i, id) in distances.taxa().iter().enumerate() {
        let row = distances.matrix().row(i).iter().join(" ");
        phylip.push_str(&format!("{id:<width$} {row}\n"));
    }
    Ok(phylip)
}
