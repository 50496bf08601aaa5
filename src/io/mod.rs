use std::error::Error;
use std::fmt::{self, Display};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use anyhow::bail;
use bio::io::fasta::{Reader, Record};
use log::info;

use crate::alignment::Alignment;
use crate::alphabets::{normalise_residues, protein_alphabet};
use crate::tree::{tree_parser, Tree};
use crate::Result;

mod clustal;
mod phylip;
mod phyloxml;

pub use phylip::{read_distances_from_file, write_distances_to_file};
pub(crate) use phyloxml::escape_xml;
pub use phyloxml::{read_phyloxml_from_file, write_phyloxml_to_file};

/// Malformed or unusable input and output files.
pub struct DataError {
    pub(crate) message: String,
}

impl DataError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Debug for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for DataError {}

/// Supported alignment file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignmentFormat {
    Fasta,
    Clustal,
}

impl AlignmentFormat {
    /// Guesses the format from the file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "aln" | "clustal" | "clw" => Some(AlignmentFormat::Clustal),
            "fasta" | "fas" | "fa" | "fna" | "faa" | "afa" | "mfa" => Some(AlignmentFormat::Fasta),
            _ => None,
        }
    }
}

impl FromStr for AlignmentFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fasta" | "fa" => Ok(AlignmentFormat::Fasta),
            "clustal" | "aln" => Ok(AlignmentFormat::Clustal),
            _ => bail!("Unknown alignment format: {}", s),
        }
    }
}

impl Display for AlignmentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlignmentFormat::Fasta => write!(f, "fasta"),
            AlignmentFormat::Clustal => write!(f, "clustal"),
        }
    }
}

/// Reads a multiple sequence alignment in the given format, or in the format implied by the
/// file extension if `format` is `None`.
///
/// Residues are upper-cased and all gap symbols are converted to `-`.
///
/// # Example
/// ```
/// use std::path::PathBuf;
/// use mitophylo::io::read_alignment;
/// let msa = read_alignment(&PathBuf::from("./data/sharks_small.aln"), None).unwrap();
/// # assert_eq!(msa.len(), 6);
/// # assert_eq!(msa.msa_len(), 120);
/// ```
pub fn read_alignment(path: &Path, format: Option<AlignmentFormat>) -> Result<Alignment> {
    let Some(format) = format.or_else(|| AlignmentFormat::from_path(path)) else {
        bail!(DataError::new(format!(
            "Cannot determine the alignment format of {}, please specify it",
            path.display()
        )));
    };
    let records = match format {
        AlignmentFormat::Fasta => read_sequences(path)?,
        AlignmentFormat::Clustal => clustal::read_clustal(path)?,
    };
    let msa = Alignment::new(records)?;
    info!(
        "Read alignment of {} sequences with {} columns",
        msa.len(),
        msa.msa_len()
    );
    Ok(msa)
}

/// Reads sequences from a fasta file, returning a vector of fasta records.
/// All sequences are converted to uppercase.
///
/// # Arguments
/// * `path` - Path to the fasta file.
///
/// # Example
/// ```
/// use mitophylo::io::read_sequences;
/// use std::path::PathBuf;
/// let records = read_sequences(&PathBuf::from("./data/sequences_DNA_small.fasta")).unwrap();
/// # assert_eq!(records.len(), 4);
/// # for rec in records {
/// #    assert_eq!(rec.seq().len(), 8);
/// #    assert_eq!(rec.seq(), rec.seq().to_ascii_uppercase());
/// # }
/// ```
pub fn read_sequences(path: &Path) -> Result<Vec<Record>> {
    info!("Reading sequences from file {}", path.display());
    let reader = Reader::from_file(path)?;
    let mut sequences = Vec::new();

    for result in reader.records() {
        let rec = result?;
        if let Err(e) = rec.check() {
            bail!(DataError::new(e.to_string()));
        }
        sequences.push(checked_record(rec.id(), rec.desc(), rec.seq())?);
    }
    if sequences.is_empty() {
        bail!(DataError::new("No sequences found in file"));
    }

    info!("Read sequences successfully");
    Ok(sequences)
}

fn checked_record(id: &str, desc: Option<&str>, seq: &[u8]) -> Result<Record> {
    let seq = normalise_residues(seq);
    if !protein_alphabet().is_word(&seq) {
        bail!(DataError::new(format!(
            "Invalid genetic sequence encountered for {}: {}",
            id,
            String::from_utf8_lossy(&seq)
        )));
    }
    Ok(Record::with_attrs(id, desc, &seq))
}

pub(crate) fn check_not_exists(path: &Path) -> Result<()> {
    if path.exists() {
        bail!(DataError::new(format!(
            "File {} already exists",
            path.display()
        )));
    }
    Ok(())
}

/// Reads newick trees from a file, returning a vector of trees.
///
/// # Arguments
/// * `path` - Path to the newick file.
///
/// # Example
/// ```
/// use mitophylo::io::read_newick_from_file;
/// use std::path::PathBuf;
/// let trees = read_newick_from_file(&PathBuf::from("./data/tree.newick")).unwrap();
/// # assert_eq!(trees.len(), 1);
/// # assert_eq!(trees[0].leaves().len(), 4);
/// ```
pub fn read_newick_from_file(path: &Path) -> Result<Vec<Tree>> {
    info!("Reading newick trees from file {}", path.display());
    let newick = fs::read_to_string(path)?;
    info!("Read file successfully");
    let trees = tree_parser::from_newick(&newick)?;
    if trees.is_empty() {
        bail!(DataError::new(format!(
            "No trees found in file {}",
            path.display()
        )));
    }
    Ok(trees)
}

/// Writes newick trees to the given file path, one per line. Will return an error if the file
/// already exists.
///
/// # Arguments
/// * `trees` - Trees to write.
/// * `path` - Path to the newick file.
pub fn write_newick_to_file(trees: &[Tree], path: &Path) -> Result<()> {
    info!("Writing newick trees to file {}", path.display());
    check_not_exists(path)?;
    let mut writer = File::create(path)?;
    for tree in trees {
        writer.write_all(tree.to_newick().as_bytes())?;
        writer.write_all(b"\n")?;
    }
    info!("Finished writing successfully");
    Ok(())
}
