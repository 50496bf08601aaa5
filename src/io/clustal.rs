//! Clustal alignment reader.
//!
//! A Clustal file starts with a header line naming the producing program, followed by blocks
//! of `id residues [count]` lines separated by blank lines. Every block lists the sequences
//! in the same order. Lines starting with whitespace mark conserved columns and carry no
//! sequence data.

use std::fs;
use std::path::Path;

use anyhow::bail;
use bio::io::fasta::Record;
use log::info;

use crate::io::{checked_record, DataError};
use crate::Result;

// Programs that write Clustal-formatted alignments.
const KNOWN_HEADERS: [&str; 6] = [
    "CLUSTAL", "MUSCLE", "PROBCONS", "MSAPROBS", "Kalign", "Biopython",
];

pub(super) fn read_clustal(path: &Path) -> Result<Vec<Record>> {
    info!("Reading clustal alignment from file {}", path.display());
    let input = fs::read_to_string(path)?;
    let records = parse_clustal(&input)?;
    info!("Read sequences successfully");
    Ok(records)
}

pub(super) fn parse_clustal(input: &str) -> Result<Vec<Record>> {
    let mut lines = input.lines().skip_while(|line| line.trim().is_empty());
    match lines.next() {
        Some(header) if KNOWN_HEADERS.iter().any(|h| header.starts_with(h)) => {}
        _ => bail!(DataError::new("Missing CLUSTAL header line")),
    }

    let mut ids: Vec<String> = Vec::new();
    let mut residues: Vec<Vec<u8>> = Vec::new();
    let mut first_block = true;
    let mut block_row = 0;
    for line in lines {
        if line.trim().is_empty() {
            if block_row > 0 {
                check_block_size(block_row, ids.len(), first_block)?;
                first_block = false;
                block_row = 0;
            }
            continue;
        }
        if line.starts_with(char::is_whitespace) {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        let (id, fragment) = match fields[..] {
            [id, fragment] => (id, fragment),
            [id, fragment, count] if count.parse::<usize>().is_ok() => (id, fragment),
            _ => bail!(DataError::new(format!(
                "Malformed clustal sequence line: {}",
                line
            ))),
        };
        if first_block {
            ids.push(id.to_string());
            residues.push(fragment.as_bytes().to_vec());
        } else {
            if block_row >= ids.len() || ids[block_row] != id {
                bail!(DataError::new(format!(
                    "Unexpected sequence {} in clustal block, expected the same order as in the first block",
                    id
                )));
            }
            residues[block_row].extend_from_slice(fragment.as_bytes());
        }
        block_row += 1;
    }
    if block_row > 0 {
        check_block_size(block_row, ids.len(), first_block)?;
    }
    if ids.is_empty() {
        bail!(DataError::new("No sequences found in file"));
    }

    ids.iter()
        .zip(residues)
        .map(|(id, seq)| checked_record(id, None, &seq))
        .collect()
}

fn check_block_size(block_rows: usize, n_seqs: usize, first_block: bool) -> Result<()> {
    if !first_block && block_rows != n_seqs {
        bail!(DataError::new(format!(
            "Clustal block with {} sequences, expected {}",
            block_rows, n_seqs
        )));
    }
    Ok(())
}
