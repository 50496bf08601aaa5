use std::fmt::Display;

use bio::alphabets::Alphabet;
use bio::io::fasta::Record;

pub static AMINOACIDS: &[u8] = b"ARNDCQEGHILKMFPSTWYV";
pub static AMB_AMINOACIDS: &[u8] = b"BJZXUO";
pub static NUCLEOTIDES: &[u8] = b"TCAG";
pub static AMB_NUCLEOTIDES: &[u8] = b"RYSWKMBDHVNU";

pub static GAP: u8 = b'-';
/// Characters used as gap symbols by common aligners, all mapped to [`GAP`] on input.
pub static POSSIBLE_GAPS: &[u8] = b"-_*.";

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SequenceType {
    DNA,
    Protein,
}

impl Display for SequenceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SequenceType::DNA => write!(f, "DNA"),
            SequenceType::Protein => write!(f, "protein"),
        }
    }
}

fn alphabet_with_gap(symbols: &[u8], ambiguous: &[u8]) -> Alphabet {
    let mut chars = symbols.to_vec();
    chars.extend_from_slice(ambiguous);
    let lowercase = chars.to_ascii_lowercase();
    chars.extend(lowercase);
    chars.push(GAP);
    Alphabet::new(chars)
}

pub fn dna_alphabet() -> Alphabet {
    alphabet_with_gap(NUCLEOTIDES, AMB_NUCLEOTIDES)
}

/// Protein alphabet including ambiguity codes and the gap. Since it is a superset of
/// the nucleotide codes it is also used to validate arbitrary alignments.
pub fn protein_alphabet() -> Alphabet {
    alphabet_with_gap(AMINOACIDS, AMB_AMINOACIDS)
}

pub fn is_gap(char: u8) -> bool {
    char == GAP
}

/// Maps every accepted gap symbol to [`GAP`] and upper-cases residues.
pub fn normalise_residues(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .map(|c| {
            if POSSIBLE_GAPS.contains(c) {
                GAP
            } else {
                c.to_ascii_uppercase()
            }
        })
        .collect()
}

pub fn sequence_type(sequences: &[Record]) -> SequenceType {
    let dna_alphabet = dna_alphabet();
    if sequences
        .iter()
        .all(|record| dna_alphabet.is_word(record.seq()))
    {
        SequenceType::DNA
    } else {
        SequenceType::Protein
    }
}

#[cfg(test)]
#[cfg_attr(coverage, coverage(off))]
mod tests;
