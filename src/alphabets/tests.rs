use rstest::*;

use crate::alphabets::{
    dna_alphabet, normalise_residues, protein_alphabet, sequence_type, SequenceType, GAP,
};
use crate::record_wo_desc as record;

#[rstest]
#[case::plain(b"ACGT-", true)]
#[case::lowercase(b"acgt", true)]
#[case::ambiguous(b"NNRY", true)]
#[case::protein(b"MKLV", false)]
#[case::digit(b"AC1T", false)]
fn dna_words(#[case] word: &[u8], #[case] valid: bool) {
    assert_eq!(dna_alphabet().is_word(word), valid);
}

#[rstest]
#[case::protein(b"MKLVW-", true)]
#[case::dna(b"ACGT", true)]
#[case::stop_codon_as_gap(b"MK*", false)]
#[case::space(b"MK V", false)]
fn protein_words(#[case] word: &[u8], #[case] valid: bool) {
    assert_eq!(protein_alphabet().is_word(word), valid);
}

#[test]
fn gaps_are_normalised() {
    assert_eq!(normalise_residues(b"a_c*g.t-"), b"A-C-G-T-".to_vec());
    assert!(normalise_residues(b"_*.-").iter().all(|&c| c == GAP));
}

#[test]
fn detect_sequence_type() {
    let dna = vec![record!("A", b"ACGT-"), record!("B", b"ACNT-")];
    assert_eq!(sequence_type(&dna), SequenceType::DNA);
    let protein = vec![record!("A", b"ACGT-"), record!("B", b"MKLVE")];
    assert_eq!(sequence_type(&protein), SequenceType::Protein);
    assert_eq!(SequenceType::Protein.to_string(), "protein");
}
