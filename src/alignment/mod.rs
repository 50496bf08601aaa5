use anyhow::bail;
use bio::io::fasta::Record;
use hashbrown::HashSet;

use crate::error::PhyloError;
use crate::Result;

/// Multiple sequence alignment: taxa in input order, each with an aligned residue sequence.
///
/// All sequences have the same length and taxon ids are unique; both are checked on
/// construction. Gaps are encoded as [`GAP`](crate::alphabets::GAP).
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    s: Vec<Record>,
    msa_len: usize,
}

impl Alignment {
    /// Creates an alignment from fasta records, keeping their order.
    ///
    /// Bails with [`PhyloError::UnequalSequenceLength`] if a sequence differs in length from
    /// the first one and with [`PhyloError::DuplicateTaxon`] if an id is repeated.
    ///
    /// # Example
    /// ```
    /// use bio::io::fasta::Record;
    /// use mitophylo::alignment::Alignment;
    /// let msa = Alignment::new(vec![
    ///     Record::with_attrs("A", None, b"AC-T"),
    ///     Record::with_attrs("B", None, b"ACGT"),
    /// ])
    /// .unwrap();
    /// assert_eq!(msa.len(), 2);
    /// assert_eq!(msa.msa_len(), 4);
    /// ```
    pub fn new(s: Vec<Record>) -> Result<Alignment> {
        let msa_len = s.first().map_or(0, |rec| rec.seq().len());
        {
            let mut ids = HashSet::with_capacity(s.len());
            for rec in &s {
                if rec.seq().len() != msa_len {
                    bail!(PhyloError::UnequalSequenceLength {
                        id: rec.id().to_string(),
                        expected: msa_len,
                        found: rec.seq().len(),
                    });
                }
                if !ids.insert(rec.id()) {
                    bail!(PhyloError::DuplicateTaxon(rec.id().to_string()));
                }
            }
        }
        Ok(Alignment { s, msa_len })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.s.iter()
    }

    /// Number of taxa.
    pub fn len(&self) -> usize {
        self.s.len()
    }

    pub fn is_empty(&self) -> bool {
        self.s.is_empty()
    }

    /// Number of alignment columns.
    pub fn msa_len(&self) -> usize {
        self.msa_len
    }

    pub fn record(&self, idx: usize) -> &Record {
        &self.s[idx]
    }

    pub fn record_by_id(&self, id: &str) -> Option<&Record> {
        self.s.iter().find(|rec| rec.id() == id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.s.iter().map(|rec| rec.id().to_string()).collect()
    }

    pub fn records(&self) -> &[Record] {
        &self.s
    }
}
