#[macro_export]
macro_rules! record_wo_desc {
    ($e1:expr,$e2:expr) => {{
        use bio::io::fasta::Record;
        Record::with_attrs($e1, None, $e2)
    }};
}

#[macro_export]
macro_rules! record {
    ($e1:expr,$e2:expr,$e3:expr) => {{
        use bio::io::fasta::Record;
        Record::with_attrs($e1, $e2, $e3)
    }};
}

#[macro_export]
macro_rules! tree {
    ($e:expr) => {{
        use $crate::tree::tree_parser::from_newick;
        from_newick($e).unwrap().pop().unwrap()
    }};
}

/// Builds a validated [`DistanceMatrix`](crate::distances::DistanceMatrix) from taxon ids and
/// the rows of the full square matrix. Panics on invalid input, so it is meant for tests and
/// doc examples.
#[macro_export]
macro_rules! dist_matrix {
    ([$($id:expr),* $(,)?]; $($($x:expr),+);+ $(;)?) => {{
        use $crate::distances::DistanceMatrix;
        let ids: Vec<String> = vec![$(String::from($id)),*];
        let n = ids.len();
        let values: Vec<f64> = vec![$($($x as f64),+),+];
        DistanceMatrix::new(ids, nalgebra::DMatrix::from_row_slice(n, n, &values)).unwrap()
    }};
}

#[cfg(test)]
#[cfg_attr(coverage, coverage(off))]
mod tests {
    #[test]
    fn test_record_macro() {
        let record = record!("seq1", Some("description"), b"ATCG");
        assert_eq!(record.id(), "seq1");
        assert_eq!(record.desc(), Some("description"));
        assert_eq!(record.seq(), b"ATCG");

        let record = record!("seq2", None, b"TTTT");
        assert_eq!(record.id(), "seq2");
        assert_eq!(record.desc(), None);
    }

    #[test]
    fn test_record_wo_desc_macro() {
        let id = "test_seq";
        let seq = b"AAAA";
        let record = record_wo_desc!(id, seq);
        assert_eq!(record.id(), id);
        assert_eq!(record.seq(), seq);
        assert_eq!(record.desc(), None);
    }

    #[test]
    fn test_tree_macro() {
        let tree = tree!("(A,B);");
        assert_eq!(tree.leaves().len(), 2);

        let tree = tree!("((A,B),(C,D));");
        assert_eq!(tree.leaves().len(), 4);
        assert_eq!(tree.len(), 7);
    }

    #[test]
    fn test_dist_matrix_macro() {
        let mat = dist_matrix!(["A", "B"]; 0.0, 0.5; 0.5, 0.0);
        assert_eq!(mat.len(), 2);
        assert_eq!(mat.get(0, 1), 0.5);
        assert_eq!(mat.get(1, 1), 0.0);
    }
}
