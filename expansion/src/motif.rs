//! Repeat unit helpers.
use bio::alphabets::dna;

/// Returns the strand and rotation independent representation of a repeat unit: the
/// lexicographically smallest rotation of either the motif or its reverse complement.
pub fn canonical_motif(motif: &str) -> String {
    let motif = motif.trim().to_ascii_uppercase();
    if motif.is_empty() {
        return motif;
    }

    let forward = motif.as_bytes().to_vec();
    let reverse = dna::revcomp(motif.as_bytes());

    let mut canonical = forward.clone();
    for seq in [forward, reverse].iter() {
        for shift in 1..seq.len() + 1 {
            let rotation = [&seq[shift..], &seq[..shift]].concat();
            if rotation < canonical {
                canonical = rotation;
            }
        }
    }

    String::from_utf8_lossy(&canonical).into_owned()
}

/// Checks the motif only contains uppercase `A`, `C`, `G` and `T`
pub fn is_acgt(motif: &str) -> bool {
    !motif.is_empty()
        && motif
            .bytes()
            .all(|nuc| matches!(nuc, b'A' | b'C' | b'G' | b'T'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotations_and_reverse_complements_collapse() {
        let expected = canonical_motif("CAG");
        for motif in &["CAG", "AGC", "GCA", "CTG", "TGC", "GCT", "cag"] {
            assert_eq!(canonical_motif(motif), expected);
        }
        assert_eq!(expected, "AGC");
    }

    #[test]
    fn test_ccg_family() {
        for motif in &["CCG", "CGC", "GCC", "CGG", "GGC", "GCG"] {
            assert_eq!(canonical_motif(motif), "CCG");
        }
    }

    #[test]
    fn test_longer_motifs() {
        assert_eq!(canonical_motif("AAGGG"), canonical_motif("CCCTT"));
        assert_eq!(canonical_motif("GAA"), "AAG");
        assert_eq!(canonical_motif(""), "");
    }

    #[test]
    fn test_is_acgt() {
        assert!(is_acgt("CAG"));
        assert!(!is_acgt("CAN"));
        assert!(!is_acgt("cag"));
        assert!(!is_acgt(""));
    }
}
