//! Record filters applied before classification.
use crate::error::Error;
use crate::genotype::GenotypeRecord;
use crate::motif::{canonical_motif, is_acgt};
use crate::Result;
use log::{info, warn};
use std::collections::HashSet;

/// Row level filters applied before loci are grouped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilters {
    loci: Option<HashSet<String>>,
    canonical_motif: Option<String>,
    min_motif_size: Option<usize>,
    purity: Option<(f64, bool)>,
}

impl RecordFilters {
    /// Filters that keep every record
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps only these locus ids, an empty list keeps everything
    pub fn with_loci<I: IntoIterator<Item = String>>(mut self, loci: I) -> Self {
        let loci = loci.into_iter().collect::<HashSet<_>>();
        self.loci = if loci.is_empty() { None } else { Some(loci) };
        self
    }

    /// Keeps loci whose motif has the same canonical form as `motif`
    pub fn with_motif(mut self, motif: &str) -> Result<Self> {
        let upper = motif.trim().to_ascii_uppercase();
        if !is_acgt(&upper) {
            return Err(Error::InvalidMotif(motif.to_string()));
        }
        self.canonical_motif = Some(canonical_motif(&upper));
        Ok(self)
    }

    /// Keeps motifs of at least `size` bases
    pub fn with_min_motif_size(mut self, size: usize) -> Self {
        self.min_motif_size = Some(size);
        self
    }

    /// Minimum allele purity. Only the last allele is checked unless `both_alleles` is set,
    /// as wanted for recessive modes.
    pub fn with_purity_threshold(mut self, threshold: f64, both_alleles: bool) -> Self {
        self.purity = Some((threshold, both_alleles));
        self
    }

    /// Whether the record passes every configured filter
    pub fn keep(&self, record: &GenotypeRecord) -> bool {
        if let Some(ref loci) = self.loci {
            if !loci.contains(&record.locus_id) {
                return false;
            }
        }
        if let Some(ref motif) = self.canonical_motif {
            if record.canonical_motif.as_ref() != Some(motif) {
                return false;
            }
        }
        if let Some(size) = self.min_motif_size {
            if record.motif.as_ref().map_or(0, |m| m.len()) < size {
                return false;
            }
        }
        if let Some((threshold, both_alleles)) = self.purity {
            let purity = record.allele_purity.as_deref().unwrap_or(".");
            if !passes_purity(purity, threshold, both_alleles) {
                return false;
            }
        }
        true
    }

    /// Drops records failing any filter and reports how many were kept
    pub fn apply(&self, records: Vec<GenotypeRecord>) -> Vec<GenotypeRecord> {
        if *self == Self::default() {
            return records;
        }
        let before = records.len();
        let kept = records
            .into_iter()
            .filter(|record| self.keep(record))
            .collect::<Vec<_>>();
        let loci = kept.iter().map(|r| r.locus_id.as_str()).collect::<HashSet<_>>();
        info!(
            "Kept {} out of {} rows ({} loci) after filtering",
            kept.len(),
            before,
            loci.len()
        );
        kept
    }
}

/// `AllelePurity` holds comma separated per-allele purities, `.` marks a missing value
pub fn passes_purity(purity: &str, threshold: f64, both_alleles: bool) -> bool {
    let passes = |value: &str| {
        value
            .trim()
            .parse::<f64>()
            .map_or(false, |p| p.is_finite() && p >= threshold)
    };
    let values = purity.split(',').collect::<Vec<_>>();
    if both_alleles {
        values.into_iter().all(passes)
    } else {
        values.last().map_or(false, |value| passes(*value))
    }
}

/// Keeps the first record of each (VariantId, SampleId) pair. Records without a VariantId
/// are keyed by their LocusId.
pub fn drop_duplicates(records: Vec<GenotypeRecord>) -> Vec<GenotypeRecord> {
    let before = records.len();
    let mut seen = HashSet::new();
    let kept = records
        .into_iter()
        .filter(|record| {
            let variant_id = record.variant_id.as_ref().unwrap_or(&record.locus_id);
            seen.insert((variant_id.clone(), record.sample_id.clone()))
        })
        .collect::<Vec<_>>();
    if kept.len() < before {
        warn!(
            "Dropped {} duplicate rows based on VariantId and SampleId",
            before - kept.len()
        );
    }
    kept
}

/// Discards records whose VariantId names an adjacent repeat rather than a locus
pub fn drop_unmatched_variant_ids(records: Vec<GenotypeRecord>) -> Vec<GenotypeRecord> {
    let locus_ids = records
        .iter()
        .map(|record| record.locus_id.clone())
        .collect::<HashSet<_>>();
    let is_unmatched = |record: &GenotypeRecord| {
        record
            .variant_id
            .as_ref()
            .map_or(false, |variant_id| !locus_ids.contains(variant_id))
    };

    let mut discarded = records
        .iter()
        .filter(|record| is_unmatched(*record))
        .filter_map(|record| record.variant_id.as_deref())
        .collect::<Vec<_>>();
    if discarded.is_empty() {
        return records;
    }
    discarded.sort_unstable();
    discarded.dedup();
    warn!("Discarding records with VariantIds: {}", discarded.join(", "));

    records
        .into_iter()
        .filter(|record| !is_unmatched(record))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(locus: &str, sample: &str, motif: &str) -> GenotypeRecord {
        GenotypeRecord::new(locus, sample, 10, 20).with_motif(motif)
    }

    #[test]
    fn test_locus_and_motif_filters() {
        let records = vec![
            record("HTT", "s1", "CAG"),
            record("ATXN3", "s1", "CTG"),
            record("FXN", "s1", "GAA"),
        ];
        let filters = RecordFilters::new().with_motif("gca").unwrap();
        let kept = filters.apply(records.clone());
        assert_eq!(kept.len(), 2);

        let filters = RecordFilters::new().with_loci(vec!["FXN".to_string()]);
        assert_eq!(filters.apply(records.clone())[0].locus_id, "FXN");

        assert!(RecordFilters::new().with_motif("CAN").is_err());
        assert_eq!(RecordFilters::new().with_loci(vec![]).apply(records).len(), 3);
    }

    #[test]
    fn test_min_motif_size() {
        let records = vec![record("HTT", "s1", "CAG"), record("RFC1", "s1", "AAGGG")];
        let kept = RecordFilters::new().with_min_motif_size(4).apply(records);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].locus_id, "RFC1");
    }

    #[test]
    fn test_purity() {
        assert!(passes_purity("0.5,0.95", 0.9, false));
        assert!(!passes_purity("0.5,0.95", 0.9, true));
        assert!(passes_purity("0.91,0.95", 0.9, true));
        assert!(!passes_purity("0.99,.", 0.9, false));
        assert!(!passes_purity(".", 0.9, true));

        let mut pure = record("HTT", "s1", "CAG");
        pure.allele_purity = Some("1.0,1.0".to_string());
        let missing = record("HTT", "s2", "CAG");
        let kept = RecordFilters::new()
            .with_purity_threshold(0.8, false)
            .apply(vec![pure, missing]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].sample_id, "s1");
    }

    #[test]
    fn test_drop_duplicates_keeps_first() {
        let mut first = record("HTT", "s1", "CAG");
        first.allele_1_count = 99;
        let records = vec![first, record("HTT", "s1", "CAG"), record("HTT", "s2", "CAG")];
        let kept = drop_duplicates(records);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].allele_1_count, 99);
    }

    #[test]
    fn test_drop_unmatched_variant_ids() {
        let mut adjacent = record("HTT", "s1", "CCG");
        adjacent.variant_id = Some("HTT_CCG".to_string());
        let mut main = record("HTT", "s1", "CAG");
        main.variant_id = Some("HTT".to_string());
        let kept = drop_unmatched_variant_ids(vec![adjacent, main, record("FXN", "s1", "GAA")]);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].motif.as_deref(), Some("CAG"));
    }
}
