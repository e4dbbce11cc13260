//! Threshold based admission.
use crate::genotype::{summarize, AlleleMetric, GenotypeRecord, InheritanceMode, Summary};
use crate::strata::{Stratum, StratumKind};
use log::debug;

/// Admits records whose alleles reach a threshold under the combination rule of the
/// inheritance mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdClassifier {
    threshold: u32,
    metric: AlleleMetric,
    mode: InheritanceMode,
    max_rows: usize,
}

impl ThresholdClassifier {
    /// Classifier for one locus and mode
    pub fn new(threshold: u32, metric: AlleleMetric, mode: InheritanceMode, max_rows: usize) -> Self {
        Self {
            threshold,
            metric,
            mode,
            max_rows,
        }
    }

    /// Admission threshold
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Hemizygous records need their single allele at the threshold, where a zero allele
    /// counts as a missing call and falls back to the other one. Diploid records need both
    /// alleles there under recessive modes and either one under dominant modes. A missing
    /// allele never satisfies the recessive rule.
    pub fn admits(&self, record: &GenotypeRecord, kind: StratumKind) -> bool {
        let [allele_1, allele_2] = record.alleles(self.metric);
        let reaches = |allele: Option<u32>| allele.map_or(false, |size| size >= self.threshold);
        if kind.arity() == 1 {
            summarize(allele_1, allele_2, Summary::Max).map_or(false, |size| size >= self.threshold)
        } else if self.mode.is_recessive() {
            reaches(allele_1) && reaches(allele_2)
        } else {
            reaches(allele_1) || reaches(allele_2)
        }
    }

    /// Admitted records of the stratum in rank order, capped at `max_rows`
    pub fn classify(&self, stratum: &Stratum) -> Vec<GenotypeRecord> {
        let admitted = stratum
            .records
            .iter()
            .filter(|record| self.admits(record, stratum.kind))
            .take(self.max_rows)
            .cloned()
            .collect::<Vec<_>>();
        debug!(
            "{} of {} {} records reach {} repeats under {}",
            admitted.len(),
            stratum.records.len(),
            stratum.kind,
            self.threshold,
            self.mode
        );
        admitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stratum(kind: StratumKind, alleles: &[(u32, u32)]) -> Stratum {
        let records = alleles
            .iter()
            .enumerate()
            .map(|(i, (a1, a2))| GenotypeRecord::new("L".to_string(), format!("s{}", i), *a1, *a2))
            .collect();
        Stratum::new(kind, records)
    }

    fn classifier(threshold: u32, mode: InheritanceMode) -> ThresholdClassifier {
        ThresholdClassifier::new(threshold, AlleleMetric::RepeatCount, mode, usize::MAX)
    }

    #[test]
    fn test_recessive_needs_both_alleles() {
        let diploid = stratum(StratumKind::Unsplit, &[(5, 50)]);
        assert!(classifier(20, InheritanceMode::AR).classify(&diploid).is_empty());
        assert_eq!(classifier(20, InheritanceMode::AD).classify(&diploid).len(), 1);

        let diploid = stratum(StratumKind::Diploid, &[(5, 50), (25, 30)]);
        assert_eq!(classifier(20, InheritanceMode::XR).classify(&diploid).len(), 1);
        assert_eq!(classifier(20, InheritanceMode::XD).classify(&diploid).len(), 2);
    }

    #[test]
    fn test_hemizygous_single_allele() {
        let hemizygous = stratum(StratumKind::Hemizygous, &[(0, 40), (30, 0), (12, 0)]);
        let admitted = classifier(30, InheritanceMode::XR).classify(&hemizygous);
        assert_eq!(admitted.len(), 2);
    }

    #[test]
    fn test_threshold_monotonicity() {
        let alleles = [(5, 50), (10, 10), (36, 40), (0, 70), (22, 23), (60, 61)];
        for mode in &[InheritanceMode::AD, InheritanceMode::AR] {
            for kind in &[StratumKind::Unsplit, StratumKind::Hemizygous] {
                let stratum = stratum(*kind, &alleles);
                for t1 in 0..80 {
                    let low = classifier(t1, *mode).classify(&stratum);
                    let high = classifier(t1 + 1, *mode).classify(&stratum);
                    assert!(high.len() <= low.len());
                    assert!(high.iter().all(|r| low.contains(r)));
                }
            }
        }
    }

    #[test]
    fn test_max_rows_cap() {
        let unsplit = stratum(StratumKind::Unsplit, &[(40, 40), (41, 41), (42, 42)]);
        let capped = ThresholdClassifier::new(20, AlleleMetric::RepeatCount, InheritanceMode::AD, 2);
        let admitted = capped.classify(&unsplit);
        assert_eq!(admitted.len(), 2);
        assert_eq!(admitted[0].sample_id, "s0");
    }

    #[test]
    fn test_ci_end_metric() {
        let record = GenotypeRecord::new("L", "s", 10, 10).with_ci_ends(Some(12), Some(13));
        let classifier = ThresholdClassifier::new(12, AlleleMetric::CiEnd, InheritanceMode::AR, 10);
        assert!(classifier.admits(&record, StratumKind::Unsplit));
        let record = GenotypeRecord::new("L", "s", 10, 10).with_ci_ends(Some(30), None);
        assert!(!classifier.admits(&record, StratumKind::Unsplit));
        let record = GenotypeRecord::new("L", "s", 10, 10);
        assert!(!classifier.admits(&record, StratumKind::Unsplit));
    }

    #[test]
    fn test_recessive_single_expanded_allele() {
        let ar = classifier(20, InheritanceMode::AR);
        assert!(!ar.admits(&GenotypeRecord::new("L", "s", 0, 50), StratumKind::Unsplit));
        assert!(ar.admits(&GenotypeRecord::new("L", "s", 20, 50), StratumKind::Unsplit));

        let female = GenotypeRecord::new("L", "f", 60, 0).with_sex(crate::genotype::Sex::Female);
        let xr = classifier(40, InheritanceMode::XR);
        assert!(!xr.admits(&female, StratumKind::Diploid));
        assert!(xr.admits(&female, StratumKind::Hemizygous));
        assert!(classifier(40, InheritanceMode::XD).admits(&female, StratumKind::Diploid));
    }
}
