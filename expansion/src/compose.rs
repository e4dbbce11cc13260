//! Result rows, per-locus outcomes and the final table.
use crate::genotype::{GenotypeRecord, InheritanceMode};
use crate::strata::StratumKind;
use log::debug;
use std::collections::HashSet;
use std::fmt;

/// Label of a synthetic threshold row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    /// Smallest `NormalMax + 1` of the locus' diseases
    Intermediate,
    /// Smallest `PathogenicMin`, from the catalog or the locus' diseases
    Pathogenic,
    /// User supplied threshold
    Custom,
}

impl MarkerKind {
    /// Text shown in the SampleId column
    pub fn label(&self) -> &'static str {
        match self {
            MarkerKind::Intermediate => "Intermediate Threshold",
            MarkerKind::Pathogenic => "Pathogenic Threshold",
            MarkerKind::Custom => "Threshold",
        }
    }
}

impl fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Row of the result table
#[derive(Debug, Clone, PartialEq)]
pub enum ResultRow {
    /// Display only row carrying a threshold in place of a genotype
    Marker {
        /// Threshold source
        kind: MarkerKind,
        /// Threshold value
        threshold: u32,
        /// Always the threshold
        allele_1: u32,
        /// 0 in hemizygous strata
        allele_2: u32,
    },
    /// Admitted genotype call
    Genotype(GenotypeRecord),
}

impl ResultRow {
    /// Marker row shaped for the stratum, hemizygous markers carry a single allele
    pub fn marker(kind: MarkerKind, threshold: u32, stratum: StratumKind) -> Self {
        let allele_2 = if stratum.arity() == 1 { 0 } else { threshold };
        ResultRow::Marker {
            kind,
            threshold,
            allele_1: threshold,
            allele_2,
        }
    }

    /// Admitted record, `None` for marker rows
    pub fn record(&self) -> Option<&GenotypeRecord> {
        match self {
            ResultRow::Genotype(record) => Some(record),
            ResultRow::Marker { .. } => None,
        }
    }
}

/// Rows reported for one stratum of a locus
#[derive(Debug, Clone, PartialEq)]
pub struct StratumResult {
    /// Locus the rows belong to
    pub locus_id: String,
    /// Stratum the rows were taken from
    pub kind: StratumKind,
    /// Inheritance mode used for the locus
    pub mode: InheritanceMode,
    /// Threshold applied, if any
    pub threshold: Option<u32>,
    /// Marker rows first, then admitted records in rank order
    pub rows: Vec<ResultRow>,
}

impl StratumResult {
    /// Admitted records, markers excluded
    pub fn records(&self) -> impl Iterator<Item = &GenotypeRecord> {
        self.rows.iter().filter_map(ResultRow::record)
    }
}

/// Why a locus was not classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Known thresholds were requested but none exist for the locus
    NoThresholdFound {
        /// Canonical motif of the locus, when annotated
        canonical_motif: Option<String>,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoThresholdFound {
                canonical_motif: Some(motif),
            } => write!(f, "no pathogenic threshold found for motif {}", motif),
            SkipReason::NoThresholdFound {
                canonical_motif: None,
            } => write!(f, "no pathogenic threshold found"),
        }
    }
}

/// What processing a locus produced
#[derive(Debug, Clone, PartialEq)]
pub enum LocusOutcome {
    /// At least one stratum has admitted records
    Reported(Vec<StratumResult>),
    /// Every stratum came out empty
    Empty {
        /// Locus without reportable rows
        locus_id: String,
    },
    /// The locus was not classified
    Skipped {
        /// Locus that was skipped
        locus_id: String,
        /// Why it was skipped
        reason: SkipReason,
    },
}

/// Assembles the strata of one locus into result rows
#[derive(Debug, Clone)]
pub struct LocusComposer {
    locus_id: String,
    mode: InheritanceMode,
    threshold: Option<u32>,
    markers: Vec<(MarkerKind, u32)>,
    emitted: HashSet<usize>,
    strata: Vec<StratumResult>,
}

impl LocusComposer {
    /// `markers` is empty when no marker rows are wanted
    pub fn new(
        locus_id: &str,
        mode: InheritanceMode,
        threshold: Option<u32>,
        markers: Vec<(MarkerKind, u32)>,
    ) -> Self {
        Self {
            locus_id: locus_id.to_string(),
            mode,
            threshold,
            markers,
            emitted: HashSet::new(),
            strata: Vec::new(),
        }
    }

    /// Adds a stratum's admitted records. A record already emitted by the other zygosity
    /// stratum is dropped, the contraction stratum is reported as is. Empty strata are left out.
    pub fn push(&mut self, kind: StratumKind, records: Vec<GenotypeRecord>) {
        let mut rows = Vec::with_capacity(records.len() + self.markers.len());
        for record in records {
            if kind == StratumKind::Contraction || self.emitted.insert(record.row) {
                rows.push(ResultRow::Genotype(record));
            } else {
                debug!(
                    "{} at {} already reported, dropping it from the {} stratum",
                    record.sample_id, self.locus_id, kind
                );
            }
        }
        if rows.is_empty() {
            debug!("Nothing to report for the {} stratum of {}", kind, self.locus_id);
            return;
        }

        let threshold = match kind {
            StratumKind::Contraction => None,
            _ => self.threshold,
        };
        if kind != StratumKind::Contraction {
            let markers = self
                .markers
                .iter()
                .map(|(marker, value)| ResultRow::marker(*marker, *value, kind));
            rows.splice(0..0, markers);
        }

        self.strata.push(StratumResult {
            locus_id: self.locus_id.clone(),
            kind,
            mode: self.mode,
            threshold,
            rows,
        });
    }

    /// Reported strata, or `Empty` when none has rows
    pub fn finish(self) -> LocusOutcome {
        if self.strata.is_empty() {
            LocusOutcome::Empty {
                locus_id: self.locus_id,
            }
        } else {
            LocusOutcome::Reported(self.strata)
        }
    }
}

/// Concatenation of every locus' strata in locus order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    strata: Vec<StratumResult>,
    skipped: Vec<(String, SkipReason)>,
    empty: Vec<String>,
}

impl ResultTable {
    /// Accumulates outcomes in the order given
    pub fn from_outcomes<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = LocusOutcome>,
    {
        let mut table = Self::default();
        for outcome in outcomes {
            table.push(outcome);
        }
        table
    }

    /// Adds one locus outcome
    pub fn push(&mut self, outcome: LocusOutcome) {
        match outcome {
            LocusOutcome::Reported(strata) => self.strata.extend(strata),
            LocusOutcome::Empty { locus_id } => self.empty.push(locus_id),
            LocusOutcome::Skipped { locus_id, reason } => self.skipped.push((locus_id, reason)),
        }
    }

    /// Reported strata in locus order
    pub fn strata(&self) -> &[StratumResult] {
        &self.strata
    }

    /// Every row paired with the stratum it belongs to
    pub fn rows(&self) -> impl Iterator<Item = (&StratumResult, &ResultRow)> {
        self.strata
            .iter()
            .flat_map(|stratum| stratum.rows.iter().map(move |row| (stratum, row)))
    }

    /// Loci that were not classified
    pub fn skipped(&self) -> &[(String, SkipReason)] {
        &self.skipped
    }

    /// Loci without reportable records
    pub fn empty(&self) -> &[String] {
        &self.empty
    }

    /// Number of rows, markers included
    pub fn len(&self) -> usize {
        self.strata.iter().map(|stratum| stratum.rows.len()).sum()
    }

    /// Whether no row was reported
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(sample: &str, row: usize) -> GenotypeRecord {
        GenotypeRecord::new("DMD", sample, 30, 40).with_row(row)
    }

    #[test]
    fn test_markers_follow_stratum_arity() {
        let mut composer = LocusComposer::new(
            "DMD",
            InheritanceMode::XR,
            Some(30),
            vec![(MarkerKind::Intermediate, 30), (MarkerKind::Pathogenic, 50)],
        );
        composer.push(StratumKind::Hemizygous, vec![record("m", 0)]);
        composer.push(StratumKind::Diploid, vec![record("f", 1)]);

        let strata = match composer.finish() {
            LocusOutcome::Reported(strata) => strata,
            other => panic!("Expected results, got {:?}", other),
        };
        assert_eq!(strata.len(), 2);
        assert_eq!(strata[0].rows.len(), 3);
        assert_eq!(
            strata[0].rows[1],
            ResultRow::Marker {
                kind: MarkerKind::Pathogenic,
                threshold: 50,
                allele_1: 50,
                allele_2: 0
            }
        );
        assert_eq!(
            strata[1].rows[0],
            ResultRow::Marker {
                kind: MarkerKind::Intermediate,
                threshold: 30,
                allele_1: 30,
                allele_2: 30
            }
        );
        assert_eq!(strata[1].records().count(), 1);
    }

    #[test]
    fn test_records_reported_once_per_locus() {
        let mut composer = LocusComposer::new("DMD", InheritanceMode::XD, None, vec![]);
        composer.push(StratumKind::Hemizygous, vec![record("a", 0), record("b", 1)]);
        composer.push(StratumKind::Diploid, vec![record("b", 1)]);
        match composer.finish() {
            LocusOutcome::Reported(strata) => {
                assert_eq!(strata.len(), 1);
                assert_eq!(strata[0].rows.len(), 2);
            }
            other => panic!("Expected results, got {:?}", other),
        }
    }

    #[test]
    fn test_contraction_keeps_reported_records() {
        let mut composer = LocusComposer::new("COMP", InheritanceMode::AD, Some(3), vec![]);
        composer.push(StratumKind::Unsplit, vec![record("short", 0)]);
        composer.push(StratumKind::Contraction, vec![record("short", 0), record("other", 1)]);
        match composer.finish() {
            LocusOutcome::Reported(strata) => {
                assert_eq!(strata.len(), 2);
                assert_eq!(strata[1].kind, StratumKind::Contraction);
                assert_eq!(strata[1].records().count(), 2);
            }
            other => panic!("Expected results, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_strata_are_dropped() {
        let mut composer = LocusComposer::new(
            "HTT",
            InheritanceMode::AD,
            Some(36),
            vec![(MarkerKind::Custom, 36)],
        );
        composer.push(StratumKind::Unsplit, vec![]);
        assert_eq!(
            composer.finish(),
            LocusOutcome::Empty {
                locus_id: "HTT".to_string()
            }
        );
    }

    #[test]
    fn test_result_table_concatenates_in_order() {
        let mut first = LocusComposer::new("A", InheritanceMode::AD, None, vec![]);
        first.push(StratumKind::Unsplit, vec![record("s1", 0)]);
        let mut second = LocusComposer::new("B", InheritanceMode::AD, None, vec![]);
        second.push(StratumKind::Unsplit, vec![record("s2", 1), record("s3", 2)]);

        let table = ResultTable::from_outcomes(vec![
            first.finish(),
            LocusOutcome::Skipped {
                locus_id: "C".to_string(),
                reason: SkipReason::NoThresholdFound {
                    canonical_motif: Some("AGC".to_string()),
                },
            },
            second.finish(),
        ]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.skipped().len(), 1);
        let samples = table
            .rows()
            .filter_map(|(_, row)| row.record())
            .map(|r| r.sample_id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(samples, vec!["s1", "s2", "s3"]);
    }
}
