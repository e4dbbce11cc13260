//! Affected versus unaffected separation scan.
use crate::config::SeparationMargins;
use crate::genotype::{AffectedStatus, AlleleMetric, GenotypeRecord, InheritanceMode};
use crate::strata::StratumKind;
use log::debug;

/// Counters and size trackers carried through a scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanState {
    /// Rows consumed so far, including the one that stopped the scan
    pub scanned: usize,
    /// Unaffected rows seen
    pub ignored_unaffected_count: usize,
    /// Affected rows seen
    pub affected_count: usize,
    /// Size of the most recent unaffected row
    pub first_unaffected_allele_size: Option<u32>,
    /// Size of the first affected row
    pub first_affected_allele_size: Option<u32>,
    /// Size of the most recent affected row
    pub last_affected_allele_size: Option<u32>,
}

impl ScanState {
    /// Consumes one row, returns `false` once the unaffected cap is exceeded
    pub fn step(&mut self, status: AffectedStatus, size: u32, max_n_unaffected: usize) -> bool {
        self.scanned += 1;
        match status {
            AffectedStatus::Unknown => true,
            AffectedStatus::NotAffected => {
                self.ignored_unaffected_count += 1;
                self.first_unaffected_allele_size = Some(size);
                self.ignored_unaffected_count <= max_n_unaffected
            }
            AffectedStatus::Affected => {
                self.affected_count += 1;
                self.last_affected_allele_size = Some(size);
                if self.first_affected_allele_size.is_none() {
                    self.first_affected_allele_size = Some(size);
                }
                true
            }
        }
    }
}

/// Result of scanning one ranked stratum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// No affected row was seen before the scan stopped
    NoAffected {
        /// Rows consumed
        scanned: usize,
    },
    /// Affected rows are too close to the unaffected background
    NotSeparated {
        /// Size of the last affected row
        last_affected: u32,
        /// Size of the most recent unaffected row
        first_unaffected: u32,
        /// Gap required at `last_affected`
        margin: u32,
    },
    /// The first `reportable` rows are worth reviewing
    Separated {
        /// Rows consumed
        scanned: usize,
        /// Leading rows to report, lookahead included
        reportable: usize,
    },
}

impl ScanOutcome {
    /// Number of leading rows to report
    pub fn reportable(&self) -> usize {
        match self {
            ScanOutcome::Separated { reportable, .. } => *reportable,
            _ => 0,
        }
    }
}

/// Trims a ranked stratum down to the rows where affected samples stand out from the
/// unaffected ones by an allele size margin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeparationScanner {
    max_n_unaffected: usize,
    lookahead: usize,
    margins: SeparationMargins,
}

impl SeparationScanner {
    /// Scanner with an unaffected cap, a lookahead and a margin table
    pub fn new(max_n_unaffected: usize, lookahead: usize, margins: SeparationMargins) -> Self {
        Self {
            max_n_unaffected,
            lookahead,
            margins,
        }
    }

    /// Single pass over `(status, size)` pairs in rank order
    pub fn scan<I>(&self, rows: I) -> ScanOutcome
    where
        I: IntoIterator<Item = (AffectedStatus, u32)>,
    {
        let mut state = ScanState::default();
        let mut stopped = false;
        let mut total = 0;
        for (status, size) in rows {
            total += 1;
            if stopped {
                continue;
            }
            if !state.step(status, size, self.max_n_unaffected) {
                debug!(
                    "Stopping scan after {} unaffected rows",
                    state.ignored_unaffected_count
                );
                stopped = true;
            }
        }
        self.decide(&state, total)
    }

    fn decide(&self, state: &ScanState, total: usize) -> ScanOutcome {
        let last_affected = match state.last_affected_allele_size {
            Some(size) => size,
            None => {
                return ScanOutcome::NoAffected {
                    scanned: state.scanned,
                }
            }
        };

        let margin = self.margins.margin_for(last_affected);
        if let Some(first_unaffected) = state.first_unaffected_allele_size {
            if u64::from(last_affected) < u64::from(first_unaffected) + u64::from(margin) {
                return ScanOutcome::NotSeparated {
                    last_affected,
                    first_unaffected,
                    margin,
                };
            }
        }

        ScanOutcome::Separated {
            scanned: state.scanned,
            reportable: (state.scanned + self.lookahead).min(total),
        }
    }

    /// Scans ranked records of a stratum and keeps the reportable prefix. Sizes are the
    /// stratum's allele summary, a missing value counts as 0.
    pub fn apply(
        &self,
        records: Vec<GenotypeRecord>,
        kind: StratumKind,
        metric: AlleleMetric,
        mode: InheritanceMode,
    ) -> (ScanOutcome, Vec<GenotypeRecord>) {
        let summary = kind.summary(mode);
        let outcome = self.scan(records.iter().map(|record| {
            (
                record.affected_status,
                record.summary(metric, summary).unwrap_or(0),
            )
        }));
        let mut records = records;
        records.truncate(outcome.reportable());
        (outcome, records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AffectedStatus::*;

    fn scanner(max_n_unaffected: usize) -> SeparationScanner {
        SeparationScanner::new(max_n_unaffected, 3, SeparationMargins::default())
    }

    #[test]
    fn test_margin_boundary() {
        let rows = vec![(Affected, 250), (Affected, 201), (NotAffected, 160)];
        match scanner(10).scan(rows) {
            ScanOutcome::NotSeparated { margin, .. } => assert_eq!(margin, 50),
            other => panic!("Expected rejection, got {:?}", other),
        }

        let rows = vec![(Affected, 250), (Affected, 201), (NotAffected, 140)];
        assert_eq!(
            scanner(10).scan(rows),
            ScanOutcome::Separated {
                scanned: 3,
                reportable: 3
            }
        );
    }

    #[test]
    fn test_unaffected_cap_terminates() {
        let rows = vec![
            (NotAffected, 90),
            (NotAffected, 80),
            (NotAffected, 70),
            (Affected, 20),
        ];
        assert_eq!(
            scanner(2).scan(rows),
            ScanOutcome::NoAffected { scanned: 3 }
        );
    }

    #[test]
    fn test_no_unaffected_is_separated() {
        let rows = vec![(Affected, 30), (Unknown, 29), (Affected, 28)];
        assert_eq!(scanner(10).scan(rows).reportable(), 3);
        assert_eq!(
            scanner(10).scan(vec![(Unknown, 30)]),
            ScanOutcome::NoAffected { scanned: 1 }
        );
    }

    #[test]
    fn test_lookahead_after_cap() {
        let mut rows = vec![(Affected, 400), (NotAffected, 200), (NotAffected, 190)];
        rows.extend((0..10).map(|i| (Unknown, 100 - i)));
        let outcome = scanner(1).scan(rows);
        assert_eq!(
            outcome,
            ScanOutcome::Separated {
                scanned: 3,
                reportable: 6
            }
        );
    }

    #[test]
    fn test_state_tracks_first_and_last_affected() {
        let mut state = ScanState::default();
        assert!(state.step(Affected, 60, 1));
        assert!(state.step(Affected, 55, 1));
        assert!(state.step(NotAffected, 0, 1));
        assert!(!state.step(NotAffected, 0, 1));
        assert_eq!(state.first_affected_allele_size, Some(60));
        assert_eq!(state.last_affected_allele_size, Some(55));
        assert_eq!(state.first_unaffected_allele_size, Some(0));
        assert_eq!(state.scanned, 4);
    }

    #[test]
    fn test_apply_truncates_records() {
        let records = vec![
            GenotypeRecord::new("HTT", "a", 17, 60).with_affected_status(Affected),
            GenotypeRecord::new("HTT", "b", 17, 30).with_affected_status(NotAffected),
            GenotypeRecord::new("HTT", "c", 17, 29).with_affected_status(NotAffected),
            GenotypeRecord::new("HTT", "d", 17, 28).with_affected_status(NotAffected),
            GenotypeRecord::new("HTT", "e", 17, 27),
            GenotypeRecord::new("HTT", "f", 17, 26),
        ];
        let (outcome, kept) = SeparationScanner::new(2, 1, SeparationMargins::default()).apply(
            records,
            StratumKind::Unsplit,
            AlleleMetric::RepeatCount,
            InheritanceMode::AD,
        );
        assert_eq!(
            outcome,
            ScanOutcome::Separated {
                scanned: 4,
                reportable: 5
            }
        );
        assert_eq!(kept.len(), 5);
        assert_eq!(kept[4].sample_id, "e");
    }
}
