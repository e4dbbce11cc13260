//! Per-locus driver tying every stage together.
use crate::catalog::{DiseaseThresholds, ThresholdCatalog, ThresholdEntry};
use crate::classify::ThresholdClassifier;
use crate::compose::{LocusComposer, LocusOutcome, MarkerKind, ResultTable, SkipReason};
use crate::config::{ThresholdPolicy, TriageConfig};
use crate::genotype::{GenotypeRecord, InheritanceMode};
use crate::locus::{group_by_locus, LocusGroup};
use crate::separation::{ScanOutcome, SeparationScanner};
use crate::strata::{contraction_stratum, stratify};
use log::{debug, info, warn};

/// Threshold chosen for a locus and the marker rows that describe it
#[derive(Debug, Clone, PartialEq, Eq)]
struct LocusThreshold {
    value: Option<u32>,
    markers: Vec<(MarkerKind, u32)>,
}

/// Runs every stage of the triage for one locus at a time
#[derive(Debug, Clone)]
pub struct Engine<'a> {
    config: &'a TriageConfig,
    catalog: Option<&'a ThresholdCatalog>,
    scanner: SeparationScanner,
}

impl<'a> Engine<'a> {
    /// Without a catalog, known thresholds come from each locus' own disease annotation
    pub fn new(config: &'a TriageConfig, catalog: Option<&'a ThresholdCatalog>) -> Self {
        let scanner = SeparationScanner::new(
            config.max_n_unaffected,
            config.lookahead,
            config.margins.clone(),
        );
        Self {
            config,
            catalog,
            scanner,
        }
    }

    /// Groups records by locus and processes the loci in order
    pub fn process(&self, records: Vec<GenotypeRecord>) -> ResultTable {
        ResultTable::from_outcomes(
            group_by_locus(records)
                .into_iter()
                .map(|group| self.process_locus(group)),
        )
    }

    /// Classifies one locus: resolve mode and threshold, rank, stratify, admit, scan, compose
    pub fn process_locus(&self, mut group: LocusGroup) -> LocusOutcome {
        let canonical_motif = group
            .first_annotation(|r| r.canonical_motif.as_ref())
            .map(String::from);
        let entry = match (self.catalog, canonical_motif.as_deref()) {
            (Some(catalog), Some(motif)) => catalog.get(motif).copied(),
            _ => None,
        };
        let mode = self.resolve_mode(&group, entry.as_ref());

        let threshold = match self.resolve_threshold(&group, entry.as_ref()) {
            Some(threshold) => threshold,
            None => {
                let reason = SkipReason::NoThresholdFound { canonical_motif };
                warn!("Skipping {}: {}", group.locus_id, reason);
                return LocusOutcome::Skipped {
                    locus_id: group.locus_id,
                    reason,
                };
            }
        };
        debug!(
            "{}: {} records, mode {}, threshold {:?}",
            group.locus_id,
            group.len(),
            mode,
            threshold.value
        );

        group.rank(self.config.metric, mode);
        let markers = if self.config.threshold_markers {
            threshold.markers.clone()
        } else {
            Vec::new()
        };
        let mut composer = LocusComposer::new(&group.locus_id, mode, threshold.value, markers);

        for mut stratum in stratify(&group.records, mode, self.config.zygosity) {
            stratum.rank(self.config.metric, mode);
            let admitted = match threshold.value {
                Some(value) => {
                    ThresholdClassifier::new(value, self.config.metric, mode, self.config.max_rows)
                        .classify(&stratum)
                }
                None => stratum.records,
            };
            let admitted = if self.config.use_affected {
                let (outcome, kept) =
                    self.scanner
                        .apply(admitted, stratum.kind, self.config.metric, mode);
                log_scan(&group.locus_id, stratum.kind.as_str(), &outcome);
                kept
            } else {
                admitted
            };
            info!(
                "Found {} samples passing filters in the {} stratum of {}",
                admitted.len(),
                stratum.kind,
                group.locus_id
            );
            composer.push(stratum.kind, admitted);
        }

        if let Some(below) = self.config.contraction_for(&group.locus_id) {
            let contracted = contraction_stratum(&group.records, below, self.config.metric);
            let kept = contracted
                .records
                .into_iter()
                .take(self.config.max_rows)
                .collect::<Vec<_>>();
            info!(
                "Found {} samples with alleles below {} repeats at {}",
                kept.len(),
                below,
                group.locus_id
            );
            composer.push(contracted.kind, kept);
        }

        composer.finish()
    }

    /// Override, catalog, locus annotation, chrX region, then the configured default
    fn resolve_mode(&self, group: &LocusGroup, entry: Option<&ThresholdEntry>) -> InheritanceMode {
        if let Some(mode) = self.config.mode_override {
            return mode;
        }
        if let Some(entry) = entry {
            return entry.inheritance_mode;
        }
        if let Some(raw) = group.first_annotation(|r| r.catalog_inheritance.as_ref()) {
            match raw.parse::<InheritanceMode>() {
                Ok(mode) => return mode,
                Err(e) => warn!("{}: {}", group.locus_id, e),
            }
        }
        match group.first_annotation(|r| r.reference_region.as_ref()) {
            Some(region) if is_chrx(region) => InheritanceMode::XR,
            _ => self.config.default_mode,
        }
    }

    /// `None` means known thresholds were requested and the locus has none
    fn resolve_threshold(
        &self,
        group: &LocusGroup,
        entry: Option<&ThresholdEntry>,
    ) -> Option<LocusThreshold> {
        match self.config.threshold {
            ThresholdPolicy::Disabled => Some(LocusThreshold {
                value: None,
                markers: Vec::new(),
            }),
            ThresholdPolicy::Fixed(value) => Some(LocusThreshold {
                value: Some(value),
                markers: vec![(MarkerKind::Custom, value)],
            }),
            ThresholdPolicy::Known if self.catalog.is_some() => entry.map(|entry| LocusThreshold {
                value: Some(entry.threshold),
                markers: vec![(MarkerKind::Pathogenic, entry.threshold)],
            }),
            ThresholdPolicy::Known => {
                let raw = group.first_annotation(|r| r.catalog_diseases.as_ref())?;
                let thresholds = DiseaseThresholds::parse(raw)
                    .map_err(|e| warn!("{}: {}", group.locus_id, e))
                    .ok()?;
                let value = thresholds.threshold()?;
                let markers = [
                    (MarkerKind::Intermediate, thresholds.intermediate_min),
                    (MarkerKind::Pathogenic, thresholds.pathogenic_min),
                ]
                .iter()
                .filter_map(|(kind, value)| value.filter(|v| *v > 0).map(|v| (*kind, v)))
                .collect();
                Some(LocusThreshold {
                    value: Some(value),
                    markers,
                })
            }
        }
    }
}

fn log_scan(locus_id: &str, stratum: &str, outcome: &ScanOutcome) {
    match outcome {
        ScanOutcome::NoAffected { scanned } => debug!(
            "No affected samples among the top {} rows of the {} stratum of {}",
            scanned, stratum, locus_id
        ),
        ScanOutcome::NotSeparated {
            last_affected,
            first_unaffected,
            margin,
        } => debug!(
            "Affected samples at {} are not separated from unaffected at {} by {} repeats in the {} stratum of {}",
            last_affected, first_unaffected, margin, stratum, locus_id
        ),
        ScanOutcome::Separated {
            scanned,
            reportable,
        } => debug!(
            "Reporting {} rows after scanning {} in the {} stratum of {}",
            reportable, scanned, stratum, locus_id
        ),
    }
}

/// `chrX:1-2`, `X:1-2` or a bare contig name
fn is_chrx(region: &str) -> bool {
    let contig = region.split(':').next().unwrap_or(region).trim();
    let contig = contig.strip_prefix("chr").unwrap_or(contig);
    contig.eq_ignore_ascii_case("x")
}
