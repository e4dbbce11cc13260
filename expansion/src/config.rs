//! Engine configuration.
use crate::genotype::{AlleleMetric, InheritanceMode};
use crate::strata::ZygosityStrategy;

/// Rows shown past the separation cutoff
pub const DEFAULT_LOOKAHEAD: usize = 3;
/// Unaffected rows tolerated above the affected ones before a scan stops
pub const DEFAULT_MAX_N_UNAFFECTED: usize = 10;
/// Admitted rows kept per stratum
pub const DEFAULT_MAX_ROWS: usize = 10_000_000;

/// Ordered `(lower bound, margin)` steps for the separation margin. The first step whose
/// bound the allele size exceeds wins, sizes below every bound get the fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeparationMargins {
    steps: Vec<(u32, u32)>,
    fallback: u32,
}

impl SeparationMargins {
    /// Steps are sorted by descending lower bound
    pub fn new(mut steps: Vec<(u32, u32)>, fallback: u32) -> Self {
        steps.sort_by(|a, b| b.0.cmp(&a.0));
        Self { steps, fallback }
    }

    /// Required gap between the last affected and the first unaffected allele size
    pub fn margin_for(&self, size: u32) -> u32 {
        self.steps
            .iter()
            .find(|(bound, _)| size > *bound)
            .map(|(_, margin)| *margin)
            .unwrap_or(self.fallback)
    }
}

impl Default for SeparationMargins {
    fn default() -> Self {
        Self::new(
            vec![(300, 100), (200, 50), (120, 20), (75, 10), (50, 5)],
            2,
        )
    }
}

/// Where the admission threshold of a locus comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdPolicy {
    /// No threshold filtering
    Disabled,
    /// Same user supplied threshold for every locus
    Fixed(u32),
    /// Known pathogenic thresholds, from the catalog or the locus' disease annotation
    Known,
}

/// Loci where short alleles are of interest, reported in a separate stratum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractionRule {
    /// Locus the rule applies to
    pub locus_id: String,
    /// Alleles strictly below this are reported
    pub below: u32,
}

/// Everything the engine needs to triage a locus
#[derive(Debug, Clone, PartialEq)]
pub struct TriageConfig {
    /// Allele field compared and ranked by
    pub metric: AlleleMetric,
    /// Threshold source
    pub threshold: ThresholdPolicy,
    /// Run the affected separation scan
    pub use_affected: bool,
    /// Safety cap on admitted rows per stratum
    pub max_rows: usize,
    /// Unaffected rows tolerated before a scan stops
    pub max_n_unaffected: usize,
    /// Rows shown past the separation cutoff
    pub lookahead: usize,
    /// Separation margin table
    pub margins: SeparationMargins,
    /// Overrides every other source of inheritance mode
    pub mode_override: Option<InheritanceMode>,
    /// Used when nothing else resolves a mode
    pub default_mode: InheritanceMode,
    /// Hemizygous and diploid assignment of X-linked records
    pub zygosity: ZygosityStrategy,
    /// Emit threshold marker rows with each stratum
    pub threshold_markers: bool,
    /// Loci with a contraction stratum
    pub contraction: Vec<ContractionRule>,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            metric: AlleleMetric::RepeatCount,
            threshold: ThresholdPolicy::Disabled,
            use_affected: false,
            max_rows: DEFAULT_MAX_ROWS,
            max_n_unaffected: DEFAULT_MAX_N_UNAFFECTED,
            lookahead: DEFAULT_LOOKAHEAD,
            margins: SeparationMargins::default(),
            mode_override: None,
            default_mode: InheritanceMode::AD,
            zygosity: ZygosityStrategy::GenotypeFirst,
            threshold_markers: false,
            contraction: vec![ContractionRule {
                locus_id: "COMP".to_string(),
                below: 5,
            }],
        }
    }
}

impl TriageConfig {
    /// Contraction bound configured for a locus
    pub fn contraction_for(&self, locus_id: &str) -> Option<u32> {
        self.contraction
            .iter()
            .find(|rule| rule.locus_id == locus_id)
            .map(|rule| rule.below)
    }
}
