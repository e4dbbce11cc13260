//! Sex and zygosity strata of X-linked loci.
use crate::error::Error;
use crate::genotype::{AlleleMetric, GenotypeRecord, InheritanceMode, Sex, Summary};
use crate::locus::rank_records_by;
use crate::Result;
use std::fmt;
use std::str::FromStr;

/// Sex/zygosity partition a set of records was taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StratumKind {
    /// Whole locus, for autosomal modes
    Unsplit,
    /// Single allele calls of X-linked loci
    Hemizygous,
    /// Two allele calls of X-linked loci
    Diploid,
    /// Short alleles of loci where contractions are pathogenic
    Contraction,
}

impl StratumKind {
    /// Number of alleles evaluated for admission
    pub fn arity(&self) -> usize {
        match self {
            StratumKind::Hemizygous => 1,
            _ => 2,
        }
    }

    /// Allele summary the stratum is compared and scanned by
    pub fn summary(&self, mode: InheritanceMode) -> Summary {
        match self {
            StratumKind::Hemizygous => Summary::Max,
            StratumKind::Contraction => Summary::Min,
            _ => mode.summary(),
        }
    }

    /// Lowercase name used in the result table
    pub fn as_str(&self) -> &'static str {
        match self {
            StratumKind::Unsplit => "unsplit",
            StratumKind::Hemizygous => "hemizygous",
            StratumKind::Diploid => "diploid",
            StratumKind::Contraction => "contraction",
        }
    }
}

impl fmt::Display for StratumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How X-linked records are assigned to the hemizygous and diploid strata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZygosityStrategy {
    /// A record without a two allele call or from a male is hemizygous, a record with a
    /// two allele call or from a female is diploid. A record can land in both.
    GenotypeFirst,
    /// Stated sex decides, the genotype call only resolves samples of unknown sex
    SexFirst,
}

impl ZygosityStrategy {
    /// Whether the record belongs to the hemizygous stratum
    pub fn is_hemizygous(&self, record: &GenotypeRecord) -> bool {
        match self {
            ZygosityStrategy::GenotypeFirst => {
                !record.zygosity_evidence || record.sex == Sex::Male
            }
            ZygosityStrategy::SexFirst => match record.sex {
                Sex::Male => true,
                Sex::Female => false,
                Sex::Unknown => !record.zygosity_evidence,
            },
        }
    }

    /// Whether the record belongs to the diploid stratum
    pub fn is_diploid(&self, record: &GenotypeRecord) -> bool {
        match self {
            ZygosityStrategy::GenotypeFirst => {
                record.zygosity_evidence || record.sex == Sex::Female
            }
            ZygosityStrategy::SexFirst => !self.is_hemizygous(record),
        }
    }
}

impl FromStr for ZygosityStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "genotype-first" => Ok(ZygosityStrategy::GenotypeFirst),
            "sex-first" => Ok(ZygosityStrategy::SexFirst),
            _ => Err(Error::UnknownZygosityStrategy(s.to_string())),
        }
    }
}

/// Ranked subset of a locus group
#[derive(Debug, Clone, PartialEq)]
pub struct Stratum {
    /// Partition the records came from
    pub kind: StratumKind,
    /// Records in rank order
    pub records: Vec<GenotypeRecord>,
}

impl Stratum {
    /// Stratum of already ranked records
    pub fn new(kind: StratumKind, records: Vec<GenotypeRecord>) -> Self {
        Self { kind, records }
    }

    /// Re-ranks the records by the stratum's own allele summary, keeping the affected status
    /// tie-break of the locus ranking
    pub fn rank(&mut self, metric: AlleleMetric, mode: InheritanceMode) {
        let summary = self.kind.summary(mode);
        rank_records_by(&mut self.records, |record| record.summary(metric, summary));
    }

    /// Value of a record the stratum is compared and scanned by
    pub fn value_of(
        &self,
        record: &GenotypeRecord,
        metric: AlleleMetric,
        mode: InheritanceMode,
    ) -> Option<u32> {
        record.summary(metric, self.kind.summary(mode))
    }
}

/// Splits ranked records into strata. X-linked modes produce a hemizygous and a diploid
/// stratum, every other mode a single unsplit one. Ranking order is kept within each stratum.
pub fn stratify(
    records: &[GenotypeRecord],
    mode: InheritanceMode,
    strategy: ZygosityStrategy,
) -> Vec<Stratum> {
    if !mode.is_x_linked() {
        return vec![Stratum::new(StratumKind::Unsplit, records.to_vec())];
    }

    let hemizygous = records
        .iter()
        .filter(|record| strategy.is_hemizygous(record))
        .cloned()
        .collect();
    let diploid = records
        .iter()
        .filter(|record| strategy.is_diploid(record))
        .cloned()
        .collect();

    vec![
        Stratum::new(StratumKind::Hemizygous, hemizygous),
        Stratum::new(StratumKind::Diploid, diploid),
    ]
}

/// Records with any allele strictly below `below`, ranked shortest first
pub fn contraction_stratum(
    records: &[GenotypeRecord],
    below: u32,
    metric: AlleleMetric,
) -> Stratum {
    let mut contracted = records
        .iter()
        .filter(|record| {
            record
                .alleles(metric)
                .iter()
                .any(|allele| matches!(allele, Some(size) if *size < below))
        })
        .cloned()
        .collect::<Vec<_>>();
    contracted.sort_by_key(|record| record.summary(metric, Summary::Min));
    Stratum::new(StratumKind::Contraction, contracted)
}
