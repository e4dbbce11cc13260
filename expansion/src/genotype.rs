//! Typed genotype records and the normalizer that builds them from raw table rows.
use crate::error::Error;
use crate::motif::canonical_motif;
use crate::table::RawTable;
use crate::Result;
use log::{debug, warn};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Sample sex as stated in the genotype table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sex {
    /// Stated male
    Male,
    /// Stated female
    Female,
    /// Missing or unknown value
    Unknown,
}

impl Sex {
    /// Case-insensitive prefix match, `m...` is male and `f...` is female. Missing values
    /// are `Unknown`, anything else is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let value = raw.trim().to_ascii_lowercase();
        match value.as_str() {
            "" | "." | "na" | "nan" | "none" | "u" | "unknown" => Some(Sex::Unknown),
            v if v.starts_with('m') => Some(Sex::Male),
            v if v.starts_with('f') => Some(Sex::Female),
            _ => None,
        }
    }

    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
            Sex::Unknown => "unknown",
        }
    }
}

/// Clinical label of a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AffectedStatus {
    /// Affected by the phenotype under review
    Affected,
    /// Known to be unaffected
    NotAffected,
    /// Missing or unknown value
    Unknown,
}

impl AffectedStatus {
    /// Normalizes the vocabulary found in sample metadata. Values like `a; a` that repeat the
    /// same status are collapsed, conflicting multi-values are rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let statuses = raw
            .split(';')
            .map(Self::parse_single)
            .collect::<Option<BTreeSet<_>>>()?;

        let mut statuses = statuses.into_iter();
        match (statuses.next(), statuses.next()) {
            (Some(status), None) => Some(status),
            _ => None,
        }
    }

    fn parse_single(raw: &str) -> Option<Self> {
        let key = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match key.as_str() {
            "affected" => Some(AffectedStatus::Affected),
            "notaffected" | "unaffected" => Some(AffectedStatus::NotAffected),
            "" | "na" | "nan" | "unknown" | "possiblyaffected" => Some(AffectedStatus::Unknown),
            _ => None,
        }
    }

    /// Tie-break priority when ranking, higher sorts first
    pub fn priority(&self) -> u8 {
        match self {
            AffectedStatus::Affected => 2,
            AffectedStatus::Unknown => 1,
            AffectedStatus::NotAffected => 0,
        }
    }

    /// Label used in the result table
    pub fn as_str(&self) -> &'static str {
        match self {
            AffectedStatus::Affected => "Affected",
            AffectedStatus::NotAffected => "Not Affected",
            AffectedStatus::Unknown => "Unknown",
        }
    }
}

/// Mode of inheritance of the disease associated with a locus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InheritanceMode {
    /// Autosomal dominant
    AD,
    /// Autosomal recessive
    AR,
    /// X-linked dominant
    XD,
    /// X-linked recessive
    XR,
}

impl InheritanceMode {
    /// Recessive modes require both alleles to be expanded
    pub fn is_recessive(&self) -> bool {
        matches!(self, InheritanceMode::AR | InheritanceMode::XR)
    }

    /// X-linked modes split strata by zygosity
    pub fn is_x_linked(&self) -> bool {
        matches!(self, InheritanceMode::XD | InheritanceMode::XR)
    }

    /// Allele summary used to rank genotypes under this mode
    pub fn summary(&self) -> Summary {
        if self.is_recessive() {
            Summary::Min
        } else {
            Summary::Max
        }
    }

    /// Two letter code
    pub fn as_str(&self) -> &'static str {
        match self {
            InheritanceMode::AD => "AD",
            InheritanceMode::AR => "AR",
            InheritanceMode::XD => "XD",
            InheritanceMode::XR => "XR",
        }
    }
}

impl FromStr for InheritanceMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AD" => Ok(InheritanceMode::AD),
            "AR" => Ok(InheritanceMode::AR),
            "XD" => Ok(InheritanceMode::XD),
            "XR" => Ok(InheritanceMode::XR),
            _ => Err(Error::UnknownInheritanceMode(s.to_string())),
        }
    }
}

impl fmt::Display for InheritanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which numeric field an allele is compared and ranked by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlleleMetric {
    /// Point estimate of the repeat count
    RepeatCount,
    /// Upper bound of the confidence interval
    CiEnd,
}

impl FromStr for AlleleMetric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "repeats" | "num-repeats" | "num repeats" => Ok(AlleleMetric::RepeatCount),
            "ci-end" | "ci end" => Ok(AlleleMetric::CiEnd),
            _ => Err(Error::UnknownAlleleMetric(s.to_string())),
        }
    }
}

/// Which of the two alleles summarizes a genotype
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Summary {
    /// Smaller allele
    Min,
    /// Larger allele
    Max,
}

/// Summarizes an allele pair. A zero (or absent) allele is a missing or hemizygous call, in
/// which case both summaries fall back to the other allele.
pub fn summarize(allele_1: Option<u32>, allele_2: Option<u32>, summary: Summary) -> Option<u32> {
    match (allele_1, allele_2) {
        (Some(a), Some(b)) if a > 0 && b > 0 => match summary {
            Summary::Min => Some(a.min(b)),
            Summary::Max => Some(a.max(b)),
        },
        (Some(a), Some(b)) => Some(a.max(b)),
        (Some(a), None) | (None, Some(a)) => Some(a),
        (None, None) => None,
    }
}

/// Pass-through sample columns carried into the result table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleMetadata {
    /// Analysis status of the sample
    pub analysis_status: Option<String>,
    /// HPO terms or free text phenotypes
    pub phenotypes: Option<String>,
    /// Reference genome version
    pub genome_version: Option<String>,
    /// Sample id of the father
    pub paternal_id: Option<String>,
    /// Sample id of the mother
    pub maternal_id: Option<String>,
}

/// One sample's call at one locus, validated once when the table is loaded
#[derive(Debug, Clone, PartialEq)]
pub struct GenotypeRecord {
    /// 0-based position in the input table, stable identity of the record
    pub row: usize,
    /// Locus the call was made at
    pub locus_id: String,
    /// Variant id, differs from the locus id for off-target calls
    pub variant_id: Option<String>,
    /// Sample the call belongs to
    pub sample_id: String,
    /// Repeat unit as written in the table
    pub motif: Option<String>,
    /// Canonical form of `motif`
    pub canonical_motif: Option<String>,
    /// Reference coordinates of the locus
    pub reference_region: Option<String>,
    /// Repeat count of allele 1
    pub allele_1_count: u32,
    /// Repeat count of allele 2
    pub allele_2_count: u32,
    /// Smaller allele, the other one when an allele is 0
    pub min_allele: u32,
    /// Larger allele
    pub max_allele: u32,
    /// Confidence interval end of allele 1
    pub ci_end_1: Option<u32>,
    /// Confidence interval end of allele 2
    pub ci_end_2: Option<u32>,
    /// Stated sex
    pub sex: Sex,
    /// Clinical label
    pub affected_status: AffectedStatus,
    /// Genotype as written, e.g. `17/45`
    pub genotype_string: Option<String>,
    /// Genotype confidence interval as written
    pub genotype_ci_string: Option<String>,
    /// Genotype string holds a `/`, i.e. a two allele call was made
    pub zygosity_evidence: bool,
    /// Raw `VariantCatalog_Inheritance` annotation
    pub catalog_inheritance: Option<String>,
    /// Raw `VariantCatalog_Diseases` annotation
    pub catalog_diseases: Option<String>,
    /// Comma separated allele purities
    pub allele_purity: Option<String>,
    /// Pass-through sample columns
    pub metadata: SampleMetadata,
}

impl GenotypeRecord {
    /// Builds a record from allele counts, deriving the summaries and zygosity evidence
    pub fn new<S: Into<String>>(
        locus_id: S,
        sample_id: S,
        allele_1_count: u32,
        allele_2_count: u32,
    ) -> Self {
        let min_allele = summarize(Some(allele_1_count), Some(allele_2_count), Summary::Min)
            .unwrap_or_default();
        let max_allele = allele_1_count.max(allele_2_count);

        Self {
            row: 0,
            locus_id: locus_id.into(),
            variant_id: None,
            sample_id: sample_id.into(),
            motif: None,
            canonical_motif: None,
            reference_region: None,
            allele_1_count,
            allele_2_count,
            min_allele,
            max_allele,
            ci_end_1: None,
            ci_end_2: None,
            sex: Sex::Unknown,
            affected_status: AffectedStatus::Unknown,
            genotype_string: None,
            genotype_ci_string: None,
            zygosity_evidence: false,
            catalog_inheritance: None,
            catalog_diseases: None,
            allele_purity: None,
            metadata: SampleMetadata::default(),
        }
    }

    /// Both allele values under the chosen metric
    pub fn alleles(&self, metric: AlleleMetric) -> [Option<u32>; 2] {
        match metric {
            AlleleMetric::RepeatCount => [Some(self.allele_1_count), Some(self.allele_2_count)],
            AlleleMetric::CiEnd => [self.ci_end_1, self.ci_end_2],
        }
    }

    /// Min or max allele under the chosen metric
    pub fn summary(&self, metric: AlleleMetric, summary: Summary) -> Option<u32> {
        match (metric, summary) {
            (AlleleMetric::RepeatCount, Summary::Min) => Some(self.min_allele),
            (AlleleMetric::RepeatCount, Summary::Max) => Some(self.max_allele),
            (AlleleMetric::CiEnd, summary) => summarize(self.ci_end_1, self.ci_end_2, summary),
        }
    }

    /// Value the record is ranked by under an inheritance mode
    pub fn rank_value(&self, metric: AlleleMetric, mode: InheritanceMode) -> Option<u32> {
        self.summary(metric, mode.summary())
    }

    /// Attaches a motif and its canonical form
    pub fn with_motif(mut self, motif: &str) -> Self {
        self.canonical_motif = Some(canonical_motif(motif));
        self.motif = Some(motif.to_string());
        self
    }

    /// Attaches a genotype string, updating the zygosity evidence
    pub fn with_genotype(mut self, genotype: &str) -> Self {
        self.zygosity_evidence = genotype.contains('/');
        self.genotype_string = Some(genotype.to_string());
        self
    }

    /// Sets the stated sex
    pub fn with_sex(mut self, sex: Sex) -> Self {
        self.sex = sex;
        self
    }

    /// Sets the clinical label
    pub fn with_affected_status(mut self, status: AffectedStatus) -> Self {
        self.affected_status = status;
        self
    }

    /// Sets the confidence interval ends
    pub fn with_ci_ends(mut self, ci_end_1: Option<u32>, ci_end_2: Option<u32>) -> Self {
        self.ci_end_1 = ci_end_1;
        self.ci_end_2 = ci_end_2;
        self
    }

    /// Sets the input row
    pub fn with_row(mut self, row: usize) -> Self {
        self.row = row;
        self
    }
}

/// Names of the genotype table columns
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnNames {
    /// Locus id column
    pub locus_id: String,
    /// Variant id column
    pub variant_id: String,
    /// Sample id column
    pub sample_id: String,
    /// Affected status column
    pub affected: String,
    /// Sex column
    pub sex: String,
    /// Repeat unit column
    pub motif: String,
    /// Repeat count of allele 1
    pub allele_1: String,
    /// Repeat count of allele 2
    pub allele_2: String,
    /// Confidence interval end of allele 1
    pub ci_end_1: String,
    /// Confidence interval end of allele 2
    pub ci_end_2: String,
    /// Genotype string column
    pub genotype: String,
    /// Genotype confidence interval column
    pub genotype_ci: String,
    /// Reference region column
    pub reference_region: String,
    /// Catalog inheritance annotation
    pub inheritance: String,
    /// Catalog disease annotation
    pub diseases: String,
    /// Allele purity column
    pub allele_purity: String,
    /// Sample analysis status
    pub analysis_status: String,
    /// Sample phenotypes
    pub phenotypes: String,
    /// Sample genome version
    pub genome_version: String,
    /// Father's sample id
    pub paternal_id: String,
    /// Mother's sample id
    pub maternal_id: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            locus_id: "LocusId".to_string(),
            variant_id: "VariantId".to_string(),
            sample_id: "SampleId".to_string(),
            affected: "Sample_affected".to_string(),
            sex: "Sample_sex".to_string(),
            motif: "RepeatUnit".to_string(),
            allele_1: "Num Repeats: Allele 1".to_string(),
            allele_2: "Num Repeats: Allele 2".to_string(),
            ci_end_1: "CI end: Allele 1".to_string(),
            ci_end_2: "CI end: Allele 2".to_string(),
            genotype: "Genotype".to_string(),
            genotype_ci: "GenotypeConfidenceInterval".to_string(),
            reference_region: "ReferenceRegion".to_string(),
            inheritance: "VariantCatalog_Inheritance".to_string(),
            diseases: "VariantCatalog_Diseases".to_string(),
            allele_purity: "AllelePurity".to_string(),
            analysis_status: "Sample_analysis_status".to_string(),
            phenotypes: "Sample_phenotypes".to_string(),
            genome_version: "Sample_genome_version".to_string(),
            paternal_id: "paternal_id".to_string(),
            maternal_id: "maternal_id".to_string(),
        }
    }
}

/// Turns a raw table into validated [`GenotypeRecord`]s
#[derive(Debug)]
pub struct Normalizer<'a> {
    columns: &'a ColumnNames,
    metric: AlleleMetric,
}

impl<'a> Normalizer<'a> {
    /// Normalizer for the given column names and allele metric
    pub fn new(columns: &'a ColumnNames, metric: AlleleMetric) -> Self {
        Self { columns, metric }
    }

    fn required_columns(&self) -> Vec<&'a str> {
        let mut required = vec![
            self.columns.locus_id.as_str(),
            self.columns.sample_id.as_str(),
            self.columns.allele_1.as_str(),
            self.columns.allele_2.as_str(),
            self.columns.sex.as_str(),
            self.columns.affected.as_str(),
        ];
        if self.metric == AlleleMetric::CiEnd {
            required.push(self.columns.ci_end_1.as_str());
            required.push(self.columns.ci_end_2.as_str());
        }
        required
    }

    /// Validates the table and converts every row. Missing required columns raise a
    /// `SchemaError`, unrecognized sex or affected status values a `DataError`.
    pub fn normalize(&self, table: &RawTable) -> Result<Vec<GenotypeRecord>> {
        let missing = self
            .required_columns()
            .into_iter()
            .filter(|column| table.column(column).is_none())
            .map(String::from)
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            return Err(Error::SchemaError(missing));
        }

        let c = self.columns;
        let optional = [
            &c.motif,
            &c.variant_id,
            &c.genotype,
            &c.genotype_ci,
            &c.reference_region,
            &c.inheritance,
            &c.diseases,
            &c.analysis_status,
            &c.phenotypes,
        ];
        let missing_optional = optional
            .iter()
            .filter(|column| table.column(column).is_none())
            .map(|column| column.as_str())
            .collect::<Vec<_>>();
        if !missing_optional.is_empty() {
            warn!(
                "Genotype table is missing these columns: {}. Filling them with empty values",
                missing_optional.join(", ")
            );
        }

        let records = (0..table.len())
            .map(|row| self.normalize_row(table, row))
            .collect::<Result<Vec<_>>>()?;
        debug!("Normalized {} genotype records", records.len());
        Ok(records)
    }

    fn normalize_row(&self, table: &RawTable, row: usize) -> Result<GenotypeRecord> {
        let c = self.columns;
        let cell = |column: &str| table.value(row, column).map(str::trim).unwrap_or("");
        let optional = |column: &str| Some(cell(column)).filter(|v| !v.is_empty()).map(String::from);
        let data_error = |column: &str| Error::DataError {
            column: column.to_string(),
            value: cell(column).to_string(),
            row: row + 1,
        };

        let locus_id = cell(&c.locus_id);
        if locus_id.is_empty() {
            return Err(data_error(&c.locus_id));
        }
        let sample_id = cell(&c.sample_id);
        if sample_id.is_empty() {
            return Err(data_error(&c.sample_id));
        }
        let sex = Sex::parse(cell(&c.sex)).ok_or_else(|| data_error(&c.sex))?;
        let affected_status =
            AffectedStatus::parse(cell(&c.affected)).ok_or_else(|| data_error(&c.affected))?;

        let mut record = GenotypeRecord::new(
            locus_id,
            sample_id,
            parse_count(cell(&c.allele_1)),
            parse_count(cell(&c.allele_2)),
        )
        .with_row(row)
        .with_sex(sex)
        .with_affected_status(affected_status)
        .with_ci_ends(
            parse_optional_count(cell(&c.ci_end_1)),
            parse_optional_count(cell(&c.ci_end_2)),
        );

        if let Some(motif) = optional(&c.motif) {
            record = record.with_motif(&motif);
        }
        if let Some(genotype) = optional(&c.genotype) {
            record = record.with_genotype(&genotype);
        }
        record.variant_id = optional(&c.variant_id);
        record.genotype_ci_string = optional(&c.genotype_ci);
        record.reference_region = optional(&c.reference_region);
        record.catalog_inheritance = optional(&c.inheritance);
        record.catalog_diseases = optional(&c.diseases);
        record.allele_purity = optional(&c.allele_purity);
        record.metadata = SampleMetadata {
            analysis_status: optional(&c.analysis_status),
            phenotypes: optional(&c.phenotypes),
            genome_version: optional(&c.genome_version),
            paternal_id: optional(&c.paternal_id),
            maternal_id: optional(&c.maternal_id),
        };

        Ok(record)
    }
}

/// Repeat counts are written as integers or floats, anything missing or unparsable is 0
pub fn parse_count(raw: &str) -> u32 {
    parse_optional_count(raw).unwrap_or(0)
}

/// Like [`parse_count`] but keeps missing values as `None`
pub fn parse_optional_count(raw: &str) -> Option<u32> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .map(|value| value.max(0.0).floor() as u32)
}
