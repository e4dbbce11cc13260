use crate::error::Error;
use expansion::{
    AlleleMetric, ColumnNames, InheritanceMode, RecordFilters, ThresholdPolicy, TriageConfig,
    ZygosityStrategy,
};
use log::LevelFilter;
use std::path::PathBuf;
use structopt::StructOpt;

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "rustystr",
    about = "Triage of tandem repeat genotype tables for candidate pathogenic expansions"
)]
pub(crate) struct RustyStr {
    #[structopt(
        help = "Tab delimited genotype tables, rows of all tables are combined",
        required = true,
        parse(from_os_str)
    )]
    pub genotype_tables: Vec<PathBuf>,
    #[structopt(
        long,
        help = "Filter loci by their known pathogenic thresholds, from --catalog or the disease annotation of each row"
    )]
    pub use_thresholds: bool,
    #[structopt(
        long,
        help = "Report only loci where affected samples separate from unaffected ones"
    )]
    pub use_affected: bool,
    #[structopt(long, help = "Same repeat count threshold for every locus")]
    pub threshold: Option<u32>,
    #[structopt(
        long,
        help = "JSON disease catalog providing pathogenic thresholds and inheritance modes",
        parse(from_os_str)
    )]
    pub catalog: Option<PathBuf>,
    #[structopt(
        long,
        help = "Allele value compared with thresholds and used for ranking [repeats, ci-end]",
        default_value = "repeats"
    )]
    pub number_to_threshold: AlleleMetric,
    #[structopt(
        long,
        help = "Inheritance mode applied to every locus, overriding all annotations [AD, AR, XD, XR]"
    )]
    pub inheritance_mode: Option<InheritanceMode>,
    #[structopt(
        long,
        help = "Inheritance mode of loci without any annotation",
        default_value = "AD"
    )]
    pub default_inheritance_mode: InheritanceMode,
    #[structopt(
        short = "n",
        long,
        help = "Maximum number of rows reported per stratum",
        default_value = "10000000"
    )]
    pub max_rows: usize,
    #[structopt(
        long,
        help = "Unaffected samples tolerated above the affected ones before a scan stops",
        default_value = "10"
    )]
    pub max_n_unaffected: usize,
    #[structopt(
        short,
        long,
        help = "Only process this locus id, can be repeated",
        number_of_values = 1
    )]
    pub locus: Vec<String>,
    #[structopt(long, help = "Only process loci with this canonical motif")]
    pub motif: Option<String>,
    #[structopt(long, help = "Only process loci with motifs of at least this many bases")]
    pub min_motif_size: Option<usize>,
    #[structopt(
        long,
        help = "Drop records whose allele purity is below this value"
    )]
    pub purity_threshold: Option<f64>,
    #[structopt(
        long,
        help = "How X-linked records are split into hemizygous and diploid [genotype-first, sex-first]",
        default_value = "genotype-first"
    )]
    pub zygosity_strategy: ZygosityStrategy,
    #[structopt(long, help = "Report threshold marker rows before each stratum")]
    pub threshold_markers: bool,
    #[structopt(
        long,
        help = "Sample ids to highlight, or files listing them one per line",
        number_of_values = 1
    )]
    pub highlight_samples: Vec<String>,
    #[structopt(
        long,
        help = "Tab delimited sample id and locus id pairs with a confirmed expansion",
        parse(from_os_str)
    )]
    pub truth_samples: Option<PathBuf>,
    #[structopt(
        long,
        help = "Tab delimited sample id and locus id pairs already reviewed",
        parse(from_os_str)
    )]
    pub previously_seen_samples: Option<PathBuf>,
    #[structopt(
        long,
        help = "Locus ids with previous diagnoses, or files listing them one per line",
        number_of_values = 1
    )]
    pub previously_diagnosed_loci: Vec<String>,
    #[structopt(
        long,
        help = "Tab delimited sample metadata joined onto the genotype tables",
        parse(from_os_str)
    )]
    pub sample_metadata_table: Option<PathBuf>,
    #[structopt(
        long,
        help = "Sample id column of the metadata table",
        default_value = "sample_id"
    )]
    pub metadata_table_sample_id_column: String,
    #[structopt(long, default_value = "SampleId")]
    pub sample_id_column: String,
    #[structopt(long, default_value = "Sample_affected")]
    pub sample_affected_status_column: String,
    #[structopt(long, default_value = "Sample_sex")]
    pub sample_sex_column: String,
    #[structopt(long, default_value = "Sample_analysis_status")]
    pub sample_analysis_status_column: String,
    #[structopt(long, default_value = "Sample_phenotypes")]
    pub sample_phenotypes_column: String,
    #[structopt(long, default_value = "Sample_genome_version")]
    pub sample_genome_version_column: String,
    #[structopt(long, default_value = "paternal_id")]
    pub sample_paternal_id_column: String,
    #[structopt(long, default_value = "maternal_id")]
    pub sample_maternal_id_column: String,
    #[structopt(long, default_value = "RepeatUnit")]
    pub motif_column: String,
    #[structopt(
        long,
        help = "Prefix of the generated output file name",
        default_value = "passed"
    )]
    pub output_prefix: String,
    #[structopt(
        short,
        long,
        help = "Write results here instead of the generated file name",
        parse(from_os_str)
    )]
    pub output: Option<PathBuf>,
    #[structopt(
        short,
        long,
        help = "Number of threads processing loci",
        default_value = "1"
    )]
    pub threads: usize,
    #[structopt(
        short,
        long,
        help = "Verbosity, repeat for more detail",
        parse(from_occurrences)
    )]
    pub verbose: u8,
}

impl RustyStr {
    pub fn set_logging(&self) {
        let level = match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };
        env_logger::Builder::new().filter_level(level).init();
    }

    pub fn validate(&self) -> Result<()> {
        if !self.use_thresholds && !self.use_affected && self.threshold.is_none() {
            return Err(Error::NoCriterion);
        }
        Ok(())
    }

    pub fn column_names(&self) -> ColumnNames {
        ColumnNames {
            sample_id: self.sample_id_column.clone(),
            affected: self.sample_affected_status_column.clone(),
            sex: self.sample_sex_column.clone(),
            motif: self.motif_column.clone(),
            analysis_status: self.sample_analysis_status_column.clone(),
            phenotypes: self.sample_phenotypes_column.clone(),
            genome_version: self.sample_genome_version_column.clone(),
            paternal_id: self.sample_paternal_id_column.clone(),
            maternal_id: self.sample_maternal_id_column.clone(),
            ..ColumnNames::default()
        }
    }

    /// A user threshold wins over known thresholds
    pub fn threshold_policy(&self) -> ThresholdPolicy {
        match self.threshold {
            Some(threshold) => ThresholdPolicy::Fixed(threshold),
            None if self.use_thresholds => ThresholdPolicy::Known,
            None => ThresholdPolicy::Disabled,
        }
    }

    pub fn triage_config(&self) -> TriageConfig {
        TriageConfig {
            metric: self.number_to_threshold,
            threshold: self.threshold_policy(),
            use_affected: self.use_affected,
            max_rows: self.max_rows,
            max_n_unaffected: self.max_n_unaffected,
            mode_override: self.inheritance_mode,
            default_mode: self.default_inheritance_mode,
            zygosity: self.zygosity_strategy,
            threshold_markers: self.threshold_markers,
            ..TriageConfig::default()
        }
    }

    pub fn record_filters(&self) -> Result<RecordFilters> {
        let mut filters = RecordFilters::new().with_loci(self.locus.iter().cloned());
        if let Some(ref motif) = self.motif {
            filters = filters.with_motif(motif)?;
        }
        if let Some(size) = self.min_motif_size {
            filters = filters.with_min_motif_size(size);
        }
        if let Some(purity) = self.purity_threshold {
            let both_alleles = self
                .inheritance_mode
                .map_or(false, |mode| mode.is_recessive());
            filters = filters.with_purity_threshold(purity, both_alleles);
        }
        Ok(filters)
    }

    /// `--output` when given, otherwise a name listing the active filters
    pub fn output_path(&self) -> PathBuf {
        if let Some(ref path) = self.output {
            return path.clone();
        }
        let mut name = self.output_prefix.clone();
        if let Some(ref motif) = self.motif {
            name.push_str(&format!(".{}", motif));
        }
        if let Some(size) = self.min_motif_size {
            name.push_str(&format!(".{}bp_min_motif_size", size));
        }
        if let Some(threshold) = self.threshold {
            name.push_str(&format!(".{}_or_more_repeats", threshold));
        }
        if let Some(mode) = self.inheritance_mode {
            name.push_str(&format!(".{}_inheritance", mode));
        }
        if let Some(purity) = self.purity_threshold {
            name.push_str(&format!(".purity_{}", purity));
        }
        if self.use_thresholds {
            name.push_str(".using_known_pathogenic_thresholds");
        }
        name.push_str(".tsv");
        PathBuf::from(name)
    }
}
