#![warn(missing_debug_implementations, rust_2018_idioms)]

//! Triage of tandem repeat genotype tables for candidate pathogenic expansions.
mod cli;
mod error;
mod io;
mod output;

use expansion::filters::{drop_duplicates, drop_unmatched_variant_ids};
use expansion::{group_by_locus, Annotator, Engine, Normalizer, ResultTable, ThresholdCatalog};
use log::{info, warn};
use rayon::prelude::*;
use structopt::StructOpt;

type Result<T> = std::result::Result<T, crate::error::Error>;

fn main() -> Result<()> {
    let opt = cli::RustyStr::from_args();
    opt.set_logging();
    opt.validate()?;

    rayon::ThreadPoolBuilder::new()
        .num_threads(opt.threads)
        .build_global()
        .or_else(|_| Err(crate::error::Error::ThreadError))?;

    let mut table = io::read_tables(&opt.genotype_tables)?;
    if let Some(ref path) = opt.sample_metadata_table {
        let metadata = io::read_table(path)?;
        let before = table.len();
        table.left_join(
            &opt.sample_id_column,
            &metadata,
            &opt.metadata_table_sample_id_column,
        )?;
        if table.len() != before {
            return Err(crate::error::Error::MetadataJoinError(before, table.len()));
        }
    }

    let columns = opt.column_names();
    let config = opt.triage_config();
    let records = Normalizer::new(&columns, config.metric).normalize(&table)?;
    let records = drop_unmatched_variant_ids(drop_duplicates(records));

    let mut annotator = Annotator::new()
        .with_highlight_samples(io::read_id_list(&opt.highlight_samples)?)
        .with_diagnosed_loci(io::read_id_list(&opt.previously_diagnosed_loci)?)
        .with_genotypes(&records);
    if let Some(ref path) = opt.truth_samples {
        annotator = annotator.with_truth_samples(io::read_pairs(path)?);
    }
    if let Some(ref path) = opt.previously_seen_samples {
        annotator = annotator.with_previously_seen_samples(io::read_pairs(path)?);
    }
    annotator.restrict_to(&records);

    let records = opt.record_filters()?.apply(records);

    let catalog = match opt.catalog {
        Some(ref path) => {
            let values = io::read_catalog(path)?;
            let (catalog, warnings) = ThresholdCatalog::build(&values);
            info!(
                "Loaded thresholds for {} motifs from {} catalog records, {} skipped",
                catalog.len(),
                values.len(),
                warnings.len()
            );
            Some(catalog)
        }
        None => None,
    };

    let engine = Engine::new(&config, catalog.as_ref());
    let groups = group_by_locus(records);
    info!("Processing {} loci", groups.len());
    let outcomes = groups
        .into_par_iter()
        .map(|group| engine.process_locus(group))
        .collect::<Vec<_>>();
    let results = ResultTable::from_outcomes(outcomes);

    if !results.skipped().is_empty() {
        warn!(
            "Skipped {} loci without a known threshold",
            results.skipped().len()
        );
    }
    info!(
        "{} loci reported, {} without reportable records",
        results
            .strata()
            .iter()
            .map(|stratum| stratum.locus_id.as_str())
            .collect::<std::collections::BTreeSet<_>>()
            .len(),
        results.empty().len()
    );

    let path = opt.output_path();
    let file = std::fs::File::create(&path)?;
    let written = output::write_results(&results, &annotator, std::io::BufWriter::new(file))?;
    info!("Wrote {} rows to {}", written, path.display());
    Ok(())
}
