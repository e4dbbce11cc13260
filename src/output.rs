use crate::error::Error;
use expansion::{Annotator, GenotypeRecord, MarkerKind, ResultRow, ResultTable, StratumResult};
use log::info;
use std::collections::BTreeSet;
use std::io::Write;

type Result<T> = std::result::Result<T, Error>;

/// Columns of the result table
pub const HEADER: [&str; 24] = [
    "SampleId",
    "LocusId",
    "affected",
    "sex",
    "genome",
    "Genotype",
    "GenotypeCI",
    "Mode",
    "Motif",
    "CanonicalMotif",
    "Allele1",
    "Allele2",
    "MinAllele",
    "MaxAllele",
    "CIEnd1",
    "CIEnd2",
    "Stratum",
    "Threshold",
    "analysis_status",
    "hpo",
    "paternal_id",
    "maternal_id",
    "PaternalGenotype",
    "MaternalGenotype",
];

/// Filler of marker row cells that only make sense for samples
pub const SEPARATOR: &str = "---";

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn count(value: Option<u32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn threshold_cell(stratum: &StratumResult) -> String {
    count(stratum.threshold)
}

fn record_row(stratum: &StratumResult, record: &GenotypeRecord, annotator: &Annotator) -> Vec<String> {
    let annotation = annotator.annotate(record);
    let metadata = &record.metadata;
    vec![
        annotation.display_id(&record.sample_id),
        record.locus_id.clone(),
        record.affected_status.as_str().to_string(),
        record.sex.as_str().to_string(),
        text(&metadata.genome_version),
        text(&record.genotype_string),
        text(&record.genotype_ci_string),
        stratum.mode.to_string(),
        text(&record.motif),
        text(&record.canonical_motif),
        record.allele_1_count.to_string(),
        record.allele_2_count.to_string(),
        record.min_allele.to_string(),
        record.max_allele.to_string(),
        count(record.ci_end_1),
        count(record.ci_end_2),
        stratum.kind.to_string(),
        threshold_cell(stratum),
        text(&metadata.analysis_status),
        text(&metadata.phenotypes),
        text(&metadata.paternal_id),
        text(&metadata.maternal_id),
        text(&annotation.paternal_genotype),
        text(&annotation.maternal_genotype),
    ]
}

fn marker_row(
    stratum: &StratumResult,
    kind: MarkerKind,
    threshold: u32,
    allele_1: u32,
    allele_2: u32,
) -> Vec<String> {
    let mut row = vec![SEPARATOR.to_string(); HEADER.len()];
    row[0] = format!("**{}**", kind.label());
    row[1] = stratum.locus_id.clone();
    row[5] = format!(">= {}", threshold);
    row[7] = stratum.mode.to_string();
    row[10] = allele_1.to_string();
    row[11] = allele_2.to_string();
    row[16] = stratum.kind.to_string();
    row[17] = threshold.to_string();
    row
}

/// Renders one row of the result table
pub fn render(stratum: &StratumResult, row: &ResultRow, annotator: &Annotator) -> Vec<String> {
    match row {
        ResultRow::Genotype(record) => record_row(stratum, record, annotator),
        ResultRow::Marker {
            kind,
            threshold,
            allele_1,
            allele_2,
        } => marker_row(stratum, *kind, *threshold, *allele_1, *allele_2),
    }
}

/// Reported loci flagged as previously diagnosed, each listed once
pub fn diagnosed_loci<'a>(results: &'a ResultTable, annotator: &Annotator) -> Vec<&'a str> {
    results
        .strata()
        .iter()
        .map(|stratum| stratum.locus_id.as_str())
        .filter(|locus_id| annotator.is_diagnosed(locus_id))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Writes the header and every row as tab delimited text, returns the number of rows
pub fn write_results<W: Write>(
    results: &ResultTable,
    annotator: &Annotator,
    writer: W,
) -> Result<usize> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(writer);
    wtr.write_record(&HEADER)?;

    for locus_id in diagnosed_loci(results, annotator) {
        info!("{} was previously diagnosed", locus_id);
    }

    let mut written = 0;
    for (stratum, row) in results.rows() {
        wtr.write_record(render(stratum, row, annotator))?;
        written += 1;
    }
    wtr.flush()?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use expansion::{InheritanceMode, StratumKind};

    fn stratum(rows: Vec<ResultRow>) -> StratumResult {
        StratumResult {
            locus_id: "DMD".to_string(),
            kind: StratumKind::Hemizygous,
            mode: InheritanceMode::XR,
            threshold: Some(50),
            rows,
        }
    }

    #[test]
    fn test_marker_row_layout() {
        let marker = ResultRow::marker(MarkerKind::Pathogenic, 50, StratumKind::Hemizygous);
        let stratum = stratum(vec![marker.clone()]);
        let row = render(&stratum, &marker, &Annotator::new());
        assert_eq!(row.len(), HEADER.len());
        assert_eq!(row[0], "**Pathogenic Threshold**");
        assert_eq!(row[5], ">= 50");
        assert_eq!(row[10], "50");
        assert_eq!(row[11], "0");
        assert_eq!(row[2], SEPARATOR);
    }

    #[test]
    fn test_record_row_annotated() {
        let record = GenotypeRecord::new("DMD", "s1", 60, 0).with_genotype("60");
        let annotator = Annotator::new().with_highlight_samples(vec!["s1".to_string()]);
        let stratum = stratum(vec![ResultRow::Genotype(record.clone())]);
        let row = render(&stratum, &stratum.rows[0], &annotator);
        assert_eq!(row[0], "==> s1");
        assert_eq!(row[5], "60");
        assert_eq!(row[7], "XR");
        assert_eq!(row[17], "50");
    }

    #[test]
    fn test_diagnosed_loci_listed_once() {
        let hemizygous = stratum(vec![ResultRow::Genotype(GenotypeRecord::new("DMD", "m", 60, 0))]);
        let mut diploid = hemizygous.clone();
        diploid.kind = StratumKind::Diploid;
        let table = ResultTable::from_outcomes(vec![expansion::LocusOutcome::Reported(vec![
            hemizygous, diploid,
        ])]);
        let annotator = Annotator::new().with_diagnosed_loci(vec!["DMD".to_string(), "HTT".to_string()]);
        assert_eq!(diagnosed_loci(&table, &annotator), vec!["DMD"]);
        assert!(diagnosed_loci(&table, &Annotator::new()).is_empty());
    }

    #[test]
    fn test_write_results() {
        let record = GenotypeRecord::new("DMD", "s1", 60, 0);
        let table = ResultTable::from_outcomes(vec![expansion::LocusOutcome::Reported(vec![
            stratum(vec![ResultRow::Genotype(record)]),
        ])]);
        let mut buffer = Vec::new();
        let written = write_results(&table, &Annotator::new(), &mut buffer).unwrap();
        assert_eq!(written, 1);
        let text = String::from_utf8(buffer).unwrap();
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("SampleId\tLocusId"));
        assert!(lines[1].starts_with("s1\tDMD"));
    }
}
