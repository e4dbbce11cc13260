use thiserror::Error;

#[derive(Debug, Error)]
/// Errors that stop a whole run, mostly caused by malformed genotype tables
pub enum Error {
    #[error("Genotype table is missing these required columns: {}", .0.join(", "))]
    /// Required columns are absent from the genotype table
    SchemaError(Vec<String>),
    #[error("Unexpected value `{value}` in column `{column}` on row {row}")]
    /// Closed vocabulary column holds a value that could not be normalized
    DataError {
        /// Name of the offending column
        column: String,
        /// Raw value found in the table
        value: String,
        /// 1-based data row
        row: usize,
    },
    #[error("Motif `{0}` may only contain A, C, G and T")]
    /// Motif filter holds characters other than nucleotides
    InvalidMotif(String),
    #[error("Unknown inheritance mode `{0}`, expected one of AD, AR, XD or XR")]
    /// Inheritance mode outside of AD/AR/XD/XR
    UnknownInheritanceMode(String),
    #[error("Could not parse `{0}` as a repeat count")]
    /// Threshold or repeat count is not numeric
    InvalidRepeatCount(String),
    #[error("Could not parse disease info `{0}`")]
    /// Embedded disease annotation is neither JSON nor a python style literal
    InvalidDiseaseInfo(String),
    #[error("Unknown allele metric `{0}`, expected `repeats` or `ci-end`")]
    /// Allele metric name not recognized
    UnknownAlleleMetric(String),
    #[error("Unknown zygosity strategy `{0}`, expected `genotype-first` or `sex-first`")]
    /// Zygosity strategy name not recognized
    UnknownZygosityStrategy(String),
}
