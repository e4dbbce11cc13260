use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
/// Errors of which majority are related to I/O issues or incorrect file format errors
pub enum Error {
    #[error("{0}")]
    /// Genotype table or catalog content could not be triaged
    ExpansionError(#[from] expansion::Error),
    #[error("Could not read or write file")]
    /// Generic I/O failure
    IoError(#[from] std::io::Error),
    #[error("Could not read or write tab delimited table")]
    /// Malformed TSV or failed write
    TableError(#[from] csv::Error),
    #[error("Could not parse the disease catalog")]
    /// Catalog is not valid JSON
    CatalogError(#[from] serde_json::Error),
    #[error("Could not open compressed file")]
    /// Reading through niffler failed
    CompressionError(#[from] niffler::Error),
    #[error("Could not spawn threads")]
    /// Create thread pools erorr
    ThreadError,
    #[error("File {0} does not exist")]
    /// Input path missing
    FileNotFound(PathBuf),
    #[error("Disease catalog {0} must be a JSON array of records")]
    /// Catalog root is not an array
    CatalogNotArray(PathBuf),
    #[error("At least one of --use-thresholds, --use-affected or --threshold is required")]
    /// No classification criterion selected
    NoCriterion,
    #[error("Joining sample metadata changed the number of rows from {0} to {1}")]
    /// Metadata join duplicated or lost rows
    MetadataJoinError(usize, usize),
}
