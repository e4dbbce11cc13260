#![warn(missing_debug_implementations, rust_2018_idioms, missing_docs)]

//! Crate for triaging tandem repeat genotype calls into candidate pathogenic expansions.
//! Genotypes are grouped per locus and ranked by their most relevant allele, X-linked loci
//! are split into hemizygous and diploid strata, and each stratum is filtered by a pathogenic
//! threshold and/or by how far affected samples stand out from unaffected ones.
//!
//! Thresholds come from a user supplied value, from an ExpansionHunter style disease catalog
//! keyed by canonical motif, or from the locus' own disease annotation.

pub mod annotate;
pub mod catalog;
pub mod classify;
pub mod compose;
pub mod config;
pub mod engine;
mod error;
pub mod filters;
pub mod genotype;
pub mod locus;
pub mod motif;
pub mod separation;
pub mod strata;
pub mod table;

pub use crate::annotate::{Annotator, SampleAnnotation};
pub use crate::catalog::{CatalogWarning, DiseaseThresholds, ThresholdCatalog, ThresholdEntry};
pub use crate::compose::{LocusOutcome, MarkerKind, ResultRow, ResultTable, SkipReason, StratumResult};
pub use crate::config::{SeparationMargins, ThresholdPolicy, TriageConfig};
pub use crate::engine::Engine;
pub use crate::error::Error;
pub use crate::filters::RecordFilters;
pub use crate::genotype::{
    AffectedStatus, AlleleMetric, ColumnNames, GenotypeRecord, InheritanceMode, Normalizer, Sex,
};
pub use crate::locus::{group_by_locus, LocusGroup};
pub use crate::strata::{StratumKind, ZygosityStrategy};
pub use crate::table::RawTable;

/// Result type of the crate
pub type Result<T> = std::result::Result<T, Error>;
