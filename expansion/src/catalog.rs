//! Pathogenic thresholds keyed by canonical motif, built from an ExpansionHunter style
//! disease locus catalog.
use crate::error::Error;
use crate::genotype::InheritanceMode;
use crate::motif::{canonical_motif, is_acgt};
use crate::Result;
use log::{debug, warn};
use serde::Deserialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::convert::TryFrom;
use std::fmt;

/// Canonical motif with this threshold or lower belongs to a distinct disease family and is
/// never merged into the lookup
const CCG_MIN_THRESHOLD: u32 = 10;

/// Repeat counts appear as integers, floats or strings in catalogs
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RepeatCount {
    /// Plain integer
    Integer(u64),
    /// Fractional count
    Float(f64),
    /// Number written as a string
    Text(String),
}

impl RepeatCount {
    /// Integer value, fractional counts are truncated
    pub fn value(&self) -> Result<u32> {
        let invalid = || Error::InvalidRepeatCount(self.to_string());
        match self {
            RepeatCount::Integer(n) => u32::try_from(*n).map_err(|_| invalid()),
            RepeatCount::Float(f) => float_count(*f).ok_or_else(invalid),
            RepeatCount::Text(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(float_count)
                .ok_or_else(invalid),
        }
    }
}

fn float_count(value: f64) -> Option<u32> {
    if value.is_finite() && value >= 0.0 && value <= u32::MAX as f64 {
        Some(value as u32)
    } else {
        None
    }
}

impl fmt::Display for RepeatCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepeatCount::Integer(n) => write!(f, "{}", n),
            RepeatCount::Float(n) => write!(f, "{}", n),
            RepeatCount::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Disease entry of a catalog record
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DiseaseRecord {
    /// Smallest pathogenic repeat count
    #[serde(rename = "PathogenicMin", default)]
    pub pathogenic_min: Option<RepeatCount>,
    /// Largest normal repeat count
    #[serde(rename = "NormalMax", default)]
    pub normal_max: Option<RepeatCount>,
    /// Raw inheritance mode
    #[serde(rename = "InheritanceMode", default)]
    pub inheritance_mode: Option<String>,
}

/// Catalog record, only the fields used for thresholds are read
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CatalogRecord {
    /// Locus id, only used in warnings
    #[serde(rename = "LocusId", default)]
    pub locus_id: Option<String>,
    /// Motif of the locus
    #[serde(rename = "RepeatUnit", default)]
    pub repeat_unit: Option<String>,
    /// Diseases associated with the locus
    #[serde(rename = "Diseases", default)]
    pub diseases: Option<Vec<DiseaseRecord>>,
}

/// Minimum pathogenic repeat count and inheritance mode of a canonical motif
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdEntry {
    /// Smallest pathogenic repeat count of the motif
    pub threshold: u32,
    /// Mode of the disease the threshold came from
    pub inheritance_mode: InheritanceMode,
}

/// A catalog record that was skipped
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogWarning {
    /// 0-based position of the record in the catalog
    pub index: usize,
    /// Locus id of the record, if it has one
    pub locus_id: Option<String>,
    /// What was wrong with it
    pub reason: String,
}

impl fmt::Display for CatalogWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.locus_id {
            Some(ref locus_id) => write!(f, "Skipping {}: {}", locus_id, self.reason),
            None => write!(f, "Skipping catalog record #{}: {}", self.index + 1, self.reason),
        }
    }
}

/// Read-only canonical motif to [`ThresholdEntry`] lookup
#[derive(Debug, Clone, Default)]
pub struct ThresholdCatalog {
    entries: HashMap<String, ThresholdEntry>,
}

impl ThresholdCatalog {
    /// Builds the lookup from raw JSON catalog records. Malformed records are skipped and
    /// reported, they never abort the build.
    pub fn build(records: &[serde_json::Value]) -> (Self, Vec<CatalogWarning>) {
        let mut catalog = Self::default();
        let mut warnings = Vec::new();

        for (index, value) in records.iter().enumerate() {
            let locus_id = value
                .get("LocusId")
                .and_then(|id| id.as_str())
                .map(String::from);
            let outcome = CatalogRecord::deserialize(value)
                .map_err(|e| e.to_string())
                .and_then(|record| catalog.insert(&record));

            if let Err(reason) = outcome {
                let warning = CatalogWarning {
                    index,
                    locus_id,
                    reason,
                };
                warn!("{}", warning);
                warnings.push(warning);
            }
        }

        debug!(
            "Built threshold lookup with {} canonical motifs from {} catalog records",
            catalog.len(),
            records.len()
        );
        (catalog, warnings)
    }

    /// Merges one record, keeping the lowest threshold seen for its canonical motif
    fn insert(&mut self, record: &CatalogRecord) -> std::result::Result<(), String> {
        let locus_id = record
            .locus_id
            .as_deref()
            .ok_or_else(|| "'LocusId' key not found in catalog record".to_string())?;
        let motif = record
            .repeat_unit
            .as_deref()
            .ok_or_else(|| "'RepeatUnit' key not found".to_string())?;
        if !is_acgt(motif) {
            return Err(format!("motif contains non-ACGT bases: {}", motif));
        }

        let diseases = record.diseases.as_deref().unwrap_or(&[]);
        let thresholds = diseases
            .iter()
            .filter_map(|disease| disease.pathogenic_min.as_ref())
            .map(RepeatCount::value)
            .collect::<Result<Vec<_>>>()
            .map_err(|e| format!("unable to parse pathogenic threshold: {}", e))?;
        let min_threshold = thresholds
            .into_iter()
            .min()
            .ok_or_else(|| "no 'Diseases' records with a 'PathogenicMin' key".to_string())?;

        let mut modes: Vec<InheritanceMode> = Vec::new();
        for disease in diseases {
            let mode = disease
                .inheritance_mode
                .as_deref()
                .unwrap_or("AD")
                .parse::<InheritanceMode>()
                .map_err(|e| e.to_string())?;
            if !modes.contains(&mode) {
                modes.push(mode);
            }
        }
        let inheritance_mode = modes.first().copied().unwrap_or(InheritanceMode::AD);
        if modes.len() > 1 {
            warn!(
                "Multiple inheritance modes found for {}: {:?}. Using the first one: {}",
                locus_id, modes, inheritance_mode
            );
        }

        let canonical = canonical_motif(motif);
        if canonical == "CCG" && min_threshold < CCG_MIN_THRESHOLD {
            return Err(format!(
                "canonical motif is CCG and min threshold is {}",
                min_threshold
            ));
        }

        let entry = ThresholdEntry {
            threshold: min_threshold,
            inheritance_mode,
        };
        match self.entries.entry(canonical) {
            Entry::Vacant(slot) => {
                debug!(
                    "Adding {} with threshold {} for {}",
                    slot.key(),
                    min_threshold,
                    locus_id
                );
                slot.insert(entry);
            }
            Entry::Occupied(mut slot) => {
                if min_threshold < slot.get().threshold {
                    debug!(
                        "Updating {} threshold to {} for {}",
                        slot.key(),
                        min_threshold,
                        locus_id
                    );
                    slot.insert(entry);
                }
            }
        }
        Ok(())
    }

    /// Entry for an already canonical motif
    pub fn get(&self, canonical_motif: &str) -> Option<&ThresholdEntry> {
        self.entries.get(canonical_motif)
    }

    /// Entry for any motif, canonicalizing it first
    pub fn lookup_motif(&self, motif: &str) -> Option<&ThresholdEntry> {
        self.get(&canonical_motif(motif))
    }

    /// Number of motifs with a threshold
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no motif has a threshold
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Thresholds carried by a locus' own disease annotation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiseaseThresholds {
    /// Smallest `NormalMax + 1` across diseases
    pub intermediate_min: Option<u32>,
    /// Smallest `PathogenicMin` across diseases
    pub pathogenic_min: Option<u32>,
}

impl DiseaseThresholds {
    /// Parses a disease list written either as JSON or as a python literal
    pub fn parse(raw: &str) -> Result<Self> {
        let diseases = serde_json::from_str::<Vec<DiseaseRecord>>(raw)
            .or_else(|_| serde_json::from_str::<Vec<DiseaseRecord>>(&python_literal_to_json(raw)))
            .map_err(|_| Error::InvalidDiseaseInfo(raw.to_string()))?;
        Ok(Self::from_diseases(&diseases))
    }

    /// Unparsable fields are reported and left out
    pub fn from_diseases(diseases: &[DiseaseRecord]) -> Self {
        let min_of = |field: &str, values: Vec<Result<u32>>| {
            let (ok, failed): (Vec<_>, Vec<_>) = values.into_iter().partition(|v| v.is_ok());
            if let Some(Err(e)) = failed.into_iter().next() {
                warn!("Couldn't parse {} fields from disease info: {}", field, e);
                return None;
            }
            ok.into_iter().filter_map(|v| v.ok()).min()
        };

        let intermediate = diseases
            .iter()
            .filter_map(|d| d.normal_max.as_ref())
            .map(|n| n.value().map(|v| v.saturating_add(1)))
            .collect();
        let pathogenic = diseases
            .iter()
            .filter_map(|d| d.pathogenic_min.as_ref())
            .map(RepeatCount::value)
            .collect();

        Self {
            intermediate_min: min_of("NormalMax", intermediate),
            pathogenic_min: min_of("PathogenicMin", pathogenic),
        }
    }

    /// Threshold used for filtering: the lower of the intermediate and pathogenic bounds
    pub fn threshold(&self) -> Option<u32> {
        [self.intermediate_min, self.pathogenic_min]
            .iter()
            .flatten()
            .filter(|t| **t > 0)
            .min()
            .copied()
    }
}

fn python_literal_to_json(raw: &str) -> String {
    raw.replace('\'', "\"")
        .replace("None", "null")
        .replace("True", "true")
        .replace("False", "false")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(locus_id: &str, motif: &str, thresholds: &[u32], mode: Option<&str>) -> serde_json::Value {
        let diseases = thresholds
            .iter()
            .map(|t| match mode {
                Some(mode) => json!({"PathogenicMin": t, "InheritanceMode": mode}),
                None => json!({ "PathogenicMin": t }),
            })
            .collect::<Vec<_>>();
        json!({"LocusId": locus_id, "RepeatUnit": motif, "Diseases": diseases})
    }

    #[test]
    fn test_canonical_motif_merge_keeps_min() {
        let records = vec![
            record("HTT", "CAG", &[36], Some("AD")),
            record("ATXN1", "CTG", &[50], Some("AR")),
        ];
        let (catalog, warnings) = ThresholdCatalog::build(&records);

        assert!(warnings.is_empty());
        assert_eq!(catalog.len(), 1);
        assert_eq!(
            catalog.lookup_motif("CAG"),
            Some(&ThresholdEntry {
                threshold: 36,
                inheritance_mode: InheritanceMode::AD
            })
        );
    }

    #[test]
    fn test_lower_threshold_replaces_mode() {
        let records = vec![
            record("A", "GAA", &[66], Some("AR")),
            record("B", "AAG", &[40], Some("AD")),
            record("C", "TTC", &[40], Some("XR")),
        ];
        let (catalog, _) = ThresholdCatalog::build(&records);
        let entry = catalog.lookup_motif("GAA").unwrap();
        assert_eq!(entry.threshold, 40);
        assert_eq!(entry.inheritance_mode, InheritanceMode::AD);
    }

    #[test]
    fn test_ccg_low_threshold_dropped() {
        let records = vec![record("XYLT1", "GCC", &[8], None)];
        let (catalog, warnings) = ThresholdCatalog::build(&records);
        assert!(catalog.is_empty());
        assert_eq!(warnings.len(), 1);

        let records = vec![record("FMR1", "CGG", &[200], Some("XD"))];
        let (catalog, _) = ThresholdCatalog::build(&records);
        assert_eq!(catalog.get("CCG").map(|e| e.threshold), Some(200));
    }

    #[test]
    fn test_bad_records_are_skipped() {
        let records = vec![
            json!({"RepeatUnit": "CAG", "Diseases": [{"PathogenicMin": 36}]}),
            record("RFC1", "AARRG", &[400], None),
            record("NOTHRESH", "CAG", &[], None),
            json!({"LocusId": "TEXT", "RepeatUnit": "CAG", "Diseases": [{"PathogenicMin": "abc"}]}),
            json!({"LocusId": "MODE", "RepeatUnit": "CAG", "Diseases": [{"PathogenicMin": 30, "InheritanceMode": "Mito"}]}),
            json!({"LocusId": "OK", "RepeatUnit": "GCN", "Diseases": "bad"}),
            json!({"LocusId": "STR", "RepeatUnit": "GAA", "Diseases": [{"PathogenicMin": "66"}]}),
        ];
        let (catalog, warnings) = ThresholdCatalog::build(&records);

        assert_eq!(warnings.len(), 6);
        assert_eq!(warnings[0].locus_id, None);
        assert_eq!(warnings[1].locus_id.as_deref(), Some("RFC1"));
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.lookup_motif("GAA").map(|e| e.threshold), Some(66));
    }

    #[test]
    fn test_multiple_modes_pick_first() {
        let records = vec![json!({
            "LocusId": "ATXN8OS",
            "RepeatUnit": "CTG",
            "Diseases": [
                {"PathogenicMin": 80, "InheritanceMode": "AR"},
                {"PathogenicMin": 74},
            ]
        })];
        let (catalog, warnings) = ThresholdCatalog::build(&records);
        assert!(warnings.is_empty());
        let entry = catalog.lookup_motif("CTG").unwrap();
        assert_eq!(entry.threshold, 74);
        assert_eq!(entry.inheritance_mode, InheritanceMode::AR);
    }

    #[test]
    fn test_disease_thresholds_from_python_literal() {
        let raw = "[{'Symbol': 'HD', 'NormalMax': 26, 'PathogenicMin': '40'}, {'PathogenicMin': 36.0, 'NormalMax': None}]";
        let thresholds = DiseaseThresholds::parse(raw).unwrap();
        assert_eq!(thresholds.intermediate_min, Some(27));
        assert_eq!(thresholds.pathogenic_min, Some(36));
        assert_eq!(thresholds.threshold(), Some(27));

        assert!(DiseaseThresholds::parse("not a list").is_err());
        assert_eq!(DiseaseThresholds::default().threshold(), None);
    }
}
