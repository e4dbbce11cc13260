//! Display annotations for reported samples. Nothing here feeds back into classification.
use crate::genotype::GenotypeRecord;
use log::{info, warn};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Prefix of highlighted sample ids
pub const HIGHLIGHT_PREFIX: &str = "==> ";
/// Prefix of samples known to carry an expansion at the locus
pub const TRUTH_PREFIX: &str = "*T* ";
/// Prefix of samples already reviewed at the locus
pub const PREVIOUSLY_SEEN_PREFIX: &str = "*P* ";

/// Annotations of one reported record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleAnnotation {
    /// Sample is on the highlight list
    pub highlighted: bool,
    /// Sample carries a confirmed expansion at the locus
    pub truth: bool,
    /// Sample was reviewed at the locus before
    pub previously_seen: bool,
    /// Father's genotype at the locus
    pub paternal_genotype: Option<String>,
    /// Mother's genotype at the locus
    pub maternal_genotype: Option<String>,
}

impl SampleAnnotation {
    /// Sample id with its markers. Truth marks take precedence over previously seen ones.
    pub fn display_id(&self, sample_id: &str) -> String {
        let mut id = String::new();
        if self.truth {
            id.push_str(TRUTH_PREFIX);
        } else if self.previously_seen {
            id.push_str(PREVIOUSLY_SEEN_PREFIX);
        }
        if self.highlighted {
            id.push_str(HIGHLIGHT_PREFIX);
        }
        id.push_str(sample_id);
        id
    }
}

/// Sample and locus lists used to mark up reported rows, plus a genotype lookup for parents
#[derive(Debug, Clone, Default)]
pub struct Annotator {
    highlight: HashSet<String>,
    truth: HashSet<(String, String)>,
    previously_seen: HashSet<(String, String)>,
    diagnosed_loci: HashSet<String>,
    genotypes: HashMap<(String, String), String>,
}

impl Annotator {
    /// Annotator without any lists
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample ids to highlight
    pub fn with_highlight_samples<I: IntoIterator<Item = String>>(mut self, samples: I) -> Self {
        self.highlight.extend(samples);
        self
    }

    /// `(sample id, locus id)` pairs
    pub fn with_truth_samples<I: IntoIterator<Item = (String, String)>>(mut self, pairs: I) -> Self {
        self.truth.extend(pairs);
        self
    }

    /// `(sample id, locus id)` pairs
    pub fn with_previously_seen_samples<I: IntoIterator<Item = (String, String)>>(
        mut self,
        pairs: I,
    ) -> Self {
        self.previously_seen.extend(pairs);
        self
    }

    /// Loci diagnosed before
    pub fn with_diagnosed_loci<I: IntoIterator<Item = String>>(mut self, loci: I) -> Self {
        self.diagnosed_loci.extend(loci);
        self
    }

    /// Indexes genotype calls by sample and locus so parents can be looked up
    pub fn with_genotypes(mut self, records: &[GenotypeRecord]) -> Self {
        for record in records {
            if let Some(ref genotype) = record.genotype_string {
                self.genotypes
                    .entry((record.sample_id.clone(), record.locus_id.clone()))
                    .or_insert_with(|| genotype.clone());
            }
        }
        self
    }

    /// Warns about and forgets ids that do not occur in `records`
    pub fn restrict_to(&mut self, records: &[GenotypeRecord]) {
        let samples = records
            .iter()
            .map(|r| r.sample_id.as_str())
            .collect::<HashSet<_>>();
        let loci = records
            .iter()
            .map(|r| r.locus_id.as_str())
            .collect::<HashSet<_>>();

        let unknown = self
            .highlight
            .iter()
            .filter(|id| !samples.contains(id.as_str()))
            .cloned()
            .collect::<BTreeSet<_>>();
        if !unknown.is_empty() {
            warn!(
                "Cannot highlight {} ids as they aren't in the genotype table(s): {:?}",
                unknown.len(),
                unknown
            );
            self.highlight.retain(|id| !unknown.contains(id));
        }
        if !self.highlight.is_empty() {
            info!("Will highlight {} sample ids", self.highlight.len());
        }

        let unknown = self
            .diagnosed_loci
            .iter()
            .filter(|id| !loci.contains(id.as_str()))
            .cloned()
            .collect::<BTreeSet<_>>();
        if !unknown.is_empty() {
            warn!(
                "Cannot highlight {} loci as they aren't in the genotype table(s): {:?}",
                unknown.len(),
                unknown
            );
            self.diagnosed_loci.retain(|id| !unknown.contains(id));
        }

        for (name, pairs) in &mut [
            ("truth samples", &mut self.truth),
            ("previously seen samples", &mut self.previously_seen),
        ] {
            let unknown = pairs
                .iter()
                .filter(|(sample, locus)| {
                    !samples.contains(sample.as_str()) || !loci.contains(locus.as_str())
                })
                .cloned()
                .collect::<BTreeSet<_>>();
            if !unknown.is_empty() {
                warn!(
                    "Cannot mark {} entries from the {} table since they aren't in the genotype table(s): {:?}",
                    unknown.len(),
                    name,
                    unknown
                );
                pairs.retain(|pair| !unknown.contains(pair));
            }
        }
    }

    /// Whether the locus was diagnosed before with short reads
    pub fn is_diagnosed(&self, locus_id: &str) -> bool {
        self.diagnosed_loci.contains(locus_id)
    }

    /// Genotype of `sample_id` at `locus_id`, if it was called
    pub fn genotype_of(&self, sample_id: &str, locus_id: &str) -> Option<&str> {
        self.genotypes
            .get(&(sample_id.to_string(), locus_id.to_string()))
            .map(String::as_str)
    }

    /// Annotations of one record
    pub fn annotate(&self, record: &GenotypeRecord) -> SampleAnnotation {
        let key = (record.sample_id.clone(), record.locus_id.clone());
        let parent_genotype = |parent: &Option<String>| {
            parent
                .as_deref()
                .and_then(|id| self.genotype_of(id, &record.locus_id))
                .map(String::from)
        };
        SampleAnnotation {
            highlighted: self.highlight.contains(&record.sample_id),
            truth: self.truth.contains(&key),
            previously_seen: self.previously_seen.contains(&key),
            paternal_genotype: parent_genotype(&record.metadata.paternal_id),
            maternal_genotype: parent_genotype(&record.metadata.maternal_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(sample: &str, locus: &str, genotype: &str) -> GenotypeRecord {
        GenotypeRecord::new(locus, sample, 10, 20).with_genotype(genotype)
    }

    fn pair(sample: &str, locus: &str) -> (String, String) {
        (sample.to_string(), locus.to_string())
    }

    #[test]
    fn test_display_prefixes() {
        let annotator = Annotator::new()
            .with_highlight_samples(vec!["s1".to_string()])
            .with_truth_samples(vec![pair("s2", "HTT")])
            .with_previously_seen_samples(vec![pair("s2", "HTT"), pair("s3", "HTT")]);

        let display = |sample: &str, locus: &str| {
            annotator
                .annotate(&record(sample, locus, "10/20"))
                .display_id(sample)
        };
        assert_eq!(display("s1", "HTT"), "==> s1");
        assert_eq!(display("s2", "HTT"), "*T* s2");
        assert_eq!(display("s2", "FXN"), "s2");
        assert_eq!(display("s3", "HTT"), "*P* s3");
        assert_eq!(display("s4", "HTT"), "s4");
    }

    #[test]
    fn test_parent_genotypes() {
        let mut child = record("child", "HTT", "17/45");
        child.metadata.paternal_id = Some("dad".to_string());
        child.metadata.maternal_id = Some("mum".to_string());
        let records = vec![
            child.clone(),
            record("dad", "HTT", "17/20"),
            record("dad", "FXN", "8/9"),
        ];
        let annotator = Annotator::new().with_genotypes(&records);
        let annotation = annotator.annotate(&child);
        assert_eq!(annotation.paternal_genotype.as_deref(), Some("17/20"));
        assert_eq!(annotation.maternal_genotype, None);
    }

    #[test]
    fn test_restrict_to_known_ids() {
        let records = vec![record("s1", "HTT", "10/20")];
        let mut annotator = Annotator::new()
            .with_highlight_samples(vec!["s1".to_string(), "ghost".to_string()])
            .with_truth_samples(vec![pair("s1", "HTT"), pair("s1", "DMD")])
            .with_diagnosed_loci(vec!["HTT".to_string(), "DMD".to_string()]);
        annotator.restrict_to(&records);

        assert!(annotator.is_diagnosed("HTT"));
        assert!(!annotator.is_diagnosed("DMD"));
        assert!(annotator.annotate(&records[0]).truth);
        assert_eq!(annotator.highlight.len(), 1);
        assert_eq!(annotator.truth.len(), 1);
    }
}
