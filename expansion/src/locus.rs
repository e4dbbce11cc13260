//! Grouping and ranking of records per locus.
use crate::genotype::{AlleleMetric, GenotypeRecord, InheritanceMode};
use std::collections::BTreeMap;

/// All records of one locus. Records are held in input order until [`LocusGroup::rank`] is
/// called.
#[derive(Debug, Clone, PartialEq)]
pub struct LocusGroup {
    /// Shared locus id
    pub locus_id: String,
    /// Records of the locus
    pub records: Vec<GenotypeRecord>,
}

impl LocusGroup {
    /// Groups records already known to share a locus
    pub fn new(locus_id: String, records: Vec<GenotypeRecord>) -> Self {
        Self { locus_id, records }
    }

    /// Sorts descending by the allele summary of `mode`, then by affected status priority.
    /// The sort is stable so exact ties keep their input order.
    pub fn rank(&mut self, metric: AlleleMetric, mode: InheritanceMode) {
        rank_records(&mut self.records, metric, mode);
    }

    /// First non-empty value of a per-record annotation
    pub fn first_annotation<'a, F>(&'a self, field: F) -> Option<&'a str>
    where
        F: Fn(&'a GenotypeRecord) -> Option<&'a String>,
    {
        self.records
            .iter()
            .filter_map(field)
            .map(String::as_str)
            .find(|value| !value.is_empty())
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the locus has no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Stable descending rank, records without a value for the metric sort last
pub fn rank_records(records: &mut [GenotypeRecord], metric: AlleleMetric, mode: InheritanceMode) {
    rank_records_by(records, |record| record.rank_value(metric, mode));
}

/// Stable descending rank by `value`, ties broken by affected status priority
pub fn rank_records_by<F>(records: &mut [GenotypeRecord], value: F)
where
    F: Fn(&GenotypeRecord) -> Option<u32>,
{
    records.sort_by(|a, b| {
        let by_size = value(b).cmp(&value(a));
        by_size.then_with(|| {
            b.affected_status
                .priority()
                .cmp(&a.affected_status.priority())
        })
    });
}

/// Partitions records by locus id, loci come out sorted by id
pub fn group_by_locus(records: Vec<GenotypeRecord>) -> Vec<LocusGroup> {
    let mut groups: BTreeMap<String, Vec<GenotypeRecord>> = BTreeMap::new();
    for record in records {
        groups
            .entry(record.locus_id.clone())
            .or_default()
            .push(record);
    }
    groups
        .into_iter()
        .map(|(locus_id, records)| LocusGroup::new(locus_id, records))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genotype::AffectedStatus;

    fn record(sample: &str, a1: u32, a2: u32, status: AffectedStatus) -> GenotypeRecord {
        GenotypeRecord::new("HTT", sample, a1, a2).with_affected_status(status)
    }

    fn samples(records: &[GenotypeRecord]) -> Vec<&str> {
        records.iter().map(|r| r.sample_id.as_str()).collect()
    }

    #[test]
    fn test_grouping_keeps_input_order() {
        let records = vec![
            GenotypeRecord::new("HTT", "s1", 1, 2),
            GenotypeRecord::new("ATXN1", "s1", 1, 2),
            GenotypeRecord::new("HTT", "s2", 1, 2),
        ];
        let groups = group_by_locus(records);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].locus_id, "ATXN1");
        assert_eq!(samples(&groups[1].records), vec!["s1", "s2"]);
    }

    #[test]
    fn test_rank_dominant_and_recessive() {
        use AffectedStatus::*;
        let mut group = LocusGroup::new(
            "HTT".to_string(),
            vec![
                record("a", 20, 60, NotAffected),
                record("b", 40, 45, Affected),
                record("c", 10, 0, Unknown),
            ],
        );
        group.rank(AlleleMetric::RepeatCount, InheritanceMode::AD);
        assert_eq!(samples(&group.records), vec!["a", "b", "c"]);

        group.rank(AlleleMetric::RepeatCount, InheritanceMode::AR);
        assert_eq!(samples(&group.records), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_ties_broken_by_status_then_input_order() {
        use AffectedStatus::*;
        let records = vec![
            record("u1", 30, 30, NotAffected),
            record("q1", 30, 30, Unknown),
            record("a1", 30, 30, Affected),
            record("u2", 30, 30, NotAffected),
            record("a2", 30, 30, Affected),
        ];
        let mut ranked = records.clone();
        rank_records(&mut ranked, AlleleMetric::RepeatCount, InheritanceMode::AD);
        assert_eq!(samples(&ranked), vec!["a1", "a2", "q1", "u1", "u2"]);

        let mut shuffled = records;
        shuffled.reverse();
        rank_records(&mut shuffled, AlleleMetric::RepeatCount, InheritanceMode::AD);
        assert_eq!(samples(&shuffled), vec!["a2", "a1", "q1", "u2", "u1"]);
    }

    #[test]
    fn test_rank_is_shuffle_invariant_for_distinct_sizes() {
        let records = (1..=6)
            .map(|i| record(&format!("s{}", i), i * 3, i * 7, AffectedStatus::Unknown))
            .collect::<Vec<_>>();
        let mut forward = records.clone();
        let mut backward = records;
        backward.reverse();
        rank_records(&mut forward, AlleleMetric::RepeatCount, InheritanceMode::XR);
        rank_records(&mut backward, AlleleMetric::RepeatCount, InheritanceMode::XR);
        assert_eq!(forward, backward);
        assert_eq!(forward[0].sample_id, "s6");
    }

    #[test]
    fn test_missing_ci_sorts_last() {
        let mut records = vec![
            GenotypeRecord::new("HTT", "none", 50, 50),
            GenotypeRecord::new("HTT", "ci", 10, 10).with_ci_ends(Some(12), Some(15)),
        ];
        rank_records(&mut records, AlleleMetric::CiEnd, InheritanceMode::AD);
        assert_eq!(samples(&records), vec!["ci", "none"]);
    }
}
