use serde::Serialize;

use crate::aggregation::total_per_bucket;
use crate::record::DatedRecord;
use crate::scope::{BucketKey, Scope};

pub const UNTAGGED_LABEL: &str = "None";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub label: String,
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubTypeShare {
    pub name: String,
    pub sum: f64,
    pub share: f64,
}

pub fn distinct_sub_types<R: DatedRecord>(records: &[R]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for sub_type in records.iter().filter_map(|r| r.sub_type()) {
        if !seen.iter().any(|s| s == sub_type) {
            seen.push(sub_type.to_string());
        }
    }
    seen
}

pub fn series_per_sub_type<R: DatedRecord>(
    scope: Scope,
    records: &[R],
    buckets: &[BucketKey],
) -> Vec<Series> {
    distinct_sub_types(records)
        .into_iter()
        .map(|label| {
            let tagged: Vec<&R> = records
                .iter()
                .filter(|r| r.sub_type() == Some(label.as_str()))
                .collect();
            let data = total_per_bucket(scope, &tagged, buckets, None);
            Series { label, data }
        })
        .collect()
}

pub fn shares_per_sub_type<R: DatedRecord>(records: &[R]) -> Vec<SubTypeShare> {
    let mut sums: Vec<(String, f64)> = Vec::new();
    for record in records {
        let name = record.sub_type().unwrap_or(UNTAGGED_LABEL);
        match sums.iter_mut().find(|(n, _)| n == name) {
            Some((_, sum)) => *sum += record.amount(),
            None => sums.push((name.to_string(), record.amount())),
        }
    }

    let total = sums.iter().fold(0.0, |acc, (_, sum)| acc + sum);
    sums.into_iter()
        .map(|(name, sum)| SubTypeShare {
            name,
            sum,
            share: if total == 0.0 { 0.0 } else { sum / total },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::month::Month;
    use crate::record::RecordDate;

    struct Logged {
        hours: f64,
        month: Month,
        tag: Option<&'static str>,
    }

    impl DatedRecord for Logged {
        fn amount(&self) -> f64 {
            self.hours
        }

        fn date(&self) -> RecordDate {
            RecordDate::new(2024, self.month)
        }

        fn sub_type(&self) -> Option<&str> {
            self.tag
        }
    }

    fn logs() -> Vec<Logged> {
        vec![
            Logged { hours: 8.0, month: Month::January, tag: Some("Client A") },
            Logged { hours: 4.0, month: Month::January, tag: Some("Client B") },
            Logged { hours: 6.0, month: Month::March, tag: Some("Client A") },
            Logged { hours: 2.0, month: Month::March, tag: None },
        ]
    }

    #[test]
    fn test_series_per_sub_type() {
        let buckets = vec![
            BucketKey::Month(Month::January),
            BucketKey::Month(Month::February),
            BucketKey::Month(Month::March),
        ];
        let series = series_per_sub_type(Scope::Year(2024), &logs(), &buckets);

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].label, "Client A");
        assert_eq!(series[0].data, vec![8.0, 0.0, 6.0]);
        assert_eq!(series[1].label, "Client B");
        assert_eq!(series[1].data, vec![4.0, 0.0, 0.0]);
    }

    #[test]
    fn test_shares_per_sub_type() {
        let shares = shares_per_sub_type(&logs());
        assert_eq!(shares.len(), 3);

        let untagged = shares.iter().find(|s| s.name == UNTAGGED_LABEL).unwrap();
        assert_eq!(untagged.sum, 2.0);
        assert_eq!(untagged.share, 0.1);

        let total_share: f64 = shares.iter().map(|s| s.share).sum();
        assert!((total_share - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_shares_of_nothing() {
        let none: Vec<Logged> = Vec::new();
        assert!(shares_per_sub_type(&none).is_empty());
    }
}
