use chrono::Datelike;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::month::{Month, DEFINED_MONTHS};
use crate::record::DatedRecord;
use crate::scope::{bucket_key, BucketKey, Scope};

pub fn months<R: DatedRecord>(scope: Scope, records: &[R]) -> Vec<BucketKey> {
    records
        .iter()
        .map(|record| bucket_key(scope, record))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn months_across<A: DatedRecord, B: DatedRecord>(
    scope: Scope,
    first: &[A],
    second: &[B],
) -> Vec<BucketKey> {
    let mut keys: BTreeSet<BucketKey> = first.iter().map(|r| bucket_key(scope, r)).collect();
    keys.extend(second.iter().map(|r| bucket_key(scope, r)));
    keys.into_iter().collect()
}

pub fn calendar_months(year: i32, today: impl Datelike) -> Vec<BucketKey> {
    let months = if year == today.year() {
        &DEFINED_MONTHS[..=Month::of(&today).index()]
    } else {
        &DEFINED_MONTHS[..]
    };
    months.iter().copied().map(BucketKey::Month).collect()
}

// Records without a sub type pass any sub type filter.
pub fn total_per_bucket<R: DatedRecord>(
    scope: Scope,
    records: &[R],
    buckets: &[BucketKey],
    sub_type: Option<&str>,
) -> Vec<f64> {
    buckets
        .iter()
        .map(|bucket| {
            records
                .iter()
                .filter(|record| bucket_key(scope, *record) == *bucket)
                .filter(|record| matches_sub_type(*record, sub_type))
                .fold(0.0, |acc, record| acc + record.amount())
        })
        .collect()
}

fn matches_sub_type<R: DatedRecord>(record: &R, filter: Option<&str>) -> bool {
    match (filter, record.sub_type()) {
        (Some(wanted), Some(actual)) => wanted == actual,
        _ => true,
    }
}

pub fn grand_total<R: DatedRecord>(records: &[R]) -> f64 {
    records.iter().fold(0.0, |acc, record| acc + record.amount())
}

pub fn netto_per_bucket<I: DatedRecord, E: DatedRecord>(
    scope: Scope,
    income: &[I],
    expenses: &[E],
    buckets: &[BucketKey],
) -> Vec<f64> {
    let incoming = total_per_bucket(scope, income, buckets, None);
    let outgoing = total_per_bucket(scope, expenses, buckets, None);
    incoming
        .into_iter()
        .zip(outgoing)
        .map(|(income, expense)| income - expense)
        .collect()
}

pub fn total_netto<I: DatedRecord, E: DatedRecord>(
    scope: Scope,
    income: &[I],
    expenses: &[E],
) -> f64 {
    let buckets = months_across(scope, income, expenses);
    netto_per_bucket(scope, income, expenses, &buckets)
        .into_iter()
        .fold(0.0, |acc, value| acc + value)
}

pub fn average_per_month<R: DatedRecord>(scope: Scope, records: &[R]) -> f64 {
    let buckets = months(scope, records);
    if buckets.is_empty() {
        return 0.0;
    }
    let total = total_per_bucket(scope, records, &buckets, None)
        .into_iter()
        .fold(0.0, |acc, value| acc + value);
    total / buckets.len() as f64
}

pub fn sub_type_total<R: DatedRecord>(scope: Scope, records: &[R], sub_type: &str) -> f64 {
    let buckets = months(scope, records);
    total_per_bucket(scope, records, &buckets, Some(sub_type))
        .into_iter()
        .fold(0.0, |acc, value| acc + value)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PercentageSplit {
    pub incoming_percentage: f64,
    pub outgoing_percentage: f64,
    pub is_outgoing_higher_than_incoming: bool,
}

pub fn monthly_percentage_split<I: DatedRecord, E: DatedRecord>(
    income: &[I],
    expenses: &[E],
    month: Month,
) -> PercentageSplit {
    let income_sum = income
        .iter()
        .filter(|record| record.date().month == month)
        .fold(0.0, |acc, record| acc + record.amount());
    let expense_sum = expenses
        .iter()
        .filter(|record| record.date().month == month)
        .fold(0.0, |acc, record| acc + record.amount());

    let denominator = income_sum + expense_sum;
    if denominator == 0.0 {
        return PercentageSplit {
            incoming_percentage: 0.0,
            outgoing_percentage: 0.0,
            is_outgoing_higher_than_incoming: false,
        };
    }

    let incoming_percentage = income_sum / denominator;
    let outgoing_percentage = expense_sum / denominator;

    PercentageSplit {
        incoming_percentage,
        outgoing_percentage,
        is_outgoing_higher_than_incoming: outgoing_percentage > incoming_percentage,
    }
}
