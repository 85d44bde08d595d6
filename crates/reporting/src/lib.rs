pub mod aggregation;
pub mod format;
pub mod month;
pub mod record;
pub mod scope;
pub mod series;
pub mod split;

pub use aggregation::{
    average_per_month, calendar_months, grand_total, monthly_percentage_split, months,
    months_across, netto_per_bucket, sub_type_total, total_netto, total_per_bucket,
    PercentageSplit,
};
pub use format::{format_amount, format_percentage, NumberFormat};
pub use month::{is_supported_year, Month, DEFINED_MONTHS, MAX_YEAR, MIN_YEAR};
pub use record::{DatedRecord, RecordDate};
pub use scope::{bucket_key, BucketKey, Scope};
pub use series::{
    distinct_sub_types, series_per_sub_type, shares_per_sub_type, Series, SubTypeShare,
    UNTAGGED_LABEL,
};
pub use split::{split_expense_over_days, ExpenseSplit, SplitError};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParseError {
    #[error("Unknown month: {0}")]
    Month(String),
    #[error("Invalid scope '{0}', expected a year between 2018 and 2099 or 'all-time'")]
    Scope(String),
}

// Cents to the decimal amount used in reports.
pub fn cents_to_amount(cents: i64) -> f64 {
    cents as f64 / 100.0
}

pub fn amount_to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}
