use serde::Serialize;

use crate::month::Month;
use crate::record::RecordDate;

pub const MIN_AMOUNT: f64 = 0.01;
// Roughly ten years of days.
pub const MAX_DAYS: u32 = 3660;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SplitError {
    #[error("Total amount must be at least 0.01")]
    TotalTooSmall,
    #[error("Daily amount must be greater than zero")]
    DailyNotPositive,
    #[error("Splitting would create more than {max} daily expenses")]
    TooManyDays { max: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitAggregate {
    pub total_amount: f64,
    pub amount_per_day: f64,
    pub date: RecordDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitChild {
    pub amount: f64,
    pub date: RecordDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseSplit {
    pub aggregate: SplitAggregate,
    pub children: Vec<SplitChild>,
    pub full_days: u32,
}

impl ExpenseSplit {
    pub fn child_description(&self, parent_id: i64) -> String {
        format!("Processed over {} days. (Parent: {})", self.full_days, parent_id)
    }
}

// Children keep the aggregate's month and year; no rollover.
pub fn split_expense_over_days(
    total_amount: f64,
    daily_amount: f64,
    month: Month,
    year: i32,
) -> Result<ExpenseSplit, SplitError> {
    if !(total_amount >= MIN_AMOUNT) {
        return Err(SplitError::TotalTooSmall);
    }
    if !(daily_amount > 0.0) {
        return Err(SplitError::DailyNotPositive);
    }

    let days = total_amount / daily_amount;
    let full_days = days.floor();
    let fraction = round_to_cents(days - full_days);
    let child_count = if fraction > 0.0 { full_days + 1.0 } else { full_days };
    if child_count > MAX_DAYS as f64 {
        return Err(SplitError::TooManyDays { max: MAX_DAYS });
    }
    let date = RecordDate::new(year, month);

    let mut children: Vec<SplitChild> = (0..full_days as u32)
        .map(|_| SplitChild { amount: daily_amount, date })
        .collect();

    if fraction > 0.0 {
        children.push(SplitChild { amount: daily_amount * fraction, date });
    }

    Ok(ExpenseSplit {
        aggregate: SplitAggregate { total_amount, amount_per_day: daily_amount, date },
        children,
        full_days: full_days as u32,
    })
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
