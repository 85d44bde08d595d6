use crate::models::{Dashboard, DashboardCharts, DashboardSummary, EarningsPie, TagChart, TrendChart};
use chrono::{Datelike, NaiveDate};
use database::{Database, RepositoryError};
use expenses::models::{Expense, ExpenseEntry};
use expenses::service::{ExpenseError, ExpenseService};
use hours::models::HourLog;
use hours::service::{hours_chart, HourError, HourService};
use income::models::{Income, IncomeType};
use income::service::{IncomeError, IncomeService};
use rand::seq::SliceRandom;
use reporting::{
    average_per_month, calendar_months, grand_total, is_supported_year, monthly_percentage_split,
    months_across, netto_per_bucket, shares_per_sub_type, sub_type_total, total_netto,
    total_per_bucket, Month, Scope,
};
use tracing::instrument;

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Database error: {0}")]
    Infrastructure(String),
}

impl From<RepositoryError> for DashboardError {
    fn from(err: RepositoryError) -> Self {
        DashboardError::Infrastructure(err.to_string())
    }
}

impl From<IncomeError> for DashboardError {
    fn from(err: IncomeError) -> Self {
        match err {
            IncomeError::InvalidInput(msg) => DashboardError::InvalidInput(msg),
            other => DashboardError::Infrastructure(other.to_string()),
        }
    }
}

impl From<ExpenseError> for DashboardError {
    fn from(err: ExpenseError) -> Self {
        match err {
            ExpenseError::InvalidInput(msg) => DashboardError::InvalidInput(msg),
            other => DashboardError::Infrastructure(other.to_string()),
        }
    }
}

impl From<HourError> for DashboardError {
    fn from(err: HourError) -> Self {
        match err {
            HourError::InvalidInput(msg) => DashboardError::InvalidInput(msg),
            other => DashboardError::Infrastructure(other.to_string()),
        }
    }
}

const PASTEL_COLORS: [&str; 20] = [
    "#FFB3BA", "#FFDFBA", "#FFFFBA", "#BAFFC9", "#BAE1FF",
    "#E2F0CB", "#FDFD96", "#FFC3A0", "#FFD1DC", "#D4F0F0",
    "#CCE2CB", "#B6CFB6", "#97C1A9", "#FCB7AF", "#FFDAC1",
    "#E7FFAC", "#FFABAB", "#D5AAFF", "#85E3FF", "#B9F6CA",
];

fn random_pastel_colors(count: usize) -> Vec<String> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| PASTEL_COLORS.choose(&mut rng).unwrap_or(&"#FFFFFF").to_string())
        .collect()
}

/// The current year, or all-time once the clock runs past the supported range.
pub fn default_scope(today: NaiveDate) -> Scope {
    if is_supported_year(today.year()) {
        Scope::Year(today.year())
    } else {
        Scope::AllTime
    }
}

pub fn summarize(
    scope: Scope,
    income: &[Income],
    expenses: &[ExpenseEntry],
    today: NaiveDate,
) -> DashboardSummary {
    DashboardSummary {
        scope,
        total_netto: total_netto(scope, income, expenses),
        total_income: grand_total(income),
        total_salary: sub_type_total(scope, income, IncomeType::Salary.as_str()),
        total_expenses: grand_total(expenses),
        average_income_per_month: average_per_month(scope, income),
        current_month: monthly_percentage_split(income, expenses, Month::of(&today)),
    }
}

pub fn build_charts(
    scope: Scope,
    income: &[Income],
    expenses: &[ExpenseEntry],
    hours: &[HourLog],
    today: NaiveDate,
) -> DashboardCharts {
    let buckets = match scope {
        Scope::Year(year) => calendar_months(year, today),
        Scope::AllTime => months_across(scope, income, expenses),
    };

    let trend = TrendChart {
        income: total_per_bucket(scope, income, &buckets, None),
        expenses: total_per_bucket(scope, expenses, &buckets, None),
        netto: netto_per_bucket(scope, income, expenses, &buckets),
        labels: buckets,
    };

    let earnings = EarningsPie {
        labels: ["Income", "Netto", "Expenses"],
        data: [
            grand_total(income),
            total_netto(scope, income, expenses),
            grand_total(expenses),
        ],
    };

    // Processed aggregates carry no tag and are left out of the tag chart.
    let plain: Vec<Expense> = expenses
        .iter()
        .filter_map(|entry| match entry {
            ExpenseEntry::Plain(expense) => Some(expense.clone()),
            ExpenseEntry::Processed(_) => None,
        })
        .collect();
    let shares = shares_per_sub_type(&plain);
    let expenses_per_tag = TagChart {
        colors: random_pastel_colors(shares.len()),
        shares,
    };

    DashboardCharts {
        trend,
        earnings,
        expenses_per_tag,
        hours: hours_chart(scope, hours, today),
    }
}

pub struct DashboardService;

impl DashboardService {
    #[instrument(skip(db))]
    pub async fn load(db: &Database, scope: Scope, today: NaiveDate) -> Result<Dashboard, DashboardError> {
        let income = IncomeService::list_in_scope(db, scope).await?;
        let expenses = ExpenseService::list_in_scope(db, scope).await?;
        let hours = HourService::list_in_scope(db, scope).await?;

        tracing::debug!(
            income = income.len(),
            expenses = expenses.len(),
            hours = hours.len(),
            "dashboard records loaded"
        );

        Ok(Dashboard {
            summary: summarize(scope, &income, &expenses, today),
            charts: build_charts(scope, &income, &expenses, &hours, today),
        })
    }
}
