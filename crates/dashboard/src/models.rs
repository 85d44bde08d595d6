use hours::models::HoursChart;
use reporting::{BucketKey, PercentageSplit, Scope, SubTypeShare};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub scope: Option<Scope>,
}

/// Headline figures for one scope. Amounts are decimal, not cents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub scope: Scope,
    pub total_netto: f64,
    pub total_income: f64,
    pub total_salary: f64,
    pub total_expenses: f64,
    pub average_income_per_month: f64,
    pub current_month: PercentageSplit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendChart {
    pub labels: Vec<BucketKey>,
    pub income: Vec<f64>,
    pub expenses: Vec<f64>,
    pub netto: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EarningsPie {
    pub labels: [&'static str; 3],
    pub data: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagChart {
    pub shares: Vec<SubTypeShare>,
    /// One background color per share.
    pub colors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardCharts {
    pub trend: TrendChart,
    pub earnings: EarningsPie,
    pub expenses_per_tag: TagChart,
    pub hours: HoursChart,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub summary: DashboardSummary,
    pub charts: DashboardCharts,
}
