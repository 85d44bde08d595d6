use crate::models::{Dashboard, DashboardQuery, DashboardSummary};
use crate::service::{default_scope, DashboardError, DashboardService};
use askama::Template;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use common::views::{year_options, SelectOption};
use common::AppState;
use reporting::{format_amount, format_percentage, NumberFormat, Scope};
use serde_json::json;
use std::sync::Arc;

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            DashboardError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            DashboardError::Infrastructure(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, Json(json!({ "error": msg }))).into_response()
    }
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub scope: String,
    pub all_time_selected: bool,
    pub year_options: Vec<SelectOption>,
    pub summary: SummaryView,
}

pub struct SummaryView {
    pub total_netto: String,
    pub total_income: String,
    pub total_salary: String,
    pub total_expenses: String,
    pub average_income_per_month: String,
    pub incoming_percentage: String,
    pub outgoing_percentage: String,
    pub is_outgoing_higher: bool,
}

impl From<&DashboardSummary> for SummaryView {
    fn from(summary: &DashboardSummary) -> Self {
        let euro = NumberFormat::nl_be();
        Self {
            total_netto: format_amount(summary.total_netto, &euro),
            total_income: format_amount(summary.total_income, &euro),
            total_salary: format_amount(summary.total_salary, &euro),
            total_expenses: format_amount(summary.total_expenses, &euro),
            average_income_per_month: format_amount(summary.average_income_per_month, &euro),
            incoming_percentage: format_percentage(summary.current_month.incoming_percentage),
            outgoing_percentage: format_percentage(summary.current_month.outgoing_percentage),
            is_outgoing_higher: summary.current_month.is_outgoing_higher_than_incoming,
        }
    }
}

pub fn dashboard_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(dashboard_page))
        .route("/api", get(dashboard_data))
        .with_state(state)
}

async fn load(state: &AppState, query: DashboardQuery) -> Result<Dashboard, DashboardError> {
    let today = chrono::Local::now().date_naive();
    let scope = query.scope.unwrap_or_else(|| default_scope(today));

    DashboardService::load(&state.db, scope, today).await.map_err(|e| {
        tracing::error!("dashboard error: {:?}", e);
        e
    })
}

async fn dashboard_page(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<impl IntoResponse, DashboardError> {
    let dashboard = load(&state, query).await?;
    let scope = dashboard.summary.scope;

    let template = DashboardTemplate {
        scope: scope.to_string(),
        all_time_selected: scope == Scope::AllTime,
        year_options: year_options(scope.year()),
        summary: SummaryView::from(&dashboard.summary),
    };

    Ok(Html(template.render().map_err(|e| DashboardError::Infrastructure(e.to_string()))?))
}

async fn dashboard_data(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<Dashboard>, DashboardError> {
    let dashboard = load(&state, query).await?;
    Ok(Json(dashboard))
}
