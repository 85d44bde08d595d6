use crate::models::{BulkDeleteRequest, BulkTypeRequest, Income, IncomeType, RawIncomeRequest};
use crate::repository::SORTABLE_COLUMNS;
use crate::service::{IncomeError, IncomeService};
use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use chrono::Datelike;
use common::table::{Page, TableQuery};
use common::views::{money, money_input, month_options, option_list, SelectOption, TableControls};
use common::AppState;
use serde_json::json;
use std::sync::Arc;

impl IntoResponse for IncomeError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            IncomeError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            IncomeError::NotFound => (StatusCode::NOT_FOUND, "Income not found".to_string()),
            IncomeError::Infrastructure(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, Json(json!({ "error": msg }))).into_response()
    }
}

#[derive(Template)]
#[template(path = "income.html")]
pub struct IncomeTemplate {
    pub rows: Vec<IncomeRowView>,
    pub controls: TableControls,
    pub type_options: Vec<SelectOption>,
    pub month_options: Vec<SelectOption>,
    pub current_year: i32,
}

pub struct IncomeRowView {
    pub id: i64,
    pub income_type: String,
    pub amount: String,
    pub amount_input: String,
    pub year: i32,
    pub month: String,
    pub month_number: u32,
    pub description: String,
}

impl From<Income> for IncomeRowView {
    fn from(income: Income) -> Self {
        Self {
            id: income.id,
            income_type: income.income_type.to_string(),
            amount: money(income.amount),
            amount_input: money_input(income.amount),
            year: income.year,
            month: income.month.name().to_string(),
            month_number: income.month.number(),
            description: income.description.unwrap_or_default(),
        }
    }
}

fn income_types() -> Vec<String> {
    IncomeType::ALL.iter().map(|t| t.to_string()).collect()
}

pub fn income_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(income_page))
        .route("/api", get(list_income))
        .route("/add", post(create_income))
        .route("/bulk/type", post(bulk_set_type))
        .route("/bulk/delete", post(bulk_delete))
        .route("/{id}", get(get_income).put(update_income).delete(delete_income))
        .with_state(state)
}

async fn income_page(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TableQuery>,
) -> Result<impl IntoResponse, IncomeError> {
    let page = IncomeService::list_page(&state.db, &query).await?;
    let controls = TableControls::new(&query, &page, "Type", &income_types(), SORTABLE_COLUMNS);

    let today = chrono::Local::now().date_naive();
    let template = IncomeTemplate {
        rows: page.items.into_iter().map(IncomeRowView::from).collect(),
        controls,
        type_options: option_list(&["Salary", "Other"], Some("Salary")),
        month_options: month_options(Some(today.month())),
        current_year: today.year(),
    };

    Ok(Html(template.render().map_err(|e| IncomeError::Infrastructure(e.to_string()))?))
}

async fn list_income(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TableQuery>,
) -> Result<Json<Page<Income>>, IncomeError> {
    let page = IncomeService::list_page(&state.db, &query).await?;
    Ok(Json(page))
}

async fn create_income(
    State(state): State<Arc<AppState>>,
    Form(payload): Form<RawIncomeRequest>,
) -> Result<impl IntoResponse, IncomeError> {
    IncomeService::create_income(&state.db, payload).await.map_err(|e| {
        tracing::error!("create_income error: {:?}", e);
        e
    })?;

    Ok(Redirect::to("/income"))
}

async fn get_income(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Income>, IncomeError> {
    let income = IncomeService::get_income(&state.db, id).await?;
    Ok(Json(income))
}

async fn update_income(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<RawIncomeRequest>,
) -> Result<Json<Income>, IncomeError> {
    let income = IncomeService::update_income(&state.db, id, payload).await?;
    Ok(Json(income))
}

async fn delete_income(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, IncomeError> {
    IncomeService::delete_income(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn bulk_set_type(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BulkTypeRequest>,
) -> Result<impl IntoResponse, IncomeError> {
    let updated = IncomeService::set_type_bulk(&state.db, &payload.ids, payload.income_type).await?;
    Ok(Json(json!({ "updated": updated })))
}

async fn bulk_delete(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BulkDeleteRequest>,
) -> Result<impl IntoResponse, IncomeError> {
    let deleted = IncomeService::delete_bulk(&state.db, &payload.ids).await?;
    Ok(Json(json!({ "deleted": deleted })))
}
