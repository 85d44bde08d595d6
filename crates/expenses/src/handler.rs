use crate::models::{
    BulkDeleteRequest, BulkTagRequest, Expense, ExpenseEntry, ExpenseTag, ProcessedExpense, RawExpenseRequest,
};
use crate::repository::SORTABLE_COLUMNS;
use crate::service::{ExpenseError, ExpenseService};
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
use common::views::{money, money_input, month_options, SelectOption, TableControls};
use common::AppState;
use serde_json::json;
use std::sync::Arc;

impl IntoResponse for ExpenseError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            ExpenseError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            ExpenseError::NotFound => (StatusCode::NOT_FOUND, "Expense not found".to_string()),
            ExpenseError::Infrastructure(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, Json(json!({ "error": msg }))).into_response()
    }
}

#[derive(Template)]
#[template(path = "expenses.html")]
pub struct ExpensesTemplate {
    pub rows: Vec<ExpenseRowView>,
    pub controls: TableControls,
    pub tag_options: Vec<SelectOption>,
    pub month_options: Vec<SelectOption>,
    pub current_year: i32,
}

pub struct ExpenseRowView {
    pub id: i64,
    pub is_processed: bool,
    pub amount: String,
    pub amount_input: String,
    pub daily_amount: String,
    pub year: i32,
    pub month: String,
    pub day: String,
    pub description: String,
    pub tag: String,
    pub children: Vec<ChildView>,
}

pub struct ChildView {
    pub amount: String,
    pub description: String,
}

impl From<ExpenseEntry> for ExpenseRowView {
    fn from(entry: ExpenseEntry) -> Self {
        match entry {
            ExpenseEntry::Plain(expense) => plain_row(expense),
            ExpenseEntry::Processed(processed) => processed_row(processed),
        }
    }
}

fn plain_row(expense: Expense) -> ExpenseRowView {
    ExpenseRowView {
        id: expense.id,
        is_processed: false,
        amount: money(expense.amount),
        amount_input: money_input(expense.amount),
        daily_amount: String::new(),
        year: expense.year,
        month: expense.month.name().to_string(),
        day: expense.day.map(|d| d.to_string()).unwrap_or_default(),
        description: expense.description.unwrap_or_default(),
        tag: expense.tag.map(|t| t.to_string()).unwrap_or_default(),
        children: Vec::new(),
    }
}

fn processed_row(processed: ProcessedExpense) -> ExpenseRowView {
    ExpenseRowView {
        id: processed.id,
        is_processed: true,
        amount: money(processed.total_amount),
        amount_input: money_input(processed.total_amount),
        daily_amount: money(processed.amount_per_day),
        year: processed.year,
        month: processed.month.name().to_string(),
        day: String::new(),
        description: processed.description.unwrap_or_default(),
        tag: String::new(),
        children: processed
            .children
            .into_iter()
            .map(|child| ChildView {
                amount: money(child.amount),
                description: child.description.unwrap_or_default(),
            })
            .collect(),
    }
}

fn tag_names() -> Vec<String> {
    ExpenseTag::ALL.iter().map(|t| t.to_string()).collect()
}

pub fn expenses_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(expenses_page))
        .route("/api", get(list_expenses))
        .route("/add", post(create_expense))
        .route("/bulk/tag", post(bulk_set_tag))
        .route("/bulk/delete", post(bulk_delete))
        .route(
            "/processed/{id}",
            get(get_processed).put(update_processed).delete(delete_processed),
        )
        .route("/{id}", get(get_expense).put(update_expense).delete(delete_expense))
        .with_state(state)
}

async fn expenses_page(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TableQuery>,
) -> Result<impl IntoResponse, ExpenseError> {
    let page = ExpenseService::list_page(&state.db, &query).await?;
    let tags = tag_names();
    let controls = TableControls::new(&query, &page, "Tag", &tags, SORTABLE_COLUMNS);

    let today = chrono::Local::now().date_naive();
    let template = ExpensesTemplate {
        rows: page.items.into_iter().map(ExpenseRowView::from).collect(),
        controls,
        tag_options: tags
            .iter()
            .map(|t| SelectOption { value: t.clone(), label: t.clone(), selected: false })
            .collect(),
        month_options: month_options(Some(today.month())),
        current_year: today.year(),
    };

    Ok(Html(template.render().map_err(|e| ExpenseError::Infrastructure(e.to_string()))?))
}

async fn list_expenses(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TableQuery>,
) -> Result<Json<Page<ExpenseEntry>>, ExpenseError> {
    let page = ExpenseService::list_page(&state.db, &query).await?;
    Ok(Json(page))
}

async fn create_expense(
    State(state): State<Arc<AppState>>,
    Form(payload): Form<RawExpenseRequest>,
) -> Result<impl IntoResponse, ExpenseError> {
    ExpenseService::create_expense(&state.db, payload).await.map_err(|e| {
        tracing::error!("create_expense error: {:?}", e);
        e
    })?;

    Ok(Redirect::to("/expenses"))
}

async fn get_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Expense>, ExpenseError> {
    let expense = ExpenseService::get_expense(&state.db, id).await?;
    Ok(Json(expense))
}

async fn update_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<RawExpenseRequest>,
) -> Result<Json<ExpenseEntry>, ExpenseError> {
    let entry = ExpenseService::update_expense(&state.db, id, payload).await?;
    Ok(Json(entry))
}

async fn delete_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ExpenseError> {
    ExpenseService::delete_expense(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_processed(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ProcessedExpense>, ExpenseError> {
    let processed = ExpenseService::get_processed(&state.db, id).await?;
    Ok(Json(processed))
}

async fn update_processed(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<RawExpenseRequest>,
) -> Result<Json<ExpenseEntry>, ExpenseError> {
    let entry = ExpenseService::update_processed(&state.db, id, payload).await?;
    Ok(Json(entry))
}

async fn delete_processed(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ExpenseError> {
    ExpenseService::delete_processed(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn bulk_set_tag(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BulkTagRequest>,
) -> Result<impl IntoResponse, ExpenseError> {
    let updated = ExpenseService::set_tag_bulk(&state.db, &payload.ids, payload.tag).await?;
    Ok(Json(json!({ "updated": updated })))
}

async fn bulk_delete(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BulkDeleteRequest>,
) -> Result<impl IntoResponse, ExpenseError> {
    let deleted = ExpenseService::delete_bulk(&state.db, &payload.ids, &payload.processed_ids).await?;
    Ok(Json(json!({ "deleted": deleted })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use tower::ServiceExt;

    async fn app() -> (Router, Arc<AppState>) {
        let state = AppState::for_tests().await;
        let router = expenses_router(state.clone()).with_state(state.clone());
        (router, state)
    }

    fn form(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/add")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_add_processed_expense_via_form() {
        let (app, state) = app().await;

        let response = app
            .oneshot(form("amount=25&year=2024&month=March&day=&description=Trip&tag=Leisure&daily_amount=10"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let page = ExpenseService::list_page(&state.db, &TableQuery::default()).await.unwrap();
        assert_eq!(page.total, 1);
        let ExpenseEntry::Processed(processed) = &page.items[0] else {
            panic!("expected processed expense");
        };
        assert_eq!(processed.children.len(), 3);
    }

    #[tokio::test]
    async fn test_add_plain_expense_with_blank_optional_fields() {
        let (app, state) = app().await;

        let response = app
            .oneshot(form("amount=4.20&year=2024&month=5&day=&description=&tag=&daily_amount="))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let page = ExpenseService::list_page(&state.db, &TableQuery::default()).await.unwrap();
        assert!(!page.items[0].is_processed());
    }

    #[tokio::test]
    async fn test_expenses_page_shows_children() {
        let (app, state) = app().await;
        ExpenseService::create_expense(
            &state.db,
            RawExpenseRequest {
                amount: 20.0,
                year: 2024,
                month: "April".into(),
                day: None,
                description: Some("Rental car".into()),
                tag: None,
                daily_amount: Some(10.0),
            },
        )
        .await
        .unwrap();

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("Rental car"));
        assert!(html.contains("Processed over 2 days."));
    }

    #[tokio::test]
    async fn test_unknown_tag_filter_is_bad_request() {
        let (app, _) = app().await;
        let response = app
            .oneshot(Request::builder().uri("/api?kind=Gadgets").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_processed_via_json() {
        let (app, state) = app().await;
        let entry = ExpenseService::create_expense(
            &state.db,
            RawExpenseRequest {
                amount: 20.0,
                year: 2024,
                month: "April".into(),
                day: None,
                description: None,
                tag: None,
                daily_amount: Some(10.0),
            },
        )
        .await
        .unwrap();

        let body = json!({ "amount": 50.0, "year": 2024, "month": "April", "daily_amount": 25.0 });
        let request = Request::builder()
            .method("PUT")
            .uri(format!("/processed/{}", entry.id()))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let updated: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(updated["kind"], "processed");
        assert_eq!(updated["children"].as_array().unwrap().len(), 2);
    }
}
