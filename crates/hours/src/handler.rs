use crate::models::{DeleteSelectedRequest, HourLog, HoursChart, RawHourLogRequest};
use crate::repository::SORTABLE_COLUMNS;
use crate::service::{HourError, HourService};
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
use common::views::{month_options, SelectOption, TableControls};
use common::AppState;
use reporting::{format_amount, NumberFormat, Scope};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

impl IntoResponse for HourError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            HourError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            HourError::NotFound => (StatusCode::NOT_FOUND, "Hour log not found".to_string()),
            HourError::Infrastructure(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, Json(json!({ "error": msg }))).into_response()
    }
}

#[derive(Template)]
#[template(path = "hours.html")]
pub struct HoursTemplate {
    pub rows: Vec<HourRowView>,
    pub controls: TableControls,
    pub month_options: Vec<SelectOption>,
    pub current_year: i32,
    pub total_hours: String,
}

pub struct HourRowView {
    pub id: i64,
    pub amount: String,
    pub year: i32,
    pub month: String,
    pub day: String,
    pub description: String,
    pub tag: String,
}

impl From<HourLog> for HourRowView {
    fn from(log: HourLog) -> Self {
        Self {
            id: log.id,
            amount: format_amount(log.amount, &NumberFormat::plain(2)),
            year: log.year,
            month: log.month.name().to_string(),
            day: log.day.map(|d| d.to_string()).unwrap_or_default(),
            description: log.description.unwrap_or_default(),
            tag: log.tag,
        }
    }
}

#[derive(Deserialize)]
pub struct ChartQuery {
    pub scope: Option<Scope>,
}

pub fn hours_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(hours_page))
        .route("/api", get(list_hours))
        .route("/chart", get(hours_chart))
        .route("/add", post(log_hours))
        .route("/bulk/delete", post(delete_selected))
        .route("/{id}", get(get_hours).put(update_hours).delete(delete_hours))
        .with_state(state)
}

async fn hours_page(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TableQuery>,
) -> Result<impl IntoResponse, HourError> {
    let page = HourService::list_page(&state.db, &query).await?;
    let tags = HourService::list_tags(&state.db).await?;
    let controls = TableControls::new(&query, &page, "Tag", &tags, SORTABLE_COLUMNS);

    let page_hours = page.items.iter().map(|l| l.amount).fold(0.0, |acc, h| acc + h);
    let today = chrono::Local::now().date_naive();
    let template = HoursTemplate {
        rows: page.items.into_iter().map(HourRowView::from).collect(),
        controls,
        month_options: month_options(Some(today.month())),
        current_year: today.year(),
        total_hours: format_amount(page_hours, &NumberFormat::plain(2)),
    };

    Ok(Html(template.render().map_err(|e| HourError::Infrastructure(e.to_string()))?))
}

async fn list_hours(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TableQuery>,
) -> Result<Json<Page<HourLog>>, HourError> {
    let page = HourService::list_page(&state.db, &query).await?;
    Ok(Json(page))
}

async fn hours_chart(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChartQuery>,
) -> Result<Json<HoursChart>, HourError> {
    let today = chrono::Local::now().date_naive();
    let scope = query.scope.unwrap_or(Scope::Year(today.year()));
    let chart = HourService::chart(&state.db, scope, today).await?;
    Ok(Json(chart))
}

async fn log_hours(
    State(state): State<Arc<AppState>>,
    Form(payload): Form<RawHourLogRequest>,
) -> Result<impl IntoResponse, HourError> {
    HourService::log_hours(&state.db, payload).await.map_err(|e| {
        tracing::error!("log_hours error: {:?}", e);
        e
    })?;

    Ok(Redirect::to("/hours"))
}

async fn get_hours(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<HourLog>, HourError> {
    let logged = HourService::get_hours(&state.db, id).await?;
    Ok(Json(logged))
}

async fn update_hours(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<RawHourLogRequest>,
) -> Result<Json<HourLog>, HourError> {
    let logged = HourService::update_hours(&state.db, id, payload).await?;
    Ok(Json(logged))
}

async fn delete_hours(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, HourError> {
    HourService::delete_hours(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_selected(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DeleteSelectedRequest>,
) -> Result<impl IntoResponse, HourError> {
    let deleted = HourService::delete_selected(&state.db, &payload.ids).await?;
    Ok(Json(json!({ "deleted": deleted })))
}
