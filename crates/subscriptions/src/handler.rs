use crate::models::{BulkDeleteRequest, RawSubscriptionRequest, Subscription, SubscriptionType};
use crate::repository::SORTABLE_COLUMNS;
use crate::service::{SubscriptionError, SubscriptionService};
use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use common::table::{Page, TableQuery};
use common::views::{money, money_input, option_list, SelectOption, TableControls};
use common::AppState;
use serde_json::json;
use std::sync::Arc;

impl IntoResponse for SubscriptionError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            SubscriptionError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            SubscriptionError::NotFound => (StatusCode::NOT_FOUND, "Subscription not found".to_string()),
            SubscriptionError::Infrastructure(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, Json(json!({ "error": msg }))).into_response()
    }
}

#[derive(Template)]
#[template(path = "subscriptions.html")]
pub struct SubscriptionsTemplate {
    pub rows: Vec<SubscriptionRowView>,
    pub controls: TableControls,
    pub type_options: Vec<SelectOption>,
    pub yearly_total: String,
}

pub struct SubscriptionRowView {
    pub id: i64,
    pub name: String,
    pub price: String,
    pub price_input: String,
    pub subscription_type: String,
    pub yearly_cost: String,
    pub description: String,
}

impl From<Subscription> for SubscriptionRowView {
    fn from(sub: Subscription) -> Self {
        Self {
            id: sub.id,
            yearly_cost: money(sub.yearly_cost()),
            name: sub.name,
            price: money(sub.price),
            price_input: money_input(sub.price),
            subscription_type: sub.subscription_type.to_string(),
            description: sub.description.unwrap_or_default(),
        }
    }
}

fn subscription_types() -> Vec<String> {
    SubscriptionType::ALL.iter().map(|t| t.to_string()).collect()
}

pub fn subscriptions_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(subscriptions_page))
        .route("/api", get(list_subscriptions))
        .route("/add", post(create_subscription))
        .route("/bulk/delete", post(bulk_delete))
        .route(
            "/{id}",
            get(get_subscription).put(update_subscription).delete(delete_subscription),
        )
        .with_state(state)
}

async fn subscriptions_page(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TableQuery>,
) -> Result<impl IntoResponse, SubscriptionError> {
    let page = SubscriptionService::list_page(&state.db, &query).await?;
    let yearly_total = SubscriptionService::yearly_total(&state.db).await?;

    let types = subscription_types();
    let controls = TableControls::new(&query, &page, "type", &types, SORTABLE_COLUMNS).undated();
    let type_refs: Vec<&str> = types.iter().map(String::as_str).collect();

    let template = SubscriptionsTemplate {
        rows: page.items.into_iter().map(SubscriptionRowView::from).collect(),
        controls,
        type_options: option_list(&type_refs, Some("Monthly")),
        yearly_total: money(yearly_total),
    };

    Ok(Html(template.render().map_err(|e| SubscriptionError::Infrastructure(e.to_string()))?))
}

async fn list_subscriptions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TableQuery>,
) -> Result<Json<Page<Subscription>>, SubscriptionError> {
    let page = SubscriptionService::list_page(&state.db, &query).await?;
    Ok(Json(page))
}

async fn create_subscription(
    State(state): State<Arc<AppState>>,
    Form(payload): Form<RawSubscriptionRequest>,
) -> Result<impl IntoResponse, SubscriptionError> {
    SubscriptionService::create_subscription(&state.db, payload)
        .await
        .map_err(|e| {
            tracing::error!("create_subscription error: {:?}", e);
            e
        })?;

    Ok(Redirect::to("/subscriptions"))
}

async fn get_subscription(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Subscription>, SubscriptionError> {
    let sub = SubscriptionService::get_subscription(&state.db, id).await?;
    Ok(Json(sub))
}

async fn update_subscription(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<RawSubscriptionRequest>,
) -> Result<Json<Subscription>, SubscriptionError> {
    let sub = SubscriptionService::update_subscription(&state.db, id, payload).await?;
    Ok(Json(sub))
}

async fn delete_subscription(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, SubscriptionError> {
    SubscriptionService::delete_subscription(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn bulk_delete(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BulkDeleteRequest>,
) -> Result<impl IntoResponse, SubscriptionError> {
    let deleted = SubscriptionService::delete_bulk(&state.db, &payload.ids).await?;
    Ok(Json(json!({ "deleted": deleted })))
}
