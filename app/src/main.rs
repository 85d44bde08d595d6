use axum::{middleware, routing::get, Router};
use axum_embed::ServeEmbed;
use clap::Parser;
use common::{auth::auth_middleware, AppState, Config};
use database::Database;
use rust_embed::RustEmbed;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tower_sessions::{MemoryStore, SessionManagerLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod handlers;

use handlers::auth::{login_get, login_post, logout, root_redirect};

#[derive(RustEmbed, Clone)]
#[folder = "public/"]
struct Assets;

fn app_router(state: Arc<AppState>) -> Router {
    let protected_routes = Router::<Arc<AppState>>::new()
        .route("/", get(root_redirect))
        .route("/logout", get(logout))
        .nest("/dashboard", dashboard::handler::dashboard_router(state.clone()))
        .nest("/income", income::handler::income_router(state.clone()))
        .nest("/expenses", expenses::handler::expenses_router(state.clone()))
        .nest("/hours", hours::handler::hours_router(state.clone()))
        .nest("/subscriptions", subscriptions::handler::subscriptions_router(state.clone()))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::<Arc<AppState>>::new()
        .route("/login", get(login_get).post(login_post))
        .nest_service("/public", ServeEmbed::<Assets>::new())
        .merge(protected_routes)
        .with_state(state)
        .layer(SessionManagerLayer::new(MemoryStore::default()).with_secure(false))
        .layer(TraceLayer::new_for_http())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // A missing .env is fine; the environment and CLI still apply.
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("no .env loaded: {}", e);
    }
    let config = Config::parse();

    let db = Database::new(&config.database_url).await?;
    db.run_migrations().await?;

    let state = Arc::new(AppState {
        db,
        config: config.clone(),
    });

    for file in Assets::iter() {
        tracing::debug!("Embedded file: {}", file);
    }

    let app = app_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);
    if config.app_password.is_none() {
        tracing::warn!("APP_PASSWORD is not set! Authentication is DISABLED. The site will have NO login required.");
    }
    axum::serve(listener, app).await?;

    Ok(())
}
