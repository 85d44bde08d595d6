use axum::{
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    extract::{Request, State},
};
use tower_sessions::Session;
use std::sync::Arc;
use crate::AppState;

pub const AUTH_SESSION_KEY: &str = "authenticated";
pub const LOGIN_PATH: &str = "/login";

pub async fn is_authenticated(session: &Session) -> bool {
    session
        .get::<bool>(AUTH_SESSION_KEY)
        .await
        .unwrap_or(None)
        .unwrap_or(false)
}

pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    // If no password is set, authentication is disabled
    if state.config.app_password.is_none() {
        return next.run(request).await;
    }

    if is_authenticated(&session).await {
        next.run(request).await
    } else {
        tracing::debug!("Unauthenticated request to {}", request.uri().path());
        Redirect::to(LOGIN_PATH).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use tower::ServiceExt;
    use tower_sessions::{MemoryStore, SessionManagerLayer};

    async fn app(app_password: Option<&str>) -> Router {
        let state = Arc::new(AppState {
            db: database::get_test_db().await,
            config: Config {
                database_url: "test".into(),
                port: 0,
                app_password: app_password.map(String::from),
            },
        });

        Router::new()
            .route("/", get(|| async { "dashboard" }))
            .layer(middleware::from_fn_with_state(state, auth_middleware))
            .layer(SessionManagerLayer::new(MemoryStore::default()))
    }

    #[tokio::test]
    async fn test_redirects_to_login_when_password_set() {
        let response = app(Some("secret"))
            .await
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], LOGIN_PATH);
    }

    #[tokio::test]
    async fn test_passes_through_without_password() {
        let response = app(None)
            .await
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
