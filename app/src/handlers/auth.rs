use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use common::{auth::AUTH_SESSION_KEY, AppState};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

pub const HOME_PATH: &str = "/dashboard";

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub password: String,
}

fn render_login(status: StatusCode, error: Option<String>) -> Response {
    match (LoginTemplate { error }).render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!("login template error: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Template Error").into_response()
        }
    }
}

pub async fn root_redirect() -> Response {
    Redirect::to(HOME_PATH).into_response()
}

pub async fn login_get(State(state): State<Arc<AppState>>) -> Response {
    if state.config.app_password.is_none() {
        return Redirect::to(HOME_PATH).into_response();
    }

    render_login(StatusCode::OK, None)
}

pub async fn login_post(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(payload): Form<LoginForm>,
) -> Response {
    if let Some(correct_password) = &state.config.app_password {
        if payload.password == *correct_password {
            if let Err(e) = session.insert(AUTH_SESSION_KEY, true).await {
                tracing::error!("session error: {:?}", e);
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
            return Redirect::to(HOME_PATH).into_response();
        }
    }

    tracing::warn!("rejected login attempt");
    render_login(StatusCode::UNAUTHORIZED, Some("Invalid password".into()))
}

pub async fn logout(session: Session) -> Response {
    if let Err(e) = session.flush().await {
        tracing::error!("session error: {:?}", e);
    }
    Redirect::to(common::auth::LOGIN_PATH).into_response()
}
