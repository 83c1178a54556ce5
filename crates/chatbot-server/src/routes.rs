//! HTTP routes
//!
//! - `POST /chat` - relay a visitor conversation (form fields `nonce`, `history`)
//! - `GET /widget?page=<id>` - widget fragment, or 204 when the page is not targeted
//! - `GET /assets/widget.js`, `GET /assets/widget.css` - bundled widget assets
//! - `GET /health` - liveness probe

use crate::envelope::{Envelope, Failure};
use crate::state::AppState;
use crate::widget::{self, WidgetLinks};
use chatbot_core::RelayError;
use axum::{
    extract::{rejection::FormRejection, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

pub const CHAT_PATH: &str = "/chat";
pub const SCRIPT_PATH: &str = "/assets/widget.js";
pub const STYLE_PATH: &str = "/assets/widget.css";

/// Form body posted by the widget script
#[derive(Debug, Deserialize)]
pub struct ChatForm {
    pub nonce: Option<String>,
    pub history: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WidgetQuery {
    pub page: Option<u64>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(CHAT_PATH, post(handle_chat))
        .route("/widget", get(handle_widget))
        .route(SCRIPT_PATH, get(handle_script))
        .route(STYLE_PATH, get(handle_style))
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn unavailable() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(Envelope::error("The chatbot is temporarily unavailable.")),
    )
        .into_response()
}

async fn handle_chat(
    State(state): State<Arc<AppState>>,
    form: Result<Form<ChatForm>, FormRejection>,
) -> Response {
    let Form(form) = match form {
        Ok(form) => form,
        Err(rejection) => {
            warn!(error = %rejection, "Rejected undecodable chat request body");
            return (
                rejection.status(),
                Json(Envelope::<Failure>::from(RelayError::InvalidInput)),
            )
                .into_response();
        }
    };

    if !state.token_matches(form.nonce.as_deref()) {
        warn!("Rejected chat request with invalid security token");
        return (
            StatusCode::FORBIDDEN,
            Json(Envelope::error("Invalid security token.")),
        )
            .into_response();
    }

    let settings = match state.store.load().await {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Failed to load settings");
            return unavailable();
        }
    };

    match state.relay.relay(form.history.as_deref(), &settings).await {
        Ok(reply) => Json(Envelope::ok(reply)).into_response(),
        Err(e) => Json(Envelope::<Failure>::from(e)).into_response(),
    }
}

async fn handle_widget(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WidgetQuery>,
) -> Response {
    let settings = match state.store.load().await {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Failed to load settings");
            return unavailable();
        }
    };

    if !settings.shows_on(query.page) {
        return StatusCode::NO_CONTENT.into_response();
    }

    let chat_endpoint = state.url(CHAT_PATH);
    let script_url = state.url(SCRIPT_PATH);
    let style_url = state.url(STYLE_PATH);
    let links = WidgetLinks {
        chat_endpoint: &chat_endpoint,
        script_url: &script_url,
        style_url: &style_url,
        nonce: &state.token,
    };
    Html(widget::render(&settings, &links)).into_response()
}

async fn handle_script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        widget::SCRIPT,
    )
}

async fn handle_style() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], widget::STYLE)
}

async fn handle_health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}
