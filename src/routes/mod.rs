pub mod auth_routes;
pub mod chat_routes;

use crate::auth::middleware::session_cookie;
use crate::error::AppError;
use crate::session::Session;
use crate::state::{AppState, SharedState};
use crate::views::Notice;
use axum::{
    http::header,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::trace::TraceLayer;

pub fn app(state: SharedState) -> Router {
    Router::new()
        // Pages
        .route("/", get(chat_routes::index))
        .route("/otp/request", post(auth_routes::request_otp))
        .route("/otp/verify", post(auth_routes::verify_otp))
        .route("/logout", post(auth_routes::logout))
        .route("/chat", post(chat_routes::send_message))
        // JSON
        .route("/api/transcript", get(chat_routes::transcript))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Render the page `session` routes to and bind the browser to it.
pub(crate) fn render_page(
    state: &AppState,
    session_id: &str,
    session: &Session,
    notices: &[Notice],
) -> Result<Response, AppError> {
    let html = state.views.render(session, notices)?;
    Ok(html_response(state, session_id, html))
}

pub(crate) fn html_response(state: &AppState, session_id: &str, html: String) -> Response {
    (
        [
            (
                header::SET_COOKIE,
                session_cookie(session_id, state.config.cookie_secure),
            ),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        Html(html),
    )
        .into_response()
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "otpchat"
    }))
}
