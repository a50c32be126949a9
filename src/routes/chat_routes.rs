use axum::{extract::State, response::Response, Form, Json};
use serde::Deserialize;
use std::sync::Arc;

use super::render_page;
use crate::auth::middleware::{CurrentSession, ExistingSession};
use crate::error::AppError;
use crate::state::AppState;
use crate::views::Notice;

/// GET /
pub async fn index(
    State(state): State<Arc<AppState>>,
    CurrentSession(handle): CurrentSession,
) -> Result<Response, AppError> {
    let session = handle.session.lock().await;
    render_page(&state, &handle.id, &session, &[])
}

#[derive(Deserialize)]
pub struct ChatInput {
    #[serde(default)]
    pub message: String,
}

/// POST /chat — one user/assistant exchange.
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    CurrentSession(handle): CurrentSession,
    Form(body): Form<ChatInput>,
) -> Result<Response, AppError> {
    let mut session = handle.session.lock().await;
    if !session.is_authenticated() {
        return render_page(
            &state,
            &handle.id,
            &session,
            &[Notice::error("Please log in to chat.")],
        );
    }
    if body.message.trim().is_empty() {
        return render_page(&state, &handle.id, &session, &[]);
    }

    let user_email = session.claimant_email().unwrap_or_default().to_string();
    session.push_user(body.message.as_str());
    let reply = state.relay.send(&body.message, &user_email).await;
    session.push_assistant(reply);

    render_page(&state, &handle.id, &session, &[])
}

/// GET /api/transcript — the current session's conversation as JSON.
pub async fn transcript(
    ExistingSession(handle): ExistingSession,
) -> Result<Json<serde_json::Value>, AppError> {
    let handle = handle.ok_or(AppError::Unauthorized)?;
    let session = handle.session.lock().await;
    if !session.is_authenticated() {
        return Err(AppError::Unauthorized);
    }
    Ok(Json(serde_json::json!({
        "email": session.claimant_email(),
        "messages": session.transcript(),
    })))
}
