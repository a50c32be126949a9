use axum::{extract::State, response::Response, Form};
use serde::Deserialize;
use std::sync::Arc;

use super::{html_response, render_page};
use crate::auth::middleware::CurrentSession;
use crate::auth::otp::{self, OtpCheck};
use crate::email::{self, DeliveryOutcome};
use crate::error::AppError;
use crate::state::AppState;
use crate::views::Notice;

#[derive(Deserialize)]
pub struct OtpRequest {
    #[serde(default)]
    pub email: String,
}

/// POST /otp/request
pub async fn request_otp(
    State(state): State<Arc<AppState>>,
    CurrentSession(handle): CurrentSession,
    Form(body): Form<OtpRequest>,
) -> Result<Response, AppError> {
    let mut session = handle.session.lock().await;
    if session.is_authenticated() {
        return render_page(&state, &handle.id, &session, &[already_logged_in()]);
    }

    // 1. Validate the claimed address
    let email = body.email.trim();
    let rejection = if email.is_empty() {
        Some("Please enter your email address")
    } else if !otp::looks_like_email(email) {
        Some("Please enter a valid email address")
    } else {
        None
    };
    if let Some(message) = rejection {
        let html = state
            .views
            .render_login_with_email(&session, email, &[Notice::error(message)])?;
        return Ok(html_response(&state, &handle.id, html));
    }

    // 2. Generate and store, replacing any earlier code
    let code = otp::generate_otp();
    session.issue_otp(code.clone(), email, state.now());

    // 3. Deliver, falling back to on-screen disclosure
    let outcome = email::deliver_otp(
        state.mailer.as_deref(),
        state.mailer_error.as_deref(),
        email,
        &code,
        state.config.otp_validity_minutes,
    )
    .await;
    let notices = delivery_notices(&outcome, email, &code, state.config.reveal_code_on_failure);

    render_page(&state, &handle.id, &session, &notices)
}

fn delivery_notices(
    outcome: &DeliveryOutcome,
    email: &str,
    code: &str,
    reveal_code: bool,
) -> Vec<Notice> {
    let problem = match outcome {
        DeliveryOutcome::Sent => {
            return vec![Notice::success(format!(
                "OTP sent to {email}! Check your inbox."
            ))]
        }
        DeliveryOutcome::NotConfigured(_) => Notice::error(
            "Email configuration not found. Please add SMTP settings to the configuration.",
        ),
        DeliveryOutcome::Failed(reason) => Notice::error(format!("Failed to send OTP: {reason}")),
    };

    let fallback = if reveal_code {
        Notice::warning("Email sending failed. For testing, your OTP is:").with_code(code)
    } else {
        Notice::warning("Email sending failed. Please try again later.")
    };
    vec![problem, fallback]
}

fn already_logged_in() -> Notice {
    Notice::info("You are already logged in.")
}

#[derive(Deserialize)]
pub struct OtpVerify {
    #[serde(default)]
    pub code: String,
}

/// POST /otp/verify
pub async fn verify_otp(
    State(state): State<Arc<AppState>>,
    CurrentSession(handle): CurrentSession,
    Form(body): Form<OtpVerify>,
) -> Result<Response, AppError> {
    let mut session = handle.session.lock().await;
    if session.is_authenticated() {
        return render_page(&state, &handle.id, &session, &[already_logged_in()]);
    }

    if body.code.is_empty() {
        return render_page(
            &state,
            &handle.id,
            &session,
            &[Notice::error("Please enter the OTP")],
        );
    }

    let notice = match session.verify(&body.code, state.now(), state.config.otp_validity()) {
        OtpCheck::Accepted => {
            tracing::info!(
                "Login success for {}",
                session.claimant_email().unwrap_or_default()
            );
            Notice::success("Authentication successful!")
        }
        OtpCheck::Expired => Notice::error("OTP has expired. Please request a new one."),
        OtpCheck::Mismatch => Notice::error("Incorrect OTP. Please try again."),
        OtpCheck::NotIssued => {
            Notice::error("No OTP has been requested yet. Please request a code first.")
        }
    };

    render_page(&state, &handle.id, &session, &[notice])
}

/// POST /logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    CurrentSession(handle): CurrentSession,
) -> Result<Response, AppError> {
    let mut session = handle.session.lock().await;
    if let Some(email) = session.claimant_email().filter(|_| session.is_authenticated()) {
        tracing::info!("Logout for {}", email);
    }
    session.logout();
    render_page(&state, &handle.id, &session, &[])
}
