use crate::session::SessionHandle;
use crate::state::AppState;
use axum::extract::FromRequestParts;
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use std::convert::Infallible;
use std::sync::Arc;

pub const SESSION_COOKIE: &str = "otpchat_session";

/// The caller's session, resolved from the session cookie. A missing or
/// unknown cookie yields a brand-new `LoggedOut` session.
pub struct CurrentSession(pub SessionHandle);

impl FromRequestParts<Arc<AppState>> for CurrentSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(CurrentSession(state.sessions.get_or_create(session_id(parts))))
    }
}

/// The caller's session only if the cookie names a live one. Used by the JSON
/// endpoints, which never hand out a cookie and so must not start sessions.
pub struct ExistingSession(pub Option<SessionHandle>);

impl FromRequestParts<Arc<AppState>> for ExistingSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let id = session_id(parts);
        Ok(ExistingSession(id.and_then(|id| state.sessions.get(id))))
    }
}

fn session_id(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|header| cookie_value(header, SESSION_COOKIE))
}

/// Find `name` in a `Cookie:` header value.
pub fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name && !value.is_empty()).then_some(value)
    })
}

/// `Set-Cookie` value binding the browser to session `id`.
pub fn session_cookie(id: &str, secure: bool) -> String {
    let mut cookie = format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_cookie_among_others() {
        let header = "theme=dark; otpchat_session=abc-123; lang=en";
        assert_eq!(cookie_value(header, SESSION_COOKIE), Some("abc-123"));
    }

    #[test]
    fn missing_or_empty_cookie_is_none() {
        assert_eq!(cookie_value("theme=dark", SESSION_COOKIE), None);
        assert_eq!(cookie_value("otpchat_session=", SESSION_COOKIE), None);
        assert_eq!(cookie_value("", SESSION_COOKIE), None);
    }

    #[test]
    fn set_cookie_attributes() {
        assert_eq!(
            session_cookie("abc", false),
            "otpchat_session=abc; Path=/; HttpOnly; SameSite=Lax"
        );
        assert!(session_cookie("abc", true).ends_with("; Secure"));
    }
}
