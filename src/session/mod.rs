//! Per-browser session state — authentication status, the pending OTP, and
//! the chat transcript.
//!
//! A [`Session`] is a two-state machine (see [`Status`]):
//!
//! - `LoggedOut` → `LoggedOut` on [`Session::issue_otp`] (re-entrant, replaces any pending code)
//! - `LoggedOut` → `LoggedIn` on a [`Session::verify`] that returns [`OtpCheck::Accepted`]
//! - `LoggedIn` → `LoggedOut` on [`Session::logout`], which resets every field
//! - `LoggedIn` self-loop on [`Session::push_user`] / [`Session::push_assistant`]

pub mod store;
pub mod types;

pub use store::{SessionHandle, SessionStore};
pub use types::*;

use crate::auth::otp::{self, OtpCheck, PendingOtp};
use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Default)]
pub struct Session {
    authenticated: bool,
    pending: Option<PendingOtp>,
    transcript: Vec<ChatMessage>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> Status {
        if self.authenticated {
            Status::LoggedIn
        } else {
            Status::LoggedOut
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn pending_otp(&self) -> Option<&PendingOtp> {
        self.pending.as_ref()
    }

    /// Address the pending code was sent to; once logged in, the session's identity.
    pub fn claimant_email(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.email.as_str())
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.pending.as_ref().map(|p| p.issued_at)
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// Record a freshly issued code, replacing any earlier one.
    pub fn issue_otp(&mut self, code: impl Into<String>, email: impl Into<String>, now: DateTime<Utc>) {
        self.pending = Some(PendingOtp::new(code, email, now));
    }

    /// Check `candidate` and log the session in when it is accepted.
    pub fn verify(&mut self, candidate: &str, now: DateTime<Utc>, validity: Duration) -> OtpCheck {
        let check = otp::check_otp(self.pending.as_ref(), candidate, now, validity);
        if check.is_accepted() {
            self.authenticated = true;
        }
        check
    }

    /// Reset to the initial `LoggedOut` state.
    pub fn logout(&mut self) {
        *self = Self::default();
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.transcript.push(ChatMessage::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.transcript.push(ChatMessage::assistant(content));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> Duration {
        Duration::minutes(10)
    }

    #[test]
    fn fresh_session_is_logged_out_and_empty() {
        let s = Session::new();
        assert_eq!(s.status(), Status::LoggedOut);
        assert!(s.pending_otp().is_none());
        assert!(s.claimant_email().is_none());
        assert!(s.issued_at().is_none());
        assert!(s.transcript().is_empty());
    }

    #[test]
    fn verify_on_fresh_session_fails() {
        let mut s = Session::new();
        assert_eq!(s.verify("123456", Utc::now(), window()), OtpCheck::NotIssued);
        assert!(!s.is_authenticated());
    }

    #[test]
    fn pending_fields_are_set_together() {
        let mut s = Session::new();
        let t0 = Utc::now();
        s.issue_otp("123456", "a@b.com", t0);
        assert_eq!(s.pending_otp().map(|p| p.code.as_str()), Some("123456"));
        assert_eq!(s.claimant_email(), Some("a@b.com"));
        assert_eq!(s.issued_at(), Some(t0));
        assert_eq!(s.status(), Status::LoggedOut);
    }

    #[test]
    fn reissue_invalidates_previous_code() {
        let mut s = Session::new();
        let t0 = Utc::now();
        s.issue_otp("111111", "a@b.com", t0);
        s.issue_otp("222222", "c@d.org", t0 + Duration::minutes(1));

        let now = t0 + Duration::minutes(2);
        assert_eq!(s.verify("111111", now, window()), OtpCheck::Mismatch);
        assert!(!s.is_authenticated());
        assert_eq!(s.verify("222222", now, window()), OtpCheck::Accepted);
        assert_eq!(s.claimant_email(), Some("c@d.org"));
    }

    #[test]
    fn expired_code_does_not_log_in() {
        let mut s = Session::new();
        let t0 = Utc::now();
        s.issue_otp("123456", "a@b.com", t0);
        assert_eq!(
            s.verify("123456", t0 + Duration::minutes(10) + Duration::seconds(1), window()),
            OtpCheck::Expired
        );
        assert_eq!(s.status(), Status::LoggedOut);
    }

    #[test]
    fn successful_verify_binds_identity() {
        let mut s = Session::new();
        let t0 = Utc::now();
        s.issue_otp("123456", "a@b.com", t0);
        assert!(s.verify("123456", t0 + Duration::minutes(5), window()).is_accepted());
        assert_eq!(s.status(), Status::LoggedIn);
        assert_eq!(s.claimant_email(), Some("a@b.com"));
    }

    #[test]
    fn transcript_keeps_insertion_order() {
        let mut s = Session::new();
        s.push_user("hello");
        s.push_assistant("hi there");
        s.push_user("bye");
        let roles: Vec<Role> = s.transcript().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
        assert_eq!(s.transcript()[1].content, "hi there");
    }

    #[test]
    fn logout_clears_everything() {
        let mut s = Session::new();
        let t0 = Utc::now();
        s.issue_otp("123456", "a@b.com", t0);
        s.verify("123456", t0, window());
        s.push_user("hello");
        s.push_assistant("hi");

        s.logout();
        assert_eq!(s.status(), Status::LoggedOut);
        assert!(s.pending_otp().is_none());
        assert!(s.claimant_email().is_none());
        assert!(s.issued_at().is_none());
        assert!(s.transcript().is_empty());
        assert_eq!(s.verify("123456", t0, window()), OtpCheck::NotIssued);
    }
}
