use chrono::{DateTime, Duration, Utc};
use rand::RngExt;
use subtle::ConstantTimeEq;

/// Generate a 6-digit OTP code.
pub fn generate_otp() -> String {
    let code = rand::rng().random_range(100_000u32..1_000_000u32);
    code.to_string()
}

/// Loose address check applied before a code is issued: an `@` and a `.`.
pub fn looks_like_email(email: &str) -> bool {
    email.contains('@') && email.contains('.')
}

/// The one code a session may currently verify, with who it was sent to and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOtp {
    pub code: String,
    pub email: String,
    pub issued_at: DateTime<Utc>,
}

impl PendingOtp {
    pub fn new(code: impl Into<String>, email: impl Into<String>, issued_at: DateTime<Utc>) -> Self {
        Self {
            code: code.into(),
            email: email.into(),
            issued_at,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>, validity: Duration) -> bool {
        now.signed_duration_since(self.issued_at) > validity
    }
}

/// Outcome of checking a submitted code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpCheck {
    Accepted,
    /// No code has been issued in this session.
    NotIssued,
    /// The window elapsed; correctness of the code was not considered.
    Expired,
    Mismatch,
}

impl OtpCheck {
    pub fn is_accepted(self) -> bool {
        self == OtpCheck::Accepted
    }
}

/// Check `candidate` against the pending code. The comparison is exact (no
/// trimming or case folding) and constant-time. A failed check leaves the
/// pending code usable until it expires or is replaced.
pub fn check_otp(
    pending: Option<&PendingOtp>,
    candidate: &str,
    now: DateTime<Utc>,
    validity: Duration,
) -> OtpCheck {
    let Some(pending) = pending else {
        return OtpCheck::NotIssued;
    };
    if pending.is_expired(now, validity) {
        return OtpCheck::Expired;
    }
    let matches: bool = candidate.as_bytes().ct_eq(pending.code.as_bytes()).into();
    if matches {
        OtpCheck::Accepted
    } else {
        OtpCheck::Mismatch
    }
}
