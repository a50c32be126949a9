//! Email one-time-password authentication.
//!
//! - [`otp`] — code generation and verification against the pending code
//! - [`middleware`] — session cookie extraction for request handlers

pub mod middleware;
pub mod otp;
