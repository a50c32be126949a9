//! Email one-time-password gated chat front-end.
//!
//! Visitors prove control of an email address with a 6-digit code, then chat
//! with an automation webhook whose replies are shown in a per-session
//! transcript.

pub mod auth;
pub mod config;
pub mod email;
pub mod error;
pub mod relay;
pub mod routes;
pub mod session;
pub mod state;
pub mod views;
