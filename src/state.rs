use crate::config::AppConfig;
use crate::email::OtpMailer;
use crate::relay::RelayClient;
use crate::session::SessionStore;
use crate::views::Views;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub type SharedState = Arc<AppState>;

/// Source of "now" for issuing and checking codes.
pub type Clock = fn() -> DateTime<Utc>;

pub struct AppState {
    pub config: AppConfig,
    pub sessions: SessionStore,
    pub views: Views,
    pub mailer: Option<Arc<dyn OtpMailer>>,
    /// Why `mailer` is absent, shown to users requesting a code.
    pub mailer_error: Option<String>,
    pub relay: RelayClient,
    pub clock: Clock,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        views: Views,
        mailer: Result<Arc<dyn OtpMailer>, String>,
        relay: RelayClient,
    ) -> SharedState {
        Self::with_clock(config, views, mailer, relay, Utc::now)
    }

    pub fn with_clock(
        config: AppConfig,
        views: Views,
        mailer: Result<Arc<dyn OtpMailer>, String>,
        relay: RelayClient,
        clock: Clock,
    ) -> SharedState {
        let (mailer, mailer_error) = match mailer {
            Ok(m) => (Some(m), None),
            Err(e) => (None, Some(e)),
        };
        Arc::new(Self {
            sessions: SessionStore::new(config.session_idle()),
            config,
            views,
            mailer,
            mailer_error,
            relay,
            clock,
        })
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }
}
