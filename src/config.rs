use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Automation webhook that turns chat messages into replies.
    #[serde(default)]
    pub webhook_url: String,
    #[serde(default = "default_validity_minutes")]
    pub otp_validity_minutes: u32,
    #[serde(default = "default_relay_timeout")]
    pub relay_timeout_secs: u64,
    /// Sessions untouched for this long are dropped from memory.
    #[serde(default = "default_session_idle")]
    pub session_idle_minutes: u64,
    /// Show the code on screen when it could not be emailed.
    #[serde(default = "default_true")]
    pub reveal_code_on_failure: bool,
    /// Mark the session cookie `Secure` (serve behind TLS only).
    #[serde(default)]
    pub cookie_secure: bool,
    #[serde(default)]
    pub smtp: SmtpConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SmtpConfig {
    #[serde(default = "default_smtp_host")]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub sender_email: Option<String>,
    pub sender_password: Option<String>,
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
            sender_email: None,
            sender_password: None,
            from_name: default_from_name(),
        }
    }
}

impl SmtpConfig {
    /// Sender identity and credential, or a configuration error when either is
    /// absent or blank.
    pub fn credentials(&self) -> Result<(&str, &str), ConfigError> {
        let email = self.sender_email.as_deref().map(str::trim).unwrap_or("");
        let password = self.sender_password.as_deref().unwrap_or("");
        if email.is_empty() || password.is_empty() {
            return Err(ConfigError::MissingSmtpCredentials);
        }
        Ok((email, password))
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("SMTP sender_email and sender_password must both be set")]
    MissingSmtpCredentials,
    #[error("webhook_url is not set")]
    MissingWebhookUrl,
    #[error("webhook_url must start with http:// or https://, got {0:?}")]
    InvalidWebhookUrl(String),
    #[error("otp_validity_minutes must be greater than zero")]
    ZeroValidityWindow,
    #[error("relay_timeout_secs must be greater than zero")]
    ZeroRelayTimeout,
}

impl AppConfig {
    /// Checks the settings `serve` cannot run without. SMTP credentials are
    /// not checked here: a missing mailer degrades to on-screen codes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.webhook_url.trim();
        if url.is_empty() {
            return Err(ConfigError::MissingWebhookUrl);
        }
        if !url.starts_with("https://") && !url.starts_with("http://") {
            return Err(ConfigError::InvalidWebhookUrl(url.to_string()));
        }
        if self.otp_validity_minutes == 0 {
            return Err(ConfigError::ZeroValidityWindow);
        }
        if self.relay_timeout_secs == 0 {
            return Err(ConfigError::ZeroRelayTimeout);
        }
        Ok(())
    }

    pub fn otp_validity(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.otp_validity_minutes))
    }

    pub fn relay_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.relay_timeout_secs)
    }

    pub fn session_idle(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.session_idle_minutes.saturating_mul(60))
    }

    /// Copy of the config that is safe to print.
    pub fn redacted(&self) -> Self {
        let mut cfg = self.clone();
        if cfg.smtp.sender_password.is_some() {
            cfg.smtp.sender_password = Some("********".into());
        }
        cfg
    }
}

// Default functions
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8501
}
fn default_validity_minutes() -> u32 {
    10
}
fn default_relay_timeout() -> u64 {
    30
}
fn default_session_idle() -> u64 {
    60
}
fn default_true() -> bool {
    true
}
fn default_smtp_host() -> String {
    "smtp.gmail.com".into()
}
fn default_smtp_port() -> u16 {
    587
}
fn default_from_name() -> String {
    "OTP Chat".into()
}

/// Load config from TOML file with env var overrides.
pub fn load(path: &str) -> anyhow::Result<AppConfig> {
    let content = if std::path::Path::new(path).exists() {
        std::fs::read_to_string(path)?
    } else {
        tracing::warn!("Config file not found at {}, using defaults", path);
        String::new()
    };

    let mut config: AppConfig = toml::from_str(&content)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    Ok(config)
}

fn apply_env_overrides(
    config: &mut AppConfig,
    var: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    if let Some(v) = var("OTPCHAT_HOST") {
        config.host = v;
    }
    if let Some(v) = var("OTPCHAT_PORT") {
        config.port = v.parse()?;
    }
    if let Some(v) = var("OTPCHAT_WEBHOOK_URL") {
        config.webhook_url = v;
    }
    if let Some(v) = var("OTPCHAT_OTP_VALIDITY_MINUTES") {
        config.otp_validity_minutes = v.parse()?;
    }
    if let Some(v) = var("SMTP_SERVER") {
        config.smtp.host = v;
    }
    if let Some(v) = var("SMTP_PORT") {
        config.smtp.port = v.parse()?;
    }
    if let Some(v) = var("SENDER_EMAIL") {
        config.smtp.sender_email = Some(v);
    }
    if let Some(v) = var("SENDER_PASSWORD") {
        config.smtp.sender_password = Some(v);
    }
    Ok(())
}
