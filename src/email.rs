use crate::config::SmtpConfig;
use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

pub const OTP_SUBJECT: &str = "Your OTP Code";

/// Something that can deliver an OTP code to an email address.
#[async_trait]
pub trait OtpMailer: Send + Sync {
    async fn send_otp(&self, to_email: &str, code: &str, validity_minutes: u32)
        -> anyhow::Result<()>;
}

/// Async SMTP (STARTTLS) email service for OTP delivery.
pub struct EmailService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl EmailService {
    /// Fails with [`crate::config::ConfigError::MissingSmtpCredentials`] when
    /// the sender identity or credential is not configured.
    pub fn new(config: &SmtpConfig) -> anyhow::Result<Self> {
        let (sender_email, sender_password) = config.credentials()?;
        let creds = Credentials::new(sender_email.to_string(), sender_password.to_string());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(creds)
            .build();

        let from = format!("{} <{}>", config.from_name, sender_email)
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid sender address: {}", e))?;

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl OtpMailer for EmailService {
    async fn send_otp(
        &self,
        to_email: &str,
        code: &str,
        validity_minutes: u32,
    ) -> anyhow::Result<()> {
        let email = compose_otp_message(self.from.clone(), to_email, code, validity_minutes)?;

        self.transport
            .send(email)
            .await
            .map_err(|e| anyhow::anyhow!("SMTP send failed: {}", e))?;

        Ok(())
    }
}

pub fn otp_text_body(code: &str, validity_minutes: u32) -> String {
    format!(
        "Your OTP code is: {code}\n\n\
         This code will expire in {validity_minutes} minutes.\n\n\
         If you didn't request this code, please ignore this email.\n"
    )
}

pub fn otp_html_body(code: &str, validity_minutes: u32) -> String {
    format!(
        r#"<html>
  <body>
    <h2>Your OTP Code</h2>
    <p>Your OTP code is: <strong style="font-size: 24px; color: #4CAF50;">{code}</strong></p>
    <p>This code will expire in {validity_minutes} minutes.</p>
    <p>If you didn't request this code, please ignore this email.</p>
  </body>
</html>
"#
    )
}

/// Build the multipart (plain text + HTML) OTP message.
pub fn compose_otp_message(
    from: Mailbox,
    to_email: &str,
    code: &str,
    validity_minutes: u32,
) -> anyhow::Result<Message> {
    let to: Mailbox = to_email
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid to address: {}", e))?;

    let message = Message::builder()
        .from(from)
        .to(to)
        .subject(OTP_SUBJECT)
        .multipart(MultiPart::alternative_plain_html(
            otp_text_body(code, validity_minutes),
            otp_html_body(code, validity_minutes),
        ))?;

    Ok(message)
}

/// Result of one delivery attempt, as seen by the login page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent,
    /// No mailer could be built; carries the configuration error.
    NotConfigured(String),
    /// Composition or transport failed; carries the underlying error.
    Failed(String),
}

impl DeliveryOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, DeliveryOutcome::Sent)
    }
}

/// Send one OTP email, folding every failure into a [`DeliveryOutcome`].
pub async fn deliver_otp(
    mailer: Option<&dyn OtpMailer>,
    config_error: Option<&str>,
    to_email: &str,
    code: &str,
    validity_minutes: u32,
) -> DeliveryOutcome {
    let Some(mailer) = mailer else {
        let reason = config_error.unwrap_or("email delivery is not configured");
        tracing::warn!("OTP for {} not emailed: {}", to_email, reason);
        tracing::info!("OTP for {}: {}", to_email, code);
        return DeliveryOutcome::NotConfigured(reason.to_string());
    };

    match mailer.send_otp(to_email, code, validity_minutes).await {
        Ok(()) => {
            tracing::info!("OTP sent to {}", to_email);
            DeliveryOutcome::Sent
        }
        Err(e) => {
            tracing::error!("Failed to send OTP email to {}: {}", to_email, e);
            DeliveryOutcome::Failed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;

    struct FailingMailer;

    #[async_trait]
    impl OtpMailer for FailingMailer {
        async fn send_otp(&self, _: &str, _: &str, _: u32) -> anyhow::Result<()> {
            anyhow::bail!("connection refused")
        }
    }

    struct OkMailer;

    #[async_trait]
    impl OtpMailer for OkMailer {
        async fn send_otp(&self, _: &str, _: &str, _: u32) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn sender() -> Mailbox {
        "OTP Chat <bot@example.com>".parse().unwrap()
    }

    #[test]
    fn bodies_state_code_and_expiry() {
        let text = otp_text_body("482913", 10);
        assert!(text.contains("Your OTP code is: 482913"));
        assert!(text.contains("expire in 10 minutes"));

        let html = otp_html_body("482913", 7);
        assert!(html.contains("<strong"));
        assert!(html.contains("482913"));
        assert!(html.contains("expire in 7 minutes"));
    }

    #[test]
    fn composed_message_is_multipart_with_subject() {
        let message = compose_otp_message(sender(), "a@b.com", "482913", 10).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: Your OTP Code"));
        assert!(raw.contains("To: a@b.com"));
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("text/plain"));
        assert!(raw.contains("text/html"));
    }

    #[test]
    fn compose_rejects_unparseable_recipient() {
        assert!(compose_otp_message(sender(), "not an address", "482913", 10).is_err());
    }

    #[test]
    fn service_requires_sender_credentials() {
        let err = EmailService::new(&SmtpConfig::default())
            .err()
            .expect("missing credentials must fail");
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::MissingSmtpCredentials)
        );
    }

    #[tokio::test]
    async fn deliver_reports_each_outcome() {
        assert_eq!(
            deliver_otp(Some(&OkMailer), None, "a@b.com", "123456", 10).await,
            DeliveryOutcome::Sent
        );

        let failed = deliver_otp(Some(&FailingMailer), None, "a@b.com", "123456", 10).await;
        assert_eq!(failed, DeliveryOutcome::Failed("connection refused".into()));

        let missing = deliver_otp(None, Some("no sender"), "a@b.com", "123456", 10).await;
        assert_eq!(missing, DeliveryOutcome::NotConfigured("no sender".into()));
        assert!(!missing.is_sent());
    }
}
