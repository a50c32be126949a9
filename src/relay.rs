//! Client for the automation webhook that answers chat messages.
//!
//! Every call produces displayable text: upstream failures are turned into a
//! synthetic `Error: ...` reply instead of an `Err`.

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Keys inspected, in priority order, when the webhook answers with an object.
pub const REPLY_KEYS: [&str; 3] = ["response", "output", "message"];

pub const TIMEOUT_REPLY: &str = "Error: Request timed out. Please try again.";

#[derive(Debug, Serialize)]
struct RelayRequest<'a> {
    message: &'a str,
    user_email: &'a str,
}

pub struct RelayClient {
    client: Client,
    url: String,
}

impl RelayClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Forward `message` on behalf of `user_email` and return the reply text.
    pub async fn send(&self, message: &str, user_email: &str) -> String {
        match self.try_send(message, user_email).await {
            Ok(reply) => reply,
            Err(e) if e.is_timeout() => {
                tracing::warn!("Webhook timed out for {}", user_email);
                TIMEOUT_REPLY.to_string()
            }
            Err(e) => {
                tracing::warn!("Webhook request failed: {}", e);
                format!("Error: {e}")
            }
        }
    }

    async fn try_send(&self, message: &str, user_email: &str) -> reqwest::Result<String> {
        let resp = self
            .client
            .post(&self.url)
            .json(&RelayRequest {
                message,
                user_email,
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!("Webhook returned status {}", status.as_u16());
            return Ok(format!("Error: Received status code {}", status.as_u16()));
        }

        let body: Value = resp.json().await?;
        Ok(extract_reply(&body))
    }
}

/// Pull a reply string out of a loosely-typed webhook response.
///
/// Objects are searched for [`REPLY_KEYS`] in order and the first truthy
/// value wins; anything else is stringified whole.
pub fn extract_reply(body: &Value) -> String {
    if let Value::Object(map) = body {
        for key in REPLY_KEYS {
            if let Some(value) = map.get(key).filter(|v| is_truthy(v)) {
                return display(value);
            }
        }
    }
    display(body)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
