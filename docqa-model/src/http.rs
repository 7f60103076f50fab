//! Shared JSON-over-HTTP plumbing for the adapters.

use std::time::Duration;

use docqa_rag::{QaError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::error;

/// A `reqwest` client that maps transport and API failures onto [`QaError`].
#[derive(Debug, Clone)]
pub(crate) struct JsonClient {
    client: reqwest::Client,
    service: &'static str,
    timeout: Option<Duration>,
}

impl JsonClient {
    pub(crate) fn new(service: &'static str) -> Self {
        Self { client: reqwest::Client::new(), service, timeout: None }
    }

    /// Rebuild the client with a per-request timeout.
    pub(crate) fn with_timeout(self, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build().map_err(|e| {
            QaError::Config(format!("failed to build {} HTTP client: {e}", self.service))
        })?;
        Ok(Self { client, service: self.service, timeout: Some(timeout) })
    }

    /// POST `body` as JSON with bearer authentication and decode the reply.
    pub(crate) async fn post<B, R>(&self, url: &str, token: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = error_detail(&body);
            error!(service = self.service, %status, "API error");
            return Err(QaError::service(self.service, format!("API returned {status}: {detail}")));
        }

        response.json().await.map_err(|e| {
            error!(service = self.service, error = %e, "failed to parse response");
            QaError::service(self.service, format!("failed to parse response: {e}"))
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> QaError {
        error!(service = self.service, error = %e, "request failed");
        match self.timeout {
            Some(timeout) if e.is_timeout() => {
                QaError::ServiceTimeout { service: self.service.to_string(), timeout }
            }
            _ => QaError::service(self.service, format!("request failed: {e}")),
        }
    }
}

/// Pull the message out of the error bodies used by both APIs:
/// `{"error": "..."}` and `{"error": {"message": "..."}}`.
fn error_detail(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.to_string();
    };
    match &value["error"] {
        serde_json::Value::String(message) => message.clone(),
        serde_json::Value::Object(detail) => detail
            .get("message")
            .and_then(serde_json::Value::as_str)
            .map_or_else(|| body.to_string(), str::to_string),
        _ => body.to_string(),
    }
}

/// Join a base URL and a path without doubling the slash.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
