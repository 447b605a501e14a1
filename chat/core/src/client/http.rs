//! HTTP Transport
//!
//! JSON-over-HTTP transport for the chat endpoint, built on `reqwest`.
//! One `POST` per round trip; no retries, no streaming.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;

use super::error::ChatError;
use super::traits::{ChatRequest, ChatResponse, ChatTransport};

/// How long the health probe may take before the service counts as down
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP transport for the chat endpoint
#[derive(Clone, Debug)]
pub struct HttpTransport {
    /// Full URL of the chat endpoint
    endpoint: Url,
    /// HTTP client
    http_client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport for `endpoint`
    ///
    /// `timeout` of `None` leaves reqwest's default (no overall timeout).
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be initialised.
    pub fn new(endpoint: Url, timeout: Option<Duration>) -> reqwest::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            endpoint,
            http_client: builder.build()?,
        })
    }

    /// The configured endpoint
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Root of the endpoint's origin, used for the health probe
    #[must_use]
    pub fn health_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        url.set_path("/");
        url.set_query(None);
        url.set_fragment(None);
        url
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    async fn round_trip(&self, request: &ChatRequest) -> Result<ChatResponse, ChatError> {
        let response = self
            .http_client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::status(status.as_u16(), &body));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice::<ChatResponse>(&body)?)
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(self.health_url())
            .timeout(HEALTH_CHECK_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(error = %e, "Health check failed");
                false
            }
        }
    }
}
