//! HTTP transport: one envelope in, one status + body out.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use super::model::ApiResponse;
use super::request::{HEADER_CONTENT_LENGTH, SignedEnvelope};
use crate::core::{ClientConfig, Error, Result};

#[async_trait]
pub trait Transport: Send + Sync {
    /// Timeout applied by [`send`](Transport::send).
    fn default_timeout(&self) -> Duration;

    /// Send with a caller-supplied deadline. The in-flight call is dropped
    /// once the deadline passes.
    async fn send_with_deadline(
        &self,
        envelope: &SignedEnvelope,
        deadline: Duration,
    ) -> Result<ApiResponse>;

    async fn send(&self, envelope: &SignedEnvelope) -> Result<ApiResponse> {
        self.send_with_deadline(envelope, self.default_timeout()).await
    }
}

/// reqwest-backed transport (TLS 1.2+).
pub struct HttpTransport {
    client: Client,
    timeout: Duration,
    trace_bodies: bool,
}

impl HttpTransport {
    pub fn new(timeout: Duration, trace_bodies: bool) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .min_tls_version(reqwest::tls::Version::TLS_1_2)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(client, timeout, trace_bodies))
    }

    /// Wrap a preconfigured client (proxies, root certificates, ...).
    pub fn with_client(client: Client, timeout: Duration, trace_bodies: bool) -> Self {
        Self {
            client,
            timeout,
            trace_bodies,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(config.timeout(), config.trace_bodies)
    }

    async fn execute(&self, envelope: &SignedEnvelope, deadline: Duration) -> Result<ApiResponse> {
        let mut request = self
            .client
            .request(envelope.method.into(), &envelope.url)
            .timeout(deadline);

        for (name, value) in &envelope.headers {
            // Written by the HTTP stack from the body itself
            if name.eq_ignore_ascii_case(HEADER_CONTENT_LENGTH) {
                continue;
            }
            request = request.header(name.as_str(), value.as_str());
        }

        if let Some(body) = &envelope.body {
            if self.trace_bodies {
                debug!(body = %body, "request body");
            }
            request = request.body(body.clone());
        }

        debug!(method = %envelope.method, url = %envelope.url, "sending request");

        let response = request
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, deadline))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| map_reqwest_error(e, deadline))?;

        if self.trace_bodies {
            debug!(status, body = %text, "response body");
        }

        let parsed = ApiResponse::from_text(status, &text);
        if parsed.is_invalid_json() {
            warn!(status, len = text.len(), url = %envelope.url, "response body is not JSON");
        } else {
            debug!(status, url = %envelope.url, "response received");
        }
        Ok(parsed)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn default_timeout(&self) -> Duration {
        self.timeout
    }

    async fn send_with_deadline(
        &self,
        envelope: &SignedEnvelope,
        deadline: Duration,
    ) -> Result<ApiResponse> {
        match tokio::time::timeout(deadline, self.execute(envelope, deadline)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(url = %envelope.url, ?deadline, "request abandoned at deadline");
                Err(Error::Timeout(deadline))
            }
        }
    }
}

fn map_reqwest_error(err: reqwest::Error, deadline: Duration) -> Error {
    if err.is_timeout() {
        Error::Timeout(deadline)
    } else {
        Error::from(err)
    }
}
