use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::model::{
    ApiResponse, BalanceParams, Balances, BestVolumePriceQuery, FeeParams, FeeTable,
};
use super::request::{RequestBuilder, SignedRequest};
use super::transport::{HttpTransport, Transport};
use crate::core::{ClientConfig, Method, Result};
use crate::credentials::ApiCredentials;

/// Solidi REST client: builds, signs and sends one request per call.
///
/// No retries: a retried private call needs a fresh nonce, so callers
/// re-issue the call instead.
pub struct SolidiClient {
    config: ClientConfig,
    builder: RequestBuilder,
    credentials: Option<ApiCredentials>,
    transport: Arc<dyn Transport>,
}

impl SolidiClient {
    /// Client over HTTP, credentials from the config file or the environment.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let credentials = config.resolve_credentials();
        Self::new(config, credentials)
    }

    pub fn new(config: ClientConfig, credentials: Option<ApiCredentials>) -> Result<Self> {
        let transport = Arc::new(HttpTransport::from_config(&config)?);
        Self::with_transport(config, credentials, transport)
    }

    pub fn with_transport(
        config: ClientConfig,
        credentials: Option<ApiCredentials>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let builder = RequestBuilder::new(&config)?;
        debug!(
            base_url = %config.base_url(),
            prefix = %config.api_prefix(),
            scheme = %config.scheme,
            authenticated = credentials.is_some(),
            "solidi client ready"
        );
        Ok(Self {
            config,
            builder,
            credentials,
            transport,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn credentials(&self) -> Option<&ApiCredentials> {
        self.credentials.as_ref()
    }

    /// Build and sign without sending.
    pub fn prepare<P: Serialize + ?Sized>(
        &self,
        method: Method,
        route: &str,
        params: &P,
    ) -> Result<SignedRequest> {
        self.builder.build(method, route, params, self.credentials.as_ref())
    }

    pub async fn call<P: Serialize + ?Sized>(
        &self,
        method: Method,
        route: &str,
        params: &P,
    ) -> Result<ApiResponse> {
        self.call_with_deadline(method, route, params, self.transport.default_timeout())
            .await
    }

    pub async fn call_with_deadline<P: Serialize + ?Sized>(
        &self,
        method: Method,
        route: &str,
        params: &P,
        deadline: Duration,
    ) -> Result<ApiResponse> {
        let signed = self.prepare(method, route, params)?;
        let response = self
            .transport
            .send_with_deadline(&signed.envelope, deadline)
            .await?;

        if let Some(err) = response.api_error() {
            warn!(
                route,
                status = response.status,
                error = %err.error,
                message = err.message.as_deref().unwrap_or(""),
                "API returned an error"
            );
        }
        Ok(response)
    }

    async fn get(&self, route: &str) -> Result<ApiResponse> {
        self.call(Method::Get, route, &json!({})).await
    }

    pub async fn currency(&self) -> Result<ApiResponse> {
        self.get("currency").await
    }

    pub async fn market(&self) -> Result<ApiResponse> {
        self.get("market").await
    }

    pub async fn ticker(&self) -> Result<ApiResponse> {
        self.get("ticker").await
    }

    pub async fn best_volume_price(&self, query: &BestVolumePriceQuery) -> Result<ApiResponse> {
        self.get(&query.route()).await
    }

    pub async fn balance(&self) -> Result<ApiResponse> {
        self.call(Method::Post, "balance", &BalanceParams::default()).await
    }

    pub async fn fee(&self) -> Result<ApiResponse> {
        self.call(Method::Post, "fee", &FeeParams::default()).await
    }

    pub async fn balances(&self) -> Result<Balances> {
        self.balance().await?.decode()
    }

    pub async fn fees(&self) -> Result<FeeTable> {
        self.fee().await?.decode()
    }
}
