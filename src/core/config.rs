//! Configuration - Type-safe, validated config

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::core::{Error, Result};
use crate::credentials::ApiCredentials;
use crate::signer::SigningScheme;

pub const DEFAULT_BASE_URL: &str = "https://t2.solidi.co";
pub const DEFAULT_API_PREFIX: &str = "/api2/v1";
/// Prefix used by the older public fee endpoints.
pub const LEGACY_API_PREFIX: &str = "/v1";

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Scheme + host, no trailing path (e.g. https://t2.solidi.co)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path prefix prepended to every route
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Host folded into scheme B signatures; defaults to the base URL host
    #[serde(default)]
    pub signing_domain: Option<String>,

    /// Signing scheme; deliberately has no default
    pub scheme: SigningScheme,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Fallback tracing filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Trace request and response bodies at debug level
    #[serde(default)]
    pub trace_bodies: bool,

    /// Credentials (loaded from env if not provided)
    #[serde(default)]
    pub credentials: Option<CredentialsConfig>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    pub api_key: String,
    pub api_secret: String,
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_api_prefix() -> String {
    DEFAULT_API_PREFIX.to_string()
}
fn default_timeout_ms() -> u64 {
    15_000
}
fn default_log_level() -> String {
    "info".to_string()
}

impl ClientConfig {
    pub fn new(scheme: SigningScheme) -> Self {
        Self {
            base_url: default_base_url(),
            api_prefix: default_api_prefix(),
            signing_domain: None,
            scheme,
            timeout_ms: default_timeout_ms(),
            log_level: default_log_level(),
            trace_bodies: false,
            credentials: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Load from TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: ClientConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            return Err(Error::Config("timeout_ms must be positive".to_string()));
        }
        self.host()?;
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Prefix normalized to a leading slash and no trailing slash ("" allowed).
    pub fn api_prefix(&self) -> String {
        let trimmed = self.api_prefix.trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        }
    }

    fn host(&self) -> Result<String> {
        let url = reqwest::Url::parse(self.base_url())
            .map_err(|e| Error::Config(format!("Invalid base_url '{}': {}", self.base_url, e)))?;
        url.host_str()
            .map(str::to_string)
            .ok_or_else(|| Error::Config(format!("base_url '{}' has no host", self.base_url)))
    }

    /// Domain bound into scheme B signatures.
    pub fn signing_domain(&self) -> Result<String> {
        match &self.signing_domain {
            Some(domain) => Ok(domain.clone()),
            None => self.host(),
        }
    }

    /// Credentials from the config file, else from the environment.
    pub fn resolve_credentials(&self) -> Option<ApiCredentials> {
        match &self.credentials {
            Some(c) => Some(ApiCredentials::new(c.api_key.clone(), c.api_secret.clone())),
            None => ApiCredentials::from_env().ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config = ClientConfig::from_toml(r#"scheme = "B""#).unwrap();
        assert_eq!(config.scheme, SigningScheme::DomainBound);
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.api_prefix(), "/api2/v1");
        assert_eq!(config.timeout(), Duration::from_secs(15));
        assert_eq!(config.signing_domain().unwrap(), "t2.solidi.co");
        assert!(!config.trace_bodies);
    }

    #[test]
    fn test_scheme_is_required() {
        let err = ClientConfig::from_toml(r#"base_url = "https://t2.solidi.co""#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_full_toml() {
        let config = ClientConfig::from_toml(
            r#"
            base_url = "https://t2.solidi.co/"
            api_prefix = "v1/"
            signing_domain = "solidi.co"
            scheme = "C"
            timeout_ms = 10000
            trace_bodies = true

            [credentials]
            api_key = "key"
            api_secret = "c2VjcmV0"
            "#,
        )
        .unwrap();

        assert_eq!(config.base_url(), "https://t2.solidi.co");
        assert_eq!(config.api_prefix(), LEGACY_API_PREFIX);
        assert_eq!(config.signing_domain().unwrap(), "solidi.co");
        assert_eq!(config.timeout(), Duration::from_secs(10));

        let creds = config.resolve_credentials().unwrap();
        assert_eq!(creds.api_key(), "key");
        assert!(!format!("{:?}", config).contains("c2VjcmV0"));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(ClientConfig::from_toml("scheme = \"A\"\ntimeout_ms = 0").is_err());
        assert!(ClientConfig::from_toml("scheme = \"A\"\nbase_url = \"not a url\"").is_err());
    }

    #[test]
    fn test_builder_helpers() {
        let config = ClientConfig::new(SigningScheme::PlainSecret)
            .with_base_url("http://127.0.0.1:8080")
            .with_api_prefix("")
            .with_timeout(Duration::from_millis(250));
        assert_eq!(config.api_prefix(), "");
        assert_eq!(config.timeout_ms, 250);
        assert_eq!(config.signing_domain().unwrap(), "127.0.0.1");
    }
}
