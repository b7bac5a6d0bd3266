//! API key/secret pair and its nonce scope.

use secrecy::{ExposeSecret, SecretString};
use std::path::Path;
use std::sync::Arc;

use crate::core::{Error, Result};
use crate::nonce::NonceGenerator;

pub const API_KEY_VAR: &str = "SOLIDI_API_KEY";
pub const API_SECRET_VAR: &str = "SOLIDI_API_SECRET";

/// Credentials for private routes.
///
/// Clones share one [`NonceGenerator`], so every request signed with the
/// same key draws from a single increasing sequence.
#[derive(Clone)]
pub struct ApiCredentials {
    api_key: String,
    api_secret: Arc<SecretString>,
    nonces: Arc<NonceGenerator>,
}

impl ApiCredentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: Arc::new(SecretString::from(api_secret.into())),
            nonces: Arc::new(NonceGenerator::new()),
        }
    }

    /// Read `SOLIDI_API_KEY` / `SOLIDI_API_SECRET`, loading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_vars()
    }

    /// Same as [`from_env`](Self::from_env) but with an explicit env file.
    pub fn from_env_file(path: &Path) -> Result<Self> {
        dotenv::from_path(path)
            .map_err(|e| Error::Config(format!("Failed to load {}: {}", path.display(), e)))?;
        Self::from_vars()
    }

    fn from_vars() -> Result<Self> {
        let api_key = std::env::var(API_KEY_VAR)
            .map_err(|_| Error::Config(format!("{API_KEY_VAR} is not set")))?;
        let api_secret = std::env::var(API_SECRET_VAR)
            .map_err(|_| Error::Config(format!("{API_SECRET_VAR} is not set")))?;

        if api_key.trim().is_empty() || api_secret.is_empty() {
            return Err(Error::Config("API key and secret must be non-empty".to_string()));
        }
        Ok(Self::new(api_key, api_secret))
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Secret text, for signing only.
    pub fn expose_secret(&self) -> &str {
        self.api_secret.expose_secret()
    }

    /// Allocate the next nonce for this key.
    pub fn next_nonce(&self) -> Result<u64> {
        self.nonces.next()
    }

    pub fn nonces(&self) -> &NonceGenerator {
        &self.nonces
    }
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}
