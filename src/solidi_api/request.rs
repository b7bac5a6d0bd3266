//! Nonce, body and header assembly for one API call.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::core::{ClientConfig, Error, Method, Result};
use crate::credentials::ApiCredentials;
use crate::signer::RequestSigner;

pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_ACCEPT: &str = "Accept";
pub const HEADER_CONTENT_LENGTH: &str = "Content-Length";
pub const HEADER_API_KEY: &str = "API-Key";
pub const HEADER_API_SIGN: &str = "API-Sign";

const APPLICATION_JSON: &str = "application/json";

/// Logical request before framing.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub route: String,
    pub params: Map<String, Value>,
    pub nonce: Option<u64>,
}

/// Fully framed HTTP request, ready for a [`Transport`](super::transport::Transport).
#[derive(Debug, Clone, PartialEq)]
pub struct SignedEnvelope {
    pub method: Method,
    pub url: String,
    /// Full request path, exactly as signed.
    pub path: String,
    pub headers: Vec<(String, String)>,
    /// Exact bytes that were signed; `None` for GET.
    pub body: Option<String>,
}

impl SignedEnvelope {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignedRequest {
    pub request: Request,
    pub envelope: SignedEnvelope,
}

pub struct RequestBuilder {
    base_url: String,
    api_prefix: String,
    signer: RequestSigner,
}

impl RequestBuilder {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            base_url: config.base_url().to_string(),
            api_prefix: config.api_prefix(),
            signer: RequestSigner::new(config.scheme, config.signing_domain()?),
        })
    }

    pub fn signer(&self) -> &RequestSigner {
        &self.signer
    }

    /// `<prefix>/<route>`, the path both requested and signed.
    pub fn path_for(&self, route: &str) -> String {
        format!("{}/{}", self.api_prefix, route.trim_start_matches('/'))
    }

    pub fn build<P: Serialize + ?Sized>(
        &self,
        method: Method,
        route: &str,
        params: &P,
        credentials: Option<&ApiCredentials>,
    ) -> Result<SignedRequest> {
        let params = params_object(params)?;
        let path = self.path_for(route);
        let url = format!("{}{}", self.base_url, path);

        let mut headers = vec![
            (HEADER_CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string()),
            (HEADER_ACCEPT.to_string(), APPLICATION_JSON.to_string()),
        ];

        if !method.is_private() {
            debug!(%method, %path, "built public request");
            return Ok(SignedRequest {
                request: Request {
                    method,
                    route: route.to_string(),
                    params,
                    nonce: None,
                },
                envelope: SignedEnvelope {
                    method,
                    url,
                    path,
                    headers,
                    body: None,
                },
            });
        }

        let credentials = credentials.ok_or_else(|| {
            Error::Config(format!(
                "route '{route}' is private and no API credentials are configured"
            ))
        })?;
        self.signer.check_secret(credentials.expose_secret())?;

        let nonce = credentials.next_nonce()?;
        let mut body_fields = params.clone();
        body_fields.insert("nonce".to_string(), Value::from(nonce));
        let body = serde_json::to_string(&Value::Object(body_fields))?;

        let signature = self.signer.sign(&path, nonce, &body, credentials.expose_secret())?;

        headers.push((HEADER_API_KEY.to_string(), credentials.api_key().to_string()));
        headers.push((HEADER_API_SIGN.to_string(), signature));
        headers.push((HEADER_CONTENT_LENGTH.to_string(), body.len().to_string()));

        debug!(%method, %path, nonce, scheme = %self.signer.scheme(), "built private request");

        Ok(SignedRequest {
            request: Request {
                method,
                route: route.to_string(),
                params,
                nonce: Some(nonce),
            },
            envelope: SignedEnvelope {
                method,
                url,
                path,
                headers,
                body: Some(body),
            },
        })
    }
}

fn params_object<P: Serialize + ?Sized>(params: &P) -> Result<Map<String, Value>> {
    match serde_json::to_value(params)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(Error::Config(format!(
            "request params must serialize to a JSON object, got {other}"
        ))),
    }
}
