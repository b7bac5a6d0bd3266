use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;

use crate::core::{Error, Result, Side};

/// Marker placed in `error` when a response body could not be parsed.
pub const INVALID_JSON: &str = "Invalid JSON";

/// Status plus best-effort parsed body. Non-2xx statuses land here too.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

/// `{error, message}` failure shape.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiResponse {
    /// Parse a raw body; non-JSON text becomes `{error: "Invalid JSON", raw}`.
    pub fn from_text(status: u16, text: &str) -> Self {
        let body = match serde_json::from_str::<Value>(text) {
            Ok(v) => v,
            Err(_) => json!({ "error": INVALID_JSON, "raw": text }),
        };
        Self { status, body }
    }

    pub fn is_invalid_json(&self) -> bool {
        self.body.get("error").and_then(Value::as_str) == Some(INVALID_JSON)
            && self.body.get("raw").is_some()
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status) && self.api_error().is_none()
    }

    pub fn data(&self) -> Option<&Value> {
        self.body.get("data")
    }

    /// The `{error, message}` payload, if the body carries one.
    pub fn api_error(&self) -> Option<ApiErrorBody> {
        let error = self.body.get("error")?;
        let error = match error {
            Value::String(s) => s.clone(),
            Value::Null => return None,
            other => other.to_string(),
        };
        let message = self
            .body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string);
        Some(ApiErrorBody { error, message })
    }

    pub fn raw_text(&self) -> String {
        match self.body.get("raw").and_then(Value::as_str) {
            Some(raw) if self.is_invalid_json() => raw.to_string(),
            _ => self.body.to_string(),
        }
    }

    /// `data` on success; `Error::Decode` / `Error::Api` otherwise.
    ///
    /// A 2xx body without a `data` key is returned whole.
    pub fn into_data(self) -> Result<Value> {
        if self.is_invalid_json() {
            return Err(Error::Decode {
                status: self.status,
                raw: self.raw_text(),
            });
        }

        if let Some(err) = self.api_error() {
            return Err(Error::Api {
                status: self.status,
                error: err.error,
                message: err.message,
                raw: self.body.to_string(),
            });
        }

        if !(200..300).contains(&self.status) {
            return Err(Error::Api {
                status: self.status,
                error: format!("HTTP {}", self.status),
                message: None,
                raw: self.body.to_string(),
            });
        }

        match self.body {
            Value::Object(mut map) if map.contains_key("data") => {
                Ok(map.remove("data").unwrap_or(Value::Null))
            }
            other => Ok(other),
        }
    }

    pub fn decode<T: DeserializeOwned>(self) -> Result<T> {
        Ok(serde_json::from_value(self.into_data()?)?)
    }
}

/// Decimal amount kept as its exact text; accepts JSON strings or numbers.
///
/// Numbers keep their source digits (`0.00010000` stays `0.00010000`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Amount(pub String);

impl Amount {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(Amount(s)),
            Value::Number(n) => Ok(Amount(n.to_string())),
            other => Err(serde::de::Error::custom(format!(
                "expected amount as string or number, got {other}"
            ))),
        }
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Asset → available balance.
pub type Balances = BTreeMap<String, Amount>;

/// Asset → fee kind (`withdraw`, `deposit`, ...) → amount.
pub type FeeTable = BTreeMap<String, BTreeMap<String, Amount>>;

/// Body parameters for `POST balance` (none besides the nonce).
#[derive(Debug, Clone, Default, Serialize)]
pub struct BalanceParams {}

/// Body parameters for `POST fee` (none besides the nonce).
#[derive(Debug, Clone, Default, Serialize)]
pub struct FeeParams {}

/// `GET best_volume_price/<base>/<quote>/<side>/quote/<amount>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestVolumePriceQuery {
    pub base: String,
    pub quote: String,
    pub side: Side,
    pub amount: String,
}

impl BestVolumePriceQuery {
    pub fn new(
        base: impl Into<String>,
        quote: impl Into<String>,
        side: Side,
        amount: impl Into<String>,
    ) -> Self {
        Self {
            base: base.into().to_uppercase(),
            quote: quote.into().to_uppercase(),
            side,
            amount: amount.into(),
        }
    }

    pub fn route(&self) -> String {
        format!(
            "best_volume_price/{}/{}/{}/quote/{}",
            urlencoding::encode(&self.base),
            urlencoding::encode(&self.quote),
            self.side,
            urlencoding::encode(&self.amount),
        )
    }
}
