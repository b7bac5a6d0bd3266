//! HMAC request signing for the Solidi private API.
//!
//! The server has used three message layouts over time, so the scheme is
//! explicit configuration rather than something inferred from the secret.
//! Every scheme produces a standard (padded) base64 digest for `API-Sign`.
//! Secrets are accepted with or without trailing `=` padding.

use base64::{
    Engine as _, alphabet,
    engine::{
        DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig,
        general_purpose::STANDARD as BASE64,
    },
};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};

use crate::core::{Error, Result};

/// Standard alphabet, padding optional on decode.
const SECRET_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

type HmacSha256 = Hmac<Sha256>;
type HmacSha512 = Hmac<Sha512>;

/// Message layout and key handling used to compute `API-Sign`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SigningScheme {
    /// HMAC-SHA256 over `nonce ‖ path ‖ body`, keyed with the raw secret text.
    #[serde(rename = "A", alias = "a")]
    PlainSecret,
    /// HMAC-SHA256 over `domain ‖ path ‖ body`, keyed with the base64-decoded secret.
    #[serde(rename = "B", alias = "b")]
    DomainBound,
    /// HMAC-SHA512 over `path ‖ SHA256(nonce ‖ body)`, keyed with the base64-decoded secret.
    #[serde(rename = "C", alias = "c")]
    HashedBody,
}

impl SigningScheme {
    /// Whether the secret must be valid base64.
    pub fn requires_encoded_secret(self) -> bool {
        !matches!(self, SigningScheme::PlainSecret)
    }
}

impl std::fmt::Display for SigningScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            SigningScheme::PlainSecret => "A",
            SigningScheme::DomainBound => "B",
            SigningScheme::HashedBody => "C",
        };
        f.write_str(tag)
    }
}

impl std::str::FromStr for SigningScheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "A" | "a" => Ok(SigningScheme::PlainSecret),
            "B" | "b" => Ok(SigningScheme::DomainBound),
            "C" | "c" => Ok(SigningScheme::HashedBody),
            other => Err(Error::Config(format!(
                "unknown signing scheme '{other}', expected A, B or C"
            ))),
        }
    }
}

/// Compute the base64 `API-Sign` value for one request.
///
/// `path` is the full request path (prefix included) and `body` the exact
/// text that goes on the wire. Pure: identical inputs give identical output.
pub fn sign(
    scheme: SigningScheme,
    domain: &str,
    path: &str,
    nonce: u64,
    body: &str,
    secret: &str,
) -> Result<String> {
    let nonce = nonce.to_string();

    let digest = match scheme {
        SigningScheme::PlainSecret => {
            let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
                .map_err(|e| Error::Encoding(e.to_string()))?;
            mac.update(nonce.as_bytes());
            mac.update(path.as_bytes());
            mac.update(body.as_bytes());
            mac.finalize().into_bytes().to_vec()
        }
        SigningScheme::DomainBound => {
            let key = decode_secret(secret)?;
            let mut mac =
                HmacSha256::new_from_slice(&key).map_err(|e| Error::Encoding(e.to_string()))?;
            mac.update(domain.as_bytes());
            mac.update(path.as_bytes());
            mac.update(body.as_bytes());
            mac.finalize().into_bytes().to_vec()
        }
        SigningScheme::HashedBody => {
            let key = decode_secret(secret)?;

            let mut hasher = Sha256::new();
            hasher.update(nonce.as_bytes());
            hasher.update(body.as_bytes());
            let body_hash = hasher.finalize();

            let mut mac =
                HmacSha512::new_from_slice(&key).map_err(|e| Error::Encoding(e.to_string()))?;
            mac.update(path.as_bytes());
            mac.update(&body_hash);
            mac.finalize().into_bytes().to_vec()
        }
    };

    Ok(BASE64.encode(digest))
}

fn decode_secret(secret: &str) -> Result<Vec<u8>> {
    SECRET_ENGINE
        .decode(secret)
        .map_err(|e| Error::Encoding(format!("API secret is not valid base64: {e}")))
}

/// Signer bound to one scheme and one signing domain.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    scheme: SigningScheme,
    domain: String,
}

impl RequestSigner {
    pub fn new(scheme: SigningScheme, domain: impl Into<String>) -> Self {
        Self {
            scheme,
            domain: domain.into(),
        }
    }

    pub fn scheme(&self) -> SigningScheme {
        self.scheme
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn sign(&self, path: &str, nonce: u64, body: &str, secret: &str) -> Result<String> {
        sign(self.scheme, &self.domain, path, nonce, body, secret)
    }

    /// Fail early on a secret this scheme cannot use.
    pub fn check_secret(&self, secret: &str) -> Result<()> {
        if self.scheme.requires_encoded_secret() {
            decode_secret(secret)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "c2VjcmV0LWtleS1ieXRlcw==";
    const DOMAIN: &str = "t2.solidi.co";
    const PATH: &str = "/api2/v1/balance";
    const NONCE: u64 = 1_700_000_000_000_000;
    const BODY: &str = r#"{"nonce":1700000000000000}"#;

    #[test]
    fn test_plain_secret_known_vector() {
        let sig = sign(SigningScheme::PlainSecret, DOMAIN, PATH, NONCE, BODY, SECRET).unwrap();
        assert_eq!(sig, "JvgM0T5MtcWCW/Dp2643bHDlbhm9V28y4YqY2GHEf94=");
    }

    #[test]
    fn test_domain_bound_known_vector() {
        let sig = sign(SigningScheme::DomainBound, DOMAIN, PATH, NONCE, BODY, SECRET).unwrap();
        assert_eq!(sig, "fmX7dKSzqKJPeQItMuxhyD/ZnCBlqbLv3k/SbhXB9cY=");
    }

    #[test]
    fn test_hashed_body_known_vector() {
        let sig = sign(SigningScheme::HashedBody, DOMAIN, PATH, NONCE, BODY, SECRET).unwrap();
        assert_eq!(
            sig,
            "C5dDsKRQPBr+Ncx+1/W2a0D7is1dQSZDr3Ax71rnxWDXYCVr9En0KBjgr0U+pZlzh6uMgxyEyD0cahHlnugi5Q=="
        );
    }

    #[test]
    fn test_sign_is_deterministic() {
        for scheme in [
            SigningScheme::PlainSecret,
            SigningScheme::DomainBound,
            SigningScheme::HashedBody,
        ] {
            let a = sign(scheme, DOMAIN, PATH, NONCE, BODY, SECRET).unwrap();
            let b = sign(scheme, DOMAIN, PATH, NONCE, BODY, SECRET).unwrap();
            assert_eq!(a, b, "scheme {scheme}");
        }
    }

    #[test]
    fn test_single_byte_change_changes_signature() {
        let tampered_body = r#"{"nonce":1700000000000001}"#;
        let tampered_path = "/api2/v1/balancf";

        for scheme in [
            SigningScheme::PlainSecret,
            SigningScheme::DomainBound,
            SigningScheme::HashedBody,
        ] {
            let base = sign(scheme, DOMAIN, PATH, NONCE, BODY, SECRET).unwrap();
            let body_changed = sign(scheme, DOMAIN, PATH, NONCE, tampered_body, SECRET).unwrap();
            let path_changed = sign(scheme, DOMAIN, tampered_path, NONCE, BODY, SECRET).unwrap();
            assert_ne!(base, body_changed, "scheme {scheme}");
            assert_ne!(base, path_changed, "scheme {scheme}");
        }
    }

    #[test]
    fn test_domain_only_binds_scheme_b() {
        let other = "api.solidi.co";
        let b1 = sign(SigningScheme::DomainBound, DOMAIN, PATH, NONCE, BODY, SECRET).unwrap();
        let b2 = sign(SigningScheme::DomainBound, other, PATH, NONCE, BODY, SECRET).unwrap();
        assert_ne!(b1, b2);

        let a1 = sign(SigningScheme::PlainSecret, DOMAIN, PATH, NONCE, BODY, SECRET).unwrap();
        let a2 = sign(SigningScheme::PlainSecret, other, PATH, NONCE, BODY, SECRET).unwrap();
        assert_eq!(a1, a2);
    }

    #[test]
    fn test_malformed_secret_is_encoding_error() {
        let bad = "not base64!!";
        for scheme in [SigningScheme::DomainBound, SigningScheme::HashedBody] {
            let err = sign(scheme, DOMAIN, PATH, NONCE, BODY, bad).unwrap_err();
            assert!(matches!(err, Error::Encoding(_)), "scheme {scheme}");
        }
        // Scheme A uses the secret text as-is
        assert!(sign(SigningScheme::PlainSecret, DOMAIN, PATH, NONCE, BODY, bad).is_ok());
    }

    #[test]
    fn test_unpadded_secret_signs_like_padded() {
        let unpadded = SECRET.trim_end_matches('=');
        assert_ne!(unpadded, SECRET);
        for scheme in [SigningScheme::DomainBound, SigningScheme::HashedBody] {
            let padded = sign(scheme, DOMAIN, PATH, NONCE, BODY, SECRET).unwrap();
            let bare = sign(scheme, DOMAIN, PATH, NONCE, BODY, unpadded).unwrap();
            assert_eq!(padded, bare, "scheme {scheme}");
        }
        let signer = RequestSigner::new(SigningScheme::HashedBody, DOMAIN);
        assert!(signer.check_secret(unpadded).is_ok());
    }

    #[test]
    fn test_scheme_parsing() {
        assert_eq!("A".parse::<SigningScheme>().unwrap(), SigningScheme::PlainSecret);
        assert_eq!("c".parse::<SigningScheme>().unwrap(), SigningScheme::HashedBody);
        assert!(matches!("D".parse::<SigningScheme>(), Err(Error::Config(_))));
    }

    #[test]
    fn test_request_signer_check_secret() {
        let signer = RequestSigner::new(SigningScheme::DomainBound, DOMAIN);
        assert!(signer.check_secret(SECRET).is_ok());
        assert!(signer.check_secret("%%%").is_err());

        let plain = RequestSigner::new(SigningScheme::PlainSecret, DOMAIN);
        assert!(plain.check_secret("%%%").is_ok());
    }
}
