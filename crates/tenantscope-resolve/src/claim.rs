//! JWT claim extraction source

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;
use tenantscope_core::{RequestView, TenantValue};

use crate::error::ConfigError;
use crate::source::{apply_transform, Outcome, TenantSource, Transform, TransformError};

fn default_token_header() -> String {
    "authorization".to_string()
}

fn default_header_prefix() -> String {
    "Bearer ".to_string()
}

fn default_claim() -> String {
    "tenant_id".to_string()
}

/// Extracts the tenant from a claim inside a JWT-style token.
///
/// The token is read from a bearer header by default, or from a cookie
/// when one is configured. Tokens with two or three dot-separated
/// segments are accepted; the payload is url-safe base64 (with or
/// without padding) wrapping JSON. Signature verification is optional,
/// best-effort HS256 only, and must never be relied on as the sole
/// authentication mechanism.
///
/// The claim is a dot-separated path walked through nested objects:
/// `"user.tenant_id"` reads `{"user": {"tenant_id": ...}}`. A missing
/// step, a non-object intermediate or a null leaf is a miss; a token
/// that cannot be decoded is a failure.
#[derive(Clone, Serialize, Deserialize)]
pub struct ClaimSource {
    /// Header carrying the token. Default: `authorization`.
    #[serde(default = "default_token_header")]
    pub header: String,

    /// Required token prefix, stripped before parsing. The header value
    /// must start with it exactly; an empty prefix disables stripping.
    /// Default: `"Bearer "`.
    #[serde(default = "default_header_prefix")]
    pub header_prefix: String,

    /// Read the token from this cookie instead of the header.
    #[serde(default)]
    pub cookie: Option<String>,

    /// Dot-separated claim path. Default: `tenant_id`.
    #[serde(default = "default_claim")]
    pub claim: String,

    /// Verify the token signature (HS256) before trusting the payload.
    /// Default: false.
    #[serde(default)]
    pub verify: bool,

    /// Shared secret for verification; required when `verify` is set.
    #[serde(default)]
    pub secret: Option<String>,

    /// Optional post-processing of the extracted claim value.
    #[serde(skip)]
    pub transform: Option<Transform>,
}

impl ClaimSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    pub fn with_header_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.header_prefix = prefix.into();
        self
    }

    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }

    pub fn with_claim(mut self, claim: impl Into<String>) -> Self {
        self.claim = claim.into();
        self
    }

    pub fn with_verification(mut self, secret: impl Into<String>) -> Self {
        self.verify = true;
        self.secret = Some(secret.into());
        self
    }

    pub fn with_transform(
        mut self,
        transform: impl Fn(TenantValue) -> Result<TenantValue, TransformError> + Send + Sync + 'static,
    ) -> Self {
        self.transform = Some(std::sync::Arc::new(transform));
        self
    }

    fn locate_token<'r>(&self, request: &'r dyn RequestView) -> Option<&'r str> {
        if let Some(cookie_name) = &self.cookie {
            let token = request.cookie(cookie_name)?;
            return (!token.is_empty()).then_some(token);
        }

        let raw = request.header(&self.header, false)?;
        let stripped = if self.header_prefix.is_empty() {
            raw
        } else {
            raw.strip_prefix(&self.header_prefix)?
        };
        let token = stripped.trim();
        (!token.is_empty()).then_some(token)
    }

    fn decode_payload(&self, token: &str) -> Result<Value, String> {
        let segments: Vec<&str> = token.split('.').collect();
        let (payload, signed) = match segments.as_slice() {
            [_, payload] => (*payload, None),
            [header, payload, signature] => (*payload, Some((*header, *payload, *signature))),
            _ => return Err("Invalid JWT structure: expected 2 or 3 segments".to_string()),
        };

        if self.verify {
            let verified = match (&self.secret, signed) {
                (Some(secret), Some((header, payload, signature))) => {
                    verify_hs256(secret, header, payload, signature)
                }
                // unsigned token, or no secret despite validation
                _ => false,
            };
            if !verified {
                return Err("JWT verification failed".to_string());
            }
        }

        let bytes = decode_segment(payload)
            .map_err(|_| "Invalid base64 encoding in JWT payload".to_string())?;
        serde_json::from_slice(&bytes).map_err(|_| "Invalid JSON in JWT payload".to_string())
    }

    fn walk_claim<'v>(&self, payload: &'v Value) -> Option<&'v Value> {
        let mut cursor = payload;
        for step in self.claim.split('.') {
            match cursor {
                Value::Object(map) => cursor = map.get(step)?,
                _ => return None,
            }
        }
        Some(cursor)
    }
}

impl Default for ClaimSource {
    fn default() -> Self {
        Self {
            header: default_token_header(),
            header_prefix: default_header_prefix(),
            cookie: None,
            claim: default_claim(),
            verify: false,
            secret: None,
            transform: None,
        }
    }
}

impl fmt::Debug for ClaimSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaimSource")
            .field("header", &self.header)
            .field("header_prefix", &self.header_prefix)
            .field("cookie", &self.cookie)
            .field("claim", &self.claim)
            .field("verify", &self.verify)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

impl TenantSource for ClaimSource {
    fn name(&self) -> &str {
        "claim"
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.header.is_empty() {
            return Err(ConfigError::EmptyTokenHeader);
        }
        if matches!(&self.cookie, Some(cookie) if cookie.is_empty()) {
            return Err(ConfigError::EmptyCookieName);
        }
        if self.claim.is_empty() {
            return Err(ConfigError::EmptyClaimPath);
        }
        if self.verify && self.secret.is_none() {
            return Err(ConfigError::SecretRequired);
        }
        Ok(())
    }

    fn extract(&self, request: &dyn RequestView) -> Outcome {
        let Some(token) = self.locate_token(request) else {
            return Outcome::NotFound;
        };

        let payload = match self.decode_payload(token) {
            Ok(payload) => payload,
            Err(reason) => return Outcome::Failed(reason),
        };

        let Some(value) = self.walk_claim(&payload) else {
            return Outcome::NotFound;
        };
        if value.is_null() {
            return Outcome::NotFound;
        }

        apply_transform(
            self.transform.as_ref(),
            TenantValue::new(value.clone()),
            "JWT claim transformation failed",
        )
    }
}

/// Url-safe decode tolerating both padded and unpadded segments.
fn decode_segment(segment: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(segment.trim_end_matches('='))
}

fn verify_hs256(secret: &str, header: &str, payload: &str, signature: &str) -> bool {
    let Ok(signature) = decode_segment(signature) else {
        return false;
    };
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(header.as_bytes());
    mac.update(b".");
    mac.update(payload.as_bytes());
    mac.verify_slice(&signature).is_ok()
}
