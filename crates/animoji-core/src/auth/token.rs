//! Bearer token claim decoding.
//!
//! Tokens issued by the Auth API are JWTs (`header.payload.signature`).
//! The client never verifies the signature; it only reads the payload to
//! learn who is logged in.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Number of `.`-separated segments in a compact JWT.
const JWT_SEGMENTS: usize = 3;

/// Claims decoded from a token payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    /// Expiry in seconds since the epoch. Display only, never enforced here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_google_user: Option<bool>,
    /// Remaining claims, kept as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    /// Expiry as a timestamp, if the token carries a valid `exp` claim
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidTokenError {
    #[error("Token is empty")]
    Empty,

    #[error("Token has {0} segments, expected 3")]
    SegmentCount(usize),

    #[error("Token payload is not valid base64url: {0}")]
    Encoding(String),

    #[error("Token payload is not a JSON object: {0}")]
    Payload(String),

    #[error("Token has no username claim")]
    MissingUsername,
}

/// Decode the claims of a token without verifying its signature.
pub fn decode_claims(token: &str) -> Result<Claims, InvalidTokenError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(InvalidTokenError::Empty);
    }

    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != JWT_SEGMENTS {
        return Err(InvalidTokenError::SegmentCount(segments.len()));
    }

    let payload = segments[1].trim_end_matches('=');
    if payload.is_empty() {
        return Err(InvalidTokenError::Encoding("empty payload".to_string()));
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| InvalidTokenError::Encoding(e.to_string()))?;

    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|e| InvalidTokenError::Payload(e.to_string()))?;

    let object = match value {
        Value::Object(map) => map,
        other => return Err(InvalidTokenError::Payload(format!("found {}", json_kind(&other)))),
    };

    match object.get("username") {
        Some(Value::String(name)) if !name.trim().is_empty() => {}
        _ => return Err(InvalidTokenError::MissingUsername),
    }

    serde_json::from_value(Value::Object(object))
        .map_err(|e| InvalidTokenError::Payload(e.to_string()))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Claim decoding strategy used by the session manager.
pub trait TokenDecoder: Send + Sync {
    fn decode(&self, token: &str) -> Result<Claims, InvalidTokenError>;
}

/// Default decoder for compact JWTs.
#[derive(Debug, Clone, Copy, Default)]
pub struct JwtDecoder;

impl TokenDecoder for JwtDecoder {
    fn decode(&self, token: &str) -> Result<Claims, InvalidTokenError> {
        decode_claims(token)
    }
}
