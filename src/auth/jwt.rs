// src/auth/jwt.rs - Reads display claims out of an access token

//! Claims are read without verifying the signature. They only drive what the
//! UI shows; the server checks the token on every call.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token has {0} segments, expected 3")]
    Segments(usize),
    #[error("payload is not valid base64url: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload is not a JSON object")]
    NotAnObject,
}

/// The claims the client reads
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Claims {
    pub is_moderator: bool,
    pub user_id: Option<i64>,
}

pub fn decode_claims(token: &str) -> Result<Claims, TokenError> {
    let segments: Vec<&str> = token.trim().split('.').collect();
    if segments.len() != 3 {
        return Err(TokenError::Segments(segments.len()));
    }

    // Accept standard-alphabet and padded payloads too.
    let payload: String = segments[1]
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    let bytes = URL_SAFE_NO_PAD.decode(payload.as_bytes())?;
    let value: Value = serde_json::from_slice(&bytes)?;
    let object = value.as_object().ok_or(TokenError::NotAnObject)?;

    let flag = |key: &str| object.get(key).and_then(Value::as_bool) == Some(true);
    let is_moderator = flag("IsModerator") || flag("is_moderator");

    let user_id = ["user_db_id", "userId"]
        .iter()
        .find_map(|key| object.get(*key).and_then(as_id));

    Ok(Claims {
        is_moderator,
        user_id,
    })
}

/// Decodes the claims, logging and falling back to "no claims" on a malformed token.
pub fn claims_or_default(token: &str) -> Claims {
    match decode_claims(token) {
        Ok(claims) => {
            if claims.user_id.is_none() {
                tracing::warn!("access token carries no user id");
            }
            claims
        }
        Err(e) => {
            tracing::warn!("could not read access token claims: {}", e);
            Claims::default()
        }
    }
}

fn as_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) fn encode_token(payload: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string().as_bytes());
    format!("{}.{}.signature", header, body)
}
