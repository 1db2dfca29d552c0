//! Signed session token codec.
//!
//! Claims are serialized to JSON and carried in a compact token
//! `v1.<payload>.<mac>` where both segments are unpadded URL-safe base64 and
//! the MAC is HMAC-SHA256 under the process-wide session secret. Decoding the
//! token is the only per-request session work; there is no database read.

use anyhow::{Context, Result};
use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::SystemTime;

use super::claims::SessionClaims;

type HmacSha256 = Hmac<Sha256>;

const TOKEN_VERSION: &str = "v1";

/// Everything embedded in the signed session token.
///
/// The optional profile fields ride alongside the claims so the session view
/// can be rebuilt without a lookup; `exp` is unix seconds.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TokenPayload {
    #[serde(flatten)]
    pub claims: SessionClaims,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub exp: i64,
}

#[derive(Debug, Eq, PartialEq)]
pub enum TokenError {
    Malformed,
    InvalidSignature,
    Expired,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed session token"),
            Self::InvalidSignature => write!(f, "invalid session token signature"),
            Self::Expired => write!(f, "expired session token"),
        }
    }
}

impl std::error::Error for TokenError {}

/// Unix seconds for token TTL handling.
pub(crate) fn now_unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Encode and sign a session token.
///
/// # Errors
/// Returns an error if the payload cannot be serialized.
pub(crate) fn encode_session_token(payload: &TokenPayload, secret: &[u8]) -> Result<String> {
    let json = serde_json::to_vec(payload).context("failed to serialize session token payload")?;
    let encoded = Base64UrlUnpadded::encode_string(&json);
    let signing_input = format!("{TOKEN_VERSION}.{encoded}");

    // HMAC accepts keys of any length; the error arm is unreachable in practice.
    let mut mac =
        HmacSha256::new_from_slice(secret).context("failed to key the session token MAC")?;
    mac.update(signing_input.as_bytes());
    let tag = mac.finalize().into_bytes();
    let tag_encoded = Base64UrlUnpadded::encode_string(tag.as_slice());

    Ok(format!("{signing_input}.{tag_encoded}"))
}

/// Verify and decode a session token.
///
/// The MAC comparison is constant-time; the payload is only parsed after the
/// signature checks out.
pub(crate) fn decode_session_token(
    token: &str,
    secret: &[u8],
    now_unix: i64,
) -> Result<TokenPayload, TokenError> {
    let mut parts = token.split('.');
    let (version, payload, tag) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(version), Some(payload), Some(tag), None) => (version, payload, tag),
        _ => return Err(TokenError::Malformed),
    };
    if version != TOKEN_VERSION {
        return Err(TokenError::Malformed);
    }

    let tag_bytes = Base64UrlUnpadded::decode_vec(tag).map_err(|_| TokenError::Malformed)?;
    let signing_input = format!("{version}.{payload}");
    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|_| TokenError::InvalidSignature)?;
    mac.update(signing_input.as_bytes());
    mac.verify_slice(&tag_bytes)
        .map_err(|_| TokenError::InvalidSignature)?;

    let json = Base64UrlUnpadded::decode_vec(payload).map_err(|_| TokenError::Malformed)?;
    let payload: TokenPayload =
        serde_json::from_slice(&json).map_err(|_| TokenError::Malformed)?;

    if payload.exp <= now_unix {
        return Err(TokenError::Expired);
    }

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::types::Role;
    use uuid::Uuid;

    const SECRET: &[u8] = b"test-session-secret";

    fn payload(exp: i64) -> TokenPayload {
        TokenPayload {
            claims: SessionClaims {
                user_id: Uuid::new_v4(),
                tenant_id: Uuid::new_v4(),
                role: Role::Retailer,
                tenant_slug: "jane".to_string(),
                is_admin: false,
            },
            name: Some("Jane".to_string()),
            email: Some("jane@example.com".to_string()),
            image: None,
            exp,
        }
    }

    #[test]
    fn encode_decode_round_trip() {
        let payload = payload(now_unix_seconds() + 3600);
        let Ok(token) = encode_session_token(&payload, SECRET) else {
            panic!("token must encode");
        };

        let Ok(decoded) = decode_session_token(&token, SECRET, now_unix_seconds()) else {
            panic!("token must decode");
        };
        assert_eq!(decoded.claims, payload.claims);
        assert_eq!(decoded.name, payload.name);
        assert_eq!(decoded.email, payload.email);
        assert_eq!(decoded.exp, payload.exp);
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let payload = payload(now_unix_seconds() + 3600);
        let Ok(token) = encode_session_token(&payload, SECRET) else {
            panic!("token must encode");
        };

        // Flip a character inside the payload segment.
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let replacement = if parts[1].starts_with('A') { "B" } else { "A" };
        parts[1].replace_range(0..1, replacement);
        let tampered = parts.join(".");

        let result = decode_session_token(&tampered, SECRET, now_unix_seconds());
        assert_eq!(result.err(), Some(TokenError::InvalidSignature));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let payload = payload(now_unix_seconds() + 3600);
        let Ok(token) = encode_session_token(&payload, SECRET) else {
            panic!("token must encode");
        };
        let result = decode_session_token(&token, b"other-secret", now_unix_seconds());
        assert_eq!(result.err(), Some(TokenError::InvalidSignature));
    }

    #[test]
    fn expired_token_is_rejected() {
        let now = now_unix_seconds();
        let payload = payload(now - 1);
        let Ok(token) = encode_session_token(&payload, SECRET) else {
            panic!("token must encode");
        };
        let result = decode_session_token(&token, SECRET, now);
        assert_eq!(result.err(), Some(TokenError::Expired));
    }

    #[test]
    fn garbage_is_malformed() {
        assert_eq!(
            decode_session_token("not-a-token", SECRET, 0).err(),
            Some(TokenError::Malformed)
        );
        assert_eq!(
            decode_session_token("v2.abc.def", SECRET, 0).err(),
            Some(TokenError::Malformed)
        );
        assert_eq!(
            decode_session_token("v1.abc", SECRET, 0).err(),
            Some(TokenError::Malformed)
        );
    }
}
