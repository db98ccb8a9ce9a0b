//! Unverified JWT claims inspection.
//!
//! Decodes the payload segment of a JWT without verifying the signature.
//! This is for expiry peeking on the client only, never for trusting the
//! token contents.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Claims read from a JWT payload segment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Claims {
    /// Expiry, seconds since the Unix epoch.
    pub exp: Option<i64>,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: Option<i64>,
    /// Subject (user identifier).
    pub sub: Option<String>,
}

/// Decodes the claims of a JWT without verifying the signature.
///
/// Returns `None` unless the token has three segments and the middle one
/// is base64url-encoded JSON.
pub fn decode_claims(token: &str) -> Option<Claims> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return None;
    }
    let payload = URL_SAFE_NO_PAD.decode(parts[1]).ok()?;
    serde_json::from_slice(&payload).ok()
}

/// Returns the expiry of a JWT, if one can be determined.
pub fn expires_at(token: &str) -> Option<DateTime<Utc>> {
    let exp = decode_claims(token)?.exp?;
    DateTime::from_timestamp(exp, 0)
}
