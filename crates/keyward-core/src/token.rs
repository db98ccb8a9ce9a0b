//! Access/refresh token pair, the default credential type.
//!
//! Tokens are never logged or displayed in full; use [`mask_token`] for
//! anything user-visible.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::jwt;
use crate::policy::Credential;

/// An access token with an optional refresh token.
///
/// Expiry is read from the embedded JWT `exp` claims. Opaque (non-JWT)
/// tokens report no expiry, which the default policy treats as expired;
/// consumers that accept opaque tokens install their own validity
/// predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// The access token (short-lived).
    pub access: String,
    /// The refresh token (long-lived), when the issuer provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,
}

impl TokenPair {
    pub fn new(access: impl Into<String>, refresh: Option<String>) -> Self {
        Self {
            access: access.into(),
            refresh,
        }
    }
}

impl Credential for TokenPair {
    fn expires_at(&self) -> Option<DateTime<Utc>> {
        jwt::expires_at(&self.access)
    }

    fn refresh_expires_at(&self) -> Option<DateTime<Utc>> {
        self.refresh.as_deref().and_then(jwt::expires_at)
    }

    fn has_refresh(&self) -> bool {
        self.refresh.is_some()
    }
}

/// Returns a masked version of a token for display (first 12 chars + ...).
pub fn mask_token(token: &str) -> String {
    // Counted in chars, not bytes: tokens are not guaranteed ASCII.
    if token.chars().count() <= 16 {
        return "***".to_string();
    }
    let prefix: String = token.chars().take(12).collect();
    format!("{prefix}...")
}
