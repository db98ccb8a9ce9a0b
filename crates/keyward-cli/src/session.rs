//! Session wiring shared by the commands.

use std::sync::Arc;

use anyhow::{Context, Result};
use keyward_core::config::Config;
use keyward_core::jwt;
use keyward_core::policy::Policy;
use keyward_core::runtime::{AuthSession, SessionOptions};
use keyward_core::storage::{FileStorage, Storage};
use keyward_core::token::TokenPair;

use crate::refresh;

/// User view shown by `status`: the JWT subject, when present.
pub type User = String;

pub fn storage(config: &Config) -> FileStorage<TokenPair> {
    FileStorage::new(config.credentials_path())
}

/// Reads the stored pair without spinning up a session.
pub fn load_stored(config: &Config) -> Result<Option<TokenPair>> {
    storage(config).load().context("read stored credentials")
}

/// Base session options: file-backed storage, JWT validity policy, and
/// the subject claim as the user. No refresh exchange.
pub fn options(config: &Config) -> SessionOptions<TokenPair, User> {
    // Opaque (non-JWT) access tokens are accepted as-is; only a token
    // with a known expiry in the past is invalid.
    let policy = Policy::new()
        .with_leeway(config.refresh_leeway())
        .with_validate(|pair: &TokenPair, now| {
            jwt::expires_at(&pair.access).is_none_or(|expires| now < expires)
        });

    SessionOptions::new(Arc::new(storage(config)))
        .with_policy(policy)
        .with_user(|pair: &TokenPair| jwt::decode_claims(&pair.access).and_then(|claims| claims.sub))
}

/// Builds the full session, with the HTTP refresh exchange when a
/// refresh endpoint is configured.
pub fn connect(config: &Config) -> AuthSession<TokenPair, User> {
    let mut options = options(config);
    if let Some(url) = &config.refresh_url {
        options = options.with_refresh(refresh::http_refresh(url.clone()));
    }
    AuthSession::spawn(options)
}
