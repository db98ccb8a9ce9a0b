//! HTTP refresh exchange.

use std::sync::Arc;

use anyhow::Context;
use futures_util::FutureExt;
use keyward_core::runtime::RefreshFn;
use keyward_core::token::TokenPair;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Builds the refresh exchange against `refresh_url`.
///
/// Sends the stored refresh token as a `refresh_token` grant. The server
/// may rotate the refresh token; when it doesn't, the old one is kept.
pub fn http_refresh(refresh_url: String) -> RefreshFn<TokenPair> {
    Arc::new(move |pair: TokenPair| {
        let url = refresh_url.clone();
        async move {
            let Some(refresh_token) = pair.refresh else {
                return Ok(None);
            };

            let client = reqwest::Client::new();
            let response = client
                .post(&url)
                .header("Content-Type", "application/json")
                .json(&serde_json::json!({
                    "grant_type": "refresh_token",
                    "refresh_token": &refresh_token,
                }))
                .send()
                .await
                .context("Failed to send token refresh request")?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                anyhow::bail!("Token refresh failed (HTTP {}): {}", status, body);
            }

            let token_data: TokenResponse = response
                .json()
                .await
                .context("Failed to parse token response")?;

            Ok(Some(TokenPair::new(
                token_data.access_token,
                token_data.refresh_token.or(Some(refresh_token)),
            )))
        }
        .boxed()
    })
}
