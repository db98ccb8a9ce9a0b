//! Login command handler.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use keyward_core::config::Config;
use keyward_core::machine::AuthState;
use keyward_core::runtime::AuthSession;
use keyward_core::token::{TokenPair, mask_token};

use crate::session;

pub async fn run(config: &Config, access: Option<String>, refresh: Option<String>) -> Result<()> {
    let credentials_path = config.credentials_path();

    // Check if already logged in
    if let Some(existing) = session::load_stored(config)? {
        println!("Already logged in (token: {})", mask_token(&existing.access));
        print!("Do you want to replace the existing credentials? [y/N] ");
        io::stdout().flush()?;

        let mut response = String::new();
        io::stdin().lock().read_line(&mut response)?;
        if !response.trim().eq_ignore_ascii_case("y") {
            println!("Login cancelled.");
            return Ok(());
        }
    }

    let access = match access {
        Some(token) => token,
        None => {
            print!("Paste access token: ");
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().lock().read_line(&mut input)?;
            input
        }
    };
    let access = access.trim().to_string();
    if access.is_empty() {
        anyhow::bail!("Token is empty");
    }
    if access.len() < 20 {
        anyhow::bail!("Token is too short");
    }

    let refresh = refresh
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());
    let pair = TokenPair::new(access, refresh);

    // Login never refreshes over the network; an expired token is
    // rejected rather than exchanged.
    let mut session = AuthSession::spawn(session::options(config));
    session.settled().await;

    session.sign_in(pair);
    let mut state = session.changed().await;
    while !state.is_settled() {
        state = session.changed().await;
    }

    match state {
        AuthState::SignedIn { credential, .. } => {
            println!();
            println!("✓ Logged in (token: {})", mask_token(&credential.access));
            println!("  Credentials saved to: {}", credentials_path.display());
            Ok(())
        }
        AuthState::Loading | AuthState::SignedOut => {
            anyhow::bail!("Login failed: the token was rejected (expired or invalid)")
        }
    }
}
