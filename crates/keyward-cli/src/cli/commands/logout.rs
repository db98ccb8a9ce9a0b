//! Logout command handler.

use anyhow::Result;
use keyward_core::config::Config;
use keyward_core::runtime::AuthSession;

use crate::session;

pub async fn run(config: &Config) -> Result<()> {
    let credentials_path = config.credentials_path();
    if !credentials_path.exists() {
        println!("Not logged in (no credentials found).");
        return Ok(());
    }

    let mut session = AuthSession::spawn(session::options(config));
    session.settled().await;

    session.sign_out();
    let mut state = session.changed().await;
    while !state.is_settled() {
        state = session.changed().await;
    }

    println!("✓ Logged out");
    println!("  Credentials removed from: {}", credentials_path.display());

    Ok(())
}
