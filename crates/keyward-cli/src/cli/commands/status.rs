//! Status command handler.

use anyhow::Result;
use chrono::{Duration, Utc};
use keyward_core::config::Config;
use keyward_core::machine::AuthState;
use keyward_core::policy::Credential;
use keyward_core::token::mask_token;

use crate::session;

pub async fn run(config: &Config) -> Result<()> {
    let mut session = session::connect(config);
    let state = session.settled().await;

    match state {
        AuthState::SignedIn { credential, user } => {
            println!("Signed in (token: {})", mask_token(&credential.access));
            if let Some(user) = user {
                println!("  User: {user}");
            }
            match credential.expires_at() {
                Some(expires) => {
                    let now = Utc::now();
                    let stamp = expires.format("%Y-%m-%d %H:%M:%S UTC");
                    if expires > now {
                        println!("  Expires: {} (in {})", stamp, format_remaining(expires - now));
                    } else {
                        println!("  Expires: {stamp} (expired)");
                    }
                }
                None => println!("  Expires: unknown"),
            }
        }
        AuthState::Loading | AuthState::SignedOut => {
            println!("Not logged in.");
        }
    }

    Ok(())
}

fn format_remaining(remaining: Duration) -> String {
    let hours = remaining.num_hours();
    let minutes = remaining.num_minutes() % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{}m", remaining.num_minutes().max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(Duration::minutes(59)), "59m");
        assert_eq!(format_remaining(Duration::minutes(61)), "1h 1m");
        assert_eq!(format_remaining(Duration::hours(26)), "26h 0m");
        assert_eq!(format_remaining(Duration::seconds(5)), "1m");
    }
}
