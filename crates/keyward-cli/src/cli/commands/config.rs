//! Config command handlers.

use anyhow::{Context, Result};
use keyward_core::config;

pub fn path() -> Result<()> {
    println!("{}", config::paths::config_path().display());
    Ok(())
}

pub fn init() -> Result<()> {
    let config_path = config::paths::config_path();
    config::Config::init(&config_path)
        .with_context(|| format!("init config at {}", config_path.display()))?;
    println!("Created config at {}", config_path.display());
    Ok(())
}

pub fn set_refresh_url(url: &str) -> Result<()> {
    config::Config::save_refresh_url(url).context("save refresh_url")?;
    println!("refresh_url set to {url}");
    Ok(())
}
