//! Configuration management for keyward.
//!
//! Loads configuration from ${KEYWARD_HOME}/config.toml with sensible
//! defaults.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Returns the default config template with comments.
///
/// This is embedded from default_config.toml at compile time.
/// To update, edit default_config.toml directly.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

/// Merges user config values into the default template.
///
/// This ensures new comments/sections from the template are always present,
/// while preserving user's customized values.
fn merge_with_template(user_config: &str) -> Result<String> {
    use toml_edit::DocumentMut;

    let mut doc: DocumentMut = default_config_template()
        .parse()
        .context("Failed to parse default config template")?;

    let user_doc: DocumentMut = user_config.parse().context("Failed to parse user config")?;

    merge_items(doc.as_table_mut(), user_doc.as_table());

    Ok(doc.to_string())
}

/// Recursively merges items from source table into target table.
fn merge_items(target: &mut toml_edit::Table, source: &toml_edit::Table) {
    use toml_edit::Item;

    for (key, value) in source.iter() {
        match value {
            Item::Value(v) => {
                target[key] = Item::Value(v.clone());
            }
            Item::Table(src_table) => {
                if let Some(Item::Table(target_table)) = target.get_mut(key) {
                    merge_items(target_table, src_table);
                } else {
                    target[key] = Item::Table(src_table.clone());
                }
            }
            Item::ArrayOfTables(src_arr) => {
                target[key] = Item::ArrayOfTables(src_arr.clone());
            }
            Item::None => {}
        }
    }
}

pub mod paths {
    //! Path resolution for keyward configuration and data files.
    //!
    //! KEYWARD_HOME resolution order:
    //! 1. KEYWARD_HOME environment variable (if set)
    //! 2. ~/.config/keyward (default)

    use std::path::PathBuf;

    /// Returns the keyward home directory.
    ///
    /// Checks KEYWARD_HOME env var first, falls back to ~/.config/keyward
    pub fn keyward_home() -> PathBuf {
        if let Ok(home) = std::env::var("KEYWARD_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .map(|h| h.join(".config").join("keyward"))
            .expect("Could not determine home directory")
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        keyward_home().join("config.toml")
    }

    /// Returns the default path to the credentials file.
    pub fn credentials_path() -> PathBuf {
        keyward_home().join("credentials.json")
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Token refresh endpoint. Refresh is disabled when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_url: Option<String>,

    /// Seconds before expiry at which a token already counts as expiring.
    pub refresh_leeway_secs: u64,

    /// Credentials file override. Relative paths resolve against the
    /// keyward home directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials_file: Option<String>,
}

impl Config {
    const DEFAULT_REFRESH_LEEWAY_SECS: u64 = 300;

    /// Loads configuration from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Saves only the refresh_url field to the config file.
    ///
    /// Creates the file if it doesn't exist.
    /// Preserves existing fields and comments using toml_edit.
    pub fn save_refresh_url(url: &str) -> Result<()> {
        Self::save_refresh_url_to(&paths::config_path(), url)
    }

    /// Saves only the refresh_url field to a specific config file path.
    ///
    /// Creates the file with default template if it doesn't exist.
    /// If file exists, merges user values into the latest template.
    pub fn save_refresh_url_to(path: &Path, url: &str) -> Result<()> {
        use toml_edit::{DocumentMut, value};

        let contents = if path.exists() {
            let user_config = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            merge_with_template(&user_config)?
        } else {
            default_config_template().to_string()
        };

        let mut doc: DocumentMut = contents
            .parse()
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        doc["refresh_url"] = value(url);

        Self::write_config(path, &doc.to_string())
    }

    /// Returns the refresh leeway as a duration.
    pub fn refresh_leeway(&self) -> Duration {
        Duration::seconds(self.refresh_leeway_secs as i64)
    }

    /// Returns the effective credentials file path.
    pub fn credentials_path(&self) -> PathBuf {
        match &self.credentials_file {
            Some(file) => {
                let path = PathBuf::from(file);
                if path.is_absolute() {
                    path
                } else {
                    paths::keyward_home().join(path)
                }
            }
            None => paths::credentials_path(),
        }
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Writes config content to a file, creating parent directories as needed.
    /// Uses atomic write (temp file + rename) to prevent corruption.
    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_url: None,
            refresh_leeway_secs: Self::DEFAULT_REFRESH_LEEWAY_SECS,
            credentials_file: None,
        }
    }
}
