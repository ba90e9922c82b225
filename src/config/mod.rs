use anyhow::{Context, Result};
use keyring::Entry;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

const SERVICE_NAME: &str = "arena-cli";
const TOKEN_USER: &str = "access_token";
const CONFIG_FILE: &str = "config.toml";

/// Environment variable that supplies the access token.
pub const TOKEN_ENV: &str = "ARENA_ACCESS_TOKEN";

#[derive(Debug, Clone)]
pub struct Config {
    config_dir: PathBuf,
    pub api_url: Option<String>,
}

/// Where the access token in use came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Environment,
    Keyring,
}

impl fmt::Display for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Environment => write!(f, "{TOKEN_ENV}"),
            Self::Keyring => write!(f, "keyring"),
        }
    }
}

type Table = HashMap<String, toml::Value>;

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(Self::get_config_dir()?)
    }

    pub fn load_from(config_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&config_dir).context("Failed to create config directory")?;

        let api_url = read_table(&config_dir.join(CONFIG_FILE))?
            .and_then(|config| lookup(&config, "api.url"));

        Ok(Self {
            config_dir,
            api_url,
        })
    }

    pub fn get_config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join("arena"))
            .context("Failed to determine config directory")
    }

    fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    /// The token to authenticate with: the environment first, then the
    /// keyring. An unusable keyring means unauthenticated calls, not a
    /// failure.
    pub fn access_token(&self) -> Option<(String, TokenSource)> {
        resolve_token(std::env::var(TOKEN_ENV).ok(), || self.stored_token())
    }

    pub fn stored_token(&self) -> Result<Option<String>> {
        let entry = Entry::new(SERVICE_NAME, TOKEN_USER)?;
        match entry.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(anyhow::anyhow!("Failed to get access token: {}", e)),
        }
    }

    pub fn set_token(&self, token: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, TOKEN_USER)?;
        entry
            .set_password(token)
            .context("Failed to store access token")?;
        Ok(())
    }

    pub fn remove_token(&self) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, TOKEN_USER)?;
        match entry.delete_password() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()), // Already removed
            Err(e) => Err(anyhow::anyhow!("Failed to remove access token: {}", e)),
        }
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let config_file = self.config_file();
        let mut config: Table = match fs::read_to_string(&config_file) {
            Ok(content) => toml::from_str(&content).unwrap_or_default(),
            Err(_) => HashMap::new(),
        };

        // Nested keys like "api.url" land in a section
        match key.split_once('.') {
            Some((section, subkey)) => {
                let section_map = config
                    .entry(section.to_string())
                    .or_insert_with(|| toml::Value::Table(toml::value::Table::new()))
                    .as_table_mut()
                    .context("Invalid config structure")?;

                section_map.insert(subkey.to_string(), toml::Value::String(value.to_string()));
            }
            None => {
                config.insert(key.to_string(), toml::Value::String(value.to_string()));
            }
        }

        let content = toml::to_string_pretty(&config).context("Failed to serialize config")?;
        fs::write(&config_file, content).context("Failed to write config file")?;

        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(read_table(&self.config_file())?.and_then(|config| lookup(&config, key)))
    }
}

fn resolve_token(
    env_token: Option<String>,
    stored: impl FnOnce() -> Result<Option<String>>,
) -> Option<(String, TokenSource)> {
    if let Some(token) = env_token.filter(|t| !t.trim().is_empty()) {
        return Some((token, TokenSource::Environment));
    }
    match stored() {
        Ok(token) => token.map(|token| (token, TokenSource::Keyring)),
        Err(err) => {
            tracing::warn!("Keyring unavailable, continuing without a token: {err:#}");
            None
        }
    }
}

fn read_table(path: &Path) -> Result<Option<Table>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).context("Failed to read config file")?;
    let config = toml::from_str(&content).context("Failed to parse config file")?;
    Ok(Some(config))
}

fn lookup(config: &Table, key: &str) -> Option<String> {
    let value = match key.split_once('.') {
        Some((section, subkey)) => config.get(section)?.as_table()?.get(subkey)?,
        None => config.get(key)?,
    };
    value.as_str().map(|s| s.to_string())
}

/// Show only the ends of a secret.
pub fn mask(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
