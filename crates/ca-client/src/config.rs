// ABOUTME: Per-user configuration for ca-client (CA server URL and default CA name)
// ABOUTME: Loads ~/.ca-client/config.json and falls back to an interactive first-run prompt

use colored::Colorize;
use dialoguer::Input;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Environment variable that overrides the configuration file location.
pub const CONFIG_ENV: &str = "CA_CLIENT_CONFIG";

/// Resolved client configuration. Built once and handed to each component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// CA server base URL, always with a scheme (e.g., "https://ca.example.com")
    #[serde(rename = "BASE_URL")]
    pub base_url: String,

    /// CA used when no `--sign` argument is given
    #[serde(rename = "DEFAULT_CA")]
    pub default_ca: String,
}

impl Config {
    pub fn new(base_url: &str, default_ca: &str) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            default_ca: default_ca.trim().to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine home directory")]
    NoHomeDirectory,

    #[error("no configuration found at {path}")]
    NotFound { path: PathBuf },

    #[error("Configuration file {path} is corrupted")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Missing required configuration in {path}")]
    Incomplete {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create directory {path}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize configuration")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to read configuration from terminal")]
    Prompt(#[source] dialoguer::Error),
}

impl ConfigError {
    /// Errors that a fresh prompt can recover from.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ConfigError::NotFound { .. }
                | ConfigError::Corrupt { .. }
                | ConfigError::Incomplete { .. }
        )
    }
}

/// Location of the configuration file and the operations on it.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the default config path (~/.ca-client/config.json)
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDirectory)?;
        Ok(home.join(".ca-client").join("config.json"))
    }

    /// Store at `path` if given, otherwise at the default location.
    pub fn resolve(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Ok(Self::new(path)),
            None => Ok(Self::new(Self::default_path()?)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads existing configuration
    pub fn load(&self) -> Result<Config, ConfigError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::NotFound {
                    path: self.path.clone(),
                })
            }
            Err(e) => {
                return Err(ConfigError::Read {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };

        let value: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| ConfigError::Corrupt {
                path: self.path.clone(),
                source: e,
            })?;

        let config: Config =
            serde_json::from_value(value).map_err(|e| ConfigError::Incomplete {
                path: self.path.clone(),
                source: e,
            })?;

        debug!(path = %self.path.display(), "configuration loaded");
        Ok(Config {
            base_url: with_scheme(&config.base_url),
            ..config
        })
    }

    /// Saves the configuration to disk, creating parent directories first
    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| ConfigError::CreateDirectory {
                path: dir.to_path_buf(),
                source: e,
            })?;
        }

        let content = serde_json::to_string_pretty(config).map_err(ConfigError::Serialize)?;
        fs::write(&self.path, content).map_err(|e| ConfigError::Write {
            path: self.path.clone(),
            source: e,
        })?;

        debug!(path = %self.path.display(), "configuration saved");
        Ok(())
    }

    /// Asks for the CA server and default CA, then persists the answers
    pub fn prompt_and_save(&self) -> Result<Config, ConfigError> {
        let base_url: String = Input::new()
            .with_prompt("Enter FQDN of CA Server")
            .interact_text()
            .map_err(ConfigError::Prompt)?;

        let default_ca: String = Input::new()
            .with_prompt("Enter name of default CA")
            .interact_text()
            .map_err(ConfigError::Prompt)?;

        let config = Config::new(&base_url, &default_ca);
        self.save(&config)?;
        Ok(config)
    }

    /// Loads the configuration, prompting for a new one when it is missing or unusable
    pub fn load_or_prompt(&self) -> Result<Config, ConfigError> {
        match self.load() {
            Ok(config) => Ok(config),
            Err(e) if e.is_recoverable() => {
                if !matches!(e, ConfigError::NotFound { .. }) {
                    println!("{} {}", "!".yellow().bold(), e);
                }
                println!(
                    "Failed to load configuration from {}",
                    self.path.display()
                );
                self.prompt_and_save()
            }
            Err(e) => Err(e),
        }
    }
}

/// Adds `https://` unless the input already names a scheme.
///
/// Plain HTTP is only meant for testing and has to be typed explicitly.
pub fn normalize_base_url(input: &str) -> String {
    with_scheme(input.trim().trim_end_matches('/'))
}

fn with_scheme(url: &str) -> String {
    if url.contains("//") {
        return url.to_string();
    }

    format!("https://{}", url)
}
