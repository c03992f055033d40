//! Configuration file loading for the analysis server.
//!
//! Settings come from an optional TOML file; command line flags applied in
//! `main` take precedence over it.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur when loading or parsing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse the configuration file as valid TOML.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Engine process settings.
#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    /// Path to the engine executable, or a bare name looked up on `PATH`.
    /// Defaults to "stockfish".
    #[serde(default = "default_engine_path")]
    pub path: PathBuf,
    /// Extra command line arguments for the engine.
    #[serde(default)]
    pub args: Vec<String>,
    /// Number of independent engine processes. Defaults to 1.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    /// UCI options sent with `setoption` after the handshake,
    /// e.g. `Threads = "2"` or `Hash = "128"`.
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

fn default_engine_path() -> PathBuf {
    PathBuf::from("stockfish")
}

fn default_pool_size() -> usize {
    1
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path: default_engine_path(),
            args: Vec::new(),
            pool_size: default_pool_size(),
            options: BTreeMap::new(),
        }
    }
}

/// Main server configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Interface to bind. Defaults to 127.0.0.1.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind. Defaults to 5000.
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub engine: EngineConfig,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            engine: EngineConfig::default(),
        }
    }
}

impl ServerConfig {
    /// File looked for in the working directory when no path is given.
    pub const DEFAULT_FILE: &'static str = "chessmaxer.toml";

    /// Loads the configuration.
    ///
    /// An explicit `path` must exist. Without one, [`Self::DEFAULT_FILE`] is
    /// used if present, and built-in defaults otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadError`] if the file cannot be read,
    /// or [`ConfigError::ParseError`] if it contains invalid TOML.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => {
                let default = Path::new(Self::DEFAULT_FILE);
                if default.exists() {
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        tracing::info!("Loaded config from {}", path.display());
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}
