//! TOML-based configuration for the MOAT client.
//!
//! Reads and writes [`MoatConfig`] at the platform-appropriate location:
//! - Windows:  `%APPDATA%\Moat\config.toml`
//! - Linux:    `~/.config/moat/config.toml` (or `$XDG_CONFIG_HOME/moat`)
//!
//! Every field carries a serde default so the client works on first run,
//! before any config file exists, and keeps working when an older file is
//! missing newer fields.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use moat_core::protocol::messages::DEFAULT_BASE_URL;
use moat_core::{DEFAULT_SOCKS_HOST, DEFAULT_SOCKS_PORT};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level client configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MoatConfig {
    #[serde(default)]
    pub moat: MoatSection,
    #[serde(default)]
    pub proxy: ProxySection,
    #[serde(default)]
    pub storage: StorageSection,
}

/// Settings for the distribution server exchange.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MoatSection {
    /// Base URL of the bridge distribution server.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// The local SOCKS listener all MOAT traffic is routed through.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProxySection {
    /// Proxy host, usually loopback.
    #[serde(default = "default_proxy_host")]
    pub host: String,
    /// Proxy port.
    #[serde(default = "default_proxy_port")]
    pub port: u16,
}

/// Paths of files the client persists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageSection {
    /// Location of the bridge preference store.
    #[serde(default = "default_prefs_path")]
    pub prefs_path: PathBuf,
}

impl Default for MoatSection {
    fn default() -> Self {
        Self { base_url: default_base_url(), log_level: default_log_level() }
    }
}

impl Default for ProxySection {
    fn default() -> Self {
        Self { host: default_proxy_host(), port: default_proxy_port() }
    }
}

impl Default for StorageSection {
    fn default() -> Self {
        Self { prefs_path: default_prefs_path() }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_proxy_host() -> String {
    DEFAULT_SOCKS_HOST.to_string()
}

fn default_proxy_port() -> u16 {
    DEFAULT_SOCKS_PORT
}

fn default_prefs_path() -> PathBuf {
    config_dir()
        .map(|dir| dir.join("prefs.toml"))
        .unwrap_or_else(|_| PathBuf::from("moat-prefs.toml"))
}

// ── Paths ─────────────────────────────────────────────────────────────────────

/// The platform config directory for this application.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when neither the platform
/// variable nor a home directory is available.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA")
            .map(|appdata| PathBuf::from(appdata).join("Moat"))
            .ok_or(ConfigError::NoPlatformConfigDir)
    }
    #[cfg(not(target_os = "windows"))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return Ok(PathBuf::from(xdg).join("moat"));
        }
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".config").join("moat"))
            .ok_or(ConfigError::NoPlatformConfigDir)
    }
}

// ── Load / save ───────────────────────────────────────────────────────────────

impl MoatConfig {
    /// The default config file location for this platform.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        Ok(config_dir()?.join("config.toml"))
    }

    /// Loads the config from `path`, falling back to defaults when the
    /// file does not exist yet.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&text)?)
    }

    /// Writes the config to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let text = toml::to_string_pretty(self)?;
        std::fs::write(path, text).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_has_documented_values() {
        // Arrange / Act
        let config = MoatConfig::default();

        // Assert
        assert_eq!(config.moat.base_url, "https://bridges.torproject.org/moat");
        assert_eq!(config.moat.log_level, "info");
        assert_eq!(config.proxy.host, "127.0.0.1");
        assert_eq!(config.proxy.port, 9050);
    }

    #[test]
    fn test_empty_toml_parses_to_defaults() {
        let config: MoatConfig = toml::from_str("").unwrap();
        assert_eq!(config, MoatConfig::default());
    }

    #[test]
    fn test_partial_toml_keeps_defaults_for_missing_fields() {
        // Arrange: only the proxy port is overridden
        let text = "[proxy]\nport = 9150\n";

        // Act
        let config: MoatConfig = toml::from_str(text).unwrap();

        // Assert
        assert_eq!(config.proxy.port, 9150);
        assert_eq!(config.proxy.host, "127.0.0.1");
        assert_eq!(config.moat.base_url, "https://bridges.torproject.org/moat");
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.toml");

        let config = MoatConfig::load(&path).unwrap();

        assert_eq!(config, MoatConfig::default());
    }

    #[test]
    fn test_save_then_load_round_trips() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = MoatConfig::default();
        config.proxy.port = 9150;
        config.moat.log_level = "debug".to_string();

        // Act
        config.save(&path).unwrap();
        let loaded = MoatConfig::load(&path).unwrap();

        // Assert
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_rejects_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is not toml [[").unwrap();

        assert!(matches!(MoatConfig::load(&path), Err(ConfigError::Parse(_))));
    }
}
