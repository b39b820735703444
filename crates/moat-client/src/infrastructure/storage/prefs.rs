//! File-backed bridge preference store.
//!
//! The surrounding application reads its bridge configuration from this
//! store: the configured bridge lines and whether bridge mode is enabled.
//! The session writes through the [`BridgePrefs`] seam; this adapter keeps
//! the state in a small TOML file, written on every update so the daemon's
//! configuration reload always sees the latest values.

use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::session::{BridgePrefs, PrefsError};

/// On-disk shape of the preference file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
struct StoredPrefs {
    /// Newline-joined bridge lines, or a source literal such as `"moat"`.
    #[serde(default)]
    bridge_lines: String,
    /// Whether bridge-transport usage is enabled.
    #[serde(default)]
    bridges_enabled: bool,
}

/// TOML-file implementation of [`BridgePrefs`].
pub struct TomlBridgePrefs {
    path: PathBuf,
    state: Mutex<StoredPrefs>,
}

impl TomlBridgePrefs {
    /// Opens the store at `path`, loading existing values when present.
    ///
    /// # Errors
    ///
    /// Returns [`PrefsError`] when an existing file cannot be read or
    /// parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PrefsError> {
        let path = path.into();
        let state = if path.exists() {
            let text =
                std::fs::read_to_string(&path).map_err(|e| PrefsError(e.to_string()))?;
            toml::from_str(&text).map_err(|e| PrefsError(e.to_string()))?
        } else {
            StoredPrefs::default()
        };
        Ok(Self { path, state: Mutex::new(state) })
    }

    /// The currently stored bridge lines.
    pub fn bridge_lines(&self) -> String {
        self.state
            .lock()
            .map(|state| state.bridge_lines.clone())
            .unwrap_or_default()
    }

    /// Whether bridge mode is currently enabled.
    pub fn bridges_enabled(&self) -> bool {
        self.state
            .lock()
            .map(|state| state.bridges_enabled)
            .unwrap_or(false)
    }

    fn persist(&self, state: &StoredPrefs) -> Result<(), PrefsError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| PrefsError(e.to_string()))?;
            }
        }
        let text = toml::to_string_pretty(state).map_err(|e| PrefsError(e.to_string()))?;
        std::fs::write(&self.path, text).map_err(|e| PrefsError(e.to_string()))?;
        debug!(path = %self.path.display(), "bridge preferences written");
        Ok(())
    }
}

impl BridgePrefs for TomlBridgePrefs {
    fn set_bridge_lines(&self, lines: &str) -> Result<(), PrefsError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| PrefsError("preference state poisoned".to_string()))?;
        state.bridge_lines = lines.to_string();
        self.persist(&state)
    }

    fn set_bridges_enabled(&self, enabled: bool) -> Result<(), PrefsError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| PrefsError("preference state poisoned".to_string()))?;
        state.bridges_enabled = enabled;
        self.persist(&state)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
