//! Configuration for the terminal emulator
//!
//! Stored as JSON at `~/.config/tinyterm/config.json`. Missing fields take
//! their defaults, so a partial file is valid.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::DEFAULT_TAB_WIDTH;
use crate::input::BackspaceMode;

/// Terminal configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Initial width in columns
    pub columns: u16,
    /// Initial height in rows
    pub rows: u16,
    /// Program to run; `$SHELL` (or /bin/sh) when unset
    pub shell: Option<String>,
    /// Arguments passed to the shell
    pub shell_args: Vec<String>,
    /// Byte sent by the Backspace key
    pub backspace: BackspaceMode,
    /// Redraw rate of the interactive binary, in frames per second
    pub frame_rate: u32,
    /// Distance between default tab stops
    pub tab_width: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            columns: 80,
            rows: 24,
            shell: None,
            shell_args: Vec::new(),
            backspace: BackspaceMode::Delete,
            frame_rate: 60,
            tab_width: DEFAULT_TAB_WIDTH,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from default location or return default config
    pub fn load_or_default() -> Self {
        let Some(config_path) = default_config_path() else {
            return Self::default();
        };
        if !config_path.exists() {
            return Self::default();
        }
        match Self::load(&config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring {}: {}", config_path.display(), e);
                Self::default()
            }
        }
    }

    /// The shell to launch
    pub fn shell_program(&self) -> String {
        self.shell
            .clone()
            .or_else(|| std::env::var("SHELL").ok())
            .unwrap_or_else(|| "/bin/sh".to_string())
    }

    /// Time between redraws
    pub fn frame_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(1) / self.frame_rate.max(1)
    }
}

/// `~/.config/tinyterm/config.json`
pub fn default_config_path() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join("tinyterm")
            .join("config.json")
    })
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.columns, 80);
        assert_eq!(config.rows, 24);
        assert_eq!(config.frame_rate, 60);
        assert_eq!(config.tab_width, 8);
        assert_eq!(config.backspace, BackspaceMode::Delete);
    }

    #[test]
    fn test_config_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = Config {
            columns: 132,
            shell: Some("/bin/zsh".to_string()),
            shell_args: vec!["-l".to_string()],
            backspace: BackspaceMode::ControlH,
            ..Default::default()
        };
        config.save(&path).unwrap();

        let restored = Config::load(&path).unwrap();
        assert_eq!(config, restored);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"rows": 40, "backspace": "control_h"}"#).unwrap();
        assert_eq!(config.rows, 40);
        assert_eq!(config.columns, 80);
        assert_eq!(config.backspace, BackspaceMode::ControlH);
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(Config::load(&path), Err(ConfigError::Json(_))));
        assert!(matches!(
            Config::load(&dir.path().join("missing.json")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_frame_interval() {
        let config = Config {
            frame_rate: 0,
            ..Default::default()
        };
        assert_eq!(config.frame_interval(), std::time::Duration::from_secs(1));
        assert_eq!(
            Config::default().frame_interval(),
            std::time::Duration::from_secs(1) / 60
        );
    }
}
