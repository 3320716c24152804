use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::prompts::SITE_URL;

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Generic fallback variable for the key.
const FALLBACK_API_KEY_ENV: &str = "API_KEY";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Gemini model identifier
    pub model: String,

    /// API root, without the `/models/...` suffix
    pub base_url: String,

    /// Key stored directly in the config file (takes precedence)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable holding the key
    pub api_key_env: String,

    /// Site every answer must be grounded on
    pub site_url: String,

    /// UI preferences
    pub ui: UiConfig,
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub show_timestamps: bool,
    pub tick_rate_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            show_timestamps: true,
            tick_rate_ms: 100,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            site_url: SITE_URL.to_string(),
            ui: UiConfig::default(),
        }
    }
}

impl Config {
    /// `~/.dokdo-chat`, where the config file and the log live.
    pub fn home_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".dokdo-chat"))
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::home_dir()?.join("config.toml"))
    }

    /// Load configuration from `path`, or the default location when `None`.
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()?,
        };

        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Save configuration to `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Get API key from config or environment
    pub fn get_api_key(&self) -> Option<String> {
        self.resolve_api_key(|name| std::env::var(name).ok())
    }

    /// Key lookup order: config file, `api_key_env`, then `API_KEY`.
    /// Blank values are treated as unset.
    pub fn resolve_api_key<F>(&self, lookup: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        present(self.api_key.clone())
            .or_else(|| present(lookup(&self.api_key_env)))
            .or_else(|| present(lookup(FALLBACK_API_KEY_ENV)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_point_at_gemini() {
        let config = Config::default();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.site_url, SITE_URL);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = Config::from_toml("model = \"gemini-2.5-flash\"\n[ui]\ntick_rate_ms = 250\n").unwrap();
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.ui.tick_rate_ms, 250);
        assert!(config.ui.show_timestamps);
    }

    #[test]
    fn load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.api_key_env = "DOKDO_KEY".into();
        config.ui.show_timestamps = false;
        config.save(&path).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.api_key_env, "DOKDO_KEY");
        assert!(!loaded.ui.show_timestamps);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "model = [").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn api_key_resolution_order() {
        let env: HashMap<&str, &str> = [("GEMINI_API_KEY", "from-env"), ("API_KEY", "fallback")].into();
        let lookup = |name: &str| env.get(name).map(|v| v.to_string());

        let mut config = Config::default();
        assert_eq!(config.resolve_api_key(lookup).as_deref(), Some("from-env"));

        config.api_key = Some("from-file".into());
        assert_eq!(config.resolve_api_key(lookup).as_deref(), Some("from-file"));

        config.api_key = Some("  ".into());
        config.api_key_env = "UNSET".into();
        assert_eq!(config.resolve_api_key(lookup).as_deref(), Some("fallback"));

        assert_eq!(config.resolve_api_key(|_| None), None);
    }
}
