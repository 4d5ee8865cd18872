use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub api_key: Option<String>,
    pub default_model: Option<String>,
    pub max_tokens: Option<u32>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the config file, writing a default one on first run so the
    /// user has something to edit.
    pub fn load_or_init() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            let config = Self::new();
            config.save_to(&path)?;
            return Ok(config);
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    pub fn log_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("charla.log"))
    }

    fn config_dir() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("charla"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            api_key: Some("sk-test".to_string()),
            default_model: Some("claude-3-5-haiku-20241022".to_string()),
            max_tokens: Some(2048),
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_key.as_deref(), Some("sk-test"));
        assert_eq!(
            loaded.default_model.as_deref(),
            Some("claude-3-5-haiku-20241022")
        );
        assert_eq!(loaded.max_tokens, Some(2048));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.json")).unwrap();
        assert!(config.api_key.is_none());
        assert!(config.default_model.is_none());
        assert!(config.max_tokens.is_none());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
