use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

use crate::openai::DEFAULT_API_BASE;
use crate::state::DEFAULT_MAX_HISTORY;

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 512;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub max_history: Option<usize>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| anyhow!("Invalid config {}: {}", path.display(), e))?;
        Ok(config)
    }

    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("quotechat"))
    }

    pub fn get_config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Environment key first, then the file. Blank values count as missing.
    pub fn resolve_api_key(&self, env_key: Option<String>) -> Option<String> {
        let non_blank = |k: String| {
            let k = k.trim().to_string();
            (!k.is_empty()).then_some(k)
        };
        env_key
            .and_then(non_blank)
            .or_else(|| self.api_key.clone().and_then(non_blank))
    }

    pub fn api_key_from_env(&self) -> Option<String> {
        self.resolve_api_key(std::env::var(API_KEY_ENV).ok())
    }

    pub fn api_base(&self) -> &str {
        self.api_base.as_deref().unwrap_or(DEFAULT_API_BASE)
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn temperature(&self) -> f32 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }

    pub fn max_history(&self) -> usize {
        self.max_history.unwrap_or(DEFAULT_MAX_HISTORY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert_eq!(config.api_base(), "https://api.openai.com/v1");
        assert_eq!(config.model(), "gpt-3.5-turbo");
        assert_eq!(config.temperature(), 0.7);
        assert_eq!(config.max_tokens(), 512);
        assert_eq!(config.max_history(), 10);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, Config::new());
    }

    #[test]
    fn test_load_file_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"model": "gpt-4o-mini", "max_history": 4}"#).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.model(), "gpt-4o-mini");
        assert_eq!(loaded.max_history(), 4);
        assert_eq!(loaded.max_tokens(), 512);
    }

    #[test]
    fn test_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"temperature": 0.2}"#).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.temperature(), 0.2);
        assert_eq!(loaded.model(), DEFAULT_MODEL);
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_api_key_resolution() {
        let config = Config {
            api_key: Some("file-key".to_string()),
            ..Config::new()
        };
        assert_eq!(config.resolve_api_key(Some("env-key".into())).as_deref(), Some("env-key"));
        assert_eq!(config.resolve_api_key(None).as_deref(), Some("file-key"));
        assert_eq!(config.resolve_api_key(Some("   ".into())).as_deref(), Some("file-key"));
        assert_eq!(Config::new().resolve_api_key(Some("   ".into())), None);
        assert_eq!(Config::new().resolve_api_key(None), None);
    }
}
