use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_GENERATIVE_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash-latest:generateContent";

/// On-disk settings. Env vars take precedence at startup; the file never
/// has to exist.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub api_base_url: Option<String>,
    pub generative_endpoint: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            api_key: None,
            api_base_url: None,
            generative_endpoint: None,
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    #[allow(dead_code)]
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("twinkletalk").join("config.json"))
    }

    /// Resolve the effective settings: env vars first, then the file,
    /// then defaults.
    pub fn resolve(&self) -> ResolvedConfig {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    fn resolve_with(&self, env: impl Fn(&str) -> Option<String>) -> ResolvedConfig {
        ResolvedConfig {
            api_key: env("TWINKLETALK_API_KEY").or_else(|| self.api_key.clone()),
            api_base_url: env("TWINKLETALK_API_URL")
                .or_else(|| self.api_base_url.clone())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            generative_endpoint: env("TWINKLETALK_GENERATIVE_ENDPOINT")
                .or_else(|| self.generative_endpoint.clone())
                .unwrap_or_else(|| DEFAULT_GENERATIVE_ENDPOINT.to_string()),
        }
    }
}

/// Effective settings after env/file/default resolution.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub api_key: Option<String>,
    pub api_base_url: String,
    pub generative_endpoint: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_empty_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();

        assert_eq!(config.api_key, None);
        assert_eq!(config.api_base_url, None);
        assert_eq!(config.generative_endpoint, None);
    }

    #[test]
    fn save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = Config {
            api_key: Some("key-123".to_string()),
            api_base_url: Some("http://chat.example.com".to_string()),
            generative_endpoint: None,
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_key, Some("key-123".to_string()));
        assert_eq!(loaded.api_base_url, Some("http://chat.example.com".to_string()));
        assert_eq!(loaded.generative_endpoint, None);
    }

    #[test]
    fn env_overrides_file_values() {
        let config = Config {
            api_key: Some("file-key".to_string()),
            api_base_url: Some("http://file.example.com".to_string()),
            generative_endpoint: Some("http://file.example.com/generate".to_string()),
        };

        let resolved = config.resolve_with(|key| match key {
            "TWINKLETALK_API_KEY" => Some("env-key".to_string()),
            "TWINKLETALK_API_URL" => Some("http://env.example.com".to_string()),
            _ => None,
        });

        assert_eq!(resolved.api_key, Some("env-key".to_string()));
        assert_eq!(resolved.api_base_url, "http://env.example.com");
        // No env var set, so the file value holds.
        assert_eq!(resolved.generative_endpoint, "http://file.example.com/generate");
    }

    #[test]
    fn defaults_apply_when_env_and_file_are_empty() {
        let resolved = Config::new().resolve_with(|_| None);

        assert_eq!(resolved.api_key, None);
        assert_eq!(resolved.api_base_url, DEFAULT_API_URL);
        assert_eq!(resolved.generative_endpoint, DEFAULT_GENERATIVE_ENDPOINT);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();

        assert!(Config::load_from(&path).is_err());
    }
}
