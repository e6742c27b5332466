use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use anyhow::{Result, anyhow};

const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    pub base_url: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self { base_url: None }
    }

    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(&config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    /// Resolve the generate service base URL: env var first, then the config
    /// file, then the localhost default. Trailing slashes are stripped so
    /// request paths can be appended directly.
    pub fn resolve_base_url(&self) -> String {
        let url = std::env::var("BANTER_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        url.trim_end_matches('/').to_string()
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("banter").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_resolution_order() {
        // Single test so the env var manipulation cannot race another test.
        std::env::remove_var("BANTER_BASE_URL");

        let config = Config::new();
        assert_eq!(config.resolve_base_url(), DEFAULT_BASE_URL);

        let config = Config {
            base_url: Some("http://example.com:9000/".to_string()),
        };
        assert_eq!(config.resolve_base_url(), "http://example.com:9000");

        std::env::set_var("BANTER_BASE_URL", "http://override:1234");
        assert_eq!(config.resolve_base_url(), "http://override:1234");
        std::env::remove_var("BANTER_BASE_URL");
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = Config {
            base_url: Some("http://example.com".to_string()),
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.base_url.as_deref(), Some("http://example.com"));
    }
}
