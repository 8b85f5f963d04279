use crate::i18n::Locale;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub detect_path: String,
    pub categories_path: String,
    pub ask_path: String,
    pub shopping_path: String,
    pub autocomplete_path: String,
    /// Transport-level cap applied by the HTTP client.
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            detect_path: "/detect_category".to_string(),
            categories_path: "/categories".to_string(),
            ask_path: "/ask".to_string(),
            shopping_path: "/api/shopping".to_string(),
            autocomplete_path: "/api/autocomplete".to_string(),
            request_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub language: Locale,
    pub country: String,
    /// Budget for one step request before the session is failed.
    pub step_timeout_secs: u64,
    /// Delay between accepting an answer and sending the next step.
    pub pacing_ms: u64,
    pub remote_suggestions: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            language: Locale::Tr,
            country: "TR".to_string(),
            step_timeout_secs: 45,
            pacing_ms: 50,
            remote_suggestions: false,
        }
    }
}

impl UiConfig {
    pub fn step_timeout(&self) -> Duration {
        Duration::from_secs(self.step_timeout_secs)
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".swipestyle")
    }

    pub fn get_config_path() -> PathBuf {
        Self::data_dir().join("config.yaml")
    }

    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::get_config_path();

        if config_path.exists() {
            match Self::load_from_file(&config_path) {
                Ok(config) => return Ok(config),
                Err(e) => tracing::warn!("ignoring unreadable config {}: {}", config_path.display(), e),
            }
        }

        Ok(Self::default())
    }

    pub fn save(&self) -> Result<()> {
        self.save_to_file(Self::get_config_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn round_trips_through_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = Config::default();
        config.api.base_url = "https://swipestyle.example".to_string();
        config.ui.language = Locale::En;
        config.save_to_file(&path).unwrap();

        assert_eq!(Config::load_from_file(&path).unwrap(), config);
    }

    #[test]
    fn partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "ui:\n  language: en\n  pacing_ms: 0\n").unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.ui.language, Locale::En);
        assert_eq!(config.ui.pacing(), Duration::ZERO);
        assert_eq!(config.ui.step_timeout(), Duration::from_secs(45));
        assert_eq!(config.api, ApiConfig::default());
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "ui: [unterminated").unwrap();
        assert!(Config::load_from_file(&path).is_err());
    }
}
