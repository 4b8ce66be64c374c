//! Client settings
//!
//! Read from `<config dir>/promptdesk/config.toml` (or the file named by
//! `PROMPTDESK_CONFIG`), then overridden by environment variables. A missing
//! file means defaults.

use crate::error::AppError;
use crate::filter::{TagMatch, DEFAULT_PAGE_SIZE};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_toast_duration_ms() -> u64 {
    3000
}

fn default_request_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub tag_match: TagMatch,
    #[serde(default = "default_toast_duration_ms")]
    pub toast_duration_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            page_size: default_page_size(),
            tag_match: TagMatch::default(),
            toast_duration_ms: default_toast_duration_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Settings {
    /// Settings file location, honouring `PROMPTDESK_CONFIG`
    pub fn config_path() -> Option<PathBuf> {
        if let Ok(path) = env::var("PROMPTDESK_CONFIG") {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join("promptdesk").join("config.toml"))
    }

    /// Defaults, then the config file, then environment overrides
    pub fn load() -> Result<Self> {
        let mut settings = match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        settings.apply_env()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let settings: Settings = toml::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        debug!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = env::var("PROMPTDESK_API_URL") {
            self.api_url = url;
        }
        if let Ok(size) = env::var("PROMPTDESK_PAGE_SIZE") {
            self.page_size = size
                .trim()
                .parse()
                .with_context(|| format!("PROMPTDESK_PAGE_SIZE is not a number: '{}'", size))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.page_size == 0 {
            return Err(AppError::Config("page_size must be at least 1".to_string()));
        }
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "api_url must start with http:// or https:// (got '{}')",
                self.api_url
            )));
        }
        Ok(())
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_duration_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Env vars are process-global
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "api_url = \"https://prompts.example.com\"\ntag_match = \"id-only\"\n").unwrap();

        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.api_url, "https://prompts.example.com");
        assert_eq!(settings.tag_match, TagMatch::IdOnly);
        assert_eq!(settings.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(settings.toast_duration(), Duration::from_millis(3000));
    }

    #[test]
    fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");
        let settings = Settings {
            page_size: 5,
            ..Settings::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(Settings::from_file(&path).unwrap(), settings);
    }

    #[test]
    fn test_env_overrides_file() {
        let _guard = ENV_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "page_size = 50\n").unwrap();

        env::set_var("PROMPTDESK_CONFIG", &path);
        env::set_var("PROMPTDESK_PAGE_SIZE", "5");
        env::set_var("PROMPTDESK_API_URL", "https://override.example.com");
        let settings = Settings::load();
        env::remove_var("PROMPTDESK_CONFIG");
        env::remove_var("PROMPTDESK_PAGE_SIZE");
        env::remove_var("PROMPTDESK_API_URL");

        let settings = settings.unwrap();
        assert_eq!(settings.page_size, 5);
        assert_eq!(settings.api_url, "https://override.example.com");
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let settings = Settings {
            page_size: 0,
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_api_url_must_be_http() {
        let settings = Settings {
            api_url: "ftp://nope".to_string(),
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }
}
