use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::musixmatch::{LyricsKind, MusixmatchClient};
use crate::error::{ConfigError, Result};

pub mod validation;

fn default_base_url() -> String {
    "https://apic-desktop.musixmatch.com/ws/1.1".to_string()
}

fn default_pause_seconds() -> u64 {
    30
}

fn default_lyrics_type() -> LyricsKind {
    LyricsKind::Synced
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Musixmatch user token; minted on demand when absent
    #[serde(default)]
    pub token: Option<String>,

    /// Musixmatch desktop API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Pause between batch requests, in seconds
    #[serde(default = "default_pause_seconds")]
    pub pause_seconds: u64,

    /// Preferred lyrics variant
    #[serde(default = "default_lyrics_type")]
    pub lyrics_type: LyricsKind,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: None,
            base_url: default_base_url(),
            pause_seconds: default_pause_seconds(),
            lyrics_type: default_lyrics_type(),
        }
    }
}

impl Config {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Try to load .env file if it exists (for development)
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        let config_file = if let Some(path) = config_path {
            PathBuf::from(path)
        } else {
            Self::default_config_path()?
        };

        if config_file.exists() {
            let content = fs::read_to_string(&config_file)?;
            config = toml::from_str(&content)?;
        }

        // Environment variables take priority over the file
        config.load_from_env()?;

        validation::ConfigValidator::validate_url(&config.base_url, "base_url")?;

        // Save config file if it doesn't exist
        if !config_file.exists() {
            if let Some(parent) = config_file.parent() {
                fs::create_dir_all(parent)?;
            }
            config.save(&config_file)?;
        }

        Ok(config)
    }

    fn load_from_env(&mut self) -> Result<()> {
        if let Ok(token) = env::var("MXLRC_TOKEN") {
            let trimmed = token.trim().to_string();
            self.token = (!trimmed.is_empty()).then_some(trimmed);
        }

        if let Ok(base_url) = env::var("MXLRC_BASE_URL") {
            self.base_url = base_url;
        }

        if let Ok(pause) = env::var("MXLRC_PAUSE_SECONDS") {
            self.pause_seconds =
                pause
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidValue {
                        field: "MXLRC_PAUSE_SECONDS".to_string(),
                        value: pause.clone(),
                    })?;
        }

        if let Ok(lyrics_type) = env::var("MXLRC_LYRICS_TYPE") {
            self.lyrics_type = match lyrics_type.trim().to_lowercase().as_str() {
                "synced" => LyricsKind::Synced,
                "unsynced" => LyricsKind::Unsynced,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "MXLRC_LYRICS_TYPE".to_string(),
                        value: lyrics_type,
                    }
                    .into())
                }
            };
        }

        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| anyhow::anyhow!("serialize config: {}", e))?;
        fs::write(path, content)?;
        Ok(())
    }

    fn default_config_path() -> Result<PathBuf> {
        let project_dirs =
            ProjectDirs::from("io", "mxlrc", "mxlrc-cli").ok_or(ConfigError::ProjectDirs)?;

        Ok(project_dirs.config_dir().join("config.toml"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Self::default_config_path()
    }

    pub fn create_client(&self) -> MusixmatchClient {
        MusixmatchClient::new(&self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.token.is_none());
        assert_eq!(config.base_url, "https://apic-desktop.musixmatch.com/ws/1.1");
        assert_eq!(config.pause_seconds, 30);
        assert_eq!(config.lyrics_type, LyricsKind::Synced);
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let config: Config = toml::from_str(r#"token = "abc""#).unwrap();
        assert_eq!(config.token.as_deref(), Some("abc"));
        assert_eq!(config.pause_seconds, 30);
        assert_eq!(config.lyrics_type, LyricsKind::Synced);
    }

    #[test]
    fn test_lyrics_type_round_trips_through_toml() {
        let config = Config {
            lyrics_type: LyricsKind::Unsynced,
            ..Config::default()
        };
        let serialized = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.lyrics_type, LyricsKind::Unsynced);
    }
}
