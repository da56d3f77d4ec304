//! Configuration management for playview
//!
//! This module handles loading and managing configuration from config files
//! and environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::player::PlayerConfig;
use crate::utils::error::{IntoPlayerError, PlayerError, Result};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Playback behaviour
    pub player: PlayerConfig,

    /// General settings
    pub general: GeneralConfig,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Source catalog used by the demo binary
    pub catalog: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            catalog: None,
        }
    }
}

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Load configuration from various sources
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. Default values
    /// 2. System config file (/etc/playview/config.toml on Linux)
    /// 3. User config file (~/.config/playview/config.toml on Linux)
    /// 4. Environment variables (PLAYVIEW_* prefix)
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Some(system_path) = Self::system_config_path() {
            if system_path.exists() {
                config = Self::read_file(&system_path)?;
            }
        }

        if let Some(user_path) = Self::user_config_path() {
            if user_path.exists() {
                config = Self::read_file(&user_path)?;
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Load a single config file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut config = Self::read_file(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the user config file
    pub fn save(&self) -> Result<()> {
        let path = Self::user_config_path()
            .ok_or_else(|| PlayerError::Config("Cannot determine user config path".to_string()))?;
        self.save_to(&path)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).config_err("Failed to create config directory")?;
        }

        let toml = toml::to_string_pretty(self).config_err("Failed to serialize config")?;
        std::fs::write(path, toml).config_err("Failed to write config file")?;

        Ok(())
    }

    fn read_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        // Missing keys fall back to defaults via #[serde(default)]
        toml::from_str(&contents).config_err("Failed to parse config file")
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(volume) = std::env::var("PLAYVIEW_VOLUME") {
            self.player.volume = volume.parse()
                .map_err(|_| PlayerError::Config("Invalid PLAYVIEW_VOLUME".to_string()))?;
        }

        if let Ok(looping) = std::env::var("PLAYVIEW_LOOP") {
            self.player.should_loop = parse_flag(&looping)
                .ok_or_else(|| PlayerError::Config("Invalid PLAYVIEW_LOOP".to_string()))?;
        }

        if let Ok(autoplay) = std::env::var("PLAYVIEW_AUTOPLAY") {
            self.player.start_playing_when_ready = parse_flag(&autoplay)
                .ok_or_else(|| PlayerError::Config("Invalid PLAYVIEW_AUTOPLAY".to_string()))?;
        }

        if let Ok(log_level) = std::env::var("PLAYVIEW_LOG_LEVEL") {
            self.general.log_level = log_level;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.player.volume) {
            return Err(PlayerError::Config("Volume must be between 0.0 and 1.0".to_string()));
        }

        if !(self.player.jump_delta > 0.0 && self.player.jump_delta <= 1.0) {
            return Err(PlayerError::Config("Jump delta must be in (0.0, 1.0]".to_string()));
        }

        if self.player.tick_interval_ms == 0 {
            return Err(PlayerError::Config("Tick interval must be non-zero".to_string()));
        }

        if !VALID_LOG_LEVELS.contains(&self.general.log_level.as_str()) {
            return Err(PlayerError::Config(format!(
                "Invalid log level '{}', must be one of: {:?}",
                self.general.log_level,
                VALID_LOG_LEVELS
            )));
        }

        Ok(())
    }

    /// Get system config file path
    fn system_config_path() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        return Some(PathBuf::from("/etc/playview/config.toml"));

        #[cfg(target_os = "macos")]
        return Some(PathBuf::from("/Library/Application Support/playview/config.toml"));

        #[cfg(target_os = "windows")]
        return std::env::var("PROGRAMDATA").ok()
            .map(|p| PathBuf::from(p).join("playview").join("config.toml"));

        #[allow(unreachable_code)]
        None
    }

    /// Get user config file path
    fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("playview").join("config.toml"))
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
