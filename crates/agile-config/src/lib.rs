//! Agile Anime configuration system
//!
//! This crate provides centralized configuration for the animation engine and
//! its demo driver, loading settings from `agile.toml` with environment
//! variable overrides.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Default configuration file looked up in the current directory.
pub const CONFIG_FILE: &str = "agile.toml";

/// Errors raised while loading configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML for [`AnimeConfig`].
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnimeConfig {
    /// Sequencer playback defaults
    pub playback: PlaybackConfig,
    /// Frame driver settings (demo host)
    pub driver: DriverConfig,
}

/// Order in which a sequencer walks its queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Low to high sequence numbers on every pass.
    #[default]
    #[serde(alias = "normal")]
    Forward,
    /// High to low sequence numbers on every pass.
    Reverse,
    /// Flip direction on every pass. The first pass runs high to low.
    Alternate,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => write!(f, "forward"),
            Self::Reverse => write!(f, "reverse"),
            Self::Alternate => write!(f, "alternate"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forward" | "normal" => Ok(Self::Forward),
            "reverse" => Ok(Self::Reverse),
            "alternate" => Ok(Self::Alternate),
            other => Err(format!("unknown direction: {other}")),
        }
    }
}

/// Sequencer playback configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Replay the whole queue after each pass
    pub looping: bool,
    /// Queue traversal direction
    pub direction: Direction,
    /// Easing used by steps that do not name one
    pub ease: String,
}

/// Frame driver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Frames per second emitted by the host driver
    pub frame_rate: f64,
    /// Stop the driver after this many frames (guards looping demos)
    pub max_frames: Option<u64>,
    /// `env_logger` filter, e.g. "agile_anime=debug"
    pub log_filter: Option<String>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            looping: false,
            direction: Direction::Forward,
            ease: "linear".to_string(),
        }
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            frame_rate: 60.0,
            max_frames: Some(1200),
            log_filter: None,
        }
    }
}

fn env_flag(val: &str) -> bool {
    val == "1" || val.eq_ignore_ascii_case("true")
}

impl AnimeConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration from `agile.toml` in the current directory,
    /// or return the defaults if the file is missing or invalid
    pub fn load_or_default() -> Self {
        Self::load_from_file(CONFIG_FILE).unwrap_or_default()
    }

    /// Merge configuration with environment variables
    ///
    /// Environment variables take precedence over configuration file values.
    pub fn merge_with_env(&mut self) {
        // Playback settings
        if let Ok(val) = std::env::var("AGILE_LOOP") {
            self.playback.looping = env_flag(&val);
        }
        if let Ok(val) = std::env::var("AGILE_DIRECTION") {
            if let Ok(direction) = val.parse::<Direction>() {
                self.playback.direction = direction;
            }
        }
        if let Ok(ease) = std::env::var("AGILE_EASE") {
            self.playback.ease = ease;
        }

        // Driver settings
        if let Ok(val) = std::env::var("AGILE_FRAME_RATE") {
            if let Ok(rate) = val.parse::<f64>() {
                if rate > 0.0 {
                    self.driver.frame_rate = rate;
                }
            }
        }
        if let Ok(val) = std::env::var("AGILE_MAX_FRAMES") {
            self.driver.max_frames = val.parse::<u64>().ok();
        }
        if let Ok(filter) = std::env::var("AGILE_LOG") {
            self.driver.log_filter = Some(filter);
        }
    }

    /// Load configuration with environment variable overrides
    ///
    /// 1. Load from agile.toml (or use defaults if not found)
    /// 2. Override with environment variables if present
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnimeConfig::default();
        assert!(!config.playback.looping);
        assert_eq!(config.playback.direction, Direction::Forward);
        assert_eq!(config.playback.ease, "linear");
        assert_eq!(config.driver.frame_rate, 60.0);
    }

    #[test]
    fn test_toml_serialization() {
        let config = AnimeConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AnimeConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.playback.direction, Direction::Forward);
        assert_eq!(parsed.driver.max_frames, Some(1200));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let parsed: AnimeConfig = toml::from_str(
            r#"
            [playback]
            direction = "normal"
            looping = true
            "#,
        )
        .unwrap();
        assert!(parsed.playback.looping);
        assert_eq!(parsed.playback.direction, Direction::Forward);
        assert_eq!(parsed.playback.ease, "linear");
        assert_eq!(parsed.driver.frame_rate, 60.0);
    }

    #[test]
    fn test_direction_from_str() {
        assert_eq!("alternate".parse::<Direction>(), Ok(Direction::Alternate));
        assert_eq!(" Reverse ".parse::<Direction>(), Ok(Direction::Reverse));
        assert_eq!("normal".parse::<Direction>(), Ok(Direction::Forward));
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = AnimeConfig::load_from_file("/definitely/not/here/agile.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_merge_with_env() {
        unsafe {
            std::env::set_var("AGILE_DIRECTION", "alternate");
            std::env::set_var("AGILE_LOOP", "true");
            std::env::set_var("AGILE_FRAME_RATE", "30");
        }

        let mut config = AnimeConfig::default();
        config.merge_with_env();

        assert_eq!(config.playback.direction, Direction::Alternate);
        assert!(config.playback.looping);
        assert_eq!(config.driver.frame_rate, 30.0);

        unsafe {
            std::env::remove_var("AGILE_DIRECTION");
            std::env::remove_var("AGILE_LOOP");
            std::env::remove_var("AGILE_FRAME_RATE");
        }
    }
}
