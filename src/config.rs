//! Configuration management for the application.
//!
//! This module handles loading, validating, and saving application configuration
//! in TOML format with platform-specific directory resolution.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{
    CONFIG_DIR_NAME, DEFAULT_MAX_WORDS, DEFAULT_SOUND_VOLUME, DEFAULT_TIMER, MAX_WORDS_LIMIT,
    TIMER_CHOICES_SECS,
};
use crate::models::RgbColor;
use crate::typing::BackspacePolicy;

/// Path configuration for file system locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PathConfig {
    /// Sound packs directory (one subdirectory per pack)
    #[serde(default)]
    pub sound_packs: Option<PathBuf>,
    /// Key code table overriding the embedded one
    #[serde(default)]
    pub keycodes: Option<PathBuf>,
}

/// Look and sound preferences, saved whenever they change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferencesConfig {
    /// Scene background
    #[serde(default = "default_background_color")]
    pub background_color: RgbColor,
    /// Color of modifier and editing keys
    #[serde(default = "default_special_key_color")]
    pub special_key_color: RgbColor,
    /// Color of all other keys
    #[serde(default)]
    pub normal_key_color: RgbColor,
    /// Playback volume (0.0 - 1.0)
    #[serde(default = "default_sound_volume")]
    pub sound_volume: f32,
    /// Last selected sound pack id
    #[serde(default)]
    pub sound_pack: Option<String>,
}

const fn default_background_color() -> RgbColor {
    RgbColor::new(0, 0, 0)
}

const fn default_special_key_color() -> RgbColor {
    RgbColor::new(0x66, 0xBC, 0xC2)
}

const fn default_sound_volume() -> f32 {
    DEFAULT_SOUND_VOLUME
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            background_color: default_background_color(),
            special_key_color: default_special_key_color(),
            normal_key_color: RgbColor::default(),
            sound_volume: default_sound_volume(),
            sound_pack: None,
        }
    }
}

/// Typing test settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingConfig {
    /// Words kept in the queue
    #[serde(default = "default_max_words")]
    pub max_words: usize,
    /// Backspace behavior at the start of a word
    #[serde(default)]
    pub backspace_policy: BackspacePolicy,
}

const fn default_max_words() -> usize {
    DEFAULT_MAX_WORDS
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            max_words: default_max_words(),
            backspace_policy: BackspacePolicy::default(),
        }
    }
}

/// Session timer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Countdown length offered when the timer is toggled on
    #[serde(default = "default_timer_secs")]
    pub default_secs: u64,
}

const fn default_timer_secs() -> u64 {
    DEFAULT_TIMER.as_secs()
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            default_secs: default_timer_secs(),
        }
    }
}

/// Application configuration.
///
/// # File Location
///
/// - Linux: `~/.config/Keyclack/config.toml`
/// - macOS: `~/Library/Application Support/Keyclack/config.toml`
/// - Windows: `%APPDATA%\Keyclack\config.toml`
///
/// # Validation
///
/// - `sound_volume` must be within 0.0 - 1.0
/// - `max_words` must be within 1 - 1000
/// - `default_secs` must be one of the timer choices (15, 30, 60)
/// - `keycodes` path must exist if set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// File system paths
    #[serde(default)]
    pub paths: PathConfig,
    /// Look and sound preferences
    #[serde(default)]
    pub preferences: PreferencesConfig,
    /// Typing test settings
    #[serde(default)]
    pub typing: TypingConfig,
    /// Session timer settings
    #[serde(default)]
    pub timer: TimerConfig,
}

impl Config {
    /// Creates a new Config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the platform-specific config directory path.
    ///
    /// - Linux: `~/.config/Keyclack/`
    /// - macOS: `~/Library/Application Support/Keyclack/`
    /// - Windows: `%APPDATA%\Keyclack\`
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join(CONFIG_DIR_NAME);

        Ok(config_dir)
    }

    /// Gets the full path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Loads configuration from an explicit path, with defaults if missing.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(config_path).context(format!(
            "Failed to read config file: {}",
            config_path.display()
        ))?;

        let config: Self = toml::from_str(&content).context(format!(
            "Failed to parse config file: {}",
            config_path.display()
        ))?;

        config.validate().context(format!(
            "Invalid config file: {}",
            config_path.display()
        ))?;

        Ok(config)
    }

    /// Saves configuration to an explicit path using atomic write.
    ///
    /// Uses temp file + rename pattern for atomic writes.
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        self.validate()?;

        // Ensure config directory exists
        if let Some(config_dir) = config_path.parent() {
            fs::create_dir_all(config_dir).context(format!(
                "Failed to create config directory: {}",
                config_dir.display()
            ))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        let temp_path = config_path.with_extension("toml.tmp");

        fs::write(&temp_path, content).context(format!(
            "Failed to write temp config file: {}",
            temp_path.display()
        ))?;

        // Atomic rename
        fs::rename(&temp_path, config_path).context(format!(
            "Failed to rename temp config file to: {}",
            config_path.display()
        ))?;

        Ok(())
    }

    /// Validates configuration values.
    pub fn validate(&self) -> Result<()> {
        let volume = self.preferences.sound_volume;
        if !(0.0..=1.0).contains(&volume) {
            anyhow::bail!("Sound volume must be between 0.0 and 1.0, got {volume}");
        }

        let max_words = self.typing.max_words;
        if !(1..=MAX_WORDS_LIMIT).contains(&max_words) {
            anyhow::bail!("max_words must be between 1 and {MAX_WORDS_LIMIT}, got {max_words}");
        }

        if !TIMER_CHOICES_SECS.contains(&self.timer.default_secs) {
            anyhow::bail!(
                "Timer length must be one of {:?} seconds, got {}",
                TIMER_CHOICES_SECS,
                self.timer.default_secs
            );
        }

        if let Some(keycodes) = &self.paths.keycodes {
            if !keycodes.exists() {
                anyhow::bail!("Key code table does not exist: {}", keycodes.display());
            }
        }

        if let Some(pack) = &self.preferences.sound_pack {
            if pack.trim().is_empty() {
                anyhow::bail!("Sound pack id must not be empty");
            }
        }

        Ok(())
    }

    /// Sound packs directory: the configured one, or `key_sounds` in the
    /// config directory.
    pub fn sound_packs_dir(&self) -> Result<PathBuf> {
        match &self.paths.sound_packs {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::config_dir()?.join("key_sounds")),
        }
    }

    /// Default timer length.
    #[must_use]
    pub const fn timer_limit(&self) -> Duration {
        Duration::from_secs(self.timer.default_secs)
    }

    /// Sets the playback volume, clamped to 0.0 - 1.0.
    pub fn set_sound_volume(&mut self, volume: f32) {
        self.preferences.sound_volume = if volume.is_nan() {
            DEFAULT_SOUND_VOLUME
        } else {
            volume.clamp(0.0, 1.0)
        };
    }
}
