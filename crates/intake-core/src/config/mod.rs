//! Configuration management for Intake.
//!
//! This module handles loading, saving, and managing intake configuration,
//! plus the per-session option surface built from it.
//!
//! ## Configuration File Locations
//!
//! | Platform | Path |
//! |----------|------|
//! | Linux | `~/.config/intake/config.toml` |
//! | macOS | `~/Library/Application Support/Intake/config.toml` |
//! | Windows | `%APPDATA%\Intake\config.toml` |
//!
//! ## Example
//!
//! ```rust,ignore
//! use intake_core::config::{Config, SessionOptions};
//!
//! let config = Config::load()?;
//! let options = SessionOptions::from_config(&config);
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::read::ReadMode;

/// Main configuration struct for Intake.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Validation limits
    pub limits: LimitsConfig,
    /// Reader settings
    pub reader: ReaderConfig,
    /// Preview settings
    pub preview: PreviewConfig,
}

/// Validation limit options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Accepted MIME types; `type/*` matches any subtype, `*` matches all
    pub allowed_types: Vec<String>,
    /// Minimum accepted file size in bytes
    pub min_size: Option<u64>,
    /// Maximum accepted file size in bytes
    pub max_size: Option<u64>,
    /// Maximum total number of accepted files
    pub max_files: Option<usize>,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            allowed_types: vec![crate::ACCEPT_ANY.to_string()],
            min_size: None,
            max_size: Some(crate::DEFAULT_MAX_FILE_SIZE),
            max_files: None,
        }
    }
}

/// Reader options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Chunk size for file reads
    pub chunk_size: usize,
    /// What the reader produces per file
    pub mode: ReadMode,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            chunk_size: crate::DEFAULT_READ_CHUNK_SIZE,
            mode: ReadMode::default(),
        }
    }
}

/// Preview generation options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Enable preview generation
    pub enabled: bool,
    /// Maximum encoded thumbnail size in bytes
    pub max_thumbnail_bytes: usize,
    /// Maximum text preview length
    pub max_text_length: usize,
    /// Thumbnail bounding box (width, height)
    pub thumbnail_size: (u32, u32),
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_thumbnail_bytes: 50 * 1024,
            max_text_length: 1024,
            thumbnail_size: (256, 256),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// If the configuration file doesn't exist, returns the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::ConfigError(format!("Failed to read config: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location.
    ///
    /// Creates the configuration directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be written.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::ConfigError(format!("Failed to create config directory: {e}"))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(&path, content)
            .map_err(|e| Error::ConfigError(format!("Failed to write config: {e}")))
    }

    /// Check the configuration for unusable values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] naming the offending key.
    pub fn validate(&self) -> Result<()> {
        if self.reader.chunk_size == 0 {
            return Err(Error::InvalidConfig {
                key: "reader.chunk_size".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.limits.allowed_types.is_empty() {
            return Err(Error::InvalidConfig {
                key: "limits.allowed_types".to_string(),
                reason: "allow-list cannot be empty".to_string(),
            });
        }

        if let (Some(min), Some(max)) = (self.limits.min_size, self.limits.max_size) {
            if min > max {
                return Err(Error::InvalidConfig {
                    key: "limits.min_size".to_string(),
                    reason: format!("minimum ({min}) exceeds maximum ({max})"),
                });
            }
        }

        let (width, height) = self.preview.thumbnail_size;
        if self.preview.enabled && (width == 0 || height == 0) {
            return Err(Error::InvalidConfig {
                key: "preview.thumbnail_size".to_string(),
                reason: "thumbnail dimensions must be non-zero".to_string(),
            });
        }

        Ok(())
    }

    /// Get the default configuration directory path.
    #[must_use]
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "intake", "Intake")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the full path to the configuration file.
    #[must_use]
    pub fn config_path() -> PathBuf {
        Self::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("config.toml")
    }
}

/// Options for a single intake session.
///
/// The configuration surface recognized by the widget: the allow-list,
/// size and count bounds, the disabled flag, and reader/preview behavior.
/// Whether the session holds one file or many is decided by the session
/// type constructed with these options, not by a flag here.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Accepted MIME types
    pub allowed_types: Vec<String>,
    /// Minimum accepted file size in bytes
    pub min_size: Option<u64>,
    /// Maximum accepted file size in bytes
    pub max_size: Option<u64>,
    /// Maximum total number of accepted files
    pub max_files: Option<usize>,
    /// Whether the surface ignores clicks and drops
    pub disabled: bool,
    /// What the reader produces per file
    pub read_mode: ReadMode,
    /// Chunk size for file reads
    pub chunk_size: usize,
    /// Preview generation settings
    pub preview: PreviewConfig,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl SessionOptions {
    /// Build session options from a loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            allowed_types: config.limits.allowed_types.clone(),
            min_size: config.limits.min_size,
            max_size: config.limits.max_size,
            max_files: config.limits.max_files,
            disabled: false,
            read_mode: config.reader.mode,
            chunk_size: config.reader.chunk_size,
            preview: config.preview.clone(),
        }
    }

    /// Set the accepted MIME types.
    #[must_use]
    pub fn with_allowed_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Set the minimum accepted file size.
    #[must_use]
    pub const fn with_min_size(mut self, min_size: u64) -> Self {
        self.min_size = Some(min_size);
        self
    }

    /// Set the maximum accepted file size.
    #[must_use]
    pub const fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = Some(max_size);
        self
    }

    /// Set the maximum total number of accepted files.
    #[must_use]
    pub const fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = Some(max_files);
        self
    }

    /// Set whether the surface is disabled.
    #[must_use]
    pub const fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Set what the reader produces per file.
    #[must_use]
    pub const fn with_read_mode(mut self, mode: ReadMode) -> Self {
        self.read_mode = mode;
        self
    }

    /// Disable preview generation.
    #[must_use]
    pub fn without_previews(mut self) -> Self {
        self.preview.enabled = false;
        self
    }
}
