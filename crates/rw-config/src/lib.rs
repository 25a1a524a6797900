//! Theme configuration for RW pages.
//!
//! Parses the `[anchors]`, `[headings]` and `[toc]` sections of `rw.toml`
//! with serde and provides auto-discovery of the config file in parent
//! directories. Missing sections and fields fall back to defaults.
//!
//! ```toml
//! [anchors]
//! viewport_offset = 60.0
//!
//! [headings]
//! permalink = true
//! permalink_symbol = "#"
//!
//! [toc]
//! min_heading_level = 2
//! max_heading_level = 3
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "rw.toml";

/// Lowest heading level a table of contents may include.
const TOC_LEVEL_MIN: u8 = 2;
/// Highest heading level a table of contents may include.
const TOC_LEVEL_MAX: u8 = 6;

/// Theme configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Anchor tracking configuration.
    pub anchors: AnchorsConfig,
    /// Heading markup configuration.
    pub headings: HeadingsConfig,
    /// Table of contents configuration.
    pub toc: TocConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Anchor tracking configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AnchorsConfig {
    /// Distance in pixels from the viewport top to the line a heading must
    /// cross to become active (usually the fixed navbar height).
    pub viewport_offset: f64,
}

impl Default for AnchorsConfig {
    fn default() -> Self {
        Self {
            viewport_offset: 60.0,
        }
    }
}

/// Heading markup configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HeadingsConfig {
    /// Whether headings render a permalink anchor.
    pub permalink: bool,
    /// Text of the permalink anchor.
    pub permalink_symbol: String,
}

impl Default for HeadingsConfig {
    fn default() -> Self {
        Self {
            permalink: true,
            permalink_symbol: "#".to_owned(),
        }
    }
}

/// Table of contents configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TocConfig {
    /// Shallowest heading level listed in the table of contents.
    pub min_heading_level: u8,
    /// Deepest heading level listed in the table of contents.
    pub max_heading_level: u8,
}

impl Default for TocConfig {
    fn default() -> Self {
        Self {
            min_heading_level: 2,
            max_heading_level: 3,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a TOC heading level to lie within the supported range.
fn require_toc_level(level: u8, field: &str) -> Result<(), ConfigError> {
    if !(TOC_LEVEL_MIN..=TOC_LEVEL_MAX).contains(&level) {
        return Err(ConfigError::Validation(format!(
            "{field} must be between {TOC_LEVEL_MIN} and {TOC_LEVEL_MAX}"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `rw.toml` in current directory and parents,
    /// falling back to defaults when none is found.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or validation fails.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)
        } else {
            tracing::debug!("No {CONFIG_FILENAME} found, using defaults");
            Ok(Self::default())
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.config_path = Some(path.to_path_buf());

        // Validate configuration after loading
        config.validate()?;

        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_anchors()?;
        self.validate_headings()?;
        self.validate_toc()?;
        Ok(())
    }

    fn validate_anchors(&self) -> Result<(), ConfigError> {
        let offset = self.anchors.viewport_offset;
        if !offset.is_finite() || offset < 0.0 {
            return Err(ConfigError::Validation(
                "anchors.viewport_offset must be a non-negative number".to_owned(),
            ));
        }
        Ok(())
    }

    fn validate_headings(&self) -> Result<(), ConfigError> {
        if self.headings.permalink {
            require_non_empty(&self.headings.permalink_symbol, "headings.permalink_symbol")?;
        }
        Ok(())
    }

    fn validate_toc(&self) -> Result<(), ConfigError> {
        require_toc_level(self.toc.min_heading_level, "toc.min_heading_level")?;
        require_toc_level(self.toc.max_heading_level, "toc.max_heading_level")?;

        if self.toc.min_heading_level > self.toc.max_heading_level {
            return Err(ConfigError::Validation(
                "toc.min_heading_level cannot exceed toc.max_heading_level".to_owned(),
            ));
        }
        Ok(())
    }
}
