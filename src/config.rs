// SPDX-License-Identifier: GPL-3.0-only

//! Runtime configuration for the embedded keyboard.
//!
//! Every field has a default taken from [`crate::app_settings`], so an empty
//! JSON object is a complete configuration.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app_settings;
use crate::keyboard::layout::KeyboardLayout;

/// User configuration loaded at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Double-tap window for caps lock, in milliseconds.
    pub double_tap_threshold_ms: u64,
    /// Distance kept between the dragged keyboard and the viewport edges.
    pub drag_margin: f64,
    /// Keyboard width used for the default placement.
    pub panel_width: f64,
    /// Keyboard height used for the default placement.
    pub panel_height: f64,
    /// Gap between the viewport bottom and the keyboard on show.
    pub bottom_offset: f64,
    /// Locale for key labels; `None` selects the default locale.
    pub locale: Option<String>,
    /// Character rows of both keyboard modes.
    pub layout: KeyboardLayout,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            double_tap_threshold_ms: app_settings::DOUBLE_TAP_THRESHOLD_MS,
            drag_margin: app_settings::DRAG_MARGIN,
            panel_width: app_settings::DEFAULT_PANEL_WIDTH,
            panel_height: app_settings::DEFAULT_PANEL_HEIGHT,
            bottom_offset: app_settings::DEFAULT_BOTTOM_OFFSET,
            locale: Some(app_settings::DEFAULT_LOCALE.to_string()),
            layout: KeyboardLayout::default(),
        }
    }
}

impl Config {
    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Json`] on malformed JSON, and [`ConfigError::Invalid`]
    /// when validation fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            source,
            path: path.display().to_string(),
        })?;

        let config: Self = serde_json::from_str(&contents).map_err(|source| ConfigError::Json {
            line: source.line(),
            source,
            path: Some(path.display().to_string()),
        })?;

        config.validate()?;
        tracing::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parses and validates a configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`], minus the I/O case.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|source| ConfigError::Json {
            line: source.line(),
            source,
            path: None,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Checks numeric ranges and the layout.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.panel_width > 0.0 && self.panel_height > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "panel size must be positive, got {}x{}",
                self.panel_width, self.panel_height
            )));
        }

        if !(self.drag_margin >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "drag margin must not be negative, got {}",
                self.drag_margin
            )));
        }

        self.layout.validate().map_err(ConfigError::Invalid)
    }

    /// Double-tap window as a [`Duration`].
    #[must_use]
    pub fn double_tap_threshold(&self) -> Duration {
        Duration::from_millis(self.double_tap_threshold_ms)
    }
}

/// Errors that can occur while loading the configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    Io {
        /// The underlying I/O error
        source: std::io::Error,
        /// File that was being read
        path: String,
    },
    /// The configuration is not valid JSON for [`Config`].
    Json {
        /// The underlying JSON error
        source: serde_json::Error,
        /// File that was being parsed, if any
        path: Option<String>,
        /// Line reported by serde_json
        line: usize,
    },
    /// The configuration parsed but holds unusable values.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { source, path } => {
                write!(f, "failed to read config {}: {}", path, source)
            }
            ConfigError::Json { source, path, line } => match path {
                Some(path) => write!(f, "invalid config {} (line {}): {}", path, line, source),
                None => write!(f, "invalid config (line {}): {}", line, source),
            },
            ConfigError::Invalid(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Json { source, .. } => Some(source),
            ConfigError::Invalid(_) => None,
        }
    }
}
