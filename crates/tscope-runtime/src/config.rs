#![forbid(unsafe_code)]

//! Viewer tunables as data.
//!
//! [`ViewerConfig`] collects every knob a session reads at startup. The
//! defaults reproduce the built-in behavior exactly, so a missing config
//! file and `ViewerConfig::default()` are indistinguishable.
//!
//! # Loading
//!
//! ```toml
//! # tscope.toml
//! zoom_step = 1.25
//!
//! [batch]
//! epsilon = 1e-6
//!
//! [palette]
//! alert = "#d62728"
//! ```
//!
//! ```rust,ignore
//! let config = ViewerConfig::from_toml_file("tscope.toml")?;
//! let config = ViewerConfig::from_json_str(json)?;
//! ```
//!
//! The pooling activation ratio is a renderer constant, not a setting.

#[cfg(feature = "config-files")]
use std::path::Path;

#[cfg(feature = "config-files")]
use serde::{Deserialize, Serialize};
use tscope_diff::batch::DEFAULT_EPSILON;
use tscope_render::viewport::SurfaceSize;
use tscope_style::{DEFAULT_ALERT, DEFAULT_NEUTRAL, Rgb, SeverityScale};

/// Scroll zoom factor per wheel step.
pub const DEFAULT_ZOOM_STEP: f64 = 1.2;
/// Decoded payloads kept per session.
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

// ---------------------------------------------------------------------------
// Top-level ViewerConfig
// ---------------------------------------------------------------------------

/// Session configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config-files", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-files", serde(default))]
pub struct ViewerConfig {
    /// Factor applied per scroll step; wheel-down uses the reciprocal.
    pub zoom_step: f64,
    pub batch: BatchConfig,
    pub cache: CacheConfig,
    pub palette: PaletteConfig,
    /// Surface size assumed until the first resize.
    pub surface: SurfaceConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            zoom_step: DEFAULT_ZOOM_STEP,
            batch: BatchConfig::default(),
            cache: CacheConfig::default(),
            palette: PaletteConfig::default(),
            surface: SurfaceConfig::default(),
        }
    }
}

impl ViewerConfig {
    /// Load from a TOML string.
    #[cfg(feature = "config-files")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config-files")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config-files")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config-files")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Load by extension (`.json` is JSON, anything else TOML) and validate.
    #[cfg(feature = "config-files")]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_file(path)?,
            _ => Self::from_toml_file(path)?,
        };
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Check every field; an empty list means the config is usable.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !(self.zoom_step.is_finite() && self.zoom_step > 1.0) {
            errors.push(format!("zoom_step must be > 1, got {}", self.zoom_step));
        }

        if !(self.batch.epsilon.is_finite() && self.batch.epsilon >= 0.0) {
            errors.push(format!(
                "batch.epsilon must be >= 0, got {}",
                self.batch.epsilon
            ));
        }

        if self.cache.capacity == 0 {
            errors.push("cache.capacity must be > 0".into());
        }

        if self.surface.width == 0 || self.surface.height == 0 {
            errors.push(format!(
                "surface must be non-empty, got {}x{}",
                self.surface.width, self.surface.height
            ));
        }

        errors
    }

    /// Severity scale built from the palette.
    #[must_use]
    pub fn severity_scale(&self) -> SeverityScale {
        SeverityScale::new(self.palette.neutral, self.palette.alert)
    }

    #[must_use]
    pub fn surface_size(&self) -> SurfaceSize {
        SurfaceSize::new(self.surface.width, self.surface.height)
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "config-files", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-files", serde(default))]
pub struct BatchConfig {
    /// Scores at or below this are treated as identical.
    pub epsilon: f64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "config-files", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-files", serde(default))]
pub struct CacheConfig {
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "config-files", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-files", serde(default))]
pub struct PaletteConfig {
    /// Color of the lowest severity.
    pub neutral: Rgb,
    /// Color of the worst severity.
    pub alert: Rgb,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            neutral: DEFAULT_NEUTRAL,
            alert: DEFAULT_ALERT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "config-files", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-files", serde(default))]
pub struct SurfaceConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur when loading a viewer configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config-files")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "config-files")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config-files")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "config-files")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config-files")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "config-files")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
