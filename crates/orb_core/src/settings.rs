//! Render settings file.
//!
//! ```json
//! {"width": 500, "height": 500, "hdri": null, "hdri_filter": "nearest",
//!  "render_algorithm": "monte_carlo",
//!  "max_samples": 10, "max_specular_depth": 3, "denoise": false,
//!  "output_path": "render.png"}
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

use crate::texture::TextureFilter;

/// Errors that can occur while reading render settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Settings are not valid: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported render algorithm '{0}' (expected ray_tracing or monte_carlo)")]
    UnsupportedAlgorithm(String),

    #[error("Resolution must be positive, got {width}x{height}")]
    InvalidResolution { width: u32, height: u32 },

    #[error("max_samples must be at least 1")]
    NoSamples,
}

pub type SettingsResult<T> = Result<T, SettingsError>;

/// Which image assembly loop to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum RenderAlgorithm {
    /// One ray through each pixel center.
    RayTracing,
    /// Several jittered rays per pixel, averaged.
    #[default]
    MonteCarlo,
}

impl FromStr for RenderAlgorithm {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ray_tracing" => Ok(Self::RayTracing),
            "monte_carlo" => Ok(Self::MonteCarlo),
            other => Err(SettingsError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

impl TryFrom<String> for RenderAlgorithm {
    type Error = SettingsError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for RenderAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::RayTracing => "ray_tracing",
            Self::MonteCarlo => "monte_carlo",
        })
    }
}

fn default_width() -> u32 {
    500
}

fn default_height() -> u32 {
    500
}

fn default_samples() -> u32 {
    10
}

fn default_depth() -> u32 {
    3
}

fn default_output() -> PathBuf {
    PathBuf::from("render.png")
}

/// What to render and where to write it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RenderSettings {
    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    /// Equirectangular background image
    #[serde(default)]
    pub hdri: Option<PathBuf>,

    #[serde(default)]
    pub hdri_filter: TextureFilter,

    #[serde(default)]
    pub render_algorithm: RenderAlgorithm,

    /// Samples per pixel for Monte Carlo rendering
    #[serde(default = "default_samples")]
    pub max_samples: u32,

    /// Maximum reflection recursion depth
    #[serde(default = "default_depth")]
    pub max_specular_depth: u32,

    /// Post-render denoise request (handled outside the renderer)
    #[serde(default)]
    pub denoise: bool,

    #[serde(default = "default_output")]
    pub output_path: PathBuf,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            hdri: None,
            hdri_filter: TextureFilter::default(),
            render_algorithm: RenderAlgorithm::default(),
            max_samples: default_samples(),
            max_specular_depth: default_depth(),
            denoise: false,
            output_path: default_output(),
        }
    }
}

impl RenderSettings {
    /// Load and validate a settings file.
    pub fn load<P: AsRef<Path>>(path: P) -> SettingsResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&source)
    }

    /// Parse and validate settings from JSON.
    pub fn from_json_str(source: &str) -> SettingsResult<Self> {
        let settings: Self = serde_json::from_str(source)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check the values a render cannot start without.
    pub fn validate(&self) -> SettingsResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(SettingsError::InvalidResolution {
                width: self.width,
                height: self.height,
            });
        }
        if self.max_samples == 0 {
            return Err(SettingsError::NoSamples);
        }
        Ok(())
    }
}
