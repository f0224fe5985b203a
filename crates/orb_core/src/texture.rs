//! Texture loading, caching and equirectangular sampling.
//!
//! Sphere textures and the HDRI environment share the same image type
//! and the same (u, v) projection, so both live here.

use std::collections::HashMap;
use std::f32::consts::PI;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use orb_math::{Vec3, VecExt};
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur during texture loading.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Failed to open texture {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Texture {0} has no pixels")]
    Empty(String),

    #[error("Texture {path} expects {expected} pixels, got {actual}")]
    SizeMismatch {
        path: String,
        expected: usize,
        actual: usize,
    },

    #[error("Unknown texture filter '{0}' (expected nearest or bilinear)")]
    UnknownFilter(String),
}

pub type TextureResult<T> = Result<T, TextureError>;

/// How a texture lookup picks its color.
///
/// Written `"nearest"` or `"bilinear"` in scene and settings files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureFilter {
    /// Truncate (u, v) to a single pixel.
    #[default]
    Nearest,
    /// Blend the four surrounding pixels.
    Bilinear,
}

impl FromStr for TextureFilter {
    type Err = TextureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nearest" => Ok(Self::Nearest),
            "bilinear" => Ok(Self::Bilinear),
            other => Err(TextureError::UnknownFilter(other.to_string())),
        }
    }
}

impl fmt::Display for TextureFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Nearest => "nearest",
            Self::Bilinear => "bilinear",
        })
    }
}

/// Project a direction onto equirectangular (u, v) coordinates.
///
/// `u = 0.5 + atan2(z, x) / 2π`, `v = 0.5 - asin(y) / π`. Both land in
/// [0, 1]; v = 0 is straight up (+Y). The direction is normalized first.
pub fn equirect_uv(direction: Vec3) -> (f32, f32) {
    let d = direction.norm();
    let u = 0.5 + d.z.atan2(d.x) / (2.0 * PI);
    let v = 0.5 - d.y.clamp(-1.0, 1.0).asin() / PI;
    (u, v)
}

/// A decoded image with RGB values scaled to [0, 1].
///
/// Row 0 is the top of the image.
#[derive(Clone, Debug)]
pub struct Texture {
    width: u32,
    height: u32,
    /// Row-major RGB
    pixels: Vec<[f32; 3]>,
    filter: TextureFilter,
    /// Original file path (for debugging)
    path: String,
}

impl Texture {
    /// Create a texture from pixel data.
    ///
    /// Fails if the image is empty or `pixels` does not hold exactly
    /// `width * height` entries.
    pub fn new(
        width: u32,
        height: u32,
        pixels: Vec<[f32; 3]>,
        path: impl Into<String>,
    ) -> TextureResult<Self> {
        let path = path.into();
        if width == 0 || height == 0 {
            return Err(TextureError::Empty(path));
        }
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(TextureError::SizeMismatch {
                path,
                expected,
                actual: pixels.len(),
            });
        }

        Ok(Self {
            width,
            height,
            pixels,
            filter: TextureFilter::Nearest,
            path,
        })
    }

    /// Create a solid color texture (1x1).
    pub fn solid_color(color: Vec3) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![[color.x, color.y, color.z]],
            filter: TextureFilter::Nearest,
            path: "<solid>".to_string(),
        }
    }

    /// Convert a decoded image. Channels are divided by 255, alpha dropped.
    pub fn from_image(img: &image::DynamicImage, path: impl Into<String>) -> TextureResult<Self> {
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        let pixels = rgb
            .pixels()
            .map(|p| {
                [
                    p[0] as f32 / 255.0,
                    p[1] as f32 / 255.0,
                    p[2] as f32 / 255.0,
                ]
            })
            .collect();

        Self::new(width, height, pixels, path)
    }

    /// Load a texture from an image file.
    pub fn open(path: impl AsRef<Path>) -> TextureResult<Self> {
        let path = path.as_ref();
        let display = path.to_string_lossy().to_string();
        let img = image::open(path).map_err(|source| TextureError::Open {
            path: display.clone(),
            source,
        })?;
        Self::from_image(&img, display)
    }

    /// Set the lookup filter.
    pub fn with_filter(mut self, filter: TextureFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Sample the texture at UV coordinates.
    ///
    /// Coordinates wrap (tile) modulo 1 on both axes.
    pub fn sample(&self, u: f32, v: f32) -> Vec3 {
        let u = u.rem_euclid(1.0);
        let v = v.rem_euclid(1.0);

        let x = u * (self.width as f32 - 1.0);
        let y = v * (self.height as f32 - 1.0);

        match self.filter {
            TextureFilter::Nearest => Vec3::from(self.get_pixel(x as u32, y as u32)),
            TextureFilter::Bilinear => self.sample_bilinear(x, y),
        }
    }

    /// Sample the texture along a direction (equirectangular lookup).
    pub fn sample_direction(&self, direction: Vec3) -> Vec3 {
        let (u, v) = equirect_uv(direction);
        self.sample(u, v)
    }

    fn sample_bilinear(&self, x: f32, y: f32) -> Vec3 {
        let x0 = x.floor() as u32;
        let y0 = y.floor() as u32;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);

        let fx = x.fract();
        let fy = y.fract();

        let p00 = Vec3::from(self.get_pixel(x0, y0));
        let p10 = Vec3::from(self.get_pixel(x1, y0));
        let p01 = Vec3::from(self.get_pixel(x0, y1));
        let p11 = Vec3::from(self.get_pixel(x1, y1));

        let top = p00 * (1.0 - fx) + p10 * fx;
        let bottom = p01 * (1.0 - fx) + p11 * fx;
        top * (1.0 - fy) + bottom * fy
    }

    /// Get pixel at integer coordinates, clamped to the image.
    fn get_pixel(&self, x: u32, y: u32) -> [f32; 3] {
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        self.pixels[(y * self.width + x) as usize]
    }

    /// Get total size in bytes (approximate).
    pub fn size_bytes(&self) -> usize {
        self.pixels.len() * std::mem::size_of::<[f32; 3]>()
    }
}

/// Cache for loaded textures.
///
/// Several spheres may name the same file; it is decoded once per filter
/// and shared.
pub struct TextureCache {
    /// Cached textures by file path and filter
    textures: HashMap<(String, TextureFilter), Arc<Texture>>,

    /// Base directory for resolving relative paths
    base_dir: Option<PathBuf>,
}

impl TextureCache {
    /// Create a new empty texture cache.
    pub fn new() -> Self {
        Self {
            textures: HashMap::new(),
            base_dir: None,
        }
    }

    /// Create a texture cache with a base directory for relative paths.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            textures: HashMap::new(),
            base_dir: Some(base_dir.into()),
        }
    }

    /// Load a texture from file, using cache if available.
    pub fn load(&mut self, path: &str, filter: TextureFilter) -> TextureResult<Arc<Texture>> {
        let key = (path.to_string(), filter);
        if let Some(texture) = self.textures.get(&key) {
            return Ok(texture.clone());
        }

        let full_path = self.resolve_path(path);
        let texture = Arc::new(Texture::open(&full_path)?.with_filter(filter));
        self.textures.insert(key, texture.clone());

        log::debug!(
            "Loaded texture: {} ({}x{}, {}, {:.1} KB)",
            path,
            texture.width,
            texture.height,
            filter,
            texture.size_bytes() as f32 / 1024.0
        );

        Ok(texture)
    }

    /// Get the number of cached textures.
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Resolve a path relative to the base directory.
    fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);

        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(base) = &self.base_dir {
            base.join(path)
        } else {
            path.to_path_buf()
        }
    }
}

impl Default for TextureCache {
    fn default() -> Self {
        Self::new()
    }
}
