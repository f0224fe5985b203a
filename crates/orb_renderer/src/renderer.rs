//! Image assembly.
//!
//! Three ways to fill an image from a `World`:
//! - `render`: one ray through each pixel center
//! - `render_monte_carlo`: jittered samples averaged per pixel
//! - `render_progressive`: Monte Carlo in passes, reporting after each
//!
//! The first two run through bucket dispatch; the progressive variant is
//! single-threaded.

use std::ops::ControlFlow;
use std::path::Path;
use std::time::Instant;

use orb_math::{Interval, Vec3, VecExt};
use rand::RngCore;

use crate::bucket::{self, BucketResult, DEFAULT_BUCKET_SIZE};
use crate::{trace, Camera, CancelToken, RenderError, RenderResult, World};

/// RGB color in linear [0, 1] units.
pub type Color = Vec3;

/// Render configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Samples per pixel for Monte Carlo rendering
    pub samples_per_pixel: u32,
    /// Maximum number of reflection bounces
    pub max_depth: u32,
    /// Background color when a ray hits nothing and no environment is used
    pub background: Color,
    /// Lambertian lighting from point lights; off means flat surface color
    pub lighting: bool,
    /// Shadow rays toward each light
    pub shadows: bool,
    /// Mirror and glossy reflection
    pub reflections: bool,
    /// Texture lookups on spheres that carry one
    pub textures: bool,
    /// Sample the world's environment on a miss
    pub use_environment: bool,
    /// Base seed for all per-pixel random streams
    pub seed: u64,
    /// Render buckets on the rayon pool
    pub parallel: bool,
    /// Bucket edge length in pixels
    pub bucket_size: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            samples_per_pixel: 10,
            max_depth: 3,
            background: Color::ZERO,
            lighting: true,
            shadows: true,
            reflections: true,
            textures: true,
            use_environment: true,
            seed: 0,
            parallel: true,
            bucket_size: DEFAULT_BUCKET_SIZE,
        }
    }
}

impl RenderConfig {
    /// Check that a render of `width x height` can start.
    pub fn validate(&self, width: u32, height: u32) -> RenderResult<()> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidConfig(format!(
                "image size must be positive, got {}x{}",
                width, height
            )));
        }
        if self.samples_per_pixel == 0 {
            return Err(RenderError::InvalidConfig(
                "samples_per_pixel must be at least 1".to_string(),
            ));
        }
        if self.bucket_size == 0 {
            return Err(RenderError::InvalidConfig(
                "bucket_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Clamp each channel to [0, 1].
#[inline]
pub fn clamp_color(color: Color) -> Color {
    Color::new(
        Interval::UNIT.clamp(color.x),
        Interval::UNIT.clamp(color.y),
        Interval::UNIT.clamp(color.z),
    )
}

/// Convert a color to 8-bit RGB. No gamma is applied.
pub fn color_to_rgb(color: Color) -> [u8; 3] {
    let (r, g, b) = clamp_color(color).components();
    [(255.0 * r) as u8, (255.0 * g) as u8, (255.0 * b) as u8]
}

/// Color of pixel (x, y) from a single ray through its center.
pub fn render_pixel(
    camera: &Camera,
    world: &World,
    x: u32,
    y: u32,
    config: &RenderConfig,
    rng: &mut dyn RngCore,
) -> Color {
    let ray = camera.get_ray(x, y);
    clamp_color(trace(&ray, world, 0, config, rng))
}

/// Color of pixel (x, y) averaged over `config.samples_per_pixel`
/// jittered rays.
pub fn render_pixel_samples(
    camera: &Camera,
    world: &World,
    x: u32,
    y: u32,
    config: &RenderConfig,
    rng: &mut dyn RngCore,
) -> Color {
    let samples = config.samples_per_pixel.max(1);
    let mut pixel_color = Color::ZERO;

    for _ in 0..samples {
        let ray = camera.get_jittered_ray(x, y, rng);
        pixel_color += trace(&ray, world, 0, config, rng);
    }

    clamp_color(pixel_color / samples as f32)
}

/// Row-major image of clamped colors.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; width as usize * height as usize],
        }
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[self.index(x, y)]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        let i = self.index(x, y);
        self.pixels[i] = color;
    }

    /// Copy a rendered bucket into place.
    pub fn write_bucket(&mut self, result: &BucketResult) {
        let b = &result.bucket;
        for local_y in 0..b.height {
            let row = (local_y * b.width) as usize;
            for local_x in 0..b.width {
                self.set(b.x + local_x, b.y + local_y, result.pixels[row + local_x as usize]);
            }
        }
    }

    /// 8-bit RGB copy, no gamma.
    pub fn to_image(&self) -> image::RgbImage {
        image::RgbImage::from_fn(self.width, self.height, |x, y| {
            image::Rgb(color_to_rgb(self.get(x, y)))
        })
    }

    /// Write the image, format chosen by the path's extension.
    pub fn save(&self, path: impl AsRef<Path>) -> image::ImageResult<()> {
        self.to_image().save(path)
    }
}

/// Render with one ray per pixel center.
pub fn render(
    camera: &Camera,
    world: &World,
    config: &RenderConfig,
    cancel: &CancelToken,
) -> RenderResult<ImageBuffer> {
    let (width, height) = (camera.image_width, camera.image_height);
    config.validate(width, height)?;

    log::info!(
        "Ray tracing {}x{} ({} primitives, {} lights)",
        width,
        height,
        world.len(),
        world.lights().len()
    );
    let start = Instant::now();

    let image = bucket::dispatch(width, height, config, cancel, |x, y, rng| {
        render_pixel(camera, world, x, y, config, rng)
    })?;

    log::info!("Ray tracing finished in {:.2?}", start.elapsed());
    Ok(image)
}

/// Render with `config.samples_per_pixel` jittered rays per pixel.
pub fn render_monte_carlo(
    camera: &Camera,
    world: &World,
    config: &RenderConfig,
    cancel: &CancelToken,
) -> RenderResult<ImageBuffer> {
    let (width, height) = (camera.image_width, camera.image_height);
    config.validate(width, height)?;

    log::info!(
        "Monte Carlo {}x{} at {} spp ({} primitives, {} lights)",
        width,
        height,
        config.samples_per_pixel,
        world.len(),
        world.lights().len()
    );
    let start = Instant::now();

    let image = bucket::dispatch(width, height, config, cancel, |x, y, rng| {
        render_pixel_samples(camera, world, x, y, config, rng)
    })?;

    log::info!("Monte Carlo finished in {:.2?}", start.elapsed());
    Ok(image)
}

/// Snapshot handed to the progressive callback after each pass.
#[derive(Debug)]
pub struct ProgressiveFrame<'a> {
    /// Samples per pixel accumulated so far
    pub samples: u32,
    /// Samples per pixel the render will reach if not stopped
    pub total: u32,
    /// Running average, clamped
    pub image: &'a ImageBuffer,
}

/// Monte Carlo render in passes of one sample per pixel.
///
/// `on_pass` sees the running average after every pass, with `samples`
/// going 1, 2, ... up to `config.samples_per_pixel`. Returning
/// `ControlFlow::Break` stops after that pass. The image of the last
/// completed pass is returned.
pub fn render_progressive<F>(
    camera: &Camera,
    world: &World,
    config: &RenderConfig,
    cancel: &CancelToken,
    mut on_pass: F,
) -> RenderResult<ImageBuffer>
where
    F: FnMut(&ProgressiveFrame<'_>) -> ControlFlow<()>,
{
    let (width, height) = (camera.image_width, camera.image_height);
    config.validate(width, height)?;

    let total = config.samples_per_pixel;
    log::info!(
        "Progressive {}x{} up to {} spp",
        width,
        height,
        total
    );
    let start = Instant::now();

    let mut sums = vec![Color::ZERO; width as usize * height as usize];
    let mut image = ImageBuffer::new(width, height);

    for pass in 1..=total {
        let seed = bucket::pass_seed(config.seed, pass);
        for y in 0..height {
            for x in 0..width {
                if cancel.is_cancelled() {
                    return Err(RenderError::Cancelled);
                }
                let mut rng = bucket::pixel_rng(seed, x, y);
                let ray = camera.get_jittered_ray(x, y, &mut rng);
                let i = image.index(x, y);
                sums[i] += trace(&ray, world, 0, config, &mut rng);
                image.pixels[i] = clamp_color(sums[i] / pass as f32);
            }
        }

        log::debug!("Pass {}/{} done at {:.2?}", pass, total, start.elapsed());

        let frame = ProgressiveFrame {
            samples: pass,
            total,
            image: &image,
        };
        if on_pass(&frame).is_break() {
            log::info!("Progressive render stopped after {} of {} passes", pass, total);
            break;
        }
    }

    log::info!("Progressive render finished in {:.2?}", start.elapsed());
    Ok(image)
}
