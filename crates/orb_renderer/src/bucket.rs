//! Bucket-based tile rendering.
//!
//! Divides the image into tiles (buckets) that are rendered independently
//! and in parallel using rayon, then copied into the image by coordinate.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;

use crate::{CancelToken, Color, ImageBuffer, RenderConfig, RenderError, RenderResult};

/// A rectangular region of the image to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    /// X coordinate of bucket's top-left corner
    pub x: u32,
    /// Y coordinate of bucket's top-left corner
    pub y: u32,
    /// Width of the bucket in pixels
    pub width: u32,
    /// Height of the bucket in pixels
    pub height: u32,
    /// Index of this bucket in the render order
    pub index: usize,
}

impl Bucket {
    /// Create a new bucket.
    pub fn new(x: u32, y: u32, width: u32, height: u32, index: usize) -> Self {
        Self { x, y, width, height, index }
    }

    /// Get the total number of pixels in this bucket.
    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }
}

/// Default bucket size in pixels.
pub const DEFAULT_BUCKET_SIZE: u32 = 64;

/// Generate buckets for an image, sorted in spiral order from center.
///
/// Every pixel belongs to exactly one bucket. Edge buckets are clipped to
/// the image.
pub fn generate_buckets(width: u32, height: u32, bucket_size: u32) -> Vec<Bucket> {
    let bucket_size = bucket_size.max(1);
    let mut buckets = Vec::new();
    let mut index = 0;

    let mut y = 0;
    while y < height {
        let mut x = 0;
        while x < width {
            let bw = bucket_size.min(width - x);
            let bh = bucket_size.min(height - y);
            buckets.push(Bucket::new(x, y, bw, bh, index));
            index += 1;
            x += bucket_size;
        }
        y += bucket_size;
    }

    sort_spiral(&mut buckets, width, height);

    for (i, bucket) in buckets.iter_mut().enumerate() {
        bucket.index = i;
    }

    buckets
}

/// Sort buckets by distance from image center, nearest first.
fn sort_spiral(buckets: &mut [Bucket], width: u32, height: u32) {
    let center_x = width as f32 / 2.0;
    let center_y = height as f32 / 2.0;

    let dist = |b: &Bucket| {
        let bx = b.x as f32 + b.width as f32 / 2.0;
        let by = b.y as f32 + b.height as f32 / 2.0;
        (bx - center_x).powi(2) + (by - center_y).powi(2)
    };

    buckets.sort_by(|a, b| dist(a).total_cmp(&dist(b)));
}

/// Result of rendering a bucket.
#[derive(Debug, Clone)]
pub struct BucketResult {
    /// The bucket that was rendered
    pub bucket: Bucket,
    /// Pixel colors in row-major order
    pub pixels: Vec<Color>,
}

impl BucketResult {
    /// Create a new bucket result.
    pub fn new(bucket: Bucket, pixels: Vec<Color>) -> Self {
        Self { bucket, pixels }
    }
}

/// RNG for one pixel, independent of which worker renders it.
pub fn pixel_rng(seed: u64, x: u32, y: u32) -> StdRng {
    let index = ((y as u64) << 32) | x as u64;
    StdRng::seed_from_u64(splitmix64(seed ^ splitmix64(index)))
}

/// Seed for one pass of a progressive render.
pub fn pass_seed(seed: u64, pass: u32) -> u64 {
    splitmix64(seed ^ ((pass as u64) << 40))
}

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Render a single bucket.
///
/// `shade` is called once per pixel with that pixel's RNG. The token is
/// checked before every pixel.
pub fn render_bucket<F>(
    bucket: &Bucket,
    seed: u64,
    cancel: &CancelToken,
    shade: &F,
) -> RenderResult<BucketResult>
where
    F: Fn(u32, u32, &mut dyn RngCore) -> Color + Sync,
{
    let mut pixels = Vec::with_capacity(bucket.pixel_count() as usize);

    for local_y in 0..bucket.height {
        for local_x in 0..bucket.width {
            if cancel.is_cancelled() {
                return Err(RenderError::Cancelled);
            }
            let x = bucket.x + local_x;
            let y = bucket.y + local_y;
            let mut rng = pixel_rng(seed, x, y);
            pixels.push(shade(x, y, &mut rng));
        }
    }

    Ok(BucketResult::new(*bucket, pixels))
}

/// Render every pixel of a `width x height` image through `shade`.
///
/// Buckets run on the rayon pool when `config.parallel` is set, otherwise
/// in order on the calling thread. The first failing bucket cancels the
/// rest and its error is returned; no partial image is produced.
pub fn dispatch<F>(
    width: u32,
    height: u32,
    config: &RenderConfig,
    cancel: &CancelToken,
    shade: F,
) -> RenderResult<ImageBuffer>
where
    F: Fn(u32, u32, &mut dyn RngCore) -> Color + Sync,
{
    let buckets = generate_buckets(width, height, config.bucket_size);
    let scope = cancel.child();
    let start = Instant::now();

    let run = |bucket: &Bucket| {
        let result = render_bucket(bucket, config.seed, &scope, &shade);
        if result.is_err() {
            scope.cancel();
        }
        result
    };

    let results: Vec<BucketResult> = if config.parallel {
        buckets.par_iter().map(run).collect::<RenderResult<_>>()?
    } else {
        buckets.iter().map(run).collect::<RenderResult<_>>()?
    };

    let mut image = ImageBuffer::new(width, height);
    for result in &results {
        image.write_bucket(result);
    }

    log::debug!(
        "Rendered {} buckets ({}x{}, parallel={}) in {:?}",
        results.len(),
        width,
        height,
        config.parallel,
        start.elapsed()
    );

    Ok(image)
}
