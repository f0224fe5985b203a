//! Orb Renderer - CPU Ray Tracing
//!
//! A Whitted-style ray tracer for scenes of spheres and point lights:
//! hard shadows, Lambertian diffuse, mirror and glossy reflection,
//! optional HDRI environment. Renders deterministically (one ray per
//! pixel) or by Monte Carlo sampling, in parallel buckets or progressive
//! passes.

mod bucket;
mod camera;
mod cancel;
mod error;
mod primitive;
mod renderer;
mod sphere;
mod trace;
mod world;

pub use bucket::{
    dispatch, generate_buckets, pixel_rng, render_bucket, Bucket, BucketResult,
    DEFAULT_BUCKET_SIZE,
};
pub use camera::{Camera, Screen};
pub use cancel::CancelToken;
pub use error::{RenderError, RenderResult};
pub use primitive::{HitRecord, Primitive};
pub use renderer::{
    clamp_color, color_to_rgb, render, render_monte_carlo, render_pixel, render_pixel_samples,
    render_progressive, Color, ImageBuffer, ProgressiveFrame, RenderConfig,
};
pub use sphere::Sphere;
pub use trace::{trace, SURFACE_EPSILON};
pub use world::World;

/// Re-export Vec3 and common math types from orb_math
pub use orb_math::{Interval, Ray, Vec3};
