//! Recursive Whitted-style ray tracing.
//!
//! Per ray: nearest hit, hard shadows from point lights, Lambertian
//! diffuse, and mirror (optionally glossy) reflection up to a fixed depth.

use orb_math::{Interval, Ray, Vec3, VecExt};
use rand::RngCore;

use crate::{Color, HitRecord, RenderConfig, World};

/// Offset along the normal for secondary ray origins, to keep them from
/// re-hitting the surface they start on.
pub const SURFACE_EPSILON: f32 = 1e-4;

/// Compute the color seen by a ray.
///
/// `depth` counts reflections taken so far; reflection stops once it
/// reaches `config.max_depth`, so `max_depth = 0` never recurses.
///
/// The local and reflected terms are summed without down-weighting the
/// local term:
/// `surface * light + reflection_color * reflection`.
pub fn trace(
    ray: &Ray,
    world: &World,
    depth: u32,
    config: &RenderConfig,
    rng: &mut dyn RngCore,
) -> Color {
    let Some(rec) = world.hit(ray) else {
        return background(ray, world, config);
    };

    let primitive = &world.primitives()[rec.index];
    let surface = primitive.surface_color(rec.p, config.textures);

    let local = if config.lighting {
        surface * direct_light(&rec, world, config)
    } else {
        surface
    };

    let material = primitive.material();
    if !config.reflections || depth >= config.max_depth || material.reflection <= 0.0 {
        return local;
    }

    let mut reflected_dir = reflect(ray.direction(), rec.normal).norm();
    if material.roughness > 0.0 {
        reflected_dir = reflected_dir.perturb(material.roughness, rng);
    }

    let reflected = Ray::new(rec.p + rec.normal * SURFACE_EPSILON, reflected_dir);
    let reflection_color = trace(&reflected, world, depth + 1, config, rng);

    local + reflection_color * material.reflection
}

/// Color for a ray that hit nothing.
fn background(ray: &Ray, world: &World, config: &RenderConfig) -> Color {
    match world.environment() {
        Some(env) if config.use_environment => env.sample(ray.direction()),
        _ => config.background,
    }
}

/// Sum of unshadowed Lambertian contributions at a hit point.
///
/// A light is shadowed by any other primitive along the shadow ray,
/// including one beyond the light itself.
fn direct_light(rec: &HitRecord, world: &World, config: &RenderConfig) -> Color {
    let shadow_origin = rec.p + rec.normal * SURFACE_EPSILON;
    let mut contribution = Color::ZERO;

    for light in world.lights() {
        let light_dir = (light.position - rec.p).norm();

        if config.shadows {
            let shadow_ray = Ray::new(shadow_origin, light_dir);
            if world.occluded(&shadow_ray, Interval::POSITIVE, rec.index) {
                continue;
            }
        }

        contribution += light.intensity * rec.normal.dot(light_dir).max(0.0);
    }

    contribution
}

/// Mirror `v` about the normal `n`.
#[inline]
fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - n * (2.0 * n.dot(v))
}
