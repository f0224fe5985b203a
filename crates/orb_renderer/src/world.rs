//! The renderer's view of a scene.

use orb_core::{Environment, Light, Scene};
use orb_math::{Interval, Ray};

use crate::{HitRecord, Primitive, Sphere};

/// Primitives, lights and background, read-only during a render.
///
/// Queries are a linear scan; there is no acceleration structure.
#[derive(Clone, Debug, Default)]
pub struct World {
    primitives: Vec<Primitive>,
    lights: Vec<Light>,
    environment: Option<Environment>,
}

impl World {
    /// Create a new empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build primitives from a scene description.
    pub fn from_scene(scene: &Scene) -> Self {
        Self {
            primitives: scene
                .spheres
                .iter()
                .map(|s| Primitive::from(Sphere::from(s)))
                .collect(),
            lights: scene.lights.clone(),
            environment: scene.environment.clone(),
        }
    }

    /// Add an object to the world.
    pub fn add(&mut self, primitive: impl Into<Primitive>) {
        self.primitives.push(primitive.into());
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn environment(&self) -> Option<&Environment> {
        self.environment.as_ref()
    }

    /// Get the number of primitives.
    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    /// Check if the world has no primitives.
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Nearest positive intersection along the ray.
    ///
    /// On equal `t` the earlier primitive wins.
    pub fn hit(&self, ray: &Ray) -> Option<HitRecord> {
        let mut closest: Option<(usize, f32)> = None;

        for (index, primitive) in self.primitives.iter().enumerate() {
            let Some(t) = primitive.intersect(ray) else {
                continue;
            };
            if closest.map_or(true, |(_, best)| t < best) {
                closest = Some((index, t));
            }
        }

        closest.map(|(index, t)| {
            let p = ray.at(t);
            HitRecord {
                t,
                p,
                normal: self.primitives[index].normal_at(p),
                index,
            }
        })
    }

    /// Whether any primitive other than `skip` blocks the ray within `range`.
    pub fn occluded(&self, ray: &Ray, range: Interval, skip: usize) -> bool {
        self.primitives
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != skip)
            .any(|(_, primitive)| {
                primitive
                    .intersect(ray)
                    .is_some_and(|t| range.surrounds(t))
            })
    }
}
