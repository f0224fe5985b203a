//! Scene description types.
//!
//! These are renderer-agnostic: the renderer builds its own primitives
//! from a [`Scene`].

use std::sync::Arc;

use orb_math::Vec3;

use crate::environment::Environment;
use crate::texture::Texture;

/// Surface response of a sphere.
///
/// Both fields default to 0 (a purely diffuse surface).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Material {
    /// Fraction of traced reflection added on top of the local color, in [0, 1]
    pub reflection: f32,

    /// Random perturbation of the reflected direction, >= 0
    pub roughness: f32,
}

impl Material {
    pub fn new(reflection: f32, roughness: f32) -> Self {
        Self {
            reflection,
            roughness,
        }
    }
}

/// A sphere as described by the scene file.
#[derive(Clone, Debug)]
pub struct SphereDesc {
    pub center: Vec3,
    pub radius: f32,

    /// Base color, used when untextured
    pub color: Vec3,

    pub material: Material,

    /// Optional texture, sampled with the equirectangular sphere mapping
    pub texture: Option<Arc<Texture>>,
}

impl SphereDesc {
    /// Create an untextured, non-reflective sphere.
    pub fn new(center: Vec3, radius: f32, color: Vec3) -> Self {
        Self {
            center,
            radius,
            color,
            material: Material::default(),
            texture: None,
        }
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn with_texture(mut self, texture: Arc<Texture>) -> Self {
        self.texture = Some(texture);
        self
    }
}

/// A point light.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    pub position: Vec3,

    /// Per-channel radiance contribution
    pub intensity: Vec3,
}

impl Light {
    pub fn new(position: Vec3, intensity: Vec3) -> Self {
        Self {
            position,
            intensity,
        }
    }
}

/// Everything a render reads: spheres, lights and an optional background.
///
/// Built once (by [`crate::load_scene`] or in memory) and passed by
/// reference into rendering.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    /// Scene name (from file stem)
    pub name: String,

    pub spheres: Vec<SphereDesc>,
    pub lights: Vec<Light>,
    pub environment: Option<Environment>,
}

impl Scene {
    /// Create an empty scene.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_sphere(mut self, sphere: SphereDesc) -> Self {
        self.spheres.push(sphere);
        self
    }

    pub fn with_light(mut self, light: Light) -> Self {
        self.lights.push(light);
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn sphere_count(&self) -> usize {
        self.spheres.len()
    }

    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    /// Number of spheres that carry a texture.
    pub fn textured_count(&self) -> usize {
        self.spheres.iter().filter(|s| s.texture.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_defaults_to_diffuse() {
        let sphere = SphereDesc::new(Vec3::ZERO, 1.0, Vec3::X);
        assert_eq!(sphere.material.reflection, 0.0);
        assert_eq!(sphere.material.roughness, 0.0);
        assert!(sphere.texture.is_none());
    }

    #[test]
    fn test_scene_builder() {
        let scene = Scene::new("test")
            .with_sphere(SphereDesc::new(Vec3::new(0.0, 0.0, 3.0), 1.0, Vec3::X))
            .with_sphere(
                SphereDesc::new(Vec3::ZERO, 0.5, Vec3::ONE)
                    .with_texture(Arc::new(Texture::solid_color(Vec3::Y))),
            )
            .with_light(Light::new(Vec3::new(5.0, 5.0, -10.0), Vec3::ONE));

        assert_eq!(scene.name, "test");
        assert_eq!(scene.sphere_count(), 2);
        assert_eq!(scene.light_count(), 1);
        assert_eq!(scene.textured_count(), 1);
        assert!(scene.environment.is_none());
    }
}
