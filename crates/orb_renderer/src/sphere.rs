//! Sphere primitive for ray tracing.

use std::sync::Arc;

use orb_core::{equirect_uv, Material, SphereDesc, Texture};
use orb_math::{Ray, Vec3, VecExt};

use crate::Color;

/// A sphere primitive.
#[derive(Clone, Debug)]
pub struct Sphere {
    center: Vec3,
    radius: f32,
    color: Color,
    material: Material,
    texture: Option<Arc<Texture>>,
}

impl Sphere {
    /// Create a new untextured sphere.
    ///
    /// `radius` must be positive; scene loading rejects anything else.
    pub fn new(center: Vec3, radius: f32, color: Color, material: Material) -> Self {
        debug_assert!(radius > 0.0, "sphere radius must be positive, got {}", radius);
        Self {
            center,
            radius,
            color,
            material,
            texture: None,
        }
    }

    /// Attach a texture sampled with the equirectangular sphere mapping.
    pub fn with_texture(mut self, texture: Arc<Texture>) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn material(&self) -> Material {
        self.material
    }

    /// Smallest positive ray parameter where the ray meets the sphere.
    ///
    /// The ray direction must be unit length. A tangent ray (zero
    /// discriminant) is a miss.
    pub fn intersect(&self, ray: &Ray) -> Option<f32> {
        let oc = ray.origin() - self.center;
        let b = 2.0 * oc.dot(ray.direction());
        let c = oc.dot(oc) - self.radius * self.radius;

        let discriminant = b * b - 4.0 * c;
        if discriminant <= 0.0 {
            return None;
        }

        let sqrtd = discriminant.sqrt();
        let t0 = (-b - sqrtd) / 2.0;
        let t1 = (-b + sqrtd) / 2.0;

        if t0 > 0.0 {
            Some(t0)
        } else if t1 > 0.0 {
            Some(t1)
        } else {
            None
        }
    }

    /// Outward unit normal at a point on the surface.
    #[inline]
    pub fn normal_at(&self, p: Vec3) -> Vec3 {
        (p - self.center).norm()
    }

    /// Color at a surface point.
    ///
    /// Textured spheres look the texture up along the normal; otherwise
    /// (or with `textured = false`) the base color is returned.
    pub fn surface_color(&self, p: Vec3, textured: bool) -> Color {
        match &self.texture {
            Some(texture) if textured => {
                let (u, v) = equirect_uv(self.normal_at(p));
                texture.sample(u, v)
            }
            _ => self.color,
        }
    }
}

impl From<&SphereDesc> for Sphere {
    fn from(desc: &SphereDesc) -> Self {
        let sphere = Sphere::new(desc.center, desc.radius, desc.color, desc.material);
        match &desc.texture {
            Some(texture) => sphere.with_texture(texture.clone()),
            None => sphere,
        }
    }
}
