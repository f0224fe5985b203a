//! Primitive enum and HitRecord for ray-object intersection.

use orb_core::Material;
use orb_math::{Ray, Vec3};

use crate::{Color, Sphere};

/// Record of the nearest ray-object intersection.
#[derive(Debug, Clone, Copy)]
pub struct HitRecord {
    /// Parameter t where the intersection occurs
    pub t: f32,
    /// Point of intersection
    pub p: Vec3,
    /// Outward surface normal at the intersection
    pub normal: Vec3,
    /// Index of the primitive in its world
    pub index: usize,
}

/// Anything the tracer can hit.
///
/// Every variant carries an explicit material; a surface without
/// reflection carries zeros.
#[derive(Clone, Debug)]
pub enum Primitive {
    Sphere(Sphere),
}

impl Primitive {
    /// Smallest positive ray parameter where the ray meets this primitive.
    #[inline]
    pub fn intersect(&self, ray: &Ray) -> Option<f32> {
        match self {
            Primitive::Sphere(s) => s.intersect(ray),
        }
    }

    /// Outward unit normal at a surface point.
    #[inline]
    pub fn normal_at(&self, p: Vec3) -> Vec3 {
        match self {
            Primitive::Sphere(s) => s.normal_at(p),
        }
    }

    /// Unlit surface color at a point.
    pub fn surface_color(&self, p: Vec3, textured: bool) -> Color {
        match self {
            Primitive::Sphere(s) => s.surface_color(p, textured),
        }
    }

    pub fn material(&self) -> Material {
        match self {
            Primitive::Sphere(s) => s.material(),
        }
    }
}

impl From<Sphere> for Primitive {
    fn from(sphere: Sphere) -> Self {
        Primitive::Sphere(sphere)
    }
}
