//! Vector helpers layered on top of glam's `Vec3`.
//!
//! glam already provides add, subtract, scalar and component-wise scale,
//! and dot. This adds the guarded normalization and the random
//! perturbation used for glossy reflection.

use crate::Vec3;
use rand::RngCore;
use rand_distr::{Distribution, StandardNormal};

/// Smallest length `norm()` will divide by.
pub const NORM_EPSILON: f32 = 1e-6;

/// Extra operations on `Vec3` used by the tracer.
pub trait VecExt: Sized {
    /// Scale to unit length.
    ///
    /// The length is clamped to [`NORM_EPSILON`], so the zero vector maps to
    /// itself instead of NaN.
    fn norm(self) -> Self;

    /// Components as a tuple, for buffer writes.
    fn components(self) -> (f32, f32, f32);

    /// Blend this direction with a random unit direction by `roughness`
    /// and re-normalize.
    ///
    /// `roughness <= 0` returns `self.norm()` and draws nothing from `rng`.
    fn perturb(self, roughness: f32, rng: &mut dyn RngCore) -> Self;
}

impl VecExt for Vec3 {
    #[inline]
    fn norm(self) -> Self {
        self * (1.0 / self.length().max(NORM_EPSILON))
    }

    #[inline]
    fn components(self) -> (f32, f32, f32) {
        (self.x, self.y, self.z)
    }

    fn perturb(self, roughness: f32, rng: &mut dyn RngCore) -> Self {
        if roughness <= 0.0 {
            return self.norm();
        }

        // Gaussian components give a direction uniform over the sphere
        let random_dir = Vec3::new(
            StandardNormal.sample(rng),
            StandardNormal.sample(rng),
            StandardNormal.sample(rng),
        )
        .norm();

        (self * (1.0 - roughness) + random_dir * roughness).norm()
    }
}
