//! Camera for ray generation.
//!
//! A fixed pinhole at `(0, 0, -1)` looking down +Z through a screen on the
//! `z = 0` plane. The screen spans x in [-1, 1] and y in
//! [-1/aspect, 1/aspect], so pixels stay square for any resolution.

use orb_math::{Ray, Vec3};
use rand::{Rng, RngCore};

/// Screen-space bounds of the image plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Screen {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Screen {
    /// Bounds for an image of the given aspect ratio (width / height).
    pub fn from_aspect(aspect: f32) -> Self {
        Self {
            left: -1.0,
            top: 1.0 / aspect,
            right: 1.0,
            bottom: -1.0 / aspect,
        }
    }
}

/// Camera for generating rays into the scene.
#[derive(Debug, Clone)]
pub struct Camera {
    pub image_width: u32,
    pub image_height: u32,

    position: Vec3,
    screen: Screen,

    // Size of one pixel on the screen plane
    pixel_width: f32,
    pixel_height: f32,
}

impl Camera {
    /// Default eye position.
    pub const DEFAULT_POSITION: Vec3 = Vec3::new(0.0, 0.0, -1.0);

    /// Create a new camera with default settings.
    pub fn new() -> Self {
        Self::default().with_resolution(500, 500)
    }

    /// Set image resolution. Screen bounds follow the aspect ratio.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.image_width = width;
        self.image_height = height;
        self.screen = Screen::from_aspect(width.max(1) as f32 / height.max(1) as f32);
        self.pixel_width = (self.screen.right - self.screen.left) / width.max(1) as f32;
        self.pixel_height = (self.screen.top - self.screen.bottom) / height.max(1) as f32;
        self
    }

    /// Center of pixel (x, y) on the screen plane. Row 0 is the top.
    pub fn pixel_center(&self, x: u32, y: u32) -> Vec3 {
        Vec3::new(
            self.screen.left + (x as f32 + 0.5) * self.pixel_width,
            self.screen.top - (y as f32 + 0.5) * self.pixel_height,
            0.0,
        )
    }

    /// Ray through the exact center of pixel (x, y).
    pub fn get_ray(&self, x: u32, y: u32) -> Ray {
        Ray::new(self.position, self.pixel_center(x, y) - self.position)
    }

    /// Ray through a uniformly random point within half a pixel of the
    /// center of (x, y).
    pub fn get_jittered_ray(&self, x: u32, y: u32, rng: &mut dyn RngCore) -> Ray {
        let half_w = self.pixel_width * 0.5;
        let half_h = self.pixel_height * 0.5;
        let offset = Vec3::new(
            rng.gen_range(-half_w..=half_w),
            rng.gen_range(-half_h..=half_h),
            0.0,
        );
        let target = self.pixel_center(x, y) + offset;
        Ray::new(self.position, target - self.position)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            image_width: 0,
            image_height: 0,
            position: Self::DEFAULT_POSITION,
            screen: Screen::from_aspect(1.0),
            pixel_width: 0.0,
            pixel_height: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_screen_follows_aspect() {
        let screen = Screen::from_aspect(2.0);
        assert_eq!(screen.left, -1.0);
        assert_eq!(screen.right, 1.0);
        assert!((screen.top - 0.5).abs() < 1e-6);
        assert!((screen.bottom + 0.5).abs() < 1e-6);

        // 200x100 pixels are 0.01 square on that screen
        let camera = Camera::new().with_resolution(200, 100);
        let first = camera.pixel_center(0, 0);
        assert!((first.x + 0.995).abs() < 1e-6);
        assert!((first.y - 0.495).abs() < 1e-6);
    }

    #[test]
    fn test_pixel_centers() {
        let camera = Camera::new().with_resolution(10, 10);

        let first = camera.pixel_center(0, 0);
        assert!((first.x + 0.9).abs() < 1e-6);
        assert!((first.y - 0.9).abs() < 1e-6);

        let last = camera.pixel_center(9, 9);
        assert!((last.x - 0.9).abs() < 1e-6);
        assert!((last.y + 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_center_ray_points_forward() {
        let camera = Camera::new().with_resolution(11, 11);
        let ray = camera.get_ray(5, 5);

        assert_eq!(ray.origin(), Camera::DEFAULT_POSITION);
        assert!((ray.direction() - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_jitter_stays_in_pixel() {
        let camera = Camera::new().with_resolution(10, 10);
        let mut rng = StdRng::seed_from_u64(42);
        let center = camera.pixel_center(3, 7);

        for _ in 0..200 {
            let ray = camera.get_jittered_ray(3, 7, &mut rng);
            // Back-project onto the z = 0 screen plane
            let t = -ray.origin().z / ray.direction().z;
            let hit = ray.at(t);
            assert!((hit.x - center.x).abs() <= 0.1 + 1e-5);
            assert!((hit.y - center.y).abs() <= 0.1 + 1e-5);
        }
    }
}
