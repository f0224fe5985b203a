//! HDRI environment used as background radiance.

use std::path::Path;
use std::sync::Arc;

use orb_math::Vec3;

use crate::texture::{Texture, TextureFilter, TextureResult};

/// An equirectangular background image.
///
/// Rays that miss every object are colored by looking up their direction
/// here. Cloning is cheap; the image is shared.
#[derive(Clone, Debug)]
pub struct Environment {
    texture: Arc<Texture>,
}

impl Environment {
    /// Wrap an already decoded texture.
    pub fn new(texture: Arc<Texture>) -> Self {
        Self { texture }
    }

    /// Decode an environment image from disk.
    pub fn open(path: impl AsRef<Path>, filter: TextureFilter) -> TextureResult<Self> {
        let texture = Texture::open(path)?.with_filter(filter);
        log::info!(
            "Loaded environment {} ({}x{}, {})",
            texture.path(),
            texture.width(),
            texture.height(),
            filter
        );
        Ok(Self::new(Arc::new(texture)))
    }

    /// Background color seen along `direction`.
    pub fn sample(&self, direction: Vec3) -> Vec3 {
        self.texture.sample_direction(direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 1 column, 3 rows: white sky, grey horizon, black ground.
    fn sky() -> Environment {
        let texture = Texture::new(
            1,
            3,
            vec![[1.0, 1.0, 1.0], [0.5, 0.5, 0.5], [0.0, 0.0, 0.0]],
            "<sky>",
        )
        .unwrap();
        Environment::new(Arc::new(texture))
    }

    #[test]
    fn test_up_is_top_row() {
        let env = sky();
        assert_eq!(env.sample(Vec3::Y), Vec3::ONE);
        assert_eq!(env.sample(Vec3::X), Vec3::splat(0.5));
        // Nearest lookup truncates, so below the horizon stays off the sky row
        assert_eq!(env.sample(Vec3::new(1.0, -1.0, 0.0)), Vec3::splat(0.5));
    }

    #[test]
    fn test_sample_ignores_length() {
        let env = sky();
        assert_eq!(env.sample(Vec3::new(0.0, 10.0, 0.0)), env.sample(Vec3::Y));
    }

    #[test]
    fn test_open_applies_filter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("strip.png");
        let mut img = image::RgbImage::new(3, 1);
        img.put_pixel(0, 0, image::Rgb([255, 0, 0]));
        img.put_pixel(1, 0, image::Rgb([0, 255, 0]));
        img.put_pixel(2, 0, image::Rgb([0, 0, 255]));
        img.save(&path).unwrap();

        // -Z maps to u = 0.25, halfway between the first two columns
        let nearest = Environment::open(&path, TextureFilter::Nearest).unwrap();
        assert_eq!(nearest.sample(-Vec3::Z), Vec3::X);

        let bilinear = Environment::open(&path, TextureFilter::Bilinear).unwrap();
        let c = bilinear.sample(-Vec3::Z);
        assert!((c - Vec3::new(0.5, 0.5, 0.0)).length() < 1e-5, "{:?}", c);
    }

    #[test]
    fn test_open_missing_file() {
        assert!(Environment::open("/no/such/sky.hdr", TextureFilter::Nearest).is_err());
    }
}
