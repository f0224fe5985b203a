//! Orb Core - Scene description, textures and render settings.
//!
//! This crate provides:
//!
//! - **Scene types**: `Scene`, `SphereDesc`, `Light`, `Material`
//! - **Scene loading**: JSON scene files with validation
//! - **Textures**: image decoding, caching, equirectangular sampling
//! - **Settings**: the render settings file
//!
//! # Example
//!
//! ```ignore
//! use orb_core::{load_scene, RenderSettings};
//!
//! let scene = load_scene("scene.json")?;
//! let settings = RenderSettings::load("render.json")?;
//! println!("Loaded {} spheres, {} lights",
//!     scene.sphere_count(),
//!     scene.light_count());
//! ```

pub mod environment;
pub mod loader;
pub mod scene;
pub mod settings;
pub mod texture;

// Re-export commonly used types
pub use environment::Environment;
pub use loader::{load_scene, load_scene_from_string, SceneError, SceneResult};
pub use scene::{Light, Material, Scene, SphereDesc};
pub use settings::{RenderAlgorithm, RenderSettings, SettingsError, SettingsResult};
pub use texture::{equirect_uv, Texture, TextureCache, TextureError, TextureFilter, TextureResult};
