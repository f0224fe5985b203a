//! JSON scene loading.
//!
//! A scene file is either an object whose values are tagged records
//! (keys are free-form labels) or an array of records:
//!
//! ```json
//! {
//!   "sphere_1": {"type": "Sphere", "center": [0, 0, 3], "radius": 1, "color": [1, 0, 0]},
//!   "light_1":  {"type": "Light", "position": [5, 5, -10], "intensity": [1, 1, 1]}
//! }
//! ```
//!
//! Every record is validated before a [`Scene`] is returned, so the
//! renderer only ever sees well-formed data.

use std::path::{Path, PathBuf};

use orb_math::Vec3;
use serde::Deserialize;
use thiserror::Error;

use crate::scene::{Light, Material, Scene, SphereDesc};
use crate::texture::{TextureCache, TextureError, TextureFilter};

/// Errors that can occur during scene loading.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Failed to read scene {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Scene is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Scene must be a JSON object or array of records")]
    NotACollection,

    #[error("Record {label}: {source}")]
    Record {
        label: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Record {label}: {reason}")]
    Invalid { label: String, reason: String },

    #[error("Record {label}: {source}")]
    Texture {
        label: String,
        #[source]
        source: TextureError,
    },
}

/// Result type for loading operations.
pub type SceneResult<T> = Result<T, SceneError>;

/// One entry of a scene file, tagged by its `"type"` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
enum SceneRecord {
    Sphere(SphereRecord),
    Light(LightRecord),
}

#[derive(Debug, Clone, Deserialize)]
struct SphereRecord {
    center: [f32; 3],
    radius: f32,
    color: [f32; 3],
    #[serde(default)]
    reflection: f32,
    #[serde(default)]
    roughness: f32,
    #[serde(default)]
    texture: Option<String>,
    #[serde(default)]
    filter: TextureFilter,
}

#[derive(Debug, Clone, Deserialize)]
struct LightRecord {
    position: [f32; 3],
    intensity: [f32; 3],
}

/// Load a scene file.
///
/// Relative texture paths are resolved against the file's directory.
pub fn load_scene<P: AsRef<Path>>(path: P) -> SceneResult<Scene> {
    let path = path.as_ref();
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unnamed");

    let source = std::fs::read_to_string(path).map_err(|source| SceneError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut textures = TextureCache::with_base_dir(base_dir);
    let mut scene = parse_scene(&source, &mut textures)?;
    scene.name = name.to_string();

    log::info!(
        "Loaded scene '{}': {} spheres ({} textured, {} images), {} lights",
        scene.name,
        scene.sphere_count(),
        scene.textured_count(),
        textures.len(),
        scene.light_count()
    );

    Ok(scene)
}

/// Load a scene from a JSON string.
///
/// Relative texture paths are resolved against the working directory.
pub fn load_scene_from_string(source: &str) -> SceneResult<Scene> {
    let mut textures = TextureCache::new();
    parse_scene(source, &mut textures)
}

fn parse_scene(source: &str, textures: &mut TextureCache) -> SceneResult<Scene> {
    let value: serde_json::Value = serde_json::from_str(source)?;

    let entries: Vec<(String, serde_json::Value)> = match value {
        serde_json::Value::Object(map) => map.into_iter().collect(),
        serde_json::Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, v)| (format!("#{}", i), v))
            .collect(),
        _ => return Err(SceneError::NotACollection),
    };

    let mut scene = Scene::new("unnamed");

    for (label, value) in entries {
        let record: SceneRecord = serde_json::from_value(value).map_err(|source| {
            SceneError::Record {
                label: label.clone(),
                source,
            }
        })?;

        match record {
            SceneRecord::Sphere(r) => {
                let sphere = build_sphere(&label, r, textures)?;
                scene.spheres.push(sphere);
            }
            SceneRecord::Light(r) => {
                let light = build_light(&label, r)?;
                scene.lights.push(light);
            }
        }
    }

    Ok(scene)
}

fn build_sphere(
    label: &str,
    r: SphereRecord,
    textures: &mut TextureCache,
) -> SceneResult<SphereDesc> {
    let invalid = |reason: String| SceneError::Invalid {
        label: label.to_string(),
        reason,
    };

    let center = finite_vec(label, "center", r.center)?;
    let color = finite_vec(label, "color", r.color)?;

    if !(r.radius.is_finite() && r.radius > 0.0) {
        return Err(invalid(format!("radius must be positive, got {}", r.radius)));
    }
    if !(0.0..=1.0).contains(&r.reflection) {
        return Err(invalid(format!(
            "reflection must be in [0, 1], got {}",
            r.reflection
        )));
    }
    if !(r.roughness.is_finite() && r.roughness >= 0.0) {
        return Err(invalid(format!(
            "roughness must be >= 0, got {}",
            r.roughness
        )));
    }

    let mut sphere = SphereDesc::new(center, r.radius, color)
        .with_material(Material::new(r.reflection, r.roughness));

    if let Some(texture_path) = r.texture.as_deref() {
        let texture = textures
            .load(texture_path, r.filter)
            .map_err(|source| SceneError::Texture {
                label: label.to_string(),
                source,
            })?;
        sphere = sphere.with_texture(texture);
    }

    Ok(sphere)
}

fn build_light(label: &str, r: LightRecord) -> SceneResult<Light> {
    Ok(Light::new(
        finite_vec(label, "position", r.position)?,
        finite_vec(label, "intensity", r.intensity)?,
    ))
}

fn finite_vec(label: &str, field: &str, v: [f32; 3]) -> SceneResult<Vec3> {
    let v = Vec3::from(v);
    if v.is_finite() {
        Ok(v)
    } else {
        Err(SceneError::Invalid {
            label: label.to_string(),
            reason: format!("{} must be finite, got {:?}", field, v),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED_SPHERE: &str = r#"{
        "sphere_1": {"type": "Sphere", "center": [0, 0, 3], "radius": 1, "color": [1, 0, 0]},
        "light_1": {"type": "Light", "position": [5, 5, -10], "intensity": [1, 1, 1]}
    }"#;

    #[test]
    fn test_load_object_form() {
        let scene = load_scene_from_string(RED_SPHERE).unwrap();
        assert_eq!(scene.sphere_count(), 1);
        assert_eq!(scene.light_count(), 1);

        let sphere = &scene.spheres[0];
        assert_eq!(sphere.center, Vec3::new(0.0, 0.0, 3.0));
        assert_eq!(sphere.radius, 1.0);
        assert_eq!(sphere.color, Vec3::X);
        // Absent optional fields fall back to a diffuse surface
        assert_eq!(sphere.material, Material::default());

        assert_eq!(scene.lights[0].position, Vec3::new(5.0, 5.0, -10.0));
    }

    #[test]
    fn test_load_array_form() {
        let scene = load_scene_from_string(
            r#"[
                {"type": "Sphere", "center": [1, 0, 4], "radius": 1, "color": [0, 1, 0],
                 "reflection": 0.5, "roughness": 0.1},
                {"type": "Sphere", "center": [-1, 0, 2.5], "radius": 0.3, "color": [0, 0, 1]}
            ]"#,
        )
        .unwrap();

        assert_eq!(scene.sphere_count(), 2);
        assert_eq!(scene.light_count(), 0);
        assert_eq!(scene.spheres[0].material, Material::new(0.5, 0.1));
        assert_eq!(scene.spheres[1].radius, 0.3);
    }

    #[test]
    fn test_unknown_type_rejected() {
        let err = load_scene_from_string(
            r#"{"floor": {"type": "Plane", "normal": [0, 1, 0]}}"#,
        )
        .unwrap_err();
        match err {
            SceneError::Record { label, .. } => assert_eq!(label, "floor"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_field_rejected() {
        let err = load_scene_from_string(
            r#"[{"type": "Light", "position": [0, 0, 0]}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, SceneError::Record { .. }));
        assert!(err.to_string().contains("intensity"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad_radius = r#"[{"type": "Sphere", "center": [0, 0, 0], "radius": 0, "color": [1, 1, 1]}]"#;
        assert!(matches!(
            load_scene_from_string(bad_radius),
            Err(SceneError::Invalid { .. })
        ));

        let bad_reflection = r#"[{"type": "Sphere", "center": [0, 0, 0], "radius": 1,
            "color": [1, 1, 1], "reflection": 1.5}]"#;
        assert!(matches!(
            load_scene_from_string(bad_reflection),
            Err(SceneError::Invalid { .. })
        ));

        let bad_roughness = r#"[{"type": "Sphere", "center": [0, 0, 0], "radius": 1,
            "color": [1, 1, 1], "roughness": -0.1}]"#;
        assert!(matches!(
            load_scene_from_string(bad_roughness),
            Err(SceneError::Invalid { .. })
        ));
    }

    #[test]
    fn test_not_a_collection() {
        assert!(matches!(
            load_scene_from_string("42"),
            Err(SceneError::NotACollection)
        ));
        assert!(matches!(
            load_scene_from_string("{not json"),
            Err(SceneError::Json(_))
        ));
    }

    #[test]
    fn test_load_scene_with_texture_relative_to_file() {
        let dir = tempfile::tempdir().unwrap();
        image::RgbImage::from_pixel(8, 4, image::Rgb([0, 255, 0]))
            .save(dir.path().join("green.png"))
            .unwrap();

        let scene_path = dir.path().join("textured.json");
        std::fs::write(
            &scene_path,
            r#"{
                "a": {"type": "Sphere", "center": [0, 0, 3], "radius": 1, "color": [1, 1, 1],
                      "texture": "green.png"},
                "b": {"type": "Sphere", "center": [2, 0, 3], "radius": 1, "color": [1, 1, 1],
                      "texture": "green.png"}
            }"#,
        )
        .unwrap();

        let scene = load_scene(&scene_path).unwrap();
        assert_eq!(scene.name, "textured");
        assert_eq!(scene.textured_count(), 2);

        let a = scene.spheres[0].texture.as_ref().unwrap();
        let b = scene.spheres[1].texture.as_ref().unwrap();
        assert!(std::sync::Arc::ptr_eq(a, b));
        assert_eq!(a.sample(0.3, 0.7), Vec3::Y);
    }

    #[test]
    fn test_texture_filter_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let mut img = image::RgbImage::new(2, 1);
        img.put_pixel(0, 0, image::Rgb([255, 0, 0]));
        img.put_pixel(1, 0, image::Rgb([0, 0, 255]));
        img.save(dir.path().join("strip.png")).unwrap();

        let scene_path = dir.path().join("filtered.json");
        std::fs::write(
            &scene_path,
            r#"[
                {"type": "Sphere", "center": [0, 0, 3], "radius": 1, "color": [1, 1, 1],
                 "texture": "strip.png"},
                {"type": "Sphere", "center": [2, 0, 3], "radius": 1, "color": [1, 1, 1],
                 "texture": "strip.png", "filter": "bilinear"}
            ]"#,
        )
        .unwrap();

        let scene = load_scene(&scene_path).unwrap();
        let nearest = scene.spheres[0].texture.as_ref().unwrap();
        let bilinear = scene.spheres[1].texture.as_ref().unwrap();
        assert!(!std::sync::Arc::ptr_eq(nearest, bilinear));

        assert_eq!(nearest.sample(0.5, 0.0), Vec3::X);
        let blended = bilinear.sample(0.5, 0.0);
        assert!((blended - Vec3::new(0.5, 0.0, 0.5)).length() < 1e-5, "{:?}", blended);
    }

    #[test]
    fn test_unknown_filter_rejected() {
        let err = load_scene_from_string(
            r#"[{"type": "Sphere", "center": [0, 0, 0], "radius": 1, "color": [1, 1, 1],
                "filter": "cubic"}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, SceneError::Record { .. }));
    }

    #[test]
    fn test_missing_texture_fails_load() {
        let err = load_scene_from_string(
            r#"[{"type": "Sphere", "center": [0, 0, 0], "radius": 1, "color": [1, 1, 1],
                "texture": "/no/such/texture.png"}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, SceneError::Texture { .. }));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_scene("/no/such/scene.json"),
            Err(SceneError::Io { .. })
        ));
    }
}
