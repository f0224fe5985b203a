use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use orb_core::{load_scene, Environment, RenderAlgorithm, RenderSettings, TextureFilter};
use orb_renderer::{
    render, render_monte_carlo, render_progressive, Camera, CancelToken, ImageBuffer,
    RenderConfig, World,
};

/// Render a scene of spheres and point lights to a PNG.
#[derive(Parser, Debug)]
#[command(name = "orb")]
#[command(version)]
#[command(about = "CPU ray tracer for sphere scenes")]
struct Args {
    /// Scene description (JSON)
    #[arg(long)]
    scene: PathBuf,

    /// Render settings (JSON); defaults are used when omitted
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Image width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Image height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Samples per pixel for Monte Carlo rendering
    #[arg(long)]
    samples: Option<u32>,

    /// Maximum reflection depth
    #[arg(long)]
    max_depth: Option<u32>,

    /// Equirectangular environment image
    #[arg(long)]
    hdri: Option<PathBuf>,

    /// nearest or bilinear lookup for the HDRI
    #[arg(long)]
    hdri_filter: Option<TextureFilter>,

    /// ray_tracing or monte_carlo
    #[arg(long)]
    algorithm: Option<RenderAlgorithm>,

    /// Output PNG path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Seed for sampling
    #[arg(long, default_value_t = 0)]
    seed: u64,

    #[arg(long)]
    no_shadows: bool,

    #[arg(long)]
    no_reflections: bool,

    #[arg(long)]
    no_textures: bool,

    /// Render on the calling thread only
    #[arg(long)]
    sequential: bool,

    /// Monte Carlo in passes, logging each one
    #[arg(long)]
    progressive: bool,
}

/// Settings file (or defaults) with command-line overrides applied.
fn resolve_settings(args: &Args) -> Result<RenderSettings> {
    let mut settings = match &args.settings {
        Some(path) => RenderSettings::load(path)
            .with_context(|| format!("Failed to load settings {}", path.display()))?,
        None => RenderSettings::default(),
    };

    if let Some(width) = args.width {
        settings.width = width;
    }
    if let Some(height) = args.height {
        settings.height = height;
    }
    if let Some(samples) = args.samples {
        settings.max_samples = samples;
    }
    if let Some(depth) = args.max_depth {
        settings.max_specular_depth = depth;
    }
    if let Some(hdri) = &args.hdri {
        settings.hdri = Some(hdri.clone());
    }
    if let Some(filter) = args.hdri_filter {
        settings.hdri_filter = filter;
    }
    if let Some(algorithm) = args.algorithm {
        settings.render_algorithm = algorithm;
    }
    if let Some(output) = &args.output {
        settings.output_path = output.clone();
    }

    settings.validate().context("Invalid render settings")?;
    Ok(settings)
}

fn render_config(settings: &RenderSettings, args: &Args) -> RenderConfig {
    RenderConfig {
        samples_per_pixel: settings.max_samples,
        max_depth: settings.max_specular_depth,
        shadows: !args.no_shadows,
        reflections: !args.no_reflections,
        textures: !args.no_textures,
        seed: args.seed,
        parallel: !args.sequential,
        ..RenderConfig::default()
    }
}

fn write_png(image: &ImageBuffer, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    image
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn run(args: &Args) -> Result<()> {
    let settings = resolve_settings(args)?;
    log::info!(
        "Settings: {}x{}, {}, {} spp, depth {}",
        settings.width,
        settings.height,
        settings.render_algorithm,
        settings.max_samples,
        settings.max_specular_depth
    );

    let mut scene = load_scene(&args.scene)
        .with_context(|| format!("Failed to load scene {}", args.scene.display()))?;
    if let Some(hdri) = &settings.hdri {
        let environment = Environment::open(hdri, settings.hdri_filter)
            .with_context(|| format!("Failed to load HDRI {}", hdri.display()))?;
        scene = scene.with_environment(environment);
    }

    let world = World::from_scene(&scene);

    if settings.denoise {
        log::warn!("Denoising requested but no denoiser is available; writing the raw image");
    }

    let camera = Camera::new().with_resolution(settings.width, settings.height);
    let config = render_config(&settings, args);
    let cancel = CancelToken::new();
    let start = Instant::now();

    let image = match settings.render_algorithm {
        RenderAlgorithm::RayTracing => render(&camera, &world, &config, &cancel)?,
        RenderAlgorithm::MonteCarlo if args.progressive => {
            render_progressive(&camera, &world, &config, &cancel, |frame| {
                log::info!("Pass {}/{} ({:.1?})", frame.samples, frame.total, start.elapsed());
                ControlFlow::Continue(())
            })?
        }
        RenderAlgorithm::MonteCarlo => render_monte_carlo(&camera, &world, &config, &cancel)?,
    };

    write_png(&image, &settings.output_path)?;
    log::info!(
        "Wrote {} in {:.2?}",
        settings.output_path.display(),
        start.elapsed()
    );
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::info!("Starting orb");

    run(&args)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["orb", "--scene", "scene.json"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_without_settings_file() {
        let settings = resolve_settings(&args(&[])).unwrap();
        assert_eq!(settings, RenderSettings::default());

        let config = render_config(&settings, &args(&[]));
        assert_eq!(config.samples_per_pixel, 10);
        assert_eq!(config.max_depth, 3);
        assert!(config.shadows && config.reflections && config.textures && config.parallel);
    }

    #[test]
    fn test_flags_override_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("render.json");
        std::fs::write(
            &path,
            r#"{"width": 64, "height": 32, "render_algorithm": "monte_carlo", "max_samples": 4}"#,
        )
        .unwrap();
        let path = path.to_string_lossy().into_owned();

        let a = args(&[
            "--settings",
            &path,
            "--height",
            "48",
            "--algorithm",
            "ray_tracing",
            "--hdri-filter",
            "bilinear",
            "--output",
            "out/frame.png",
        ]);
        let settings = resolve_settings(&a).unwrap();

        assert_eq!(settings.width, 64);
        assert_eq!(settings.height, 48);
        assert_eq!(settings.max_samples, 4);
        assert_eq!(settings.render_algorithm, RenderAlgorithm::RayTracing);
        assert_eq!(settings.hdri_filter, TextureFilter::Bilinear);
        assert_eq!(settings.output_path, PathBuf::from("out/frame.png"));
    }

    #[test]
    fn test_invalid_override_rejected() {
        assert!(resolve_settings(&args(&["--width", "0"])).is_err());
        assert!(Args::try_parse_from(["orb", "--scene", "s.json", "--algorithm", "path_tracing"])
            .is_err());
    }

    #[test]
    fn test_toggle_flags() {
        let a = args(&["--no-shadows", "--no-textures", "--sequential", "--seed", "7"]);
        let config = render_config(&RenderSettings::default(), &a);
        assert!(!config.shadows);
        assert!(config.reflections);
        assert!(!config.textures);
        assert!(!config.parallel);
        assert_eq!(config.seed, 7);
    }

    #[test]
    fn test_end_to_end_png() {
        let dir = tempfile::tempdir().unwrap();
        let scene = dir.path().join("scene.json");
        std::fs::write(
            &scene,
            r#"{
                "sphere_1": {"type": "Sphere", "center": [0, 0, 3], "radius": 1, "color": [1, 0, 0]},
                "light_1": {"type": "Light", "position": [5, 5, -10], "intensity": [1, 1, 1]}
            }"#,
        )
        .unwrap();
        let output = dir.path().join("nested").join("out.png");
        let scene_arg = scene.to_string_lossy().into_owned();
        let output_arg = output.to_string_lossy().into_owned();

        let a = Args::try_parse_from([
            "orb",
            "--scene",
            scene_arg.as_str(),
            "--width",
            "10",
            "--height",
            "10",
            "--algorithm",
            "ray_tracing",
            "--output",
            output_arg.as_str(),
        ])
        .unwrap();
        run(&a).unwrap();

        // The sphere fills the center; diffuse red only
        let png = image::open(&output).unwrap().to_rgb8();
        assert_eq!(png.dimensions(), (10, 10));
        let [r, g, b] = png.get_pixel(5, 5).0;
        assert!(r > 0, "center pixel {:?}", [r, g, b]);
        assert_eq!((g, b), (0, 0));
    }

    #[test]
    fn test_hdri_fills_background() {
        let dir = tempfile::tempdir().unwrap();
        let sky = dir.path().join("sky.png");
        image::RgbImage::from_pixel(4, 2, image::Rgb([0, 0, 255]))
            .save(&sky)
            .unwrap();
        let scene = dir.path().join("empty.json");
        std::fs::write(&scene, "{}").unwrap();
        let output = dir.path().join("sky_out.png");

        let a = Args::try_parse_from([
            "orb".to_string(),
            "--scene".to_string(),
            scene.to_string_lossy().into_owned(),
            "--width".to_string(),
            "4".to_string(),
            "--height".to_string(),
            "4".to_string(),
            "--algorithm".to_string(),
            "ray_tracing".to_string(),
            "--hdri".to_string(),
            sky.to_string_lossy().into_owned(),
            "--output".to_string(),
            output.to_string_lossy().into_owned(),
        ])
        .unwrap();
        run(&a).unwrap();

        let png = image::open(&output).unwrap().to_rgb8();
        assert!(png.pixels().all(|p| p.0 == [0, 0, 255]));
    }
}
