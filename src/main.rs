//! shbake CLI - spherical-harmonic texture baker.
//!
//! Bakes backmaps, importance weights and complex Y_lm basis layers for the
//! hemispherical and equirectangular projections.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;

use shbake::export::PngOptions;
use shbake::pipeline::{BakeConfig, EquirectangularStage, HemisphericalStage, Pipeline, MANIFEST_FILE_NAME};
use shbake::projection::ProjectionKind;

/// Spherical-harmonic texture baker.
#[derive(Parser)]
#[command(name = "shbake")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bake the full asset set.
    Bake {
        /// Hemispherical disk radius in pixels (image is 2R x 2R).
        #[arg(short, long, default_value = "512")]
        radius: u32,

        /// Equirectangular width in pixels.
        #[arg(long, default_value = "2048")]
        width: u32,

        /// Equirectangular height in pixels.
        #[arg(long, default_value = "1024")]
        height: u32,

        /// Highest spherical-harmonic order.
        #[arg(short, long, default_value = "6")]
        lmax: u32,

        /// Output directory for generated files.
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// JSON configuration file; its values replace the dimension flags.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write bake_manifest.json next to the images.
        #[arg(long)]
        manifest: bool,

        /// Use fast PNG compression.
        #[arg(long)]
        fast: bool,

        /// Skip the hemispherical projection.
        #[arg(long)]
        skip_hemi: bool,

        /// Skip the equirectangular projection.
        #[arg(long)]
        skip_eq: bool,
    },

    /// Display asset counts and size estimates for a configuration.
    Info {
        /// Hemispherical disk radius in pixels.
        #[arg(short, long, default_value = "512")]
        radius: u32,

        /// Equirectangular width in pixels.
        #[arg(long, default_value = "2048")]
        width: u32,

        /// Equirectangular height in pixels.
        #[arg(long, default_value = "1024")]
        height: u32,

        /// Highest spherical-harmonic order.
        #[arg(short, long, default_value = "6")]
        lmax: u32,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Bake {
            radius,
            width,
            height,
            lmax,
            output,
            config,
            manifest,
            fast,
            skip_hemi,
            skip_eq,
        } => {
            let bake_config = match config {
                Some(path) => BakeConfig::from_json_file(&path).unwrap_or_else(|e| {
                    eprintln!("Error reading config {}: {}", path.display(), e);
                    std::process::exit(1);
                }),
                None => BakeConfig {
                    hemi_radius: radius,
                    eq_width: width,
                    eq_height: height,
                    lmax,
                },
            };
            run_bake(bake_config, output, manifest, fast, skip_hemi, skip_eq);
        }
        Commands::Info {
            radius,
            width,
            height,
            lmax,
        } => {
            run_info(BakeConfig {
                hemi_radius: radius,
                eq_width: width,
                eq_height: height,
                lmax,
            });
        }
    }
}

fn run_bake(config: BakeConfig, output: PathBuf, manifest: bool, fast: bool, skip_hemi: bool, skip_eq: bool) {
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    if skip_hemi && skip_eq {
        eprintln!("Error: Nothing to bake (both projections skipped)");
        std::process::exit(1);
    }

    println!("shbake - Spherical Harmonic Texture Baker");
    println!("=========================================");
    println!("Hemispherical: R={} ({}x{})", config.hemi_radius, 2 * config.hemi_radius, 2 * config.hemi_radius);
    println!("Equirectangular: {}x{}", config.eq_width, config.eq_height);
    println!("Lmax: {} ({} layers per projection)", config.lmax, config.layer_count().unwrap_or(0));
    println!("Output: {}", output.display());

    let start = Instant::now();

    let mut pipeline = Pipeline::new(config);
    if !skip_hemi {
        pipeline.add_stage(HemisphericalStage);
    } else {
        println!("Hemispherical bake: SKIPPED");
    }
    if !skip_eq {
        pipeline.add_stage(EquirectangularStage);
    } else {
        println!("Equirectangular bake: SKIPPED");
    }
    if fast {
        pipeline.set_png_options(PngOptions::fast());
    }
    pipeline.set_write_manifest(manifest);

    println!("\nRunning bake pipeline...");
    let report = pipeline
        .run_with_callbacks(
            &output,
            |name, i, total| {
                println!("  [{}/{}] Starting: {}", i + 1, total, name);
            },
            |name, i, total| {
                println!("  [{}/{}] Completed: {}", i + 1, total, name);
            },
        )
        .unwrap_or_else(|e| {
            eprintln!("Error during bake: {}", e);
            std::process::exit(1);
        });

    for kind in ProjectionKind::all() {
        let count = report.assets.iter().filter(|a| a.variant == kind).count();
        if count > 0 {
            println!("  Exported {} files: *_{}.png", count, kind.short_name());
        }
    }
    if manifest {
        println!("  Wrote {}", MANIFEST_FILE_NAME);
    }

    println!("\nTotal time: {:.2?}", start.elapsed());
    println!("Done!");
}

fn run_info(config: BakeConfig) {
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    let side = 2 * config.hemi_radius as u64;
    let hemi_pixels = side * side;
    let eq_pixels = config.eq_width as u64 * config.eq_height as u64;
    let layers = config.layer_count().unwrap_or(0) as u64;

    // f64 theta + phi + radial + weight, and one complex layer in flight.
    let grid_bytes = |pixels: u64| pixels * (8 * 4 + 16);
    let gray_bytes = |pixels: u64| pixels;
    let rgba_bytes = |pixels: u64| pixels * 4;

    let hemi_disk = 3 * gray_bytes(hemi_pixels) + rgba_bytes(hemi_pixels) * (1 + layers);
    let eq_disk = gray_bytes(eq_pixels) + rgba_bytes(eq_pixels) * (1 + layers);

    println!("shbake - Bake Configuration Info");
    println!("================================");
    println!();
    println!("Hemispherical: {}x{} ({} pixels)", side, side, hemi_pixels);
    println!("Equirectangular: {}x{} ({} pixels)", config.eq_width, config.eq_height, eq_pixels);
    println!("Basis layers per projection: {} (Lmax = {})", layers, config.lmax);
    println!();
    println!("Asset counts:");
    println!("  Hemispherical:   {:>6} files", 4 + layers);
    println!("  Equirectangular: {:>6} files", 2 + layers);
    println!();
    println!("Working memory per worker (in-memory):");
    println!("  Hemispherical:   {:>12} bytes ({:.2} MB)", grid_bytes(hemi_pixels), mb(grid_bytes(hemi_pixels)));
    println!("  Equirectangular: {:>12} bytes ({:.2} MB)", grid_bytes(eq_pixels), mb(grid_bytes(eq_pixels)));
    println!();
    println!("Uncompressed output size:");
    println!("  Hemispherical:   {:>12} bytes ({:.2} MB)", hemi_disk, mb(hemi_disk));
    println!("  Equirectangular: {:>12} bytes ({:.2} MB)", eq_disk, mb(eq_disk));

    if config.lmax >= 6 {
        println!();
        println!("Note: |Y_l0| exceeds 1 near the pole from l = 6; those samples are clamped to the unit disk.");
    }
}

fn mb(bytes: u64) -> f64 {
    bytes as f64 / 1024.0 / 1024.0
}
