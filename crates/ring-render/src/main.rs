//! # Ring Captcha Batch Renderer
//!
//! Renders a batch of captcha images to a folder, together with a
//! `manifest.json` that records the ring count of every image.
//!
//! ## Usage
//! ```bash
//! # Ten images between 128 and 256 pixels
//! ring-render --count 10 --output renders/
//!
//! # Reproducible batch, direct brush stamping
//! ring-render --count 100 --seed 42 --direct
//! ```

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use ring_common::constants::{CAPTCHA_IMAGE_MIN_HEIGHT, CAPTCHA_IMAGE_MIN_WIDTH, image_format};
use ring_painter::{ComposerSettings, RandomSource, compose, encode_png};

/// Manifest file written next to the images
const MANIFEST_FILE: &str = "manifest.json";

/// RingCaptcha batch renderer
#[derive(Parser, Debug)]
#[command(name = "ring-render")]
#[command(author, version, about = "Render ring captcha samples", long_about = None)]
struct Args {
    /// Number of images to render
    #[arg(short, long, default_value = "10")]
    count: usize,

    /// Smallest image side in pixels
    #[arg(long, default_value = "128")]
    min_size: u32,

    /// Largest image side in pixels
    #[arg(long, default_value = "256")]
    max_size: u32,

    /// Output directory
    #[arg(short, long, default_value = "renders")]
    output: PathBuf,

    /// Number of threads (0 = auto-detect)
    #[arg(short, long, default_value = "0")]
    threads: usize,

    /// Stamp every brush directly instead of through the sample tile
    #[arg(long)]
    direct: bool,

    /// Blend overlapping stamps of one stroke
    #[arg(long)]
    blend: bool,

    /// Base seed; image n uses seed + n
    #[arg(long)]
    seed: Option<u64>,
}

/// One line of the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ManifestEntry {
    file: String,
    width: u32,
    height: u32,
    ring_count: u32,
}

/// Everything a worker needs to render one image
#[derive(Debug, Clone)]
struct RenderJob {
    min_size: u32,
    max_size: u32,
    settings: ComposerSettings,
    seed: Option<u64>,
}

impl RenderJob {
    fn from_args(args: &Args) -> Result<Self> {
        let min_side = CAPTCHA_IMAGE_MIN_WIDTH.max(CAPTCHA_IMAGE_MIN_HEIGHT);
        if args.min_size < min_side {
            bail!("--min-size must be at least {min_side}, got {}", args.min_size);
        }
        if args.max_size < args.min_size {
            bail!(
                "--max-size ({}) is smaller than --min-size ({})",
                args.max_size,
                args.min_size
            );
        }

        Ok(Self {
            min_size: args.min_size,
            max_size: args.max_size,
            settings: ComposerSettings {
                use_brush_sample: !args.direct,
                blend_strokes: args.blend,
            },
            seed: args.seed,
        })
    }

    /// Render image `n` and write it into `dir`
    fn render(&self, n: usize, dir: &Path) -> Result<ManifestEntry> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(n as u64)),
            None => StdRng::from_os_rng(),
        };

        let size = rng.uniform(self.min_size, self.max_size)?;
        let image = compose(size, size, &self.settings, &mut rng)?;
        let png = encode_png(image.canvas())?;

        let file = format!("{n}.{}", image_format::FILE_EXT);
        std::fs::write(dir.join(&file), &png)
            .with_context(|| format!("Failed to write {file}"))?;

        debug!(file = %file, size = size, ring_count = image.ring_count(), "Rendered");

        Ok(ManifestEntry {
            file,
            width: size,
            height: size,
            ring_count: image.ring_count(),
        })
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    let job = RenderJob::from_args(&args)?;

    let threads = if args.threads == 0 {
        num_cpus()
    } else {
        args.threads
    };

    println!("🎨 Ring Captcha Renderer");
    println!("========================");
    println!("Images: {}", args.count);
    println!("Size: {}..={} px", job.min_size, job.max_size);
    println!("Brush sample: {}", if args.direct { "off" } else { "on" });
    println!("Stroke blending: {}", if args.blend { "on" } else { "off" });
    println!("Threads: {}", threads);
    println!();

    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;

    let start = Instant::now();

    let pb = ProgressBar::new(args.count as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let manifest = (0..args.count)
        .into_par_iter()
        .progress_with(pb.clone())
        .map(|n| job.render(n, &args.output))
        .collect::<Result<Vec<_>>>()?;

    pb.finish_and_clear();

    let manifest_path = write_manifest(&args.output, &manifest)?;
    let elapsed = start.elapsed();

    info!(count = manifest.len(), elapsed_ms = elapsed.as_millis() as u64, "Batch rendered");

    println!("✅ Rendered {} images in {:.2}s", manifest.len(), elapsed.as_secs_f64());
    println!("📁 Output: {}", args.output.display());
    println!("📋 Manifest: {}", manifest_path.display());

    Ok(())
}

fn write_manifest(dir: &Path, entries: &[ManifestEntry]) -> Result<PathBuf> {
    let path = dir.join(MANIFEST_FILE);
    let json = serde_json::to_string_pretty(entries).context("Failed to serialize manifest")?;
    std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}
