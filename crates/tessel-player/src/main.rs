use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use tessel_engine::coords::Viewport;
use tessel_engine::device::GpuInit;
use tessel_engine::logging::{init_logging, LoggingConfig};
use tessel_engine::render::{AtlasImage, PipelineConfig};
use tessel_engine::window::{Runtime, RuntimeConfig};
use tessel_host::{BridgeApp, StreamConfig, StreamLoop, WasmGuest};

#[derive(Debug, Parser)]
#[command(about = "Runs a tessel guest module in a window")]
struct Args {
    /// Guest module (binary `.wasm`).
    module: PathBuf,

    /// Sprite atlas bound at texture unit 0 (PNG or BMP). Defaults to a 1x1
    /// white texel.
    #[arg(long)]
    atlas: Option<PathBuf>,

    /// Logical canvas width in guest pixels.
    #[arg(long, default_value_t = 140.0)]
    width: f32,

    /// Logical canvas height in guest pixels.
    #[arg(long, default_value_t = 140.0)]
    height: f32,

    /// Physical window pixels per guest pixel.
    #[arg(long, default_value_t = 4.0)]
    scale: f64,

    /// Seed passed to `initialize` (31-bit). Random when omitted.
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=i32::MAX as i64))]
    seed: Option<u32>,

    #[arg(long, default_value = "tessel")]
    title: String,

    /// Log filter (`env_logger` syntax). Overrides `RUST_LOG`.
    #[arg(long)]
    log: Option<String>,

    /// GPU vertex buffer size in bytes.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_VERTEX_CAPACITY)]
    vertex_capacity: u64,
}

fn load_atlas(path: &Path) -> Result<AtlasImage> {
    let image = image::open(path)
        .with_context(|| format!("failed to decode atlas {}", path.display()))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    log::info!("atlas {}: {width}x{height}", path.display());
    AtlasImage::from_rgba8(width, height, image.into_raw())
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(LoggingConfig {
        env_filter: args.log.clone(),
        ..LoggingConfig::default()
    });

    let canvas = Viewport::new(args.width, args.height);
    let atlases = match &args.atlas {
        Some(path) => vec![load_atlas(path)?],
        None => Vec::new(),
    };

    let guest = WasmGuest::from_file(&args.module)
        .with_context(|| format!("failed to load guest {}", args.module.display()))?;

    let seed = args.seed.unwrap_or_else(|| rand::random::<u32>() >> 1);
    let stream = StreamLoop::start(
        guest,
        seed,
        StreamConfig {
            resolution: canvas,
            ..StreamConfig::default()
        },
    )
    .context("guest initialization failed")?;
    log::info!("guest {} started with seed {seed}", args.module.display());

    let app = BridgeApp::new(
        stream,
        PipelineConfig {
            vertex_capacity: args.vertex_capacity,
        },
        atlases,
    )?;

    Runtime::run(
        RuntimeConfig {
            title: args.title,
            canvas,
            display_scale: args.scale,
        },
        GpuInit::default(),
        app,
    )
}
