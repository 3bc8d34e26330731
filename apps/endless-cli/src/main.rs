use clap::{Parser, Subcommand};
use endless_common::Viewport;
use endless_params::{ParamSpec, ParamStore, ParamValue, names};
use endless_render::{DebugBackend, ManualClock, ResizePolicy, Sketch, SketchOptions};
use endless_text::{BlockFontLoader, DEFAULT_FONT, FontRegistry};
use serde::Serialize;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "endless-cli", about = "Headless tool for the endless sketch")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Directory holding the font files
    #[arg(long, default_value = "./fonts")]
    fonts_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// List the built-in fonts and whether their files are present
    Fonts,
    /// Print the tunables with their bounds and defaults
    Params {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Run frames against the recording backend and print what was drawn
    Simulate {
        /// Number of frames to render
        #[arg(short, long, default_value = "3")]
        frames: u64,
        #[arg(long)]
        camera_z: Option<f32>,
        #[arg(long)]
        font: Option<String>,
        #[arg(long)]
        font_size: Option<f32>,
        #[arg(long)]
        font_width: Option<f32>,
        /// Word rendered into the off-screen target
        #[arg(long, default_value = "ENDLESS")]
        text: String,
        #[arg(long, default_value = "1280")]
        width: u32,
        #[arg(long, default_value = "720")]
        height: u32,
        /// fixed or track
        #[arg(long, default_value = "track")]
        resize: ResizePolicy,
        /// Print the backend calls recorded for each frame
        #[arg(long)]
        transcript: bool,
    },
}

#[derive(Serialize)]
struct ParamRow<'a> {
    #[serde(flatten)]
    spec: &'a ParamSpec,
    value: &'a ParamValue,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let registry = FontRegistry::builtin(&cli.fonts_dir);
    tracing::debug!("fonts dir: {}", registry.root().display());

    match cli.command {
        Commands::Info => {
            println!("endless-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("render: {}", endless_render::crate_info());
            println!("fonts dir: {}", registry.root().display());
            println!("default font: {DEFAULT_FONT}");
        }
        Commands::Fonts => {
            for asset in registry.assets() {
                let status = if asset.path.is_file() { "ok" } else { "missing" };
                println!("{:<12} {:<8} {}", asset.name, status, asset.path.display());
            }
        }
        Commands::Params { json } => {
            let store = ParamStore::with_defaults(registry.names(), DEFAULT_FONT)?;
            let rows: Vec<ParamRow<'_>> = store
                .specs()
                .filter_map(|spec| {
                    store
                        .get(&spec.name)
                        .map(|value| ParamRow { spec, value })
                })
                .collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for row in &rows {
                    println!("{:<10} = {}", row.spec.name, row.value);
                }
            }
        }
        Commands::Simulate {
            frames,
            camera_z,
            font,
            font_size,
            font_width,
            text,
            width,
            height,
            resize,
            transcript,
        } => {
            tracing::info!(
                "simulating {frames} frames at {width}x{height} ({resize} target)"
            );
            let clock = ManualClock::new();
            let options = SketchOptions {
                text,
                resize,
                show_text: false,
            };
            let mut sketch = Sketch::mount(
                clock.clone(),
                BlockFontLoader,
                registry,
                Viewport::new(width, height),
                options,
            )?;

            let params = sketch.params_mut();
            if let Some(z) = camera_z {
                params.set_number(names::CAMERA_Z, z)?;
            }
            if let Some(name) = font.as_deref() {
                params.set_choice(names::FONT, name)?;
            }
            if let Some(size) = font_size {
                params.set_number(names::FONT_SIZE, size)?;
            }
            if let Some(w) = font_width {
                params.set_number(names::FONT_WIDTH, w)?;
            }

            let mut backend = DebugBackend::new();
            for _ in 0..frames {
                let report = sketch.frame(&mut backend)?;
                println!(
                    "frame {:>3}  time={:.3}  cameraZ={:.1}  target={}x{}",
                    report.frame,
                    report.time,
                    report.camera_z,
                    report.target.width,
                    report.target.height
                );
                if transcript {
                    print!("{}", backend.transcript());
                }
                // Target contents survive; only the call log is per frame.
                backend.clear_calls();
                clock.advance(Duration::from_secs_f64(1.0 / 60.0));
            }
            if let Some(err) = sketch.text_error() {
                tracing::warn!("text update failed: {err}");
            }
            tracing::info!("simulation finished after {frames} frames");
            println!(
                "text regenerations: {}  triangles in target: {}",
                sketch.text().regenerations(),
                backend.target_triangles(sketch.composite().offscreen().texture())
            );
        }
    }

    Ok(())
}
