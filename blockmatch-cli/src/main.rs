use blockmatch::io::load_rgb_frame;
use blockmatch::{
    ActionMode, FsStore, MotionEngine, ScanRequest, TrackingMode,
};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Block-matching motion scan between two frames")]
struct Cli {
    /// Reference ("previous") frame image file.
    previous: PathBuf,
    /// Current frame image file.
    current: PathBuf,
    /// Search range around the block, in pixels.
    #[arg(long, default_value_t = 64)]
    scan_range: i32,
    /// Tracked block size, in pixels.
    #[arg(long, default_value_t = 128)]
    block_size: i32,
    /// Block center x; defaults to the frame center.
    #[arg(long)]
    block_x: Option<i32>,
    /// Block center y; defaults to the frame center.
    #[arg(long)]
    block_y: Option<i32>,
    /// Also search rotation hypotheses within this half-range (degrees).
    #[arg(long)]
    rotation_range: Option<f64>,
    /// Stop at integer-pixel resolution.
    #[arg(long)]
    pixel_only: bool,
    /// Directory for Save/Load tracking side files.
    #[arg(long)]
    store_dir: Option<PathBuf>,
    /// Save the result under --source-position after scanning.
    #[arg(long, requires = "store_dir")]
    save: bool,
    /// Load the result for --source-position instead of scanning.
    #[arg(long, requires = "store_dir", conflicts_with = "save")]
    load: bool,
    /// Position key for Save/Load.
    #[arg(long, default_value_t = 0)]
    source_position: i64,
    /// Worker thread count; defaults to the number of processors.
    #[arg(long)]
    workers: Option<usize>,
    /// Enable tracing output (also honors RUST_LOG).
    #[arg(long)]
    trace: bool,
}

fn run(cli: Cli) -> Result<(), String> {
    let previous = load_rgb_frame(&cli.previous).map_err(|err| err.to_string())?;
    let current = load_rgb_frame(&cli.current).map_err(|err| err.to_string())?;
    let prev = previous.view();
    let cur = current.view();

    let mut engine = match cli.workers {
        Some(workers) => MotionEngine::with_workers(workers),
        None => MotionEngine::new(),
    }
    .map_err(|err| err.to_string())?;
    if let Some(dir) = &cli.store_dir {
        engine = engine.with_store(Box::new(FsStore::new(dir)));
    }

    let request = ScanRequest {
        scan_w: cli.scan_range,
        scan_h: cli.scan_range,
        block_w: cli.block_size,
        block_h: cli.block_size,
        block_x: cli.block_x.unwrap_or(cur.width() as i32 / 2),
        block_y: cli.block_y.unwrap_or(cur.height() as i32 / 2),
        tracking: if cli.load {
            TrackingMode::Load
        } else if cli.save {
            TrackingMode::Save
        } else {
            TrackingMode::Calculate
        },
        action: if cli.pixel_only {
            ActionMode::StabilizePixel
        } else {
            ActionMode::Stabilize
        },
        source_position: cli.source_position,
        do_rotation: cli.rotation_range.is_some(),
        rotation_range: cli.rotation_range.unwrap_or(0.0),
        ..ScanRequest::default()
    };

    let result = engine
        .scan(&prev, &cur, &request)
        .map_err(|err| err.to_string())?;

    if result.failed {
        println!("scan failed: not enough detail to track");
    }
    println!(
        "dx = {:+.2} px ({:+} quarter-px)",
        result.dx_pixels(),
        result.dx
    );
    println!(
        "dy = {:+.2} px ({:+} quarter-px)",
        result.dy_pixels(),
        result.dy
    );
    if request.do_rotation {
        println!("dr = {:+.3} deg", result.dr_deg);
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .init();
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}
