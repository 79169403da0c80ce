use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use framecap::{CaptureOptions, EncodePath, FrameCapturer, FsDirectoryProvider, formats};

mod sketch;

use crate::sketch::SketchHost;

#[derive(Parser, Debug)]
#[command(name = "framecap", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the supported output formats.
    Formats(FormatsArgs),
    /// Capture frames of the built-in sketch into a directory.
    Capture(CaptureArgs),
}

#[derive(Parser, Debug)]
struct FormatsArgs {
    /// Print the registry as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Parser, Debug)]
struct CaptureArgs {
    /// Output directory (created if missing).
    #[arg(long)]
    out: PathBuf,

    /// Capture options JSON; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format (png, jpeg, webp, webp-lossless).
    #[arg(long)]
    format: Option<String>,

    /// Stop after this many frames (0 = until Ctrl-C).
    #[arg(long)]
    frames: Option<u64>,

    /// Maximum concurrent file writes (0 = unbounded).
    #[arg(long)]
    parallel_writes: Option<usize>,

    /// Canvas size as WIDTHxHEIGHT.
    #[arg(long, default_value = "320x240", value_parser = parse_size)]
    size: (u32, u32),

    /// Sketch frame rate while not capturing.
    #[arg(long, default_value_t = 60)]
    fps: u32,
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let w: u32 = w.trim().parse().map_err(|e| format!("bad width '{w}': {e}"))?;
    let h: u32 = h.trim().parse().map_err(|e| format!("bad height '{h}': {e}"))?;
    if w == 0 || h == 0 {
        return Err("width and height must be non-zero".to_string());
    }
    Ok((w, h))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Formats(args) => cmd_formats(args),
        Command::Capture(args) => cmd_capture(args).await,
    }
}

fn cmd_formats(args: FormatsArgs) -> anyhow::Result<()> {
    if args.json {
        let entries: Vec<_> = formats()
            .iter()
            .map(|d| {
                serde_json::json!({
                    "id": d.id,
                    "label": d.label,
                    "extension": d.extension,
                    "encoder": encoder_name(d.path),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for d in formats() {
        println!(
            "{:<14} {:<16} .{:<5} {}",
            d.id.as_str(),
            d.label,
            d.extension,
            encoder_name(d.path)
        );
    }
    Ok(())
}

fn encoder_name(path: EncodePath) -> &'static str {
    match path {
        EncodePath::Raster { mime } => mime,
        EncodePath::BinaryCodec => "lossless codec module",
    }
}

async fn cmd_capture(args: CaptureArgs) -> anyhow::Result<()> {
    let mut options = match &args.config {
        Some(path) => CaptureOptions::from_path(path)?,
        None => CaptureOptions::default(),
    };
    if let Some(format) = args.format {
        options.format = format;
    }
    if let Some(frames) = args.frames {
        options.frames = Some(frames);
    }
    if let Some(limit) = args.parallel_writes {
        options.parallel_write_limit = limit;
    }

    let (width, height) = args.size;
    let interval = Duration::from_secs_f64(1.0 / f64::from(args.fps.max(1)));
    let host = Arc::new(SketchHost::new(width, height, interval));
    let capturer = FrameCapturer::new(
        host.clone(),
        Arc::new(FsDirectoryProvider::new(&args.out)),
    );

    let runner = tokio::spawn({
        let host = host.clone();
        async move { host.run().await }
    });

    capturer
        .start(options)
        .await
        .with_context(|| format!("start capture into '{}'", args.out.display()))?;

    let mut updates = capturer.subscribe();
    loop {
        let state = updates.borrow_and_update().clone();
        eprint!("\r{state}    ");
        if !state.is_capturing {
            break;
        }
        tokio::select! {
            res = tokio::signal::ctrl_c() => {
                res.context("listen for Ctrl-C")?;
                eprintln!();
                tracing::info!("interrupted");
                capturer.stop();
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    eprintln!();

    capturer.drain().await;
    host.close();
    runner.await.context("sketch task")?;

    let state = capturer.state();
    eprintln!(
        "wrote {} frame(s) to {}",
        state.frame_count,
        args.out.display()
    );
    Ok(())
}
