//! lane-geometry CLI: run a lane session over a directory of frames.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use clap::Parser;
use lane_geometry::frame_io::{list_frames, load_frame, rgb_view, to_image_luma, to_image_rgb};
use lane_geometry::{ConfigIoError, LaneSession, SessionConfig, SessionError, SessionReport};
use log::LevelFilter;

#[cfg(feature = "tracing")]
use lane_geometry::core::init_tracing;
#[cfg(not(feature = "tracing"))]
use lane_geometry::core::init_with_level;

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error("no png/jpg frames found in {}", .0.display())]
    NoFrames(PathBuf),
    #[error("invalid log level '{0}'")]
    LogLevel(String),
    #[error("failed to read frame {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("failed to write frame {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("frame {} has unsupported dimensions", .0.display())]
    FrameSize(PathBuf),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigIoError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[cfg(not(feature = "tracing"))]
    #[error(transparent)]
    Logger(#[from] log::SetLoggerError),
}

#[derive(Parser, Debug)]
#[command(name = "lane-geometry")]
#[command(about = "Detect, track and measure the ego lane in a directory of frames")]
#[command(version)]
struct Cli {
    /// Directory with the input frames (png/jpg, processed in name order).
    #[arg(long)]
    frames: PathBuf,

    /// Session configuration (JSON). Missing fields take their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for annotated frames.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Directory for the bird's-eye lane masks the search ran on.
    #[arg(long)]
    mask_dir: Option<PathBuf>,

    /// Path of the JSON report. Printed to stdout when omitted.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Log level: off, error, warn, info, debug, trace.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit JSON log lines.
    #[cfg(feature = "tracing")]
    #[arg(long)]
    json_logs: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match init_logging(&cli).and_then(|()| run(&cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(not(feature = "tracing"))]
fn init_logging(cli: &Cli) -> Result<(), CliError> {
    let level =
        LevelFilter::from_str(&cli.log_level).map_err(|_| CliError::LogLevel(cli.log_level.clone()))?;
    init_with_level(level)?;
    Ok(())
}

#[cfg(feature = "tracing")]
fn init_logging(cli: &Cli) -> Result<(), CliError> {
    // RUST_LOG drives the subscriber; the flag is still validated.
    LevelFilter::from_str(&cli.log_level).map_err(|_| CliError::LogLevel(cli.log_level.clone()))?;
    let _ = tracing_log::LogTracer::init();
    init_tracing(cli.json_logs);
    Ok(())
}

#[cfg_attr(feature = "tracing", tracing::instrument(level = "info", skip_all))]
fn run(cli: &Cli) -> Result<(), CliError> {
    let config = match &cli.config {
        Some(path) => {
            log::info!("loading config {}", path.display());
            SessionConfig::load_json(path)?
        }
        None => SessionConfig::default(),
    };

    let frames = list_frames(&cli.frames)?;
    if frames.is_empty() {
        return Err(CliError::NoFrames(cli.frames.clone()));
    }
    log::info!("processing {} frames from {}", frames.len(), cli.frames.display());

    for dir in [&cli.output_dir, &cli.mask_dir].into_iter().flatten() {
        std::fs::create_dir_all(dir)?;
    }

    let mut session = LaneSession::new(config);
    let mut reports = Vec::with_capacity(frames.len());
    for path in &frames {
        let img = load_frame(path).map_err(|source| CliError::Decode {
            path: path.clone(),
            source,
        })?;
        let view = rgb_view(&img);
        let output = session.process_frame(&view)?;

        if let Some(dir) = &cli.output_dir {
            let annotated = session.render(&view, &output)?;
            let img = to_image_rgb(annotated).ok_or_else(|| CliError::FrameSize(path.clone()))?;
            save_png(&img, dir, path)?;
        }
        if let Some(dir) = &cli.mask_dir {
            let mask = to_image_luma(&output.detection.mask)
                .ok_or_else(|| CliError::FrameSize(path.clone()))?;
            save_png(&mask, dir, path)?;
        }
        reports.push(output.report);
    }

    let report = SessionReport::new(reports);
    log::info!(
        "done: {}/{} frames with lanes, {} alerts",
        report.summary.valid_frames,
        report.summary.frames,
        report.summary.alerts
    );

    match &cli.report {
        Some(path) => {
            report.write_json(path)?;
            log::info!("report written to {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

/// Save `img` as `<dir>/<source stem>.png`.
fn save_png<P>(
    img: &image::ImageBuffer<P, Vec<u8>>,
    dir: &Path,
    source: &Path,
) -> Result<(), CliError>
where
    P: image::PixelWithColorType<Subpixel = u8>,
{
    let name = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".to_string());
    let path = dir.join(format!("{name}.png"));
    img.save(&path)
        .map_err(|source| CliError::Encode { path, source })
}
