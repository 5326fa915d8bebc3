//! Flying Sesame - pupil camera acquisition and recording
//!
//! Entry point for the `sesame` command-line tool.

mod presenter;
mod setup;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use sesame_acquire::{channels, AcquisitionController, AcquisitionMode, SessionOutcome};
use sesame_ai::ModelLocator;
use sesame_core::{FrameRate, SesameConfig};
use sesame_record::{extract_directories, RecordingPlan};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sesame", author, version, about = "Pupil camera acquisition and recording")]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Preview frames without recording
    Live {
        #[command(flatten)]
        acquire: AcquireArgs,

        /// Seconds to run before stopping
        #[arg(long, default_value_t = 10.0)]
        seconds: f64,

        /// Pause the preview for this many seconds halfway through
        #[arg(long)]
        pause: Option<f64>,
    },
    /// Record an experiment
    Record {
        #[command(flatten)]
        acquire: AcquireArgs,

        #[arg(long, value_enum, default_value_t = RecordMode::Manual)]
        mode: RecordMode,

        /// Frames to record
        #[arg(long)]
        frames: Option<u32>,

        /// Experiment name
        #[arg(long)]
        name: Option<String>,

        /// Directory the experiment folder is created in
        #[arg(long)]
        parent: Option<PathBuf>,

        /// Skip the composite video
        #[arg(long)]
        no_video: bool,

        /// Simulated trigger: idle samples before the line asserts
        #[arg(long, default_value_t = 50)]
        trigger_after: usize,
    },
    /// Fit pupils in directories of saved frames and write `<dir>.csv`
    Extract {
        #[arg(required = true)]
        dirs: Vec<PathBuf>,

        /// Pose model file
        #[arg(long)]
        model: Option<PathBuf>,
    },
    /// Show device status, model location and the effective configuration
    Status,
}

#[derive(Args, Debug)]
struct AcquireArgs {
    /// Frame rate in Hz
    #[arg(long)]
    rate: Option<f64>,

    /// Run the pose estimator and circle fit on every frame
    #[arg(long)]
    detect: bool,

    /// Pose model file
    #[arg(long)]
    model: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RecordMode {
    Manual,
    Triggered,
}

impl From<RecordMode> for AcquisitionMode {
    fn from(mode: RecordMode) -> Self {
        match mode {
            RecordMode::Manual => AcquisitionMode::Manual,
            RecordMode::Triggered => AcquisitionMode::Triggered,
        }
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Live {
            acquire,
            seconds,
            pause,
        } => live(apply(config, &acquire)?, seconds, pause),
        Command::Record {
            acquire,
            mode,
            frames,
            name,
            parent,
            no_video,
            trigger_after,
        } => {
            let mut config = apply(config, &acquire)?;
            if let Some(frames) = frames {
                config.acquisition.frame_count = frames;
            }
            if let Some(name) = name {
                config.recording.experiment_name = name;
            }
            if let Some(parent) = parent {
                config.recording.parent_dir = parent;
            }
            if no_video {
                config.recording.write_video = false;
            }
            record(config.normalized()?, mode.into(), trigger_after)
        }
        Command::Extract { dirs, model } => extract(&config, &dirs, model),
        Command::Status => status(config),
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<SesameConfig> {
    let config = match path {
        Some(p) => SesameConfig::load(p).with_context(|| format!("loading {}", p.display()))?,
        None => SesameConfig::load_default()?,
    };
    Ok(config)
}

fn apply(mut config: SesameConfig, args: &AcquireArgs) -> Result<SesameConfig> {
    if let Some(hz) = args.rate {
        if FrameRate::is_out_of_range(hz) {
            warn!(requested = hz, "Frame rate out of range, clamping");
        }
        config.acquisition.frame_rate = FrameRate::clamped(hz);
    }
    if args.detect {
        config.detection.enabled = true;
    }
    if args.model.is_some() {
        config.detection.model_path = args.model.clone();
    }
    Ok(config)
}

fn live(config: SesameConfig, seconds: f64, pause: Option<f64>) -> Result<()> {
    let fit_threshold = config.detection.fit_threshold;
    let (tx, rx) = channels();
    let presenter = presenter::spawn(rx, fit_threshold)?;
    let mut controller = AcquisitionController::new(setup::acquisition(config, 0)?, tx);

    controller.start(AcquisitionMode::LiveDisplay)?;
    let total = Duration::from_secs_f64(seconds.max(0.0));
    match pause {
        Some(p) => {
            std::thread::sleep(total / 2);
            controller.pause();
            info!(seconds = p, "Preview paused");
            std::thread::sleep(Duration::from_secs_f64(p.max(0.0)));
            controller.resume();
            std::thread::sleep(total / 2);
        }
        None => std::thread::sleep(total),
    }

    let outcome = controller.stop()?;
    drop(controller);
    let seen = presenter
        .join()
        .map_err(|_| anyhow::anyhow!("presenter thread panicked"))?;
    let acquired = seen.outcome.as_ref().map(SessionOutcome::frames);
    info!(previewed = seen.frames, acquired, "Live display stopped");
    if let Some(Err(e)) = outcome {
        bail!("live display failed: {e}");
    }
    Ok(())
}

fn record(config: SesameConfig, mode: AcquisitionMode, trigger_after: usize) -> Result<()> {
    let plan = RecordingPlan::new(
        config.acquisition.frame_count,
        config.acquisition.frame_rate,
        config.camera.width,
        config.camera.height,
        config.camera.channels,
    );
    info!(%mode, rate = %plan.rate, frames = plan.frames, "Recording plan: {}", plan);

    let fit_threshold = config.detection.fit_threshold;
    let (tx, rx) = channels();
    let presenter = presenter::spawn(rx, fit_threshold)?;
    let mut controller = AcquisitionController::new(setup::acquisition(config, trigger_after)?, tx);

    controller.start(mode)?;
    let result = controller.wait()?;
    drop(controller);
    let seen = presenter
        .join()
        .map_err(|_| anyhow::anyhow!("presenter thread panicked"))?;
    if let Some(message) = &seen.failure {
        error!("Acquisition reported: {}", message);
    }

    match result {
        Some(Ok(SessionOutcome::Completed(summary))) => {
            info!(
                experiment = %summary.experiment,
                dir = %summary.dir.display(),
                frames = summary.frames_written,
                previewed = seen.frames,
                "Recording complete"
            );
            if summary.failures.total() > 0 {
                warn!(failures = ?summary.failures, "Some writes failed");
            }
            Ok(())
        }
        Some(Ok(SessionOutcome::Cancelled { frames, reason, .. })) => {
            bail!("recording stopped after {frames} frames: {reason}")
        }
        Some(Err(e)) => Err(e.into()),
        None => bail!("no recording ran"),
    }
}

fn extract(config: &SesameConfig, dirs: &[PathBuf], model: Option<PathBuf>) -> Result<()> {
    let model = model.or_else(|| config.detection.model_path.clone());
    let mut estimator = setup::estimator(model.as_deref())?;
    let mut failed = 0;
    for (dir, result) in extract_directories(dirs, estimator.as_mut()) {
        match result {
            Ok(report) => info!(
                dir = %dir.display(),
                csv = %report.csv_path.display(),
                images = report.images,
                fitted = report.fitted,
                "Extracted"
            ),
            Err(e) => {
                error!(dir = %dir.display(), "Extraction failed: {}", e);
                failed += 1;
            }
        }
    }
    if failed > 0 {
        bail!("{failed} of {} directories failed", dirs.len());
    }
    Ok(())
}

fn status(config: SesameConfig) -> Result<()> {
    let (tx, _rx) = channels();
    let controller = AcquisitionController::new(setup::acquisition(config.clone(), 0)?, tx);
    if let Some(report) = controller.device_status() {
        info!(camera = %report.camera, trigger = %report.trigger, "Devices");
    }

    match ModelLocator::platform_default() {
        Some(locator) => info!(
            path = %locator.default_model_path().display(),
            cached = locator.is_cached(),
            "Pose model"
        ),
        None => info!("No cache directory for pose models"),
    }
    if let Some(path) = SesameConfig::default_path() {
        info!(path = %path.display(), exists = path.exists(), "Config file");
    }
    info!(
        rate = %config.acquisition.frame_rate,
        frames = config.acquisition.frame_count,
        experiment = %config.recording.experiment_name,
        parent = %config.recording.parent_dir.display(),
        "Configuration"
    );
    Ok(())
}
