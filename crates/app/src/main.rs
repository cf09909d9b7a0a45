mod trace;

use std::path::{Path, PathBuf};

use airsketch_core::{AppConfig, Session};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::trace::{RunSummary, Trace};

fn main() -> airsketch_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Demo {
            write_trace,
            export_dir,
            frame_rate,
        } => run_demo(write_trace.as_deref(), export_dir, frame_rate),
        Commands::Replay { trace, config } => run_replay(&trace, config.as_deref()),
    }
}

fn run_demo(
    write_trace: Option<&Path>,
    export_dir: Option<PathBuf>,
    frame_rate: u32,
) -> airsketch_core::Result<()> {
    let mut config = AppConfig::default();
    if export_dir.is_some() {
        config.audio.export_dir = export_dir;
    }
    tracing::info!(frame_rate, "starting demo session");

    let mut session = Session::new(&config)?;
    let trace = Trace::demo(frame_rate, session.tool().distance_from_camera());
    if let Some(path) = write_trace {
        trace.save(path)?;
        tracing::info!(?path, frames = trace.frames.len(), "trace written");
    }

    let summary = trace::run(&mut session, &trace, config.audio.sample_rate)?;
    report(&summary);
    Ok(())
}

fn run_replay(trace_path: &Path, config_path: Option<&Path>) -> airsketch_core::Result<()> {
    let config = match config_path {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    let trace = Trace::load(trace_path)?;
    tracing::info!(?trace_path, frames = trace.frames.len(), "replaying trace");

    let mut session = Session::new(&config)?;
    let summary = trace::run(&mut session, &trace, config.audio.sample_rate)?;
    report(&summary);
    Ok(())
}

fn report(summary: &RunSummary) {
    tracing::info!(
        frames = summary.frames,
        points = summary.points,
        segments = summary.segments,
        lines = summary.lines,
        cursor = summary.cursor,
        completed = summary.completed,
        "session finished"
    );
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Draw lines in the air and narrate them", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Draw a ring while narrating, then trace it again to hear it back.
    Demo {
        /// Save the generated trace as JSON.
        #[arg(long)]
        write_trace: Option<PathBuf>,
        /// Directory for the exported narration.
        #[arg(long)]
        export_dir: Option<PathBuf>,
        #[arg(long, default_value_t = 60)]
        frame_rate: u32,
    },
    /// Run a recorded trace of poses and gestures through a session.
    Replay {
        /// Path to the trace JSON document.
        trace: PathBuf,
        /// Optional configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}
