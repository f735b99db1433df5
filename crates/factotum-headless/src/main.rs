//! Headless scene runner
//!
//! Loads a scene, optionally replays a scripted command list, advances the
//! simulation for a fixed number of ticks and prints a summary.

use std::path::{Path, PathBuf};

use clap::Parser;
use factotum_core::command::Command;
use factotum_core::engine::Engine;
use factotum_data::DataLoadError;
use serde::Deserialize;

/// Headless Factotum runner
#[derive(Parser, Debug)]
#[command(name = "factotum-headless")]
#[command(about = "Run a factory scene without a renderer and report what it produced")]
struct Args {
    /// Scene file (.ron, .json or .toml) or a directory containing scene.*
    scene: PathBuf,

    /// Number of ticks to simulate
    #[arg(long, default_value_t = 240)]
    ticks: u64,

    /// Simulated seconds per tick
    #[arg(long, default_value_t = 0.25)]
    dt: f32,

    /// RON list of `(tick: N, command: ...)` steps submitted before tick N
    #[arg(long)]
    script: Option<PathBuf>,
}

/// One scripted command.
#[derive(Debug, Clone, Deserialize)]
struct ScriptStep {
    tick: u64,
    command: Command,
}

#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error(transparent)]
    Load(#[from] DataLoadError),

    #[error("could not read script {path}: {source}")]
    ScriptIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not parse script {path}: {detail}")]
    ScriptParse { path: PathBuf, detail: String },

    #[error("dt must be a positive finite number, got {0}")]
    BadStep(f32),
}

fn load_script(path: &Path) -> Result<Vec<ScriptStep>, RunError> {
    let content = std::fs::read_to_string(path).map_err(|source| RunError::ScriptIo {
        path: path.to_path_buf(),
        source,
    })?;
    let mut steps: Vec<ScriptStep> =
        ron::from_str(&content).map_err(|e| RunError::ScriptParse {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
    steps.sort_by_key(|s| s.tick);
    Ok(steps)
}

fn load_engine(scene: &Path) -> Result<Engine, RunError> {
    let data = if scene.is_dir() {
        factotum_data::load_scene_dir(scene)?
    } else {
        factotum_data::load_scene(scene)?
    };
    Ok(factotum_data::build_engine(&data)?)
}

fn run(args: &Args) -> Result<(), RunError> {
    if !(args.dt.is_finite() && args.dt > 0.0) {
        return Err(RunError::BadStep(args.dt));
    }

    let mut engine = load_engine(&args.scene)?;
    let script = match &args.script {
        Some(path) => load_script(path)?,
        None => Vec::new(),
    };

    let mut steps = script.into_iter().peekable();
    let mut spawned = 0usize;
    let mut consumed = 0usize;
    let mut dropped = 0usize;

    for tick in 0..args.ticks {
        while let Some(step) = steps.next_if(|s| s.tick <= tick) {
            engine.submit(step.command);
        }

        let report = engine.tick(args.dt);
        for outcome in &report.commands {
            tracing::info!(tick, ?outcome, "command applied");
        }
        spawned += report.spawned.len();
        consumed += report.transport.consumed.len();
        dropped += report.transport.dropped.len();
    }

    tracing::info!(
        ticks = args.ticks,
        time = engine.time(),
        hash = engine.state_hash(),
        "run finished"
    );

    println!("ticks:     {}", engine.tick_count());
    println!("time:      {:.2}", engine.time());
    println!("buildings: {}", engine.objects().len());
    println!("particles: {} in flight", engine.particles().len());
    println!("spawned:   {spawned}");
    println!("consumed:  {consumed}");
    println!("dropped:   {dropped}");
    for processor in engine.objects().processors() {
        let ore = processor.as_processor().map_or(0, |p| p.ore_arrivals.len());
        println!(
            "processor {} at ({}, {}): {ore} ore",
            processor.id.0, processor.position.x, processor.position.z
        );
    }
    println!("state hash: {:016x}", engine.state_hash());

    Ok(())
}

fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("factotum=info")),
        )
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "run failed");
            eprintln!("error: {e}");
            std::process::ExitCode::FAILURE
        }
    }
}
