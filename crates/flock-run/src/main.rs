//! Flock Run - evaluates a simulation and dumps per-step outputs as JSON.
//!
//! Reads a `.flock` source file, compiles it, drives the evaluator for the
//! requested number of steps (optionally sleeping between steps) and writes
//! the ordered list of step outputs to a file or stdout.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flock_runtime::{Evaluator, Output};

#[derive(Parser, Debug)]
#[command(name = "flock-run")]
#[command(about = "Run a Flock agent simulation")]
struct Cli {
    /// Path to the .flock source file
    source: PathBuf,

    /// Number of simulation steps to run
    #[arg(long, default_value = "10")]
    steps: u64,

    /// Seed for the simulation's random number generator
    #[arg(long)]
    seed: Option<u64>,

    /// Milliseconds to sleep between steps (timer-driven stepping)
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Write the JSON step dump here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flock_run=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let source = match std::fs::read_to_string(&cli.source) {
        Ok(source) => source,
        Err(err) => {
            error!("failed to read {}: {}", cli.source.display(), err);
            std::process::exit(1);
        }
    };

    let program = match flock_compiler::parse(&source) {
        Ok(program) => program,
        Err(err) => {
            error!("{}", err);
            std::process::exit(1);
        }
    };

    let mut evaluator = match cli.seed {
        Some(seed) => Evaluator::with_seed(program, seed),
        None => Evaluator::new(program),
    };

    info!(steps = cli.steps, source = %cli.source.display(), "simulation starting");

    let mut outputs: Vec<Output> = Vec::with_capacity(cli.steps as usize);
    for step in 0..cli.steps {
        match evaluator.run(step) {
            Ok(output) => outputs.push(output),
            Err(err) => {
                error!("step {} failed: {}", step, err);
                std::process::exit(1);
            }
        }
        if let Some(interval) = cli.interval_ms {
            if step + 1 < cli.steps {
                std::thread::sleep(Duration::from_millis(interval));
            }
        }
    }

    let json = match serde_json::to_string_pretty(&outputs) {
        Ok(json) => json,
        Err(err) => {
            error!("failed to serialize outputs: {}", err);
            std::process::exit(1);
        }
    };

    match &cli.output {
        Some(path) => {
            if let Err(err) = std::fs::write(path, json) {
                error!("failed to write {}: {}", path.display(), err);
                std::process::exit(1);
            }
            info!(path = %path.display(), "output written");
        }
        None => println!("{}", json),
    }
}
