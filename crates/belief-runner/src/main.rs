//! Belief Spread Simulation
//!
//! Runs a scenario file and writes the step-by-step history as JSON.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use belief_runner::config::DEFAULT_SCENARIO_PATH;
use belief_runner::{run_scenario, succeeded, Scenario};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Command line arguments for the simulation
#[derive(Parser, Debug)]
#[command(name = "belief_spread")]
#[command(about = "Simulates beliefs spreading through a social network")]
struct Args {
    /// Scenario file (defaults to scenario.toml, or a built-in demo if absent)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed for reproducibility (overrides the scenario)
    #[arg(long)]
    seed: Option<u64>,

    /// Number of steps to simulate (overrides the scenario)
    #[arg(long)]
    steps: Option<u64>,

    /// Worker threads, 0 for one per core (overrides the scenario)
    #[arg(long)]
    threads: Option<usize>,

    /// Write pretty JSON here instead of compact JSON to stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let mut scenario = match &args.config {
        Some(path) => Scenario::load(path)
            .with_context(|| format!("loading scenario {}", path.display()))?,
        None => Scenario::load_or_default(DEFAULT_SCENARIO_PATH)
            .with_context(|| format!("loading scenario {DEFAULT_SCENARIO_PATH}"))?,
    };
    if let Some(seed) = args.seed {
        scenario.simulation.seed = seed;
    }
    if let Some(steps) = args.steps {
        scenario.simulation.steps = steps;
    }
    if let Some(threads) = args.threads {
        scenario.simulation.worker_threads = threads;
    }

    info!(
        seed = scenario.simulation.seed,
        steps = scenario.simulation.steps,
        agents = scenario.agents.len(),
        beliefs = scenario.beliefs.len(),
        behaviours = scenario.behaviours.len(),
        "starting scenario"
    );

    let export = run_scenario(&scenario).context("preparing scenario")?;

    match &args.output {
        Some(path) => {
            let json = export.to_json_pretty().context("serializing history")?;
            fs::write(path, json)
                .with_context(|| format!("writing history to {}", path.display()))?;
            info!(path = %path.display(), steps = export.steps.len(), "history written");
        }
        None => {
            let json = serde_json::to_string(&export).context("serializing history")?;
            println!("{json}");
        }
    }

    if !succeeded(&export) {
        bail!(
            "simulation failed after step {}: {}",
            export.steps.len().saturating_sub(1),
            export.failure.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}
