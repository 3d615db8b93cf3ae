//! OS resource simulator CLI.
//!
//! This binary drives one simulation run. It performs:
//! 1. **Configuration:** Start from a preset, a JSON document or the defaults, then apply
//!    individual flag overrides and validate the result.
//! 2. **Run:** Step the simulator to completion (or the tick limit), compacting contiguous
//!    memory at the requested ticks.
//! 3. **Report:** Print the results as text or JSON and optionally export the metric history.
//!
//! Logs go to stderr and are controlled with `RUST_LOG` (e.g. `RUST_LOG=ossim_core=debug`).

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::{fs, process};

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ossim_core::common::{Pid, Tick};
use ossim_core::config::{Config, EvictionPolicy, MemoryMode, PlacementPolicy, Preset};
use ossim_core::mem::SecondaryMetric;
use ossim_core::sim::{RunOutcome, Simulator};
use ossim_core::stats::{History, RunResults};

/// Exit code for a rejected configuration.
const EXIT_CONFIG: i32 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "ossim",
    author,
    version,
    about = "Deterministic OS memory, scheduling and I/O simulator",
    long_about = "Simulate contiguous or paged memory, round-robin scheduling and a shared peripheral over a seeded synthetic workload.\n\nExamples:\n  ossim run --preset paged-fifo\n  ossim run --mode contiguous --placement worst --compact-at 40\n  ossim run --config run.json --json --history history.json"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one simulation and print its results.
    Run(RunArgs),
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Start from a preset: contiguous-first, contiguous-best, paged, paged-fifo.
    #[arg(long, conflicts_with = "config")]
    preset: Option<String>,

    /// Start from a JSON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Memory mode: contiguous or paged.
    #[arg(long)]
    mode: Option<String>,

    /// Placement policy for contiguous memory: first, best, worst.
    #[arg(long)]
    placement: Option<String>,

    /// Total memory size in allocation units.
    #[arg(long)]
    total: Option<usize>,

    /// Page and frame size for paged memory.
    #[arg(long)]
    page_size: Option<usize>,

    /// Enable FIFO page eviction.
    #[arg(long)]
    fifo: bool,

    /// Round-robin quantum in ticks.
    #[arg(short, long)]
    quantum: Option<u64>,

    /// Tick budget used to spread arrivals.
    #[arg(long)]
    ticks: Option<u64>,

    /// Number of synthesized processes.
    #[arg(short, long)]
    workload: Option<usize>,

    /// Workload generator seed.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Compact contiguous memory before simulating this tick (repeatable).
    #[arg(long = "compact-at", value_name = "TICK")]
    compact_at: Vec<Tick>,

    /// Print the results as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Write the per-tick metric history as JSON to this file.
    #[arg(long, value_name = "PATH")]
    history: Option<PathBuf>,
}

/// Machine-readable report printed with `--json`.
#[derive(Serialize)]
struct Report<'a> {
    outcome: &'static str,
    finalized: &'a [Pid],
    results: &'a RunResults,
}

/// History export written with `--history`.
#[derive(Serialize)]
struct HistoryExport<'a> {
    metric: &'static str,
    history: &'a History,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => cmd_run(&args),
    }
}

/// Prints a configuration error and exits with [`EXIT_CONFIG`].
fn reject(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {message}");
    process::exit(EXIT_CONFIG);
}

/// Builds the run configuration from the base source and flag overrides.
fn build_config(args: &RunArgs) -> Config {
    let mut config = if let Some(name) = &args.preset {
        let preset: Preset = name.parse().unwrap_or_else(|e| reject(e));
        Config::preset(preset)
    } else if let Some(path) = &args.config {
        let text = fs::read_to_string(path)
            .unwrap_or_else(|e| reject(format!("reading {}: {e}", path.display())));
        Config::from_json(&text).unwrap_or_else(|e| reject(e))
    } else {
        Config::default()
    };

    if let Some(mode) = &args.mode {
        config.memory.mode = mode.parse::<MemoryMode>().unwrap_or_else(|e| reject(e));
    }
    if let Some(placement) = &args.placement {
        config.memory.placement = placement
            .parse::<PlacementPolicy>()
            .unwrap_or_else(|e| reject(e));
    }
    if let Some(total) = args.total {
        config.memory.total_size = total;
    }
    if let Some(page_size) = args.page_size {
        config.memory.page_size = page_size;
    }
    if args.fifo {
        config.memory.eviction = EvictionPolicy::Fifo;
    }
    if let Some(quantum) = args.quantum {
        config.scheduler.quantum = quantum;
    }
    if let Some(ticks) = args.ticks {
        config.general.tick_budget = ticks;
    }
    if let Some(workload) = args.workload {
        config.general.workload_size = workload;
    }
    if let Some(seed) = args.seed {
        config.general.seed = seed;
    }

    if let Err(e) = config.validate() {
        reject(e);
    }
    config
}

/// Runs the simulation loop and reports the results.
fn cmd_run(args: &RunArgs) {
    let config = build_config(args);
    let max_ticks = config.general.max_ticks;
    let mut sim = Simulator::new(config).unwrap_or_else(|e| reject(e));

    let compact_at: BTreeSet<Tick> = args.compact_at.iter().copied().collect();
    if !compact_at.is_empty() && sim.memory().as_contiguous().is_none() {
        warn!("--compact-at ignored: memory is paged");
    }

    let outcome = loop {
        if sim.is_finished() {
            break RunOutcome::Completed;
        }
        if sim.now() >= max_ticks {
            break RunOutcome::TickLimit;
        }
        if compact_at.contains(&sim.now()) && sim.compact() {
            info!(tick = sim.now(), "compacted memory");
        }
        sim.step();
    };

    let results = sim.results();
    let outcome_name = match outcome {
        RunOutcome::Completed => "completed",
        RunOutcome::TickLimit => "tick_limit",
    };

    if args.json {
        let report = Report {
            outcome: outcome_name,
            finalized: sim.finalized(),
            results: &results,
        };
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("Error: serializing results: {e}");
                process::exit(1);
            }
        }
    } else {
        if outcome == RunOutcome::TickLimit {
            println!("[!] Tick limit {max_ticks} reached before every process finished");
        }
        println!("\n{results}");
    }

    if let Some(path) = &args.history {
        let export = HistoryExport {
            metric: sim
                .history()
                .secondary
                .first()
                .map_or("none", SecondaryMetric::label),
            history: sim.history(),
        };
        let written = serde_json::to_string_pretty(&export)
            .map_err(|e| e.to_string())
            .and_then(|text| fs::write(path, text).map_err(|e| e.to_string()));
        if let Err(e) = written {
            eprintln!("Error: writing {}: {e}", path.display());
            process::exit(1);
        }
        info!(path = %path.display(), ticks = sim.history().len(), "history written");
    }
}
