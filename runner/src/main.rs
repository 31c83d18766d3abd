use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use engine::constants::DEFAULT_MAX_TICKS;
use runner::{BatchOptions, init_tracing, load_config, load_mission, run_batch};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless tactical mission runner", long_about = None)]
struct Args {
    // Mission file (JSON)
    mission: PathBuf,

    // Seed of the first run
    #[arg(short, long, default_value_t = 1)]
    seed: u64,

    // Number of runs over consecutive seeds
    #[arg(short, long, default_value_t = 1)]
    runs: u32,

    // Stop a run that has not ended after this many ticks
    #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
    max_ticks: u64,

    // Let the AI drive the crew
    #[arg(long, default_value_t = false)]
    autopilot: bool,

    // Debug-level logging
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    // Print the report as JSON instead of text
    #[arg(long, default_value_t = false)]
    json: bool,

    // Rules file replacing the mission's own config block
    #[arg(long)]
    config: Option<PathBuf>,
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut spec = load_mission(&args.mission)?;
    if let Some(path) = &args.config {
        spec.config = load_config(path)?;
    }
    if args.autopilot {
        spec.config.crew_autopilot = true;
    }

    info!(mission = %spec.name, seed = args.seed, runs = args.runs, "starting");
    let options = BatchOptions {
        seed: args.seed,
        runs: args.runs,
        max_ticks: args.max_ticks,
    };
    let report = run_batch(&spec, &options)?;

    if args.json {
        let text = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
        println!("{text}");
    } else {
        print!("{report}");
    }
    Ok(())
}
