mod sim;

use anyhow::Context;
use blockshift_config::Definitions;
use clap::{Parser, Subcommand};
use sim::Simulation;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "blockshift-cli", about = "CLI tool for blockshift block rules")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print engine version and crate info
    Info,
    /// Check a definitions file and list every problem in it
    Validate {
        /// YAML or JSON definitions file
        file: PathBuf,
    },
    /// Run a definitions file's scene and script on an in-memory world
    Simulate {
        /// YAML or JSON definitions file
        file: PathBuf,
        /// Number of ticks to simulate
        #[arg(short, long, default_value = "10")]
        ticks: u64,
        /// Game time per tick in milliseconds
        #[arg(long, default_value = "1000")]
        step_ms: u64,
        /// Override the document's seed
        #[arg(short, long)]
        seed: Option<u64>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("blockshift-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", blockshift_common::crate_info());
            println!("kernel: {}", blockshift_kernel::crate_info());
            println!("rules: {}", blockshift_rules::crate_info());
            println!("animate: {}", blockshift_animate::crate_info());
            println!("config: {}", blockshift_config::crate_info());
            println!("engine: {}", blockshift_engine::crate_info());
        }
        Commands::Validate { file } => {
            let defs = Definitions::read(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let problems = defs.problems();
            let rules: usize = defs.blocks.values().map(|b| b.rules.len()).sum();
            let sequences = defs.blocks.values().filter(|b| b.sequence.is_some()).count();
            println!(
                "{}: blocks={} rules={} sequences={} scene={} script={}",
                file.display(),
                defs.blocks.len(),
                rules,
                sequences,
                defs.scene.len(),
                defs.script.len()
            );
            for problem in &problems {
                println!("  error: {problem}");
            }
            if !problems.is_empty() {
                anyhow::bail!("{} problem(s) in {}", problems.len(), file.display());
            }
            println!("OK");
        }
        Commands::Simulate {
            file,
            ticks,
            step_ms,
            seed,
        } => {
            let defs = Definitions::load(&file)
                .with_context(|| format!("loading {}", file.display()))?;
            println!("Simulate: file={}, ticks={ticks}, step_ms={step_ms}", file.display());

            let mut sim = Simulation::new(defs, seed)?;
            let report = sim.run(ticks, step_ms)?;

            println!("Elapsed: {}ms", report.elapsed_ms);
            println!("Layout:");
            for (pos, block) in &report.layout {
                println!("  ({:>3}, {:>3}, {:>3}) {block}", pos.x, pos.y, pos.z);
            }
            println!("Completed sequences: {}", report.completions.len());
            for done in &report.completions {
                println!("  {} at {}", done.entity, done.location);
            }
            println!("{}", report.summary);
            println!("State hash: {:#x}", report.state_hash);
        }
    }

    Ok(())
}
