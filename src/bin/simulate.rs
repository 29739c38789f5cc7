// src/bin/simulate.rs
//
// Run a profile document through the simulator and print a digest.
//
// Run examples:
//   cargo run --bin simulate -- profiles/kai.yaml -i 10000 --seed 42
//   TANZO_SIM_THREADS=4 cargo run --bin simulate -- profiles/kai.yaml --seed 7 -o out.json
//   cargo run --bin simulate -- profiles/kai.yaml --format yaml -o out.yaml --quiet
//
// Exit codes: 0 ok, 2 bad arguments / profile / settings, 1 run or write failure.

use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser};

use tanzo_sim::config::{ResolvedSettings, SimulationParameters};
use tanzo_sim::io::{load_profile_document, write_report, OutputFormat};
use tanzo_sim::logging;
use tanzo_sim::report::{header_line, render_text};
use tanzo_sim::simulate::{SimConfig, Simulator};
use tanzo_sim::trial::StreamMode;

#[derive(Debug, Parser)]
#[command(
    name = "simulate",
    about = "Monte Carlo simulation over a personality profile",
    version
)]
struct Args {
    /// Profile document (YAML, or JSON when the name ends in .json).
    profile: PathBuf,

    /// Number of trials. Overrides TANZO_SIM_ITERATIONS and the document.
    #[arg(short = 'i', long = "iterations")]
    iterations: Option<u64>,

    /// Deterministic seed. Overrides TANZO_SIM_SEED and the document.
    #[arg(long)]
    seed: Option<u64>,

    /// Worker threads (>= 1). Overrides TANZO_SIM_THREADS and the document.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    threads: Option<u64>,

    /// Random stream layout. Multi-threaded runs always use per-trial.
    #[arg(long, value_enum, default_value_t = StreamMode::Shared)]
    streams: StreamMode,

    /// Report format for -o (default: from the output extension).
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Write the full report here.
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Accept zero trials and report empty statistics.
    #[arg(long)]
    allow_empty: bool,

    /// Include every trial in the written report.
    #[arg(long)]
    retain_trials: bool,

    /// Print only the header line.
    #[arg(long)]
    quiet: bool,

    /// Verbosity: -v, -vv
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let args = Args::parse();
    logging::init(args.verbose);

    let doc = match load_profile_document(&args.profile) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("error: {e:#}");
            process::exit(2);
        }
    };

    let cli = SimulationParameters {
        iterations: args.iterations,
        seed: args.seed,
        threads: args.threads.map(|t| t as usize),
    };
    let settings = ResolvedSettings::resolve(&cli, &doc.parameters());
    settings.log_startup();

    let config = settings.apply(
        SimConfig::default()
            .with_streams(args.streams)
            .allow_empty(args.allow_empty)
            .retain_trials(args.retain_trials),
    );

    let report = match Simulator::new(config).run(&doc.profile) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(e.exit_code());
        }
    };

    println!("{}", header_line(&report));
    if !args.quiet {
        println!();
        print!("{}", render_text(&report));
    }

    if let Some(path) = &args.output {
        let format = args
            .format
            .unwrap_or_else(|| OutputFormat::from_path(path));
        if let Err(e) = write_report(path, &report, format) {
            eprintln!("error: {e:#}");
            process::exit(1);
        }
        println!("Wrote: {}", path.display());
    }
}
