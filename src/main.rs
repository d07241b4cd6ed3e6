use banner_planner::report;
use banner_planner::sim::{self, SimInput};
use banner_planner::strategy::{BaseStrategy, StrategyConfig};
use banner_planner::worker::SharedProgress;
use banner_planner::{Config, SimError, SimWorker};
use clap::{Parser, Subcommand};
use log::{error, info};
use serde::Serialize;
use std::process::ExitCode;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "data/config.json")]
    config: String,

    /// Seed string; the same seed replays the same run
    #[arg(short, long)]
    seed: Option<String>,

    /// Number of trials (overrides the config)
    #[arg(short = 'n', long)]
    trials: Option<usize>,

    /// Base strategy, S1 or S2 (overrides the config)
    #[arg(long)]
    strategy: Option<BaseStrategy>,

    /// Shard trials across the worker pool
    #[arg(short, long)]
    parallel: bool,

    /// Print the raw JSON output instead of the report
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Clone)]
enum Commands {
    /// Resource-constrained run: what the stockpile secures
    Simulate,
    /// Full collection estimate: what must be topped up
    TopUp,
    /// Print the pull rate tables
    Rates,
}

fn scenario(args: &Args, config: &Config) -> SimInput {
    let mut input = config.scenario.clone();
    if let Some(seed) = &args.seed {
        input.seed = Some(seed.clone());
    }
    if let Some(trials) = args.trials {
        input.trials = trials as f64;
    }
    if let Some(base) = args.strategy {
        input.strategy_id = base;
        if let Some(custom) = input.strategy_config.as_mut() {
            let thresholds = StrategyConfig::for_base(base);
            custom.base_strategy = base;
            custom.character_banner_threshold = thresholds.character_banner_threshold;
        }
    }
    input
}

fn emit<T: Serialize>(value: &T, as_json: bool, render: impl Fn(&T) -> String) -> Result<(), SimError> {
    if as_json {
        let text = serde_json::to_string_pretty(value).map_err(|e| SimError::Failed(e.to_string()))?;
        println!("{}", text);
    } else {
        println!("{}", render(value));
    }
    Ok(())
}

fn log_progress(done: usize, total: usize) {
    info!("Progress: {}/{}", done, total);
}

fn run(args: &Args, config: &Config) -> Result<(), SimError> {
    let input = scenario(args, config);
    match args.command {
        Commands::Rates => {
            println!("{}", report::render_rates());
            Ok(())
        }
        Commands::Simulate if args.parallel => {
            let worker = SimWorker::new_with_config(&config.worker)?;
            let progress: SharedProgress<'_> = &log_progress;
            let output = worker.run_simulation(&input, Some(progress))?;
            emit(&output, args.json, report::render_simulation)
        }
        Commands::TopUp if args.parallel => {
            let worker = SimWorker::new_with_config(&config.worker)?;
            let progress: SharedProgress<'_> = &log_progress;
            let output = worker.run_top_up_simulation(&input, Some(progress))?;
            emit(&output, args.json, report::render_top_up)
        }
        Commands::Simulate => {
            let worker = SimWorker::new(1)?;
            let output = worker.execute(|| {
                let mut log = log_progress;
                let progress: &mut dyn FnMut(usize, usize) = &mut log;
                sim::run_simulation(&input, Some(progress))
            })?;
            emit(&output, args.json, report::render_simulation)
        }
        Commands::TopUp => {
            let worker = SimWorker::new(1)?;
            let output = worker.execute(|| {
                let mut log = log_progress;
                let progress: &mut dyn FnMut(usize, usize) = &mut log;
                sim::run_top_up_simulation(&input, Some(progress))
            })?;
            emit(&output, args.json, report::render_top_up)
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(&args, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
