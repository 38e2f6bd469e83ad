//! Command-line dispatcher. Results go to stdout as JSON; diagnostics and logs go to stderr.

use std::io;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::OptimizerConfig;
use crate::data::candidate::Candidate;
use crate::data::loader::load_pool;
use crate::data::synthetic::{generate_pool, SyntheticPoolSpec};
use crate::data::validate::{validate_pool, ValidationSeverity};
use crate::error::SquadError;
use crate::optimizer::ranking::{
    bottom_candidates, prediction_summary, top_candidates, RankedCandidate,
};
use crate::optimizer::{optimize_multiple, optimize_squad, OptimizationRequest};
use crate::parallel::{sweep_budgets, BudgetSweepRow, WorkerPool};

/// Quartermaster - budget-constrained squad selection over predicted scores.
#[derive(Parser, Debug)]
#[command(name = "quartermaster")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to a YAML optimizer config (falls back to QUARTERMASTER_CONFIG)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Solve for the single best squad
    Solve(SolveArgs),
    /// Generate several disjoint squads
    Generate(GenerateArgs),
    /// List the highest predicted scores
    Top(RankArgs),
    /// List the lowest predicted scores
    Bottom(RankArgs),
    /// List both the highest and the lowest predicted scores
    Predictions(RankArgs),
    /// Solve under several budget caps in parallel
    Sweep(SweepArgs),
    /// Check a pool file for problems
    Validate(PoolArg),
    /// Generate squads from a seeded synthetic pool
    Demo(DemoArgs),
}

#[derive(Args, Debug)]
pub struct PoolArg {
    /// Candidate pool file (.json or .csv)
    pub pool: PathBuf,
}

#[derive(Args, Debug)]
pub struct SolveArgs {
    /// Candidate pool file (.json or .csv)
    pub pool: PathBuf,

    /// Override the budget cap
    #[arg(long)]
    pub budget: Option<Decimal>,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Candidate pool file (.json or .csv)
    pub pool: PathBuf,

    /// Override the budget cap
    #[arg(long)]
    pub budget: Option<Decimal>,

    /// Number of squads to generate
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct RankArgs {
    /// Candidate pool file (.json or .csv)
    pub pool: PathBuf,

    /// Number of candidates to list
    #[arg(long, default_value_t = 10)]
    pub limit: usize,
}

#[derive(Args, Debug)]
pub struct SweepArgs {
    /// Candidate pool file (.json or .csv)
    pub pool: PathBuf,

    /// Comma-separated budget caps
    #[arg(long, value_delimiter = ',', required = true)]
    pub budgets: Vec<Decimal>,

    /// Worker threads (0 uses every core)
    #[arg(long, default_value_t = 0)]
    pub workers: usize,
}

#[derive(Args, Debug)]
pub struct DemoArgs {
    #[arg(long, default_value_t = 7)]
    pub seed: u64,

    /// Clubs in the synthetic league
    #[arg(long, default_value_t = 20)]
    pub clubs: usize,

    /// Override the budget cap
    #[arg(long)]
    pub budget: Option<Decimal>,

    /// Number of squads to generate
    #[arg(long)]
    pub count: Option<usize>,
}

pub fn run_with_args(args: &[String]) -> i32 {
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => return usage_exit_code(err.print(), err.exit_code()),
    };

    let mut config = match OptimizerConfig::resolve(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("config error: {err}");
            return 1;
        }
    };
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.init();

    match cli.command {
        Commands::Solve(args) => handle_solve(&config, args),
        Commands::Generate(args) => handle_generate(&config, args),
        Commands::Top(args) => handle_rank(args, top_candidates),
        Commands::Bottom(args) => handle_rank(args, bottom_candidates),
        Commands::Predictions(args) => handle_predictions(args),
        Commands::Sweep(args) => handle_sweep(&config, args),
        Commands::Validate(args) => handle_validate(&config, args),
        Commands::Demo(args) => handle_demo(&config, args),
    }
}

fn handle_solve(config: &OptimizerConfig, args: SolveArgs) -> i32 {
    let Some(pool) = read_pool(&args.pool) else {
        return 1;
    };
    let request = match build_request(config, args.budget, None) {
        Ok(request) => request,
        Err(err) => return report_failure("solve", &err),
    };

    match optimize_squad(&pool, &request) {
        Ok(squad) => print_json(&squad),
        Err(err) => report_failure("solve", &err),
    }
}

fn handle_generate(config: &OptimizerConfig, args: GenerateArgs) -> i32 {
    let Some(pool) = read_pool(&args.pool) else {
        return 1;
    };
    run_generation(&pool, config, args.budget, args.count)
}

fn handle_demo(config: &OptimizerConfig, args: DemoArgs) -> i32 {
    let pool = generate_pool(&SyntheticPoolSpec {
        seed: args.seed,
        clubs: args.clubs,
        ..SyntheticPoolSpec::default()
    });
    run_generation(&pool, config, args.budget, args.count)
}

fn run_generation(
    pool: &[Candidate],
    config: &OptimizerConfig,
    budget: Option<Decimal>,
    count: Option<usize>,
) -> i32 {
    let request = match build_request(config, budget, count) {
        Ok(request) => request,
        Err(err) => return report_failure("generate", &err),
    };

    let set = optimize_multiple(pool, &request);
    let status = print_json(&set);
    if set.is_empty() && request.squad_count > 0 {
        eprintln!("generate failed: no squad could be produced");
        return 1;
    }
    status
}

fn handle_rank(args: RankArgs, rank: fn(&[Candidate], usize) -> Vec<RankedCandidate>) -> i32 {
    match read_pool(&args.pool) {
        Some(pool) => print_json(&rank(&pool, args.limit)),
        None => 1,
    }
}

fn handle_predictions(args: RankArgs) -> i32 {
    match read_pool(&args.pool) {
        Some(pool) => print_json(&prediction_summary(&pool, args.limit)),
        None => 1,
    }
}

fn handle_sweep(config: &OptimizerConfig, args: SweepArgs) -> i32 {
    let Some(pool) = read_pool(&args.pool) else {
        return 1;
    };
    let request = match config.request() {
        Ok(request) => request,
        Err(err) => return report_failure("sweep", &err),
    };

    let results = sweep_budgets(
        &pool,
        &request.constraints,
        &args.budgets,
        &request.solver(),
        &WorkerPool::with_workers(args.workers),
    );
    let rows: Vec<BudgetSweepRow> = results.iter().map(|result| result.row()).collect();
    print_json(&rows)
}

fn handle_validate(config: &OptimizerConfig, args: PoolArg) -> i32 {
    let Some(pool) = read_pool(&args.pool) else {
        return 1;
    };
    let constraints = match config.constraints() {
        Ok(constraints) => constraints,
        Err(err) => return report_failure("validate", &err),
    };

    let report = validate_pool(&pool, &constraints);
    for diagnostic in &report.diagnostics {
        eprintln!("- {diagnostic}");
    }
    let status = print_json(&report);
    if report.has_errors() {
        eprintln!(
            "validation failed: {} error(s)",
            report.count(ValidationSeverity::Error)
        );
        return 1;
    }
    status
}

fn build_request(
    config: &OptimizerConfig,
    budget: Option<Decimal>,
    count: Option<usize>,
) -> Result<OptimizationRequest, SquadError> {
    let mut request = config.request()?;
    if let Some(budget_cap) = budget {
        request.constraints = request.constraints.with_budget_cap(budget_cap)?;
    }
    if let Some(count) = count {
        request.squad_count = count;
    }
    Ok(request)
}

fn read_pool(path: &Path) -> Option<Vec<Candidate>> {
    match load_pool(path) {
        Ok(pool) => Some(pool),
        Err(err) => {
            eprintln!("pool load failed: {err}");
            None
        }
    }
}

/// Help and version output exit 0 unless writing them failed.
fn usage_exit_code(printed: io::Result<()>, code: i32) -> i32 {
    match printed {
        Ok(()) => code,
        Err(err) => {
            eprintln!("failed to write usage: {err}");
            code.max(1)
        }
    }
}

fn report_failure(command: &str, err: &SquadError) -> i32 {
    eprintln!("{command} failed: {err}");
    1
}

fn print_json<T: Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize output: {err}");
            1
        }
    }
}
