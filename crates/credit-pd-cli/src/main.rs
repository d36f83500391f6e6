mod commands;
mod input;
mod output;
mod telemetry;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing::debug;

use credit_pd_core::config::EngineConfig;

use commands::grading::GradeArgs;
use commands::model::{AttributionArgs, CurveArgs, FlowArgs, ModelArgs, SensitivityArgs};
use commands::willingness::{AssessmentArgs, WillingnessArgs};

/// Student-loan probability-of-default composition
#[derive(Parser)]
#[command(
    name = "cpd",
    version,
    about = "Student-loan probability-of-default composition",
    long_about = "Enumerates study and employment outcomes for a student loan, scores \
                  ability to pay on each path with a logistic debt-service curve, \
                  composes it with a psychometric willingness grade, and ranks and \
                  stress-tests the result with decimal precision."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Engine configuration file (JSON or YAML)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log filter when RUST_LOG is unset
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate the scenario tree and total PD
    Model(ModelArgs),
    /// One-at-a-time shocks on every model input
    Sensitivity(SensitivityArgs),
    /// Look up a grade by score or letter, or print the table
    Grade(GradeArgs),
    /// Weighted psychometric score to grade and willingness PD
    Willingness(WillingnessArgs),
    /// Score raw questionnaire answers
    Assessment(AssessmentArgs),
    /// Group and rank PD contributions by scenario
    Attribution(AttributionArgs),
    /// Sample the DSR to PD curve
    Curve(CurveArgs),
    /// Probability flow graph from enrolment to default
    Flow(FlowArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn load_config(path: Option<&str>) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let config: EngineConfig = match path {
        Some(path) => input::file::read_structured(path)?,
        None => EngineConfig::default(),
    };
    config.validate()?;
    debug!(?config, "engine configuration loaded");
    Ok(config)
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = telemetry::init(&cli.log_level) {
        eprintln!("{}: {}", "error".red().bold(), e);
        process::exit(1);
    }

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Model(args) => commands::model::run_model(args),
        Commands::Sensitivity(args) => commands::model::run_sensitivity(args, &config),
        Commands::Grade(args) => commands::grading::run_grade(args),
        Commands::Willingness(args) => commands::willingness::run_willingness(args, &config),
        Commands::Assessment(args) => commands::willingness::run_assessment(args, &config),
        Commands::Attribution(args) => commands::model::run_attribution(args, &config),
        Commands::Curve(args) => commands::model::run_curve(args),
        Commands::Flow(args) => commands::model::run_flow(args),
        Commands::Version => {
            println!("cpd {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
