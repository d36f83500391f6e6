use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use credit_pd_core::analysis::attribution::{self, AggregationMode, SortKey};
use credit_pd_core::analysis::curve::{self, DEFAULT_CURVE_POINTS, DEFAULT_CURVE_STEP};
use credit_pd_core::analysis::flow;
use credit_pd_core::analysis::sensitivity;
use credit_pd_core::config::EngineConfig;
use credit_pd_core::model::{self, ModelInputs};

use super::TableArgs;
use crate::input;

#[derive(Args)]
pub struct ModelArgs {
    #[arg(long)]
    pub input: Option<String>,
    #[command(flatten)]
    pub table: TableArgs,
}

#[derive(Args)]
pub struct SensitivityArgs {
    #[arg(long)]
    pub input: Option<String>,
    /// Relative shock, e.g. 0.10 for +10% (defaults to the configured shock)
    #[arg(long)]
    pub shock: Option<Decimal>,
    #[command(flatten)]
    pub table: TableArgs,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortColumn {
    Probability,
    ConditionalPd,
    Contribution,
}

impl From<SortColumn> for SortKey {
    fn from(c: SortColumn) -> Self {
        match c {
            SortColumn::Probability => SortKey::PathProbability,
            SortColumn::ConditionalPd => SortKey::ConditionalPd,
            SortColumn::Contribution => SortKey::Contribution,
        }
    }
}

#[derive(Args)]
pub struct AttributionArgs {
    #[arg(long)]
    pub input: Option<String>,
    /// Group by student outcome only
    #[arg(long)]
    pub by_major: bool,
    #[arg(long, value_enum)]
    pub sort: Option<SortColumn>,
    /// Sort ascending, overriding the configured order
    #[arg(long, conflicts_with = "descending")]
    pub ascending: bool,
    /// Sort descending, overriding the configured order
    #[arg(long)]
    pub descending: bool,
    #[arg(long)]
    pub top: Option<usize>,
    #[command(flatten)]
    pub table: TableArgs,
}

#[derive(Args)]
pub struct CurveArgs {
    #[arg(long)]
    pub input: Option<String>,
    #[arg(long, default_value_t = DEFAULT_CURVE_POINTS)]
    pub points: usize,
    #[arg(long, default_value_t = DEFAULT_CURVE_STEP)]
    pub step: Decimal,
    #[command(flatten)]
    pub table: TableArgs,
}

#[derive(Args)]
pub struct FlowArgs {
    #[arg(long)]
    pub input: Option<String>,
    #[command(flatten)]
    pub table: TableArgs,
}

pub fn run_model(args: ModelArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs: ModelInputs = input::load(args.input.as_deref())?;
    let result = model::run_model(&inputs, &args.table.resolve()?)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_sensitivity(
    args: SensitivityArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs: ModelInputs = input::load(args.input.as_deref())?;
    let shock = args.shock.unwrap_or(config.shock);
    let result = sensitivity::run_sensitivity(&inputs, shock, &args.table.resolve()?)?;
    Ok(serde_json::to_value(result)?)
}

/// Command-line flags win over the configured order.
fn sort_order(ascending: bool, descending: bool, configured: bool) -> bool {
    if ascending {
        true
    } else if descending {
        false
    } else {
        configured
    }
}

pub fn run_attribution(
    args: AttributionArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs: ModelInputs = input::load(args.input.as_deref())?;
    let output = model::compute_model_with_table(&inputs, &args.table.resolve()?)?;

    let mode = if args.by_major {
        AggregationMode::ByMajorOutcome
    } else {
        config.aggregation_mode()
    };
    let sort = args.sort.map(SortKey::from).unwrap_or(config.sort_column);
    let ascending = sort_order(args.ascending, args.descending, config.sort_ascending);
    let top_n = args.top.unwrap_or(config.top_n);

    Ok(json!({
        "total_pd": output.total_pd,
        "groups": attribution::aggregate(&output.scenarios, mode),
        "results": attribution::ranked_rows(&output.scenarios, output.total_pd, sort, ascending, top_n),
    }))
}

pub fn run_curve(args: CurveArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs: ModelInputs = input::load(args.input.as_deref())?;
    let willingness_pd = inputs.willingness.resolve(&args.table.resolve()?)?;
    let points = curve::dsr_pd_curve(&inputs.logistic, willingness_pd, args.points, args.step)?;
    Ok(json!({ "willingness_pd": willingness_pd, "results": points }))
}

pub fn run_flow(args: FlowArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs: ModelInputs = input::load(args.input.as_deref())?;
    let output = model::compute_model_with_table(&inputs, &args.table.resolve()?)?;
    let graph = flow::probability_flow(&inputs, &output)?;
    Ok(serde_json::to_value(graph)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_flags_override_config() {
        assert!(sort_order(false, false, true));
        assert!(!sort_order(false, false, false));
        assert!(!sort_order(false, true, true));
        assert!(sort_order(true, false, false));
    }
}
