use clap::Args;
use serde::Deserialize;
use serde_json::Value;

use credit_pd_core::config::EngineConfig;
use credit_pd_core::willingness::{
    evaluate_willingness, score_assessment, standard_battery, Answer, AssessmentItem, ScoringRule,
    SubTest, SubTestScore,
};

use super::TableArgs;
use crate::input;

#[derive(Args)]
pub struct WillingnessArgs {
    #[arg(long)]
    pub input: Option<String>,
    #[command(flatten)]
    pub table: TableArgs,
}

#[derive(Args)]
pub struct AssessmentArgs {
    #[arg(long)]
    pub input: Option<String>,
    #[command(flatten)]
    pub table: TableArgs,
}

#[derive(Deserialize)]
struct WillingnessInput {
    /// Falls back to the standard battery.
    #[serde(default)]
    definitions: Option<Vec<SubTest>>,
    scores: Vec<SubTestScore>,
}

#[derive(Deserialize)]
struct AssessmentInput {
    items: Vec<AssessmentItem>,
    answers: Vec<Answer>,
    rules: Vec<ScoringRule>,
}

pub fn run_willingness(
    args: WillingnessArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let data: WillingnessInput = input::load(args.input.as_deref())?;
    let definitions = data.definitions.unwrap_or_else(standard_battery);
    let result = evaluate_willingness(&definitions, &data.scores, &config.scale, &args.table.resolve()?)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_assessment(
    args: AssessmentArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let data: AssessmentInput = input::load(args.input.as_deref())?;
    let result = score_assessment(
        &data.items,
        &data.answers,
        &data.rules,
        &config.scale,
        &args.table.resolve()?,
    )?;
    Ok(serde_json::to_value(result)?)
}
