use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use credit_pd_core::grading::{lookup_grade, GradeLookup};

use super::TableArgs;

#[derive(Args)]
pub struct GradeArgs {
    /// Normalized score to grade
    #[arg(long, conflicts_with = "grade")]
    pub score: Option<Decimal>,
    /// Grade letter to look up
    #[arg(long)]
    pub grade: Option<String>,
    #[command(flatten)]
    pub table: TableArgs,
}

pub fn run_grade(args: GradeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let table = args.table.resolve()?;
    let lookup = match (args.score, args.grade) {
        (Some(score), _) => lookup_grade(&table, score),
        (None, Some(ref grade)) => GradeLookup::from(table.by_grade(grade)?),
        (None, None) => {
            return Ok(serde_json::to_value(table)?);
        }
    };
    Ok(serde_json::to_value(lookup)?)
}
