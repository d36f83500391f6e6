pub mod grading;
pub mod model;
pub mod willingness;

use clap::{Args, ValueEnum};
use credit_pd_core::grading::GradeTable;

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TablePreset {
    /// 0-1000 scale
    Thousand,
    /// 0-100 scale with the Bankrupt bucket
    Percent,
}

/// Grade table selection shared by every command that resolves a score.
#[derive(Args, Debug, Clone)]
pub struct TableArgs {
    /// Built-in grade table
    #[arg(long, value_enum, default_value = "thousand")]
    pub table: TablePreset,
    /// Custom grade table file (JSON or YAML), overrides --table
    #[arg(long)]
    pub grade_table: Option<String>,
}

impl TableArgs {
    pub fn resolve(&self) -> Result<GradeTable, Box<dyn std::error::Error>> {
        if let Some(ref path) = self.grade_table {
            return input::file::read_structured(path);
        }
        Ok(match self.table {
            TablePreset::Thousand => GradeTable::thousand_point(),
            TablePreset::Percent => GradeTable::percent_point(),
        })
    }
}
