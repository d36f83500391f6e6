use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::CreditPdError;
use crate::grading::GradeTable;
use crate::model::{compute_model_with_table, ModelInputs};
use crate::types::*;
use crate::CreditPdResult;

/// Relative shock used when none is configured.
pub const DEFAULT_SHOCK: Decimal = dec!(0.10);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Model input that the analyzer perturbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShockVariable {
    Principal,
    AnnualRate,
    RepaymentYears,
    StudyYears,
    SalaryDad,
    SalaryMum,
    SalaryStudentDestination,
    SalaryStudentHome,
    DropoutRate,
    GradUnemployment,
    DestinationShare,
    DropoutUnemployment,
    ParentUnemployment,
}

impl ShockVariable {
    pub const ALL: [ShockVariable; 13] = [
        ShockVariable::Principal,
        ShockVariable::AnnualRate,
        ShockVariable::RepaymentYears,
        ShockVariable::StudyYears,
        ShockVariable::SalaryDad,
        ShockVariable::SalaryMum,
        ShockVariable::SalaryStudentDestination,
        ShockVariable::SalaryStudentHome,
        ShockVariable::DropoutRate,
        ShockVariable::GradUnemployment,
        ShockVariable::DestinationShare,
        ShockVariable::DropoutUnemployment,
        ShockVariable::ParentUnemployment,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ShockVariable::Principal => "Loan principal",
            ShockVariable::AnnualRate => "Interest rate",
            ShockVariable::RepaymentYears => "Repayment term",
            ShockVariable::StudyYears => "Study duration",
            ShockVariable::SalaryDad => "Dad's salary",
            ShockVariable::SalaryMum => "Mum's salary",
            ShockVariable::SalaryStudentDestination => "Student salary (destination)",
            ShockVariable::SalaryStudentHome => "Student salary (home)",
            ShockVariable::DropoutRate => "Annual dropout rate",
            ShockVariable::GradUnemployment => "Post-graduation unemployment",
            ShockVariable::DestinationShare => "Share working at destination",
            ShockVariable::DropoutUnemployment => "Post-dropout unemployment",
            ShockVariable::ParentUnemployment => "Parental unemployment",
        }
    }

    fn is_probability(self) -> bool {
        matches!(
            self,
            ShockVariable::DropoutRate
                | ShockVariable::GradUnemployment
                | ShockVariable::DestinationShare
                | ShockVariable::DropoutUnemployment
                | ShockVariable::ParentUnemployment
        )
    }

    fn field(self, inputs: &mut ModelInputs) -> &mut Decimal {
        match self {
            ShockVariable::Principal => &mut inputs.principal,
            ShockVariable::AnnualRate => &mut inputs.annual_rate,
            ShockVariable::RepaymentYears => &mut inputs.repayment_years,
            ShockVariable::StudyYears => &mut inputs.study_years,
            ShockVariable::SalaryDad => &mut inputs.salary_dad,
            ShockVariable::SalaryMum => &mut inputs.salary_mum,
            ShockVariable::SalaryStudentDestination => &mut inputs.salary_student_destination,
            ShockVariable::SalaryStudentHome => &mut inputs.salary_student_home,
            ShockVariable::DropoutRate => &mut inputs.dropout_rate,
            ShockVariable::GradUnemployment => &mut inputs.grad_unemployment,
            ShockVariable::DestinationShare => &mut inputs.destination_share,
            ShockVariable::DropoutUnemployment => &mut inputs.dropout_unemployment,
            ShockVariable::ParentUnemployment => &mut inputs.parent_unemployment,
        }
    }

    /// Copy of `inputs` with this variable scaled by `1 + shock`.
    /// Probabilities are clamped to 1.
    pub fn apply(self, inputs: &ModelInputs, shock: Decimal) -> (ModelInputs, Decimal, Decimal) {
        let mut shocked = inputs.clone();
        let slot = self.field(&mut shocked);
        let base = *slot;
        let mut value = base * (Decimal::ONE + shock);
        if self.is_probability() {
            value = value.min(Decimal::ONE);
        }
        *slot = value;
        (shocked, base, value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityResult {
    pub variable: ShockVariable,
    pub label: String,
    pub base_value: Decimal,
    pub shocked_value: Decimal,
    pub shocked_pd: Probability,
    /// `(shocked_pd - base_pd) / base_pd * 100`
    pub pct_change: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityOutput {
    pub base_pd: Probability,
    pub shock: Decimal,
    pub results: Vec<SensitivityResult>,
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// One-at-a-time +10% shocks against the default grade table.
pub fn compute_sensitivity(inputs: &ModelInputs) -> CreditPdResult<Vec<SensitivityResult>> {
    compute_sensitivity_with(inputs, DEFAULT_SHOCK)
}

pub fn compute_sensitivity_with(
    inputs: &ModelInputs,
    shock: Decimal,
) -> CreditPdResult<Vec<SensitivityResult>> {
    Ok(analyze(inputs, shock, &GradeTable::default())?.results)
}

fn analyze(
    inputs: &ModelInputs,
    shock: Decimal,
    table: &GradeTable,
) -> CreditPdResult<SensitivityOutput> {
    if shock <= Decimal::ZERO {
        return Err(CreditPdError::invalid("shock", "must be positive"));
    }

    let base_pd = compute_model_with_table(inputs, table)?.total_pd;
    if base_pd.is_zero() {
        warn!("base PD is zero, relative sensitivities are undefined");
        return Ok(SensitivityOutput {
            base_pd,
            shock,
            results: Vec::new(),
        });
    }

    let mut results = Vec::with_capacity(ShockVariable::ALL.len());
    for variable in ShockVariable::ALL {
        let (shocked_inputs, base_value, shocked_value) = variable.apply(inputs, shock);
        let shocked_pd = compute_model_with_table(&shocked_inputs, table)?.total_pd;
        let pct_change = (shocked_pd - base_pd) / base_pd * dec!(100);
        debug!(variable = variable.label(), %pct_change, "shock evaluated");

        results.push(SensitivityResult {
            variable,
            label: variable.label().to_string(),
            base_value,
            shocked_value,
            shocked_pd,
            pct_change,
        });
    }

    results.sort_by(|a, b| b.pct_change.abs().cmp(&a.pct_change.abs()));

    Ok(SensitivityOutput {
        base_pd,
        shock,
        results,
    })
}

/// Sensitivity analysis wrapped in the standard output envelope.
pub fn run_sensitivity(
    inputs: &ModelInputs,
    shock: Decimal,
    table: &GradeTable,
) -> CreditPdResult<ComputationOutput<SensitivityOutput>> {
    let start = Instant::now();
    let output = analyze(inputs, shock, table)?;

    let mut warnings = Vec::new();
    if output.results.is_empty() {
        warnings.push("Base PD is zero; no relative changes reported".to_string());
    }
    for r in &output.results {
        if r.variable.is_probability() && r.shocked_value == Decimal::ONE && r.base_value < Decimal::ONE {
            warnings.push(format!("{} shock clamped to 1", r.label));
        }
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "One-at-a-time relative shock, full model re-evaluation per variable",
        &serde_json::json!({
            "shock": shock.to_string(),
            "variables": ShockVariable::ALL.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}
