use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use super::ability::ability_pd;
use super::inputs::ModelInputs;
use super::scenario_tree::{debt_service_ratio, enumerate_paths, household_salary, ScenarioPath};
use crate::grading::GradeTable;
use crate::loan::LoanPayments;
use crate::types::*;
use crate::CreditPdResult;

/// One scenario path evaluated against the loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    #[serde(flatten)]
    pub path: ScenarioPath,
    pub household_salary: Money,
    pub dsr: Decimal,
    pub ability_pd: Probability,
    /// PD given this path: either ability or willingness fails.
    pub conditional_pd: Probability,
    /// `conditional_pd * path.probability`
    pub weighted_pd: Probability,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelOutput {
    pub scenarios: Vec<ScenarioOutcome>,
    pub total_pd: Probability,
    /// Probability-weighted mean ability PD across paths.
    pub ability_pd_avg: Probability,
    pub willingness_pd: Probability,
    /// Amortized payment over the repayment term.
    pub monthly_payment: Money,
    /// Interest-only payment while studying.
    pub study_payment: Money,
}

/// `1 - (1 - ability)(1 - willingness)`
pub fn compose_pd(ability: Probability, willingness: Probability) -> Probability {
    Decimal::ONE - (Decimal::ONE - ability) * (Decimal::ONE - willingness)
}

/// Evaluate the scenario model with the default 0-1000 grade table.
pub fn compute_model(inputs: &ModelInputs) -> CreditPdResult<ModelOutput> {
    compute_model_with_table(inputs, &GradeTable::default())
}

/// Evaluate the scenario model, resolving willingness through `table`.
pub fn compute_model_with_table(
    inputs: &ModelInputs,
    table: &GradeTable,
) -> CreditPdResult<ModelOutput> {
    inputs.validate()?;

    let payments = LoanPayments::new(inputs.principal, inputs.annual_rate, inputs.repayment_years)?;
    let willingness_pd = inputs.willingness.resolve(table)?;
    let paths = enumerate_paths(inputs)?;

    let mut scenarios = Vec::with_capacity(paths.len());
    let mut total_pd = Decimal::ZERO;
    let mut ability_mass = Decimal::ZERO;
    let mut path_mass = Decimal::ZERO;

    for path in paths {
        let salary = household_salary(&path, inputs);
        let dsr = debt_service_ratio(payments.repayment_payment, salary);
        let ability = ability_pd(dsr, &inputs.logistic);
        let conditional = compose_pd(ability, willingness_pd);
        let weighted = conditional * path.probability;

        total_pd += weighted;
        ability_mass += ability * path.probability;
        path_mass += path.probability;

        scenarios.push(ScenarioOutcome {
            path,
            household_salary: salary,
            dsr,
            ability_pd: ability,
            conditional_pd: conditional,
            weighted_pd: weighted,
        });
    }

    let ability_pd_avg = if path_mass.is_zero() {
        Decimal::ZERO
    } else {
        ability_mass / path_mass
    };

    debug!(
        %total_pd,
        %willingness_pd,
        monthly_payment = %payments.repayment_payment,
        "scenario model evaluated"
    );

    Ok(ModelOutput {
        scenarios,
        total_pd,
        ability_pd_avg,
        willingness_pd,
        monthly_payment: payments.repayment_payment,
        study_payment: payments.study_payment,
    })
}

/// [`compute_model_with_table`] wrapped in the standard output envelope.
pub fn run_model(
    inputs: &ModelInputs,
    table: &GradeTable,
) -> CreditPdResult<ComputationOutput<ModelOutput>> {
    let start = Instant::now();
    let output = compute_model_with_table(inputs, table)?;

    let mut warnings = Vec::new();
    for outcome in &output.scenarios {
        if outcome.household_salary.is_zero() && !outcome.path.probability.is_zero() {
            warn!(path = %outcome.path.description, "no household income, DSR set to sentinel");
            warnings.push(format!(
                "{}: no household income, ability PD saturated at {}",
                outcome.path.description, outcome.ability_pd
            ));
        }
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Scenario-tree PD composition (logistic ability x grade-table willingness)",
        inputs,
        warnings,
        elapsed,
        output,
    ))
}
