//! Scenario tree: the 5 student outcomes crossed with the 4 parental
//! employment states, giving 20 disjoint life-event paths whose
//! probabilities partition the outcome space.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::inputs::ModelInputs;
use crate::error::CreditPdError;
use crate::types::{Money, Probability};
use crate::CreditPdResult;

/// DSR assigned to a household with no income. Far past the point where
/// any admissible logistic curve has saturated.
pub const SENTINEL_DSR: Decimal = dec!(1000);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentOutcome {
    GraduateEmployedDestination,
    GraduateEmployedHome,
    GraduateUnemployed,
    DropoutEmployed,
    DropoutUnemployed,
}

impl StudentOutcome {
    pub const ALL: [StudentOutcome; 5] = [
        StudentOutcome::GraduateEmployedDestination,
        StudentOutcome::GraduateEmployedHome,
        StudentOutcome::GraduateUnemployed,
        StudentOutcome::DropoutEmployed,
        StudentOutcome::DropoutUnemployed,
    ];

    pub fn is_graduate(self) -> bool {
        matches!(
            self,
            StudentOutcome::GraduateEmployedDestination
                | StudentOutcome::GraduateEmployedHome
                | StudentOutcome::GraduateUnemployed
        )
    }

    pub fn is_employed(self) -> bool {
        matches!(
            self,
            StudentOutcome::GraduateEmployedDestination
                | StudentOutcome::GraduateEmployedHome
                | StudentOutcome::DropoutEmployed
        )
    }

    /// Reporting label that merges the two employed-graduate branches.
    pub fn major_label(self) -> &'static str {
        match (self.is_graduate(), self.is_employed()) {
            (true, true) => "Graduate, Employed",
            (true, false) => "Graduate, Unemployed",
            (false, true) => "Dropout, Employed",
            (false, false) => "Dropout, Unemployed",
        }
    }

    fn short_label(self) -> &'static str {
        match self {
            StudentOutcome::GraduateEmployedDestination => "Grad, Emp Dest",
            StudentOutcome::GraduateEmployedHome => "Grad, Emp Home",
            StudentOutcome::GraduateUnemployed => "Grad, Unemp",
            StudentOutcome::DropoutEmployed => "Drop, Emp",
            StudentOutcome::DropoutUnemployed => "Drop, Unemp",
        }
    }

    fn tags(self) -> [PathTag; 3] {
        match self {
            StudentOutcome::GraduateEmployedDestination => {
                [PathTag::Graduate, PathTag::Employed, PathTag::Destination]
            }
            StudentOutcome::GraduateEmployedHome => {
                [PathTag::Graduate, PathTag::Employed, PathTag::Home]
            }
            StudentOutcome::GraduateUnemployed => {
                [PathTag::Graduate, PathTag::Unemployed, PathTag::NotApplicable]
            }
            StudentOutcome::DropoutEmployed => {
                [PathTag::Dropout, PathTag::Employed, PathTag::Home]
            }
            StudentOutcome::DropoutUnemployed => {
                [PathTag::Dropout, PathTag::Unemployed, PathTag::NotApplicable]
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentalStatus {
    BothEmployed,
    DadUnemployed,
    MumUnemployed,
    BothUnemployed,
}

impl ParentalStatus {
    pub const ALL: [ParentalStatus; 4] = [
        ParentalStatus::BothEmployed,
        ParentalStatus::DadUnemployed,
        ParentalStatus::MumUnemployed,
        ParentalStatus::BothUnemployed,
    ];

    pub fn dad_employed(self) -> bool {
        matches!(self, ParentalStatus::BothEmployed | ParentalStatus::MumUnemployed)
    }

    pub fn mum_employed(self) -> bool {
        matches!(self, ParentalStatus::BothEmployed | ParentalStatus::DadUnemployed)
    }

    pub fn label(self) -> &'static str {
        match self {
            ParentalStatus::BothEmployed => "Both Emp",
            ParentalStatus::DadUnemployed => "Dad Unemp",
            ParentalStatus::MumUnemployed => "Mum Unemp",
            ParentalStatus::BothUnemployed => "Both Unemp",
        }
    }
}

/// One branch decision along a path, in tree order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathTag {
    Graduate,
    Dropout,
    Employed,
    Unemployed,
    Destination,
    Home,
    NotApplicable,
    DadEmployed,
    DadUnemployed,
    MumEmployed,
    MumUnemployed,
}

/// A fully specified combination of life events and its probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioPath {
    pub student: StudentOutcome,
    pub parents: ParentalStatus,
    pub tags: Vec<PathTag>,
    pub description: String,
    pub probability: Probability,
}

impl ScenarioPath {
    /// "<major outcome> (<parental status>)"
    pub fn full_key(&self) -> String {
        format!("{} ({})", self.student.major_label(), self.parents.label())
    }
}

// ---------------------------------------------------------------------------
// Branch probabilities
// ---------------------------------------------------------------------------

/// Conditional probabilities at each level of the tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchProbabilities {
    pub graduate: Probability,
    pub dropout: Probability,
    pub grad_employed: Probability,
    pub destination: Probability,
    pub dropout_employed: Probability,
    pub parent_employed: Probability,
}

impl BranchProbabilities {
    pub fn from_inputs(inputs: &ModelInputs) -> CreditPdResult<Self> {
        let graduate = survival(Decimal::ONE - inputs.dropout_rate, inputs.study_years)?;
        Ok(Self {
            graduate,
            dropout: Decimal::ONE - graduate,
            grad_employed: Decimal::ONE - inputs.grad_unemployment,
            destination: inputs.destination_share,
            dropout_employed: Decimal::ONE - inputs.dropout_unemployment,
            parent_employed: Decimal::ONE - inputs.parent_unemployment,
        })
    }

    pub fn student(&self, outcome: StudentOutcome) -> Probability {
        match outcome {
            StudentOutcome::GraduateEmployedDestination => {
                self.graduate * self.grad_employed * self.destination
            }
            StudentOutcome::GraduateEmployedHome => {
                self.graduate * self.grad_employed * (Decimal::ONE - self.destination)
            }
            StudentOutcome::GraduateUnemployed => {
                self.graduate * (Decimal::ONE - self.grad_employed)
            }
            StudentOutcome::DropoutEmployed => self.dropout * self.dropout_employed,
            StudentOutcome::DropoutUnemployed => {
                self.dropout * (Decimal::ONE - self.dropout_employed)
            }
        }
    }

    pub fn parents(&self, status: ParentalStatus) -> Probability {
        let employed = self.parent_employed;
        let unemployed = Decimal::ONE - employed;
        let dad = if status.dad_employed() { employed } else { unemployed };
        let mum = if status.mum_employed() { employed } else { unemployed };
        dad * mum
    }
}

/// Probability of completing `years` of study given the per-year
/// continuation probability.
pub fn survival(continue_rate: Probability, years: Decimal) -> CreditPdResult<Probability> {
    if years.is_zero() {
        return Ok(Decimal::ONE);
    }
    if continue_rate.is_zero() {
        return Ok(Decimal::ZERO);
    }
    continue_rate
        .checked_powd(years)
        .ok_or_else(|| CreditPdError::invalid("study_years", "survival probability overflows"))
}

// ---------------------------------------------------------------------------
// Enumeration
// ---------------------------------------------------------------------------

/// All 20 paths, student outcome major, parental status minor.
pub fn enumerate_paths(inputs: &ModelInputs) -> CreditPdResult<Vec<ScenarioPath>> {
    let branches = BranchProbabilities::from_inputs(inputs)?;
    let mut paths = Vec::with_capacity(StudentOutcome::ALL.len() * ParentalStatus::ALL.len());

    for student in StudentOutcome::ALL {
        for parents in ParentalStatus::ALL {
            let mut tags = student.tags().to_vec();
            tags.push(if parents.dad_employed() {
                PathTag::DadEmployed
            } else {
                PathTag::DadUnemployed
            });
            tags.push(if parents.mum_employed() {
                PathTag::MumEmployed
            } else {
                PathTag::MumUnemployed
            });

            paths.push(ScenarioPath {
                student,
                parents,
                tags,
                description: format!("{}, {}", student.short_label(), parents.label()),
                probability: branches.student(student) * branches.parents(parents),
            });
        }
    }
    Ok(paths)
}

/// Monthly household income on a path.
pub fn household_salary(path: &ScenarioPath, inputs: &ModelInputs) -> Money {
    let student = match path.student {
        StudentOutcome::GraduateEmployedDestination => inputs.salary_student_destination,
        StudentOutcome::GraduateEmployedHome | StudentOutcome::DropoutEmployed => {
            inputs.salary_student_home
        }
        StudentOutcome::GraduateUnemployed | StudentOutcome::DropoutUnemployed => Decimal::ZERO,
    };
    let dad = if path.parents.dad_employed() {
        inputs.salary_dad
    } else {
        Decimal::ZERO
    };
    let mum = if path.parents.mum_employed() {
        inputs.salary_mum
    } else {
        Decimal::ZERO
    };
    student + dad + mum
}

/// Monthly payment over monthly income; the sentinel when there is no income.
pub fn debt_service_ratio(monthly_payment: Money, household_salary: Money) -> Decimal {
    if household_salary <= Decimal::ZERO {
        return SENTINEL_DSR;
    }
    monthly_payment / household_salary
}
