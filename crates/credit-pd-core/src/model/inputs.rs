use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ability::LogisticParams;
use crate::error::CreditPdError;
use crate::grading::GradeTable;
use crate::types::{Money, Probability, Rate, Score, Years};
use crate::CreditPdResult;

/// Where the willingness-to-pay PD comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WillingnessSource {
    /// A letter grade resolved through the grade table.
    Grade(String),
    /// A normalized psychometric score resolved through the grade table.
    Score(Score),
    /// A willingness PD supplied directly.
    Pd(Probability),
}

impl WillingnessSource {
    /// Resolve to a PD in [0, 1].
    pub fn resolve(&self, table: &GradeTable) -> CreditPdResult<Probability> {
        match self {
            WillingnessSource::Grade(grade) => Ok(table.by_grade(grade)?.pd),
            WillingnessSource::Score(score) => Ok(table.lookup(*score).pd),
            WillingnessSource::Pd(pd) => {
                check_probability("willingness.pd", *pd)?;
                Ok(*pd)
            }
        }
    }
}

/// The fixed set of assumptions the scenario model runs on.
///
/// Salaries are monthly. Rates and probabilities are fractions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInputs {
    pub principal: Money,
    pub annual_rate: Rate,
    pub repayment_years: Years,
    pub study_years: Years,
    pub salary_dad: Money,
    pub salary_mum: Money,
    pub salary_student_destination: Money,
    pub salary_student_home: Money,
    /// Probability of dropping out in any single study year.
    pub dropout_rate: Probability,
    /// Probability a graduate is unemployed.
    pub grad_unemployment: Probability,
    /// Share of employed graduates working at the study destination.
    pub destination_share: Probability,
    /// Probability a dropout is unemployed.
    pub dropout_unemployment: Probability,
    /// Probability of unemployment, applied independently to each parent.
    pub parent_unemployment: Probability,
    #[serde(default)]
    pub logistic: LogisticParams,
    pub willingness: WillingnessSource,
}

fn check_non_negative(field: &str, value: Decimal) -> CreditPdResult<()> {
    if value < Decimal::ZERO {
        return Err(CreditPdError::invalid(field, "must be non-negative"));
    }
    Ok(())
}

fn check_probability(field: &str, value: Decimal) -> CreditPdResult<()> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(CreditPdError::invalid(
            field,
            format!("probability {value} must be in [0, 1]"),
        ));
    }
    Ok(())
}

impl ModelInputs {
    /// Fail fast on values that would otherwise propagate as nonsense PDs.
    pub fn validate(&self) -> CreditPdResult<()> {
        check_non_negative("principal", self.principal)?;
        check_non_negative("annual_rate", self.annual_rate)?;
        if self.repayment_years <= Decimal::ZERO {
            return Err(CreditPdError::invalid("repayment_years", "must be positive"));
        }
        check_non_negative("study_years", self.study_years)?;
        check_non_negative("salary_dad", self.salary_dad)?;
        check_non_negative("salary_mum", self.salary_mum)?;
        check_non_negative("salary_student_destination", self.salary_student_destination)?;
        check_non_negative("salary_student_home", self.salary_student_home)?;

        check_probability("dropout_rate", self.dropout_rate)?;
        check_probability("grad_unemployment", self.grad_unemployment)?;
        check_probability("destination_share", self.destination_share)?;
        check_probability("dropout_unemployment", self.dropout_unemployment)?;
        check_probability("parent_unemployment", self.parent_unemployment)?;

        self.logistic.validate()?;

        if let WillingnessSource::Pd(pd) = &self.willingness {
            check_probability("willingness.pd", *pd)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample() -> ModelInputs {
        ModelInputs {
            principal: dec!(500_000),
            annual_rate: dec!(0.1498),
            repayment_years: dec!(10),
            study_years: dec!(2),
            salary_dad: dec!(8000),
            salary_mum: dec!(0),
            salary_student_destination: dec!(16500),
            salary_student_home: dec!(4000),
            dropout_rate: dec!(0.02),
            grad_unemployment: dec!(0.10),
            destination_share: dec!(0.50),
            dropout_unemployment: dec!(0.20),
            parent_unemployment: dec!(0.0475),
            logistic: LogisticParams::default(),
            willingness: WillingnessSource::Grade("G".into()),
        }
    }

    #[test]
    fn test_valid_inputs() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_negative_term_rejected() {
        let mut inputs = sample();
        inputs.repayment_years = dec!(-1);
        match inputs.validate() {
            Err(CreditPdError::InvalidInput { field, .. }) => assert_eq!(field, "repayment_years"),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_probability_out_of_range_rejected() {
        let mut inputs = sample();
        inputs.destination_share = dec!(1.2);
        assert!(inputs.validate().is_err());

        let mut inputs = sample();
        inputs.parent_unemployment = dec!(-0.01);
        assert!(inputs.validate().is_err());
    }

    #[test]
    fn test_negative_salary_rejected() {
        let mut inputs = sample();
        inputs.salary_student_home = dec!(-4000);
        assert!(inputs.validate().is_err());
    }

    #[test]
    fn test_willingness_resolution() {
        let table = GradeTable::thousand_point();
        assert_eq!(
            WillingnessSource::Grade("G".into()).resolve(&table).unwrap(),
            dec!(0.0531)
        );
        assert_eq!(
            WillingnessSource::Score(dec!(700)).resolve(&table).unwrap(),
            dec!(0.0098)
        );
        assert_eq!(
            WillingnessSource::Pd(dec!(0.2)).resolve(&table).unwrap(),
            dec!(0.2)
        );
        assert!(WillingnessSource::Grade("Q".into()).resolve(&table).is_err());
        assert!(WillingnessSource::Pd(dec!(2)).resolve(&table).is_err());
    }

    #[test]
    fn test_deserialize_with_default_logistic() {
        let json = r#"{
            "principal": "500000", "annual_rate": "0.1498",
            "repayment_years": "10", "study_years": "2",
            "salary_dad": "8000", "salary_mum": "0",
            "salary_student_destination": "16500", "salary_student_home": "4000",
            "dropout_rate": "0.02", "grad_unemployment": "0.10",
            "destination_share": "0.5", "dropout_unemployment": "0.2",
            "parent_unemployment": "0.0475",
            "willingness": {"grade": "G"}
        }"#;
        let inputs: ModelInputs = serde_json::from_str(json).unwrap();
        assert_eq!(inputs, sample());
    }
}
