use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::CreditPdError;
use crate::types::{Money, Rate, Years};
use crate::CreditPdResult;

const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Monthly obligations across the two phases of the loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanPayments {
    /// Interest-only payment while studying.
    pub study_payment: Money,
    /// Amortized payment over the repayment term.
    pub repayment_payment: Money,
    pub repayment_months: Decimal,
}

impl LoanPayments {
    pub fn new(principal: Money, annual_rate: Rate, repayment_years: Years) -> CreditPdResult<Self> {
        let repayment_months = repayment_years * MONTHS_PER_YEAR;
        Ok(Self {
            study_payment: interest_only_payment(principal, annual_rate)?,
            repayment_payment: amortized_payment(principal, annual_rate, repayment_months)?,
            repayment_months,
        })
    }
}

/// Amortized monthly payment (PMT), returned as a positive amount.
///
/// `pmt = P * r * (1+r)^n / ((1+r)^n - 1)` with `r = annual_rate / 12`;
/// `P / n` when the rate is zero. `months` may be fractional.
pub fn amortized_payment(principal: Money, annual_rate: Rate, months: Decimal) -> CreditPdResult<Money> {
    if months <= Decimal::ZERO {
        return Err(CreditPdError::invalid(
            "repayment_months",
            "Number of periods must be > 0",
        ));
    }
    if principal < Decimal::ZERO {
        return Err(CreditPdError::invalid("principal", "must be non-negative"));
    }
    if annual_rate < Decimal::ZERO {
        return Err(CreditPdError::invalid("annual_rate", "must be non-negative"));
    }

    let r = annual_rate / MONTHS_PER_YEAR;
    if r.is_zero() {
        return Ok(principal / months);
    }

    let factor = (Decimal::ONE + r)
        .checked_powd(months)
        .ok_or_else(|| CreditPdError::invalid("repayment_months", "compounding factor overflows"))?;
    let denominator = factor - Decimal::ONE;
    if denominator.is_zero() {
        return Err(CreditPdError::DivisionByZero {
            context: "PMT annuity factor".into(),
        });
    }

    Ok(principal * r * factor / denominator)
}

/// Interest-only monthly payment during the study phase.
pub fn interest_only_payment(principal: Money, annual_rate: Rate) -> CreditPdResult<Money> {
    if principal < Decimal::ZERO {
        return Err(CreditPdError::invalid("principal", "must be non-negative"));
    }
    if annual_rate < Decimal::ZERO {
        return Err(CreditPdError::invalid("annual_rate", "must be non-negative"));
    }
    Ok(principal * annual_rate / MONTHS_PER_YEAR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_pmt_reference_loan() {
        // 500k at 14.98% over 120 months ~= 8,060.63 per month
        let pmt = amortized_payment(dec!(500_000), dec!(0.1498), dec!(120)).unwrap();
        assert!((pmt - dec!(8060.63)).abs() < dec!(0.5), "got {pmt}");
    }

    #[test]
    fn test_pmt_zero_rate() {
        let pmt = amortized_payment(dec!(12_000), Decimal::ZERO, dec!(120)).unwrap();
        assert_eq!(pmt, dec!(100));
    }

    #[test]
    fn test_pmt_exceeds_interest_only() {
        let pmt = amortized_payment(dec!(100_000), dec!(0.06), dec!(60)).unwrap();
        let io = interest_only_payment(dec!(100_000), dec!(0.06)).unwrap();
        assert_eq!(io, dec!(500));
        assert!(pmt > io);
    }

    #[test]
    fn test_pmt_rejects_non_positive_term() {
        assert!(amortized_payment(dec!(1000), dec!(0.05), Decimal::ZERO).is_err());
        assert!(amortized_payment(dec!(1000), dec!(0.05), dec!(-12)).is_err());
    }

    #[test]
    fn test_negative_inputs_rejected() {
        assert!(amortized_payment(dec!(-1), dec!(0.05), dec!(12)).is_err());
        assert!(interest_only_payment(dec!(1000), dec!(-0.01)).is_err());
    }

    #[test]
    fn test_loan_payments_bundle() {
        let p = LoanPayments::new(dec!(500_000), dec!(0.1498), dec!(10)).unwrap();
        assert_eq!(p.repayment_months, dec!(120));
        // 500000 * 0.1498 / 12
        assert_eq!(p.study_payment, dec!(500_000) * dec!(0.1498) / dec!(12));
        assert!(p.repayment_payment > p.study_payment);
    }
}
