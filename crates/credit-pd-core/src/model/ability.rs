//! Ability-to-pay risk: a logistic curve over the debt-service ratio.
//!
//! `pd(dsr) = L / (1 + e^{-k (dsr - DSR0)})`, pinned to exactly `L` once the
//! DSR reaches the no-income sentinel.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::scenario_tree::SENTINEL_DSR;
use crate::error::CreditPdError;
use crate::statistics::normal::exp_decimal;
use crate::types::Probability;
use crate::CreditPdResult;

/// Shape of the logistic ability curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    /// Asymptotic ceiling `L`, in (0, 1].
    pub max_pd: Probability,
    /// Steepness `k`, > 0.
    pub steepness: Decimal,
    /// Inflection point `DSR0`: the DSR at which PD reaches `L / 2`.
    pub inflection_dsr: Decimal,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            max_pd: Decimal::ONE,
            steepness: dec!(19.206),
            inflection_dsr: dec!(0.8),
        }
    }
}

impl LogisticParams {
    pub fn validate(&self) -> CreditPdResult<()> {
        if self.max_pd <= Decimal::ZERO || self.max_pd > Decimal::ONE {
            return Err(CreditPdError::invalid("logistic.max_pd", "must be in (0, 1]"));
        }
        if self.steepness <= Decimal::ZERO {
            return Err(CreditPdError::invalid("logistic.steepness", "must be positive"));
        }
        if self.inflection_dsr < Decimal::ZERO {
            return Err(CreditPdError::invalid(
                "logistic.inflection_dsr",
                "must be non-negative",
            ));
        }
        Ok(())
    }
}

/// Ability PD for a given debt-service ratio.
pub fn ability_pd(dsr: Decimal, params: &LogisticParams) -> Probability {
    if dsr >= SENTINEL_DSR {
        return params.max_pd;
    }
    let exponent = dsr
        .checked_sub(params.inflection_dsr)
        .and_then(|gap| gap.checked_mul(-params.steepness));
    match exponent {
        Some(x) => params.max_pd / (Decimal::ONE + exp_decimal(x)),
        // k * |dsr - DSR0| is past Decimal range: the curve is flat at either end.
        None if dsr > params.inflection_dsr => params.max_pd,
        None => Decimal::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_inflection_is_half_of_ceiling() {
        let params = LogisticParams {
            max_pd: dec!(0.8),
            ..LogisticParams::default()
        };
        assert_eq!(ability_pd(dec!(0.8), &params), dec!(0.4));
    }

    #[test]
    fn test_sentinel_is_exactly_ceiling() {
        let params = LogisticParams {
            max_pd: dec!(0.9),
            ..LogisticParams::default()
        };
        assert_eq!(ability_pd(SENTINEL_DSR, &params), dec!(0.9));
        assert_eq!(ability_pd(SENTINEL_DSR + dec!(5), &params), dec!(0.9));
    }

    #[test]
    fn test_monotone_and_bounded() {
        let params = LogisticParams::default();
        let mut prev = Decimal::ZERO;
        let mut dsr = Decimal::ZERO;
        while dsr <= dec!(5) {
            let pd = ability_pd(dsr, &params);
            assert!(pd >= prev, "pd decreased at dsr {dsr}");
            assert!(pd >= Decimal::ZERO && pd <= params.max_pd);
            prev = pd;
            dsr += dec!(0.05);
        }
    }

    #[test]
    fn test_extreme_parameters_saturate() {
        let steep = LogisticParams {
            steepness: Decimal::MAX / dec!(10),
            inflection_dsr: Decimal::ZERO,
            ..LogisticParams::default()
        };
        assert!(steep.validate().is_ok());
        assert_eq!(ability_pd(dec!(999), &steep), steep.max_pd);
        assert_eq!(ability_pd(Decimal::ZERO, &steep), dec!(0.5));

        let far = LogisticParams {
            inflection_dsr: Decimal::MAX / dec!(2),
            ..LogisticParams::default()
        };
        assert!(far.validate().is_ok());
        assert_eq!(ability_pd(dec!(0.5), &far), Decimal::ZERO);
        assert_eq!(ability_pd(SENTINEL_DSR, &far), far.max_pd);

        let mut prev = Decimal::ZERO;
        for dsr in [dec!(0), dec!(0.5), dec!(1), dec!(10), dec!(999)] {
            let pd = ability_pd(dsr, &steep);
            assert!(pd >= prev, "pd decreased at dsr {dsr}");
            prev = pd;
        }
    }

    #[test]
    fn test_reference_points() {
        let params = LogisticParams::default();
        // dsr = 0.6717 -> ~0.07844
        let pd = ability_pd(dec!(0.671718755695384), &params);
        assert!((pd - dec!(0.07843741987704)).abs() < dec!(0.0000000001));
        // Far below inflection the PD is negligible but never negative.
        let low = ability_pd(Decimal::ZERO, &params);
        assert!(low > Decimal::ZERO && low < dec!(0.000001));
    }

    #[test]
    fn test_validate() {
        assert!(LogisticParams::default().validate().is_ok());
        let bad = LogisticParams {
            max_pd: dec!(1.1),
            ..LogisticParams::default()
        };
        assert!(bad.validate().is_err());
        let bad = LogisticParams {
            steepness: Decimal::ZERO,
            ..LogisticParams::default()
        };
        assert!(bad.validate().is_err());
        let bad = LogisticParams {
            max_pd: Decimal::ZERO,
            ..LogisticParams::default()
        };
        assert!(bad.validate().is_err());
    }
}
