//! Sampled DSR to PD curve for charting the ability function alongside the
//! overall PD once willingness is composed in.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::CreditPdError;
use crate::model::ability::{ability_pd, LogisticParams};
use crate::model::composition::compose_pd;
use crate::types::Probability;
use crate::CreditPdResult;

pub const DEFAULT_CURVE_POINTS: usize = 101;
pub const DEFAULT_CURVE_STEP: Decimal = dec!(0.015);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub dsr: Decimal,
    pub ability_pd: Probability,
    pub overall_pd: Probability,
}

/// `points` samples starting at DSR 0, spaced `step` apart.
pub fn dsr_pd_curve(
    logistic: &LogisticParams,
    willingness_pd: Probability,
    points: usize,
    step: Decimal,
) -> CreditPdResult<Vec<CurvePoint>> {
    logistic.validate()?;
    if step <= Decimal::ZERO {
        return Err(CreditPdError::invalid("step", "must be positive"));
    }
    if willingness_pd < Decimal::ZERO || willingness_pd > Decimal::ONE {
        return Err(CreditPdError::invalid("willingness_pd", "must be in [0, 1]"));
    }

    Ok((0..points)
        .map(|i| {
            let dsr = step * Decimal::from(i as u64);
            let ability = ability_pd(dsr, logistic);
            CurvePoint {
                dsr,
                ability_pd: ability,
                overall_pd: compose_pd(ability, willingness_pd),
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_grid() {
        let curve = dsr_pd_curve(
            &LogisticParams::default(),
            dec!(0.0531),
            DEFAULT_CURVE_POINTS,
            DEFAULT_CURVE_STEP,
        )
        .unwrap();
        assert_eq!(curve.len(), 101);
        assert_eq!(curve[0].dsr, Decimal::ZERO);
        assert_eq!(curve[100].dsr, dec!(1.5));
    }

    #[test]
    fn test_overall_dominates_ability() {
        let curve = dsr_pd_curve(&LogisticParams::default(), dec!(0.0531), 101, dec!(0.015)).unwrap();
        for p in &curve {
            assert!(p.overall_pd >= p.ability_pd);
            assert!(p.overall_pd <= Decimal::ONE);
        }
        for pair in curve.windows(2) {
            assert!(pair[1].ability_pd >= pair[0].ability_pd);
        }
    }

    #[test]
    fn test_invalid_step() {
        assert!(dsr_pd_curve(&LogisticParams::default(), dec!(0.05), 10, Decimal::ZERO).is_err());
    }
}
