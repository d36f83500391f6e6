//! Engine configuration: score-scale conversion plus the presentation
//! defaults (aggregation mode, sort column, top-N, shock size) that callers
//! pass explicitly instead of keeping them in global state.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::analysis::attribution::{AggregationMode, SortKey};
use crate::error::CreditPdError;
use crate::types::Score;
use crate::CreditPdResult;

/// Conversion from a weighted percentile sum to the normalized score
/// consumed by the grade table.
///
/// `normalized = sum * conversion_factor * adjustment_factor`. When
/// `cap_at` is set, a normalized score above `conversion_factor` (the scale
/// ceiling) collapses to `cap_at`. When `round_dp` is set the result is
/// rounded half away from zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleConfig {
    pub conversion_factor: Decimal,
    #[serde(default = "one")]
    pub adjustment_factor: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cap_at: Option<Score>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_dp: Option<u32>,
}

fn one() -> Decimal {
    Decimal::ONE
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self::thousand_point()
    }
}

impl ScaleConfig {
    /// 0-1000 scale, no empirical adjustment, no cap, no rounding.
    pub fn thousand_point() -> Self {
        Self {
            conversion_factor: dec!(1000),
            adjustment_factor: Decimal::ONE,
            cap_at: None,
            round_dp: None,
        }
    }

    /// 0-100 scale with the 84.65/64 empirical adjustment, capped at 99
    /// and rounded to a whole number.
    pub fn percent_capped() -> Self {
        Self {
            conversion_factor: dec!(100),
            adjustment_factor: dec!(84.65) / dec!(64),
            cap_at: Some(dec!(99)),
            round_dp: Some(0),
        }
    }

    pub fn validate(&self) -> CreditPdResult<()> {
        if self.conversion_factor <= Decimal::ZERO {
            return Err(CreditPdError::invalid(
                "scale.conversion_factor",
                "must be positive",
            ));
        }
        if self.adjustment_factor <= Decimal::ZERO {
            return Err(CreditPdError::invalid(
                "scale.adjustment_factor",
                "must be positive",
            ));
        }
        if let Some(cap) = self.cap_at {
            if cap < Decimal::ZERO {
                return Err(CreditPdError::invalid("scale.cap_at", "must be non-negative"));
            }
        }
        Ok(())
    }

    /// Apply conversion, cap and rounding to a weighted percentile sum.
    pub fn normalize(&self, weighted_sum: Decimal) -> Score {
        let mut score = weighted_sum * self.conversion_factor * self.adjustment_factor;
        if let Some(cap) = self.cap_at {
            if score > self.conversion_factor {
                score = cap;
            }
        }
        if let Some(dp) = self.round_dp {
            score = score.round_dp_with_strategy(
                dp,
                rust_decimal::RoundingStrategy::MidpointAwayFromZero,
            );
        }
        score
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub scale: ScaleConfig,
    /// Collapse attribution to the student outcome alone.
    pub aggregate_by_major_outcome: bool,
    pub sort_column: SortKey,
    pub sort_ascending: bool,
    pub top_n: usize,
    /// Relative shock applied by the sensitivity analyzer.
    pub shock: Decimal,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scale: ScaleConfig::default(),
            aggregate_by_major_outcome: false,
            sort_column: SortKey::Contribution,
            sort_ascending: false,
            top_n: 10,
            shock: dec!(0.10),
        }
    }
}

impl EngineConfig {
    pub fn aggregation_mode(&self) -> AggregationMode {
        if self.aggregate_by_major_outcome {
            AggregationMode::ByMajorOutcome
        } else {
            AggregationMode::ByFullKey
        }
    }

    pub fn validate(&self) -> CreditPdResult<()> {
        self.scale.validate()?;
        if self.top_n == 0 {
            return Err(CreditPdError::invalid("top_n", "must be at least 1"));
        }
        if self.shock <= Decimal::ZERO {
            return Err(CreditPdError::invalid("shock", "must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn default_scale_is_thousand_point_uncapped() {
        let scale = EngineConfig::default().scale;
        assert_eq!(scale.conversion_factor, dec!(1000));
        assert_eq!(scale.adjustment_factor, Decimal::ONE);
        assert_eq!(scale.cap_at, None);
        assert_eq!(scale.round_dp, None);
    }

    #[test]
    fn test_thousand_point_normalize() {
        let scale = ScaleConfig::thousand_point();
        assert_eq!(scale.normalize(dec!(0.8123)), dec!(812.3));
        // No cap: sums above 1 pass straight through.
        assert_eq!(scale.normalize(dec!(1.2)), dec!(1200.0));
    }

    #[test]
    fn test_percent_capped_normalize() {
        let scale = ScaleConfig::percent_capped();
        // 0.5 * 100 * 84.65/64 = 66.13... -> 66
        assert_eq!(scale.normalize(dec!(0.5)), dec!(66));
        // 0.8 * 100 * 1.3227 = 105.8 > 100 -> cap 99
        assert_eq!(scale.normalize(dec!(0.8)), dec!(99));
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let cfg: EngineConfig = serde_json::from_str(r#"{"top_n": 5}"#).unwrap();
        assert_eq!(cfg.top_n, 5);
        assert_eq!(cfg.sort_column, SortKey::Contribution);
        assert_eq!(cfg.aggregation_mode(), AggregationMode::ByFullKey);
        assert_eq!(cfg.shock, dec!(0.10));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut cfg = EngineConfig::default();
        cfg.top_n = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = EngineConfig::default();
        cfg.scale.conversion_factor = Decimal::ZERO;
        assert!(cfg.validate().is_err());

        assert!(EngineConfig::default().validate().is_ok());
    }
}
