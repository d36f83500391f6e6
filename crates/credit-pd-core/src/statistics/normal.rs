//! Standard-normal helpers used to turn raw psychometric scores into
//! percentiles.
//!
//! Covers:
//! 1. **erf** -- Abramowitz & Stegun 7.1.26 rational approximation.
//! 2. **Phi(z)** -- `0.5 * (1 + erf(z / sqrt(2)))`.
//! 3. **z-score / percentile** -- with a neutral z of 0 for degenerate sd.
//! 4. **Normal PDF** -- for drawing per-sub-test bell curves.
//!
//! All arithmetic uses `rust_decimal::Decimal`. No `f64`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Math helpers
// ---------------------------------------------------------------------------

/// exp() arguments are clamped to this magnitude so Decimal never overflows.
pub(crate) const EXP_ARG_LIMIT: Decimal = dec!(60);

const SQRT_2: Decimal = dec!(1.4142135623730950488016887242);
const SQRT_2PI: Decimal = dec!(2.5066282746310005024157652848);

/// Taylor series exp(x) with range reduction for |x| > 2.
/// Below -EXP_ARG_LIMIT the result underflows to zero.
pub(crate) fn exp_decimal(x: Decimal) -> Decimal {
    if x < -EXP_ARG_LIMIT {
        return Decimal::ZERO;
    }
    let x = x.min(EXP_ARG_LIMIT);
    let two = dec!(2);

    if x > two || x < -two {
        let half = exp_decimal(x / two);
        return half * half;
    }

    let mut sum = Decimal::ONE;
    let mut term = Decimal::ONE;
    for n in 1u32..=25 {
        term = term * x / Decimal::from(n);
        sum += term;
    }
    sum
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Which tail of the reference distribution counts as "good" for a sub-test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Low raw scores are favourable; the percentile is the left-tail area.
    #[serde(alias = "Lower the better", alias = "L", alias = "<=")]
    LowerIsBetter,
    /// High raw scores are favourable; the percentile is the right-tail area.
    #[serde(alias = "Higher the better", alias = "R", alias = ">=")]
    HigherIsBetter,
}

impl Direction {
    /// Whether `score` clears `threshold` in this direction.
    pub fn passes(self, score: Decimal, threshold: Decimal) -> bool {
        match self {
            Direction::LowerIsBetter => score <= threshold,
            Direction::HigherIsBetter => score >= threshold,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::LowerIsBetter => write!(f, "Lower is better"),
            Direction::HigherIsBetter => write!(f, "Higher is better"),
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Error function, Abramowitz & Stegun 7.1.26 (|error| < 1.5e-7).
pub fn erf(x: Decimal) -> Decimal {
    let a1 = dec!(0.254829592);
    let a2 = dec!(-0.284496736);
    let a3 = dec!(1.421413741);
    let a4 = dec!(-1.453152027);
    let a5 = dec!(1.061405429);
    let p = dec!(0.3275911);

    let negative = x < Decimal::ZERO;
    let abs_x = x.abs();

    // erf saturates long before x*x could overflow.
    if abs_x >= dec!(10) {
        return if negative { -Decimal::ONE } else { Decimal::ONE };
    }

    let t = Decimal::ONE / (Decimal::ONE + p * abs_x);
    let poly = ((((a5 * t + a4) * t + a3) * t + a2) * t + a1) * t;
    let y = Decimal::ONE - poly * exp_decimal(-(abs_x * abs_x));

    if negative {
        -y
    } else {
        y
    }
}

/// Standard normal CDF: Phi(z) = 0.5 * (1 + erf(z / sqrt(2))).
pub fn norm_cdf(z: Decimal) -> Decimal {
    dec!(0.5) * (Decimal::ONE + erf(z / SQRT_2))
}

/// Standardised deviation from the mean. Defined as 0 when `sd <= 0`.
pub fn z_score(x: Decimal, mean: Decimal, sd: Decimal) -> Decimal {
    if sd <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (x - mean) / sd
}

/// Direction-aware percentile of `score` against N(mean, sd).
///
/// `LowerIsBetter` returns the left-tail area Phi(z); `HigherIsBetter`
/// returns the right-tail area 1 - Phi(z). Either way a more favourable
/// score yields a smaller percentile, which maps to a better grade.
pub fn percentile(score: Decimal, mean: Decimal, sd: Decimal, direction: Direction) -> Decimal {
    let left = norm_cdf(z_score(score, mean, sd));
    match direction {
        Direction::LowerIsBetter => left,
        Direction::HigherIsBetter => Decimal::ONE - left,
    }
}

/// Density of N(mean, sd) at `x`. Zero when `sd <= 0`.
pub fn normal_pdf(x: Decimal, mean: Decimal, sd: Decimal) -> Decimal {
    if sd <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let z = (x - mean) / sd;
    if z.abs() > dec!(40) {
        return Decimal::ZERO;
    }
    exp_decimal(-(z * z) / dec!(2)) / (sd * SQRT_2PI)
}
