use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::ScaleConfig;
use crate::error::CreditPdError;
use crate::grading::GradeTable;
use crate::statistics::{normal_pdf, percentile, z_score, Direction};
use crate::types::{Probability, Score};
use crate::CreditPdResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Reference norms for one psychometric sub-test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTest {
    pub id: String,
    pub test: String,
    pub sub_scale: String,
    pub mean: Decimal,
    pub sd: Decimal,
    pub direction: Direction,
    pub weight: Decimal,
    pub threshold: Decimal,
    pub min_score: Decimal,
    pub max_score: Decimal,
}

impl SubTest {
    /// "BFI-2-S - Conscientiousness", or just the test name for single-scale tests.
    pub fn display_name(&self) -> String {
        if self.sub_scale.is_empty() || self.sub_scale.eq_ignore_ascii_case("overall") {
            self.test.clone()
        } else {
            format!("{} - {}", self.test, self.sub_scale)
        }
    }

    /// `points` samples of the reference density over `[min_score, max_score]`.
    pub fn density_curve(&self, points: usize) -> Vec<(Decimal, Decimal)> {
        if points < 2 {
            return vec![(self.mean, normal_pdf(self.mean, self.mean, self.sd))];
        }
        let step = (self.max_score - self.min_score) / Decimal::from((points - 1) as u64);
        (0..points)
            .map(|i| {
                let x = self.min_score + step * Decimal::from(i as u64);
                (x, normal_pdf(x, self.mean, self.sd))
            })
            .collect()
    }

    fn evaluate(&self, score: Decimal) -> SubTestResult {
        let pct = percentile(score, self.mean, self.sd, self.direction);
        SubTestResult {
            id: self.id.clone(),
            name: self.display_name(),
            score,
            z_score: z_score(score, self.mean, self.sd),
            percentile: pct,
            contribution: pct * self.weight,
            threshold: self.threshold,
            direction: self.direction,
            passed: self.direction.passes(score, self.threshold),
        }
    }
}

/// A candidate's raw score on one sub-test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTestScore {
    pub id: String,
    pub score: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTestResult {
    pub id: String,
    pub name: String,
    pub score: Decimal,
    pub z_score: Decimal,
    pub percentile: Probability,
    /// `percentile * weight`
    pub contribution: Decimal,
    pub threshold: Decimal,
    pub direction: Direction,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WillingnessEvaluation {
    pub weighted_sum: Decimal,
    pub normalized_score: Score,
    pub grade: String,
    pub pd: Probability,
    pub sub_tests: Vec<SubTestResult>,
}

// ---------------------------------------------------------------------------
// Reference battery
// ---------------------------------------------------------------------------

fn sub_test(
    id: &str,
    test: &str,
    sub_scale: &str,
    norms: (Decimal, Decimal),
    direction: Direction,
    weight: Decimal,
    threshold: Decimal,
    range: (Decimal, Decimal),
) -> SubTest {
    SubTest {
        id: id.into(),
        test: test.into(),
        sub_scale: sub_scale.into(),
        mean: norms.0,
        sd: norms.1,
        direction,
        weight,
        threshold,
        min_score: range.0,
        max_score: range.1,
    }
}

/// The eleven-scale battery used with the 0-1000 grade table. Weights sum to 1.
pub fn standard_battery() -> Vec<SubTest> {
    use Direction::{HigherIsBetter as Hi, LowerIsBetter as Lo};
    vec![
        sub_test("bfi_conscientiousness", "BFI-2-S", "Conscientiousness", (dec!(3.29), dec!(0.59)), Hi, dec!(0.30), dec!(3.0), (dec!(1), dec!(5))),
        sub_test("bfi_negative_emotionality", "BFI-2-S", "Negative Emotionality", (dec!(2.96), dec!(0.67)), Lo, dec!(0.15), dec!(3.3), (dec!(1), dec!(5))),
        sub_test("bfi_agreeableness", "BFI-2-S", "Agreeableness", (dec!(3.69), dec!(0.47)), Hi, dec!(0), dec!(3.4), (dec!(1), dec!(5))),
        sub_test("bfi_extraversion", "BFI-2-S", "Extraversion", (dec!(3.19), dec!(0.66)), Hi, dec!(0), dec!(2.8), (dec!(1), dec!(5))),
        sub_test("bfi_open_mindedness", "BFI-2-S", "Open-Mindedness", (dec!(3.57), dec!(0.59)), Hi, dec!(0), dec!(3.3), (dec!(1), dec!(5))),
        sub_test("gse", "GSE", "Overall", (dec!(23.05), dec!(7.09)), Hi, dec!(0.15), dec!(19.3), (dec!(10), dec!(50))),
        sub_test("cfc", "CFC", "Overall", (dec!(30.20), dec!(5.40)), Hi, dec!(0.15), dec!(27.4), (dec!(12), dec!(60))),
        sub_test("mlq_presence", "MLQ", "Presence of Meaning", (dec!(14.24), dec!(4.46)), Hi, dec!(0.05), dec!(11.9), (dec!(5), dec!(25))),
        sub_test("mlq_search", "MLQ", "Search for Meaning", (dec!(15.70), dec!(4.41)), Hi, dec!(0.05), dec!(13.4), (dec!(5), dec!(25))),
        sub_test("growth_mindset", "Growth Mindset", "Overall", (dec!(4.30), dec!(0.44)), Hi, dec!(0.05), dec!(4.1), (dec!(1), dec!(5))),
        sub_test("bis_11", "BIS-11", "Overall", (dec!(13.49), dec!(3.09)), Lo, dec!(0.10), dec!(15.1), (dec!(8), dec!(40))),
    ]
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

fn validate_definitions(definitions: &[SubTest]) -> CreditPdResult<()> {
    for (i, def) in definitions.iter().enumerate() {
        if def.weight < Decimal::ZERO {
            return Err(CreditPdError::invalid(
                format!("sub_tests[{}].weight", def.id),
                "must be non-negative",
            ));
        }
        if definitions[..i].iter().any(|d| d.id == def.id) {
            return Err(CreditPdError::invalid(
                format!("sub_tests[{}]", def.id),
                "duplicate sub-test id",
            ));
        }
    }
    Ok(())
}

fn finish(
    results: Vec<SubTestResult>,
    scale: &ScaleConfig,
    table: &GradeTable,
) -> WillingnessEvaluation {
    let weighted_sum: Decimal = results.iter().map(|r| r.contribution).sum();
    let normalized_score = scale.normalize(weighted_sum);
    let entry = table.lookup(normalized_score);
    WillingnessEvaluation {
        weighted_sum,
        normalized_score,
        grade: entry.grade.clone(),
        pd: entry.pd,
        sub_tests: results,
    }
}

/// Score a candidate against a sub-test battery and resolve the normalized
/// score to a grade and willingness PD.
///
/// Sub-tests without a score contribute nothing. A score for an id that is
/// not in `definitions` is an error, as is having no scores at all.
pub fn evaluate_willingness(
    definitions: &[SubTest],
    scores: &[SubTestScore],
    scale: &ScaleConfig,
    table: &GradeTable,
) -> CreditPdResult<WillingnessEvaluation> {
    validate_definitions(definitions)?;
    scale.validate()?;

    let by_id: HashMap<&str, Decimal> = scores.iter().map(|s| (s.id.as_str(), s.score)).collect();
    if let Some(unknown) = scores.iter().find(|s| !definitions.iter().any(|d| d.id == s.id)) {
        return Err(CreditPdError::invalid(
            format!("scores[{}]", unknown.id),
            "no sub-test with this id",
        ));
    }

    let results: Vec<SubTestResult> = definitions
        .iter()
        .filter_map(|def| by_id.get(def.id.as_str()).map(|score| def.evaluate(*score)))
        .collect();
    if results.is_empty() {
        return Err(CreditPdError::InsufficientData(
            "no scored sub-tests to evaluate".into(),
        ));
    }

    Ok(finish(results, scale, table))
}

// ---------------------------------------------------------------------------
// Incremental scorer
// ---------------------------------------------------------------------------

/// Holds per-sub-test contributions so a single changed answer re-evaluates
/// only its own sub-test.
#[derive(Debug, Clone)]
pub struct WillingnessScorer {
    definitions: Vec<SubTest>,
    scale: ScaleConfig,
    table: GradeTable,
    results: Vec<Option<SubTestResult>>,
}

impl WillingnessScorer {
    pub fn new(definitions: Vec<SubTest>, scale: ScaleConfig, table: GradeTable) -> CreditPdResult<Self> {
        validate_definitions(&definitions)?;
        scale.validate()?;
        let results = vec![None; definitions.len()];
        Ok(Self {
            definitions,
            scale,
            table,
            results,
        })
    }

    pub fn update_score(&mut self, id: &str, score: Decimal) -> CreditPdResult<&SubTestResult> {
        let idx = self
            .definitions
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| CreditPdError::invalid(format!("scores[{id}]"), "no sub-test with this id"))?;
        let slot = &mut self.results[idx];
        Ok(slot.insert(self.definitions[idx].evaluate(score)))
    }

    pub fn clear_score(&mut self, id: &str) {
        if let Some(idx) = self.definitions.iter().position(|d| d.id == id) {
            self.results[idx] = None;
        }
    }

    pub fn evaluation(&self) -> WillingnessEvaluation {
        let results = self.results.iter().flatten().cloned().collect();
        finish(results, &self.scale, &self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn scores(pairs: &[(&str, Decimal)]) -> Vec<SubTestScore> {
        pairs
            .iter()
            .map(|(id, score)| SubTestScore {
                id: id.to_string(),
                score: *score,
            })
            .collect()
    }

    #[test]
    fn test_battery_weights_sum_to_one() {
        let total: Decimal = standard_battery().iter().map(|t| t.weight).sum();
        assert_eq!(total, Decimal::ONE);
    }

    #[test]
    fn test_scores_at_the_mean() {
        // Every sub-test scored at its mean: each percentile is 0.5 up to the
        // erf approximation error.
        let battery = standard_battery();
        let s: Vec<SubTestScore> = battery
            .iter()
            .map(|t| SubTestScore {
                id: t.id.clone(),
                score: t.mean,
            })
            .collect();
        let eval = evaluate_willingness(&battery, &s, &ScaleConfig::default(), &GradeTable::default()).unwrap();
        assert!((eval.weighted_sum - dec!(0.5)).abs() < dec!(0.000001));
        assert!((eval.normalized_score - dec!(500)).abs() < dec!(0.001));
        assert_eq!(eval.grade, "B");
        assert_eq!(eval.pd, dec!(0.0028));
    }

    #[test]
    fn test_order_independent() {
        let battery = standard_battery();
        let a = scores(&[("gse", dec!(30)), ("bis_11", dec!(12)), ("cfc", dec!(40))]);
        let b = scores(&[("cfc", dec!(40)), ("gse", dec!(30)), ("bis_11", dec!(12))]);
        let ea = evaluate_willingness(&battery, &a, &ScaleConfig::default(), &GradeTable::default()).unwrap();
        let eb = evaluate_willingness(&battery, &b, &ScaleConfig::default(), &GradeTable::default()).unwrap();
        assert_eq!(ea, eb);
    }

    #[test]
    fn test_unknown_id_rejected() {
        let s = scores(&[("nope", dec!(1))]);
        assert!(evaluate_willingness(&standard_battery(), &s, &ScaleConfig::default(), &GradeTable::default()).is_err());
    }

    #[test]
    fn test_no_scores_is_insufficient() {
        let result = evaluate_willingness(&standard_battery(), &[], &ScaleConfig::default(), &GradeTable::default());
        assert!(matches!(result, Err(CreditPdError::InsufficientData(_))));
    }

    #[test]
    fn test_pass_fail() {
        let battery = standard_battery();
        let s = scores(&[("bis_11", dec!(15.1)), ("gse", dec!(19))]);
        let eval = evaluate_willingness(&battery, &s, &ScaleConfig::default(), &GradeTable::default()).unwrap();
        let bis = eval.sub_tests.iter().find(|r| r.id == "bis_11").unwrap();
        let gse = eval.sub_tests.iter().find(|r| r.id == "gse").unwrap();
        assert!(bis.passed);
        assert!(!gse.passed);
    }

    #[test]
    fn test_incremental_matches_batch() {
        let battery = standard_battery();
        let s = scores(&[("gse", dec!(30)), ("bis_11", dec!(12)), ("cfc", dec!(40))]);
        let batch = evaluate_willingness(&battery, &s, &ScaleConfig::default(), &GradeTable::default()).unwrap();

        let mut scorer = WillingnessScorer::new(battery, ScaleConfig::default(), GradeTable::default()).unwrap();
        scorer.update_score("gse", dec!(10)).unwrap();
        scorer.update_score("bis_11", dec!(12)).unwrap();
        scorer.update_score("cfc", dec!(40)).unwrap();
        scorer.update_score("gse", dec!(30)).unwrap();
        assert_eq!(scorer.evaluation(), batch);

        scorer.clear_score("cfc");
        assert!(scorer.evaluation().weighted_sum < batch.weighted_sum);
        assert!(scorer.update_score("nope", dec!(1)).is_err());
    }

    #[test]
    fn test_density_curve_spans_range() {
        let battery = standard_battery();
        let curve = battery[0].density_curve(5);
        assert_eq!(curve.len(), 5);
        assert_eq!(curve[0].0, dec!(1));
        assert_eq!(curve[4].0, dec!(5));
        assert!(curve.iter().all(|(_, d)| *d > Decimal::ZERO));
    }

    #[test]
    fn test_display_name() {
        let battery = standard_battery();
        assert_eq!(battery[0].display_name(), "BFI-2-S - Conscientiousness");
        assert_eq!(battery[5].display_name(), "GSE");
    }
}
