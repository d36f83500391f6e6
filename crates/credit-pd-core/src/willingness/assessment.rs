//! Raw questionnaire answers to sub-test scores: reverse-keyed items,
//! per-scale aggregation rules, catch-item screening, then the weighted
//! willingness evaluation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::score::{evaluate_willingness, SubTest, SubTestScore, WillingnessEvaluation};
use crate::config::ScaleConfig;
use crate::grading::GradeTable;
use crate::statistics::Direction;
use crate::CreditPdResult;

const NO_SUB_SCALE: &str = "N/A";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentItem {
    pub item_id: String,
    pub scale: String,
    #[serde(default)]
    pub sub_scale: String,
    pub min_score: Decimal,
    pub max_score: Decimal,
    #[serde(default)]
    pub reversed: bool,
    #[serde(default)]
    pub is_catch: bool,
}

impl AssessmentItem {
    /// Item score after reverse keying.
    pub fn keyed_score(&self, raw: Decimal) -> Decimal {
        if self.reversed {
            self.min_score + self.max_score - raw
        } else {
            raw
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub item_id: String,
    pub value: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMethod {
    #[serde(alias = "SUM")]
    Sum,
    #[serde(alias = "AVG")]
    Average,
    #[serde(alias = "SUM x 2")]
    DoubledSum,
}

impl ScoringMethod {
    fn apply(self, scores: &[Decimal]) -> Decimal {
        let sum: Decimal = scores.iter().sum();
        match self {
            ScoringMethod::Sum => sum,
            ScoringMethod::Average => {
                if scores.is_empty() {
                    Decimal::ZERO
                } else {
                    sum / Decimal::from(scores.len() as u64)
                }
            }
            ScoringMethod::DoubledSum => sum * Decimal::TWO,
        }
    }
}

/// How the items of one (scale, sub-scale) pair become a sub-test score
/// and how that score is normed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRule {
    pub scale: String,
    #[serde(default)]
    pub sub_scale: String,
    pub method: ScoringMethod,
    pub direction: Direction,
    pub threshold: Decimal,
    pub mean: Decimal,
    pub sd: Decimal,
    pub weight: Decimal,
}

impl ScoringRule {
    fn key(&self) -> String {
        rule_key(&self.scale, &self.sub_scale)
    }

    fn as_sub_test(&self, min_score: Decimal, max_score: Decimal) -> SubTest {
        SubTest {
            id: self.key(),
            test: self.scale.clone(),
            sub_scale: sub_scale_or_na(&self.sub_scale).to_string(),
            mean: self.mean,
            sd: self.sd,
            direction: self.direction,
            weight: self.weight,
            threshold: self.threshold,
            min_score,
            max_score,
        }
    }
}

/// Outcome of the catch-item screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatchFlag {
    /// Every catch item got the same answer.
    SuspiciousPattern,
    Passed,
    /// No catch items were answered.
    NotApplicable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleScore {
    pub id: String,
    pub scale: String,
    pub sub_scale: String,
    pub item_count: usize,
    /// Rounded to 2 dp.
    pub score: Decimal,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentOutput {
    pub scale_scores: Vec<ScaleScore>,
    pub catch_flag: CatchFlag,
    /// Answers whose item id has no definition.
    pub skipped_items: Vec<String>,
    /// Scale groups answered but without a scoring rule.
    pub unscored_scales: Vec<String>,
    pub evaluation: WillingnessEvaluation,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn sub_scale_or_na(sub_scale: &str) -> &str {
    let trimmed = sub_scale.trim();
    if trimmed.is_empty() || trimmed == "NaN" {
        NO_SUB_SCALE
    } else {
        trimmed
    }
}

fn rule_key(scale: &str, sub_scale: &str) -> String {
    format!("{}_{}", scale.trim(), sub_scale_or_na(sub_scale))
}

/// Items grouped by rule key, first-appearance order.
struct ScaleGroup {
    key: String,
    scores: Vec<Decimal>,
    min_score: Decimal,
    max_score: Decimal,
}

fn catch_flag(answers: &[Decimal]) -> CatchFlag {
    match answers.split_first() {
        None => CatchFlag::NotApplicable,
        Some((first, rest)) if rest.iter().all(|a| a == first) => CatchFlag::SuspiciousPattern,
        Some(_) => CatchFlag::Passed,
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Score a completed questionnaire.
pub fn score_assessment(
    items: &[AssessmentItem],
    answers: &[Answer],
    rules: &[ScoringRule],
    scale: &ScaleConfig,
    table: &GradeTable,
) -> CreditPdResult<AssessmentOutput> {
    let mut groups: Vec<ScaleGroup> = Vec::new();
    let mut catch_answers = Vec::new();
    let mut skipped_items = Vec::new();

    for answer in answers {
        let Some(item) = items.iter().find(|i| i.item_id == answer.item_id) else {
            warn!(item_id = %answer.item_id, "answer for unknown item skipped");
            skipped_items.push(answer.item_id.clone());
            continue;
        };

        let key = rule_key(&item.scale, &item.sub_scale);
        let keyed = item.keyed_score(answer.value);
        match groups.iter_mut().find(|g| g.key == key) {
            Some(group) => {
                group.scores.push(keyed);
                group.min_score += item.min_score;
                group.max_score += item.max_score;
            }
            None => groups.push(ScaleGroup {
                key,
                scores: vec![keyed],
                min_score: item.min_score,
                max_score: item.max_score,
            }),
        }

        if item.is_catch {
            catch_answers.push(answer.value);
        }
    }

    let mut definitions: Vec<SubTest> = Vec::new();
    let mut sub_scores = Vec::new();
    let mut scale_scores = Vec::new();
    let mut unscored_scales = Vec::new();

    for group in groups {
        let Some(rule) = rules.iter().find(|r| r.key() == group.key) else {
            warn!(scale = %group.key, "no scoring rule, scale left out of the overall score");
            unscored_scales.push(group.key);
            continue;
        };
        let value = rule.method.apply(&group.scores);
        let (min_score, max_score) = match rule.method {
            ScoringMethod::Sum => (group.min_score, group.max_score),
            ScoringMethod::DoubledSum => (group.min_score * Decimal::TWO, group.max_score * Decimal::TWO),
            ScoringMethod::Average => {
                let n = Decimal::from(group.scores.len() as u64);
                (group.min_score / n, group.max_score / n)
            }
        };

        scale_scores.push(ScaleScore {
            id: group.key.clone(),
            scale: rule.scale.clone(),
            sub_scale: sub_scale_or_na(&rule.sub_scale).to_string(),
            item_count: group.scores.len(),
            score: value.round_dp(2),
            passed: rule.direction.passes(value, rule.threshold),
        });
        sub_scores.push(SubTestScore {
            id: group.key,
            score: value,
        });
        definitions.push(rule.as_sub_test(min_score, max_score));
    }

    let evaluation = evaluate_willingness(&definitions, &sub_scores, scale, table)?;

    Ok(AssessmentOutput {
        scale_scores,
        catch_flag: catch_flag(&catch_answers),
        skipped_items,
        unscored_scales,
        evaluation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(id: &str, scale: &str, sub: &str, range: (Decimal, Decimal), reversed: bool, is_catch: bool) -> AssessmentItem {
        AssessmentItem {
            item_id: id.into(),
            scale: scale.into(),
            sub_scale: sub.into(),
            min_score: range.0,
            max_score: range.1,
            reversed,
            is_catch,
        }
    }

    fn answer(id: &str, value: Decimal) -> Answer {
        Answer {
            item_id: id.into(),
            value,
        }
    }

    fn fixture() -> (Vec<AssessmentItem>, Vec<ScoringRule>) {
        let items = vec![
            item("c1", "CFC", "", (dec!(1), dec!(5)), false, false),
            item("c2", "CFC", "", (dec!(1), dec!(5)), true, false),
            item("d1", "DASS-21", "Stress", (dec!(0), dec!(3)), false, false),
            item("d2", "DASS-21", "Stress", (dec!(0), dec!(3)), false, false),
            item("k1", "Attention", "", (dec!(1), dec!(5)), false, true),
            item("k2", "Attention", "", (dec!(1), dec!(5)), false, true),
        ];
        let rules = vec![
            ScoringRule {
                scale: "CFC".into(),
                sub_scale: "".into(),
                method: ScoringMethod::Sum,
                direction: Direction::HigherIsBetter,
                threshold: dec!(6),
                mean: dec!(6),
                sd: dec!(2),
                weight: dec!(0.5),
            },
            ScoringRule {
                scale: "DASS-21".into(),
                sub_scale: "Stress".into(),
                method: ScoringMethod::DoubledSum,
                direction: Direction::LowerIsBetter,
                threshold: dec!(4),
                mean: dec!(4),
                sd: dec!(2),
                weight: dec!(0.5),
            },
        ];
        (items, rules)
    }

    #[test]
    fn test_reverse_keying() {
        let it = item("x", "S", "", (dec!(1), dec!(5)), true, false);
        assert_eq!(it.keyed_score(dec!(1)), dec!(5));
        assert_eq!(it.keyed_score(dec!(4)), dec!(2));
    }

    #[test]
    fn test_methods() {
        let s = [dec!(1), dec!(2), dec!(4)];
        assert_eq!(ScoringMethod::Sum.apply(&s), dec!(7));
        assert_eq!(ScoringMethod::DoubledSum.apply(&s), dec!(14));
        assert_eq!(ScoringMethod::Average.apply(&s).round_dp(4), dec!(2.3333));
        assert_eq!(ScoringMethod::Average.apply(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_catch_flag() {
        assert_eq!(catch_flag(&[]), CatchFlag::NotApplicable);
        assert_eq!(catch_flag(&[dec!(3), dec!(3)]), CatchFlag::SuspiciousPattern);
        assert_eq!(catch_flag(&[dec!(3), dec!(4)]), CatchFlag::Passed);
    }

    #[test]
    fn test_full_questionnaire() {
        let (items, rules) = fixture();
        let answers = vec![
            answer("c1", dec!(5)),
            answer("c2", dec!(1)),
            answer("d1", dec!(1)),
            answer("d2", dec!(1)),
            answer("k1", dec!(3)),
            answer("k2", dec!(3)),
            answer("zz", dec!(2)),
        ];
        let out = score_assessment(
            &items,
            &answers,
            &rules,
            &ScaleConfig::percent_capped(),
            &GradeTable::percent_point(),
        )
        .unwrap();

        assert_eq!(out.scale_scores.len(), 2);
        assert_eq!(out.scale_scores[0].id, "CFC_N/A");
        assert_eq!(out.scale_scores[0].score, dec!(10));
        assert!(out.scale_scores[0].passed);
        assert_eq!(out.scale_scores[1].id, "DASS-21_Stress");
        assert_eq!(out.scale_scores[1].score, dec!(4));
        assert!(out.scale_scores[1].passed);

        assert_eq!(out.catch_flag, CatchFlag::SuspiciousPattern);
        assert_eq!(out.skipped_items, vec!["zz".to_string()]);
        assert_eq!(out.unscored_scales, vec!["Attention_N/A".to_string()]);

        // 0.5 * (1 - Phi(2)) + 0.5 * Phi(0) = 0.2614; * 100 * 84.65/64 = 34.6 -> 35
        assert_eq!(out.evaluation.normalized_score, dec!(35));
        assert_eq!(out.evaluation.grade, "A");
    }

    #[test]
    fn test_rule_method_aliases() {
        let m: ScoringMethod = serde_json::from_str(r#""SUM x 2""#).unwrap();
        assert_eq!(m, ScoringMethod::DoubledSum);
        let m: ScoringMethod = serde_json::from_str(r#""AVG""#).unwrap();
        assert_eq!(m, ScoringMethod::Average);
    }
}
