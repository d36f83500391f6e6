use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::model::ScenarioOutcome;
use crate::types::Probability;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How scenario paths are grouped for attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
    /// Student outcome only, e.g. "Graduate, Employed".
    ByMajorOutcome,
    /// Student outcome plus parental status, e.g. "Graduate, Employed (Both Emp)".
    ByFullKey,
}

/// Column used to order ranked scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    PathProbability,
    ConditionalPd,
    Contribution,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionGroup {
    pub label: String,
    pub weighted_pd: Probability,
    pub probability: Probability,
    pub count: usize,
    /// `weighted_pd / probability`, zero for an empty group.
    pub conditional_pd: Probability,
    /// Share of the total PD, in percent.
    pub share_pct: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRow {
    pub rank: usize,
    pub description: String,
    pub probability: Probability,
    pub conditional_pd: Probability,
    pub weighted_pd: Probability,
    pub contribution_pct: Decimal,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

fn group_label(outcome: &ScenarioOutcome, mode: AggregationMode) -> String {
    match mode {
        AggregationMode::ByMajorOutcome => outcome.path.student.major_label().to_string(),
        AggregationMode::ByFullKey => outcome.path.full_key(),
    }
}

fn pct_of(part: Decimal, total: Decimal) -> Decimal {
    if total.is_zero() {
        Decimal::ZERO
    } else {
        part / total * dec!(100)
    }
}

/// Group scenarios by label, keeping groups in first-appearance order.
pub fn aggregate(scenarios: &[ScenarioOutcome], mode: AggregationMode) -> Vec<AttributionGroup> {
    let mut groups: Vec<AttributionGroup> = Vec::new();

    for outcome in scenarios {
        let label = group_label(outcome, mode);
        match groups.iter_mut().find(|g| g.label == label) {
            Some(group) => {
                group.weighted_pd += outcome.weighted_pd;
                group.probability += outcome.path.probability;
                group.count += 1;
            }
            None => groups.push(AttributionGroup {
                label,
                weighted_pd: outcome.weighted_pd,
                probability: outcome.path.probability,
                count: 1,
                conditional_pd: Decimal::ZERO,
                share_pct: Decimal::ZERO,
            }),
        }
    }

    let total: Decimal = groups.iter().map(|g| g.weighted_pd).sum();
    for group in &mut groups {
        group.conditional_pd = if group.probability.is_zero() {
            Decimal::ZERO
        } else {
            group.weighted_pd / group.probability
        };
        group.share_pct = pct_of(group.weighted_pd, total);
    }
    groups
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

fn sort_value(outcome: &ScenarioOutcome, key: SortKey) -> Decimal {
    match key {
        SortKey::PathProbability => outcome.path.probability,
        SortKey::ConditionalPd => outcome.conditional_pd,
        SortKey::Contribution => outcome.weighted_pd,
    }
}

/// Sort scenarios by `sort_key` and keep the first `top_n`. Ties keep their
/// enumeration order in either direction.
pub fn rank(
    scenarios: &[ScenarioOutcome],
    sort_key: SortKey,
    ascending: bool,
    top_n: usize,
) -> Vec<ScenarioOutcome> {
    let mut sorted = scenarios.to_vec();
    sorted.sort_by(|a, b| {
        let (x, y) = (sort_value(a, sort_key), sort_value(b, sort_key));
        if ascending {
            x.cmp(&y)
        } else {
            y.cmp(&x)
        }
    });
    sorted.truncate(top_n);
    sorted
}

/// [`rank`] flattened into numbered rows with each path's share of `total_pd`.
pub fn ranked_rows(
    scenarios: &[ScenarioOutcome],
    total_pd: Probability,
    sort_key: SortKey,
    ascending: bool,
    top_n: usize,
) -> Vec<RankedRow> {
    rank(scenarios, sort_key, ascending, top_n)
        .into_iter()
        .enumerate()
        .map(|(i, s)| RankedRow {
            rank: i + 1,
            contribution_pct: pct_of(s.weighted_pd, total_pd),
            description: s.path.description,
            probability: s.path.probability,
            conditional_pd: s.conditional_pd,
            weighted_pd: s.weighted_pd,
        })
        .collect()
}
