//! Node/link graph of probability mass through the scenario tree, from the
//! enrolled cohort down to default or repayment.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::attribution::{aggregate, AggregationMode};
use crate::error::CreditPdError;
use crate::model::scenario_tree::{survival, BranchProbabilities, StudentOutcome};
use crate::model::{ModelInputs, ModelOutput};
use crate::types::Probability;
use crate::CreditPdResult;

/// Links carrying no more than this are dropped below the study level.
pub const MIN_LINK_MASS: Decimal = dec!(0.000000001);

/// Longest study period the graph will chart year by year.
pub const MAX_CHARTED_YEARS: u32 = 100;

const ENROLLED: &str = "Enrolled";
const GRADUATE: &str = "Graduate";
const DROPOUT: &str = "Dropout";
const DEFAULT: &str = "Default";
const NO_DEFAULT: &str = "No Default";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowNode {
    pub id: usize,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowLink {
    pub source: usize,
    pub target: usize,
    pub value: Probability,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityFlow {
    pub nodes: Vec<FlowNode>,
    pub links: Vec<FlowLink>,
}

impl ProbabilityFlow {
    fn node(&mut self, label: &str) -> usize {
        if let Some(n) = self.nodes.iter().find(|n| n.label == label) {
            return n.id;
        }
        let id = self.nodes.len();
        self.nodes.push(FlowNode {
            id,
            label: label.to_string(),
        });
        id
    }

    fn link(&mut self, from: &str, to: &str, value: Probability) {
        let source = self.node(from);
        let target = self.node(to);
        self.links.push(FlowLink {
            source,
            target,
            value,
        });
    }

    fn link_if_material(&mut self, from: &str, to: &str, value: Probability) {
        if value > MIN_LINK_MASS {
            self.link(from, to, value);
        }
    }

    /// Total mass entering the node with this label.
    pub fn inflow(&self, label: &str) -> Probability {
        self.nodes
            .iter()
            .find(|n| n.label == label)
            .map(|n| {
                self.links
                    .iter()
                    .filter(|l| l.target == n.id)
                    .map(|l| l.value)
                    .sum()
            })
            .unwrap_or(Decimal::ZERO)
    }
}

/// Build the flow graph for an evaluated model.
///
/// Each whole study year splits the surviving cohort into those who
/// continue and those who drop out; the final year's survivors graduate.
pub fn probability_flow(inputs: &ModelInputs, output: &ModelOutput) -> CreditPdResult<ProbabilityFlow> {
    let years = inputs
        .study_years
        .ceil()
        .to_u32()
        .filter(|y| *y <= MAX_CHARTED_YEARS)
        .ok_or_else(|| {
            CreditPdError::invalid(
                "study_years",
                format!("at most {MAX_CHARTED_YEARS} years can be charted"),
            )
        })?;
    let branches = BranchProbabilities::from_inputs(inputs)?;
    let continue_rate = Decimal::ONE - inputs.dropout_rate;

    let mut flow = ProbabilityFlow::default();
    flow.node(ENROLLED);

    // Study phase
    let mut previous = ENROLLED.to_string();
    let mut surviving = Decimal::ONE;
    if years == 0 {
        flow.link(ENROLLED, GRADUATE, Decimal::ONE);
    }
    for year in 1..=years {
        let next = if year == years {
            branches.graduate
        } else {
            survival(continue_rate, Decimal::from(year))?
        };
        let target = if year == years {
            GRADUATE.to_string()
        } else {
            format!("Year {year}")
        };
        flow.link(&previous, &target, next);
        flow.link(&previous, DROPOUT, surviving - next);
        previous = target;
        surviving = next;
    }

    // Employment
    for student in StudentOutcome::ALL {
        let from = if student.is_graduate() { GRADUATE } else { DROPOUT };
        flow.link_if_material(from, student.major_label(), branches.student(student));
    }

    // Parental status, then default
    for group in aggregate(&output.scenarios, AggregationMode::ByFullKey) {
        if group.probability <= MIN_LINK_MASS {
            continue;
        }
        let major = group
            .label
            .split(" (")
            .next()
            .unwrap_or(group.label.as_str())
            .to_string();
        flow.link(&major, &group.label, group.probability);
        flow.link_if_material(&group.label, DEFAULT, group.weighted_pd);
        flow.link_if_material(&group.label, NO_DEFAULT, group.probability - group.weighted_pd);
    }

    Ok(flow)
}
