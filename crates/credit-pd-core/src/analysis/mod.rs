pub mod attribution;
pub mod curve;
pub mod flow;
#[cfg(feature = "sensitivity")]
pub mod sensitivity;

pub use attribution::{aggregate, rank, ranked_rows, AggregationMode, AttributionGroup, RankedRow, SortKey};
pub use curve::{dsr_pd_curve, CurvePoint};
pub use flow::{probability_flow, ProbabilityFlow};
#[cfg(feature = "sensitivity")]
pub use sensitivity::{compute_sensitivity, compute_sensitivity_with, run_sensitivity, SensitivityResult, ShockVariable};
