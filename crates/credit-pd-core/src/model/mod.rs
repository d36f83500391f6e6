pub mod ability;
pub mod composition;
pub mod inputs;
pub mod scenario_tree;

pub use ability::{ability_pd, LogisticParams};
pub use composition::{compute_model, compute_model_with_table, run_model, ModelOutput, ScenarioOutcome};
pub use inputs::{ModelInputs, WillingnessSource};
pub use scenario_tree::{
    enumerate_paths, ParentalStatus, PathTag, ScenarioPath, StudentOutcome, SENTINEL_DSR,
};
