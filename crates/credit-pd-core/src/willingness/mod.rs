//! Willingness-to-pay: psychometric sub-test scores normalized against
//! reference norms, combined by weight and mapped through a grade table.

pub mod assessment;
pub mod score;

pub use assessment::{
    score_assessment, Answer, AssessmentItem, AssessmentOutput, CatchFlag, ScaleScore, ScoringMethod,
    ScoringRule,
};
pub use score::{
    evaluate_willingness, standard_battery, SubTest, SubTestResult, SubTestScore,
    WillingnessEvaluation, WillingnessScorer,
};
