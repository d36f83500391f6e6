use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use credit_pd_core::analysis::{attribution, curve, flow, sensitivity};
use credit_pd_core::config::{EngineConfig, ScaleConfig};
use credit_pd_core::grading::{self, GradeTable};
use credit_pd_core::model::{self, LogisticParams, ModelInputs};
use credit_pd_core::types::{Probability, Score};
use credit_pd_core::willingness::{self, Answer, AssessmentItem, ScoringRule, SubTest, SubTestScore};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse<'a, T: Deserialize<'a>>(input_json: &'a str) -> NapiResult<T> {
    serde_json::from_str(input_json).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Request shapes
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ModelRequest {
    inputs: ModelInputs,
    #[serde(default)]
    grade_table: GradeTable,
    #[serde(default)]
    config: EngineConfig,
}

#[derive(Deserialize)]
struct GradeRequest {
    score: Score,
    #[serde(default)]
    grade_table: GradeTable,
}

#[derive(Deserialize)]
struct WillingnessRequest {
    #[serde(default)]
    definitions: Option<Vec<SubTest>>,
    scores: Vec<SubTestScore>,
    #[serde(default)]
    scale: ScaleConfig,
    #[serde(default)]
    grade_table: GradeTable,
}

#[derive(Deserialize)]
struct AssessmentRequest {
    items: Vec<AssessmentItem>,
    answers: Vec<Answer>,
    rules: Vec<ScoringRule>,
    #[serde(default)]
    scale: ScaleConfig,
    #[serde(default)]
    grade_table: GradeTable,
}

#[derive(Deserialize)]
struct CurveRequest {
    #[serde(default)]
    logistic: LogisticParams,
    willingness_pd: Probability,
    #[serde(default)]
    points: Option<usize>,
    #[serde(default)]
    step: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

#[napi]
pub fn compute_model(input_json: String) -> NapiResult<String> {
    let req: ModelRequest = parse(&input_json)?;
    let output = model::run_model(&req.inputs, &req.grade_table).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compute_sensitivity(input_json: String) -> NapiResult<String> {
    let req: ModelRequest = parse(&input_json)?;
    let output = sensitivity::run_sensitivity(&req.inputs, req.config.shock, &req.grade_table)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn attribution_report(input_json: String) -> NapiResult<String> {
    let req: ModelRequest = parse(&input_json)?;
    req.config.validate().map_err(to_napi_error)?;
    let output =
        model::compute_model_with_table(&req.inputs, &req.grade_table).map_err(to_napi_error)?;
    let cfg = &req.config;
    let report = serde_json::json!({
        "total_pd": output.total_pd,
        "groups": attribution::aggregate(&output.scenarios, cfg.aggregation_mode()),
        "ranked": attribution::ranked_rows(
            &output.scenarios,
            output.total_pd,
            cfg.sort_column,
            cfg.sort_ascending,
            cfg.top_n,
        ),
    });
    serde_json::to_string(&report).map_err(to_napi_error)
}

#[napi]
pub fn dsr_pd_curve(input_json: String) -> NapiResult<String> {
    let req: CurveRequest = parse(&input_json)?;
    let points = curve::dsr_pd_curve(
        &req.logistic,
        req.willingness_pd,
        req.points.unwrap_or(curve::DEFAULT_CURVE_POINTS),
        req.step.unwrap_or(curve::DEFAULT_CURVE_STEP),
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&points).map_err(to_napi_error)
}

#[napi]
pub fn probability_flow(input_json: String) -> NapiResult<String> {
    let req: ModelRequest = parse(&input_json)?;
    let output =
        model::compute_model_with_table(&req.inputs, &req.grade_table).map_err(to_napi_error)?;
    let graph = flow::probability_flow(&req.inputs, &output).map_err(to_napi_error)?;
    serde_json::to_string(&graph).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Willingness
// ---------------------------------------------------------------------------

#[napi]
pub fn lookup_grade(input_json: String) -> NapiResult<String> {
    let req: GradeRequest = parse(&input_json)?;
    let lookup = grading::lookup_grade(&req.grade_table, req.score);
    serde_json::to_string(&lookup).map_err(to_napi_error)
}

#[napi]
pub fn evaluate_willingness(input_json: String) -> NapiResult<String> {
    let req: WillingnessRequest = parse(&input_json)?;
    let definitions = req.definitions.unwrap_or_else(willingness::standard_battery);
    let output =
        willingness::evaluate_willingness(&definitions, &req.scores, &req.scale, &req.grade_table)
            .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn score_assessment(input_json: String) -> NapiResult<String> {
    let req: AssessmentRequest = parse(&input_json)?;
    let output = willingness::score_assessment(
        &req.items,
        &req.answers,
        &req.rules,
        &req.scale,
        &req.grade_table,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
