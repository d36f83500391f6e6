use credit_pd_core::analysis::{
    aggregate, compute_sensitivity, compute_sensitivity_with, dsr_pd_curve, probability_flow, rank,
    AggregationMode, ShockVariable, SortKey,
};
use credit_pd_core::config::EngineConfig;
use credit_pd_core::model::{compute_model, LogisticParams, ModelInputs, WillingnessSource};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn reference_case() -> ModelInputs {
    ModelInputs {
        principal: dec!(500_000),
        annual_rate: dec!(0.1498),
        repayment_years: dec!(10),
        study_years: dec!(2),
        salary_dad: dec!(8000),
        salary_mum: dec!(0),
        salary_student_destination: dec!(16500),
        salary_student_home: dec!(4000),
        dropout_rate: dec!(0.02),
        grad_unemployment: dec!(0.10),
        destination_share: dec!(0.50),
        dropout_unemployment: dec!(0.20),
        parent_unemployment: dec!(0.0475),
        logistic: LogisticParams::default(),
        willingness: WillingnessSource::Grade("G".into()),
    }
}

// ===========================================================================
// Sensitivity
// ===========================================================================

#[test]
fn test_principal_shock_increases_pd() {
    let results = compute_sensitivity(&reference_case()).unwrap();
    let principal = results
        .iter()
        .find(|r| r.variable == ShockVariable::Principal)
        .unwrap();
    assert_eq!(principal.shocked_value, dec!(550_000));
    assert!(principal.pct_change > Decimal::ZERO);
    // Roughly a third higher.
    assert!(principal.pct_change > dec!(33) && principal.pct_change < dec!(33.4));
}

#[test]
fn test_sensitivity_ranking() {
    let results = compute_sensitivity(&reference_case()).unwrap();
    let order: Vec<ShockVariable> = results.iter().take(4).map(|r| r.variable).collect();
    assert_eq!(
        order,
        vec![
            ShockVariable::Principal,
            ShockVariable::AnnualRate,
            ShockVariable::SalaryDad,
            ShockVariable::RepaymentYears,
        ]
    );
}

#[test]
fn test_zero_base_pd_gives_empty_sensitivity() {
    // Every path is employed with income and the ability ceiling is so small
    // that its contribution rounds away entirely.
    let mut inputs = reference_case();
    inputs.grad_unemployment = Decimal::ZERO;
    inputs.dropout_unemployment = Decimal::ZERO;
    inputs.parent_unemployment = Decimal::ZERO;
    inputs.logistic = LogisticParams {
        max_pd: dec!(0.0000000000000000000000000001),
        steepness: dec!(100),
        inflection_dsr: dec!(0.8),
    };
    inputs.principal = dec!(1000);
    inputs.willingness = WillingnessSource::Pd(Decimal::ZERO);

    assert_eq!(compute_model(&inputs).unwrap().total_pd, Decimal::ZERO);
    assert!(compute_sensitivity(&inputs).unwrap().is_empty());
}

#[test]
fn test_configured_shock_size() {
    let inputs = reference_case();
    let small = compute_sensitivity_with(&inputs, dec!(0.01)).unwrap();
    let large = compute_sensitivity_with(&inputs, EngineConfig::default().shock).unwrap();
    let pick = |rs: &[credit_pd_core::analysis::SensitivityResult]| {
        rs.iter()
            .find(|r| r.variable == ShockVariable::Principal)
            .map(|r| r.pct_change)
            .unwrap()
    };
    assert!(pick(&small) < pick(&large));
}

// ===========================================================================
// Attribution
// ===========================================================================

#[test]
fn test_aggregation_sums_to_total_in_both_modes() {
    let out = compute_model(&reference_case()).unwrap();
    for mode in [AggregationMode::ByMajorOutcome, AggregationMode::ByFullKey] {
        let groups = aggregate(&out.scenarios, mode);
        let sum: Decimal = groups.iter().map(|g| g.weighted_pd).sum();
        assert_eq!(sum, out.total_pd);
        let mass: Decimal = groups.iter().map(|g| g.probability).sum();
        assert!((mass - Decimal::ONE).abs() < dec!(0.000000001));
        let count: usize = groups.iter().map(|g| g.count).sum();
        assert_eq!(count, 20);
    }
}

#[test]
fn test_rank_default_presentation() {
    let cfg = EngineConfig::default();
    let out = compute_model(&reference_case()).unwrap();
    let top = rank(&out.scenarios, cfg.sort_column, cfg.sort_ascending, cfg.top_n);
    assert_eq!(top.len(), 10);
    let descriptions: Vec<&str> = top.iter().take(3).map(|s| s.path.description.as_str()).collect();
    assert_eq!(
        descriptions,
        vec![
            "Grad, Unemp, Both Emp",
            "Grad, Emp Home, Both Emp",
            "Grad, Emp Dest, Both Emp",
        ]
    );
}

#[test]
fn test_rank_ascending_by_probability() {
    let out = compute_model(&reference_case()).unwrap();
    let bottom = rank(&out.scenarios, SortKey::PathProbability, true, 3);
    for pair in bottom.windows(2) {
        assert!(pair[0].path.probability <= pair[1].path.probability);
    }
}

// ===========================================================================
// Curve and flow
// ===========================================================================

#[test]
fn test_curve_uses_model_willingness() {
    let out = compute_model(&reference_case()).unwrap();
    let curve = dsr_pd_curve(&LogisticParams::default(), out.willingness_pd, 101, dec!(0.015)).unwrap();
    assert_eq!(curve.len(), 101);
    let last = curve.last().unwrap();
    assert!(last.overall_pd > dec!(0.99));
}

#[test]
fn test_flow_conserves_mass() {
    let inputs = reference_case();
    let out = compute_model(&inputs).unwrap();
    let flow = probability_flow(&inputs, &out).unwrap();
    assert!((flow.inflow("Default") - out.total_pd).abs() < dec!(0.000000001));
    assert!(
        (flow.inflow("Graduate") + flow.inflow("Dropout") - Decimal::ONE).abs()
            < dec!(0.000000001)
    );
}
