use carbon_dividend::core::{
    PolicyParameters, SimulationError, TrajectorySeries, TrajectorySummary, ZeroFeePolicy,
    simulate,
};

fn assert_relative(actual: f64, expected: f64) {
    let tol = 1e-6 * expected.abs().max(1.0);
    assert!(
        (actual - expected).abs() <= tol,
        "expected {expected}, got {actual}, tolerance {tol}"
    );
}

#[test]
fn reference_scenario_first_two_years() {
    let params = PolicyParameters {
        horizon_years: 2,
        ..PolicyParameters::default()
    };
    let records = simulate(&params).expect("reference scenario is valid");

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].year, 2027);
    assert_relative(records[0].fee_per_ton, 30.0);
    assert_relative(records[0].emissions, 55.0);
    assert_relative(records[0].gross_revenue, 1.65);
    assert_eq!(records[1].year, 2028);
    assert_relative(records[1].fee_per_ton, 40.0);
    assert_relative(records[1].emissions, 49.5);
    assert_relative(records[1].gross_revenue, 1.98);
}

#[test]
fn default_decade_is_consistent_end_to_end() {
    let params = PolicyParameters::default();
    let records = simulate(&params).expect("defaults are valid");
    let series = TrajectorySeries::from_records(&records);
    let summary = TrajectorySummary::from_records(&records, params.cpf_target_billion)
        .expect("non-empty trajectory");

    assert_eq!(records.len(), 10);
    assert_eq!(series.years.first(), Some(&2027));
    assert_eq!(series.years.last(), Some(&2036));
    assert!(summary.emissions_reduction_pct > 0.0);
    assert_relative(
        summary.final_cpf_balance,
        records.last().expect("non-empty").cpf_balance,
    );
}

#[test]
fn concurrent_runs_are_independent() {
    let handles = (0..4u32)
        .map(|i| {
            std::thread::spawn(move || {
                let params = PolicyParameters {
                    fee_increment: 5.0 * f64::from(i),
                    ..PolicyParameters::default()
                };
                simulate(&params).expect("valid params")
            })
        })
        .collect::<Vec<_>>();

    let results = handles
        .into_iter()
        .map(|h| h.join().expect("thread should not panic"))
        .collect::<Vec<_>>();

    for (i, records) in results.iter().enumerate() {
        let params = PolicyParameters {
            fee_increment: 5.0 * i as f64,
            ..PolicyParameters::default()
        };
        assert_eq!(records, &simulate(&params).expect("valid params"));
    }
}

#[test]
fn degenerate_zero_fee_surfaces_typed_error() {
    let params = PolicyParameters {
        fee_start: 0.0,
        zero_fee_policy: ZeroFeePolicy::Reject,
        ..PolicyParameters::default()
    };
    let err = simulate(&params).expect_err("reject policy must fail");
    assert!(matches!(
        err,
        SimulationError::ArithmeticDegenerate { year: 2028, .. }
    ));
}
