//! Projection calculator integration tests.

use bespoke_model::core::projection::{project, validate};
use bespoke_model::error::ModelError;
use bespoke_model::types::ProjectionInput;
use pretty_assertions::assert_eq;

fn input(base_revenue: f64, base_expenses: f64, growth_rate: f64) -> ProjectionInput {
    ProjectionInput {
        address: None,
        square_footage: None,
        floor_count: None,
        base_revenue,
        base_expenses,
        growth_rate,
    }
}

#[test]
fn test_reference_projection() {
    let report = project(&input(500_000.0, 300_000.0, 0.05)).unwrap();

    let y1 = &report.projections[0];
    assert_eq!(y1.revenue, 500_000.0);
    assert_eq!(y1.expenses, 300_000.0);
    assert_eq!(y1.net_income, 200_000.0);
    assert_eq!(y1.roi, 40.0);

    let y2 = &report.projections[1];
    assert!((y2.revenue - 525_000.0).abs() < 1e-6);
}

#[test]
fn test_expenses_grow_slower_than_revenue() {
    let report = project(&input(500_000.0, 300_000.0, 0.05)).unwrap();
    // Revenue compounds at 5%, expenses at 4%; ROI improves every year.
    for pair in report.projections.windows(2) {
        assert!(pair[1].roi > pair[0].roi);
    }
}

#[test]
fn test_summary_matches_geometric_sums() {
    let report = project(&input(500_000.0, 300_000.0, 0.05)).unwrap();

    // Sum of base * (1+g)^i for i in 0..10.
    let expected_revenue: f64 = (0..10).map(|i| 500_000.0 * 1.05f64.powi(i)).sum();
    let expected_expenses: f64 = (0..10).map(|i| 300_000.0 * 1.04f64.powi(i)).sum();

    assert!((report.summary.total_revenue - expected_revenue).abs() < 1e-6);
    assert!((report.summary.total_expenses - expected_expenses).abs() < 1e-6);
    assert!(
        (report.summary.total_net_income - (expected_revenue - expected_expenses)).abs() < 1e-6
    );
}

#[test]
fn test_validation_runs_before_rows() {
    let bad = input(500_000.0, 300_000.0, 2.0);
    assert!(matches!(validate(&bad), Err(ModelError::Input(_))));
    assert!(project(&bad).is_err());
}

#[test]
fn test_zero_revenue_rejected() {
    assert!(project(&input(0.0, 0.0, 0.05)).is_err());
}

#[test]
fn test_report_json_shape() {
    let mut full = input(500_000.0, 300_000.0, 0.05);
    full.address = Some("123 Main Drive".to_string());
    full.square_footage = Some(25_000.0);
    full.floor_count = Some(3.0);

    let report = project(&full).unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["building_info"]["address"], "123 Main Drive");
    assert_eq!(json["projections"].as_array().unwrap().len(), 10);
    assert_eq!(json["projections"][0]["revenue"], 500_000.0);
    assert_eq!(json["projections"][0]["roi"], 40.0);
    assert!(json["summary"]["total_10_year_revenue"].is_number());
    assert!(json["summary"]["average_annual_roi"].is_number());
}
