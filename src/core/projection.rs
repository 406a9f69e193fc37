//! Ten-year compounding revenue/expense projection.

use crate::error::{ModelError, ModelResult};
use crate::types::{
    BuildingInfo, ProjectionInput, ProjectionReport, ProjectionSummary, YearProjection,
    EXPENSE_GROWTH_FACTOR, PROJECTION_YEARS,
};

/// Reject inputs the projection formula cannot sensibly handle.
///
/// Runs before any rows are generated, so a bad request never produces a
/// partial result.
pub fn validate(input: &ProjectionInput) -> ModelResult<()> {
    if !input.base_revenue.is_finite() || input.base_revenue <= 0.0 {
        return Err(ModelError::Input(format!(
            "base_revenue must be greater than 0, got {}",
            input.base_revenue
        )));
    }
    if !input.base_expenses.is_finite() || input.base_expenses < 0.0 {
        return Err(ModelError::Input(format!(
            "base_expenses must be 0 or greater, got {}",
            input.base_expenses
        )));
    }
    if !input.growth_rate.is_finite() || !(-1.0..=1.0).contains(&input.growth_rate) {
        return Err(ModelError::Input(format!(
            "growth_rate must be between -1 and 1, got {}",
            input.growth_rate
        )));
    }
    Ok(())
}

/// Compute the full ten-year projection and its summary.
///
/// Revenue compounds at the growth rate; expenses compound at
/// [`EXPENSE_GROWTH_FACTOR`] of it. Year 1 carries the base values
/// unchanged (growth exponent 0).
pub fn project(input: &ProjectionInput) -> ModelResult<ProjectionReport> {
    validate(input)?;

    let g = input.growth_rate;
    let mut projections = Vec::with_capacity(PROJECTION_YEARS);
    let mut summary = ProjectionSummary::default();

    for i in 0..PROJECTION_YEARS {
        let revenue = input.base_revenue * (1.0 + g).powi(i as i32);
        let expenses = input.base_expenses * (1.0 + EXPENSE_GROWTH_FACTOR * g).powi(i as i32);
        let net_income = revenue - expenses;
        let roi = if revenue > 0.0 {
            net_income / revenue * 100.0
        } else {
            0.0
        };

        summary.total_revenue += revenue;
        summary.total_expenses += expenses;
        summary.total_net_income += net_income;

        projections.push(YearProjection {
            year: (i + 1) as u32,
            revenue,
            expenses,
            net_income,
            roi,
        });
    }

    summary.average_annual_roi = if summary.total_revenue > 0.0 {
        summary.total_net_income / summary.total_revenue * 100.0
    } else {
        0.0
    };

    Ok(ProjectionReport {
        building_info: BuildingInfo {
            address: input.address.clone(),
            square_footage: input.square_footage,
            floor_count: input.floor_count,
        },
        projections,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_input() -> ProjectionInput {
        ProjectionInput {
            address: Some("123 Main Drive".to_string()),
            square_footage: Some(25000.0),
            floor_count: Some(3.0),
            base_revenue: 500_000.0,
            base_expenses: 300_000.0,
            growth_rate: 0.05,
        }
    }

    #[test]
    fn test_first_year_carries_base_values() {
        let report = project(&base_input()).unwrap();
        let y1 = &report.projections[0];
        assert_eq!(y1.year, 1);
        assert_eq!(y1.revenue, 500_000.0);
        assert_eq!(y1.expenses, 300_000.0);
        assert_eq!(y1.net_income, 200_000.0);
        assert_eq!(y1.roi, 40.0);
    }

    #[test]
    fn test_second_year_compounds() {
        let report = project(&base_input()).unwrap();
        let y2 = &report.projections[1];
        assert!((y2.revenue - 525_000.0).abs() < 1e-6);
        assert!((y2.expenses - 312_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_horizon_is_ten_years() {
        let report = project(&base_input()).unwrap();
        assert_eq!(report.projections.len(), 10);
        assert_eq!(report.projections.last().unwrap().year, 10);
    }

    #[test]
    fn test_summary_totals_match_rows() {
        let report = project(&base_input()).unwrap();
        let revenue: f64 = report.projections.iter().map(|p| p.revenue).sum();
        let net: f64 = report.projections.iter().map(|p| p.net_income).sum();
        assert!((report.summary.total_revenue - revenue).abs() < 1e-6);
        assert!((report.summary.total_net_income - net).abs() < 1e-6);
        let expected_roi = net / revenue * 100.0;
        assert!((report.summary.average_annual_roi - expected_roi).abs() < 1e-9);
    }

    #[test]
    fn test_zero_growth_is_flat() {
        let mut input = base_input();
        input.growth_rate = 0.0;
        let report = project(&input).unwrap();
        for row in &report.projections {
            assert_eq!(row.revenue, 500_000.0);
            assert_eq!(row.expenses, 300_000.0);
            assert_eq!(row.roi, 40.0);
        }
    }

    #[test]
    fn test_negative_growth_allowed() {
        let mut input = base_input();
        input.growth_rate = -0.1;
        let report = project(&input).unwrap();
        assert!(report.projections[1].revenue < report.projections[0].revenue);
    }

    #[test]
    fn test_growth_rate_out_of_range_rejected() {
        for g in [1.5, -1.5, f64::NAN, f64::INFINITY] {
            let mut input = base_input();
            input.growth_rate = g;
            let err = project(&input).unwrap_err();
            assert!(matches!(err, ModelError::Input(_)), "g = {}", g);
        }
    }

    #[test]
    fn test_growth_rate_bounds_inclusive() {
        for g in [-1.0, 1.0] {
            let mut input = base_input();
            input.growth_rate = g;
            assert!(project(&input).is_ok(), "g = {}", g);
        }
    }

    #[test]
    fn test_non_positive_revenue_rejected() {
        for revenue in [0.0, -100.0] {
            let mut input = base_input();
            input.base_revenue = revenue;
            let err = project(&input).unwrap_err();
            assert!(matches!(err, ModelError::Input(_)));
        }
    }

    #[test]
    fn test_negative_expenses_rejected() {
        let mut input = base_input();
        input.base_expenses = -1.0;
        assert!(project(&input).is_err());
    }
}
