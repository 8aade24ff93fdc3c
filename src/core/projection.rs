use log::debug;

use super::error::{Result, require_amount, require_rate, require_years};
use super::types::{MAX_YEARS, ProjectionParams, ProjectionPoint, ProjectionSummary};

pub fn monthly_rate_from_annual(annual_rate: f64) -> f64 {
    (1.0 + annual_rate).powf(1.0 / 12.0) - 1.0
}

fn validate(params: &ProjectionParams) -> Result<()> {
    require_amount("initialAmount", params.initial_amount)?;
    require_amount("monthlyContribution", params.monthly_contribution)?;
    require_years(params.years, MAX_YEARS)?;
    require_rate("annualInflationRate", params.annual_inflation_rate)?;
    require_rate("monthlySavingsRate", params.monthly_savings_rate)?;
    Ok(())
}

pub fn calculate_projection(params: &ProjectionParams) -> Result<ProjectionSummary> {
    validate(params)?;

    let total_months = params.years * 12;
    let monthly_inflation = monthly_rate_from_annual(params.annual_inflation_rate);

    let mut points = Vec::with_capacity(params.years as usize + 1);
    points.push(ProjectionPoint {
        year: 0.0,
        nominal_value: params.initial_amount,
        real_value: params.initial_amount,
    });

    let mut nominal = params.initial_amount;
    for month in 1..=total_months {
        // End-of-period contribution.
        nominal = nominal * (1.0 + params.monthly_savings_rate) + params.monthly_contribution;

        if month % 12 == 0 {
            let inflation_factor = (1.0 + monthly_inflation).powi(month as i32);
            points.push(ProjectionPoint {
                year: f64::from(month / 12),
                nominal_value: nominal.round(),
                real_value: (nominal / inflation_factor).round(),
            });
        }
    }

    let last = points[points.len() - 1];
    let total_contributed =
        params.initial_amount + params.monthly_contribution * f64::from(total_months);
    debug!(
        "projection over {} years: nominal {} real {}",
        params.years, last.nominal_value, last.real_value
    );

    Ok(ProjectionSummary {
        final_nominal: last.nominal_value,
        final_real: last.real_value,
        total_contributed,
        purchasing_power_loss: last.nominal_value - last.real_value,
        erosion_warning: last.real_value < total_contributed,
        points,
    })
}
