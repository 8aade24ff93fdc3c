use std::collections::BTreeMap;

use log::debug;

use super::error::{ProjectionError, Result, require_amount, require_rate, require_years};
use super::types::{MAX_YEARS, Scenario, ScenarioValue, YieldParams, YieldPoint, YieldSummary};

// `1.045^(1/12) - 1`, truncated.
pub const SHARED_MONTHLY_INFLATION: f64 = 0.00367;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenarioRate {
    pub scenario: Scenario,
    pub monthly_rate: f64,
}

pub const SCENARIO_TABLE: [ScenarioRate; 4] = [
    ScenarioRate {
        scenario: Scenario::IdleCash,
        monthly_rate: 0.0,
    },
    ScenarioRate {
        scenario: Scenario::Savings,
        monthly_rate: 0.005,
    },
    ScenarioRate {
        scenario: Scenario::Treasury,
        monthly_rate: 0.0083,
    },
    ScenarioRate {
        scenario: Scenario::Optimized,
        monthly_rate: 0.012,
    },
];

pub const BEST_SCENARIO: Scenario = Scenario::Optimized;
pub const BASELINE_SCENARIO: Scenario = Scenario::Savings;

pub fn monthly_rate_for(scenario: Scenario) -> Option<f64> {
    SCENARIO_TABLE
        .iter()
        .find(|entry| entry.scenario == scenario)
        .map(|entry| entry.monthly_rate)
}

pub fn calculate_yield_projection(params: &YieldParams) -> Result<YieldSummary> {
    calculate_yield_projection_with(params, &SCENARIO_TABLE, SHARED_MONTHLY_INFLATION)
}

pub fn calculate_yield_projection_with(
    params: &YieldParams,
    table: &[ScenarioRate],
    monthly_inflation: f64,
) -> Result<YieldSummary> {
    require_amount("initialAmount", params.initial_amount)?;
    require_amount("monthlyContribution", params.monthly_contribution)?;
    require_years(params.years, MAX_YEARS)?;
    require_rate("monthlyInflation", monthly_inflation)?;
    for (i, entry) in table.iter().enumerate() {
        require_rate("monthlyRate", entry.monthly_rate)?;
        if table[..i].iter().any(|prior| prior.scenario == entry.scenario) {
            return Err(ProjectionError::invalid(
                "scenarios",
                format!("{} is listed twice", entry.scenario.label()),
            ));
        }
    }
    for required in [BEST_SCENARIO, BASELINE_SCENARIO] {
        if !table.iter().any(|entry| entry.scenario == required) {
            return Err(ProjectionError::invalid(
                "scenarios",
                format!("table is missing {}", required.label()),
            ));
        }
    }

    let total_months = params.years * 12;
    let mut balances: BTreeMap<Scenario, f64> = table
        .iter()
        .map(|entry| (entry.scenario, params.initial_amount))
        .collect();
    let mut cumulative_inflation = 1.0;

    let mut points = Vec::with_capacity(params.years as usize + 2);
    points.push(snapshot(0, &balances, cumulative_inflation));

    for month in 1..=total_months {
        for entry in table {
            if let Some(balance) = balances.get_mut(&entry.scenario) {
                *balance = *balance * (1.0 + entry.monthly_rate) + params.monthly_contribution;
            }
        }
        cumulative_inflation *= 1.0 + monthly_inflation;

        if month % 12 == 0 || month == total_months {
            points.push(snapshot(month, &balances, cumulative_inflation));
        }
    }

    let final_values = points[points.len() - 1].scenarios.clone();
    let best_real = final_values
        .get(&BEST_SCENARIO)
        .map_or(0.0, |value| value.real);
    let baseline_real = final_values
        .get(&BASELINE_SCENARIO)
        .map_or(0.0, |value| value.real);

    let wealth_gap = best_real - baseline_real;
    let opportunity_cost = if baseline_real > 0.0 {
        best_real / baseline_real
    } else {
        0.0
    };
    debug!(
        "yield comparison over {} years: gap {wealth_gap:.2}, ratio {opportunity_cost:.3}",
        params.years
    );

    Ok(YieldSummary {
        points,
        final_values,
        wealth_gap,
        opportunity_cost,
    })
}

fn snapshot(
    month: u32,
    balances: &BTreeMap<Scenario, f64>,
    cumulative_inflation: f64,
) -> YieldPoint {
    let scenarios = balances
        .iter()
        .map(|(&scenario, &nominal)| {
            (
                scenario,
                ScenarioValue {
                    nominal,
                    real: nominal / cumulative_inflation,
                },
            )
        })
        .collect();
    YieldPoint {
        month,
        year: f64::from(month) / 12.0,
        scenarios,
    }
}
