use std::collections::BTreeMap;

use serde::Serialize;

pub const DEFAULT_ANNUAL_INFLATION: f64 = 0.045;
pub const DEFAULT_MONTHLY_SAVINGS_RATE: f64 = 0.005;
pub const DEFAULT_BACKTEST_SAVINGS_RATE: f64 = 0.0035;
pub const DEFAULT_INITIAL_AMOUNT: f64 = 10_000.0;
pub const DEFAULT_YEARS: u32 = 10;
pub const MAX_YEARS: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionParams {
    pub initial_amount: f64,
    pub monthly_contribution: f64,
    pub years: u32,
    pub annual_inflation_rate: f64,
    pub monthly_savings_rate: f64,
}

impl Default for ProjectionParams {
    fn default() -> Self {
        Self {
            initial_amount: DEFAULT_INITIAL_AMOUNT,
            monthly_contribution: 0.0,
            years: DEFAULT_YEARS,
            annual_inflation_rate: DEFAULT_ANNUAL_INFLATION,
            monthly_savings_rate: DEFAULT_MONTHLY_SAVINGS_RATE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BacktestParams {
    pub initial_amount: f64,
    pub years: u32,
    pub monthly_savings_rate: f64,
}

impl Default for BacktestParams {
    fn default() -> Self {
        Self {
            initial_amount: DEFAULT_INITIAL_AMOUNT,
            years: DEFAULT_YEARS,
            monthly_savings_rate: DEFAULT_BACKTEST_SAVINGS_RATE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YieldParams {
    pub initial_amount: f64,
    pub monthly_contribution: f64,
    pub years: u32,
}

impl Default for YieldParams {
    fn default() -> Self {
        Self {
            initial_amount: DEFAULT_INITIAL_AMOUNT,
            monthly_contribution: 0.0,
            years: DEFAULT_YEARS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionPoint {
    pub year: f64,
    pub nominal_value: f64,
    pub real_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionSummary {
    pub points: Vec<ProjectionPoint>,
    pub final_nominal: f64,
    pub final_real: f64,
    pub total_contributed: f64,
    pub purchasing_power_loss: f64,
    pub erosion_warning: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum BacktestWindow {
    #[serde(rename_all = "camelCase")]
    Rolling { start_index: usize, end_index: usize },
    #[serde(rename_all = "camelCase")]
    Cyclic { history_len: usize },
}

impl BacktestWindow {
    pub fn sample_index(self, month: usize) -> usize {
        let offset = month.saturating_sub(1);
        match self {
            BacktestWindow::Rolling { start_index, .. } => start_index + offset,
            BacktestWindow::Cyclic { history_len } => {
                if history_len == 0 {
                    offset
                } else {
                    offset % history_len
                }
            }
        }
    }

    pub fn is_cyclic(self) -> bool {
        matches!(self, BacktestWindow::Cyclic { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestSummary {
    pub points: Vec<ProjectionPoint>,
    pub final_nominal: f64,
    pub final_real: f64,
    pub window: BacktestWindow,
    pub period_label: String,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    IdleCash,
    Savings,
    Treasury,
    Optimized,
}

impl Scenario {
    pub fn label(self) -> &'static str {
        match self {
            Scenario::IdleCash => "Idle cash",
            Scenario::Savings => "Savings account",
            Scenario::Treasury => "Treasury (Selic)",
            Scenario::Optimized => "Optimized portfolio",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScenarioValue {
    pub nominal: f64,
    pub real: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YieldPoint {
    pub month: u32,
    pub year: f64,
    pub scenarios: BTreeMap<Scenario, ScenarioValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YieldSummary {
    pub points: Vec<YieldPoint>,
    #[serde(rename = "final")]
    pub final_values: BTreeMap<Scenario, ScenarioValue>,
    pub wealth_gap: f64,
    pub opportunity_cost: f64,
}

impl YieldSummary {
    pub fn final_value(&self, scenario: Scenario) -> Option<ScenarioValue> {
        self.final_values.get(&scenario).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolling_window_maps_months_onto_trailing_indices() {
        let window = BacktestWindow::Rolling {
            start_index: 72,
            end_index: 191,
        };
        assert_eq!(window.sample_index(1), 72);
        assert_eq!(window.sample_index(120), 191);
        assert!(!window.is_cyclic());
    }

    #[test]
    fn cyclic_window_wraps_at_history_length() {
        let window = BacktestWindow::Cyclic { history_len: 192 };
        assert_eq!(window.sample_index(1), 0);
        assert_eq!(window.sample_index(192), 191);
        assert_eq!(window.sample_index(193), 0);
        assert_eq!(window.sample_index(384), 191);
        assert_eq!(window.sample_index(385), 0);
        assert!(window.is_cyclic());
    }

    #[test]
    fn scenario_keys_serialize_as_kebab_case() {
        let mut scenarios = BTreeMap::new();
        scenarios.insert(
            Scenario::IdleCash,
            ScenarioValue {
                nominal: 1.0,
                real: 1.0,
            },
        );
        let json = serde_json::to_string(&scenarios).expect("serializes");
        assert_eq!(json, r#"{"idle-cash":{"nominal":1.0,"real":1.0}}"#);
    }

    #[test]
    fn window_serializes_with_mode_tag() {
        let json = serde_json::to_string(&BacktestWindow::Rolling {
            start_index: 1,
            end_index: 2,
        })
        .expect("serializes");
        assert_eq!(json, r#"{"mode":"rolling","startIndex":1,"endIndex":2}"#);
    }
}
