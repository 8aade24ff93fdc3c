mod backtest;
mod error;
pub mod format;
mod history;
mod projection;
mod scenarios;
mod types;

pub use backtest::{period_label, run_backtest, select_window};
pub use error::{ProjectionError, Result};
pub use history::{HistoricalIndex, HistoricalSample};
pub use projection::{calculate_projection, monthly_rate_from_annual};
pub use scenarios::{
    BASELINE_SCENARIO, BEST_SCENARIO, SCENARIO_TABLE, SHARED_MONTHLY_INFLATION, ScenarioRate,
    calculate_yield_projection, calculate_yield_projection_with, monthly_rate_for,
};
pub use types::{
    BacktestParams, BacktestSummary, BacktestWindow, DEFAULT_ANNUAL_INFLATION,
    DEFAULT_BACKTEST_SAVINGS_RATE, DEFAULT_INITIAL_AMOUNT, DEFAULT_MONTHLY_SAVINGS_RATE,
    DEFAULT_YEARS, MAX_YEARS, ProjectionParams, ProjectionPoint, ProjectionSummary, Scenario,
    ScenarioValue, YieldParams, YieldPoint, YieldSummary,
};
