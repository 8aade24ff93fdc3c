use log::{debug, warn};

use super::error::{ProjectionError, Result, require_amount, require_rate, require_years};
use super::history::HistoricalIndex;
use super::types::{BacktestParams, BacktestSummary, BacktestWindow, MAX_YEARS, ProjectionPoint};

/// Chooses the slice of history for a run of `total_months`.
///
/// A horizon that fits (including an exact fit) uses the trailing window
/// ending at the last sample; only a horizon longer than the history cycles.
pub fn select_window(total_months: usize, history_len: usize) -> BacktestWindow {
    if total_months > history_len {
        BacktestWindow::Cyclic { history_len }
    } else {
        BacktestWindow::Rolling {
            start_index: history_len - total_months,
            end_index: history_len - 1,
        }
    }
}

pub fn period_label(window: BacktestWindow, index: &HistoricalIndex) -> String {
    match window {
        BacktestWindow::Rolling {
            start_index,
            end_index,
        } => index
            .range_label(start_index, end_index)
            .unwrap_or_else(|| "unavailable range".to_string()),
        BacktestWindow::Cyclic { history_len } => {
            let range = index
                .range_label(0, history_len.saturating_sub(1))
                .unwrap_or_else(|| "the available range".to_string());
            format!("cyclic repetition of {range}")
        }
    }
}

pub fn run_backtest(params: &BacktestParams, index: &HistoricalIndex) -> Result<BacktestSummary> {
    require_amount("initialAmount", params.initial_amount)?;
    require_years(params.years, MAX_YEARS)?;
    require_rate("monthlySavingsRate", params.monthly_savings_rate)?;
    if index.is_empty() {
        return Err(ProjectionError::History("series is empty".to_string()));
    }

    let total_months = params.years as usize * 12;
    let window = select_window(total_months, index.len());
    let period_label = period_label(window, index);
    debug!(
        "backtest over {total_months} months using {:?} ({period_label})",
        window
    );

    Ok(replay(params, index, window, period_label))
}

fn replay(
    params: &BacktestParams,
    index: &HistoricalIndex,
    window: BacktestWindow,
    period_label: String,
) -> BacktestSummary {
    let total_months = params.years as usize * 12;
    let mut points = Vec::with_capacity(total_months + 1);
    points.push(ProjectionPoint {
        year: 0.0,
        nominal_value: params.initial_amount,
        real_value: params.initial_amount,
    });

    let mut nominal = params.initial_amount;
    let mut cumulative_inflation = 1.0;
    for month in 1..=total_months {
        nominal *= 1.0 + params.monthly_savings_rate;

        let sample_index = window.sample_index(month);
        match index.get(sample_index) {
            Some(sample) => cumulative_inflation *= 1.0 + sample.rate,
            None => warn!("month {month}: no sample at index {sample_index}, inflation held"),
        }

        points.push(ProjectionPoint {
            year: round_to_hundredths(month as f64 / 12.0),
            nominal_value: nominal,
            real_value: nominal / cumulative_inflation,
        });
    }

    let last = points[points.len() - 1];
    BacktestSummary {
        final_nominal: last.nominal_value,
        final_real: last.real_value,
        window,
        period_label,
        points,
    }
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
