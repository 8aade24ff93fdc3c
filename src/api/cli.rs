use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use crate::core::format::{format_annual_rate, format_compact, format_currency, format_monthly_rate};
use crate::core::{
    BacktestParams, BacktestSummary, DEFAULT_INITIAL_AMOUNT, DEFAULT_YEARS, HistoricalIndex,
    ProjectionParams, ProjectionSummary, SCENARIO_TABLE, SHARED_MONTHLY_INFLATION, YieldParams,
    YieldSummary, calculate_projection, calculate_yield_projection, run_backtest,
};

#[derive(Parser, Debug)]
#[command(
    name = "erosion",
    version,
    about = "Inflation erosion and yield comparison calculators"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the calculators as a JSON API
    Serve {
        #[arg(long, env = "PORT", default_value_t = 8080)]
        port: u16,
    },
    /// Project a balance under fixed yield and inflation
    Project(ProjectArgs),
    /// Replay the bundled monthly inflation history against a balance
    Backtest(BacktestArgs),
    /// Compare idle cash, savings, treasury and an optimized portfolio
    Compare(CompareArgs),
    /// List the bundled inflation history by calendar year
    History(HistoryArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    #[arg(long, default_value_t = DEFAULT_INITIAL_AMOUNT)]
    pub initial_amount: f64,
    #[arg(long, default_value_t = 0.0)]
    pub monthly_contribution: f64,
    #[arg(long, default_value_t = DEFAULT_YEARS, help = "Horizon in years (1-50)")]
    pub years: u32,
    #[arg(
        long,
        default_value_t = 4.5,
        help = "Annual inflation in percent, e.g. 4.5"
    )]
    pub inflation_rate: f64,
    #[arg(
        long,
        default_value_t = 0.5,
        help = "Monthly savings yield in percent, e.g. 0.5"
    )]
    pub savings_rate: f64,
    #[arg(long, help = "Print the raw result as JSON")]
    pub json: bool,
}

impl From<&ProjectArgs> for ProjectionParams {
    fn from(args: &ProjectArgs) -> Self {
        ProjectionParams {
            initial_amount: args.initial_amount,
            monthly_contribution: args.monthly_contribution,
            years: args.years,
            annual_inflation_rate: args.inflation_rate / 100.0,
            monthly_savings_rate: args.savings_rate / 100.0,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct BacktestArgs {
    #[arg(long, default_value_t = DEFAULT_INITIAL_AMOUNT)]
    pub initial_amount: f64,
    #[arg(long, default_value_t = DEFAULT_YEARS, help = "Horizon in years (1-50)")]
    pub years: u32,
    #[arg(
        long,
        default_value_t = 0.35,
        help = "Monthly savings yield in percent, e.g. 0.35"
    )]
    pub savings_rate: f64,
    #[arg(long, help = "Print every month instead of year ends")]
    pub monthly: bool,
    #[arg(long, help = "Print the raw result as JSON")]
    pub json: bool,
}

impl From<&BacktestArgs> for BacktestParams {
    fn from(args: &BacktestArgs) -> Self {
        BacktestParams {
            initial_amount: args.initial_amount,
            years: args.years,
            monthly_savings_rate: args.savings_rate / 100.0,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct CompareArgs {
    #[arg(long, default_value_t = DEFAULT_INITIAL_AMOUNT)]
    pub initial_amount: f64,
    #[arg(long, default_value_t = 0.0)]
    pub monthly_contribution: f64,
    #[arg(long, default_value_t = DEFAULT_YEARS, help = "Horizon in years (1-50)")]
    pub years: u32,
    #[arg(long, help = "Print the raw result as JSON")]
    pub json: bool,
}

impl From<&CompareArgs> for YieldParams {
    fn from(args: &CompareArgs) -> Self {
        YieldParams {
            initial_amount: args.initial_amount,
            monthly_contribution: args.monthly_contribution,
            years: args.years,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct HistoryArgs {
    #[arg(long, help = "Print the raw monthly samples as JSON")]
    pub json: bool,
}

pub fn execute(command: &Command) -> anyhow::Result<String> {
    match command {
        Command::Serve { .. } => anyhow::bail!("serve does not produce a report"),
        Command::Project(args) => {
            let params = ProjectionParams::from(args);
            let summary = calculate_projection(&params).context("projection failed")?;
            if args.json {
                return Ok(serde_json::to_string_pretty(&summary)?);
            }
            Ok(render_projection(&params, &summary))
        }
        Command::Backtest(args) => {
            let params = BacktestParams::from(args);
            let index = HistoricalIndex::embedded().context("loading inflation history")?;
            let summary = run_backtest(&params, index).context("backtest failed")?;
            if args.json {
                return Ok(serde_json::to_string_pretty(&summary)?);
            }
            Ok(render_backtest(&params, &summary, args.monthly))
        }
        Command::Compare(args) => {
            let params = YieldParams::from(args);
            let summary = calculate_yield_projection(&params).context("comparison failed")?;
            if args.json {
                return Ok(serde_json::to_string_pretty(&summary)?);
            }
            Ok(render_comparison(&params, &summary))
        }
        Command::History(args) => {
            let index = HistoricalIndex::embedded().context("loading inflation history")?;
            if args.json {
                return Ok(serde_json::to_string_pretty(index.samples())?);
            }
            Ok(render_history(index))
        }
    }
}

fn render_projection(params: &ProjectionParams, summary: &ProjectionSummary) -> String {
    let mut lines = vec![
        format!(
            "Projection over {} years ({} inflation, {} yield)",
            params.years,
            format_annual_rate(params.annual_inflation_rate),
            format_monthly_rate(params.monthly_savings_rate)
        ),
        format!(
            "  Total contributed      {}",
            format_currency(summary.total_contributed)
        ),
        format!(
            "  Nominal balance        {}",
            format_currency(summary.final_nominal)
        ),
        format!(
            "  Real purchasing power  {}{}",
            format_currency(summary.final_real),
            if summary.erosion_warning {
                "  (below what was put in)"
            } else {
                ""
            }
        ),
        format!(
            "  Eroded by inflation    {}",
            format_currency(summary.purchasing_power_loss)
        ),
        String::new(),
        format!("{:>6}  {:>20}  {:>20}", "Year", "Nominal", "Real"),
    ];
    for point in &summary.points {
        lines.push(format!(
            "{:>6}  {:>20}  {:>20}",
            point.year,
            format_currency(point.nominal_value),
            format_currency(point.real_value)
        ));
    }
    lines.join("\n") + "\n"
}

fn render_backtest(params: &BacktestParams, summary: &BacktestSummary, monthly: bool) -> String {
    let mut lines = vec![
        format!(
            "Historical backtest over {} years at {} ({})",
            params.years,
            format_monthly_rate(params.monthly_savings_rate),
            summary.period_label
        ),
        format!(
            "  Nominal balance        {}",
            format_currency(summary.final_nominal)
        ),
        format!(
            "  Real purchasing power  {}",
            format_currency(summary.final_real)
        ),
        String::new(),
        format!("{:>6}  {:>20}  {:>20}", "Year", "Nominal", "Real"),
    ];
    for (month, point) in summary.points.iter().enumerate() {
        if !monthly && month % 12 != 0 {
            continue;
        }
        lines.push(format!(
            "{:>6.2}  {:>20}  {:>20}",
            point.year,
            format_currency(point.nominal_value),
            format_currency(point.real_value)
        ));
    }
    lines.join("\n") + "\n"
}

fn render_comparison(params: &YieldParams, summary: &YieldSummary) -> String {
    let mut lines = vec![
        format!(
            "Yield comparison over {} years ({} inflation)",
            params.years,
            format_monthly_rate(SHARED_MONTHLY_INFLATION)
        ),
        format!(
            "{:<22} {:>12} {:>20} {:>20} {:>10}",
            "Scenario", "Rate", "Nominal", "Real", "Compact"
        ),
    ];
    for entry in SCENARIO_TABLE {
        let Some(value) = summary.final_value(entry.scenario) else {
            continue;
        };
        lines.push(format!(
            "{:<22} {:>12} {:>20} {:>20} {:>10}",
            entry.scenario.label(),
            format_monthly_rate(entry.monthly_rate),
            format_currency(value.nominal),
            format_currency(value.real),
            format_compact(value.real)
        ));
    }
    lines.push(String::new());
    lines.push(format!(
        "  Wealth gap (real)      {}",
        format_currency(summary.wealth_gap)
    ));
    lines.push(format!(
        "  Opportunity cost       {}x",
        format!("{:.2}", summary.opportunity_cost).replace('.', ",")
    ));
    lines.join("\n") + "\n"
}

fn render_history(index: &HistoricalIndex) -> String {
    let mut lines = vec![format!(
        "Monthly inflation history, {} samples ({})",
        index.len(),
        index
            .range_label(0, index.len().saturating_sub(1))
            .unwrap_or_default()
    )];
    for (year, rate) in index.annual_rates() {
        lines.push(format!("  {year}  {}", format_annual_rate(rate)));
    }
    lines.join("\n") + "\n"
}
