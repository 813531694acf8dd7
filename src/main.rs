//! Retirement Income CLI
//!
//! Runs a single retirement income scenario (or a historical sweep) and prints
//! the yearly projection.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use retirement_income::assumptions::loader::{self, DEFAULT_ASSUMPTIONS_PATH};
use retirement_income::assumptions::{HomeownerStatus, Relationship};
use retirement_income::projection::{DrawdownStrategy, DynamicAdjustment};
use retirement_income::scenario::{ScenarioConfig, ScenarioResult, ScenarioRunner};
use std::fs::File;
use std::path::PathBuf;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliStrategy {
    Minimum,
    Level,
}

impl From<CliStrategy> for DrawdownStrategy {
    fn from(value: CliStrategy) -> Self {
        match value {
            CliStrategy::Minimum => DrawdownStrategy::MinimumWithdrawal,
            CliStrategy::Level => DrawdownStrategy::LevelRealIncome,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliAdjustment {
    None,
    Smooth,
}

impl From<CliAdjustment> for DynamicAdjustment {
    fn from(value: CliAdjustment) -> Self {
        match value {
            CliAdjustment::None => DynamicAdjustment::None,
            CliAdjustment::Smooth => DynamicAdjustment::Smooth,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliRelationship {
    Single,
    Couple,
}

impl From<CliRelationship> for Relationship {
    fn from(value: CliRelationship) -> Self {
        match value {
            CliRelationship::Single => Relationship::Single,
            CliRelationship::Couple => Relationship::Couple,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "retirement_income",
    about = "Retirement income projection with age pension, annuity and drawdown"
)]
struct Cli {
    #[arg(long, default_value = DEFAULT_ASSUMPTIONS_PATH, help = "Directory of assumption CSV files")]
    assumptions: PathBuf,

    #[arg(long, help = "JSON scenario file; flags below override its fields")]
    config: Option<PathBuf>,

    #[arg(long, help = "Historical return CSV (Year,RealGrowthReturn,RealDefensiveReturn)")]
    return_history: Option<PathBuf>,

    #[arg(long)]
    balance: Option<f64>,
    #[arg(long, help = "Real growth asset return, percent")]
    growth_return: Option<f64>,
    #[arg(long, help = "Real defensive asset return, percent")]
    defensive_return: Option<f64>,
    #[arg(long, help = "Growth allocation of the invested balance, percent")]
    growth_allocation: Option<f64>,
    #[arg(long, help = "Share of the balance used to buy an annuity, percent")]
    annuity_allocation: Option<f64>,
    #[arg(long)]
    start_age: Option<u32>,
    #[arg(long)]
    max_age: Option<u32>,
    #[arg(long, help = "First year of historical returns")]
    start_year: Option<i32>,
    #[arg(long, value_enum)]
    strategy: Option<CliStrategy>,
    #[arg(long, value_enum)]
    adjustment: Option<CliAdjustment>,
    #[arg(long, value_enum)]
    relationship: Option<CliRelationship>,
    #[arg(long, help = "Assess as a non-homeowner")]
    non_homeowner: bool,
    #[arg(long)]
    other_assets: Option<f64>,
    #[arg(long)]
    annuity_term_certain: Option<u32>,

    #[arg(long, help = "Write the yearly projection to this CSV file")]
    output: Option<PathBuf>,
    #[arg(long, help = "Print the result as JSON instead of a table")]
    json: bool,
    #[arg(long, help = "Project from every year in the return history")]
    sweep: bool,
}

impl Cli {
    fn scenario(&self) -> Result<ScenarioConfig> {
        let mut config = match &self.config {
            Some(path) => ScenarioConfig::from_json_file(path)
                .map_err(|e| anyhow!("{}", e))
                .with_context(|| format!("reading scenario {}", path.display()))?,
            None => ScenarioConfig::default(),
        };

        let percent = |value: f64| value / 100.0;

        if let Some(v) = self.balance {
            config.balance = v;
        }
        if let Some(v) = self.growth_return {
            config.growth_return = percent(v);
        }
        if let Some(v) = self.defensive_return {
            config.defensive_return = percent(v);
        }
        if let Some(v) = self.growth_allocation {
            config.growth_allocation = percent(v);
        }
        if let Some(v) = self.annuity_allocation {
            config.annuity_allocation = percent(v);
        }
        if let Some(v) = self.start_age {
            config.start_age = v;
        }
        if let Some(v) = self.max_age {
            config.max_age = v;
        }
        if self.start_year.is_some() {
            config.start_year = self.start_year;
        }
        if let Some(v) = self.strategy {
            config.strategy = v.into();
        }
        if let Some(v) = self.adjustment {
            config.adjustment = v.into();
        }
        if let Some(v) = self.relationship {
            config.relationship = v.into();
        }
        if self.non_homeowner {
            config.homeowner = HomeownerStatus::NonHomeowner;
        }
        if let Some(v) = self.other_assets {
            config.other_assets = v;
        }
        if let Some(v) = self.annuity_term_certain {
            config.annuity_term_certain = v;
        }

        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut runner = ScenarioRunner::from_csv_path(&cli.assumptions)
        .map_err(|e| anyhow!("{}", e))
        .with_context(|| format!("loading assumptions from {}", cli.assumptions.display()))?;

    if let Some(path) = &cli.return_history {
        let history = loader::load_return_history(path)
            .map_err(|e| anyhow!("{}", e))
            .with_context(|| format!("loading return history {}", path.display()))?;
        runner.assumptions_mut().set_return_history(history);
    }

    let config = cli.scenario()?;

    if cli.sweep {
        let runs = runner.run_historical_sweep(&config)?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&runs)?);
            return Ok(());
        }

        println!("Historical sweep ({} start years)", runs.len());
        println!("{:>6} {:>14} {:>14} {:>14} {:>10}",
            "Year", "Terminal", "Min Income", "Avg Income", "Depleted");
        println!("{}", "-".repeat(62));
        for run in &runs {
            let s = &run.summary;
            println!("{:>6} {:>14.2} {:>14.2} {:>14.2} {:>10}",
                run.start_year,
                s.terminal_balance,
                s.min_total_payment,
                s.average_total_payment,
                s.depletion_age.map_or("-".to_string(), |age| age.to_string()),
            );
        }
        return Ok(());
    }

    let result = runner.run(&config)?;

    if let Some(path) = &cli.output {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        result
            .projection
            .write_csv(file)
            .map_err(|e| anyhow!("{}", e))
            .with_context(|| format!("writing {}", path.display()))?;
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&config, &result);
        if let Some(path) = &cli.output {
            println!("\nFull results written to: {}", path.display());
        }
    }

    Ok(())
}

fn print_result(config: &ScenarioConfig, result: &ScenarioResult) {
    println!("Retirement Income v{}", env!("CARGO_PKG_VERSION"));
    println!("========================\n");

    println!("Scenario:");
    println!("  Balance: ${:.2}", config.balance);
    println!("  Ages: {} to {}", config.start_age, config.max_age);
    println!("  Strategy: {:?} ({:?})", config.strategy, config.adjustment);
    println!("  Assumed real return: {:.3}%", result.assumed_return * 100.0);
    if let Some(year) = result.start_year {
        println!("  Historical returns from: {}", year);
    }
    if result.annuity_purchase > 0.0 {
        println!("  Annuity purchase: ${:.2} (factor {:.4}, pays ${:.2}/yr)",
            result.annuity_purchase, result.annuity_value, result.annuity_payment);
    }
    if let Some(solve) = &result.solve {
        println!("  Level income target: ${:.2} ({} iterations{})",
            solve.target_drawdown,
            solve.iterations,
            if solve.converged { "" } else { ", not converged" });
    }
    println!();

    println!("{:>4} {:>14} {:>12} {:>12} {:>12} {:>12} {:>8} {:>8}",
        "Age", "Balance", "Drawdown", "Pension", "Annuity", "Total", "Return", "Index");
    println!("{}", "-".repeat(90));
    for row in result.projection.records() {
        println!("{:>4} {:>14.2} {:>12.2} {:>12.2} {:>12.2} {:>12.2} {:>7.2}% {:>8.4}",
            row.age,
            row.balance,
            row.drawdown,
            row.age_pension,
            row.annuity_payment,
            row.total_payment,
            row.real_return * 100.0,
            row.indexation,
        );
    }

    let summary = result.projection.summary();
    println!("\nSummary:");
    println!("  Years: {}", summary.years);
    println!("  Total Drawdown: ${:.2}", summary.total_drawdown);
    println!("  Total Age Pension: ${:.2}", summary.total_age_pension);
    println!("  Total Annuity: ${:.2}", summary.total_annuity);
    println!("  Average Income: ${:.2}", summary.average_total_payment);
    println!("  Minimum Income: ${:.2}", summary.min_total_payment);
    println!("  Terminal Balance: ${:.2}", summary.terminal_balance);
    match summary.depletion_age {
        Some(age) => println!("  Balance exhausted at age {}", age),
        None => println!("  Balance lasts to age {}", summary.end_age),
    }
}
