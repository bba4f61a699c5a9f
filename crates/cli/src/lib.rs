pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use casevalue_core::config::{AppConfig, LoadOptions, LogFormat, LoggingConfig};
use casevalue_core::domain::valuation::AggregationPolicy;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::Level;

#[derive(Debug, Parser)]
#[command(
    name = "casevalue",
    about = "Case comparable matching and settlement valuation CLI",
    long_about = "Value personal-injury claims against a corpus of resolved cases, inspect comparables and learned weights, and compute mediator proposals.",
    after_help = "Examples:\n  casevalue seed\n  casevalue value --query claim.json --policy weighted-mean\n  casevalue propose --amount '$300,000' --policy-limit '$330,000'"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Value a claim against the historical corpus")]
    Value {
        #[arg(long, help = "Path to a JSON or TOML file describing the claim")]
        query: PathBuf,
        #[arg(long, help = "Aggregation policy (range-median|weighted-mean)")]
        policy: Option<AggregationPolicy>,
    },
    #[command(about = "List the most similar historical cases for a claim")]
    Comparables {
        #[arg(long, help = "Path to a JSON or TOML file describing the claim")]
        query: PathBuf,
        #[arg(long, help = "Maximum number of cases to return")]
        limit: Option<usize>,
    },
    #[command(about = "Show the learned category multipliers and their last update time")]
    Weights,
    #[command(about = "Compute a mediator proposal from an evaluator amount")]
    Propose {
        #[arg(long, value_parser = parse_amount, help = "Evaluator amount, e.g. '$300,000'")]
        amount: Decimal,
        #[arg(long, value_parser = parse_amount, help = "Policy limit, if known")]
        policy_limit: Option<Decimal>,
    },
    #[command(about = "Estimate the risk that a settlement exceeds the policy limit")]
    Risk {
        #[arg(long, value_parser = parse_amount, help = "Settlement amount")]
        settlement: Decimal,
        #[arg(long, value_parser = parse_amount, help = "Policy limit, if known")]
        policy_limit: Option<Decimal>,
    },
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic demo corpus and verify it")]
    Seed,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, database connectivity, and corpus readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Command::Value { query, policy } => commands::value::run(&query, policy),
        Command::Comparables { query, limit } => commands::comparables::run(&query, limit),
        Command::Weights => commands::weights::run(),
        Command::Propose { amount, policy_limit } => commands::propose::run(amount, policy_limit),
        Command::Risk { settlement, policy_limit } => commands::risk::run(settlement, policy_limit),
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

fn parse_amount(raw: &str) -> Result<Decimal, String> {
    let amount = casevalue_core::money::parse_currency(raw)
        .ok_or_else(|| format!("`{raw}` is not a dollar amount"))?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(format!("`{raw}` must not be negative"));
    }
    Ok(amount)
}

/// Logs go to stderr so stdout stays a single JSON document.
fn init_logging() {
    let logging = AppConfig::load(LoadOptions::default())
        .map(|config| config.logging)
        .unwrap_or(LoggingConfig { level: "warn".to_string(), format: LogFormat::Compact });
    let log_level = logging.level.parse::<Level>().unwrap_or(Level::WARN);

    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);
    let _ = match logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use rust_decimal::Decimal;

    use super::{parse_amount, Cli, Command};
    use casevalue_core::domain::valuation::AggregationPolicy;

    #[test]
    fn amounts_accept_currency_formatting() {
        assert_eq!(parse_amount("$300,000"), Ok(Decimal::from(300_000)));
        assert!(parse_amount("lots").is_err());
    }

    #[test]
    fn amounts_reject_negative_and_out_of_range_values() {
        assert_eq!(parse_amount("-$2,000"), Err("`-$2,000` must not be negative".to_string()));
        assert!(parse_amount("79228162514264337593543950335").is_err());
        assert_eq!(parse_amount("$0"), Ok(Decimal::ZERO));

        let negative_limit = Cli::try_parse_from([
            "casevalue",
            "propose",
            "--amount",
            "$300,000",
            "--policy-limit=-$330,000",
        ]);
        assert!(negative_limit.is_err());
    }

    #[test]
    fn value_command_parses_policy_spellings() {
        let cli = Cli::try_parse_from([
            "casevalue",
            "value",
            "--query",
            "claim.json",
            "--policy",
            "weighted-mean",
        ])
        .expect("arguments should parse");

        assert!(matches!(
            cli.command,
            Command::Value { policy: Some(AggregationPolicy::WeightedMean), .. }
        ));
    }

    #[test]
    fn propose_requires_an_amount() {
        assert!(Cli::try_parse_from(["casevalue", "propose"]).is_err());

        let cli = Cli::try_parse_from([
            "casevalue",
            "propose",
            "--amount",
            "$100,000",
            "--policy-limit",
            "$250,000",
        ])
        .expect("arguments should parse");
        assert!(matches!(
            cli.command,
            Command::Propose { policy_limit: Some(limit), .. } if limit == Decimal::from(250_000)
        ));
    }
}
