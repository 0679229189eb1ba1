//! dashboard: portfolio analytics from the command line.
//!
//! Usage:
//!   cargo run -p dashboard-cli -- overview --holdings AAPL=10,MSFT=5
//!   cargo run -p dashboard-cli -- prices --period "6 Months" --file holdings.csv
//!   cargo run -p dashboard-cli -- performance --start 2020-01-01 --benchmarks ^GSPC,QQQ
//!   cargo run -p dashboard-cli -- export --out portfolio.zip
//!
//! With no holdings given, the built-in sample portfolio is analyzed.

use std::fs::File;
use std::time::Duration;

use analysis_core::RiskLabel;
use analysis_orchestrator::{PortfolioPipeline, ReturnPeriod};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use market_data::YahooFinanceClient;
use portfolio_manager::Session;
use serde::Serialize;

mod config;

use config::{parse_symbols, DashboardConfig};

const COMMANDS: [&str; 4] = ["overview", "prices", "performance", "export"];
const DEFAULT_START: &str = "2020-01-01";

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

/// First positional argument, `overview` when none is given
fn command(args: &[String]) -> &str {
    args.get(1)
        .map(|s| s.as_str())
        .filter(|s| !s.starts_with("--"))
        .unwrap_or("overview")
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  dashboard [overview]                 Valuation, weighted stats, regions and risk");
    eprintln!("  dashboard prices [--period P]        Price change table (default: 1 Month)");
    eprintln!("  dashboard performance [--start D] [--benchmarks A,B]");
    eprintln!("                                       Returns and drawdown since D (default: {})", DEFAULT_START);
    eprintln!("  dashboard export [--out PATH]        Write the zip export");
    eprintln!();
    eprintln!("Holdings:");
    eprintln!("  --holdings AAPL=10,MSFT=5            Inline ticker=quantity pairs");
    eprintln!("  --file holdings.csv                  CSV with ticker,quantity columns");
    eprintln!("  --target Low|Moderate|High           Target risk (default: TARGET_RISK or Moderate)");
}

fn load_session(args: &[String], target: RiskLabel) -> Result<Session> {
    let mut session = if let Some(pairs) = flag_value(args, "--holdings") {
        Session::from_pairs(pairs, target).context("invalid --holdings")?
    } else if let Some(path) = flag_value(args, "--file") {
        let file = File::open(path).with_context(|| format!("cannot open {}", path))?;
        Session::from_csv_reader(file, target).with_context(|| format!("cannot read holdings from {}", path))?
    } else {
        Session::new(target)
    };

    if session.fill_with_sample_if_empty() {
        tracing::warn!(
            "No holdings given, using the sample portfolio ({} holdings)",
            session.valid_holdings().len()
        );
    }
    Ok(session)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
        tracing::error!("PANIC: {info}");
    }));

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }
    let command = command(&args);
    if !COMMANDS.contains(&command) {
        print_usage();
        anyhow::bail!("unknown command '{}'", command);
    }

    let config = DashboardConfig::from_env()?;
    let target: RiskLabel = match flag_value(&args, "--target") {
        Some(t) => t.parse().context("--target must be Low, Moderate or High")?,
        None => config.target_risk,
    };
    let session = load_session(&args, target)?;

    let gateway = YahooFinanceClient::new(
        config.yahoo_base_url.clone(),
        config.yahoo_rate_limit,
        Duration::from_secs(config.http_timeout_secs),
    );
    let pipeline = PortfolioPipeline::with_config(gateway, config.pipeline_config());
    tracing::info!("Running '{}' for {} holdings", command, session.valid_holdings().len());

    match command {
        "prices" => {
            let period: ReturnPeriod = match flag_value(&args, "--period") {
                Some(p) => p.parse().context("invalid --period")?,
                None => ReturnPeriod::default(),
            };
            let valuation = pipeline
                .value(&session.valid_holdings())
                .await
                .context("valuation failed")?;
            print_json(&pipeline.price_changes(&valuation, period).await)?;
        }
        "performance" => {
            let start = flag_value(&args, "--start").unwrap_or(DEFAULT_START);
            let start = NaiveDate::parse_from_str(start, "%Y-%m-%d")
                .with_context(|| format!("--start '{}' is not a YYYY-MM-DD date", start))?;
            let benchmarks = flag_value(&args, "--benchmarks")
                .map(parse_symbols)
                .unwrap_or_else(|| config.benchmark_symbols.clone());
            let valuation = pipeline
                .value(&session.valid_holdings())
                .await
                .context("valuation failed")?;
            print_json(&pipeline.performance(&valuation, start, &benchmarks).await)?;
        }
        "export" => {
            let out = flag_value(&args, "--out").unwrap_or(&config.export_path);
            let bytes = pipeline.export(&session).await.context("export failed")?;
            std::fs::write(out, &bytes).with_context(|| format!("cannot write {}", out))?;
            tracing::info!("Wrote {} ({} bytes)", out, bytes.len());
            print_json(&serde_json::json!({ "path": out, "bytes": bytes.len() }))?;
        }
        _ => {
            let report = pipeline.run(&session).await.context("portfolio run failed")?;
            print_json(&report)?;
        }
    }

    Ok(())
}
