//! market-pulse command line entry point.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use market_pulse::types::{Headline, PriceSample, SentimentLabel, TableCounts};
use market_pulse::{Pipeline, PipelineConfig, Step, Store};
use serde::Serialize;
use std::process::ExitCode;
use tracing::{info, Level};

const DEFAULT_PRICE_LIMIT: i64 = 50;
const DEFAULT_HISTORY_LIMIT: i64 = 100;
const DEFAULT_SENTIMENT_LIMIT: i64 = 20;
const DEFAULT_NEWS_LIMIT: i64 = 50;

#[derive(Parser, Debug)]
#[command(name = "market-pulse", version, about = "Simulated market data and sentiment pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run every pipeline step once (default).
    Run,
    /// Write price ticks and one headline.
    Ingest,
    /// Label the newest headline.
    Label,
    /// Delete rows older than the retention age.
    Sweep,
    /// Print the stored data as JSON.
    Report {
        /// Show price history for this symbol instead of the latest prices.
        #[arg(long)]
        symbol: Option<String>,

        /// Maximum rows per section (at least 1).
        #[arg(long, value_parser = clap::value_parser!(i64).range(1..))]
        limit: Option<i64>,
    },
}

#[derive(Debug, Serialize)]
struct Snapshot {
    healthy: bool,
    counts: TableCounts,
    prices: Vec<PriceSample>,
    sentiment: Vec<SentimentLabel>,
    news: Vec<Headline>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let cli = Cli::parse();
    let config = PipelineConfig::from_env().context("Invalid configuration")?;
    let store = Store::connect(&config.database_url).await?;

    let steps: &[Step] = match cli.command.unwrap_or(Command::Run) {
        Command::Run => &Step::ALL,
        Command::Ingest => &Step::INGEST,
        Command::Label => &[Step::Sentiment],
        Command::Sweep => &[Step::Retention],
        Command::Report { symbol, limit } => {
            let result = print_report(&store, symbol.as_deref(), limit).await;
            store.close().await;
            result?;
            return Ok(ExitCode::SUCCESS);
        }
    };

    let pipeline = Pipeline::from_config(&config);
    let report = pipeline.run_steps(&store, steps).await;
    store.close().await;

    if report.succeeded() {
        info!("All steps completed");
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

async fn print_report(store: &Store, symbol: Option<&str>, limit: Option<i64>) -> Result<()> {
    let prices = match symbol {
        Some(symbol) => {
            store
                .price_history(symbol, limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
                .await?
        }
        None => store.latest_prices(limit.unwrap_or(DEFAULT_PRICE_LIMIT)).await?,
    };

    let snapshot = Snapshot {
        healthy: store.health_check().await,
        counts: store.counts().await?,
        prices,
        sentiment: store
            .latest_sentiment(limit.unwrap_or(DEFAULT_SENTIMENT_LIMIT))
            .await?,
        news: store.news_feed(limit.unwrap_or(DEFAULT_NEWS_LIMIT)).await?,
    };

    let json = serde_json::to_string_pretty(&snapshot).context("Failed to encode report")?;
    println!("{}", json);
    Ok(())
}
