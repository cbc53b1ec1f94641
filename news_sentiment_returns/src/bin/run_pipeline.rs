//! Командная строка: корреляция sentiment новостей с доходностью следующего дня.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use news_sentiment_returns::routers::is_valid_ticker;
use news_sentiment_returns::{load_config, AppState, SentimentAnalysisError};

#[derive(Parser)]
#[command(name = "run_pipeline")]
#[command(about = "Correlate news sentiment with next-day stock returns", long_about = None)]
#[command(version)]
struct Cli {
    /// Ticker symbol (e.g., AAPL)
    ticker: String,
    /// Number of past days to analyze (defaults to `default_days` from the config)
    #[arg(long)]
    days: Option<u32>,
    /// Print the full analysis payload instead of the regression result
    #[arg(long)]
    full: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("news_sentiment_returns=warn"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if !is_valid_ticker(&cli.ticker) {
        anyhow::bail!("Invalid ticker symbol: {:?}", cli.ticker);
    }

    let config = load_config()?;
    let Some(days) = config.analysis_days(cli.days) else {
        anyhow::bail!("--days must be between 1 and 365");
    };

    let state = AppState::new(config)?;

    let result = match state.analyze(&cli.ticker, days).await {
        Ok(result) => result,
        // Пустые данные - завершение с сообщением, как у дашборда
        Err(SentimentAnalysisError::NoData(message)) => anyhow::bail!(message),
        Err(e) => return Err(e.into()),
    };

    let output = if cli.full {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string_pretty(&result.regression)?
    };
    println!("{}", output);
    Ok(())
}
