use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use analyticore_client::gateway::GatewayClient;
use analyticore_client::poller::{AppState, PollingSession};
use analyticore_client::{utils, Sentiment};
use clap::Parser;
use dotenv::dotenv;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Submit a text for sentiment analysis and wait for the result", long_about = None)]
struct Args {
    /// Text to analyze
    #[arg(short, long, conflicts_with = "file", required_unless_present = "file")]
    text: Option<String>,

    /// Read the text to analyze from a file
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Gateway base URL
    #[arg(long, env = "API_BASE_URL")]
    api_url: String,

    /// Polling interval in milliseconds
    #[arg(short, long, default_value_t = 2000, value_parser = clap::value_parser!(u64).range(1..))]
    interval_ms: u64,

    /// Save the final job record as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("analyticore=warn,analyticore_client=warn")),
        )
        .init();

    let args = Args::parse();
    let text = match (args.text, &args.file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(path)?,
        (None, None) => return Err("either --text or --file is required".into()),
    };

    let gateway = GatewayClient::new(&args.api_url)?;
    let mut session =
        PollingSession::new(gateway).with_interval(Duration::from_millis(args.interval_ms));
    session.set_text(text);

    // Ctrl-C tears the session down; polling stops with it.
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let final_state = match session.run(&cancel, render).await {
        Ok(state) => state.clone(),
        Err(e) => {
            eprintln!("❌ {}", e);
            return Ok(ExitCode::from(2));
        }
    };

    if let (Some(path), Some(record)) = (&args.output, session.last_record()) {
        utils::save_json(&serde_json::to_value(record)?, path)?;
    }

    Ok(match final_state {
        AppState::Results { .. } => ExitCode::SUCCESS,
        AppState::Form => ExitCode::from(130),
        _ => ExitCode::FAILURE,
    })
}

fn render(state: &AppState) {
    match state {
        AppState::Form => println!("↩️  Cancelled."),
        AppState::Submitting => println!("📤 Submitting text..."),
        AppState::Polling { job_id } => println!("⏳ Analyzing (job {})...", job_id),
        AppState::Results {
            analysis, text, ..
        } => {
            println!("✅ Analysis completed");
            println!("{} Sentiment: {}", sentiment_emoji(analysis.sentiment), analysis.sentiment);
            if !analysis.keywords.is_empty() {
                println!("🔑 Keywords: {}", analysis.keywords.join(", "));
            }
            println!("📝 Original text:\n{}", text);
        }
        AppState::Error { message } => eprintln!("❌ {}", message),
    }
}

fn sentiment_emoji(sentiment: Sentiment) -> &'static str {
    match sentiment {
        Sentiment::Positive => "😊",
        Sentiment::Negative => "😞",
        Sentiment::Neutral => "😐",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(interval: &str) -> Result<Args, clap::Error> {
        Args::try_parse_from([
            "analyticore",
            "--text",
            "Hello world",
            "--api-url",
            "http://localhost:3000",
            "--interval-ms",
            interval,
        ])
    }

    #[test]
    fn zero_interval_is_rejected() {
        assert!(parse("0").is_err());
        assert_eq!(parse("1").unwrap().interval_ms, 1);
    }

    #[test]
    fn interval_defaults_to_two_seconds() {
        let args =
            Args::try_parse_from(["analyticore", "-t", "Hello world", "--api-url", "http://x"])
                .unwrap();
        assert_eq!(args.interval_ms, 2000);
    }
}
