mod cli;
mod error;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use avsync_engine::notification::{LogSink, WebhookAuth, WebhookConfig, WebhookSink};
use avsync_engine::{Checker, HttpManifestFetcher, NotificationSink, StartPolicy};
use clap::Parser;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::cli::{Args, Commands, LogFormat, SinkChoice};
use crate::error::{AppError, Result};

/// Exit code of a `check` that found diverging discontinuity counts.
const MISMATCH_EXIT_CODE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env before clap reads the environment
    dotenvy::dotenv().ok();
    let args = Args::parse();

    if let Err(e) = init_logging(&args.log_filter(), args.log_format) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            error!("Application error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(filter: &str, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_new(filter).map_err(|e| AppError::Logging(e.to_string()))?;
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry.with(fmt::layer().with_target(false)).try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true))
            .try_init(),
    }
    .map_err(|e| AppError::Logging(e.to_string()))
}

async fn run(args: Args) -> Result<ExitCode> {
    let config = args.check_config()?;
    if config.start_policy == StartPolicy::Live {
        warn!("Neither CHANNEL_START_TIME nor OFFSET_IN_MINUTE is set, checking the live edge");
    }

    let fetcher = HttpManifestFetcher::new(&args.http_config())
        .map_err(|e| AppError::HttpClient(e.to_string()))?;
    let sink = build_sink(args.sink_choice()).await?;
    info!(
        url = %config.master_playlist_url,
        policy = %config.start_policy,
        sink = sink.sink_type(),
        "Configured discontinuity check"
    );

    let checker = Checker::new(config, Arc::new(fetcher), sink);

    match args.command.unwrap_or_default() {
        Commands::Check => check_once(&checker).await,
        Commands::Watch { interval } => {
            watch(&checker, Duration::from_secs(interval)).await;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn build_sink(choice: SinkChoice) -> Result<Arc<dyn NotificationSink>> {
    match choice {
        SinkChoice::Sns { topic_arn, region } => sns_sink(topic_arn, region).await,
        SinkChoice::Webhook { url, bearer_token } => {
            let config = WebhookConfig {
                auth: bearer_token.map(|token| WebhookAuth::Bearer { token }),
                ..WebhookConfig::new(url)
            };
            Ok(Arc::new(WebhookSink::new(config)?))
        }
        SinkChoice::Log => {
            warn!("No alert destination configured (or --dry-run), alerts are only logged");
            Ok(Arc::new(LogSink))
        }
    }
}

#[cfg(feature = "sns")]
async fn sns_sink(topic_arn: String, region: Option<String>) -> Result<Arc<dyn NotificationSink>> {
    use avsync_engine::notification::{SnsConfig, SnsSink};

    let sink = SnsSink::new(SnsConfig { topic_arn, region }).await?;
    Ok(Arc::new(sink))
}

#[cfg(not(feature = "sns"))]
async fn sns_sink(_topic_arn: String, _region: Option<String>) -> Result<Arc<dyn NotificationSink>> {
    Err(AppError::Unsupported("SNS"))
}

async fn check_once(checker: &Checker) -> Result<ExitCode> {
    let outcome = checker.run().await?;
    info!(%outcome, "Check finished");

    if outcome.is_mismatch() {
        Ok(ExitCode::from(MISMATCH_EXIT_CODE))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Runs checks back to back on a fixed period until Ctrl-C.
async fn watch(checker: &Checker, period: Duration) {
    let token = CancellationToken::new();
    let shutdown = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl-C, stopping"),
            Err(e) => {
                error!(error = %e, "Failed to listen for Ctrl-C");
                return;
            }
        }
        shutdown.cancel();
    });

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!(interval_secs = period.as_secs(), "Watching channel");

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        tokio::select! {
            _ = token.cancelled() => break,
            result = checker.run() => match result {
                Ok(outcome) => info!(%outcome, "Check finished"),
                Err(e) => error!(error = %e, "Check failed"),
            },
        }
    }
}
