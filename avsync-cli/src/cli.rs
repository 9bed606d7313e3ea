use std::time::Duration;

use avsync_engine::config::start_policy_from;
use avsync_engine::{AlertConfig, CheckConfig, HttpConfig};
use clap::{Parser, Subcommand, ValueEnum};

use crate::error::Result;

/// Default log filter when neither `--log-level` nor `RUST_LOG` is set.
pub const DEFAULT_LOG_FILTER: &str = "avsync=info,avsync_engine=info";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Master playlist URL of the channel to check
    #[arg(short, long, env = "MASTER_PLAYLIST_URL", global = true)]
    pub url: Option<String>,

    /// Channel start time (POSIX seconds); picks a random start offset per check
    #[arg(long, env = "CHANNEL_START_TIME", global = true)]
    pub channel_start_time: Option<i64>,

    /// Start offset from now in minutes, applied to both renditions
    #[arg(
        long,
        env = "OFFSET_IN_MINUTE",
        allow_negative_numbers = true,
        global = true
    )]
    pub offset_in_minute: Option<i64>,

    /// SNS topic to publish mismatch alerts to
    #[arg(long, env = "SNS_TOPIC_ARN", global = true)]
    pub sns_topic_arn: Option<String>,

    /// AWS region of the SNS topic
    #[arg(long, env = "REGION", global = true)]
    pub region: Option<String>,

    /// Webhook to POST mismatch alerts to, used when no SNS topic is set
    #[arg(long, env = "WEBHOOK_URL", global = true)]
    pub webhook_url: Option<String>,

    /// Bearer token sent with webhook alerts
    #[arg(long, env = "WEBHOOK_BEARER_TOKEN", global = true, hide_env_values = true)]
    pub webhook_bearer_token: Option<String>,

    /// Append the fetched manifest text to alerts
    #[arg(
        long,
        env = "AVSYNC_INCLUDE_MANIFESTS",
        value_parser = clap::builder::BoolishValueParser::new(),
        global = true
    )]
    pub include_manifests: bool,

    /// Log alerts instead of delivering them
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// HTTP timeout in seconds for playlist requests
    #[arg(
        long,
        env = "AVSYNC_HTTP_TIMEOUT_SECS",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..),
        global = true
    )]
    pub timeout: u64,

    /// Log filter, e.g. `info` or `avsync_engine=debug`
    #[arg(long, env = "RUST_LOG", global = true)]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long, env = "AVSYNC_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Commands {
    /// Run a single check (default)
    #[default]
    Check,

    /// Run a check every `--interval` seconds until Ctrl-C
    Watch {
        /// Seconds between checks
        #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
        interval: u64,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Where mismatch alerts go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkChoice {
    Sns {
        topic_arn: String,
        region: Option<String>,
    },
    Webhook {
        url: String,
        bearer_token: Option<String>,
    },
    Log,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl Args {
    pub fn check_config(&self) -> Result<CheckConfig> {
        let url = non_empty(&self.url).ok_or_else(|| {
            avsync_engine::ConfigError::invalid("MASTER_PLAYLIST_URL", "no master playlist URL set")
        })?;
        let policy = start_policy_from(self.channel_start_time, self.offset_in_minute)?;

        let config = CheckConfig {
            alert: AlertConfig {
                include_manifest_bodies: self.include_manifests,
            },
            ..CheckConfig::new(url, policy)
        };
        config.validate()?;
        Ok(config)
    }

    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            timeout: Duration::from_secs(self.timeout),
            ..HttpConfig::default()
        }
    }

    pub fn sink_choice(&self) -> SinkChoice {
        if self.dry_run {
            return SinkChoice::Log;
        }
        if let Some(topic_arn) = non_empty(&self.sns_topic_arn) {
            return SinkChoice::Sns {
                topic_arn,
                region: non_empty(&self.region),
            };
        }
        if let Some(url) = non_empty(&self.webhook_url) {
            return SinkChoice::Webhook {
                url,
                bearer_token: non_empty(&self.webhook_bearer_token),
            };
        }
        SinkChoice::Log
    }

    pub fn log_filter(&self) -> String {
        non_empty(&self.log_level).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
    }
}
