use std::time::Duration;

use url::Url;

use crate::error::ConfigError;
use crate::start::StartPolicy;

pub const DEFAULT_USER_AGENT: &str = concat!("avsync/", env!("CARGO_PKG_VERSION"));

/// Everything one check needs, passed explicitly to [`crate::Checker`].
#[derive(Debug, Clone)]
pub struct CheckConfig {
    /// Absolute URL of the channel's master playlist.
    pub master_playlist_url: String,
    pub start_policy: StartPolicy,
    pub alert: AlertConfig,
}

impl CheckConfig {
    pub fn new(master_playlist_url: impl Into<String>, start_policy: StartPolicy) -> Self {
        Self {
            master_playlist_url: master_playlist_url.into(),
            start_policy,
            alert: AlertConfig::default(),
        }
    }

    /// Checks that the master URL is absolute HTTP(S).
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.master_playlist_url)
            .map_err(|e| ConfigError::invalid("MASTER_PLAYLIST_URL", e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::invalid(
                "MASTER_PLAYLIST_URL",
                format!("unsupported scheme `{}`", url.scheme()),
            ));
        }
        Ok(())
    }
}

/// Selects the start policy from the two mutually exclusive settings.
pub fn start_policy_from(
    channel_start_time: Option<i64>,
    offset_in_minute: Option<i64>,
) -> Result<StartPolicy, ConfigError> {
    match (channel_start_time, offset_in_minute) {
        (Some(_), Some(_)) => Err(ConfigError::Conflict(
            "CHANNEL_START_TIME and OFFSET_IN_MINUTE are mutually exclusive".to_string(),
        )),
        (Some(channel_start), None) => Ok(StartPolicy::FixedEpoch { channel_start }),
        (None, Some(offset_minutes)) => Ok(StartPolicy::RollingOffset { offset_minutes }),
        (None, None) => Ok(StartPolicy::Live),
    }
}

/// Alert message options.
#[derive(Debug, Clone, Default)]
pub struct AlertConfig {
    /// Append the raw rendition playlists to the alert body.
    pub include_manifest_bodies: bool,
}

/// HTTP client options for playlist fetching.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Overall request timeout, zero disables it.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
    pub follow_redirects: bool,
    /// Honour `HTTP(S)_PROXY` style environment settings.
    pub use_system_proxy: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            follow_redirects: true,
            use_system_proxy: true,
        }
    }
}
