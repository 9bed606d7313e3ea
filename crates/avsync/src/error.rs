use reqwest::StatusCode;

use crate::resolver::Track;

/// The fetched body is not a valid HLS playlist.
#[derive(Debug, Clone, thiserror::Error)]
#[error("failed to parse playlist {url}: {reason}")]
pub struct ParseError {
    pub url: String,
    pub reason: String,
}

impl ParseError {
    pub fn new(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

/// Failure to obtain a playlist from a single GET.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request for {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request for {url} failed with HTTP {status}")]
    HttpStatus { status: StatusCode, url: String },

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl FetchError {
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    pub fn http_status(status: StatusCode, url: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            url: url.into(),
        }
    }

    /// True when the origin answered but had nothing usable for us.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::HttpStatus { .. })
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse(_))
    }
}

/// Why a check could not collect both renditions.
///
/// None of these are fatal: the invocation ends without a determination and
/// the next scheduled run tries again.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("failed to fetch the master playlist: {0}")]
    Master(#[source] FetchError),

    #[error("{url} is a media playlist, expected a master playlist")]
    NotMaster { url: String },

    #[error("no variant found in the master playlist {url}")]
    NoVariant { url: String },

    #[error("no audio rendition found for the first variant of {url}")]
    NoAudioRendition { url: String },

    #[error("failed to fetch the {track} rendition: {source}")]
    Rendition {
        track: Track,
        #[source]
        source: FetchError,
    },

    #[error("the {track} rendition {url} is a master playlist, expected a media playlist")]
    UnexpectedMaster { track: Track, url: String },
}

impl ResolveError {
    /// Short machine-readable reason, used as a structured log field.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Master(FetchError::Parse(_)) => "master_parse_failure",
            Self::Master(_) => "master_fetch_failure",
            Self::NotMaster { .. } => "not_master",
            Self::NoVariant { .. } => "no_variant",
            Self::NoAudioRendition { .. } => "no_audio_rendition",
            Self::Rendition {
                source: FetchError::Parse(_),
                ..
            } => "rendition_parse_failure",
            Self::Rendition { .. } => "rendition_fetch_failure",
            Self::UnexpectedMaster { .. } => "rendition_not_media",
        }
    }
}

/// Delivery of an alert failed.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("notification endpoint answered HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("SNS publish failed: {0}")]
    Sns(String),

    #[error("notification configuration error: {0}")]
    Configuration(String),
}

/// Errors surfaced by a check invocation.
///
/// Only a failed notification escapes: a mismatch was detected but nobody was told.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("mismatch detected but the alert was not delivered: {0}")]
    Notification(#[from] NotifyError),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("conflicting configuration: {0}")]
    Conflict(String),
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
