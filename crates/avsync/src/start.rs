// Time-window `start` query parameter for time-shift capable origins.

use std::fmt;

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use rand::RngExt;
use tracing::warn;

/// Seconds kept between the newest random start point and "now" so the
/// origin has had time to publish the window.
pub const LIVE_EDGE_MARGIN_SECS: i64 = 30;

/// Marker in the URL of MediaPackage v2 style origins, which expect ISO-8601 start times.
const V2_ORIGIN_MARKER: &str = "mediapackagev2";

/// How the `start` parameter is chosen for one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartPolicy {
    /// Read the live edge, no `start` parameter.
    #[default]
    Live,
    /// Random point between the channel start and 30 seconds ago, applied to the master URL.
    FixedEpoch { channel_start: i64 },
    /// `now + offset` applied to both rendition URLs.
    RollingOffset { offset_minutes: i64 },
}

impl StartPolicy {
    /// Start parameter for the master playlist URL, if this policy sets one.
    pub fn master_start(&self, master_url: &str, now: DateTime<Utc>) -> Option<StartParam> {
        match *self {
            StartPolicy::FixedEpoch { channel_start } => {
                let secs = random_int(channel_start, now.timestamp() - LIVE_EDGE_MARGIN_SECS);
                Some(StartParam::new(secs, StartFormat::for_url(master_url)))
            }
            StartPolicy::Live | StartPolicy::RollingOffset { .. } => None,
        }
    }

    /// Start parameter for the video and audio rendition URLs, if this policy sets one.
    ///
    /// Computed once per check so both tracks are read from the same point.
    pub fn rendition_start(&self, master_url: &str, now: DateTime<Utc>) -> Option<StartParam> {
        match *self {
            StartPolicy::RollingOffset { offset_minutes } => {
                let secs = now.timestamp() + offset_minutes * 60;
                Some(StartParam::new(secs, StartFormat::for_url(master_url)))
            }
            StartPolicy::Live | StartPolicy::FixedEpoch { .. } => None,
        }
    }
}

impl fmt::Display for StartPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartPolicy::Live => write!(f, "live"),
            StartPolicy::FixedEpoch { channel_start } => {
                write!(f, "fixed-epoch (channel start {channel_start})")
            }
            StartPolicy::RollingOffset { offset_minutes } => {
                write!(f, "rolling-offset ({offset_minutes} min)")
            }
        }
    }
}

/// Rendering of the `start` value expected by the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartFormat {
    /// Raw POSIX seconds.
    Posix,
    /// ISO-8601 UTC with millisecond precision, e.g. `2024-05-01T10:00:00.000Z`.
    Iso8601,
}

impl StartFormat {
    pub fn for_url(url: &str) -> Self {
        if url.contains(V2_ORIGIN_MARKER) {
            StartFormat::Iso8601
        } else {
            StartFormat::Posix
        }
    }
}

/// A resolved start time plus the way it must be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartParam {
    pub epoch_secs: i64,
    pub format: StartFormat,
}

impl StartParam {
    pub fn new(epoch_secs: i64, format: StartFormat) -> Self {
        Self { epoch_secs, format }
    }

    /// Renders the value placed after `start=`.
    pub fn value(&self) -> String {
        match self.format {
            StartFormat::Posix => self.epoch_secs.to_string(),
            StartFormat::Iso8601 => match Utc.timestamp_opt(self.epoch_secs, 0).single() {
                Some(t) => t.to_rfc3339_opts(SecondsFormat::Millis, true),
                None => {
                    warn!(
                        epoch_secs = self.epoch_secs,
                        "Start time out of range for ISO-8601, using POSIX seconds"
                    );
                    self.epoch_secs.to_string()
                }
            },
        }
    }

    /// Appends `start=<value>` to `url`.
    pub fn apply(&self, url: &str) -> String {
        append_query_param(url, "start", &self.value())
    }
}

/// Appends `key=value`, using `&` when `url` already has a query string and `?` otherwise.
pub fn append_query_param(url: &str, key: &str, value: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{key}={value}")
}

/// Uniform random integer in `[min, max)`.
///
/// The caller must ensure `min < max`. For the fixed-epoch policy that means the
/// channel started more than 30 seconds ago. An empty range logs a warning and
/// yields `min`.
pub fn random_int(min: i64, max: i64) -> i64 {
    if min >= max {
        warn!(min, max, "Empty random range, using lower bound");
        return min;
    }
    rand::rng().random_range(min..max)
}
