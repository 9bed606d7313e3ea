// One stateless consistency check: build URL, resolve renditions, compare, alert.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use crate::alert::AlertEmitter;
use crate::compare::{DiscontinuityReport, compare_discontinuities};
use crate::config::CheckConfig;
use crate::error::{CheckError, ResolveError};
use crate::fetcher::ManifestFetcher;
use crate::notification::{MessageId, NotificationSink};
use crate::resolver::RenditionResolver;

/// Result of one check.
#[derive(Debug)]
pub enum CheckOutcome {
    /// Both tracks report the same discontinuity count.
    Pass(DiscontinuityReport),
    /// Counts diverged and the alert was delivered.
    Mismatch {
        report: DiscontinuityReport,
        message_id: MessageId,
    },
    /// Not enough data to decide this cycle.
    Incomplete(ResolveError),
}

impl CheckOutcome {
    pub fn is_mismatch(&self) -> bool {
        matches!(self, CheckOutcome::Mismatch { .. })
    }

    pub fn report(&self) -> Option<&DiscontinuityReport> {
        match self {
            CheckOutcome::Pass(report) | CheckOutcome::Mismatch { report, .. } => Some(report),
            CheckOutcome::Incomplete(_) => None,
        }
    }
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckOutcome::Pass(report) => write!(f, "PASS ({report})"),
            CheckOutcome::Mismatch { report, message_id } => {
                write!(f, "FAIL ({report}), notification {message_id}")
            }
            CheckOutcome::Incomplete(reason) => write!(f, "INCOMPLETE ({reason})"),
        }
    }
}

pub struct Checker {
    config: CheckConfig,
    fetcher: Arc<dyn ManifestFetcher>,
    alerts: AlertEmitter,
}

impl Checker {
    pub fn new(
        config: CheckConfig,
        fetcher: Arc<dyn ManifestFetcher>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            config,
            fetcher,
            alerts: AlertEmitter::new(sink),
        }
    }

    pub async fn run(&self) -> Result<CheckOutcome, CheckError> {
        self.run_at(Utc::now()).await
    }

    /// Runs a check as if the current time were `now`.
    #[instrument(skip(self), fields(policy = %self.config.start_policy))]
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<CheckOutcome, CheckError> {
        let base_url = self.config.master_playlist_url.as_str();
        let policy = self.config.start_policy;

        let master_url = match policy.master_start(base_url, now) {
            Some(start) => start.apply(base_url),
            None => base_url.to_string(),
        };
        let rendition_start = policy.rendition_start(base_url, now);

        info!(url = %master_url, "Fetching the master playlist");

        let pair = match RenditionResolver::new(self.fetcher.as_ref())
            .resolve(&master_url, rendition_start)
            .await
        {
            Ok(pair) => pair,
            Err(e) => {
                warn!(reason = e.reason(), "Failed to fetch both renditions, skipping this cycle");
                return Ok(CheckOutcome::Incomplete(e));
            }
        };

        let report = compare_discontinuities(&pair.video, &pair.audio);
        if report.is_consistent() {
            info!("[PASS] Audio and video renditions have the same amount of DISCONTINUITY");
            return Ok(CheckOutcome::Pass(report));
        }

        let message_id = self
            .alerts
            .emit(
                base_url,
                &pair,
                &report,
                self.config.alert.include_manifest_bodies,
            )
            .await?;

        Ok(CheckOutcome::Mismatch { report, message_id })
    }
}
