// Mismatch alert: message formatting and hand-off to the notification sink.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{error, info};

use crate::compare::DiscontinuityReport;
use crate::error::NotifyError;
use crate::notification::{MessageId, NotificationSink};
use crate::resolver::RenditionPair;

pub const ALERT_SUBJECT: &str = "Discontinuity mismatch detected";

const HEADER_LINE: &str = "==========";
const SECTION_LINE: &str = "----------";

static LINE_BREAK_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*").unwrap());

/// Trims the message and folds every newline plus following whitespace
/// (blank lines, indentation) into a single `\n`.
pub fn trim_message(message: &str) -> String {
    LINE_BREAK_RUN
        .replace_all(message.trim(), "\n")
        .into_owned()
}

/// Builds the alert body: the master URL and both rendition URLs, each
/// section closed by a delimiter line.
pub fn format_alert(master_url: &str, pair: &RenditionPair, include_bodies: bool) -> String {
    let (video_body, audio_body) = if include_bodies {
        (pair.video.body.as_str(), pair.audio.body.as_str())
    } else {
        ("", "")
    };

    let message = format!(
        "
        {HEADER_LINE}
        Playlist URL: {master_url}
        {SECTION_LINE}
        {video_url}
        {video_body}
        {SECTION_LINE}
        {audio_url}
        {audio_body}
        {SECTION_LINE}
        ",
        video_url = pair.video.url,
        audio_url = pair.audio.url,
    );
    trim_message(&message)
}

/// Publishes mismatch alerts, one per detected mismatch.
pub struct AlertEmitter {
    sink: Arc<dyn NotificationSink>,
}

impl AlertEmitter {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    pub async fn emit(
        &self,
        master_url: &str,
        pair: &RenditionPair,
        report: &DiscontinuityReport,
        include_bodies: bool,
    ) -> Result<MessageId, NotifyError> {
        let message = format_alert(master_url, pair, include_bodies);

        info!(
            video = report.video_count,
            audio = report.audio_count,
            "[FAIL] Audio and video renditions have different amount of DISCONTINUITY"
        );
        info!("{message}");

        match self.sink.publish(ALERT_SUBJECT, &message).await {
            Ok(id) => {
                info!(
                    sink = self.sink.sink_type(),
                    message_id = %id,
                    "Notification sent"
                );
                Ok(id)
            }
            Err(e) => {
                error!(
                    sink = self.sink.sink_type(),
                    error = %e,
                    "Failed to deliver mismatch notification"
                );
                Err(e)
            }
        }
    }
}
