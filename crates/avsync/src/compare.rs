// Discontinuity comparison between the video and audio media playlists.

use std::fmt;

use tracing::info;

use crate::playlist::MediaManifest;

/// Cumulative discontinuity counts where the comparison stopped.
///
/// Counts are `u128`: a base may be as large as `u64::MAX` and markers are
/// added on top of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscontinuityReport {
    pub video_count: u128,
    pub audio_count: u128,
    /// Segment pairs inspected before the walk stopped.
    pub inspected: usize,
}

impl DiscontinuityReport {
    pub fn is_consistent(&self) -> bool {
        self.video_count == self.audio_count
    }
}

impl fmt::Display for DiscontinuityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Video: {}, Audio: {}",
            self.video_count, self.audio_count
        )
    }
}

/// Walks both segment lists in lockstep, starting from each playlist's
/// discontinuity sequence base.
///
/// The walk ends when either list is exhausted or as soon as the running
/// counts differ; segments past the first divergence are never looked at, so a
/// later re-convergence does not hide a mismatch. Markers at different offsets
/// are tolerated as long as the counts agree where the shorter list ends.
pub fn compare_discontinuities(video: &MediaManifest, audio: &MediaManifest) -> DiscontinuityReport {
    let mut video_count = u128::from(video.discontinuity_sequence_base);
    let mut audio_count = u128::from(audio.discontinuity_sequence_base);
    let mut inspected = 0;

    for (v, a) in video.segments.iter().zip(&audio.segments) {
        if video_count != audio_count {
            break;
        }
        video_count += u128::from(v.discontinuity);
        audio_count += u128::from(a.discontinuity);
        inspected += 1;
    }

    let report = DiscontinuityReport {
        video_count,
        audio_count,
        inspected,
    };
    info!(
        video = report.video_count,
        audio = report.audio_count,
        inspected = report.inspected,
        "Discontinuity count"
    );
    report
}

/// `true` when both tracks report the same number of discontinuities.
pub fn compare(video: &MediaManifest, audio: &MediaManifest) -> bool {
    compare_discontinuities(video, audio).is_consistent()
}
