//! HLS audio/video discontinuity consistency checker.
//!
//! One check fetches a master playlist, resolves its first video variant and
//! that variant's first audio rendition, counts `EXT-X-DISCONTINUITY` markers
//! on both tracks and publishes an alert when the counts diverge.
//!
//! ```no_run
//! use std::sync::Arc;
//! use avsync_engine::{
//!     AlertConfig, CheckConfig, Checker, HttpConfig, HttpManifestFetcher, StartPolicy,
//!     notification::LogSink,
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CheckConfig {
//!     master_playlist_url: "https://example.com/out/v1/index.m3u8".to_string(),
//!     start_policy: StartPolicy::RollingOffset { offset_minutes: -30 },
//!     alert: AlertConfig::default(),
//! };
//! let fetcher = Arc::new(HttpManifestFetcher::new(&HttpConfig::default())?);
//! let checker = Checker::new(config, fetcher, Arc::new(LogSink));
//! let outcome = checker.run().await?;
//! println!("{outcome}");
//! # Ok(())
//! # }
//! ```

pub mod alert;
pub mod check;
pub mod compare;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod notification;
pub mod playlist;
pub mod resolver;
pub mod start;

pub use alert::{ALERT_SUBJECT, AlertEmitter, format_alert, trim_message};
pub use check::{CheckOutcome, Checker};
pub use compare::{DiscontinuityReport, compare, compare_discontinuities};
pub use config::{AlertConfig, CheckConfig, HttpConfig};
pub use error::{CheckError, ConfigError, FetchError, NotifyError, ParseError, ResolveError};
pub use fetcher::{HttpManifestFetcher, ManifestFetcher};
pub use notification::{MessageId, NotificationSink};
pub use playlist::{AudioRendition, Manifest, MasterManifest, MediaManifest, Segment, Variant};
pub use resolver::{RenditionPair, RenditionResolver, Track};
pub use start::{StartFormat, StartParam, StartPolicy};
