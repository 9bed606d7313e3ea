// Rendition resolver: master playlist -> (video, audio) media playlists.

use std::fmt;

use tracing::{debug, error, info};
use url::Url;

use crate::error::ResolveError;
use crate::fetcher::ManifestFetcher;
use crate::playlist::{Manifest, MediaManifest};
use crate::start::StartParam;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Track {
    Video,
    Audio,
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Track::Video => write!(f, "video"),
            Track::Audio => write!(f, "audio"),
        }
    }
}

/// Media playlists of the first video variant and its first audio rendition.
#[derive(Debug, Clone)]
pub struct RenditionPair {
    pub video: MediaManifest,
    pub audio: MediaManifest,
}

pub struct RenditionResolver<'a> {
    fetcher: &'a dyn ManifestFetcher,
}

impl<'a> RenditionResolver<'a> {
    pub fn new(fetcher: &'a dyn ManifestFetcher) -> Self {
        Self { fetcher }
    }

    /// Fetches `master_url` and both selected renditions.
    ///
    /// `rendition_start`, when set, is appended to both rendition URLs so the two
    /// tracks are read from the same point of a time-shift window.
    pub async fn resolve(
        &self,
        master_url: &str,
        rendition_start: Option<StartParam>,
    ) -> Result<RenditionPair, ResolveError> {
        let master = match self.fetcher.fetch(master_url).await {
            Ok(Manifest::Master(master)) => master,
            Ok(Manifest::Media(_)) => {
                error!(url = master_url, "Expected a master playlist, got a media playlist");
                return Err(ResolveError::NotMaster {
                    url: master_url.to_string(),
                });
            }
            Err(e) => {
                error!(url = master_url, error = %e, "Failed to fetch the master playlist");
                return Err(ResolveError::Master(e));
            }
        };

        let Some(variant) = master.first_variant() else {
            error!(url = master_url, "No variant found in the master playlist");
            return Err(ResolveError::NoVariant {
                url: master_url.to_string(),
            });
        };
        let Some(audio) = variant.audio.first() else {
            error!(
                url = master_url,
                audio_group = ?variant.audio_group,
                "No audio rendition found in the master playlist"
            );
            return Err(ResolveError::NoAudioRendition {
                url: master_url.to_string(),
            });
        };

        let mut video_url = resolve_uri(master_url, &variant.uri);
        let mut audio_url = resolve_uri(master_url, &audio.uri);
        if let Some(start) = rendition_start {
            video_url = start.apply(&video_url);
            audio_url = start.apply(&audio_url);
        }

        info!(
            video = %video_url,
            audio = %audio_url,
            audio_name = %audio.name,
            "Resolved renditions"
        );

        let (video, audio) = tokio::join!(
            self.fetch_media(Track::Video, &video_url),
            self.fetch_media(Track::Audio, &audio_url),
        );

        Ok(RenditionPair {
            video: video?,
            audio: audio?,
        })
    }

    async fn fetch_media(&self, track: Track, url: &str) -> Result<MediaManifest, ResolveError> {
        match self.fetcher.fetch(url).await {
            Ok(Manifest::Media(media)) => Ok(media),
            Ok(Manifest::Master(_)) => {
                error!(%track, url, "Rendition is a master playlist");
                Err(ResolveError::UnexpectedMaster {
                    track,
                    url: url.to_string(),
                })
            }
            Err(source) => {
                error!(%track, url, error = %source, "Failed to fetch rendition");
                Err(ResolveError::Rendition { track, source })
            }
        }
    }
}

/// Resolves `reference` against `base` with standard URL semantics.
///
/// On failure the unresolved reference is returned as-is.
pub fn resolve_uri(base: &str, reference: &str) -> String {
    match Url::parse(base).and_then(|b| b.join(reference)) {
        Ok(resolved) => {
            debug!("Resolved URI: {} + {} -> {}", base, reference, resolved);
            resolved.to_string()
        }
        Err(e) => {
            error!(
                base,
                reference,
                error = %e,
                "Failed to resolve URI, using it unresolved"
            );
            reference.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FetchError, ParseError};
    use crate::playlist::{AudioRendition, MasterManifest, Segment, Variant};
    use crate::start::StartFormat;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeFetcher {
        manifests: HashMap<String, Manifest>,
        parse_failures: Vec<String>,
        requested: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        fn with(mut self, manifest: Manifest) -> Self {
            self.manifests.insert(manifest.url().to_string(), manifest);
            self
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ManifestFetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<Manifest, FetchError> {
            self.requested.lock().unwrap().push(url.to_string());
            if self.parse_failures.iter().any(|u| u == url) {
                return Err(ParseError::new(url, "bad syntax").into());
            }
            self.manifests
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::http_status(StatusCode::NOT_FOUND, url))
        }
    }

    const MASTER: &str = "https://origin.example.com/out/v1/index.m3u8";

    fn master(variants: Vec<Variant>) -> Manifest {
        Manifest::Master(MasterManifest {
            url: MASTER.to_string(),
            variants,
        })
    }

    fn variant(uri: &str, audio: &[&str]) -> Variant {
        Variant {
            uri: uri.to_string(),
            bandwidth: 1_000_000,
            audio_group: Some("aac".to_string()),
            audio: audio
                .iter()
                .map(|uri| AudioRendition {
                    uri: uri.to_string(),
                    group_id: "aac".to_string(),
                    name: "English".to_string(),
                    language: Some("eng".to_string()),
                })
                .collect(),
        }
    }

    fn media(url: &str, flags: &[bool]) -> Manifest {
        Manifest::Media(MediaManifest {
            url: url.to_string(),
            discontinuity_sequence_base: 0,
            segments: flags
                .iter()
                .enumerate()
                .map(|(i, &discontinuity)| Segment {
                    uri: format!("seg{i}.ts"),
                    duration: 6.0,
                    discontinuity,
                })
                .collect(),
            body: String::new(),
        })
    }

    #[tokio::test]
    async fn resolves_first_variant_and_first_audio() {
        let fetcher = FakeFetcher::default()
            .with(master(vec![
                variant("video_720.m3u8", &["audio_eng.m3u8", "audio_spa.m3u8"]),
                variant("video_360.m3u8", &["audio_eng.m3u8"]),
            ]))
            .with(media("https://origin.example.com/out/v1/video_720.m3u8", &[false]))
            .with(media("https://origin.example.com/out/v1/audio_eng.m3u8", &[true]));

        let pair = RenditionResolver::new(&fetcher)
            .resolve(MASTER, None)
            .await
            .expect("both renditions");

        assert_eq!(pair.video.url, "https://origin.example.com/out/v1/video_720.m3u8");
        assert_eq!(pair.audio.url, "https://origin.example.com/out/v1/audio_eng.m3u8");
    }

    #[tokio::test]
    async fn rolling_start_is_applied_to_both_renditions() {
        let fetcher = FakeFetcher::default()
            .with(master(vec![variant("v/720.m3u8?token=abc", &["a/eng.m3u8"])]))
            .with(media(
                "https://origin.example.com/out/v1/v/720.m3u8?token=abc&start=1700000000",
                &[],
            ))
            .with(media(
                "https://origin.example.com/out/v1/a/eng.m3u8?start=1700000000",
                &[],
            ));

        let start = StartParam::new(1_700_000_000, StartFormat::Posix);
        let pair = RenditionResolver::new(&fetcher)
            .resolve(MASTER, Some(start))
            .await
            .expect("both renditions");

        assert!(pair.video.url.ends_with("&start=1700000000"));
        assert!(pair.audio.url.ends_with("?start=1700000000"));
        assert_eq!(fetcher.requested()[0], MASTER);
    }

    #[tokio::test]
    async fn zero_variants_stops_before_rendition_fetch() {
        let fetcher = FakeFetcher::default().with(master(vec![]));

        let err = RenditionResolver::new(&fetcher)
            .resolve(MASTER, None)
            .await
            .expect_err("no variant");

        assert!(matches!(err, ResolveError::NoVariant { .. }));
        assert_eq!(fetcher.requested(), vec![MASTER.to_string()]);
    }

    #[tokio::test]
    async fn zero_audio_renditions_stops_before_rendition_fetch() {
        let fetcher = FakeFetcher::default().with(master(vec![variant("video.m3u8", &[])]));

        let err = RenditionResolver::new(&fetcher)
            .resolve(MASTER, None)
            .await
            .expect_err("no audio");

        assert!(matches!(err, ResolveError::NoAudioRendition { .. }));
        assert_eq!(fetcher.requested().len(), 1);
    }

    #[tokio::test]
    async fn media_playlist_at_master_url_is_not_master() {
        let fetcher = FakeFetcher::default().with(media(MASTER, &[false]));

        let err = RenditionResolver::new(&fetcher)
            .resolve(MASTER, None)
            .await
            .expect_err("not a master");
        assert_eq!(err.reason(), "not_master");
    }

    #[tokio::test]
    async fn master_fetch_and_parse_failures_are_distinct() {
        let missing = FakeFetcher::default();
        let err = RenditionResolver::new(&missing)
            .resolve(MASTER, None)
            .await
            .expect_err("404");
        assert_eq!(err.reason(), "master_fetch_failure");

        let garbled = FakeFetcher {
            parse_failures: vec![MASTER.to_string()],
            ..Default::default()
        };
        let err = RenditionResolver::new(&garbled)
            .resolve(MASTER, None)
            .await
            .expect_err("parse failure");
        assert_eq!(err.reason(), "master_parse_failure");
    }

    #[tokio::test]
    async fn missing_audio_rendition_is_incomplete() {
        let fetcher = FakeFetcher::default()
            .with(master(vec![variant("video.m3u8", &["audio.m3u8"])]))
            .with(media("https://origin.example.com/out/v1/video.m3u8", &[false]));

        let err = RenditionResolver::new(&fetcher)
            .resolve(MASTER, None)
            .await
            .expect_err("audio 404");
        match err {
            ResolveError::Rendition { track, source } => {
                assert_eq!(track, Track::Audio);
                assert!(source.is_not_found());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(fetcher.requested().len(), 3);
    }

    #[tokio::test]
    async fn rendition_that_is_a_master_is_rejected() {
        let fetcher = FakeFetcher::default()
            .with(master(vec![variant("index.m3u8", &["audio.m3u8"])]))
            .with(media("https://origin.example.com/out/v1/audio.m3u8", &[]));

        let err = RenditionResolver::new(&fetcher)
            .resolve(MASTER, None)
            .await
            .expect_err("video resolves back to the master");
        assert!(matches!(
            err,
            ResolveError::UnexpectedMaster {
                track: Track::Video,
                ..
            }
        ));
    }

    #[test]
    fn resolve_uri_handles_relative_absolute_and_parent_paths() {
        let base = "https://e.com/out/v1/index.m3u8?start=100";
        assert_eq!(resolve_uri(base, "video.m3u8"), "https://e.com/out/v1/video.m3u8");
        assert_eq!(resolve_uri(base, "../v2/a.m3u8"), "https://e.com/out/v2/a.m3u8");
        assert_eq!(resolve_uri(base, "/root.m3u8"), "https://e.com/root.m3u8");
        assert_eq!(
            resolve_uri(base, "https://cdn.other.com/x.m3u8"),
            "https://cdn.other.com/x.m3u8"
        );
    }

    #[test]
    fn resolve_uri_falls_back_to_reference() {
        assert_eq!(resolve_uri("not a url", "video.m3u8"), "video.m3u8");
    }
}
