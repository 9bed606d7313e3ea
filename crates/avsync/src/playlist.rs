// HLS playlist model: the subset of master/media playlist data the check consumes.
//
// Syntax is handled by m3u8-rs; this module only maps its output into a tagged
// representation that keeps the source URL of every playlist.

use m3u8_rs::{AlternativeMedia, AlternativeMediaType, parse_playlist_res};
use tracing::trace;

use crate::error::ParseError;

/// A fetched playlist, either a master or a media playlist.
#[derive(Debug, Clone, PartialEq)]
pub enum Manifest {
    Master(MasterManifest),
    Media(MediaManifest),
}

/// A master playlist listing stream variants.
#[derive(Debug, Clone, PartialEq)]
pub struct MasterManifest {
    pub url: String,
    pub variants: Vec<Variant>,
}

/// One `EXT-X-STREAM-INF` entry together with the audio renditions of its group.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub uri: String,
    pub bandwidth: u64,
    pub audio_group: Option<String>,
    pub audio: Vec<AudioRendition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioRendition {
    pub uri: String,
    pub group_id: String,
    pub name: String,
    pub language: Option<String>,
}

/// A media playlist of one rendition.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaManifest {
    pub url: String,
    /// Discontinuities that happened before the first listed segment
    /// (`EXT-X-DISCONTINUITY-SEQUENCE`, 0 when absent).
    pub discontinuity_sequence_base: u64,
    pub segments: Vec<Segment>,
    /// Raw playlist text as served.
    pub body: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub uri: String,
    pub duration: f64,
    /// An `EXT-X-DISCONTINUITY` tag precedes this segment.
    pub discontinuity: bool,
}

impl Manifest {
    /// Parses playlist bytes fetched from `url`.
    pub fn parse(url: &str, bytes: &[u8]) -> Result<Self, ParseError> {
        match parse_playlist_res(bytes) {
            Ok(m3u8_rs::Playlist::MasterPlaylist(pl)) => {
                Ok(Manifest::Master(MasterManifest::from_m3u8(url, pl)))
            }
            Ok(m3u8_rs::Playlist::MediaPlaylist(pl)) => Ok(Manifest::Media(
                MediaManifest::from_m3u8(url, pl, String::from_utf8_lossy(bytes).into_owned()),
            )),
            Err(e) => Err(ParseError::new(url, e.to_string())),
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Manifest::Master(m) => &m.url,
            Manifest::Media(m) => &m.url,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Manifest::Master(_) => "master",
            Manifest::Media(_) => "media",
        }
    }
}

impl MasterManifest {
    fn from_m3u8(url: &str, playlist: m3u8_rs::MasterPlaylist) -> Self {
        let alternatives = playlist.alternatives;
        let variants = playlist
            .variants
            .into_iter()
            // I-frame playlists carry no audio and are never the primary video track.
            .filter(|v| !v.is_i_frame)
            .map(|v| {
                let audio = v
                    .audio
                    .as_deref()
                    .map(|group| audio_renditions(&alternatives, group))
                    .unwrap_or_default();
                Variant {
                    uri: v.uri,
                    bandwidth: v.bandwidth,
                    audio_group: v.audio,
                    audio,
                }
            })
            .collect::<Vec<_>>();

        trace!(url, variants = variants.len(), "Parsed master playlist");

        Self {
            url: url.to_string(),
            variants,
        }
    }

    pub fn first_variant(&self) -> Option<&Variant> {
        self.variants.first()
    }
}

/// Audio renditions of `group` in playlist order. Renditions without a URI are
/// muxed into the variant stream and cannot be fetched on their own.
fn audio_renditions(alternatives: &[AlternativeMedia], group: &str) -> Vec<AudioRendition> {
    alternatives
        .iter()
        .filter(|m| m.media_type == AlternativeMediaType::Audio && m.group_id == group)
        .filter_map(|m| {
            m.uri.as_ref().map(|uri| AudioRendition {
                uri: uri.clone(),
                group_id: m.group_id.clone(),
                name: m.name.clone(),
                language: m.language.clone(),
            })
        })
        .collect()
}

impl MediaManifest {
    fn from_m3u8(url: &str, playlist: m3u8_rs::MediaPlaylist, body: String) -> Self {
        let segments = playlist
            .segments
            .into_iter()
            .map(|s| Segment {
                uri: s.uri,
                duration: f64::from(s.duration),
                discontinuity: s.discontinuity,
            })
            .collect::<Vec<_>>();

        trace!(
            url,
            segments = segments.len(),
            discontinuity_sequence = playlist.discontinuity_sequence,
            "Parsed media playlist"
        );

        Self {
            url: url.to_string(),
            discontinuity_sequence_base: playlist.discontinuity_sequence,
            segments,
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASTER: &str = "#EXTM3U
#EXT-X-VERSION:4
#EXT-X-INDEPENDENT-SEGMENTS
#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"aac\",NAME=\"English\",LANGUAGE=\"eng\",DEFAULT=YES,AUTOSELECT=YES,URI=\"audio_eng.m3u8\"
#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"aac\",NAME=\"Spanish\",LANGUAGE=\"spa\",DEFAULT=NO,AUTOSELECT=YES,URI=\"audio_spa.m3u8\"
#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"other\",NAME=\"Other\",DEFAULT=NO,URI=\"audio_other.m3u8\"
#EXT-X-STREAM-INF:BANDWIDTH=2200000,RESOLUTION=1280x720,CODECS=\"avc1.4d401f,mp4a.40.2\",AUDIO=\"aac\"
video_720.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=640x360,CODECS=\"avc1.4d401e,mp4a.40.2\",AUDIO=\"aac\"
video_360.m3u8
";

    const MEDIA: &str = "#EXTM3U
#EXT-X-VERSION:3
#EXT-X-TARGETDURATION:6
#EXT-X-MEDIA-SEQUENCE:120
#EXT-X-DISCONTINUITY-SEQUENCE:3
#EXTINF:6.0,
seg120.ts
#EXT-X-DISCONTINUITY
#EXTINF:6.0,
seg121.ts
#EXTINF:6.0,
seg122.ts
";

    #[test]
    fn parses_master_with_audio_groups() {
        let manifest = Manifest::parse("https://cdn.example.com/out/index.m3u8", MASTER.as_bytes())
            .expect("master should parse");
        let Manifest::Master(master) = manifest else {
            panic!("expected master playlist");
        };

        assert_eq!(master.url, "https://cdn.example.com/out/index.m3u8");
        assert_eq!(master.variants.len(), 2);

        let first = master.first_variant().expect("variant");
        assert_eq!(first.uri, "video_720.m3u8");
        assert_eq!(first.bandwidth, 2_200_000);
        assert_eq!(first.audio_group.as_deref(), Some("aac"));
        let uris: Vec<_> = first.audio.iter().map(|a| a.uri.as_str()).collect();
        assert_eq!(uris, vec!["audio_eng.m3u8", "audio_spa.m3u8"]);
        assert_eq!(first.audio[0].language.as_deref(), Some("eng"));
    }

    #[test]
    fn muxed_audio_without_uri_is_not_listed() {
        let input = "#EXTM3U
#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"aac\",NAME=\"Main\",DEFAULT=YES
#EXT-X-STREAM-INF:BANDWIDTH=1000000,AUDIO=\"aac\"
video.m3u8
";
        let Manifest::Master(master) = Manifest::parse("https://e.com/m.m3u8", input.as_bytes())
            .expect("master should parse")
        else {
            panic!("expected master playlist");
        };
        assert!(master.variants[0].audio.is_empty());
    }

    #[test]
    fn parses_media_with_discontinuity_base() {
        let manifest = Manifest::parse("https://cdn.example.com/out/v.m3u8", MEDIA.as_bytes())
            .expect("media should parse");
        assert_eq!(manifest.kind(), "media");
        let Manifest::Media(media) = manifest else {
            panic!("expected media playlist");
        };

        assert_eq!(media.discontinuity_sequence_base, 3);
        assert_eq!(media.segments.len(), 3);
        let flags: Vec<_> = media.segments.iter().map(|s| s.discontinuity).collect();
        assert_eq!(flags, vec![false, true, false]);
        assert_eq!(media.body, MEDIA);
    }

    #[test]
    fn missing_discontinuity_sequence_defaults_to_zero() {
        let input = "#EXTM3U\n#EXT-X-TARGETDURATION:2\n#EXTINF:2.0,\na.ts\n";
        let Manifest::Media(media) =
            Manifest::parse("https://e.com/a.m3u8", input.as_bytes()).expect("media")
        else {
            panic!("expected media playlist");
        };
        assert_eq!(media.discontinuity_sequence_base, 0);
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let err = Manifest::parse("https://e.com/x.m3u8", b"<html>not a playlist</html>")
            .expect_err("should not parse");
        assert_eq!(err.url, "https://e.com/x.m3u8");
    }
}
