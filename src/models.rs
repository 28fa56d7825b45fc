use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::str::FromStr;

pub const DEFAULT_LANGUAGE: &str = "en-US";
pub const ADDON_STREAM_NAME: &str = "Trailio";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Series,
}

impl MediaKind {
    /// Path segment TMDb uses for this kind (`/movie/..` vs `/tv/..`).
    pub fn tmdb_path(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Series => "tv",
        }
    }
}

impl FromStr for MediaKind {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "movie" => Ok(MediaKind::Movie),
            "series" => Ok(MediaKind::Series),
            _ => Err(anyhow::anyhow!("media kind must be 'movie' or 'series'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MediaRequest {
    pub external_id: String,
    pub kind: MediaKind,
    pub language: String,
}

impl MediaRequest {
    pub fn new(external_id: impl Into<String>, kind: MediaKind, language: Option<&str>) -> Self {
        let language = language
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_LANGUAGE)
            .to_string();
        Self {
            external_id: external_id.into(),
            kind,
            language,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMedia {
    pub provider_id: String,
    pub display_title: String,
    pub year: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoCategory {
    Trailer,
    Teaser,
    Other,
}

impl VideoCategory {
    pub fn from_type_tag(tag: &str) -> Self {
        match tag {
            "Trailer" => VideoCategory::Trailer,
            "Teaser" => VideoCategory::Teaser,
            _ => VideoCategory::Other,
        }
    }
}

#[derive(Debug, Clone)]
pub struct VideoCandidate {
    pub site: String,
    pub category: VideoCategory,
    pub key: String,
    pub title: String,
    pub official: bool,
}

#[derive(Debug, Clone)]
pub struct SearchCandidate {
    pub title: String,
    pub link: String,
    pub description: String,
    pub duration_seconds: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoReference {
    pub key: String,
    pub title: String,
}

impl VideoReference {
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamResult {
    pub label: String,
    pub reference: VideoReference,
}

// Stremio plays YouTube streams natively when given `ytId`.
impl Serialize for StreamResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct BehaviorHints {
            not_web_ready: bool,
        }

        let mut s = serializer.serialize_struct("StreamResult", 4)?;
        s.serialize_field("name", ADDON_STREAM_NAME)?;
        s.serialize_field("title", &self.label)?;
        s.serialize_field("ytId", &self.reference.key)?;
        s.serialize_field(
            "behaviorHints",
            &BehaviorHints {
                not_web_ready: true,
            },
        )?;
        s.end()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StreamResponse {
    pub streams: Vec<StreamResult>,
}
