use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::models::{MediaKind, ResolvedMedia, VideoCandidate, VideoCategory};

pub const TMDB_BASE: &str = "https://api.themoviedb.org/3";

#[async_trait]
pub trait TmdbApi: Send + Sync {
    /// Cross-reference an IMDb id. `Ok(None)` when TMDb knows no entry of that kind.
    async fn find_by_imdb(
        &self,
        imdb_id: &str,
        kind: MediaKind,
        api_key: &str,
        language: &str,
    ) -> Result<Option<ResolvedMedia>>;

    async fn fetch_videos(
        &self,
        provider_id: &str,
        kind: MediaKind,
        api_key: &str,
        language: &str,
    ) -> Result<Vec<VideoCandidate>>;
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    base_url: String,
}

impl TmdbClient {
    pub fn new() -> Result<Self> {
        Ok(Self::with_client(build_http_client()?, TMDB_BASE))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str, api_key: &str) -> Result<T> {
        let res = self
            .client
            .get(url)
            .query(&[("api_key", api_key)])
            .send()
            .await
            .context("request failed")?;
        let status = res.status();
        let text = res.text().await.context("reading body failed")?;
        if !status.is_success() {
            return Err(anyhow!("{} -> {} {}", url, status, text));
        }
        let parsed: T = serde_json::from_str(&text).context("JSON parse failed")?;
        Ok(parsed)
    }
}

pub fn build_http_client() -> Result<Client> {
    let user_agent = format!("trailio/{}", env!("CARGO_PKG_VERSION"));
    Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .timeout(Duration::from_secs(20))
        .user_agent(user_agent)
        .build()
        .context("Failed to build HTTP client")
}

#[async_trait]
impl TmdbApi for TmdbClient {
    async fn find_by_imdb(
        &self,
        imdb_id: &str,
        kind: MediaKind,
        api_key: &str,
        language: &str,
    ) -> Result<Option<ResolvedMedia>> {
        let url = format!(
            "{}/find/{}?external_source=imdb_id&language={}",
            self.base_url,
            urlencoding::encode(imdb_id),
            urlencoding::encode(language)
        );
        let data: FindResponse = self
            .get_json(&url, api_key)
            .await
            .with_context(|| format!("TMDb find failed for {}", imdb_id))?;
        Ok(data.first_for(kind))
    }

    async fn fetch_videos(
        &self,
        provider_id: &str,
        kind: MediaKind,
        api_key: &str,
        language: &str,
    ) -> Result<Vec<VideoCandidate>> {
        let url = format!(
            "{}/{}/{}/videos?language={}",
            self.base_url,
            kind.tmdb_path(),
            urlencoding::encode(provider_id),
            urlencoding::encode(language)
        );
        let data: Videos = self
            .get_json(&url, api_key)
            .await
            .with_context(|| format!("TMDb videos failed for {} ({})", provider_id, language))?;
        Ok(data.results.into_iter().map(Video::into_candidate).collect())
    }
}

#[derive(Debug, Deserialize)]
struct FindResponse {
    movie_results: Option<Vec<FindMovie>>,
    tv_results: Option<Vec<FindShow>>,
}

#[derive(Debug, Deserialize)]
struct FindMovie {
    id: i64,
    title: Option<String>,
    release_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FindShow {
    id: i64,
    name: Option<String>,
    first_air_date: Option<String>,
}

impl FindResponse {
    // Provider order is trusted; the first entry wins.
    fn first_for(self, kind: MediaKind) -> Option<ResolvedMedia> {
        match kind {
            MediaKind::Movie => self
                .movie_results
                .and_then(|v| v.into_iter().next())
                .map(|m| resolved(m.id, m.title, m.release_date)),
            MediaKind::Series => self
                .tv_results
                .and_then(|v| v.into_iter().next())
                .map(|s| resolved(s.id, s.name, s.first_air_date)),
        }
    }
}

fn resolved(id: i64, title: Option<String>, date: Option<String>) -> ResolvedMedia {
    ResolvedMedia {
        provider_id: id.to_string(),
        display_title: title.unwrap_or_default().trim().to_string(),
        year: date.as_deref().and_then(extract_year).unwrap_or_default(),
    }
}

#[derive(Debug, Deserialize)]
struct Videos {
    #[serde(default)]
    results: Vec<Video>,
}

#[derive(Debug, Deserialize)]
struct Video {
    #[serde(default)]
    site: String,
    #[serde(rename = "type", default)]
    video_type: String,
    key: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    official: bool,
}

impl Video {
    fn into_candidate(self) -> VideoCandidate {
        VideoCandidate {
            category: VideoCategory::from_type_tag(&self.video_type),
            site: self.site,
            key: self.key,
            title: self.name,
            official: self.official,
        }
    }
}

pub fn extract_year(date: &str) -> Option<String> {
    let year = date.trim().get(..4)?;
    year.chars()
        .all(|c| c.is_ascii_digit())
        .then(|| year.to_string())
}
