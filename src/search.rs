use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::models::SearchCandidate;

const SERPAPI_ENDPOINT: &str = "https://serpapi.com/search.json";
pub const MAX_SEARCH_RESULTS: usize = 10;

/// Free-text YouTube search. Results keep the provider's ranking.
#[async_trait]
pub trait SearchApi: Send + Sync {
    async fn search_videos(
        &self,
        query: &str,
        hl: &str,
        gl: &str,
        api_key: &str,
    ) -> Result<Vec<SearchCandidate>>;
}

#[derive(Debug, Clone)]
pub struct SerpApiClient {
    client: Client,
    endpoint: String,
}

impl SerpApiClient {
    pub fn new(client: Client) -> Self {
        Self::with_endpoint(client, SERPAPI_ENDPOINT)
    }

    pub fn with_endpoint(client: Client, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
        }
    }
}

#[async_trait]
impl SearchApi for SerpApiClient {
    async fn search_videos(
        &self,
        query: &str,
        hl: &str,
        gl: &str,
        api_key: &str,
    ) -> Result<Vec<SearchCandidate>> {
        let res = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("engine", "youtube"),
                ("search_query", query),
                ("hl", hl),
                ("gl", gl),
                ("api_key", api_key),
            ])
            .send()
            .await
            .context("SerpAPI request failed")?;

        let status = res.status();
        let bytes = res.bytes().await.context("Failed to read SerpAPI body")?;
        if !status.is_success() {
            return Err(anyhow!(
                "SerpAPI HTTP error (status {}): {}",
                status,
                String::from_utf8_lossy(&bytes)
            ));
        }

        let parsed: SearchResponse =
            serde_json::from_slice(&bytes).context("Failed to parse SerpAPI JSON")?;
        if let Some(err) = parsed.error {
            return Err(anyhow!("SerpAPI error: {}", err));
        }
        Ok(parsed
            .video_results
            .into_iter()
            .take(MAX_SEARCH_RESULTS)
            .map(VideoResult::into_candidate)
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    video_results: Vec<VideoResult>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    description: String,
    length: Option<String>,
}

impl VideoResult {
    fn into_candidate(self) -> SearchCandidate {
        SearchCandidate {
            duration_seconds: self.length.as_deref().map(parse_duration).unwrap_or(0),
            title: self.title,
            link: self.link,
            description: self.description,
        }
    }
}

/// `hh:mm:ss`, `mm:ss` or `ss` to seconds. Missing or unparsable parts count as zero.
pub fn parse_duration(text: &str) -> u32 {
    text.trim()
        .rsplit(':')
        .take(3)
        .zip([1u32, 60, 3600])
        .map(|(part, unit)| part.trim().parse::<u32>().unwrap_or(0).saturating_mul(unit))
        .fold(0, u32::saturating_add)
}

/// YouTube video key from a watch, short, embed or youtu.be link.
pub fn youtube_key(link: &str) -> Option<String> {
    let url = Url::parse(link.trim()).ok()?;
    let host = url.host_str()?.to_ascii_lowercase();
    let mut segments = url.path_segments()?;

    let key = if host == "youtu.be" {
        segments.next().map(str::to_string)
    } else if host == "youtube.com" || host.ends_with(".youtube.com") {
        match segments.next()? {
            "watch" => url
                .query_pairs()
                .find(|(name, _)| name == "v")
                .map(|(_, value)| value.into_owned()),
            "shorts" | "embed" => segments.next().map(str::to_string),
            _ => None,
        }
    } else {
        None
    }?;
    (!key.is_empty()).then_some(key)
}
