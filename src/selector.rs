use anyhow::Result;
use tracing::{debug, info};

use crate::locale::{primary_subtag, region_subtag, Locale};
use crate::models::{
    MediaKind, SearchCandidate, VideoCandidate, VideoCategory, VideoReference, DEFAULT_LANGUAGE,
};
use crate::search::{youtube_key, SearchApi, MAX_SEARCH_RESULTS};
use crate::tmdb::TmdbApi;

/// The only site whose keys Stremio can play back.
pub const RECOGNIZED_SITE: &str = "YouTube";

pub const TITLE_MATCH_POINTS: i32 = 5;
pub const ENDING_PHRASE_POINTS: i32 = 8;
pub const ENDING_LONG_SECS: u32 = 180;
pub const ENDING_LONG_POINTS: i32 = 3;
pub const ENDING_SHORT_SECS: u32 = 60;
pub const ENDING_SHORT_PENALTY: i32 = -4;
pub const MAKING_OF_POINTS: i32 = 6;
pub const BEHIND_SCENES_POINTS: i32 = 6;
pub const INTERVIEW_POINTS: i32 = 3;
pub const MAKING_LONG_SECS: u32 = 120;
pub const MAKING_LONG_POINTS: i32 = 2;
pub const MAKING_SHORT_SECS: u32 = 45;
pub const MAKING_SHORT_PENALTY: i32 = -3;
pub const LANGUAGE_MATCH_POINTS: i32 = 6;
pub const ENGLISH_MISMATCH_PENALTY: i32 = -4;
pub const TRAILER_SPILLOVER_PENALTY: i32 = -5;
/// A candidate must score strictly above this to be returned.
pub const MIN_ACCEPTED_SCORE: i32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreWeights {
    pub title_match: i32,
    pub ending_phrase: i32,
    pub ending_long_secs: u32,
    pub ending_long: i32,
    pub ending_short_secs: u32,
    pub ending_short: i32,
    pub making_of: i32,
    pub behind_scenes: i32,
    pub interview: i32,
    pub making_long_secs: u32,
    pub making_long: i32,
    pub making_short_secs: u32,
    pub making_short: i32,
    pub language_match: i32,
    pub english_mismatch: i32,
    pub trailer_spillover: i32,
    pub min_accepted: i32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            title_match: TITLE_MATCH_POINTS,
            ending_phrase: ENDING_PHRASE_POINTS,
            ending_long_secs: ENDING_LONG_SECS,
            ending_long: ENDING_LONG_POINTS,
            ending_short_secs: ENDING_SHORT_SECS,
            ending_short: ENDING_SHORT_PENALTY,
            making_of: MAKING_OF_POINTS,
            behind_scenes: BEHIND_SCENES_POINTS,
            interview: INTERVIEW_POINTS,
            making_long_secs: MAKING_LONG_SECS,
            making_long: MAKING_LONG_POINTS,
            making_short_secs: MAKING_SHORT_SECS,
            making_short: MAKING_SHORT_PENALTY,
            language_match: LANGUAGE_MATCH_POINTS,
            english_mismatch: ENGLISH_MISMATCH_PENALTY,
            trailer_spillover: TRAILER_SPILLOVER_PENALTY,
            min_accepted: MIN_ACCEPTED_SCORE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuxCategory {
    MakingOf,
    EndingExplained,
}

type TrailerRule = fn(&VideoCandidate, &Locale) -> bool;

fn is_official_trailer(video: &VideoCandidate, locale: &Locale) -> bool {
    (video.category == VideoCategory::Trailer && video.official)
        || contains_ci(&video.title, locale.trailer_word)
}

fn is_trailer_or_teaser(video: &VideoCandidate, _locale: &Locale) -> bool {
    matches!(video.category, VideoCategory::Trailer | VideoCategory::Teaser)
}

fn any_video(_video: &VideoCandidate, _locale: &Locale) -> bool {
    true
}

/// Evaluated in order; the first rule matching any video picks its first match.
const TRAILER_RULES: [(&str, TrailerRule); 3] = [
    ("official trailer", is_official_trailer),
    ("trailer or teaser", is_trailer_or_teaser),
    ("first video", any_video),
];

#[derive(Debug, Clone)]
pub struct Selector {
    pub fallback_language: String,
    pub weights: ScoreWeights,
}

impl Default for Selector {
    fn default() -> Self {
        Self::new(DEFAULT_LANGUAGE)
    }
}

impl Selector {
    pub fn new(fallback_language: &str) -> Self {
        Self {
            fallback_language: fallback_language.to_string(),
            weights: ScoreWeights::default(),
        }
    }

    /// Best trailer in `language`, retried once in the fallback language when
    /// nothing playable turns up. A failed fetch is returned as is.
    pub async fn select_trailer(
        &self,
        tmdb: &dyn TmdbApi,
        provider_id: &str,
        kind: MediaKind,
        api_key: &str,
        language: &str,
    ) -> Result<Option<VideoReference>> {
        if let Some(found) = self
            .trailer_in_language(tmdb, provider_id, kind, api_key, language)
            .await?
        {
            return Ok(Some(found));
        }
        debug!(
            "No trailer for {} in {}, retrying in {}",
            provider_id, language, self.fallback_language
        );
        self.trailer_in_language(tmdb, provider_id, kind, api_key, &self.fallback_language)
            .await
    }

    async fn trailer_in_language(
        &self,
        tmdb: &dyn TmdbApi,
        provider_id: &str,
        kind: MediaKind,
        api_key: &str,
        language: &str,
    ) -> Result<Option<VideoReference>> {
        let videos = tmdb
            .fetch_videos(provider_id, kind, api_key, language)
            .await?;
        Ok(pick_trailer(&videos, Locale::for_tag(language)))
    }

    /// Searches for a making-of or ending-explained video and keeps the best
    /// scoring YouTube result above the acceptance floor.
    pub async fn select_auxiliary(
        &self,
        search: &dyn SearchApi,
        title: &str,
        year: &str,
        language: &str,
        api_key: &str,
        category: AuxCategory,
    ) -> Result<Option<VideoReference>> {
        let locale = Locale::for_tag(language);
        let query = build_query(title, year, locale, category);
        let hl = primary_subtag(language);
        let gl = region_subtag(language);
        let candidates = search.search_videos(&query, &hl, &gl, api_key).await?;

        let best = best_candidate(&candidates, title, locale, category, &self.weights);
        match &best {
            Some(r) => info!(
                "Picked {:?} video '{}' ({}) for '{}'",
                category,
                r.title,
                r.watch_url(),
                title
            ),
            None => debug!("No {:?} video above threshold for '{}'", category, title),
        }
        Ok(best)
    }
}

pub fn pick_trailer(videos: &[VideoCandidate], locale: &Locale) -> Option<VideoReference> {
    let playable: Vec<&VideoCandidate> = videos
        .iter()
        .filter(|v| v.site.eq_ignore_ascii_case(RECOGNIZED_SITE) && !v.key.trim().is_empty())
        .collect();

    TRAILER_RULES.iter().find_map(|(name, rule)| {
        let hit = playable.iter().copied().find(|v| rule(*v, locale))?;
        debug!("Trailer chosen by rule '{}': {}", name, hit.key);
        Some(VideoReference {
            key: hit.key.trim().to_string(),
            title: display_title(&hit.title, locale.trailer_label),
        })
    })
}

pub fn build_query(title: &str, year: &str, locale: &Locale, category: AuxCategory) -> String {
    let suffix = match category {
        AuxCategory::MakingOf => locale.phrases.making_query,
        AuxCategory::EndingExplained => locale.phrases.ending_query,
    };
    [title.trim(), year.trim(), suffix]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn score_candidate(
    candidate: &SearchCandidate,
    media_title: &str,
    locale: &Locale,
    category: AuxCategory,
    w: &ScoreWeights,
) -> i32 {
    let text = format!("{} {}", candidate.title, candidate.description).to_lowercase();
    let has_any = |phrases: &[&str]| phrases.iter().any(|p| text.contains(p));
    let duration = candidate.duration_seconds;
    let phrases = locale.phrases;
    let mut score = 0;

    let media_title = media_title.trim();
    if !media_title.is_empty() && contains_ci(&candidate.title, media_title) {
        score += w.title_match;
    }

    match category {
        AuxCategory::EndingExplained => {
            if has_any(phrases.ending_explained) {
                score += w.ending_phrase;
            }
            if duration >= w.ending_long_secs {
                score += w.ending_long;
            }
            if duration < w.ending_short_secs {
                score += w.ending_short;
            }
        }
        AuxCategory::MakingOf => {
            if has_any(phrases.making_of) {
                score += w.making_of;
            }
            if has_any(phrases.behind_scenes) {
                score += w.behind_scenes;
            }
            if has_any(phrases.interview) {
                score += w.interview;
            }
            if duration >= w.making_long_secs {
                score += w.making_long;
            }
            if duration < w.making_short_secs {
                score += w.making_short;
            }
        }
    }

    if has_any(locale.language_words) {
        score += w.language_match;
    }
    if !locale.is_english() && text.contains("english") {
        score += w.english_mismatch;
    }
    if text.contains("trailer") {
        score += w.trailer_spillover;
    }
    score
}

/// Highest score wins, earliest candidate on ties. Non-YouTube results never count.
pub fn best_candidate(
    candidates: &[SearchCandidate],
    media_title: &str,
    locale: &Locale,
    category: AuxCategory,
    weights: &ScoreWeights,
) -> Option<VideoReference> {
    let mut best: Option<(i32, VideoReference)> = None;
    for candidate in candidates.iter().take(MAX_SEARCH_RESULTS) {
        let Some(key) = youtube_key(&candidate.link) else {
            continue;
        };
        let score = score_candidate(candidate, media_title, locale, category, weights);
        if best.as_ref().map_or(true, |(top, _)| score > *top) {
            let reference = VideoReference {
                key,
                title: sanitize_title(&candidate.title),
            };
            best = Some((score, reference));
        }
    }
    best.filter(|(score, _)| *score > weights.min_accepted)
        .map(|(_, reference)| reference)
}

/// Drops `[...]` annotations and tidies whitespace.
pub fn sanitize_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut depth = 0usize;
    for ch in title.chars() {
        match ch {
            '[' => depth += 1,
            ']' if depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn display_title(raw: &str, fallback: &str) -> String {
    let cleaned = sanitize_title(raw);
    if cleaned.is_empty() {
        fallback.to_string()
    } else {
        cleaned
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
