use anyhow::Result;
use tracing::debug;

use crate::models::{MediaKind, ResolvedMedia};
use crate::tmdb::TmdbApi;

pub const NATIVE_PREFIX: &str = "tmdb:";

/// Drops a trailing `:season:episode` suffix; the native prefix is preserved.
pub fn strip_episode_suffix(external_id: &str) -> &str {
    let trimmed = external_id.trim();
    match trimmed.strip_prefix(NATIVE_PREFIX) {
        Some(rest) => {
            let bare = rest.split(':').next().unwrap_or(rest);
            &trimmed[..NATIVE_PREFIX.len() + bare.len()]
        }
        None => trimmed.split(':').next().unwrap_or(trimmed),
    }
}

/// Provider id carried directly by a `tmdb:` id.
pub fn native_provider_id(external_id: &str) -> Option<&str> {
    strip_episode_suffix(external_id)
        .strip_prefix(NATIVE_PREFIX)
        .filter(|id| !id.is_empty())
}

/// Maps an external id onto a TMDb id plus display metadata.
///
/// `Ok(None)` means the id has no match; lookup failures surface as `Err`.
/// Native `tmdb:` ids never hit the network and carry no title or year.
pub async fn resolve(
    tmdb: &dyn TmdbApi,
    external_id: &str,
    kind: MediaKind,
    api_key: &str,
    language: &str,
) -> Result<Option<ResolvedMedia>> {
    let bare = strip_episode_suffix(external_id);
    if bare.starts_with(NATIVE_PREFIX) {
        return Ok(native_provider_id(bare).map(|id| ResolvedMedia {
            provider_id: id.to_string(),
            display_title: String::new(),
            year: String::new(),
        }));
    }
    if bare.is_empty() {
        return Ok(None);
    }

    debug!(external_id = %bare, kind = ?kind, "Looking up TMDb cross-reference");
    tmdb.find_by_imdb(bare, kind, api_key, language).await
}
