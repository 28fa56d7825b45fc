use crate::config::{AppConfig, EffectiveSettings, UserSettings};
use crate::locale::Locale;
use crate::manifest::{build_manifest, CONFIGURE_PAGE};
use crate::models::{MediaKind, MediaRequest, ResolvedMedia, StreamResponse, StreamResult};
use crate::resolver;
use crate::search::{SearchApi, SerpApiClient};
use crate::selector::{AuxCategory, Selector};
use crate::tmdb::{build_http_client, TmdbApi, TmdbClient, TMDB_BASE};
use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::Method,
    response::Html,
    routing::get,
    Json, Router,
};
use serde_json::Value;
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub tmdb: Arc<dyn TmdbApi>,
    pub search: Arc<dyn SearchApi>,
    pub config: Arc<AppConfig>,
    pub selector: Arc<Selector>,
}

impl AppState {
    pub fn new(config: AppConfig, tmdb: Arc<dyn TmdbApi>, search: Arc<dyn SearchApi>) -> Self {
        let selector = Selector::new(&config.fallback_language);
        Self {
            tmdb,
            search,
            config: Arc::new(config),
            selector: Arc::new(selector),
        }
    }
}

pub async fn run_server(config: AppConfig) -> Result<()> {
    let http = build_http_client()?;
    let tmdb: Arc<dyn TmdbApi> = Arc::new(TmdbClient::with_client(http.clone(), TMDB_BASE));
    let search: Arc<dyn SearchApi> = Arc::new(SerpApiClient::new(http));
    info!(
        "Default language {}, fallback {}, SerpAPI {}",
        config.language,
        config.fallback_language,
        if config.serp_api_key.is_some() { "enabled" } else { "per-user only" }
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = build_router(AppState::new(config, tmdb, search));

    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/configure", get(configure))
        .route("/manifest.json", get(manifest))
        .route("/:config/manifest.json", get(configured_manifest))
        .route("/:config/configure", get(configure))
        .route("/stream/:kind/:id", get(stream))
        .route("/:config/stream/:kind/:id", get(configured_stream))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn configure() -> Html<&'static str> {
    Html(CONFIGURE_PAGE)
}

async fn manifest(query: Option<Query<UserSettings>>) -> Json<Value> {
    let user = query.map(|Query(q)| q).unwrap_or_default();
    Json(manifest_for(&user))
}

async fn configured_manifest(
    Path(config): Path<String>,
    query: Option<Query<UserSettings>>,
) -> Json<Value> {
    let user = path_settings(&config).or(query.map(|Query(q)| q).unwrap_or_default());
    Json(manifest_for(&user))
}

// Only a key supplied by the caller marks the install as configured.
fn manifest_for(user: &UserSettings) -> Value {
    build_manifest(user.tmdb_key().is_none())
}

async fn stream(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    query: Option<Query<UserSettings>>,
) -> Json<StreamResponse> {
    let user = query.map(|Query(q)| q).unwrap_or_default();
    Json(handle_stream(&state, &kind, &id, &user).await)
}

async fn configured_stream(
    State(state): State<AppState>,
    Path((config, kind, id)): Path<(String, String, String)>,
    query: Option<Query<UserSettings>>,
) -> Json<StreamResponse> {
    let user = path_settings(&config).or(query.map(|Query(q)| q).unwrap_or_default());
    Json(handle_stream(&state, &kind, &id, &user).await)
}

fn path_settings(segment: &str) -> UserSettings {
    match UserSettings::from_path_segment(segment) {
        Ok(settings) => settings,
        Err(e) => {
            warn!("Ignoring unreadable config segment: {:#}", e);
            UserSettings::default()
        }
    }
}

/// Every failure ends up as an empty stream list; details only go to the log.
async fn handle_stream(
    state: &AppState,
    kind: &str,
    id: &str,
    user: &UserSettings,
) -> StreamResponse {
    let id = id.strip_suffix(".json").unwrap_or(id);
    info!("Stream request: {} {}", kind, id);

    let kind = match kind.parse::<MediaKind>() {
        Ok(k) => k,
        Err(_) => {
            debug!("Unsupported kind '{}'", kind);
            return StreamResponse::default();
        }
    };
    let settings = state.config.effective(user);
    let request = MediaRequest::new(id, kind, Some(settings.language.as_str()));

    match collect_streams(state, &request, &settings).await {
        Ok(streams) => {
            info!("Returning {} stream(s) for {}", streams.len(), request.external_id);
            StreamResponse { streams }
        }
        Err(e) => {
            warn!("Stream lookup failed for {}: {:#}", request.external_id, e);
            StreamResponse::default()
        }
    }
}

pub async fn collect_streams(
    state: &AppState,
    request: &MediaRequest,
    settings: &EffectiveSettings,
) -> Result<Vec<StreamResult>> {
    let Some(tmdb_key) = settings.tmdb_key.as_deref() else {
        warn!("No TMDb key available for request, returning nothing");
        return Ok(Vec::new());
    };

    let Some(media) = resolver::resolve(
        state.tmdb.as_ref(),
        &request.external_id,
        request.kind,
        tmdb_key,
        &request.language,
    )
    .await?
    else {
        info!("No TMDb match for {}", request.external_id);
        return Ok(Vec::new());
    };
    debug!(
        provider_id = %media.provider_id,
        title = %media.display_title,
        year = %media.year,
        "Resolved media"
    );

    let locale = Locale::for_tag(&request.language);
    let mut streams = Vec::new();

    let trailer = state
        .selector
        .select_trailer(
            state.tmdb.as_ref(),
            &media.provider_id,
            request.kind,
            tmdb_key,
            &request.language,
        )
        .await?;
    if let Some(reference) = trailer {
        streams.push(StreamResult {
            label: format_label(locale.trailer_label, &media, &reference.title),
            reference,
        });
    }

    // Auxiliary searches need a title to search for.
    let serp_key = settings
        .serp_key
        .as_deref()
        .filter(|_| !media.display_title.is_empty());
    if let Some(serp_key) = serp_key {
        let (making, ending) = tokio::try_join!(
            state.selector.select_auxiliary(
                state.search.as_ref(),
                &media.display_title,
                &media.year,
                &request.language,
                serp_key,
                AuxCategory::MakingOf,
            ),
            state.selector.select_auxiliary(
                state.search.as_ref(),
                &media.display_title,
                &media.year,
                &request.language,
                serp_key,
                AuxCategory::EndingExplained,
            ),
        )?;
        for (prefix, found) in [(locale.making_label, making), (locale.ending_label, ending)] {
            if let Some(reference) = found {
                streams.push(StreamResult {
                    label: format_label(prefix, &media, &reference.title),
                    reference,
                });
            }
        }
    }

    Ok(streams)
}

/// `Prefix: Title (Year)`, or `Prefix: video title` when the media title is unknown.
pub fn format_label(prefix: &str, media: &ResolvedMedia, video_title: &str) -> String {
    if media.display_title.is_empty() {
        return format!("{}: {}", prefix, video_title);
    }
    if media.year.is_empty() {
        format!("{}: {}", prefix, media.display_title)
    } else {
        format!("{}: {} ({})", prefix, media.display_title, media.year)
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media(title: &str, year: &str) -> ResolvedMedia {
        ResolvedMedia {
            provider_id: "1".to_string(),
            display_title: title.to_string(),
            year: year.to_string(),
        }
    }

    #[test]
    fn labels_use_media_title_and_year() {
        assert_eq!(
            format_label("Trailer", &media("Heat", "1995"), "Official Trailer"),
            "Trailer: Heat (1995)"
        );
        assert_eq!(
            format_label("Tráiler", &media("Heat", ""), "x"),
            "Tráiler: Heat"
        );
        assert_eq!(
            format_label("Trailer", &media("", ""), "Official Trailer"),
            "Trailer: Official Trailer"
        );
    }
}
