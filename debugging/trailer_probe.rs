//! Resolve an id and print the streams the addon would return.
//! Usage:
//!   cargo run --bin trailer_probe -- movie tt0111161
//!   cargo run --bin trailer_probe -- series tt0903747:1:1 es-ES
//! Requires TMDB_API_KEY in the environment (.env supported); SERPAPI_KEY is optional.

use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::Arc;
use trailio::app::{collect_streams, AppState};
use tracing_subscriber::EnvFilter;
use trailio::config::{report_dotenv, AppConfig, UserSettings};
use trailio::models::{MediaKind, MediaRequest, StreamResponse};
use trailio::search::SerpApiClient;
use trailio::tmdb::{build_http_client, TmdbClient};

#[tokio::main]
async fn main() -> Result<()> {
    let loaded = dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .compact()
        .init();
    report_dotenv(loaded);
    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() < 2 {
        bail!("usage: trailer_probe <movie|series> <id> [language]");
    }
    let kind: MediaKind = args[0].parse()?;
    let config = AppConfig::from_env()?;
    let user = UserSettings {
        lang: args.get(2).cloned(),
        ..UserSettings::default()
    };
    let settings = config.effective(&user);
    if settings.tmdb_key.is_none() {
        bail!("TMDB_API_KEY must be set");
    }

    let state = AppState::new(
        config,
        Arc::new(TmdbClient::new()?),
        Arc::new(SerpApiClient::new(build_http_client()?)),
    );
    let request = MediaRequest::new(args[1].as_str(), kind, Some(settings.language.as_str()));
    let streams = collect_streams(&state, &request, &settings).await?;

    let out = serde_json::to_string_pretty(&StreamResponse { streams })
        .context("failed to serialize streams")?;
    println!("{out}");
    Ok(())
}
