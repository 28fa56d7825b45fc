use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;
use trailio::app::{build_router, AppState};
use trailio::config::AppConfig;
use trailio::models::{MediaKind, ResolvedMedia, SearchCandidate, VideoCandidate, VideoCategory};
use trailio::search::SearchApi;
use trailio::tmdb::TmdbApi;

#[derive(Default)]
struct FakeTmdb {
    known: HashMap<String, ResolvedMedia>,
    videos: HashMap<String, Vec<VideoCandidate>>,
    fail_videos: bool,
    lookups: Mutex<Vec<String>>,
    video_fetches: Mutex<Vec<(String, String)>>,
}

#[async_trait::async_trait]
impl TmdbApi for FakeTmdb {
    async fn find_by_imdb(
        &self,
        imdb_id: &str,
        _kind: MediaKind,
        _api_key: &str,
        _language: &str,
    ) -> anyhow::Result<Option<ResolvedMedia>> {
        self.lookups.lock().unwrap().push(imdb_id.to_string());
        Ok(self.known.get(imdb_id).cloned())
    }

    async fn fetch_videos(
        &self,
        provider_id: &str,
        _kind: MediaKind,
        _api_key: &str,
        language: &str,
    ) -> anyhow::Result<Vec<VideoCandidate>> {
        self.video_fetches
            .lock()
            .unwrap()
            .push((provider_id.to_string(), language.to_string()));
        if self.fail_videos {
            anyhow::bail!("TMDb returned 500");
        }
        Ok(self.videos.get(language).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
struct FakeSearch {
    making: Vec<SearchCandidate>,
    ending: Vec<SearchCandidate>,
    fail: bool,
    queries: Mutex<Vec<(String, String, String)>>,
}

#[async_trait::async_trait]
impl SearchApi for FakeSearch {
    async fn search_videos(
        &self,
        query: &str,
        hl: &str,
        gl: &str,
        _api_key: &str,
    ) -> anyhow::Result<Vec<SearchCandidate>> {
        self.queries
            .lock()
            .unwrap()
            .push((query.to_string(), hl.to_string(), gl.to_string()));
        if self.fail {
            anyhow::bail!("SerpAPI quota exceeded");
        }
        if query.contains("ending explained") || query.contains("final explicado") {
            Ok(self.ending.clone())
        } else {
            Ok(self.making.clone())
        }
    }
}

fn shawshank() -> ResolvedMedia {
    ResolvedMedia {
        provider_id: "278".to_string(),
        display_title: "The Shawshank Redemption".to_string(),
        year: "1994".to_string(),
    }
}

fn official_trailer(key: &str, title: &str) -> VideoCandidate {
    VideoCandidate {
        site: "YouTube".to_string(),
        category: VideoCategory::Trailer,
        key: key.to_string(),
        title: title.to_string(),
        official: true,
    }
}

fn yt_result(title: &str, key: &str, secs: u32) -> SearchCandidate {
    SearchCandidate {
        title: title.to_string(),
        link: format!("https://www.youtube.com/watch?v={}", key),
        description: String::new(),
        duration_seconds: secs,
    }
}

fn tmdb_with_shawshank() -> FakeTmdb {
    FakeTmdb {
        known: HashMap::from([("tt0111161".to_string(), shawshank())]),
        videos: HashMap::from([(
            "en-US".to_string(),
            vec![official_trailer("6hB3S9bIaco", "Official Trailer [HD]")],
        )]),
        ..FakeTmdb::default()
    }
}

fn server_config(tmdb_key: Option<&str>, language: &str) -> AppConfig {
    AppConfig {
        tmdb_api_key: tmdb_key.map(str::to_string),
        language: language.to_string(),
        ..AppConfig::default()
    }
}

fn app(config: AppConfig, tmdb: FakeTmdb, search: FakeSearch) -> (Router, Arc<FakeTmdb>, Arc<FakeSearch>) {
    let tmdb = Arc::new(tmdb);
    let search = Arc::new(search);
    let state = AppState::new(config, tmdb.clone(), search.clone());
    (build_router(state), tmdb, search)
}

async fn get_json(app: Router, uri: &str) -> serde_json::Value {
    let res = app
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn streams(body: &serde_json::Value) -> Vec<serde_json::Value> {
    body["streams"].as_array().cloned().expect("streams array")
}

#[tokio::test]
async fn resolves_imdb_id_and_returns_trailer() {
    let (app, tmdb, _) = app(
        server_config(Some("server-key"), "en-US"),
        tmdb_with_shawshank(),
        FakeSearch::default(),
    );

    let body = get_json(app, "/stream/movie/tt0111161:1:1.json").await;
    let streams = streams(&body);
    assert_eq!(streams.len(), 1);
    let title = streams[0]["title"].as_str().unwrap();
    assert!(title.contains("Shawshank Redemption (1994)"), "label was {title}");
    assert_eq!(streams[0]["ytId"], "6hB3S9bIaco");
    assert_eq!(*tmdb.lookups.lock().unwrap(), vec!["tt0111161".to_string()]);
}

#[tokio::test]
async fn unknown_id_yields_empty_streams() {
    let (app, tmdb, _) = app(
        server_config(Some("server-key"), "en-US"),
        tmdb_with_shawshank(),
        FakeSearch::default(),
    );

    let body = get_json(app, "/stream/movie/tt9999999.json").await;
    assert!(streams(&body).is_empty());
    assert!(tmdb.video_fetches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn falls_back_to_english_when_preferred_language_has_nothing() {
    let (app, tmdb, _) = app(
        server_config(Some("server-key"), "es-ES"),
        tmdb_with_shawshank(),
        FakeSearch::default(),
    );

    let body = get_json(app, "/stream/movie/tt0111161.json").await;
    let streams = streams(&body);
    assert_eq!(streams.len(), 1);
    assert_eq!(
        streams[0]["title"],
        "Tráiler: The Shawshank Redemption (1994)"
    );
    let fetches = tmdb.video_fetches.lock().unwrap();
    assert_eq!(
        *fetches,
        vec![
            ("278".to_string(), "es-ES".to_string()),
            ("278".to_string(), "en-US".to_string())
        ]
    );
}

#[tokio::test]
async fn fallback_is_attempted_exactly_once() {
    let tmdb = FakeTmdb {
        videos: HashMap::new(),
        ..tmdb_with_shawshank()
    };
    let (app, tmdb, _) = app(server_config(Some("k"), "fr-FR"), tmdb, FakeSearch::default());

    let body = get_json(app, "/stream/movie/tt0111161.json").await;
    assert!(streams(&body).is_empty());
    assert_eq!(tmdb.video_fetches.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn hard_failure_skips_fallback_and_returns_empty() {
    let tmdb = FakeTmdb {
        fail_videos: true,
        ..tmdb_with_shawshank()
    };
    let (app, tmdb, _) = app(server_config(Some("k"), "es-ES"), tmdb, FakeSearch::default());

    let body = get_json(app, "/stream/movie/tt0111161.json").await;
    assert!(streams(&body).is_empty());
    assert_eq!(tmdb.video_fetches.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn native_ids_skip_the_lookup() {
    let (app, tmdb, _) = app(
        server_config(Some("k"), "en-US"),
        tmdb_with_shawshank(),
        FakeSearch::default(),
    );

    let body = get_json(app, "/stream/movie/tmdb:278.json").await;
    let streams = streams(&body);
    assert_eq!(streams.len(), 1);
    assert_eq!(streams[0]["title"], "Trailer: Official Trailer");
    assert!(tmdb.lookups.lock().unwrap().is_empty());
    assert_eq!(tmdb.video_fetches.lock().unwrap()[0].0, "278");
}

#[tokio::test]
async fn auxiliary_categories_need_a_search_key() {
    let search = FakeSearch {
        ending: vec![yt_result("The Shawshank Redemption ending explained", "end", 600)],
        ..FakeSearch::default()
    };
    let (app, _, search) = app(server_config(Some("k"), "en-US"), tmdb_with_shawshank(), search);

    let body = get_json(app, "/stream/movie/tt0111161.json").await;
    assert_eq!(streams(&body).len(), 1);
    assert!(search.queries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn search_key_adds_making_of_and_ending_streams_in_order() {
    let search = FakeSearch {
        making: vec![
            yt_result("The Shawshank Redemption - Official Trailer", "tr", 150),
            yt_result("The Shawshank Redemption: Making of [Documentary]", "mk", 1500),
        ],
        ending: vec![yt_result("The Shawshank Redemption ending explained", "end", 600)],
        ..FakeSearch::default()
    };
    let (app, _, search) = app(server_config(Some("k"), "en-US"), tmdb_with_shawshank(), search);

    let body = get_json(app, "/stream/movie/tt0111161.json?serp_key=serp").await;
    let streams = streams(&body);
    let ids: Vec<_> = streams.iter().map(|s| s["ytId"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["6hB3S9bIaco", "mk", "end"]);
    assert_eq!(
        streams[1]["title"],
        "Making of: The Shawshank Redemption (1994)"
    );
    assert_eq!(
        streams[2]["title"],
        "Ending explained: The Shawshank Redemption (1994)"
    );

    let queries = search.queries.lock().unwrap();
    assert_eq!(queries.len(), 2);
    assert!(queries.iter().any(|(q, hl, gl)| q
        == "The Shawshank Redemption 1994 ending explained"
        && hl == "en"
        && gl == "us"));
}

#[tokio::test]
async fn low_scoring_search_results_are_dropped() {
    let search = FakeSearch {
        making: vec![yt_result("Unrelated video", "x", 300)],
        ending: vec![yt_result("Shawshank trailer", "y", 30)],
        ..FakeSearch::default()
    };
    let (app, _, _) = app(server_config(Some("k"), "en-US"), tmdb_with_shawshank(), search);

    let body = get_json(app, "/stream/movie/tt0111161.json?serp_key=serp").await;
    assert_eq!(streams(&body).len(), 1);
}

#[tokio::test]
async fn search_failure_collapses_to_empty() {
    let search = FakeSearch {
        fail: true,
        ..FakeSearch::default()
    };
    let (app, _, _) = app(server_config(Some("k"), "en-US"), tmdb_with_shawshank(), search);

    let body = get_json(app, "/stream/movie/tt0111161.json?serp_key=serp").await;
    assert!(streams(&body).is_empty());
}

#[tokio::test]
async fn configured_path_supplies_key_and_language() {
    let segment = urlencoding::encode(r#"{"tmdb_key":"user-key","lang":"es-ES"}"#).into_owned();
    let (app, tmdb, _) = app(server_config(None, "en-US"), tmdb_with_shawshank(), FakeSearch::default());

    let uri = format!("/{}/stream/movie/tt0111161.json", segment);
    let body = get_json(app, &uri).await;
    assert_eq!(streams(&body).len(), 1);
    assert_eq!(tmdb.video_fetches.lock().unwrap()[0].1, "es-ES");
}

#[tokio::test]
async fn missing_key_everywhere_yields_empty() {
    let (app, tmdb, _) = app(server_config(None, "en-US"), tmdb_with_shawshank(), FakeSearch::default());

    let body = get_json(app, "/stream/movie/tt0111161.json").await;
    assert!(streams(&body).is_empty());
    assert!(tmdb.lookups.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unsupported_kind_yields_empty() {
    let (app, tmdb, _) = app(server_config(Some("k"), "en-US"), tmdb_with_shawshank(), FakeSearch::default());

    let body = get_json(app, "/stream/channel/tt0111161.json").await;
    assert!(streams(&body).is_empty());
    assert!(tmdb.lookups.lock().unwrap().is_empty());
}

#[tokio::test]
async fn manifest_reports_whether_configuration_is_needed() {
    let (app, _, _) = app(server_config(None, "en-US"), FakeTmdb::default(), FakeSearch::default());
    let body = get_json(app.clone(), "/manifest.json").await;
    assert_eq!(body["behaviorHints"]["configurationRequired"], true);
    assert_eq!(body["types"], serde_json::json!(["movie", "series"]));

    let body = get_json(app, "/manifest.json?tmdb_key=abc").await;
    assert_eq!(body["behaviorHints"]["configurationRequired"], false);
}

#[tokio::test]
async fn server_key_alone_still_asks_for_configuration() {
    let (app, _, _) = app(server_config(Some("server-key"), "en-US"), FakeTmdb::default(), FakeSearch::default());
    let body = get_json(app.clone(), "/manifest.json").await;
    assert_eq!(body["behaviorHints"]["configurationRequired"], true);

    let segment = urlencoding::encode(r#"{"tmdb_key":"user-key"}"#).into_owned();
    let body = get_json(app, &format!("/{}/manifest.json", segment)).await;
    assert_eq!(body["behaviorHints"]["configurationRequired"], false);
}
