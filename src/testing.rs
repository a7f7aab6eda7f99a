//! In-process stand-in for the Spotify token and search endpoints.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::spotify::SpotifyClient;

/// What the mock saw on its most recent requests.
#[derive(Debug, Default)]
pub struct Seen {
    pub token_auth: Option<String>,
    pub token_content_type: Option<String>,
    pub token_body: Option<String>,
    pub search_auth: Option<String>,
    pub search_q: Option<String>,
    pub search_type: Option<String>,
    pub search_limit: Option<String>,
}

#[derive(Clone)]
struct MockState {
    items: Arc<Vec<Value>>,
    token_hits: Arc<AtomicUsize>,
    search_hits: Arc<AtomicUsize>,
    reject_token: Arc<AtomicBool>,
    fail_search: Arc<AtomicBool>,
    seen: Arc<Mutex<Seen>>,
}

pub struct MockSpotify {
    pub base_url: String,
    pub token_hits: Arc<AtomicUsize>,
    pub search_hits: Arc<AtomicUsize>,
    pub seen: Arc<Mutex<Seen>>,
    reject_token: Arc<AtomicBool>,
    fail_search: Arc<AtomicBool>,
}

impl MockSpotify {
    /// Serve `items` from every search, ignoring the requested limit.
    pub async fn start(items: Vec<Value>) -> Self {
        let state = MockState {
            items: Arc::new(items),
            token_hits: Arc::default(),
            search_hits: Arc::default(),
            reject_token: Arc::default(),
            fail_search: Arc::default(),
            seen: Arc::default(),
        };

        let app = Router::new()
            .route("/api/token", post(token))
            .route("/v1/search", get(search))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            token_hits: state.token_hits,
            search_hits: state.search_hits,
            seen: state.seen,
            reject_token: state.reject_token,
            fail_search: state.fail_search,
        }
    }

    pub fn client(&self, client_id: &str, client_secret: &str) -> SpotifyClient {
        SpotifyClient::new(client_id.into(), client_secret.into()).with_endpoints(
            format!("{}/api/token", self.base_url),
            format!("{}/v1", self.base_url),
        )
    }

    pub fn reject_token(&self) {
        self.reject_token.store(true, Ordering::SeqCst);
    }

    pub fn fail_search(&self) {
        self.fail_search.store(true, Ordering::SeqCst);
    }
}

/// A search item shaped like the Spotify track object.
pub fn track_json(id: &str, name: &str, popularity: u8) -> Value {
    json!({
        "id": id,
        "name": name,
        "uri": format!("spotify:track:{id}"),
        "artists": [{ "id": format!("artist-{id}"), "name": format!("Artist {id}") }],
        "album": {
            "id": format!("album-{id}"),
            "name": format!("Album {id}"),
            "images": [{ "url": format!("https://img.example/{id}.jpg"), "width": 640, "height": 640 }],
        },
        "popularity": popularity,
        "external_urls": { "spotify": format!("https://open.spotify.com/track/{id}") },
        "preview_url": null,
    })
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn token(State(state): State<MockState>, headers: HeaderMap, body: String) -> Response {
    state.token_hits.fetch_add(1, Ordering::SeqCst);
    {
        let mut seen = state.seen.lock().unwrap();
        seen.token_auth = header(&headers, "authorization");
        seen.token_content_type = header(&headers, "content-type");
        seen.token_body = Some(body);
    }

    if state.reject_token.load(Ordering::SeqCst) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_client" })),
        )
            .into_response();
    }

    Json(json!({
        "access_token": "mock-token",
        "token_type": "Bearer",
        "expires_in": 3600,
    }))
    .into_response()
}

async fn search(
    State(state): State<MockState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.search_hits.fetch_add(1, Ordering::SeqCst);
    {
        let mut seen = state.seen.lock().unwrap();
        seen.search_auth = header(&headers, "authorization");
        seen.search_q = params.get("q").cloned();
        seen.search_type = params.get("type").cloned();
        seen.search_limit = params.get("limit").cloned();
    }

    if state.fail_search.load(Ordering::SeqCst) {
        return (StatusCode::SERVICE_UNAVAILABLE, "upstream unavailable").into_response();
    }

    Json(json!({ "tracks": { "items": &*state.items } })).into_response()
}
