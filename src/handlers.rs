//! HTTP handlers for the mood recommender API.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::AppError;
use crate::export::{favorites_to_csv, CSV_FILE_NAME};
use crate::mood::{self, Genre, Mood};
use crate::session::{pick_random, ResultSet, Session, SessionError, SessionStore};
use crate::spotify::{SpotifyClient, Track};

/// Shared router state.
#[derive(Clone)]
pub struct AppState {
    pub spotify: SpotifyClient,
    pub sessions: SessionStore,
    pub search_limit: u32,
}

/// Body of a recommendation request.
#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    /// Free-text mood description.
    pub text: String,
    /// Optional genre filter, blank means none.
    #[serde(default)]
    pub genre: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub query: String,
    pub mood: Mood,
    pub genre: Option<Genre>,
    pub tracks: Vec<TrackView>,
}

/// Single track as rendered on a result card.
#[derive(Debug, Serialize)]
pub struct TrackView {
    pub id: String,
    pub name: String,
    pub uri: String,
    pub artist: Option<String>,
    pub album: String,
    pub image_url: Option<String>,
    pub popularity: u8,
    pub spotify_url: Option<String>,
    pub preview_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FavoriteRequest {
    pub track_id: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub total: usize,
    pub tracks: Vec<HistoryItem>,
}

#[derive(Debug, Serialize)]
pub struct HistoryItem {
    pub id: String,
    pub name: String,
    pub artist: Option<String>,
    pub spotify_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MoodInfo {
    pub mood: Mood,
    pub keywords: &'static [&'static str],
    pub example: &'static str,
}

fn track_to_view(t: &Track) -> TrackView {
    TrackView {
        id: t.id.clone(),
        name: t.name.clone(),
        uri: t.uri.clone(),
        artist: t.primary_artist().map(str::to_string),
        album: t.album.name.clone(),
        image_url: t.image_url().map(str::to_string),
        popularity: t.popularity,
        spotify_url: t.spotify_url().map(str::to_string),
        preview_url: t.preview_url.clone(),
    }
}

fn track_to_history_item(t: &Track) -> HistoryItem {
    HistoryItem {
        id: t.id.clone(),
        name: t.name.clone(),
        artist: t.primary_artist().map(str::to_string),
        spotify_url: t.spotify_url().map(str::to_string),
    }
}

async fn session(state: &AppState, id: &str) -> Result<Arc<Mutex<Session>>, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("unknown session '{}'", id)))
}

/// GET /health - Health check.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let sessions = state.sessions.len().await;
    Json(serde_json::json!({ "status": "ok", "sessions": sessions }))
}

/// GET /api/v1/moods - Mood keywords, examples and the genre list.
pub async fn moods() -> impl IntoResponse {
    let moods: Vec<MoodInfo> = Mood::ALL
        .into_iter()
        .map(|mood| MoodInfo {
            mood,
            keywords: mood.keywords(),
            example: mood.example(),
        })
        .collect();
    Json(serde_json::json!({ "moods": moods, "genres": Genre::ALL }))
}

/// POST /api/v1/sessions - Start a session.
pub async fn create_session(State(state): State<AppState>) -> impl IntoResponse {
    let id = state.sessions.create().await;
    (StatusCode::CREATED, Json(serde_json::json!({ "session_id": id })))
}

/// DELETE /api/v1/sessions/:id - End a session and drop its state.
pub async fn end_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(&id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("unknown session '{}'", id)))
    }
}

/// POST /api/v1/sessions/:id/recommend - Classify the text and search for tracks.
pub async fn recommend(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<RecommendRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = session(&state, &id).await?;

    if body.text.trim().is_empty() {
        return Err(AppError::BadRequest("'text' is required and cannot be empty".into()));
    }
    let genre = Genre::parse(body.genre.as_deref().unwrap_or_default())
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let Some(mood) = mood::classify(&body.text) else {
        tracing::debug!(session = %id, "no mood keyword in input");
        return Err(AppError::UnrecognizedMood);
    };

    let query = mood::build_query(mood, genre);
    let tracks = state.spotify.search_tracks(&query, state.search_limit).await?;

    let response = RecommendResponse {
        query: query.clone(),
        mood,
        genre,
        tracks: tracks.iter().map(track_to_view).collect(),
    };

    session.lock().await.record_results(ResultSet {
        query,
        mood,
        genre,
        tracks,
    });

    Ok((StatusCode::OK, Json(response)))
}

/// GET /api/v1/sessions/:id/results - The last recommendation, for re-rendering.
pub async fn last_results(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let session = session(&state, &id).await?;
    let guard = session.lock().await;
    let results = guard.last_results().ok_or(SessionError::NoResults)?;

    Ok(Json(RecommendResponse {
        query: results.query.clone(),
        mood: results.mood,
        genre: results.genre,
        tracks: results.tracks.iter().map(track_to_view).collect(),
    }))
}

/// POST /api/v1/sessions/:id/surprise - Random pick from the last results.
pub async fn surprise(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let session = session(&state, &id).await?;
    let guard = session.lock().await;
    let tracks = guard.last_results().map(|r| r.tracks.as_slice()).unwrap_or_default();
    let track = pick_random(tracks, &mut rand::rng())?;
    Ok(Json(track_to_view(track)))
}

/// POST /api/v1/sessions/:id/favorites - Save a track from the last results.
pub async fn add_favorite(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<FavoriteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = session(&state, &id).await?;
    let entry = session.lock().await.favorite_from_results(&body.track_id)?;
    tracing::info!(session = %id, track = %entry.track_name, "saved favorite");
    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET /api/v1/sessions/:id/favorites - Saved favorites in insertion order.
pub async fn list_favorites(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let session = session(&state, &id).await?;
    let favorites = session.lock().await.favorites().to_vec();
    Ok(Json(favorites))
}

/// GET /api/v1/sessions/:id/favorites.csv - Favorites as a CSV download.
pub async fn favorites_csv(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let session = session(&state, &id).await?;
    let csv = favorites_to_csv(session.lock().await.favorites());

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/csv")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", CSV_FILE_NAME),
        )
        .body(csv.into())
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// GET /api/v1/sessions/:id/history - Recently shown tracks, newest first.
pub async fn history(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<HistoryQuery>,
) -> Result<impl IntoResponse, AppError> {
    let session = session(&state, &id).await?;
    let guard = session.lock().await;
    let limit = params.limit.unwrap_or(10);

    Ok(Json(HistoryResponse {
        total: guard.history_len(),
        tracks: guard
            .recent_history(limit)
            .into_iter()
            .map(track_to_history_item)
            .collect(),
    }))
}

/// Build the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/moods", get(moods))
        .route("/api/v1/sessions", post(create_session))
        .route("/api/v1/sessions/:id", delete(end_session))
        .route("/api/v1/sessions/:id/recommend", post(recommend))
        .route("/api/v1/sessions/:id/results", get(last_results))
        .route("/api/v1/sessions/:id/surprise", post(surprise))
        .route(
            "/api/v1/sessions/:id/favorites",
            post(add_favorite).get(list_favorites),
        )
        .route("/api/v1/sessions/:id/favorites.csv", get(favorites_csv))
        .route("/api/v1/sessions/:id/history", get(history))
}
