use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::mood::{Mood, GUIDANCE};
use crate::session::SessionError;
use crate::spotify::SpotifyError;

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    Spotify(String),
    UnrecognizedMood,
    EmptyResultSet(String),
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl From<SpotifyError> for AppError {
    fn from(err: SpotifyError) -> Self {
        AppError::Spotify(err.to_string())
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::EmptyResultSet | SessionError::NoResults => {
                AppError::EmptyResultSet(err.to_string())
            }
            SessionError::TrackNotInResults(_) => AppError::NotFound(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::UnrecognizedMood = self {
            let examples: Vec<&str> = Mood::ALL.iter().flat_map(|m| m.keywords()).copied().collect();
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": GUIDANCE, "examples": examples })),
            )
                .into_response();
        }

        let (status, message) = match self {
            AppError::Spotify(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::EmptyResultSet(msg) => (StatusCode::CONFLICT, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::UnrecognizedMood => (StatusCode::UNPROCESSABLE_ENTITY, GUIDANCE.to_string()),
        };
        (
            status,
            Json(json!({ "error": message })),
        )
            .into_response()
    }
}
