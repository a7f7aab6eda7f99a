//! Per-session listening state: history, favorites and the last result set.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rand::distr::Alphanumeric;
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use crate::mood::{Genre, Mood};
use crate::spotify::Track;

const SESSION_ID_LEN: usize = 32;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no tracks to pick from")]
    EmptyResultSet,
    #[error("no recommendations yet, search for a mood first")]
    NoResults,
    #[error("track '{0}' is not in the current recommendations")]
    TrackNotInResults(String),
}

/// A saved track together with the mood and genre it was found under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FavoriteEntry {
    pub track_name: String,
    pub artist: String,
    pub spotify_url: String,
    pub album: String,
    pub mood: String,
    pub genre: String,
}

impl FavoriteEntry {
    pub fn from_track(track: &Track, mood: Mood, genre: Option<Genre>) -> Self {
        Self {
            track_name: track.name.clone(),
            artist: track.primary_artist().unwrap_or_default().to_string(),
            spotify_url: track.spotify_url().unwrap_or_default().to_string(),
            album: track.album.name.clone(),
            mood: mood.label().to_string(),
            genre: genre.map_or("Not specified", Genre::label).to_string(),
        }
    }
}

/// Tracks from one successful search and the context that produced them.
#[derive(Debug, Clone)]
pub struct ResultSet {
    pub query: String,
    pub mood: Mood,
    pub genre: Option<Genre>,
    pub tracks: Vec<Track>,
}

#[derive(Debug, Default)]
pub struct Session {
    history: Vec<Track>,
    favorites: Vec<FavoriteEntry>,
    last_results: Option<ResultSet>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_history(&mut self, tracks: &[Track]) {
        self.history.extend_from_slice(tracks);
    }

    /// Logs the tracks to history and makes them the current result set.
    pub fn record_results(&mut self, results: ResultSet) {
        self.append_history(&results.tracks);
        self.last_results = Some(results);
    }

    pub fn last_results(&self) -> Option<&ResultSet> {
        self.last_results.as_ref()
    }

    pub fn add_favorite(&mut self, entry: FavoriteEntry) {
        self.favorites.push(entry);
    }

    /// Saves a track from the current result set under that set's mood and genre.
    pub fn favorite_from_results(&mut self, track_id: &str) -> Result<FavoriteEntry, SessionError> {
        let results = self.last_results.as_ref().ok_or(SessionError::NoResults)?;
        let track = results
            .tracks
            .iter()
            .find(|t| t.id == track_id)
            .ok_or_else(|| SessionError::TrackNotInResults(track_id.to_string()))?;

        let entry = FavoriteEntry::from_track(track, results.mood, results.genre);
        self.add_favorite(entry.clone());
        Ok(entry)
    }

    pub fn favorites(&self) -> &[FavoriteEntry] {
        &self.favorites
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// The last `n` history entries, newest first.
    pub fn recent_history(&self, n: usize) -> Vec<&Track> {
        self.history.iter().rev().take(n).collect()
    }
}

/// Uniformly picks one track for the "surprise me" action.
pub fn pick_random<'a, R>(tracks: &'a [Track], rng: &mut R) -> Result<&'a Track, SessionError>
where
    R: Rng + ?Sized,
{
    tracks.choose(rng).ok_or(SessionError::EmptyResultSet)
}

/// Sessions idle for longer than this are dropped unless configured otherwise.
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(30 * 60);

struct SessionEntry {
    session: Arc<Mutex<Session>>,
    last_access: Instant,
}

impl SessionEntry {
    fn is_idle(&self, now: Instant, ttl: Duration) -> bool {
        now.duration_since(self.last_access) >= ttl
    }
}

/// All live sessions. Each session sits behind its own lock.
///
/// A session that has not been touched for `idle_ttl` has ended and its state
/// is discarded on the next sweep.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionEntry>>>,
    idle_ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_idle_ttl(DEFAULT_IDLE_TTL)
    }
}

impl SessionStore {
    pub fn with_idle_ttl(idle_ttl: Duration) -> Self {
        Self {
            sessions: Arc::default(),
            idle_ttl,
        }
    }

    pub fn idle_ttl(&self) -> Duration {
        self.idle_ttl
    }

    pub async fn create(&self) -> String {
        let id: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(SESSION_ID_LEN)
            .map(char::from)
            .collect();

        let now = Instant::now();
        let mut guard = self.sessions.write().await;
        Self::sweep(&mut guard, now, self.idle_ttl);
        guard.insert(
            id.clone(),
            SessionEntry {
                session: Arc::new(Mutex::new(Session::new())),
                last_access: now,
            },
        );
        tracing::debug!(session = %id, "session created");
        id
    }

    /// Looks up a live session and marks it as used.
    pub async fn get(&self, id: &str) -> Option<Arc<Mutex<Session>>> {
        let now = Instant::now();
        let mut guard = self.sessions.write().await;
        Self::sweep(&mut guard, now, self.idle_ttl);
        let entry = guard.get_mut(id)?;
        entry.last_access = now;
        Some(Arc::clone(&entry.session))
    }

    pub async fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            tracing::debug!(session = %id, "session ended");
        }
        removed
    }

    /// Drops every idle session, returning how many were discarded.
    pub async fn evict_idle(&self) -> usize {
        let mut guard = self.sessions.write().await;
        let evicted = Self::sweep(&mut guard, Instant::now(), self.idle_ttl);
        evicted
    }

    /// Number of sessions that have not gone idle.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.sessions
            .read()
            .await
            .values()
            .filter(|e| !e.is_idle(now, self.idle_ttl))
            .count()
    }

    fn sweep(sessions: &mut HashMap<String, SessionEntry>, now: Instant, ttl: Duration) -> usize {
        let before = sessions.len();
        sessions.retain(|id, entry| {
            let keep = !entry.is_idle(now, ttl);
            if !keep {
                tracing::debug!(session = %id, "session expired");
            }
            keep
        });
        before - sessions.len()
    }
}
