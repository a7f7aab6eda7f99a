//! Spotify Web API client.
//!
//! Uses Client Credentials flow for server-to-server authentication.

use std::sync::Arc;
use std::time::{Duration, Instant};

use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;

pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1";

/// Seconds shaved off `expires_in` so a cached token is never used at the edge.
const EXPIRY_MARGIN_SECS: u64 = 60;

#[derive(Debug, thiserror::Error)]
pub enum SpotifyError {
    #[error("token request failed: {0}")]
    Auth(String),
    #[error("search request failed: {0}")]
    Search(String),
}

/// Spotify API client with optional token caching.
#[derive(Clone)]
pub struct SpotifyClient {
    client: Client,
    client_id: String,
    client_secret: String,
    token_url: String,
    api_base: String,
    cache_token: bool,
    token: Arc<RwLock<Option<AccessToken>>>,
}

/// Bearer token from the client credentials exchange.
#[derive(Clone, Debug)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: Instant,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        self.expires_at > Instant::now()
    }
}

/// `Authorization` header value for the token endpoint.
pub fn basic_auth_value(client_id: &str, client_secret: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD
        .encode(format!("{}:{}", client_id, client_secret).as_bytes());
    format!("Basic {}", encoded)
}

impl SpotifyClient {
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            client: Client::new(),
            client_id,
            client_secret,
            token_url: DEFAULT_TOKEN_URL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            cache_token: true,
            token: Arc::new(RwLock::new(None)),
        }
    }

    /// Point the client at different token/API endpoints.
    pub fn with_endpoints(
        mut self,
        token_url: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        self.token_url = token_url.into();
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_token_cache(mut self, enabled: bool) -> Self {
        self.cache_token = enabled;
        self
    }

    /// Returns a usable bearer token, exchanging credentials when needed.
    pub async fn bearer_token(&self) -> Result<String, SpotifyError> {
        if !self.cache_token {
            return Ok(self.acquire_token().await?.value);
        }

        {
            let guard = self.token.read().await;
            if let Some(ref t) = *guard {
                if t.is_fresh() {
                    return Ok(t.value.clone());
                }
            }
        }

        let token = self.acquire_token().await?;
        {
            let mut guard = self.token.write().await;
            *guard = Some(token.clone());
        }
        Ok(token.value)
    }

    /// Performs one client credentials exchange against the token endpoint.
    pub async fn acquire_token(&self) -> Result<AccessToken, SpotifyError> {
        let params = [("grant_type", "client_credentials")];

        tracing::debug!(url = %self.token_url, "requesting access token");
        let res = self
            .client
            .post(&self.token_url)
            .header("Authorization", basic_auth_value(&self.client_id, &self.client_secret))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .form(&params)
            .send()
            .await
            .map_err(|e| SpotifyError::Auth(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            tracing::warn!(%status, "token exchange rejected");
            return Err(SpotifyError::Auth(format!("{} - {}", status, body)));
        }

        let body: TokenResponse = res
            .json()
            .await
            .map_err(|e| SpotifyError::Auth(format!("token parse failed: {}", e)))?;
        let ttl = body.expires_in.saturating_sub(EXPIRY_MARGIN_SECS);

        Ok(AccessToken {
            value: body.access_token,
            expires_at: Instant::now() + Duration::from_secs(ttl),
        })
    }

    /// Search for tracks in the Spotify catalog.
    ///
    /// Items come back in the order Spotify returns them, capped at `limit`.
    pub async fn search_tracks(&self, q: &str, limit: u32) -> Result<Vec<Track>, SpotifyError> {
        let token = self.bearer_token().await?;
        let limit = limit.clamp(1, 50);

        let url = format!(
            "{}/search?q={}&type=track&limit={}",
            self.api_base,
            urlencoding::encode(q),
            limit,
        );

        let res = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .map_err(|e| SpotifyError::Search(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            tracing::warn!(%status, query = q, "search rejected");
            return Err(SpotifyError::Search(format!("Spotify API error {}: {}", status, body)));
        }

        let body: SearchResponse = res
            .json()
            .await
            .map_err(|e| SpotifyError::Search(format!("search parse failed: {}", e)))?;

        let mut tracks = body.tracks.items;
        tracks.truncate(limit as usize);
        tracing::info!(query = q, count = tracks.len(), "search complete");
        Ok(tracks)
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

#[derive(Deserialize)]
struct SearchResponse {
    tracks: TracksPage,
}

#[derive(Deserialize)]
struct TracksPage {
    #[serde(default)]
    items: Vec<Track>,
}

/// A Spotify track (simplified).
///
/// Optional or `null` fields fall back to empty values so one sparse item
/// does not fail the whole search.
#[derive(Clone, Debug, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub artists: Vec<Artist>,
    #[serde(default)]
    pub album: Album,
    #[serde(default, deserialize_with = "clamped_popularity")]
    pub popularity: u8,
    #[serde(default)]
    pub external_urls: ExternalUrls,
    #[serde(default)]
    pub preview_url: Option<String>,
}

impl Track {
    pub fn primary_artist(&self) -> Option<&str> {
        self.artists.first().map(|a| a.name.as_str())
    }

    pub fn image_url(&self) -> Option<&str> {
        self.album.images.first().and_then(|i| i.url.as_deref())
    }

    pub fn spotify_url(&self) -> Option<&str> {
        self.external_urls.spotify.as_deref()
    }
}

fn clamped_popularity<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<i64>::deserialize(deserializer)?;
    Ok(raw.unwrap_or(0).clamp(0, 100) as u8)
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct Artist {
    pub name: String,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct Album {
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct Image {
    pub url: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}
