use std::env;

use crate::spotify::{DEFAULT_API_BASE, DEFAULT_TOKEN_URL};

/// Application configuration from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub spotify_client_id: String,
    pub spotify_client_secret: String,
    pub spotify_token_url: String,
    pub spotify_api_base: String,
    pub search_limit: u32,
    pub cache_token: bool,
    pub session_idle_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        // A missing .env is fine, the variables may come from the environment.
        dotenvy::dotenv().ok();

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8081);

        let spotify_client_id = env::var("SPOTIFY_CLIENT_ID")
            .map_err(|_| anyhow::anyhow!("SPOTIFY_CLIENT_ID is required"))?;

        let spotify_client_secret = env::var("SPOTIFY_CLIENT_SECRET")
            .map_err(|_| anyhow::anyhow!("SPOTIFY_CLIENT_SECRET is required"))?;

        let spotify_token_url =
            env::var("SPOTIFY_TOKEN_URL").unwrap_or_else(|_| DEFAULT_TOKEN_URL.into());

        let spotify_api_base =
            env::var("SPOTIFY_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.into());

        let search_limit = env::var("SEARCH_LIMIT")
            .ok()
            .and_then(|l| l.parse::<u32>().ok())
            .unwrap_or(10)
            .clamp(1, 50);

        let cache_token = env::var("SPOTIFY_CACHE_TOKEN")
            .ok()
            .and_then(|v| parse_bool(&v))
            .unwrap_or(true);

        let session_idle_secs = env::var("SESSION_IDLE_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|s| *s > 0)
            .unwrap_or(30 * 60);

        Ok(Self {
            port,
            spotify_client_id,
            spotify_client_secret,
            spotify_token_url,
            spotify_api_base,
            search_limit,
            cache_token,
            session_idle_secs,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
