mod config;
mod error;
mod export;
mod handlers;
mod mood;
mod session;
mod spotify;
#[cfg(test)]
mod testing;

use std::net::SocketAddr;
use std::time::Duration;

use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::handlers::{router, AppState};
use crate::session::SessionStore;
use crate::spotify::SpotifyClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let spotify = SpotifyClient::new(config.spotify_client_id, config.spotify_client_secret)
        .with_endpoints(config.spotify_token_url, config.spotify_api_base)
        .with_token_cache(config.cache_token);

    let sessions = SessionStore::with_idle_ttl(Duration::from_secs(config.session_idle_secs));
    spawn_session_sweeper(sessions.clone());

    let state = AppState {
        spotify,
        sessions,
        search_limit: config.search_limit,
    };

    let app = router()
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("listening on {}", addr);

    axum::serve(
        tokio::net::TcpListener::bind(addr).await?,
        app.into_make_service(),
    )
    .await?;

    Ok(())
}

/// Periodically drops sessions nobody has touched within the idle TTL.
fn spawn_session_sweeper(sessions: SessionStore) {
    let period = (sessions.idle_ttl() / 2).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let evicted = sessions.evict_idle().await;
            if evicted > 0 {
                tracing::info!(evicted, "dropped idle sessions");
            }
        }
    });
}
