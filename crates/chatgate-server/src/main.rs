mod config;

use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use chatgate_api::provider::GigaChatProvider;
use chatgate_api::state::{AppState, AppStateInner};
use chatgate_api::verifier::TokenVerifier;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "chatgate=debug,chatgate_api=debug,chatgate_db=info,tower_http=debug".into()
            }),
        )
        .init();

    let config = Config::from_env()?;
    info!("Identity service: {}", config.identity_url);
    info!("GigaChat model {} at {}", config.gigachat.model, config.gigachat.base_url);
    if config.jwt_secret.is_none() {
        info!("JWT_SECRET_KEY not set; tokens are verified by the identity service only");
    }
    for key in &config.ignored_db_vars {
        info!("{} is set but does not apply to the embedded SQLite store", key);
    }

    // Schema must exist before the first request
    let db = chatgate_db::Database::open(&config.db_path)?;

    let state: AppState = Arc::new(AppStateInner {
        db,
        verifier: TokenVerifier::new(&config.identity_url)?,
        provider: Box::new(GigaChatProvider::new(config.gigachat.clone())?),
    });

    let app = chatgate_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    info!("chatgate listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("chatgate stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
