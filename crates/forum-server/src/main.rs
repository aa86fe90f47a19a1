mod config;

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use forum_api::{AppState, WebConfig};
use forum_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "forum=debug,forum_api=debug,forum_db=info,tower_http=info".into()
            }),
        )
        .init();

    let config = Config::parse();
    let addr = config.socket_addr()?;

    let db = Arc::new(Database::open(&config.db)?);
    let state = AppState::new(db);

    let sweeper = tokio::spawn(forum_api::run_sweep_loop(
        state.sessions.clone(),
        forum_api::SWEEP_INTERVAL,
    ));

    let app = forum_api::app(
        state,
        &WebConfig {
            static_dir: config.static_dir.clone(),
            secure_cookies: config.secure_cookies,
        },
    );

    info!("Forum listening on {}", addr);
    if !config.secure_cookies {
        info!("Session cookies are not marked Secure; pass --secure-cookies behind HTTPS");
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    info!("Forum stopped");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Ctrl+C handler unavailable: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("SIGTERM handler unavailable: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => info!("Interrupted, shutting down"),
        _ = terminate => info!("Terminated, shutting down"),
    }
}
