//! Forecast aggregator HTTP server entry point.

use std::sync::Arc;

use infrastructure::{AppConfig, ForecastSourceAdapter};
use integration_forecast::ForecastClient;
use presentation_http::{routes, state::AppState};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "forecast_aggregator_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Forecast aggregator v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!("Could not load configuration, falling back to defaults: {e}");
        AppConfig::default()
    });

    info!(
        host = %config.server.host,
        port = %config.server.port,
        upstream = %config.upstream.base_url,
        cache_ttl_secs = config.cache.ttl_secs,
        "Configuration loaded"
    );

    let client = ForecastClient::new(config.upstream.to_client_config())
        .map_err(|e| anyhow::anyhow!("Failed to initialize forecast client: {e}"))?;
    let adapter = ForecastSourceAdapter::new(client, &config.resilience);

    let state = AppState::new(Arc::new(adapter), config.cache.clone());
    let app = routes::create_router(state, config.server.cors_enabled);

    let addr = config.server.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Ctrl+C handler could not be installed: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("SIGTERM handler could not be installed: {e}");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Ctrl+C received, shutting down");
        }
        () = terminate => {
            info!("SIGTERM received, shutting down");
        }
    }
}
