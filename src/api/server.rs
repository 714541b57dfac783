use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, routing::get, routing::post};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{decompression::RequestDecompressionLayer, trace::TraceLayer};
use tracing::{info, warn};

use super::{
    services::{get_status, health, metrics, submit_download},
    state::AppState,
};
use crate::config::Config;
use crate::extractor::{Extractor, YtDlpExtractor};
use crate::jobs::{DownloadService, retention};
use crate::observability::Metrics;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// All routes with tracing and request decompression applied
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/download", post(submit_download))
        .route("/status/{download_id}", get(get_status))
        .route("/health", get(health))
        .route("/operators/health", get(health))
        .route("/operators/metrics", get(metrics))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestDecompressionLayer::new()),
        )
}

pub async fn run(config: Config, address: Option<SocketAddr>) -> Result<(), AnyError> {
    let address = address.unwrap_or(config.server.bind_addr);

    let extractor = Arc::new(YtDlpExtractor::new(config.extractor.clone()));
    if !extractor.health().await {
        warn!(binary = %config.extractor.binary, "Extractor is not runnable; downloads will fail until it is installed");
    }

    let metrics = Arc::new(Metrics::new());
    let service = DownloadService::from_config(&config, extractor, metrics.clone());
    let sweeper = retention::spawn_sweeper(service.registry().clone(), &config.retention, metrics.clone());

    info!(
        destination = %config.download.destination_dir.display(),
        max_concurrent_jobs = config.worker.max_concurrent_jobs,
        "Download service ready"
    );
    let app = router(AppState::new(config, service, metrics));

    let listener = TcpListener::bind(address).await?;
    info!(%address, "grabbox API listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // In-flight downloads are abandoned with the runtime
    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
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
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
