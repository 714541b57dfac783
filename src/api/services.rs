use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use std::collections::HashMap;
use tracing::{debug, warn};

use super::{
    models::{
        DownloadAcceptedResponse, HealthResponse, JobView, MetricsResponse, NotFoundView,
        StatusResponse, SubmitRequest,
    },
    state::AppState,
    utils::{read_body, require_json},
};
use crate::api::error::ApiError;
use crate::jobs::{DownloadRequest, JobId};

/// Download submission endpoint (POST /download)
///
/// Validates the request, registers a `pending` job and returns its id
/// without waiting for the download. Poll `GET /status/{download_id}` for
/// progress.
pub async fn submit_download(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Body,
) -> Result<impl IntoResponse, ApiError> {
    require_json(&headers)?;

    // Decompression is handled by RequestDecompressionLayer
    let body = read_body(body, state.config.server.max_payload_bytes.as_usize()).await?;
    let request: SubmitRequest = serde_json::from_slice(&body)?;

    let download_id = state
        .service
        .submit(DownloadRequest {
            url: request.url.unwrap_or_default(),
            destination_dir: None,
            format: request.format,
        })
        .inspect_err(|e| debug!(error = %e, "Rejected download request"))?;

    let response = DownloadAcceptedResponse {
        download_id: download_id.to_string(),
    };
    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// Job status endpoint (GET /status/{download_id})
///
/// Unknown ids answer `200` with a `not_found` body so pollers can treat
/// every response the same way.
pub async fn get_status(
    State(state): State<AppState>,
    Path(download_id): Path<String>,
) -> impl IntoResponse {
    let response = match state.service.query(&JobId::from(download_id)) {
        Some(job) => StatusResponse::Found(Box::new(JobView::from(&job))),
        None => StatusResponse::NotFound(NotFoundView::default()),
    };
    (StatusCode::OK, Json(response))
}

/// Health check endpoint (GET /health, GET /operators/health)
///
/// Returns 503 when the extraction engine cannot be run.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let extractor = state.service.runner().extractor();
    let extractor_healthy = extractor.health().await;
    if !extractor_healthy {
        warn!(extractor = extractor.name(), "Extractor health check failed");
    }

    let mut components = HashMap::new();
    components.insert("api".to_string(), "healthy".to_string());
    components.insert("registry".to_string(), "healthy".to_string());
    components.insert(
        "extractor".to_string(),
        if extractor_healthy { "healthy" } else { "unhealthy" }.to_string(),
    );

    let all_healthy = components.values().all(|status| status == "healthy");
    let (status_code, overall_status) = if all_healthy {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };

    let response = HealthResponse {
        status: overall_status.to_string(),
        components,
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (status_code, Json(response))
}

/// Counter snapshot (GET /operators/metrics)
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    Json(MetricsResponse {
        counters: state.metrics.snapshot(),
        jobs_tracked: state.service.registry().len(),
    })
}
