use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::app_state::AppState;
use crate::models::api::MetricsResponse;

/// GET /metrics: job counts and score averages over completed jobs.
pub async fn job_metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    let stats = state.registry.stats().await;

    tracing::info!(
        total = stats.total,
        completed = stats.completed,
        failed = stats.failed,
        "Metrics requested"
    );

    Json(MetricsResponse {
        total_jobs: stats.total,
        completed_jobs: stats.completed,
        failed_jobs: stats.failed,
        avg_cv_match_rate: round2(stats.avg_cv_match_rate),
        avg_project_score: round2(stats.avg_project_score),
    })
}

/// Prometheus metrics scrape endpoint.
/// Returns metrics in Prometheus text exposition format.
pub async fn prometheus_metrics(State(handle): State<Arc<PrometheusHandle>>) -> impl IntoResponse {
    handle.render()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
