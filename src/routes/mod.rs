use std::sync::Arc;
use std::time::Instant;

use axum::extract::{DefaultBodyLimit, Request};
use axum::http::HeaderValue;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{delete, get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::app_state::AppState;

pub mod documents;
pub mod health;
pub mod jobs;
pub mod metrics;

/// All application routes. `/metrics/prometheus` is only mounted when a
/// recorder handle is given.
pub fn router(
    state: AppState,
    max_upload_bytes: usize,
    prometheus: Option<Arc<PrometheusHandle>>,
) -> Router {
    let mut app = Router::new()
        .route("/", get(health::root))
        .route("/api/health", get(health::health_check))
        .route("/upload", post(documents::upload_documents))
        .route("/documents", get(documents::list_documents))
        .route("/documents/{file_id}", delete(documents::delete_document))
        .route("/evaluate", post(jobs::create_job))
        .route("/result/{job_id}", get(jobs::get_result))
        .route("/replay/{job_id}", post(jobs::replay_job))
        .route("/metrics", get(metrics::job_metrics))
        .with_state(state);

    if let Some(handle) = prometheus {
        app = app.merge(
            Router::new()
                .route("/metrics/prometheus", get(metrics::prometheus_metrics))
                .with_state(handle),
        );
    }

    app.layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(middleware::from_fn(record_process_time))
}

/// Logs each request and reports its duration in `x-process-time` (seconds).
async fn record_process_time(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();
    tracing::info!(method = %method, path = %path, "Request received");

    let mut response = next.run(request).await;

    let elapsed = start.elapsed().as_secs_f64();
    let status = response.status().as_u16();
    ::metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .record(elapsed);

    if let Ok(value) = HeaderValue::from_str(&format!("{elapsed:.2}")) {
        response.headers_mut().insert("x-process-time", value);
    }
    tracing::info!(
        method = %method,
        path = %path,
        status,
        elapsed_ms = (elapsed * 1000.0) as u64,
        "Request completed"
    );
    response
}
