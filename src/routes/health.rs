use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::app_state::AppState;

#[derive(Serialize)]
pub struct RootResponse {
    pub message: String,
    pub api_key_detected: bool,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub queue: QueueHealth,
    pub storage: ComponentHealth,
}

#[derive(Serialize)]
pub struct QueueHealth {
    pub status: String,
    pub workers: usize,
    pub depth: u64,
}

#[derive(Serialize)]
pub struct ComponentHealth {
    pub status: String,
    pub latency_ms: Option<u64>,
}

/// GET /: liveness plus whether an evaluator key is configured.
pub async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    Json(RootResponse {
        message: "Server is running".to_string(),
        api_key_detected: state.api_key_detected,
    })
}

/// GET /api/health: health check with component status.
pub async fn health_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let start = std::time::Instant::now();

    // The upload directory must still exist for documents to resolve
    let storage_check = match tokio::fs::metadata(state.documents.root()).await {
        Ok(meta) if meta.is_dir() => ComponentHealth {
            status: "ok".to_string(),
            latency_ms: Some(start.elapsed().as_millis() as u64),
        },
        _ => ComponentHealth {
            status: "error".to_string(),
            latency_ms: None,
        },
    };

    let queue_check = QueueHealth {
        status: "ok".to_string(),
        workers: state.workers,
        depth: state.registry.queue_depth(),
    };

    let all_healthy = storage_check.status == "ok";
    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if all_healthy {
            "ok".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            queue: queue_check,
            storage: storage_check,
        },
    };

    (status_code, Json(response))
}
