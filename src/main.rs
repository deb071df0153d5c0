use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use cv_evaluator::app_state::AppState;
use cv_evaluator::config::AppConfig;
use cv_evaluator::routes;
use cv_evaluator::services::{
    llm::GeminiClient,
    pipeline::EvaluationPipeline,
    queue::JobQueue,
    registry::JobRegistry,
    storage::DocumentStore,
    worker::WorkerPool,
};
use cv_evaluator::telemetry;

#[tokio::main]
async fn main() {
    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    // Initialize structured logging
    let _log_guard = telemetry::init_tracing(config.log_dir.as_deref());

    tracing::info!("Initializing cv-evaluator server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);
    telemetry::describe_metrics();

    tracing::info!(upload_dir = %config.upload_dir, "Opening document store");
    let documents = Arc::new(
        DocumentStore::open(&config.upload_dir)
            .await
            .expect("Failed to open upload directory"),
    );

    if !config.api_key_detected() {
        tracing::warn!("GEMINI_API_KEY is not set; evaluations will fail");
    }
    let evaluator = Arc::new(
        GeminiClient::new(
            &config.gemini_base_url,
            &config.gemini_model,
            config.gemini_api_key.clone(),
        )
        .expect("Failed to initialize Gemini client"),
    );
    tracing::info!(model = %evaluator.model(), "Evaluator client ready");

    let pipeline = Arc::new(
        EvaluationPipeline::new(documents.clone(), evaluator)
            .with_retry(config.retry_policy())
            .with_prefix_chars(config.text_prefix_chars),
    );

    // Registry feeds the worker pool through the in-process queue
    let (queue, receiver) = JobQueue::new();
    let registry = Arc::new(JobRegistry::new(queue));
    let workers = WorkerPool::spawn(config.worker_count, receiver, registry.clone(), pipeline);

    let state = AppState::new(
        registry.clone(),
        documents,
        workers.size(),
        config.api_key_detected(),
    );

    let app = routes::router(state, config.max_upload_bytes, Some(prometheus_handle))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(config.max_upload_bytes));

    tracing::info!("Starting cv-evaluator on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // Let queued and in-flight evaluations finish before exiting
    registry.close_queue();
    workers.join().await;

    tracing::info!("Server stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
