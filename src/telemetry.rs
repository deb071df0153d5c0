use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install JSON logging to stdout, plus a daily-rotated `app.log` under
/// `log_dir` when given. Keep the returned guard alive until shutdown or
/// buffered file output is lost.
pub fn init_tracing(log_dir: Option<&str>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "app.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().json().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json())
        .with(file_layer)
        .init();

    guard
}

/// Register descriptions for the Prometheus exporter.
pub fn describe_metrics() {
    metrics::describe_counter!("evaluation_jobs_total", "Total evaluation jobs submitted");
    metrics::describe_counter!("evaluation_jobs_completed", "Total evaluation jobs completed");
    metrics::describe_counter!("evaluation_jobs_failed", "Total evaluation jobs that failed");
    metrics::describe_histogram!(
        "evaluation_processing_seconds",
        "Time to run one evaluation job"
    );
    metrics::describe_gauge!(
        "evaluation_queue_depth",
        "Current number of jobs waiting for a worker"
    );
    metrics::describe_counter!(
        "evaluator_attempt_failures_total",
        "Evaluator attempts that failed or timed out"
    );
    metrics::describe_counter!(
        "evaluation_parse_fallback_total",
        "Evaluator responses that were not structured JSON"
    );
    metrics::describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request latency"
    );
}
