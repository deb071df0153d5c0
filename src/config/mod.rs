use std::time::Duration;

use serde::Deserialize;

use crate::services::retry::RetryPolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Gemini API key. Without it every evaluation fails.
    #[serde(default)]
    pub gemini_api_key: Option<String>,

    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    #[serde(default = "default_gemini_base_url")]
    pub gemini_base_url: String,

    /// Directory holding uploaded documents
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,

    /// When set, logs are also written to a daily-rotated file here
    #[serde(default)]
    pub log_dir: Option<String>,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    #[serde(default = "default_evaluator_max_attempts")]
    pub evaluator_max_attempts: u32,

    /// Linear backoff base between evaluator attempts
    #[serde(default = "default_evaluator_backoff_ms")]
    pub evaluator_backoff_ms: u64,

    #[serde(default = "default_evaluator_timeout_secs")]
    pub evaluator_timeout_secs: u64,

    /// Characters of each document included in the prompt
    #[serde(default = "default_text_prefix_chars")]
    pub text_prefix_chars: usize,

    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_upload_dir() -> String {
    "data/uploads".to_string()
}

fn default_worker_count() -> usize {
    4
}

fn default_evaluator_max_attempts() -> u32 {
    3
}

fn default_evaluator_backoff_ms() -> u64 {
    2000
}

fn default_evaluator_timeout_secs() -> u64 {
    60
}

fn default_text_prefix_chars() -> usize {
    2500
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.evaluator_max_attempts.max(1),
            base_delay: Duration::from_millis(self.evaluator_backoff_ms),
            attempt_timeout: Duration::from_secs(self.evaluator_timeout_secs.max(1)),
        }
    }

    pub fn api_key_detected(&self) -> bool {
        self.gemini_api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }
}
