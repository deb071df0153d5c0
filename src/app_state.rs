use std::sync::Arc;

use crate::services::{registry::JobRegistry, storage::DocumentStore};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<JobRegistry>,
    pub documents: Arc<DocumentStore>,
    pub workers: usize,
    pub api_key_detected: bool,
}

impl AppState {
    pub fn new(
        registry: Arc<JobRegistry>,
        documents: Arc<DocumentStore>,
        workers: usize,
        api_key_detected: bool,
    ) -> Self {
        Self {
            registry,
            documents,
            workers,
            api_key_detected,
        }
    }
}
