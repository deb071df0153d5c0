use std::sync::Arc;

use strum::Display;
use tracing::{info, warn};

use crate::models::evaluation::EvaluationResult;
use crate::services::llm::{Evaluator, LlmError};
use crate::services::parser;
use crate::services::prompt::{self, DEFAULT_TEXT_PREFIX_CHARS};
use crate::services::retry::{AttemptError, RetryPolicy};
use crate::services::storage::{DocumentSource, StorageError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum DocumentRole {
    #[strum(serialize = "CV")]
    Cv,
    #[strum(serialize = "project report")]
    Project,
}

/// Resolves both documents, prompts the evaluator under the retry policy, and
/// parses whatever comes back.
pub struct EvaluationPipeline {
    documents: Arc<dyn DocumentSource>,
    evaluator: Arc<dyn Evaluator>,
    retry: RetryPolicy,
    prefix_chars: usize,
}

impl EvaluationPipeline {
    pub fn new(documents: Arc<dyn DocumentSource>, evaluator: Arc<dyn Evaluator>) -> Self {
        Self {
            documents,
            evaluator,
            retry: RetryPolicy::default(),
            prefix_chars: DEFAULT_TEXT_PREFIX_CHARS,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_prefix_chars(mut self, prefix_chars: usize) -> Self {
        self.prefix_chars = prefix_chars;
        self
    }

    pub async fn evaluate(
        &self,
        title: &str,
        cv_id: &str,
        project_id: &str,
    ) -> Result<EvaluationResult, PipelineError> {
        info!(title = %title, cv_id = %cv_id, project_id = %project_id, "Starting evaluation");

        let cv_text = self.resolve(DocumentRole::Cv, cv_id).await?;
        let project_text = self.resolve(DocumentRole::Project, project_id).await?;

        let prompt =
            prompt::build_evaluation_prompt(title, &cv_text, &project_text, self.prefix_chars);

        let raw = self
            .retry
            .run("evaluator", |attempt| {
                info!(attempt, "Requesting evaluation from evaluator");
                self.evaluator.generate(&prompt)
            })
            .await
            .map_err(|e| PipelineError::EvaluatorExhausted {
                attempts: e.attempts,
                last: e.last,
            })?;

        let parsed = parser::parse_evaluation(&raw);
        if parsed.is_fallback() {
            metrics::counter!("evaluation_parse_fallback_total").increment(1);
            warn!(title = %title, "Evaluator output was not structured JSON, using summary fallback");
        }

        info!(title = %title, "Evaluation finished");
        Ok(parsed.into_result())
    }

    async fn resolve(&self, role: DocumentRole, id: &str) -> Result<String, PipelineError> {
        self.documents
            .resolve_text(id)
            .await
            .map_err(|source| PipelineError::Resolution {
                role,
                id: id.to_string(),
                source,
            })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{role} document '{id}' could not be resolved: {source}")]
    Resolution {
        role: DocumentRole,
        id: String,
        #[source]
        source: StorageError,
    },

    #[error("evaluator call failed after {attempts} attempts: {last}")]
    EvaluatorExhausted {
        attempts: u32,
        last: AttemptError<LlmError>,
    },
}

impl PipelineError {
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            PipelineError::EvaluatorExhausted {
                last: AttemptError::Timeout(_),
                ..
            }
        )
    }
}
