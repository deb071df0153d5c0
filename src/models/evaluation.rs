use serde::{Deserialize, Serialize};

pub const DEFAULT_FEEDBACK: &str = "N/A";
pub const DEFAULT_SUMMARY: &str = "No summary generated due to incomplete LLM response.";

/// Structured outcome of one candidate evaluation.
///
/// Every field is always present; defaults are applied when the evaluator
/// output is parsed, so consumers never need to null-check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Nominally in `[0, 1]`, but out-of-range producer values are kept.
    pub cv_match_rate: f64,
    pub cv_feedback: String,
    /// Nominally on a 1-5 scale.
    pub project_score: f64,
    pub project_feedback: String,
    pub overall_summary: String,
}

impl Default for EvaluationResult {
    fn default() -> Self {
        Self {
            cv_match_rate: 0.0,
            cv_feedback: DEFAULT_FEEDBACK.to_string(),
            project_score: 0.0,
            project_feedback: DEFAULT_FEEDBACK.to_string(),
            overall_summary: DEFAULT_SUMMARY.to_string(),
        }
    }
}
