use serde_json::{Map, Value};

use crate::models::evaluation::{EvaluationResult, DEFAULT_FEEDBACK, DEFAULT_SUMMARY};
use crate::services::prompt::truncate_chars;

/// Characters of raw output kept as the summary when parsing fails.
pub const FALLBACK_SUMMARY_CHARS: usize = 1000;

/// Outcome of parsing evaluator output.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedEvaluation {
    Structured(EvaluationResult),
    /// Output was not a JSON object; only the summary carries information.
    Fallback(EvaluationResult),
}

impl ParsedEvaluation {
    pub fn into_result(self) -> EvaluationResult {
        match self {
            ParsedEvaluation::Structured(r) | ParsedEvaluation::Fallback(r) => r,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ParsedEvaluation::Fallback(_))
    }
}

/// Turn raw evaluator text into an [`EvaluationResult`]. Never fails.
pub fn parse_evaluation(raw: &str) -> ParsedEvaluation {
    let cleaned = strip_code_fences(raw);

    match serde_json::from_str::<Value>(cleaned) {
        Ok(Value::Object(fields)) => ParsedEvaluation::Structured(from_fields(&fields)),
        _ => ParsedEvaluation::Fallback(fallback(raw)),
    }
}

fn from_fields(fields: &Map<String, Value>) -> EvaluationResult {
    EvaluationResult {
        cv_match_rate: number_field(fields, "cv_match_rate"),
        cv_feedback: text_field(fields, "cv_feedback", DEFAULT_FEEDBACK),
        project_score: number_field(fields, "project_score"),
        project_feedback: text_field(fields, "project_feedback", DEFAULT_FEEDBACK),
        overall_summary: text_field(fields, "overall_summary", DEFAULT_SUMMARY),
    }
}

fn fallback(raw: &str) -> EvaluationResult {
    let summary = truncate_chars(raw.trim(), FALLBACK_SUMMARY_CHARS);
    EvaluationResult {
        overall_summary: if summary.is_empty() {
            DEFAULT_SUMMARY.to_string()
        } else {
            summary.to_string()
        },
        ..EvaluationResult::default()
    }
}

fn number_field(fields: &Map<String, Value>, key: &str) -> f64 {
    let value = match fields.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn text_field(fields: &Map<String, Value>, key: &str, default: &str) -> String {
    match fields.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => default.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Strip a surrounding markdown code fence (with or without a language tag).
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the language tag line, e.g. "json".
    let body = match rest.find('\n') {
        Some(idx) if rest[..idx].trim().chars().all(|c| c.is_ascii_alphanumeric()) => &rest[idx + 1..],
        _ => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}
