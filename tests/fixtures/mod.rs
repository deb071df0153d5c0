//! Sample documents and evaluator outputs

#![allow(dead_code)]

pub const CV_TEXT: &str = "Jane Doe. Senior backend engineer with six years of Rust, Go and \
PostgreSQL. Built high-throughput job queues and payment APIs.";

pub const PROJECT_TEXT: &str = "Project report: an asynchronous evaluation service with a \
worker pool, retry with backoff, and structured result parsing. Includes integration tests.";

/// Well-formed evaluator output for a given match rate.
pub fn evaluation_json(cv_match_rate: f64) -> String {
    format!(
        r#"{{
  "cv_match_rate": {cv_match_rate},
  "cv_feedback": "Strong backend background with relevant queueing experience.",
  "project_score": 4.5,
  "project_feedback": "Solid design with clear retry handling.",
  "overall_summary": "A strong fit for the role; recommend a technical interview."
}}"#
    )
}

/// Same output wrapped in a markdown fence, as models often reply.
pub fn fenced_evaluation_json(cv_match_rate: f64) -> String {
    format!("```json\n{}\n```", evaluation_json(cv_match_rate))
}

pub const PROSE_OUTPUT: &str = "The candidate seems capable but I cannot produce JSON right now.";
