/// Default number of characters kept from each document.
pub const DEFAULT_TEXT_PREFIX_CHARS: usize = 2500;

/// Keep at most `max_chars` characters, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Build the evaluation prompt for one candidate. Document texts are cut to
/// `prefix_chars` characters each.
pub fn build_evaluation_prompt(
    title: &str,
    cv_text: &str,
    project_text: &str,
    prefix_chars: usize,
) -> String {
    format!(
        "You are an AI evaluator for technical job candidates.

Job Title: {title}

Candidate CV Content:
{cv}

Candidate Project Report:
{project}

Analyze the candidate and respond with ONLY a JSON object containing exactly these fields:
- \"cv_match_rate\": number between 0 and 1
- \"cv_feedback\": string, 2-3 sentences
- \"project_score\": number between 1 and 5
- \"project_feedback\": string, 2-3 sentences
- \"overall_summary\": string, 3-5 sentences combining strengths, gaps, and recommendations
",
        title = title.trim(),
        cv = truncate_chars(cv_text, prefix_chars),
        project = truncate_chars(project_text, prefix_chars),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("", 3), "");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn test_prompt_embeds_inputs_and_field_names() {
        let prompt = build_evaluation_prompt("Backend Engineer", "Rust, Go", "Built a queue", 100);
        assert!(prompt.contains("Job Title: Backend Engineer"));
        assert!(prompt.contains("Rust, Go"));
        assert!(prompt.contains("Built a queue"));
        for field in [
            "cv_match_rate",
            "cv_feedback",
            "project_score",
            "project_feedback",
            "overall_summary",
        ] {
            assert!(prompt.contains(field), "missing {field}");
        }
    }

    #[test]
    fn test_prompt_truncates_each_document() {
        let cv = "c".repeat(50);
        let project = "p".repeat(50);
        let prompt = build_evaluation_prompt("QA", &cv, &project, 10);
        assert!(prompt.contains(&"c".repeat(10)));
        assert!(!prompt.contains(&"c".repeat(11)));
        assert!(prompt.contains(&"p".repeat(10)));
        assert!(!prompt.contains(&"p".repeat(11)));
    }
}
