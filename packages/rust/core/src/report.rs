//! Console and JSON rendering of annotated results.

use std::fmt::Write;

use leetscribe_shared::{AnnotatedResult, LeetscribeError, Result};

const SEPARATOR: &str = "========================================";

/// Characters of each snippet shown in the text report.
pub const SNIPPET_PREVIEW_CHARS: usize = 100;

/// Human-readable report, one section per work item.
pub fn render_text(results: &[AnnotatedResult]) -> String {
    let mut out = String::new();
    for result in results {
        // Writing into a String cannot fail.
        let _ = writeln!(out, "{SEPARATOR}");
        let _ = writeln!(out, "Problem: {}", result.work_item.title);
        let _ = writeln!(out, "Link: {}", result.work_item.url);

        if result.blocks.is_empty() {
            let _ = writeln!(out, "No solutions captured.");
        }
        for annotated in &result.blocks {
            let _ = writeln!(out, "\nSolution #{}", annotated.block.sequence_index);
            let _ = writeln!(
                out,
                "Snippet (truncated): {}",
                preview(&annotated.block.raw_text, SNIPPET_PREVIEW_CHARS)
            );
            let _ = writeln!(out, "Annotation:\n{}", annotated.annotation);
        }
        let _ = writeln!(out, "{SEPARATOR}");
    }
    out
}

/// Pretty-printed JSON array of results.
pub fn render_json(results: &[AnnotatedResult]) -> Result<String> {
    serde_json::to_string_pretty(results)
        .map_err(|e| LeetscribeError::validation(format!("failed to serialize results: {e}")))
}

/// First `max` characters of `text`, with an ellipsis when cut.
fn preview(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{} ...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leetscribe_shared::{Annotation, ExtractedBlock, FAILED_ANNOTATION, WorkItem};

    fn result() -> AnnotatedResult {
        let item = WorkItem::new("Two Sum", "https://leetcode.com/problems/two-sum/").unwrap();
        let mut result = AnnotatedResult::new(item);
        result.push(
            ExtractedBlock::captured(1, "x".repeat(150)),
            Annotation::Generated("O(n) time".into()),
        );
        result.push(ExtractedBlock::captured(2, "short"), Annotation::Failed);
        result
    }

    #[test]
    fn text_report_lists_every_block() {
        let text = render_text(&[result()]);

        assert!(text.starts_with(SEPARATOR));
        assert!(text.contains("Problem: Two Sum"));
        assert!(text.contains("Link: https://leetcode.com/problems/two-sum/"));
        assert!(text.contains("Solution #1"));
        assert!(text.contains(&format!("Snippet (truncated): {} ...", "x".repeat(100))));
        assert!(!text.contains(&"x".repeat(101)));
        assert!(text.contains("O(n) time"));
        assert!(text.contains("Solution #2"));
        assert!(text.contains(FAILED_ANNOTATION));
    }

    #[test]
    fn empty_item_is_reported() {
        let empty = AnnotatedResult::new(WorkItem::new("Slow", "https://x/1").unwrap());
        assert!(render_text(&[empty]).contains("No solutions captured."));
    }

    #[test]
    fn preview_respects_char_boundaries() {
        assert_eq!(preview("héllo", 2), "hé ...");
        assert_eq!(preview("hi", 100), "hi");
    }

    #[test]
    fn json_report_round_trips_fields() {
        let json = render_json(&[result()]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value[0]["work_item"]["title"], "Two Sum");
        assert_eq!(value[0]["blocks"][0]["annotation"]["kind"], "generated");
        assert_eq!(value[0]["blocks"][1]["annotation"]["kind"], "failed");
        assert_eq!(value[0]["blocks"][1]["block"]["status"], "captured");
    }
}
