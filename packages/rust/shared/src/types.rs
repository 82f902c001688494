//! Core domain types for a scrape-and-annotate run.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Text recorded for a content region whose nested code block is missing.
pub const NO_CONTENT_TEXT: &str = "No solution text found.";

/// Text rendered for an annotation whose generation call failed.
pub const FAILED_ANNOTATION: &str = "Error or no response.";

/// Text rendered for a block that was never sent for annotation.
pub const SKIPPED_ANNOTATION: &str = "No annotation (no code captured).";

// ---------------------------------------------------------------------------
// WorkItem
// ---------------------------------------------------------------------------

/// One discovered problem page. Identity is the `(title, url)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkItem {
    pub title: String,
    pub url: String,
}

impl WorkItem {
    /// Build a work item, rejecting empty (after trimming) titles or URLs.
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Option<Self> {
        let title = title.into().trim().to_string();
        let url = url.into().trim().to_string();
        if title.is_empty() || url.is_empty() {
            return None;
        }
        Some(Self { title, url })
    }
}

// ---------------------------------------------------------------------------
// ExtractedBlock
// ---------------------------------------------------------------------------

/// How a content region was captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockStatus {
    /// Code text was read from the nested code region.
    Captured,
    /// The region had no nested code text.
    NoContent,
    /// Processing the region raised an error.
    Failed,
}

/// One scraped text region from a work item's detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedBlock {
    /// 1-based position in document order.
    pub sequence_index: usize,
    pub raw_text: String,
    pub status: BlockStatus,
}

impl ExtractedBlock {
    pub fn captured(sequence_index: usize, raw_text: impl Into<String>) -> Self {
        Self {
            sequence_index,
            raw_text: raw_text.into(),
            status: BlockStatus::Captured,
        }
    }

    pub fn no_content(sequence_index: usize) -> Self {
        Self {
            sequence_index,
            raw_text: NO_CONTENT_TEXT.to_string(),
            status: BlockStatus::NoContent,
        }
    }

    pub fn failed(sequence_index: usize, reason: impl fmt::Display) -> Self {
        Self {
            sequence_index,
            raw_text: format!("Extraction failed: {reason}"),
            status: BlockStatus::Failed,
        }
    }

    /// Whether the block carries code worth sending to the generator.
    pub fn has_code(&self) -> bool {
        self.status == BlockStatus::Captured
    }
}

// ---------------------------------------------------------------------------
// Annotation
// ---------------------------------------------------------------------------

/// Generated text attached to a block, or a marker for why there is none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Annotation {
    /// Raw response text from the generation service, stored verbatim.
    Generated(String),
    /// The generation call failed.
    Failed,
    /// The block had no code to send.
    Skipped,
}

impl Annotation {
    /// Text shown to the user: the response, or the matching sentinel.
    pub fn as_text(&self) -> &str {
        match self {
            Self::Generated(text) => text,
            Self::Failed => FAILED_ANNOTATION,
            Self::Skipped => SKIPPED_ANNOTATION,
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, Self::Generated(_))
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_text())
    }
}

// ---------------------------------------------------------------------------
// AnnotatedResult
// ---------------------------------------------------------------------------

/// A block paired with its annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedBlock {
    pub block: ExtractedBlock,
    pub annotation: Annotation,
}

/// A work item with all of its blocks and their annotations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotatedResult {
    pub work_item: WorkItem,
    pub blocks: Vec<AnnotatedBlock>,
    pub captured_at: DateTime<Utc>,
}

impl AnnotatedResult {
    pub fn new(work_item: WorkItem) -> Self {
        Self {
            work_item,
            blocks: Vec::new(),
            captured_at: Utc::now(),
        }
    }

    /// Append one annotated block; blocks are never edited after this.
    pub fn push(&mut self, block: ExtractedBlock, annotation: Annotation) {
        self.blocks.push(AnnotatedBlock { block, annotation });
    }
}

// ---------------------------------------------------------------------------
// EnrichmentMode
// ---------------------------------------------------------------------------

/// What the generation service is asked to do with each snippet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnrichmentMode {
    /// Time/space complexity with a short explanation.
    #[default]
    Complexity,
    /// Translate the snippet into the target language.
    Convert,
}

impl EnrichmentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complexity => "complexity",
            Self::Convert => "convert",
        }
    }
}

impl fmt::Display for EnrichmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnrichmentMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "complexity" => Ok(Self::Complexity),
            "convert" | "conversion" => Ok(Self::Convert),
            other => Err(format!(
                "unknown enrichment mode '{other}': expected 'complexity' or 'convert'"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn work_item_rejects_blank_fields() {
        assert!(WorkItem::new("", "https://leetcode.com/problems/two-sum/").is_none());
        assert!(WorkItem::new("  ", "https://leetcode.com/problems/two-sum/").is_none());
        assert!(WorkItem::new("Two Sum", "").is_none());

        let item = WorkItem::new(" Two Sum \n", "https://leetcode.com/problems/two-sum/").unwrap();
        assert_eq!(item.title, "Two Sum");
    }

    #[test]
    fn block_constructors_set_status() {
        assert!(ExtractedBlock::captured(1, "int x;").has_code());

        let missing = ExtractedBlock::no_content(2);
        assert_eq!(missing.raw_text, NO_CONTENT_TEXT);
        assert!(!missing.has_code());

        let failed = ExtractedBlock::failed(3, "element detached");
        assert_eq!(failed.status, BlockStatus::Failed);
        assert!(failed.raw_text.contains("element detached"));
    }

    #[test]
    fn annotation_sentinels() {
        assert_eq!(Annotation::Failed.as_text(), FAILED_ANNOTATION);
        assert_eq!(Annotation::Skipped.to_string(), SKIPPED_ANNOTATION);
        assert_eq!(Annotation::Generated("O(n)".into()).as_text(), "O(n)");
    }

    #[test]
    fn annotation_serializes_tagged() {
        let json = serde_json::to_string(&Annotation::Generated("O(1)".into())).unwrap();
        assert_eq!(json, r#"{"kind":"generated","text":"O(1)"}"#);
        let json = serde_json::to_string(&Annotation::Failed).unwrap();
        assert_eq!(json, r#"{"kind":"failed"}"#);
    }

    #[test]
    fn enrichment_mode_parsing() {
        assert_eq!("complexity".parse::<EnrichmentMode>(), Ok(EnrichmentMode::Complexity));
        assert_eq!("Convert".parse::<EnrichmentMode>(), Ok(EnrichmentMode::Convert));
        assert!("summarize".parse::<EnrichmentMode>().is_err());
    }
}
