//! Block location: find fenced ```` ```mermaid ```` blocks in raw Markdown.
//!
//! Offsets are byte positions into the *original* document and are computed
//! exactly once here. The rebuild stage later splices replacements using
//! these frozen offsets plus a running delta — it never re-scans the mutated
//! string, so the extraction order (ascending start offset, which regex scan
//! order guarantees) is load-bearing.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// One fenced mermaid block located in a document.
///
/// `text` is the trimmed diagram source with the fence markers excluded;
/// `start`/`end` are byte offsets of the full fenced region (markers
/// included) in the original document. Immutable once extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramBlock {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

// Non-greedy, newline-inclusive: the body may contain blank lines and the
// match stops at the first closing fence, so blocks cannot nest.
static RE_MERMAID_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```mermaid\s+(.*?)```").unwrap());

/// Extract every fenced mermaid block, in ascending start-offset order.
///
/// An empty document, or one without mermaid fences, yields an empty vector.
pub fn extract_blocks(content: &str) -> Vec<DiagramBlock> {
    RE_MERMAID_FENCE
        .captures_iter(content)
        .map(|caps| {
            let whole = caps.get(0).unwrap();
            let block = DiagramBlock {
                text: caps[1].trim().to_string(),
                start: whole.start(),
                end: whole.end(),
            };
            debug!("Found mermaid block at {}..{}", block.start, block.end);
            block
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_no_blocks() {
        assert!(extract_blocks("").is_empty());
        assert!(extract_blocks("# Title\n\nplain text\n").is_empty());
    }

    #[test]
    fn single_block_offsets_cover_fences() {
        let doc = "# T\n\n```mermaid\ngraph TD\nA-->B\n```\n";
        let blocks = extract_blocks(doc);
        assert_eq!(blocks.len(), 1);
        let b = &blocks[0];
        assert_eq!(b.text, "graph TD\nA-->B");
        assert_eq!(&doc[b.start..b.end], "```mermaid\ngraph TD\nA-->B\n```");
    }

    #[test]
    fn body_may_contain_blank_lines() {
        let doc = "```mermaid\nsequenceDiagram\n\nA->>B: hi\n\n```";
        let blocks = extract_blocks(doc);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "sequenceDiagram\n\nA->>B: hi");
    }

    #[test]
    fn non_greedy_stops_at_first_closing_fence() {
        let doc = "```mermaid\ngraph TD\n```\ntext\n```mermaid\npie\n```\n";
        let blocks = extract_blocks(doc);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text, "graph TD");
        assert_eq!(blocks[1].text, "pie");
        assert!(blocks[0].start < blocks[1].start);
    }

    #[test]
    fn other_fences_are_ignored() {
        let doc = "```rust\nfn main() {}\n```\n\n```mermaid\ngantt\n```\n";
        let blocks = extract_blocks(doc);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "gantt");
    }

    #[test]
    fn ascending_start_order() {
        let doc = "```mermaid\na\n```\nx\n```mermaid\nb\n```\nx\n```mermaid\nc\n```";
        let blocks = extract_blocks(doc);
        let starts: Vec<usize> = blocks.iter().map(|b| b.start).collect();
        let mut sorted = starts.clone();
        sorted.sort_unstable();
        assert_eq!(starts, sorted);
    }
}
