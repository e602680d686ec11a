//! Document rebuilding: splice render outcomes back into the original text.
//!
//! Block spans were computed once against the immutable original document.
//! Each substitution changes the total length, so the splice position of
//! every later block is its original span shifted by the running delta of
//! all earlier replacements. The delta accumulation is load-bearing: spans
//! are never recomputed against the mutating string.

use crate::config::DiagramStyles;
use crate::output::BlockOutcome;
use crate::pipeline::extract::DiagramBlock;
use tracing::warn;

/// Marker inserted above a block whose conversion failed. Visible in the
/// rendered document so authors can spot unconverted diagrams; the failure
/// detail itself goes to the log, not inline.
const FAILURE_MARKER: &str = "<!-- mermaid2img: conversion failed, original diagram kept -->";

/// Replace each block span with its outcome's rendering, in document order.
///
/// `blocks` and `outcomes` must be parallel (same length, same order).
/// Returns the rebuilt text and the number of successful replacements.
/// Every byte outside the matched spans is preserved; the output length is
/// the input length plus the sum of per-block length differences.
pub fn rebuild_document(
    original: &str,
    blocks: &[DiagramBlock],
    outcomes: &[BlockOutcome],
    styles: &DiagramStyles,
    html_wrapper: bool,
) -> (String, usize) {
    debug_assert_eq!(blocks.len(), outcomes.len());

    let mut content = original.to_string();
    let mut delta: isize = 0;
    let mut successful = 0usize;

    for (block, outcome) in blocks.iter().zip(outcomes) {
        let replacement = match outcome {
            BlockOutcome::Converted {
                diagram_type,
                image_ref,
                ..
            } => {
                successful += 1;
                image_reference(diagram_type, image_ref, styles, html_wrapper)
            }
            BlockOutcome::Failed { index, .. } => {
                warn!("Keeping original code block {index} after render failure");
                flagged_original(&block.text)
            }
        };

        let adj_start = (block.start as isize + delta) as usize;
        let adj_end = (block.end as isize + delta) as usize;
        content.replace_range(adj_start..adj_end, &replacement);
        delta += replacement.len() as isize - (block.end - block.start) as isize;
    }

    (content, successful)
}

/// Image reference for a successful block: an HTML `<div><img>` wrapper
/// (SVG only, width-constrained per style config, centred) or plain
/// Markdown image syntax.
fn image_reference(
    diagram_type: &str,
    image_ref: &str,
    styles: &DiagramStyles,
    html_wrapper: bool,
) -> String {
    let alt = format!("Mermaid Diagram: {diagram_type}");
    let is_svg = image_ref.to_ascii_lowercase().ends_with(".svg");

    if html_wrapper && is_svg {
        let style = styles.for_type(diagram_type);
        let max_width = style.max_width.as_deref().unwrap_or("600px");
        format!(
            "\n\n<div style=\"max-width: {max_width}; margin: 1em auto; text-align: center;\">\n    \
             <img src=\"{image_ref}\" alt=\"{alt}\" style=\"max-width: 100%; height: auto; display: block; margin: 0 auto;\" />\n\
             </div>\n\n"
        )
    } else {
        format!("\n\n![{alt}]({image_ref})\n\n")
    }
}

/// Re-fence the original diagram source, preceded by the failure marker.
fn flagged_original(text: &str) -> String {
    format!("\n\n{FAILURE_MARKER}\n```mermaid\n{}\n```\n", text.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BlockError;
    use crate::pipeline::extract::extract_blocks;
    use std::path::PathBuf;

    fn converted(index: usize, tag: &str, image_ref: &str) -> BlockOutcome {
        BlockOutcome::Converted {
            index,
            diagram_type: tag.to_string(),
            image_path: PathBuf::from(format!("/abs/{image_ref}")),
            image_ref: image_ref.to_string(),
            duration_ms: 0,
        }
    }

    fn failed(index: usize, tag: &str) -> BlockOutcome {
        BlockOutcome::Failed {
            index,
            diagram_type: tag.to_string(),
            error: BlockError::EmptyOutput { index },
            duration_ms: 0,
        }
    }

    // Forward reconstruction without the delta bookkeeping: original bytes up
    // to each span, the span's replacement, then the tail after the last span.
    // Equality against this proves both halves of the splice invariant at
    // once: output length = input length + Σ(replacement − span), and every
    // byte outside the spans preserved verbatim.
    fn forward_splice(
        original: &str,
        blocks: &[DiagramBlock],
        outcomes: &[BlockOutcome],
        styles: &DiagramStyles,
        html_wrapper: bool,
    ) -> String {
        let mut expected = String::new();
        let mut cursor = 0;
        for (block, outcome) in blocks.iter().zip(outcomes) {
            expected.push_str(&original[cursor..block.start]);
            match outcome {
                BlockOutcome::Converted {
                    diagram_type,
                    image_ref,
                    ..
                } => expected.push_str(&image_reference(
                    diagram_type,
                    image_ref,
                    styles,
                    html_wrapper,
                )),
                BlockOutcome::Failed { .. } => expected.push_str(&flagged_original(&block.text)),
            }
            cursor = block.end;
        }
        expected.push_str(&original[cursor..]);
        expected
    }

    fn assert_exact_splice(
        original: &str,
        blocks: &[DiagramBlock],
        outcomes: &[BlockOutcome],
        styles: &DiagramStyles,
        html_wrapper: bool,
        rebuilt: &str,
    ) {
        let expected = forward_splice(original, blocks, outcomes, styles, html_wrapper);
        assert_eq!(rebuilt, expected);
        let span_sum: usize = blocks.iter().map(|b| b.end - b.start).sum();
        let repl_sum: usize = expected.len() + span_sum - original.len();
        assert_eq!(
            rebuilt.len() as isize,
            original.len() as isize + repl_sum as isize - span_sum as isize
        );
    }

    #[test]
    fn success_replaces_block_with_html_wrapper() {
        let doc = "# T\n\n```mermaid\ngraph TD\nA-->B\n```\n";
        let blocks = extract_blocks(doc);
        let outcomes = vec![converted(1, "flowchart", "images/d-1-abcd1234.svg")];
        let (out, n) =
            rebuild_document(doc, &blocks, &outcomes, &DiagramStyles::defaults(), true);

        assert_eq!(n, 1);
        assert!(!out.contains("```mermaid"));
        assert!(out.contains("<img src=\"images/d-1-abcd1234.svg\""));
        assert!(out.contains("max-width: 650px")); // flowchart entry
        assert!(out.contains("alt=\"Mermaid Diagram: flowchart\""));
        assert!(out.starts_with("# T\n"));
    }

    #[test]
    fn markdown_style_emits_plain_image() {
        let doc = "```mermaid\npie\n```";
        let blocks = extract_blocks(doc);
        let outcomes = vec![converted(1, "pie", "images/d-1-ffff0000.svg")];
        let (out, _) =
            rebuild_document(doc, &blocks, &outcomes, &DiagramStyles::defaults(), false);
        assert!(out.contains("![Mermaid Diagram: pie](images/d-1-ffff0000.svg)"));
        assert!(!out.contains("<div"));
    }

    #[test]
    fn png_never_gets_html_wrapper() {
        let doc = "```mermaid\npie\n```";
        let blocks = extract_blocks(doc);
        let outcomes = vec![converted(1, "pie", "images/d-1-ffff0000.png")];
        let (out, _) =
            rebuild_document(doc, &blocks, &outcomes, &DiagramStyles::defaults(), true);
        assert!(out.contains("![Mermaid Diagram: pie](images/d-1-ffff0000.png)"));
        assert!(!out.contains("<div"));
    }

    #[test]
    fn failure_keeps_flagged_original() {
        let doc = "intro\n\n```mermaid\ngraph TD\nA-->B\n```\n\noutro\n";
        let blocks = extract_blocks(doc);
        let outcomes = vec![failed(1, "flowchart")];
        let (out, n) =
            rebuild_document(doc, &blocks, &outcomes, &DiagramStyles::defaults(), true);

        assert_eq!(n, 0);
        assert!(out.contains(FAILURE_MARKER));
        assert!(out.contains("```mermaid\ngraph TD\nA-->B\n```"));
        assert!(out.contains("intro"));
        assert!(out.contains("outro"));
    }

    #[test]
    fn mixed_outcomes_preserve_document_order() {
        let doc = "a\n\n```mermaid\ngraph TD\n```\n\nb\n\n```mermaid\npie\n```\n\nc\n";
        let blocks = extract_blocks(doc);
        let outcomes = vec![
            converted(1, "flowchart", "images/d-1-11111111.svg"),
            failed(2, "pie"),
        ];
        let styles = DiagramStyles::defaults();
        let (out, n) = rebuild_document(doc, &blocks, &outcomes, &styles, true);

        assert_eq!(n, 1);
        let img_pos = out.find("d-1-11111111.svg").unwrap();
        let marker_pos = out.find(FAILURE_MARKER).unwrap();
        assert!(img_pos < marker_pos, "image must precede flagged block");
        assert_exact_splice(doc, &blocks, &outcomes, &styles, true, &out);
    }

    #[test]
    fn cascading_offsets_stay_correct_over_many_blocks() {
        // Three blocks with replacements both longer and shorter than the
        // originals; the final block's splice position depends on both
        // earlier deltas.
        let doc = "\
# Doc

```mermaid
sequenceDiagram
A->>B: hello
B->>A: world
```

middle one

```mermaid
pie
```

```mermaid
gantt
title X
```

tail text
";
        let blocks = extract_blocks(doc);
        assert_eq!(blocks.len(), 3);
        let outcomes = vec![
            converted(1, "sequence", "images/d-1-aaaaaaaa.svg"),
            failed(2, "pie"),
            converted(3, "gantt", "images/d-3-cccccccc.svg"),
        ];
        let styles = DiagramStyles::defaults();
        let (out, n) = rebuild_document(doc, &blocks, &outcomes, &styles, true);

        assert_eq!(n, 2);
        assert!(out.contains("middle one"));
        assert!(out.contains("tail text"));
        assert!(out.contains("d-1-aaaaaaaa.svg"));
        assert!(out.contains("```mermaid\npie\n```"));
        assert!(out.contains("d-3-cccccccc.svg"));
        // The only surviving fence is the failed one.
        assert_eq!(out.matches("```mermaid").count(), 1);
        assert_exact_splice(doc, &blocks, &outcomes, &styles, true, &out);
    }

    #[test]
    fn all_failure_mix_still_splices_exactly() {
        let doc = "a\n\n```mermaid\ngraph TD\n```\n\nb\n\n```mermaid\npie\n```\n\nc\n";
        let blocks = extract_blocks(doc);
        let outcomes = vec![failed(1, "flowchart"), failed(2, "pie")];
        let styles = DiagramStyles::defaults();
        let (out, n) = rebuild_document(doc, &blocks, &outcomes, &styles, true);

        assert_eq!(n, 0);
        assert_exact_splice(doc, &blocks, &outcomes, &styles, true, &out);
    }

    #[test]
    fn no_blocks_is_identity() {
        let doc = "# Just prose\n\nNothing to do.\n";
        let (out, n) =
            rebuild_document(doc, &[], &[], &DiagramStyles::defaults(), true);
        assert_eq!(out, doc);
        assert_eq!(n, 0);
    }

    #[test]
    fn unknown_type_uses_default_width() {
        let doc = "```mermaid\nmindmap\n```";
        let blocks = extract_blocks(doc);
        let outcomes = vec![converted(1, "mindmap", "m.svg")];
        let (out, _) =
            rebuild_document(doc, &blocks, &outcomes, &DiagramStyles::defaults(), true);
        assert!(out.contains("max-width: 600px"));
    }
}
