//! Output types returned by the conversion pipeline.
//!
//! One [`ConversionOutput`] is produced per document. Per-diagram results are
//! kept as [`BlockOutcome`] values in document order so callers can see
//! exactly which diagrams converted and which were left in place, without
//! the pipeline ever aborting mid-document.

use crate::error::{BlockError, Mermaid2ImgError};
use serde::Serialize;
use std::path::PathBuf;

/// Result of one diagram block's render attempt, in document order.
///
/// The variant shape enforces the invariant that a relative image path
/// exists if and only if the render succeeded.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BlockOutcome {
    /// The diagram was rendered and its block replaced by an image reference.
    Converted {
        /// 1-based position of the block in the document.
        index: usize,
        /// Classified diagram type tag (e.g. `"sequence"`).
        diagram_type: String,
        /// Absolute path of the generated image file.
        image_path: PathBuf,
        /// Path as referenced from the rebuilt document (relative where
        /// possible, `file://` URI otherwise).
        image_ref: String,
        duration_ms: u64,
    },
    /// Rendering failed; the original block is kept in the document, flagged.
    Failed {
        index: usize,
        diagram_type: String,
        error: BlockError,
        duration_ms: u64,
    },
}

impl BlockOutcome {
    pub fn index(&self) -> usize {
        match self {
            BlockOutcome::Converted { index, .. } | BlockOutcome::Failed { index, .. } => *index,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BlockOutcome::Converted { .. })
    }

    /// Image reference string, present only for successful blocks.
    pub fn image_ref(&self) -> Option<&str> {
        match self {
            BlockOutcome::Converted { image_ref, .. } => Some(image_ref),
            BlockOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&BlockError> {
        match self {
            BlockOutcome::Failed { error, .. } => Some(error),
            BlockOutcome::Converted { .. } => None,
        }
    }
}

/// Aggregate counts and timing for one document conversion.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionStats {
    /// Number of fenced mermaid blocks found.
    pub total_diagrams: usize,
    /// Blocks rendered and replaced by image references.
    pub successful: usize,
    /// Blocks that failed and were kept as flagged source.
    pub failed: usize,
    /// Wall-clock time for the whole pipeline.
    pub total_duration_ms: u64,
    /// Time spent inside the rendering backend across all blocks.
    pub render_duration_ms: u64,
}

/// Complete result of converting one Markdown document.
///
/// Returned by [`crate::convert`]. The rebuilt `content` is always present —
/// failed blocks appear in it as flagged fenced source — and writing it to
/// disk is the caller's (or [`crate::convert_to_file`]'s) responsibility.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutput {
    /// Absolute path of the input document.
    pub input_path: PathBuf,
    /// Computed output path (`{stem}{suffix}.md` beside the input). Not
    /// written by [`crate::convert`]; see [`crate::convert_to_file`].
    pub output_path: PathBuf,
    /// The rebuilt document text.
    pub content: String,
    /// Image directory used, if any block was attempted.
    pub image_dir: Option<PathBuf>,
    /// Absolute paths of successfully generated images, in document order.
    pub generated_images: Vec<PathBuf>,
    /// Per-block outcomes in document order.
    pub blocks: Vec<BlockOutcome>,
    /// Aggregate counts and timing.
    pub stats: ConversionStats,
}

impl ConversionOutput {
    /// True iff no block failed (vacuously true for zero blocks).
    pub fn all_successful(&self) -> bool {
        self.stats.failed == 0
    }

    /// Strict verdict: treat any failed block as an error.
    ///
    /// Converts partial failure into [`Mermaid2ImgError::PartialFailure`];
    /// callers that tolerate partial output should read the fields directly
    /// instead.
    pub fn into_strict(self) -> Result<ConversionOutput, Mermaid2ImgError> {
        if self.all_successful() {
            Ok(self)
        } else {
            Err(Mermaid2ImgError::PartialFailure {
                success: self.stats.successful,
                failed: self.stats.failed,
                total: self.stats.total_diagrams,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output_with_counts(successful: usize, failed: usize) -> ConversionOutput {
        ConversionOutput {
            input_path: PathBuf::from("doc.md"),
            output_path: PathBuf::from("doc-img.md"),
            content: String::new(),
            image_dir: None,
            generated_images: vec![],
            blocks: vec![],
            stats: ConversionStats {
                total_diagrams: successful + failed,
                successful,
                failed,
                ..Default::default()
            },
        }
    }

    #[test]
    fn zero_blocks_counts_as_success() {
        assert!(output_with_counts(0, 0).all_successful());
    }

    #[test]
    fn into_strict_passes_full_success() {
        assert!(output_with_counts(3, 0).into_strict().is_ok());
    }

    #[test]
    fn into_strict_rejects_partial() {
        let err = output_with_counts(1, 2).into_strict().unwrap_err();
        match err {
            Mermaid2ImgError::PartialFailure {
                success,
                failed,
                total,
            } => {
                assert_eq!((success, failed, total), (1, 2, 3));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn outcome_accessors() {
        let ok = BlockOutcome::Converted {
            index: 1,
            diagram_type: "sequence".into(),
            image_path: PathBuf::from("/img/d-1-abc.svg"),
            image_ref: "images/d-1-abc.svg".into(),
            duration_ms: 12,
        };
        assert!(ok.is_success());
        assert_eq!(ok.image_ref(), Some("images/d-1-abc.svg"));
        assert!(ok.error().is_none());

        let failed = BlockOutcome::Failed {
            index: 2,
            diagram_type: "flowchart".into(),
            error: crate::error::BlockError::EmptyOutput { index: 2 },
            duration_ms: 3,
        };
        assert!(!failed.is_success());
        assert_eq!(failed.image_ref(), None);
        assert_eq!(failed.index(), 2);
    }
}
