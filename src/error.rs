//! Error types for the mermaid2img library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Mermaid2ImgError`] — **Fatal**: the conversion cannot proceed at all
//!   (missing input file, unreadable content, image directory cannot be
//!   created). Returned as `Err(Mermaid2ImgError)` from the top-level
//!   `convert*` functions.
//!
//! * [`BlockError`] — **Non-fatal**: a single diagram block failed (backend
//!   error, empty response, unwritable output file) but every other block is
//!   fine. Stored inside [`crate::output::BlockOutcome`] so callers can
//!   inspect partial success rather than losing the whole document to one
//!   bad diagram.
//!
//! The separation lets callers decide their own tolerance: treat any block
//! failure as fatal via [`crate::output::ConversionOutput::into_strict`],
//! or keep the partially converted document and report the failed blocks.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the mermaid2img library.
///
/// Per-block failures use [`BlockError`] and are stored in
/// [`crate::output::BlockOutcome`] rather than propagated here.
#[derive(Debug, Error)]
pub enum Mermaid2ImgError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Markdown file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// The input exists but could not be read as UTF-8 text.
    #[error("Failed to read markdown file '{path}': {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    // ── Environment errors ────────────────────────────────────────────────
    /// Could not create the image output directory.
    #[error("Failed to create image directory '{path}': {source}")]
    ImageDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the output Markdown file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Conversion verdicts ───────────────────────────────────────────────
    /// Some blocks converted but at least one failed.
    ///
    /// Returned by [`crate::output::ConversionOutput::into_strict`] when
    /// the caller wants to treat any block failure as an error.
    #[error("{failed}/{total} diagrams failed to convert")]
    PartialFailure {
        success: usize,
        failed: usize,
        total: usize,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single diagram block.
///
/// Stored in [`crate::output::BlockOutcome::Failed`] when a block fails.
/// The overall conversion always runs to completion; failed blocks are kept
/// in the rebuilt document as flagged fenced code.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum BlockError {
    /// The rendering backend reported an error for this diagram.
    #[error("Diagram {index}: backend error: {detail}")]
    BackendFailed { index: usize, detail: String },

    /// HTTP backend returned a non-2xx status.
    #[error("Diagram {index}: HTTP {status} from rendering service")]
    HttpStatus { index: usize, status: u16 },

    /// HTTP request timed out or the connection failed.
    #[error("Diagram {index}: request failed: {detail}")]
    HttpTransport { index: usize, detail: String },

    /// The backend succeeded but produced no bytes.
    #[error("Diagram {index}: backend returned an empty image")]
    EmptyOutput { index: usize },

    /// Image bytes could not be written to disk.
    #[error("Diagram {index}: failed to write '{path}': {detail}")]
    WriteFailed {
        index: usize,
        path: PathBuf,
        detail: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_failure_display() {
        let e = Mermaid2ImgError::PartialFailure {
            success: 2,
            failed: 1,
            total: 3,
        };
        let msg = e.to_string();
        assert!(msg.contains("1/3"), "got: {msg}");
    }

    #[test]
    fn file_not_found_display() {
        let e = Mermaid2ImgError::FileNotFound {
            path: PathBuf::from("/tmp/missing.md"),
        };
        assert!(e.to_string().contains("missing.md"));
    }

    #[test]
    fn block_error_display() {
        let e = BlockError::HttpStatus {
            index: 2,
            status: 503,
        };
        assert!(e.to_string().contains("503"));
        assert!(e.to_string().contains("Diagram 2"));
    }

    #[test]
    fn empty_output_display() {
        let e = BlockError::EmptyOutput { index: 1 };
        assert!(e.to_string().contains("empty image"));
    }
}
