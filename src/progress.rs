//! Progress-callback trait for per-diagram conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline renders each diagram block.
//!
//! Callbacks are the least-invasive integration point: callers can forward
//! events to a terminal progress bar, a GUI status line, or a log record
//! without the library knowing anything about how the host application
//! communicates. Diagrams are processed strictly in sequence, so events for
//! one document always arrive in order; the trait is still `Send + Sync`
//! because hosts commonly run the pipeline on a background task.

use std::sync::Arc;

/// Called by the conversion pipeline as it processes each diagram block.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after block extraction, before any render attempt.
    fn on_conversion_start(&self, total_diagrams: usize) {
        let _ = total_diagrams;
    }

    /// Called just before a diagram is dispatched to the backend.
    ///
    /// `index` is 1-based document order.
    fn on_diagram_start(&self, index: usize, total: usize) {
        let _ = (index, total);
    }

    /// Called when a diagram was rendered and its image file written.
    fn on_diagram_complete(&self, index: usize, total: usize, file_name: &str) {
        let _ = (index, total, file_name);
    }

    /// Called when a diagram failed; the original block will be kept.
    fn on_diagram_error(&self, index: usize, total: usize, error: &str) {
        let _ = (index, total, error);
    }

    /// Called once after every block has been attempted.
    fn on_conversion_complete(&self, total_diagrams: usize, success_count: usize) {
        let _ = (total_diagrams, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
