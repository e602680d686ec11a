//! # mermaid2img
//!
//! Convert Mermaid code blocks embedded in Markdown documents into
//! standalone image files (SVG/PNG), rewriting the Markdown to reference
//! the generated images.
//!
//! ## Why this crate?
//!
//! Mermaid diagrams render beautifully on GitHub and in a handful of
//! editors — and nowhere else. Wikis, static-site generators, PDF export
//! chains, and most corporate Markdown viewers show the raw fenced source
//! instead. This crate renders each ` ```mermaid ` block to an image once,
//! at authoring time, and splices an image reference into the document so
//! it displays everywhere.
//!
//! ## Pipeline Overview
//!
//! ```text
//! document.md
//!  │
//!  ├─ 1. Extract   locate ```mermaid fences with original byte offsets
//!  ├─ 2. Classify  diagram type tag from the first significant line
//!  ├─ 3. Name      {prefix}-{index}-{hash8}.{svg|png}
//!  ├─ 4. Render    Kroki HTTP backend or an injected engine, in sequence
//!  └─ 5. Rebuild   splice image refs (or flagged originals) back in,
//!                  carrying a running offset delta
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mermaid2img::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .kroki_url("http://localhost:8000")
//!         .build()?;
//!     let output = convert("report.md", &config).await?;
//!     println!("{}", output.content);
//!     eprintln!(
//!         "diagrams: {} converted / {} failed",
//!         output.stats.successful, output.stats.failed
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Failure model
//!
//! A single bad diagram never loses the document: failed blocks stay in the
//! rebuilt output as flagged fenced source, and the verdict lives in
//! [`ConversionStats`]. Only missing/unreadable input and an uncreatable
//! image directory are fatal. Strict callers can convert any per-block
//! failure into an error with [`ConversionOutput::into_strict`].
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `mermaid2img` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! mermaid2img = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    BackendKind, ConversionConfig, ConversionConfigBuilder, DiagramStyle, DiagramStyles,
    ImageFormat,
};
pub use convert::{
    convert, convert_sync, convert_to_file, output_path_for, rollback_images, write_output,
};
pub use error::{BlockError, Mermaid2ImgError};
pub use output::{BlockOutcome, ConversionOutput, ConversionStats};
pub use pipeline::classify::DiagramType;
pub use pipeline::extract::DiagramBlock;
pub use pipeline::render::{DiagramRenderer, KrokiRenderer, RenderFailure};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
