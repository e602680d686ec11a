//! Pipeline stages for Markdown-to-image conversion.
//!
//! Each submodule implements exactly one transformation step. Keeping
//! stages separate makes each independently testable and lets us swap
//! implementations (e.g. a different rendering backend) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! document ──▶ extract ──▶ classify ──▶ name ──▶ render ──▶ rebuild
//! (raw text)   (blocks)    (type tag)   (file)   (image)    (splice)
//! ```
//!
//! 1. [`extract`]  — locate fenced mermaid blocks with byte offsets into
//!    the original document
//! 2. [`classify`] — heuristic diagram-type tag from the first significant
//!    line (styling only, never a validator)
//! 3. [`name`]     — deterministic collision-resistant image filename
//! 4. [`render`]   — dispatch to a backend and write image bytes; the only
//!    stage with network I/O
//! 5. [`rebuild`]  — splice replacements into the original text with
//!    cumulative offset tracking

pub mod classify;
pub mod extract;
pub mod name;
pub mod rebuild;
pub mod render;
