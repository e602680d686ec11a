//! Filename synthesis for generated images.
//!
//! Names are `{sanitized-prefix}-{index}-{hash8}.{ext}`: the 1-based index
//! keeps names readable in document order, while the 8-hex content hash
//! keeps identical diagrams at different indices distinguishable and makes
//! re-runs produce stable names for unchanged diagrams.

use crate::config::ImageFormat;
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

/// Fallback when sanitisation strips the entire prefix.
const DEFAULT_PREFIX: &str = "diagram";

// Everything except word characters, hyphens, and dots is dropped.
static RE_UNSAFE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w.-]+").unwrap());

/// Synthesize a deterministic, filesystem-safe image filename.
///
/// The hash covers the exact (trimmed) diagram source, so changing any of
/// prefix, index, source, or format changes the name.
pub fn image_file_name(
    prefix: &str,
    index: usize,
    source: &str,
    format: ImageFormat,
) -> String {
    let safe_prefix = sanitize_prefix(prefix);
    let hash = content_hash(source);
    format!("{safe_prefix}-{index}-{hash}.{}", format.ext())
}

/// Strip everything except `[\w.-]`; empty results fall back to `"diagram"`.
fn sanitize_prefix(prefix: &str) -> String {
    let safe = RE_UNSAFE.replace_all(prefix, "").to_string();
    if safe.is_empty() {
        DEFAULT_PREFIX.to_string()
    } else {
        safe
    }
}

/// First 8 lowercase hex chars of the sha-256 of the diagram source.
fn content_hash(source: &str) -> String {
    let digest = Sha256::digest(source.as_bytes());
    // 4 bytes → 8 hex chars
    digest[..4].iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_shape() {
        let name = image_file_name("diagram", 1, "graph TD\nA-->B", ImageFormat::Svg);
        let parts: Vec<&str> = name.splitn(2, '.').collect();
        assert_eq!(parts[1], "svg");
        assert!(name.starts_with("diagram-1-"));
        let hash = name
            .strip_prefix("diagram-1-")
            .unwrap()
            .strip_suffix(".svg")
            .unwrap();
        assert_eq!(hash.len(), 8);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn deterministic_across_calls() {
        let a = image_file_name("p", 2, "pie\n\"x\": 1", ImageFormat::Png);
        let b = image_file_name("p", 2, "pie\n\"x\": 1", ImageFormat::Png);
        assert_eq!(a, b);
    }

    #[test]
    fn any_input_change_changes_the_name() {
        let base = image_file_name("p", 1, "graph TD", ImageFormat::Svg);
        assert_ne!(base, image_file_name("q", 1, "graph TD", ImageFormat::Svg));
        assert_ne!(base, image_file_name("p", 2, "graph TD", ImageFormat::Svg));
        assert_ne!(base, image_file_name("p", 1, "graph LR", ImageFormat::Svg));
        assert_ne!(base, image_file_name("p", 1, "graph TD", ImageFormat::Png));
    }

    #[test]
    fn same_diagram_different_index_still_distinct() {
        let a = image_file_name("d", 1, "gantt", ImageFormat::Svg);
        let b = image_file_name("d", 2, "gantt", ImageFormat::Svg);
        assert_ne!(a, b);
        // Hash part is identical; only the ordinal differs.
        assert_eq!(a.rsplit('-').next(), b.rsplit('-').next());
    }

    #[test]
    fn prefix_sanitisation() {
        assert_eq!(sanitize_prefix("my diagram!"), "mydiagram");
        assert_eq!(sanitize_prefix("arch-v1.2"), "arch-v1.2");
        assert_eq!(sanitize_prefix("päge"), "päge"); // \w is unicode-aware
        assert_eq!(sanitize_prefix("!!!"), "diagram");
        assert_eq!(sanitize_prefix(""), "diagram");
    }
}
