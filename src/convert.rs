//! Conversion entry points: the per-document pipeline orchestrator.
//!
//! One call processes one document, strictly sequentially: blocks are
//! rendered in document order so filename ordinals, statistics, and image
//! files are deterministic, and no two renders ever write into the image
//! directory concurrently. Per-block failures never abort the run — every
//! block is attempted and the rebuilt document always comes back complete.
//! Only input and environment errors (missing file, unreadable content,
//! image directory creation) are fatal.

use crate::config::ConversionConfig;
use crate::error::Mermaid2ImgError;
use crate::output::{BlockOutcome, ConversionOutput, ConversionStats};
use crate::pipeline::{classify, extract, name, rebuild, render};
use std::path::{Component, Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert one Markdown document's mermaid blocks to images.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input`  — path to a UTF-8 Markdown file
/// * `config` — conversion configuration
///
/// # Returns
/// `Ok(ConversionOutput)` whenever a rebuilt document could be produced,
/// even if some (or all) diagrams failed — check `output.stats.failed` or
/// use [`ConversionOutput::into_strict`].
///
/// # Errors
/// Returns `Err(Mermaid2ImgError)` only for fatal errors:
/// - Input file missing or unreadable as UTF-8
/// - Image directory cannot be created
pub async fn convert(
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Mermaid2ImgError> {
    let total_start = Instant::now();
    let input = input.as_ref();
    info!("Starting conversion: {}", input.display());

    // ── Step 1: Validate input path ──────────────────────────────────────
    if !input.is_file() {
        return Err(Mermaid2ImgError::FileNotFound {
            path: input.to_path_buf(),
        });
    }
    let input_path = input.canonicalize().unwrap_or_else(|_| input.to_path_buf());
    let output_path = output_path_for(&input_path, &config.output_suffix);

    // ── Step 2: Read document ────────────────────────────────────────────
    let content = tokio::fs::read_to_string(&input_path).await.map_err(|e| {
        Mermaid2ImgError::ReadFailed {
            path: input_path.clone(),
            reason: e.to_string(),
        }
    })?;

    // ── Step 3: Extract blocks ───────────────────────────────────────────
    let blocks = extract::extract_blocks(&content);
    let total = blocks.len();
    if blocks.is_empty() {
        info!("No mermaid diagrams found in {}", input_path.display());
        return Ok(ConversionOutput {
            input_path,
            output_path,
            content,
            image_dir: None,
            generated_images: Vec::new(),
            blocks: Vec::new(),
            stats: ConversionStats {
                total_duration_ms: total_start.elapsed().as_millis() as u64,
                ..Default::default()
            },
        });
    }
    info!("Found {total} mermaid diagram(s) in {}", input_path.display());

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(total);
    }

    // ── Step 4: Ensure image directory ───────────────────────────────────
    let doc_dir = input_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let image_dir = config
        .image_dir
        .clone()
        .unwrap_or_else(|| doc_dir.join("images"));
    tokio::fs::create_dir_all(&image_dir)
        .await
        .map_err(|e| Mermaid2ImgError::ImageDirFailed {
            path: image_dir.clone(),
            source: e,
        })?;
    let image_dir = image_dir.canonicalize().unwrap_or(image_dir);
    debug!("Using image directory: {}", image_dir.display());

    // ── Step 5: Resolve rendering backend ────────────────────────────────
    let renderer = render::resolve_renderer(config)?;
    debug!("Rendering backend: {}", renderer.name());

    // ── Step 6: Render blocks, strictly in document order ────────────────
    let mut outcomes: Vec<BlockOutcome> = Vec::with_capacity(total);
    let mut generated_images: Vec<PathBuf> = Vec::new();
    let mut render_duration_ms = 0u64;

    for (i, block) in blocks.iter().enumerate() {
        let index = i + 1;
        if let Some(ref cb) = config.progress_callback {
            cb.on_diagram_start(index, total);
        }

        let diagram_type = classify::classify(&block.text);
        let file_name = name::image_file_name(
            &config.image_prefix,
            index,
            &block.text,
            config.image_format,
        );
        let image_path = image_dir.join(&file_name);

        let render_start = Instant::now();
        let result = render::render_to_file(
            &renderer,
            index,
            diagram_type,
            &block.text,
            config.image_format,
            &image_path,
        )
        .await;
        let duration_ms = render_start.elapsed().as_millis() as u64;
        render_duration_ms += duration_ms;

        match result {
            Ok(()) => {
                let image_ref = relative_image_ref(&image_path, &doc_dir);
                info!("Diagram {index}/{total}: rendered {file_name} in {duration_ms}ms");
                if let Some(ref cb) = config.progress_callback {
                    cb.on_diagram_complete(index, total, &file_name);
                }
                generated_images.push(image_path.clone());
                outcomes.push(BlockOutcome::Converted {
                    index,
                    diagram_type: diagram_type.as_tag().to_string(),
                    image_path,
                    image_ref,
                    duration_ms,
                });
            }
            Err(error) => {
                warn!("Diagram {index}/{total}: {error}");
                if let Some(ref cb) = config.progress_callback {
                    cb.on_diagram_error(index, total, &error.to_string());
                }
                outcomes.push(BlockOutcome::Failed {
                    index,
                    diagram_type: diagram_type.as_tag().to_string(),
                    error,
                    duration_ms,
                });
            }
        }
    }

    // ── Step 7: Rebuild the document ─────────────────────────────────────
    let (new_content, replaced) = rebuild::rebuild_document(
        &content,
        &blocks,
        &outcomes,
        &config.styles,
        config.html_wrapper,
    );

    let successful = outcomes.iter().filter(|o| o.is_success()).count();
    let failed = total - successful;
    if replaced != successful {
        warn!("Mismatch: {successful} successful conversions vs {replaced} replacements");
    }

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(total, successful);
    }

    let stats = ConversionStats {
        total_diagrams: total,
        successful,
        failed,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        render_duration_ms,
    };
    info!(
        "Conversion complete: {successful}/{total} diagrams, {}ms total",
        stats.total_duration_ms
    );

    Ok(ConversionOutput {
        input_path,
        output_path,
        content: new_content,
        image_dir: Some(image_dir),
        generated_images,
        blocks: outcomes,
        stats,
    })
}

/// Convert a document and write the rebuilt Markdown to its output path.
///
/// The output path is `{stem}{output_suffix}.md` beside the input. Uses an
/// atomic write (temp file + rename) so a crash never leaves a truncated
/// document. The rebuilt content is written even on partial failure; strict
/// callers should call [`ConversionOutput::into_strict`] first.
pub async fn convert_to_file(
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Mermaid2ImgError> {
    let output = convert(input, config).await?;
    write_output(&output.output_path, &output.content).await?;
    info!("Wrote output file: {}", output.output_path.display());
    Ok(output)
}

/// Write rebuilt document content to `path` atomically (temp file + rename),
/// so a crash mid-write never leaves a truncated document at `path`.
pub async fn write_output(path: &Path, content: &str) -> Result<(), Mermaid2ImgError> {
    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, content)
        .await
        .map_err(|e| Mermaid2ImgError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Mermaid2ImgError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Mermaid2ImgError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Mermaid2ImgError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(convert(input, config))
}

/// Output Markdown path for an input document: `{stem}{suffix}.md` in the
/// input's directory.
pub fn output_path_for(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let file_name = format!("{stem}{suffix}.md");
    match input.parent() {
        Some(parent) => parent.join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// Delete generated image files (best-effort). Returns the number deleted.
///
/// Used by strict callers rolling back after a partial failure. Missing
/// files and deletion errors are logged, never escalated.
pub async fn rollback_images(image_paths: &[PathBuf]) -> usize {
    if image_paths.is_empty() {
        return 0;
    }
    warn!("Rolling back: deleting {} generated image(s)", image_paths.len());
    let mut deleted = 0;
    for path in image_paths {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                info!("Deleted image during rollback: {}", path.display());
                deleted += 1;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Image already gone during rollback: {}", path.display());
            }
            Err(e) => {
                warn!("Failed to delete {} during rollback: {e}", path.display());
            }
        }
    }
    deleted
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Reference string for an image as seen from the document's directory:
/// a forward-slash relative path where the two are relatable, otherwise a
/// `file://` URI.
fn relative_image_ref(image_path: &Path, doc_dir: &Path) -> String {
    match diff_paths(image_path, doc_dir) {
        Some(rel) => rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/"),
        None => {
            warn!(
                "Cannot relativise {} against {}; using file URI",
                image_path.display(),
                doc_dir.display()
            );
            format!("file://{}", image_path.display())
        }
    }
}

/// Relative path from `base` to `target`, walking up with `..` as needed.
///
/// Both paths must be absolute (or both relative); mixing the two, or
/// differing filesystem prefixes, yields `None`.
fn diff_paths(target: &Path, base: &Path) -> Option<PathBuf> {
    if target.is_absolute() != base.is_absolute() {
        return None;
    }

    let target_parts: Vec<Component<'_>> = target.components().collect();
    let base_parts: Vec<Component<'_>> = base.components().collect();

    // Windows drive prefixes must match to be relatable.
    if let (Some(Component::Prefix(t)), Some(Component::Prefix(b))) =
        (target_parts.first(), base_parts.first())
    {
        if t != b {
            return None;
        }
    }

    let common = target_parts
        .iter()
        .zip(&base_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..base_parts.len() {
        rel.push("..");
    }
    for part in &target_parts[common..] {
        rel.push(part.as_os_str());
    }
    if rel.as_os_str().is_empty() {
        rel.push(".");
    }
    Some(rel)
}
