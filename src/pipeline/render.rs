//! Renderer dispatch: turn diagram source into image bytes on disk.
//!
//! The backend seam is a trait object so an in-process rendering engine can
//! be injected through [`crate::config::ConversionConfig::renderer`] exactly
//! like the built-in HTTP backend; availability is resolved once into an
//! `Arc<dyn DiagramRenderer>` rather than checked through a mutable global.
//!
//! A backend produces bytes; [`render_to_file`] owns the filesystem side:
//! it rejects empty output, writes in one shot, and removes any partial
//! file on a failed write so no corrupt image is ever left behind.

use crate::config::{BackendKind, ConversionConfig, ImageFormat};
use crate::error::{BlockError, Mermaid2ImgError};
use crate::pipeline::classify::DiagramType;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// How many bytes of an HTTP error body are kept for diagnostics.
const ERROR_BODY_LIMIT: usize = 500;

/// A backend failure, before it is tied to a block index.
#[derive(Debug, Clone)]
pub enum RenderFailure {
    /// Non-2xx HTTP status; `body` is truncated for logging.
    HttpStatus { status: u16, body: String },
    /// Connection failure or timeout.
    Transport(String),
    /// The backend returned zero bytes.
    Empty,
    /// Any other backend-specific error.
    Backend(String),
}

impl RenderFailure {
    fn into_block_error(self, index: usize) -> BlockError {
        match self {
            RenderFailure::HttpStatus { status, .. } => BlockError::HttpStatus { index, status },
            RenderFailure::Transport(detail) => BlockError::HttpTransport { index, detail },
            RenderFailure::Empty => BlockError::EmptyOutput { index },
            RenderFailure::Backend(detail) => BlockError::BackendFailed { index, detail },
        }
    }
}

/// A pluggable diagram-rendering backend: diagram text in, image bytes out.
///
/// Implementations must never panic on malformed diagram source — a bad
/// diagram is a [`RenderFailure`], which the pipeline records per block.
#[async_trait]
pub trait DiagramRenderer: Send + Sync {
    /// Render the diagram source to image bytes in the requested format.
    async fn render(
        &self,
        diagram_type: DiagramType,
        source: &str,
        format: ImageFormat,
    ) -> Result<Vec<u8>, RenderFailure>;

    /// Short backend name for logs and summaries.
    fn name(&self) -> &str;
}

/// Resolve the configured backend into a renderer, once per conversion.
///
/// An injected [`ConversionConfig::renderer`] takes precedence over the
/// [`BackendKind`] discriminator.
pub fn resolve_renderer(
    config: &ConversionConfig,
) -> Result<Arc<dyn DiagramRenderer>, Mermaid2ImgError> {
    if let Some(ref renderer) = config.renderer {
        return Ok(Arc::clone(renderer));
    }
    match config.backend {
        BackendKind::Kroki => Ok(Arc::new(KrokiRenderer::new(
            &config.kroki_url,
            config.http_timeout_secs,
        )?)),
    }
}

/// Render one diagram and write the image to `path`.
///
/// On any failure — backend error, empty output, or a failed write — no file
/// is left at `path`; cleanup failures are logged, never escalated.
pub async fn render_to_file(
    renderer: &Arc<dyn DiagramRenderer>,
    index: usize,
    diagram_type: DiagramType,
    source: &str,
    format: ImageFormat,
    path: &Path,
) -> Result<(), BlockError> {
    let bytes = renderer
        .render(diagram_type, source, format)
        .await
        .map_err(|failure| failure.into_block_error(index))?;

    if bytes.is_empty() {
        return Err(BlockError::EmptyOutput { index });
    }

    if let Err(e) = tokio::fs::write(path, &bytes).await {
        remove_partial(path).await;
        return Err(BlockError::WriteFailed {
            index,
            path: path.to_path_buf(),
            detail: e.to_string(),
        });
    }

    debug!(
        "Diagram {}: wrote {} bytes to {}",
        index,
        bytes.len(),
        path.display()
    );
    Ok(())
}

/// Best-effort removal of a partially written image file.
async fn remove_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => warn!("Removed partial output file: {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove partial file {}: {e}", path.display()),
    }
}

// ── Kroki HTTP backend ───────────────────────────────────────────────────

/// HTTP backend: POSTs raw diagram text to a Kroki instance.
///
/// Endpoint: `POST {base_url}/mermaid/{svg|png}` with a plain-text body;
/// a 2xx response carries the image bytes verbatim.
pub struct KrokiRenderer {
    client: reqwest::Client,
    base_url: String,
}

impl KrokiRenderer {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, Mermaid2ImgError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Mermaid2ImgError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, format: ImageFormat) -> String {
        format!("{}/mermaid/{}", self.base_url, format.ext())
    }
}

#[async_trait]
impl DiagramRenderer for KrokiRenderer {
    async fn render(
        &self,
        _diagram_type: DiagramType,
        source: &str,
        format: ImageFormat,
    ) -> Result<Vec<u8>, RenderFailure> {
        let url = self.endpoint(format);
        debug!("POST {url}");

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(source.to_string())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RenderFailure::Transport(format!("timed out contacting {url}"))
                } else {
                    RenderFailure::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body = truncate_body(&body);
            error!("Kroki returned HTTP {status} for {url}: {body}");
            return Err(RenderFailure::HttpStatus {
                status: status.as_u16(),
                body: body.to_string(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RenderFailure::Transport(e.to_string()))?;

        if bytes.is_empty() {
            return Err(RenderFailure::Empty);
        }
        Ok(bytes.to_vec())
    }

    fn name(&self) -> &str {
        "kroki"
    }
}

/// Truncate an HTTP error body for diagnostics, respecting char boundaries.
fn truncate_body(body: &str) -> &str {
    if body.len() <= ERROR_BODY_LIMIT {
        return body;
    }
    let mut end = ERROR_BODY_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
