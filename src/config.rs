//! Configuration types for Markdown-to-image conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across threads, serialise them for logging, and
//! diff two runs to understand why their outputs differ.
//!
//! Diagram styling hints live in [`DiagramStyles`], a typed map from diagram
//! type tag to sizing fields with a `default` fallback entry. A style file is
//! merged over the compiled-in defaults per diagram-type key; a missing or
//! malformed file never fails the conversion.

use crate::error::Mermaid2ImgError;
use crate::pipeline::render::DiagramRenderer;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Output image format produced by the rendering backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// Scalable Vector Graphics (default).
    #[default]
    Svg,
    /// Portable Network Graphics.
    Png,
}

impl ImageFormat {
    /// File extension (and Kroki endpoint segment) for this format.
    pub fn ext(self) -> &'static str {
        match self {
            ImageFormat::Svg => "svg",
            ImageFormat::Png => "png",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ext())
    }
}

/// Which rendering backend to dispatch diagrams to.
///
/// An injected [`DiagramRenderer`] on [`ConversionConfig::renderer`] takes
/// precedence over this discriminator, mirroring how a pre-built provider
/// overrides provider-name resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// HTTP round-trip to a Kroki instance (`POST {base}/mermaid/{format}`).
    #[default]
    Kroki,
}

/// Configuration for one Markdown document conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use mermaid2img::{ConversionConfig, ImageFormat};
///
/// let config = ConversionConfig::builder()
///     .image_format(ImageFormat::Png)
///     .image_prefix("arch")
///     .kroki_url("http://localhost:8000")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Output image format. Default: [`ImageFormat::Svg`].
    pub image_format: ImageFormat,

    /// Prefix for generated image filenames
    /// (`{prefix}-{index}-{hash8}.{ext}`). Default: `"diagram"`.
    ///
    /// Sanitised at filename-synthesis time; characters outside `[\w.-]`
    /// are stripped and an empty remainder falls back to `"diagram"`.
    pub image_prefix: String,

    /// Directory for generated images. `None` creates an `images/`
    /// subdirectory beside the input document. Default: `None`.
    pub image_dir: Option<PathBuf>,

    /// Wrap successful SVG replacements in a centred HTML `<div><img>` block
    /// with a `max-width` taken from [`DiagramStyles`]. When `false`, plain
    /// Markdown image syntax `![alt](path)` is emitted instead. Default: true.
    ///
    /// The HTML wrapper renders better on wide pages; plain Markdown survives
    /// strict renderers that strip inline HTML.
    pub html_wrapper: bool,

    /// Backend discriminator used when no [`Self::renderer`] is injected.
    pub backend: BackendKind,

    /// Base URL of the Kroki instance. Default: `http://localhost:8000`.
    pub kroki_url: String,

    /// Per-diagram HTTP timeout in seconds. Default: 30.
    ///
    /// Kroki renders small diagrams in well under a second; 30 s only trips
    /// on a hung service or a dead network, where failing the block beats
    /// stalling the whole document.
    pub http_timeout_secs: u64,

    /// Suffix appended to the input file stem when computing the output
    /// Markdown path (`report.md` → `report-img.md`). Default: `"-img"`.
    pub output_suffix: String,

    /// Per-diagram-type styling hints, with a `default` fallback entry.
    pub styles: DiagramStyles,

    /// Pre-constructed rendering backend. Takes precedence over
    /// [`Self::backend`]. Useful for in-process engines and for tests.
    pub renderer: Option<Arc<dyn DiagramRenderer>>,

    /// Optional per-diagram progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            image_format: ImageFormat::Svg,
            image_prefix: "diagram".to_string(),
            image_dir: None,
            html_wrapper: true,
            backend: BackendKind::Kroki,
            kroki_url: "http://localhost:8000".to_string(),
            http_timeout_secs: 30,
            output_suffix: "-img".to_string(),
            styles: DiagramStyles::defaults(),
            renderer: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("image_format", &self.image_format)
            .field("image_prefix", &self.image_prefix)
            .field("image_dir", &self.image_dir)
            .field("html_wrapper", &self.html_wrapper)
            .field("backend", &self.backend)
            .field("kroki_url", &self.kroki_url)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("output_suffix", &self.output_suffix)
            .field("renderer", &self.renderer.as_ref().map(|_| "<dyn DiagramRenderer>"))
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn image_format(mut self, format: ImageFormat) -> Self {
        self.config.image_format = format;
        self
    }

    pub fn image_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.image_prefix = prefix.into();
        self
    }

    pub fn image_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.image_dir = Some(dir.into());
        self
    }

    pub fn html_wrapper(mut self, v: bool) -> Self {
        self.config.html_wrapper = v;
        self
    }

    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.config.backend = backend;
        self
    }

    pub fn kroki_url(mut self, url: impl Into<String>) -> Self {
        self.config.kroki_url = url.into();
        self
    }

    pub fn http_timeout_secs(mut self, secs: u64) -> Self {
        self.config.http_timeout_secs = secs.max(1);
        self
    }

    pub fn output_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.output_suffix = suffix.into();
        self
    }

    pub fn styles(mut self, styles: DiagramStyles) -> Self {
        self.config.styles = styles;
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn DiagramRenderer>) -> Self {
        self.config.renderer = Some(renderer);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Mermaid2ImgError> {
        let c = &self.config;
        if c.kroki_url.trim().is_empty() {
            return Err(Mermaid2ImgError::InvalidConfig(
                "Kroki URL must not be empty".into(),
            ));
        }
        if c.http_timeout_secs == 0 {
            return Err(Mermaid2ImgError::InvalidConfig(
                "HTTP timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Diagram styling ──────────────────────────────────────────────────────

/// Sizing hints for one diagram type. All fields optional; CSS length
/// strings such as `"600px"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramStyle {
    pub max_width: Option<String>,
    pub max_height: Option<String>,
    pub min_width: Option<String>,
}

impl DiagramStyle {
    fn new(max_width: &str, max_height: Option<&str>, min_width: Option<&str>) -> Self {
        Self {
            max_width: Some(max_width.to_string()),
            max_height: max_height.map(str::to_string),
            min_width: min_width.map(str::to_string),
        }
    }

    /// Overlay `other` on `self`: fields set in `other` win.
    fn merged_with(&self, other: &DiagramStyle) -> DiagramStyle {
        DiagramStyle {
            max_width: other.max_width.clone().or_else(|| self.max_width.clone()),
            max_height: other.max_height.clone().or_else(|| self.max_height.clone()),
            min_width: other.min_width.clone().or_else(|| self.min_width.clone()),
        }
    }
}

/// Styling hints per diagram type tag, with a `default` fallback entry.
///
/// Serialises as a flat JSON object:
/// ```json
/// { "default": { "max_width": "600px" },
///   "sequence": { "max_width": "550px", "min_width": "250px" } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiagramStyles {
    entries: BTreeMap<String, DiagramStyle>,
}

impl Default for DiagramStyles {
    fn default() -> Self {
        Self::defaults()
    }
}

impl DiagramStyles {
    /// Compiled-in style table.
    pub fn defaults() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert("default".into(), DiagramStyle::new("600px", None, None));
        entries.insert(
            "flowchart".into(),
            DiagramStyle::new("650px", None, Some("300px")),
        );
        entries.insert(
            "sequence".into(),
            DiagramStyle::new("550px", None, Some("250px")),
        );
        entries.insert(
            "classdiagram".into(),
            DiagramStyle::new("600px", None, Some("300px")),
        );
        entries.insert(
            "statediagram".into(),
            DiagramStyle::new("550px", None, Some("250px")),
        );
        entries.insert(
            "erdiagram".into(),
            DiagramStyle::new("700px", None, Some("400px")),
        );
        entries.insert(
            "gantt".into(),
            DiagramStyle::new("800px", None, Some("500px")),
        );
        entries.insert(
            "pie".into(),
            DiagramStyle::new("450px", Some("450px"), Some("300px")),
        );
        Self { entries }
    }

    /// Load styles from a JSON file and merge them over the defaults.
    ///
    /// Precedence: file entries override compiled-in defaults per
    /// diagram-type key, field by field. A missing or malformed file is
    /// logged and the defaults are returned; styling is advisory and must
    /// never fail a conversion.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                info!("Style config not readable at {}: {e}; using defaults", path.display());
                return Self::defaults();
            }
        };
        match serde_json::from_str::<BTreeMap<String, DiagramStyle>>(&raw) {
            Ok(loaded) => {
                debug!("Loaded {} style entries from {}", loaded.len(), path.display());
                Self::defaults().merge(loaded)
            }
            Err(e) => {
                warn!("Malformed style config {}: {e}; using defaults", path.display());
                Self::defaults()
            }
        }
    }

    /// Merge loaded entries over this table. Loaded fields win per key.
    pub fn merge(mut self, loaded: BTreeMap<String, DiagramStyle>) -> Self {
        for (key, style) in loaded {
            let merged = match self.entries.get(&key) {
                Some(base) => base.merged_with(&style),
                None => style,
            };
            self.entries.insert(key, merged);
        }
        self
    }

    /// Style for a diagram type tag, falling back to the `default` entry,
    /// then to an empty style.
    pub fn for_type(&self, tag: &str) -> DiagramStyle {
        self.entries
            .get(tag)
            .or_else(|| self.entries.get("default"))
            .cloned()
            .unwrap_or_default()
    }
}
