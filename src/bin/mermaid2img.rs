//! CLI binary for mermaid2img.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig`, bridges progress events to an indicatif bar, writes
//! the rebuilt document, and prints a summary.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use mermaid2img::{
    convert, rollback_images, write_output, BackendKind, ConversionConfig,
    ConversionProgressCallback, DiagramStyles, ImageFormat, ProgressCallback,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar over the document's diagrams plus a
/// per-diagram ✓/✗ log line. Diagrams are processed in sequence, so events
/// always arrive in document order.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_conversion_start
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(spinner_style);
        bar.set_prefix("Scanning");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_diagrams: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>2}/{len} diagrams",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");
        self.bar.set_length(total_diagrams as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Converting");
    }

    fn on_diagram_start(&self, index: usize, _total: usize) {
        self.bar.set_message(format!("diagram {index}"));
    }

    fn on_diagram_complete(&self, index: usize, total: usize, file_name: &str) {
        self.bar.println(format!(
            "  {} Diagram {index}/{total}  {}",
            green("✓"),
            dim(file_name)
        ));
        self.bar.inc(1);
    }

    fn on_diagram_error(&self, index: usize, total: usize, error: &str) {
        // Truncate very long error messages to keep output tidy.
        let msg: String = if error.chars().count() > 80 {
            let cut: String = error.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            error.to_string()
        };
        self.bar
            .println(format!("  {} Diagram {index}/{total}  {}", red("✗"), red(&msg)));
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, total_diagrams: usize, success_count: usize) {
        let failed = total_diagrams.saturating_sub(success_count);
        self.bar.finish_and_clear();
        if failed == 0 {
            eprintln!(
                "{} {} diagram(s) converted successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} diagrams converted  ({} failed)",
                if failed == total_diagrams { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total_diagrams,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic conversion (writes report-img.md + images/ beside the input)
  mermaid2img report.md

  # PNG output with a custom prefix and image directory
  mermaid2img report.md --format png --prefix arch --image-dir assets/diagrams

  # Plain Markdown image syntax instead of the HTML wrapper
  mermaid2img report.md --markdown-style

  # Strict mode: roll back generated images and write nothing on any failure
  mermaid2img report.md --strict

  # Point at a remote Kroki instance
  mermaid2img report.md --kroki-url https://kroki.example.net

  # Write the default style config for editing
  mermaid2img --create-config diagram_config.json

SETUP:
  The default backend is a Kroki instance (https://kroki.io) reachable at
  --kroki-url (default http://localhost:8000), e.g.:
    docker run -p 8000:8000 yuzutech/kroki
"#;

/// Convert Mermaid code blocks in Markdown files into linked images.
#[derive(Parser, Debug)]
#[command(
    name = "mermaid2img",
    version,
    about = "Convert Mermaid code blocks in Markdown files into linked SVG/PNG images",
    long_about = "Find ```mermaid fenced blocks in a Markdown document, render each one to an \
image via a Kroki rendering service, and write a copy of the document that references the \
images instead — so it displays on platforms without native Mermaid support.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to the input Markdown file. Required unless --create-config is used.
    input: Option<PathBuf>,

    /// Suffix appended to the input filename for the output file.
    #[arg(short = 's', long, default_value = "-img")]
    output_suffix: String,

    /// Rendering backend.
    #[arg(long, value_enum, default_value = "kroki")]
    backend: BackendArg,

    /// URL of the Kroki instance.
    #[arg(long, env = "MERMAID2IMG_KROKI_URL", default_value = "http://localhost:8000")]
    kroki_url: String,

    /// Per-diagram HTTP timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Prefix for generated image filenames (e.g. 'diagram-1-a1b2c3d4.svg').
    #[arg(short, long, default_value = "diagram")]
    prefix: String,

    /// Image format for diagrams.
    #[arg(short, long, value_enum, default_value = "svg")]
    format: FormatArg,

    /// Custom directory for generated images. Default: an 'images/'
    /// subdirectory beside the input file.
    #[arg(short, long, value_name = "DIR")]
    image_dir: Option<PathBuf>,

    /// Path to a JSON config file with diagram styling hints (max_width etc.).
    #[arg(short, long, value_name = "CONFIG_JSON")]
    config: Option<PathBuf>,

    /// Use plain Markdown image syntax `![alt](path)` instead of the HTML
    /// `<div><img>` wrapper.
    #[arg(short, long)]
    markdown_style: bool,

    /// Treat any failed diagram as an error: delete generated images and
    /// write no output file.
    #[arg(long)]
    strict: bool,

    /// Print the conversion result as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Disable the progress bar.
    #[arg(long)]
    no_progress: bool,

    /// Create a default style config file at the given path and exit.
    #[arg(long, value_name = "OUTPUT_PATH")]
    create_config: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum BackendArg {
    Kroki,
}

impl From<BackendArg> for BackendKind {
    fn from(v: BackendArg) -> Self {
        match v {
            BackendArg::Kroki => BackendKind::Kroki,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Svg,
    Png,
}

impl From<FormatArg> for ImageFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Svg => ImageFormat::Svg,
            FormatArg::Png => ImageFormat::Png,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs while the progress bar is active;
    // the bar provides the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Create-config mode ───────────────────────────────────────────────
    if let Some(ref path) = cli.create_config {
        let json = serde_json::to_string_pretty(&DiagramStyles::defaults())
            .context("Failed to serialise default styles")?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory for {}", path.display()))?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        println!("Default configuration file created at: {}", path.display());
        return Ok(());
    }

    let input = cli
        .input
        .clone()
        .context("Input MARKDOWN_FILE is required (or use --create-config)")?;
    if input.extension().map(|e| e != "md").unwrap_or(true) {
        tracing::warn!("Input file {} may not be Markdown", input.display());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let styles = match cli.config {
        Some(ref path) => DiagramStyles::load(path),
        None => DiagramStyles::defaults(),
    };

    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb: ProgressCallback = CliProgressCallback::new();
        Some(cb)
    } else {
        None
    };

    let mut builder = ConversionConfig::builder()
        .image_format(cli.format.into())
        .image_prefix(cli.prefix.as_str())
        .html_wrapper(!cli.markdown_style)
        .backend(cli.backend.into())
        .kroki_url(cli.kroki_url.as_str())
        .http_timeout_secs(cli.timeout)
        .output_suffix(cli.output_suffix.as_str())
        .styles(styles);
    if let Some(ref dir) = cli.image_dir {
        builder = builder.image_dir(dir);
    }
    if let Some(cb) = progress_cb {
        builder = builder.progress_callback(cb);
    }
    let config = builder.build().context("Invalid configuration")?;

    // ── Run conversion ───────────────────────────────────────────────────
    let output = convert(&input, &config)
        .await
        .context("Conversion failed")?;

    let all_ok = output.all_successful();
    let mut rolled_back = false;
    let mut output_written = false;

    if cli.strict && !all_ok {
        rollback_images(&output.generated_images).await;
        rolled_back = true;
        eprintln!(
            "{} {} diagram(s) failed; rolled back generated images, no output written.",
            red("✘"),
            output.stats.failed
        );
    } else if output.stats.total_diagrams > 0 {
        write_output(&output.output_path, &output.content)
            .await
            .with_context(|| format!("Failed to write {}", output.output_path.display()))?;
        output_written = true;
    } else if !cli.quiet {
        eprintln!("No mermaid diagrams found; nothing to write.");
    }

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialise output")?
        );
    } else if !cli.quiet {
        println!("\n--- Conversion Summary ---");
        println!("Input File:           {}", output.input_path.display());
        println!("Backend:              {:?}", config.backend);
        println!(
            "Output File:          {}",
            if output_written {
                output.output_path.display().to_string()
            } else {
                "N/A (not written)".to_string()
            }
        );
        if let Some(ref dir) = output.image_dir {
            println!("Image Directory:      {}", dir.display());
        }
        println!("Diagrams Found:       {}", output.stats.total_diagrams);
        println!("Successful Converts:  {}", output.stats.successful);
        println!("Failed Converts:      {}", output.stats.failed);
        println!("Rolled Back:          {}", if rolled_back { "Yes" } else { "No" });
        println!(
            "Total Time:           {}",
            dim(&format!("{}ms", output.stats.total_duration_ms))
        );
    }

    if all_ok {
        Ok(())
    } else {
        std::process::exit(1);
    }
}
