//! Eager (whole-document) conversion entry points.
//!
//! [`convert_with`] runs the full pipeline and returns once every selected
//! page has been written. Use [`crate::stream::convert_stream`] instead to
//! receive pages one by one as they are written.
//!
//! ## Ordering
//!
//! Pages are converted strictly one after another: page N+1 is not started
//! until page N's file is written and checked. If page N fails, pages
//! `1..N` stay on disk and nothing after N is attempted.

use crate::config::ConversionConfig;
use crate::error::Pdf2ImgError;
use crate::options::{resolve, ConvertOptions, EffectiveOptions};
use crate::output::{ConversionOutput, ConversionStats, PageResult};
use crate::pipeline::input::{self, PdfSource};
use crate::pipeline::layout::OutputLayout;
use crate::pipeline::magick::{GraphicsMagick, Rasterizer};
use crate::pipeline::page::convert_page;
use crate::pipeline::probe::{probe_pages, ProbeOutcome};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Convert a PDF using the process-wide defaults.
///
/// The defaults are snapshotted once, when the call starts; see
/// [`crate::options::set_global_base_options`].
///
/// # Example
/// ```rust,no_run
/// use edgequake_pdf2img::{convert, set_global_base_options, ConvertOptions, ImageFormat};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     set_global_base_options(&ConvertOptions::new().output_dir("./output").output_name("test"));
///     let output = convert("test.pdf", &ConvertOptions::new().format(ImageFormat::Png)).await?;
///     for page in &output.pages {
///         println!("{} → {} ({:.1} KB)", page.page, page.path.display(), page.size);
///     }
///     Ok(())
/// }
/// ```
pub async fn convert(
    input: impl AsRef<Path>,
    options: &ConvertOptions,
) -> Result<ConversionOutput, Pdf2ImgError> {
    convert_with(input, options, &ConversionConfig::from_global()).await
}

/// Convert a PDF with explicitly injected defaults.
///
/// # Errors
/// - [`Pdf2ImgError::UnsupportedType`] / [`Pdf2ImgError::FileNotFound`]: bad input
/// - [`Pdf2ImgError::InvalidPageCount`] / [`Pdf2ImgError::Timeout`]: probe failed;
///   no page file was written
/// - [`Pdf2ImgError::WriteFailure`] / [`Pdf2ImgError::EmptyOutput`]: a page
///   failed; earlier pages remain on disk
pub async fn convert_with(
    input: impl AsRef<Path>,
    options: &ConvertOptions,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2ImgError> {
    let total_start = Instant::now();
    let prepared = prepare(input.as_ref(), options, config).await?;
    let selected = prepared.probe.pages.len();

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(selected);
    }

    // ── Convert pages, strictly in order ─────────────────────────────────
    let convert_start = Instant::now();
    let mut pages: Vec<PageResult> = Vec::with_capacity(selected);

    for &page in &prepared.probe.pages {
        if let Some(ref cb) = config.progress_callback {
            cb.on_page_start(page, selected);
        }

        let output = prepared.layout.page_path(page);
        match convert_page(
            prepared.rasterizer.as_ref(),
            &prepared.source,
            page,
            &prepared.options,
            &output,
        )
        .await
        {
            Ok(result) => {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_page_complete(page, selected, result.size);
                }
                pages.push(result);
            }
            Err(e) => {
                warn!(
                    "Page {} failed after {} written page(s): {}",
                    page,
                    pages.len(),
                    e
                );
                if let Some(ref cb) = config.progress_callback {
                    cb.on_page_error(page, selected, &e.to_string());
                    cb.on_conversion_complete(selected, pages.len());
                }
                return Err(e);
            }
        }
    }

    let stats = ConversionStats {
        total_pages: prepared.probe.total_pages,
        converted_pages: pages.len(),
        probe_duration_ms: prepared.probe_duration_ms,
        convert_duration_ms: convert_start.elapsed().as_millis() as u64,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {}/{} pages → {} in {}ms",
        stats.converted_pages,
        stats.total_pages,
        prepared.layout.dir.display(),
        stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(selected, pages.len());
    }

    Ok(ConversionOutput {
        pages,
        output_dir: prepared.layout.dir,
        stats,
    })
}

/// Synchronous wrapper around [`convert_with`].
///
/// Creates a temporary tokio runtime internally; do not call it from inside
/// an async context.
pub fn convert_sync(
    input: impl AsRef<Path>,
    options: &ConvertOptions,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2ImgError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2ImgError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert_with(input, options, config))
}

/// Convert PDF bytes held in memory.
///
/// The rasterizer needs a filesystem path, so the bytes are written to
/// `document.pdf` inside a managed [`tempfile::TempDir`], which is removed on
/// return. Output naming therefore defaults to `document`; set
/// `output_dir`/`output_name` to choose your own.
pub async fn convert_from_bytes(
    bytes: &[u8],
    options: &ConvertOptions,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2ImgError> {
    let tmp = tempfile::TempDir::new().map_err(|e| Pdf2ImgError::Internal(format!("tempdir: {e}")))?;
    let path = tmp.path().join("document.pdf");
    let mut file = std::fs::File::create(&path)
        .map_err(|e| Pdf2ImgError::Internal(format!("tempfile create: {e}")))?;
    file.write_all(bytes)
        .map_err(|e| Pdf2ImgError::Internal(format!("tempfile write: {e}")))?;
    drop(file);

    // `tmp` is dropped (and the PDF deleted) when `convert_with` returns
    convert_with(&path, options, config).await
}

/// Count the pages of a PDF without converting anything.
pub async fn inspect(
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<usize, Pdf2ImgError> {
    let path = input.as_ref();
    input::validate_input(path)?;
    let rasterizer = resolve_rasterizer(config)?;
    let timeout = config.probe_timeout_ms.map(Duration::from_millis);
    let outcome = probe_pages(rasterizer.as_ref(), path, None, timeout).await?;
    Ok(outcome.total_pages)
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Everything a call needs once validation and probing succeeded.
pub(crate) struct Prepared {
    pub source: PdfSource,
    pub options: EffectiveOptions,
    pub layout: OutputLayout,
    pub probe: ProbeOutcome,
    pub rasterizer: Arc<dyn Rasterizer>,
    pub probe_duration_ms: u64,
}

/// Validate, resolve options, create the output directory and probe.
///
/// Nothing but the output directory is written before this returns.
pub(crate) async fn prepare(
    path: &Path,
    call: &ConvertOptions,
    config: &ConversionConfig,
) -> Result<Prepared, Pdf2ImgError> {
    info!("Starting conversion: {}", path.display());

    // ── Step 1: Validate input ───────────────────────────────────────────
    let source = input::validate_input(path)?;

    // ── Step 2: Resolve options (once, for the whole call) ───────────────
    let mut options = resolve(call, &config.base);
    if options.timeout.is_none() {
        options.timeout = config.probe_timeout_ms.map(Duration::from_millis);
    }
    debug!("Effective options: {:?}", options);

    let rasterizer = resolve_rasterizer(config)?;

    // ── Step 3: Output directory and name ────────────────────────────────
    let layout = OutputLayout::resolve(path, &options)?;
    layout.ensure_dir().await?;

    // ── Step 4: Probe page count ─────────────────────────────────────────
    let probe_start = Instant::now();
    let probe = probe_pages(rasterizer.as_ref(), path, options.page, options.timeout).await?;
    let probe_duration_ms = probe_start.elapsed().as_millis() as u64;

    Ok(Prepared {
        source,
        options,
        layout,
        probe,
        rasterizer,
        probe_duration_ms,
    })
}

/// Use the injected rasterizer, or locate GraphicsMagick.
fn resolve_rasterizer(config: &ConversionConfig) -> Result<Arc<dyn Rasterizer>, Pdf2ImgError> {
    if let Some(ref rasterizer) = config.rasterizer {
        return Ok(Arc::clone(rasterizer));
    }
    let gm = GraphicsMagick::locate()?;
    debug!("Using GraphicsMagick at {}", gm.program().display());
    Ok(Arc::new(gm))
}
