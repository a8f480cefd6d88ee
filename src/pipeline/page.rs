//! Page conversion: render one PDF page to one image file and describe it.
//!
//! ## Why stat the output?
//!
//! GraphicsMagick can exit successfully yet leave a zero-byte file behind
//! (missing Ghostscript delegate, unreadable page). A zero-byte output is
//! reported as [`Pdf2ImgError::EmptyOutput`] and the file is left where it
//! is, so the caller can inspect or remove it.

use crate::error::Pdf2ImgError;
use crate::options::EffectiveOptions;
use crate::output::PageResult;
use crate::pipeline::input::PdfSource;
use crate::pipeline::magick::{PageJob, Rasterizer, MAX_QUALITY};
use std::path::Path;
use tracing::{debug, warn};

/// Convert 1-based `page` of `source` into `output`.
///
/// # Errors
/// - [`Pdf2ImgError::InvalidPath`]: the source has no filesystem path or
///   cannot be opened for reading
/// - [`Pdf2ImgError::WriteFailure`]: the rasterizer failed, or reported
///   success without creating `output`
/// - [`Pdf2ImgError::EmptyOutput`]: `output` exists but is empty
pub async fn convert_page(
    rasterizer: &dyn Rasterizer,
    source: &PdfSource,
    page: u32,
    options: &EffectiveOptions,
    output: &Path,
) -> Result<PageResult, Pdf2ImgError> {
    let path = source.path().ok_or_else(|| Pdf2ImgError::InvalidPath {
        detail: "in-memory sources have no filesystem path for the rasterizer".into(),
    })?;

    // The handle only proves the source is readable; the tool reopens it by path.
    let _handle = tokio::fs::File::open(path)
        .await
        .map_err(|e| Pdf2ImgError::InvalidPath {
            detail: format!("cannot open '{}': {e}", path.display()),
        })?;

    let page_index = page
        .checked_sub(1)
        .ok_or_else(|| Pdf2ImgError::invalid_page("pages are 1-indexed, page 0 does not exist"))?;

    let job = PageJob {
        source: path,
        page_index,
        density: options.density,
        size: options.size,
        quality: MAX_QUALITY,
        output,
    };

    rasterizer
        .convert_page(&job)
        .await
        .map_err(|e| Pdf2ImgError::WriteFailure {
            page,
            path: output.to_path_buf(),
            detail: e.to_string(),
        })?;

    let bytes = tokio::fs::metadata(output)
        .await
        .map_err(|e| Pdf2ImgError::WriteFailure {
            page,
            path: output.to_path_buf(),
            detail: format!("output missing after conversion: {e}"),
        })?
        .len();

    if bytes == 0 {
        warn!("Page {} produced an empty file: {}", page, output.display());
        return Err(Pdf2ImgError::EmptyOutput {
            page,
            path: output.to_path_buf(),
        });
    }

    let result = PageResult {
        page,
        name: output
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        size: bytes as f64 / 1000.0,
        path: output.to_path_buf(),
    };
    debug!(
        "Converted page {} → {} ({:.1} KB)",
        page,
        output.display(),
        result.size
    );
    Ok(result)
}
