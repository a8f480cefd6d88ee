//! Page-count probe: ask the rasterizer how many pages the PDF has and decide
//! which of them to convert.
//!
//! `gm identify -format "%p "` prints one page token per page, e.g. `1 2 3 `.
//! Rather than trusting a whitespace split, [`parse_page_tokens`] requires
//! every token to be an integer and reports the first one that is not: a
//! warning or error message on stdout must not turn into extra "pages".
//!
//! The probe writes nothing. When it fails, or runs out of time, no page file
//! exists yet.

use crate::error::Pdf2ImgError;
use crate::pipeline::magick::Rasterizer;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Identify format string: the page number followed by a space, per page.
pub const PAGE_TOKEN_FORMAT: &str = "%p ";

/// Result of a successful probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// Pages in the document.
    pub total_pages: usize,
    /// 1-based pages to convert, ascending.
    pub pages: Vec<u32>,
}

/// Count the page tokens in an identify response.
///
/// # Errors
/// [`Pdf2ImgError::InvalidPageCount`] if the response has no tokens or any
/// token is not a non-negative integer.
pub fn parse_page_tokens(raw: &str) -> Result<usize, Pdf2ImgError> {
    let mut count = 0usize;
    for token in raw.split_whitespace() {
        if token.parse::<u32>().is_err() {
            return Err(Pdf2ImgError::invalid_page(format!(
                "unexpected page token '{token}' in identify output"
            )));
        }
        count += 1;
    }

    if count == 0 {
        return Err(Pdf2ImgError::invalid_page(
            "identify reported no pages",
        ));
    }
    Ok(count)
}

/// Narrow `1..=total` to the requested page, if any.
pub fn select_pages(total: usize, requested: Option<u32>) -> Result<Vec<u32>, Pdf2ImgError> {
    match requested {
        None => Ok((1..=total as u32).collect()),
        Some(0) => Err(Pdf2ImgError::invalid_page(
            "pages are 1-indexed, page 0 does not exist",
        )),
        Some(page) if page as usize > total => Err(Pdf2ImgError::invalid_page(format!(
            "page {page} requested, document has {total} page{}",
            if total == 1 { "" } else { "s" }
        ))),
        Some(page) => Ok(vec![page]),
    }
}

/// Probe `pdf` and select the pages to convert.
///
/// With a `timeout`, an identify call that runs longer is abandoned (its
/// child process is killed) and [`Pdf2ImgError::Timeout`] is returned.
pub async fn probe_pages(
    rasterizer: &dyn Rasterizer,
    pdf: &Path,
    requested: Option<u32>,
    timeout: Option<Duration>,
) -> Result<ProbeOutcome, Pdf2ImgError> {
    let start = Instant::now();
    let identify = rasterizer.identify(pdf, PAGE_TOKEN_FORMAT);

    let raw = match timeout {
        Some(limit) => tokio::time::timeout(limit, identify).await.map_err(|_| {
            Pdf2ImgError::Timeout {
                path: pdf.to_path_buf(),
                elapsed_ms: start.elapsed().as_millis() as u64,
            }
        })?,
        None => identify.await,
    }
    .map_err(|e| Pdf2ImgError::invalid_page(format!("identify failed: {e}")))?;

    let total_pages = parse_page_tokens(&raw)?;
    info!("PDF has {} pages", total_pages);

    let pages = select_pages(total_pages, requested)?;
    debug!("Selected {} pages for conversion", pages.len());

    Ok(ProbeOutcome { total_pages, pages })
}
