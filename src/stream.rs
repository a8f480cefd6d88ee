//! Streaming conversion API: emit pages as they are written.
//!
//! Unlike the eager [`crate::convert::convert_with`], which returns only
//! after every page is on disk, [`convert_stream`] yields one `PageResult`
//! per page as soon as its file has been written and checked.
//!
//! Validation, directory creation and the page-count probe run before the
//! stream is returned, so those failures surface as the outer `Err`. Page
//! failures arrive as an `Err` item, after which the stream ends. The next
//! page is only started when the consumer polls for it.

use crate::config::ConversionConfig;
use crate::convert::{prepare, Prepared};
use crate::error::Pdf2ImgError;
use crate::options::ConvertOptions;
use crate::output::PageResult;
use crate::pipeline::page::convert_page;
use crate::progress::ProgressCallback;
use futures::stream::{self, Stream};
use std::path::Path;
use std::pin::Pin;
use tracing::{info, warn};

/// A boxed stream of page results.
pub type PageStream = Pin<Box<dyn Stream<Item = Result<PageResult, Pdf2ImgError>> + Send>>;

struct StreamState {
    prepared: Prepared,
    next: usize,
    written: usize,
    failed: bool,
    progress: Option<ProgressCallback>,
}

/// Convert a PDF, streaming pages in ascending page order.
///
/// # Returns
/// - `Ok(PageStream)`: a stream of `Result<PageResult, Pdf2ImgError>`
/// - `Err(Pdf2ImgError)`: the call failed before any page was written
///
/// # Example
/// ```rust,no_run
/// use edgequake_pdf2img::{convert_stream, ConversionConfig, ConvertOptions};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ConversionConfig::from_global();
/// let mut pages = convert_stream("test.pdf", &ConvertOptions::new(), &config).await?;
/// while let Some(page) = pages.next().await {
///     match page {
///         Ok(p) => println!("Page {}: {} ({:.1} KB)", p.page, p.name, p.size),
///         Err(e) => eprintln!("Error: {e}"),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub async fn convert_stream(
    input: impl AsRef<Path>,
    options: &ConvertOptions,
    config: &ConversionConfig,
) -> Result<PageStream, Pdf2ImgError> {
    let prepared = prepare(input.as_ref(), options, config).await?;
    let selected = prepared.probe.pages.len();
    info!("Streaming {} page(s) to {}", selected, prepared.layout.dir.display());

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(selected);
    }

    let state = StreamState {
        prepared,
        next: 0,
        written: 0,
        failed: false,
        progress: config.progress_callback.clone(),
    };

    let s = stream::unfold(state, |mut st| async move {
        if st.failed {
            return None;
        }
        let selected = st.prepared.probe.pages.len();
        let Some(&page) = st.prepared.probe.pages.get(st.next) else {
            if let Some(ref cb) = st.progress {
                cb.on_conversion_complete(selected, st.written);
            }
            return None;
        };
        st.next += 1;

        if let Some(ref cb) = st.progress {
            cb.on_page_start(page, selected);
        }

        let output = st.prepared.layout.page_path(page);
        let result = convert_page(
            st.prepared.rasterizer.as_ref(),
            &st.prepared.source,
            page,
            &st.prepared.options,
            &output,
        )
        .await;

        match result {
            Ok(ref r) => {
                st.written += 1;
                if let Some(ref cb) = st.progress {
                    cb.on_page_complete(page, selected, r.size);
                }
            }
            Err(ref e) => {
                warn!("Page {} failed, ending stream: {}", page, e);
                st.failed = true;
                if let Some(ref cb) = st.progress {
                    cb.on_page_error(page, selected, &e.to_string());
                    cb.on_conversion_complete(selected, st.written);
                }
            }
        }
        Some((result, st))
    });

    Ok(Box::pin(s))
}
