//! Progress-callback trait for per-page conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline converts each page. Pages are converted one at a
//! time, so events for page N always arrive before events for page N+1.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdf2img::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: Arc<AtomicUsize>,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page: u32, total_pages: usize, size_kb: f64) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Page {}/{} done ({:.1} KB)", page, total_pages, size_kb);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     completed: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the conversion pipeline as it converts each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after the probe, before the first page.
    ///
    /// # Arguments
    /// * `total_pages`: number of pages that will be converted
    fn on_conversion_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before a page is handed to the rasterizer.
    fn on_page_start(&self, page: u32, total_pages: usize) {
        let _ = (page, total_pages);
    }

    /// Called when a page image has been written.
    ///
    /// # Arguments
    /// * `page`: 1-based page number
    /// * `total_pages`: pages selected for this conversion
    /// * `size_kb`: size of the written image in kilobytes
    fn on_page_complete(&self, page: u32, total_pages: usize, size_kb: f64) {
        let _ = (page, total_pages, size_kb);
    }

    /// Called when a page fails. No further pages are attempted.
    fn on_page_error(&self, page: u32, total_pages: usize, error: &str) {
        let _ = (page, total_pages, error);
    }

    /// Called once after the last attempted page.
    ///
    /// # Arguments
    /// * `total_pages`: pages selected for this conversion
    /// * `success_count`: pages written before stopping
    fn on_conversion_complete(&self, total_pages: usize, success_count: usize) {
        let _ = (total_pages, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
