//! # edgequake-pdf2img
//!
//! Convert PDF pages to JPEG, PNG and other raster images by driving
//! GraphicsMagick (`gm`).
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    `.pdf` extension + existence checks
//!  ├─ 2. Options  per-call options merged over the snapshotted defaults
//!  ├─ 3. Layout   output directory (created once) and `<name>_<page>.<ext>`
//!  ├─ 4. Probe    page count via `gm identify`, optional time budget
//!  ├─ 5. Pages    one `gm convert` per page, strictly in page order
//!  └─ 6. Output   per-page name / size (KB) / path
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2img::{convert, ConvertOptions, ImageFormat};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = ConvertOptions::new()
//!         .format(ImageFormat::Png)
//!         .size(800)
//!         .output_dir("./output");
//!     let output = convert("test.pdf", &options).await?;
//!     for page in &output.pages {
//!         println!("{} ({:.1} KB)", page.path.display(), page.size);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2img` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-pdf2img = { version = "0.1", default-features = false }
//! ```
//!
//! ## Locating GraphicsMagick
//!
//! The `gm` executable is found via `PDF2IMG_GM_PATH`, the Homebrew prefix,
//! a few well-known install directories and finally `PATH`. Inject your own
//! [`Rasterizer`] through [`ConversionConfigBuilder::rasterizer`] to bypass
//! the lookup entirely.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod options;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{BaseOptions, ConversionConfig, ConversionConfigBuilder, ImageFormat};
pub use convert::{convert, convert_from_bytes, convert_sync, convert_with, inspect};
pub use error::Pdf2ImgError;
#[allow(deprecated)]
pub use options::set_options;
pub use options::{
    global_base_options, reset_global_base_options, set_global_base_options, ConvertOptions,
    EffectiveOptions,
};
pub use output::{ConversionOutput, ConversionResult, ConversionStats, PageResult};
pub use pipeline::input::PdfSource;
pub use pipeline::magick::{GraphicsMagick, PageJob, Rasterizer, ToolError};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{convert_stream, PageStream};
