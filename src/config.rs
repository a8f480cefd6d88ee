//! Configuration types for PDF-to-image conversion.
//!
//! Two layers of configuration exist:
//!
//! * [`BaseOptions`]: the defaults every conversion starts from (image
//!   format, maximum dimension, density, output location, page). They live
//!   either in a [`ConversionConfig`] the caller builds and passes around, or
//!   in the process-wide defaults managed by [`crate::options`].
//!
//! * [`crate::options::ConvertOptions`]: per-call overrides, merged against
//!   the base options once at the start of each call.
//!
//! Prefer building a [`ConversionConfig`] and passing it explicitly: it keeps
//! concurrent callers independent of each other. The global defaults exist for
//! callers that want a one-time `set_global_base_options` setup.

use crate::error::Pdf2ImgError;
use crate::pipeline::magick::Rasterizer;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Default output image format.
pub const DEFAULT_FORMAT: ImageFormat = ImageFormat::Jpg;
/// Default maximum width/height of an output image, in pixels.
pub const DEFAULT_SIZE: u32 = 1024;
/// Default rendering density, in DPI (applied to both axes).
pub const DEFAULT_DENSITY: u32 = 600;

/// Output image format. Doubles as the output file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// JPEG with a `.jpg` extension (default).
    #[default]
    Jpg,
    /// JPEG with a `.jpeg` extension.
    Jpeg,
    Png,
    Gif,
    #[serde(alias = "tif")]
    Tiff,
    Bmp,
    Webp,
}

impl ImageFormat {
    /// File extension (without the dot), which GraphicsMagick also uses to pick
    /// the encoder.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Jpg => "jpg",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
            ImageFormat::Gif => "gif",
            ImageFormat::Tiff => "tiff",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Webp => "webp",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ImageFormat {
    type Err = Pdf2ImgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpg" => Ok(ImageFormat::Jpg),
            "jpeg" => Ok(ImageFormat::Jpeg),
            "png" => Ok(ImageFormat::Png),
            "gif" => Ok(ImageFormat::Gif),
            "tif" | "tiff" => Ok(ImageFormat::Tiff),
            "bmp" => Ok(ImageFormat::Bmp),
            "webp" => Ok(ImageFormat::Webp),
            other => Err(Pdf2ImgError::InvalidConfig(format!(
                "unsupported image type '{other}' (expected jpg, jpeg, png, gif, tiff, bmp or webp)"
            ))),
        }
    }
}

/// Defaults every conversion starts from.
///
/// Field names on the wire follow the classic option object:
/// `{type, size, density, outputdir, outputname, page}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseOptions {
    /// Output image format. Default: `jpg`.
    #[serde(rename = "type")]
    pub format: ImageFormat,

    /// Maximum output width/height in pixels; aspect ratio is preserved. Default: 1024.
    pub size: u32,

    /// Rendering density in DPI, applied to both axes. Default: 600.
    ///
    /// GraphicsMagick rasterises the PDF at this density *before* resizing to
    /// `size`, so a high density followed by a downscale gives smooth text.
    pub density: u32,

    /// Output directory. `None` means "a directory named after the input
    /// file's stem, relative to the working directory".
    #[serde(rename = "outputdir")]
    pub output_dir: Option<PathBuf>,

    /// Output file basename. `None` means "the input file's stem".
    #[serde(rename = "outputname")]
    pub output_name: Option<String>,

    /// Convert only this 1-based page. `None` converts every page.
    pub page: Option<u32>,
}

impl Default for BaseOptions {
    fn default() -> Self {
        Self {
            format: DEFAULT_FORMAT,
            size: DEFAULT_SIZE,
            density: DEFAULT_DENSITY,
            output_dir: None,
            output_name: None,
            page: None,
        }
    }
}

/// Configuration for PDF-to-image conversion.
///
/// Built via [`ConversionConfig::builder()`], [`ConversionConfig::default()`],
/// or snapshotted from the process-wide defaults with
/// [`ConversionConfig::from_global()`].
///
/// # Example
/// ```rust
/// use edgequake_pdf2img::{ConversionConfig, ImageFormat};
///
/// let config = ConversionConfig::builder()
///     .format(ImageFormat::Png)
///     .size(2048)
///     .density(300)
///     .output_dir("./output")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone, Default)]
pub struct ConversionConfig {
    /// Defaults merged under every call's [`crate::options::ConvertOptions`].
    pub base: BaseOptions,

    /// Time budget for the page-count probe, in milliseconds. Default: none.
    ///
    /// A per-call `timeout_ms` takes precedence.
    pub probe_timeout_ms: Option<u64>,

    /// Pre-constructed rasterizer. If `None`, GraphicsMagick is located via
    /// [`gm_locate::gm_path`] at conversion time.
    pub rasterizer: Option<Arc<dyn Rasterizer>>,

    /// Optional per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("base", &self.base)
            .field("probe_timeout_ms", &self.probe_timeout_ms)
            .field("rasterizer", &self.rasterizer.as_ref().map(|r| r.name().to_string()))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
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

    /// Snapshot the current process-wide defaults.
    ///
    /// Later calls to [`crate::options::set_global_base_options`] do not
    /// affect the returned config.
    pub fn from_global() -> Self {
        Self {
            base: crate::options::global_base_options(),
            ..Self::default()
        }
    }
}

/// Builder for [`ConversionConfig`].
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl fmt::Debug for ConversionConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ConversionConfigBuilder {
    pub fn base(mut self, base: BaseOptions) -> Self {
        self.config.base = base;
        self
    }

    pub fn format(mut self, format: ImageFormat) -> Self {
        self.config.base.format = format;
        self
    }

    pub fn size(mut self, px: u32) -> Self {
        self.config.base.size = px;
        self
    }

    pub fn density(mut self, dpi: u32) -> Self {
        self.config.base.density = dpi;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.base.output_dir = Some(dir.into());
        self
    }

    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.config.base.output_name = Some(name.into());
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.config.base.page = Some(page);
        self
    }

    pub fn probe_timeout_ms(mut self, ms: u64) -> Self {
        self.config.probe_timeout_ms = Some(ms);
        self
    }

    pub fn rasterizer(mut self, rasterizer: Arc<dyn Rasterizer>) -> Self {
        self.config.rasterizer = Some(rasterizer);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2ImgError> {
        let b = &self.config.base;
        if b.size == 0 {
            return Err(Pdf2ImgError::InvalidConfig(
                "size must be ≥ 1 pixel".into(),
            ));
        }
        if b.density == 0 {
            return Err(Pdf2ImgError::InvalidConfig(
                "density must be ≥ 1 DPI".into(),
            ));
        }
        if b.page == Some(0) {
            return Err(Pdf2ImgError::InvalidConfig(
                "pages are 1-indexed, minimum is 1".into(),
            ));
        }
        if let Some(ref name) = b.output_name {
            validate_output_name(name)?;
        }
        if self.config.probe_timeout_ms == Some(0) {
            return Err(Pdf2ImgError::InvalidConfig(
                "probe timeout must be ≥ 1 ms".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Reject basenames that would escape the output directory.
pub(crate) fn validate_output_name(name: &str) -> Result<(), Pdf2ImgError> {
    if name.is_empty() {
        return Err(Pdf2ImgError::InvalidConfig("output name must not be empty".into()));
    }
    if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        return Err(Pdf2ImgError::InvalidConfig(format!(
            "output name '{name}' must be a plain file name, not a path"
        )));
    }
    Ok(())
}
