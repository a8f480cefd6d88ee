//! The external rasterizer: everything that actually decodes, renders,
//! resizes and encodes a PDF page lives behind [`Rasterizer`].
//!
//! The default implementation, [`GraphicsMagick`], shells out to `gm`:
//!
//! ```text
//! gm identify -format "%p " doc.pdf                 → "1 2 3 "
//! gm convert -density 600x600 doc.pdf[0] \
//!    -resize 1024x1024 -quality 100 out/doc_1.jpg   → writes page 1
//! ```
//!
//! Both commands are spawned with `kill_on_drop(true)`: dropping the future
//! (for example when a `tokio::time::timeout` expires) kills the child
//! instead of leaving an orphaned `gm` process behind.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// JPEG/WebP quality requested for every page. PNG treats it as the zlib
/// compression level/filter pair, where 100 is also the lossless maximum.
pub const MAX_QUALITY: u8 = 100;

/// Failure reported by a [`Rasterizer`].
#[derive(Debug, Error)]
pub enum ToolError {
    /// The tool could not be started at all.
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The tool ran and exited unsuccessfully.
    #[error("'{program}' exited with {status}: {stderr}")]
    Failed {
        program: PathBuf,
        status: String,
        stderr: String,
    },

    /// Free-form failure from a custom rasterizer.
    #[error("{0}")]
    Other(String),
}

/// One page conversion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageJob<'a> {
    /// PDF to read.
    pub source: &'a Path,
    /// Zero-based page index, as the tool counts pages.
    pub page_index: u32,
    /// Rendering density in DPI, both axes.
    pub density: u32,
    /// Maximum output width/height in pixels.
    pub size: u32,
    pub quality: u8,
    /// File the tool writes; its extension selects the encoder.
    pub output: &'a Path,
}

impl PageJob<'_> {
    /// Composite "path + page index" selector, e.g. `doc.pdf[2]`.
    pub fn selector(&self) -> OsString {
        let mut s = self.source.as_os_str().to_owned();
        s.push(format!("[{}]", self.page_index));
        s
    }

    /// `DxD`, the same density on both axes.
    pub fn density_arg(&self) -> String {
        format!("{0}x{0}", self.density)
    }

    /// `SxS`: fit inside a `size`-pixel square, keeping the aspect ratio.
    pub fn resize_arg(&self) -> String {
        format!("{0}x{0}", self.size)
    }
}

/// The two capabilities the pipeline needs from an image tool.
///
/// Implementations must be `Send + Sync`; one instance is shared by every
/// call that uses the same [`crate::ConversionConfig`].
#[async_trait]
pub trait Rasterizer: Send + Sync {
    /// Short name for logs, e.g. `"graphicsmagick"`.
    fn name(&self) -> &str;

    /// Run the tool's identify capability on `pdf` with the given per-page
    /// `format` string and return its raw standard output.
    async fn identify(&self, pdf: &Path, format: &str) -> Result<String, ToolError>;

    /// Render one page to `job.output`.
    async fn convert_page(&self, job: &PageJob<'_>) -> Result<(), ToolError>;
}

/// [`Rasterizer`] backed by the GraphicsMagick `gm` executable.
#[derive(Debug, Clone)]
pub struct GraphicsMagick {
    program: PathBuf,
}

impl GraphicsMagick {
    /// Use an explicit `gm` executable.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Locate `gm` via [`gm_locate::gm_path`].
    pub fn locate() -> Result<Self, gm_locate::GmLocateError> {
        gm_locate::gm_path().map(Self::new)
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments for `gm identify`.
    pub fn identify_args(pdf: &Path, format: &str) -> Vec<OsString> {
        vec![
            "identify".into(),
            "-format".into(),
            format.into(),
            pdf.as_os_str().to_owned(),
        ]
    }

    /// Arguments for `gm convert`. `-density` precedes the input so the PDF is
    /// rendered at that density rather than resampled afterwards.
    pub fn convert_args(job: &PageJob<'_>) -> Vec<OsString> {
        vec![
            "convert".into(),
            "-density".into(),
            job.density_arg().into(),
            job.selector(),
            "-resize".into(),
            job.resize_arg().into(),
            "-quality".into(),
            job.quality.to_string().into(),
            job.output.as_os_str().to_owned(),
        ]
    }

    async fn run(&self, args: Vec<OsString>) -> Result<Vec<u8>, ToolError> {
        debug!("Running {} {:?}", self.program.display(), args);

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ToolError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ToolError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl Rasterizer for GraphicsMagick {
    fn name(&self) -> &str {
        "graphicsmagick"
    }

    async fn identify(&self, pdf: &Path, format: &str) -> Result<String, ToolError> {
        let stdout = self.run(Self::identify_args(pdf, format)).await?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }

    async fn convert_page(&self, job: &PageJob<'_>) -> Result<(), ToolError> {
        self.run(Self::convert_args(job)).await.map(|_| ())
    }
}
