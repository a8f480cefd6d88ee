//! Output layout: where page images go and what they are called.
//!
//! `<output_dir>/<output_name>_<page>.<ext>`, where the directory defaults to
//! the input's stem (relative to the working directory) and the name defaults
//! to the same stem. `test.pdf` with default options produces
//! `test/test_1.jpg`, `test/test_2.jpg`, …

use crate::config::ImageFormat;
use crate::error::Pdf2ImgError;
use crate::options::EffectiveOptions;
use crate::pipeline::input::input_stem;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolved output directory, basename and format for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub dir: PathBuf,
    pub name: String,
    pub format: ImageFormat,
}

impl OutputLayout {
    pub fn resolve(input: &Path, options: &EffectiveOptions) -> Result<Self, Pdf2ImgError> {
        let stem = input_stem(input)?;
        let name = match options.output_name {
            Some(ref n) => {
                crate::config::validate_output_name(n)?;
                n.clone()
            }
            None => stem.clone(),
        };
        let dir = options
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(&stem));

        Ok(Self {
            dir,
            name,
            format: options.format,
        })
    }

    /// File name for a 1-based page, e.g. `test_3.png`.
    pub fn file_name(&self, page: u32) -> String {
        format!("{}_{}.{}", self.name, page, self.format.extension())
    }

    pub fn page_path(&self, page: u32) -> PathBuf {
        self.dir.join(self.file_name(page))
    }

    /// Create the output directory (one level, not its parents) if absent.
    pub async fn ensure_dir(&self) -> Result<(), Pdf2ImgError> {
        let failed = |source: io::Error| Pdf2ImgError::OutputDirFailed {
            path: self.dir.clone(),
            source,
        };

        match tokio::fs::metadata(&self.dir).await {
            Ok(meta) if meta.is_dir() => return Ok(()),
            Ok(_) => {
                return Err(failed(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    "path exists and is not a directory",
                )))
            }
            Err(_) => {}
        }

        match tokio::fs::create_dir(&self.dir).await {
            Ok(()) => {
                debug!("Created output directory {}", self.dir.display());
                Ok(())
            }
            // Lost a race with another caller creating the same directory.
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && self.dir.is_dir() => Ok(()),
            Err(e) => Err(failed(e)),
        }
    }
}
