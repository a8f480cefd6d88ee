//! Conversion output types.
//!
//! [`ConversionOutput`] is what the library returns on success.
//! [`ConversionResult`] is the flat `{result, message}` shape reported to
//! scripts and the CLI's `--json` mode:
//!
//! ```json
//! {"result":"success","message":[{"page":1,"name":"test_1.jpg","size":83.2,"path":"output/test_1.jpg"}]}
//! {"result":"error","message":"Invalid page number."}
//! {"result":"timeout","message":"Conversion timed out."}
//! ```

use crate::error::Pdf2ImgError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Metadata for one converted page image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-based page number.
    pub page: u32,
    /// Output file name, e.g. `test_1.jpg`.
    pub name: String,
    /// Output size in kilobytes (bytes / 1000). Always > 0.
    pub size: f64,
    /// Output file path.
    pub path: PathBuf,
}

/// Timing and counts for one conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Pages in the source document.
    pub total_pages: usize,
    /// Pages written by this call.
    pub converted_pages: usize,
    pub probe_duration_ms: u64,
    pub convert_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Successful conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Converted pages in ascending page order.
    pub pages: Vec<PageResult>,
    /// Directory the pages were written to.
    pub output_dir: PathBuf,
    pub stats: ConversionStats,
}

/// `{result, message}` report of a finished call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", content = "message", rename_all = "lowercase")]
pub enum ConversionResult {
    Success(Vec<PageResult>),
    Error(String),
    Timeout(String),
}

impl ConversionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ConversionResult::Success(_))
    }
}

impl From<&Pdf2ImgError> for ConversionResult {
    fn from(e: &Pdf2ImgError) -> Self {
        if e.is_timeout() {
            ConversionResult::Timeout(e.summary().to_string())
        } else {
            ConversionResult::Error(e.summary().to_string())
        }
    }
}

impl From<&ConversionOutput> for ConversionResult {
    fn from(o: &ConversionOutput) -> Self {
        ConversionResult::Success(o.pages.clone())
    }
}

impl From<&Result<ConversionOutput, Pdf2ImgError>> for ConversionResult {
    fn from(r: &Result<ConversionOutput, Pdf2ImgError>) -> Self {
        match r {
            Ok(o) => o.into(),
            Err(e) => e.into(),
        }
    }
}
