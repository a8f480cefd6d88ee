//! Error types for the edgequake-pdf2img library.
//!
//! Every failure is terminal for the current call: nothing is retried
//! internally, and a multi-page conversion either fully succeeds or returns
//! the first error it meets. Page files written before that error stay on
//! disk.
//!
//! Each variant maps to a stable `{result, message}` pair via
//! [`Pdf2ImgError::result_kind`] and [`Pdf2ImgError::summary`], which is what
//! [`crate::output::ConversionResult`] serialises.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the edgequake-pdf2img library.
#[derive(Debug, Error)]
pub enum Pdf2ImgError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The input path does not end in a (case-sensitive) `.pdf` extension.
    #[error("Unsupported file type: '{path}'\nOnly files ending in '.pdf' are converted.")]
    UnsupportedType { path: PathBuf },

    /// Input file was not found at the given path, or is not a regular file.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// The source has no resolvable filesystem path (e.g. in-memory bytes).
    #[error("Invalid input file path: {detail}")]
    InvalidPath { detail: String },

    // ── Probe errors ──────────────────────────────────────────────────────
    /// The page count could not be determined, or the requested page is
    /// outside the document.
    #[error("Invalid page number: {detail}")]
    InvalidPageCount { detail: String },

    /// The page-count probe exceeded its time budget; the tool was killed.
    #[error("Page-count probe timed out after {elapsed_ms}ms for '{path}'")]
    Timeout { path: PathBuf, elapsed_ms: u64 },

    // ── Page errors ───────────────────────────────────────────────────────
    /// GraphicsMagick failed to produce the page image.
    #[error("Can not write output file '{path}' (page {page}): {detail}")]
    WriteFailure {
        page: u32,
        path: PathBuf,
        detail: String,
    },

    /// The tool reported success but the output file is empty.
    ///
    /// The zero-byte file is left on disk; the caller decides what to do with it.
    #[error("Zero sized output image detected for page {page}: '{path}'")]
    EmptyOutput { page: u32, path: PathBuf },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create the output directory.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Tool errors ───────────────────────────────────────────────────────
    /// No GraphicsMagick executable could be located.
    #[error(transparent)]
    ToolNotFound(#[from] gm_locate::GmLocateError),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2ImgError {
    pub(crate) fn invalid_page(detail: impl Into<String>) -> Self {
        Pdf2ImgError::InvalidPageCount {
            detail: detail.into(),
        }
    }

    /// `true` when the error came from an expired time budget.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Pdf2ImgError::Timeout { .. })
    }

    /// The `result` tag reported for this error: `"timeout"` or `"error"`.
    pub fn result_kind(&self) -> &'static str {
        if self.is_timeout() {
            "timeout"
        } else {
            "error"
        }
    }

    /// Short, stable message suitable for the `message` field of a
    /// [`crate::output::ConversionResult`].
    ///
    /// Unlike `Display`, this never embeds paths or tool output, so callers
    /// can match on it.
    pub fn summary(&self) -> &'static str {
        match self {
            Pdf2ImgError::UnsupportedType { .. } => "Unsupported file type.",
            Pdf2ImgError::FileNotFound { .. } => "Input file not found.",
            Pdf2ImgError::InvalidPath { .. } => "Invalid input file path.",
            Pdf2ImgError::InvalidPageCount { .. } => "Invalid page number.",
            Pdf2ImgError::Timeout { .. } => "Conversion timed out.",
            Pdf2ImgError::WriteFailure { .. } => "Can not write output file.",
            Pdf2ImgError::EmptyOutput { .. } => "Zero sized output image detected.",
            Pdf2ImgError::OutputDirFailed { .. } => "Can not create output directory.",
            Pdf2ImgError::ToolNotFound(_) => "GraphicsMagick not found.",
            Pdf2ImgError::InvalidConfig(_) => "Invalid configuration.",
            Pdf2ImgError::Internal(_) => "Internal error.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_reports_timeout_kind() {
        let e = Pdf2ImgError::Timeout {
            path: "a.pdf".into(),
            elapsed_ms: 10,
        };
        assert!(e.is_timeout());
        assert_eq!(e.result_kind(), "timeout");
        assert!(e.to_string().contains("10ms"));
    }

    #[test]
    fn other_errors_report_error_kind() {
        let e = Pdf2ImgError::FileNotFound {
            path: "missing.pdf".into(),
        };
        assert_eq!(e.result_kind(), "error");
        assert_eq!(e.summary(), "Input file not found.");
    }

    #[test]
    fn write_failure_display() {
        let e = Pdf2ImgError::WriteFailure {
            page: 2,
            path: "out/test_2.jpg".into(),
            detail: "gm exited with status 1".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("page 2"), "got: {msg}");
        assert!(msg.contains("test_2.jpg"), "got: {msg}");
        assert_eq!(e.summary(), "Can not write output file.");
    }

    #[test]
    fn invalid_page_summary_is_stable() {
        let e = Pdf2ImgError::invalid_page("page 9 requested, document has 3 pages");
        assert_eq!(e.summary(), "Invalid page number.");
        assert!(e.to_string().contains("page 9"));
    }
}
