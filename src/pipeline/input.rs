//! Input validation: decide whether a user-supplied path is something we
//! will hand to the rasterizer.
//!
//! Two checks, in this order:
//!
//! 1. The file name must end in `.pdf` (case-sensitive). This runs first, so
//!    `notes.txt` is reported as an unsupported type even when it does not
//!    exist.
//! 2. The path must name an existing regular file.
//!
//! Content is not sniffed here; a file that is not really a PDF is rejected
//! later by the page-count probe.

use crate::error::Pdf2ImgError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where the rasterizer reads the PDF from.
///
/// GraphicsMagick takes a filesystem path plus a page selector, so only
/// [`PdfSource::File`] can be converted; [`PdfSource::Memory`] is rejected
/// by the page converter with [`Pdf2ImgError::InvalidPath`]. Spill bytes to
/// disk first (see [`crate::convert::convert_from_bytes`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfSource {
    File(PathBuf),
    Memory(Vec<u8>),
}

impl PdfSource {
    /// Filesystem path of the source, if it has one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            PdfSource::File(p) => Some(p),
            PdfSource::Memory(_) => None,
        }
    }
}

/// `true` if the file name ends in exactly `.pdf`.
pub fn has_pdf_extension(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "pdf")
}

/// Validate extension then existence, returning the source to convert.
pub fn validate_input(path: &Path) -> Result<PdfSource, Pdf2ImgError> {
    if !has_pdf_extension(path) {
        return Err(Pdf2ImgError::UnsupportedType {
            path: path.to_path_buf(),
        });
    }

    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => {}
        _ => {
            return Err(Pdf2ImgError::FileNotFound {
                path: path.to_path_buf(),
            })
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(PdfSource::File(path.to_path_buf()))
}

/// Input file name without its extension: `docs/test.pdf` → `test`.
pub fn input_stem(path: &Path) -> Result<String, Pdf2ImgError> {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Pdf2ImgError::InvalidPath {
            detail: format!("'{}' has no file name", path.display()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_check_is_case_sensitive() {
        assert!(has_pdf_extension(Path::new("a/test.pdf")));
        assert!(!has_pdf_extension(Path::new("a/test.PDF")));
        assert!(!has_pdf_extension(Path::new("a/test.pdf.txt")));
        assert!(!has_pdf_extension(Path::new("a/test")));
        assert!(!has_pdf_extension(Path::new(".pdf")));
    }

    #[test]
    fn wrong_extension_wins_over_missing_file() {
        let err = validate_input(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(matches!(err, Pdf2ImgError::UnsupportedType { .. }));
    }

    #[test]
    fn missing_pdf_is_file_not_found() {
        let err = validate_input(Path::new("/definitely/not/here.pdf")).unwrap_err();
        assert!(matches!(err, Pdf2ImgError::FileNotFound { .. }));
    }

    #[test]
    fn directory_named_pdf_is_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("folder.pdf");
        std::fs::create_dir(&fake).unwrap();
        let err = validate_input(&fake).unwrap_err();
        assert!(matches!(err, Pdf2ImgError::FileNotFound { .. }));
    }

    #[test]
    fn existing_pdf_resolves_to_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("doc.pdf");
        std::fs::write(&pdf, b"%PDF-1.4\n").unwrap();
        let source = validate_input(&pdf).unwrap();
        assert_eq!(source.path(), Some(pdf.as_path()));
    }

    #[test]
    fn memory_source_has_no_path() {
        assert_eq!(PdfSource::Memory(vec![1, 2, 3]).path(), None);
    }

    #[test]
    fn stem_strips_directory_and_extension() {
        assert_eq!(input_stem(Path::new("docs/test.pdf")).unwrap(), "test");
        assert_eq!(input_stem(Path::new("archive.v2.pdf")).unwrap(), "archive.v2");
    }
}
