//! # gm-locate
//!
//! Find a [GraphicsMagick](http://www.graphicsmagick.org/) `gm` executable
//! without asking users to configure anything, so that `pdf2img` works on a
//! machine where `gm` was installed by the system package manager, Homebrew,
//! or the Windows installer.
//!
//! ## How it works
//!
//! On first call to [`gm_path`]:
//!
//! 1. Checks `PDF2IMG_GM_PATH` for an explicit executable.
//! 2. Checks the Homebrew prefix (`$HOMEBREW_PREFIX/bin/gm`).
//! 3. Checks well-known install directories for the current platform.
//! 4. Scans every directory on `PATH`.
//!
//! The first candidate that exists as a regular file wins and is cached for the
//! rest of the process lifetime.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use gm_locate::{gm_path, gm_version};
//!
//! let gm = gm_path().expect("GraphicsMagick unavailable");
//! println!("{}", gm_version(&gm).expect("gm version"));
//! ```
//!
//! ## Platform support
//!
//! | OS      | Executable | Extra locations searched                     |
//! |---------|------------|----------------------------------------------|
//! | macOS   | `gm`       | `/opt/homebrew/bin`, `/usr/local/bin`        |
//! | Linux   | `gm`       | `/usr/bin`, `/usr/local/bin`                 |
//! | Windows | `gm.exe`   | `C:\Program Files\GraphicsMagick*`           |
//!
//! ## Environment variable overrides
//!
//! - `PDF2IMG_GM_PATH`: path to an existing `gm` executable; skips the search.

use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use thiserror::Error;

// ── Public constants ─────────────────────────────────────────────────────────

/// Environment variable naming an explicit `gm` executable.
pub const GM_PATH_ENV: &str = "PDF2IMG_GM_PATH";

/// Executable file name on the current platform.
#[cfg(windows)]
pub const GM_EXECUTABLE: &str = "gm.exe";
/// Executable file name on the current platform.
#[cfg(not(windows))]
pub const GM_EXECUTABLE: &str = "gm";

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by gm-locate operations.
#[derive(Error, Debug)]
pub enum GmLocateError {
    /// No candidate location held a `gm` executable.
    #[error(
        "GraphicsMagick (`gm`) not found after checking {searched} locations.\n\
Install it (macOS: 'brew install graphicsmagick', Linux: 'apt install graphicsmagick')\n\
or set PDF2IMG_GM_PATH=/path/to/gm."
    )]
    NotFound { searched: usize },

    /// The executable exists but could not be started.
    #[error("Failed to execute '{path}': {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `gm version` ran but did not report a GraphicsMagick version.
    #[error("'{path}' is not a working GraphicsMagick executable: {reason}")]
    VersionCheck { path: PathBuf, reason: String },
}

// ── Thread-safe singleton path cache ─────────────────────────────────────────

static RESOLVED_PATH: OnceLock<PathBuf> = OnceLock::new();

// ── Public API ───────────────────────────────────────────────────────────────

/// Returns the cached `gm` path, searching for it on the first call.
///
/// Safe to call from multiple threads simultaneously; a lost race simply
/// performs the (cheap) search twice.
pub fn gm_path() -> Result<PathBuf, GmLocateError> {
    if let Some(path) = RESOLVED_PATH.get() {
        return Ok(path.clone());
    }

    let path = locate_gm()?;
    let _ = RESOLVED_PATH.set(path.clone());
    Ok(path)
}

/// Returns `true` if a `gm` executable can be found.
pub fn is_gm_available() -> bool {
    gm_path().is_ok()
}

/// Searches every candidate location for a `gm` executable, without caching.
pub fn locate_gm() -> Result<PathBuf, GmLocateError> {
    if let Some(p) = stale_override(std::env::var_os(GM_PATH_ENV).as_deref()) {
        eprintln!(
            "gm-locate: {} '{}' not found; searching other locations …",
            GM_PATH_ENV,
            p.display()
        );
    }
    let candidates = gm_candidates();
    first_existing(&candidates).ok_or(GmLocateError::NotFound {
        searched: candidates.len(),
    })
}

/// Candidate executable paths, in search order, without duplicates.
pub fn gm_candidates() -> Vec<PathBuf> {
    candidates_from(
        std::env::var_os(GM_PATH_ENV),
        std::env::var_os("HOMEBREW_PREFIX"),
        std::env::var_os("PATH"),
    )
}

/// Runs `gm version` and returns its first output line,
/// e.g. `GraphicsMagick 1.3.42 2023-09-23 Q16 http://www.GraphicsMagick.org/`.
pub fn gm_version(path: &Path) -> Result<String, GmLocateError> {
    let output = Command::new(path)
        .arg("version")
        .output()
        .map_err(|source| GmLocateError::Spawn {
            path: path.to_path_buf(),
            source,
        })?;

    if !output.status.success() {
        return Err(GmLocateError::VersionCheck {
            path: path.to_path_buf(),
            reason: format!("exit status {}", output.status),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_version_line(&stdout).ok_or_else(|| GmLocateError::VersionCheck {
        path: path.to_path_buf(),
        reason: "output does not mention GraphicsMagick".to_string(),
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────────

fn candidates_from(
    env_override: Option<OsString>,
    homebrew_prefix: Option<OsString>,
    path_env: Option<OsString>,
) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    let mut push = |path: PathBuf| {
        if seen.insert(path.clone()) {
            candidates.push(path);
        }
    };

    // 1. Environment variable override.
    if let Some(value) = env_override.filter(|v| !v.is_empty()) {
        push(PathBuf::from(value));
    }

    // 2. Homebrew.
    if let Some(prefix) = homebrew_prefix.filter(|v| !v.is_empty()) {
        push(PathBuf::from(prefix).join("bin").join(GM_EXECUTABLE));
    }

    // 3. Well-known install directories.
    for dir in well_known_dirs() {
        push(PathBuf::from(dir).join(GM_EXECUTABLE));
    }

    // 4. PATH.
    if let Some(path_env) = path_env {
        for dir in std::env::split_paths(&path_env) {
            push(dir.join(GM_EXECUTABLE));
        }
    }

    candidates
}

/// The override path, if one is set but does not name a file.
fn stale_override(env_override: Option<&OsStr>) -> Option<PathBuf> {
    let value = env_override.filter(|v| !v.is_empty())?;
    let path = PathBuf::from(value);
    (!path.is_file()).then_some(path)
}

fn well_known_dirs() -> &'static [&'static str] {
    if cfg!(target_os = "macos") {
        &["/opt/homebrew/bin", "/usr/local/bin", "/opt/local/bin"]
    } else if cfg!(windows) {
        &[
            "C:\\Program Files\\GraphicsMagick",
            "C:\\Program Files\\GraphicsMagick-Q16",
            "C:\\Program Files\\GraphicsMagick-Q8",
        ]
    } else {
        &["/usr/bin", "/usr/local/bin"]
    }
}

fn first_existing(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates
        .iter()
        .find(|c| std::fs::metadata(c).map(|m| m.is_file()).unwrap_or(false))
        .cloned()
}

fn parse_version_line(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .find(|l| l.starts_with("GraphicsMagick"))
        .map(str::to_string)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_override_is_searched_first() {
        let c = candidates_from(Some("/opt/custom/gm".into()), None, None);
        assert_eq!(c[0], PathBuf::from("/opt/custom/gm"));
    }

    #[test]
    fn empty_env_override_is_ignored() {
        let c = candidates_from(Some("".into()), None, None);
        assert!(!c.contains(&PathBuf::from("")));
    }

    #[test]
    fn stale_override_flags_only_missing_paths() {
        assert_eq!(stale_override(None), None);
        assert_eq!(stale_override(Some(OsStr::new(""))), None);

        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join(GM_EXECUTABLE);
        std::fs::write(&exe, b"#!/bin/sh\n").unwrap();
        assert_eq!(stale_override(Some(exe.as_os_str())), None);

        let missing = dir.path().join("nope").join(GM_EXECUTABLE);
        assert_eq!(stale_override(Some(missing.as_os_str())), Some(missing));
        assert_eq!(
            stale_override(Some(dir.path().as_os_str())),
            Some(dir.path().to_path_buf())
        );
    }

    #[test]
    fn candidates_are_deduplicated() {
        let dir = well_known_dirs()[0];
        let path_env = std::env::join_paths([dir, dir]).unwrap();
        let c = candidates_from(None, None, Some(path_env));
        let target = PathBuf::from(dir).join(GM_EXECUTABLE);
        assert_eq!(c.iter().filter(|p| **p == target).count(), 1);
    }

    #[test]
    fn homebrew_prefix_precedes_path() {
        let path_env = std::env::join_paths(["/somewhere/bin"]).unwrap();
        let c = candidates_from(None, Some("/brew".into()), Some(path_env));
        let brew = c.iter().position(|p| p.starts_with("/brew")).unwrap();
        let path = c.iter().position(|p| p.starts_with("/somewhere")).unwrap();
        assert!(brew < path);
    }

    #[test]
    fn first_existing_skips_missing_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join(GM_EXECUTABLE);
        std::fs::write(&exe, b"#!/bin/sh\n").unwrap();

        let candidates = vec![
            dir.path().join("missing").join(GM_EXECUTABLE),
            dir.path().to_path_buf(),
            exe.clone(),
        ];
        assert_eq!(first_existing(&candidates), Some(exe));
    }

    #[test]
    fn version_line_is_extracted() {
        let out = "GraphicsMagick 1.3.42 2023-09-23 Q16 http://www.GraphicsMagick.org/\n\
Copyright (C) 2002-2023 GraphicsMagick Group.\n";
        assert_eq!(
            parse_version_line(out).as_deref(),
            Some("GraphicsMagick 1.3.42 2023-09-23 Q16 http://www.GraphicsMagick.org/")
        );
        assert_eq!(parse_version_line("Version: ImageMagick 7.1.1"), None);
    }
}
