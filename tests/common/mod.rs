//! Shared helpers for integration tests that drive a real child process.
//!
//! `script_gm` writes a tiny POSIX shell stand-in for GraphicsMagick: it
//! answers `identify` with `pages` page tokens and `convert` by writing a few
//! bytes to its last argument. Each invocation appends its arguments to
//! `calls.log`. While a file named `slow` exists next to the script,
//! `identify` sleeps for two seconds first and then touches
//! `identify-finished`.

#![cfg(unix)]
#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

pub const CALLS_LOG: &str = "calls.log";
pub const SLOW_FLAG: &str = "slow";
pub const IDENTIFY_FINISHED: &str = "identify-finished";

pub fn script_gm(dir: &Path, pages: usize) -> PathBuf {
    let tokens: String = (1..=pages).map(|p| format!("{p} ")).collect();
    let script = format!(
        r#"#!/bin/sh
dir='{dir}'
echo "$@" >> "$dir/{CALLS_LOG}"
case "$1" in
  identify)
    if [ -e "$dir/{SLOW_FLAG}" ]; then
      sleep 2
      touch "$dir/{IDENTIFY_FINISHED}"
    fi
    printf '{tokens}'
    ;;
  convert)
    for last; do :; done
    printf 'fake image bytes' > "$last"
    ;;
  *)
    exit 2
    ;;
esac
"#,
        dir = dir.display(),
    );

    let path = dir.join("gm");
    std::fs::write(&path, script).expect("write gm script");
    let mut perms = std::fs::metadata(&path).expect("stat gm script").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).expect("chmod gm script");
    path
}

pub fn calls(dir: &Path) -> Vec<String> {
    std::fs::read_to_string(dir.join(CALLS_LOG))
        .map(|s| s.lines().map(str::to_string).collect())
        .unwrap_or_default()
}
