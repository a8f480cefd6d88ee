//! Integration tests for the process-wide default options.
//!
//! These live in their own test binary: `gm_locate::gm_path` caches its
//! answer for the life of the process, and the `convert` test below points
//! it at a scripted `gm` through `PDF2IMG_GM_PATH` before anything else can
//! look it up.

#[cfg(unix)]
mod common;

use async_trait::async_trait;
use edgequake_pdf2img::{
    convert_with, reset_global_base_options, set_global_base_options, ConversionConfig,
    ConvertOptions, ImageFormat, PageJob, Rasterizer, ToolError,
};
use std::path::Path;
use std::sync::Arc;

/// Every test that reads or writes the global defaults holds this.
static GLOBALS: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

/// Reports two pages and writes a few bytes per page.
struct TwoPages;

#[async_trait]
impl Rasterizer for TwoPages {
    fn name(&self) -> &str {
        "two-pages"
    }

    async fn identify(&self, _pdf: &Path, _format: &str) -> Result<String, ToolError> {
        Ok("1 2 ".into())
    }

    async fn convert_page(&self, job: &PageJob<'_>) -> Result<(), ToolError> {
        tokio::fs::write(job.output, b"placeholder")
            .await
            .map_err(|e| ToolError::Other(e.to_string()))
    }
}

fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|rd| {
            rd.filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

#[tokio::test]
async fn global_defaults_are_snapshotted_per_call() {
    let _guard = GLOBALS.lock().await;
    let tmp = tempfile::tempdir().unwrap();
    let pdf = tmp.path().join("test.pdf");
    std::fs::write(&pdf, b"%PDF-1.4\n").unwrap();
    let out = tmp.path().join("output");

    set_global_base_options(
        &ConvertOptions::new()
            .format(ImageFormat::Png)
            .output_dir(&out)
            .output_name("snap"),
    );
    let snapshot = ConversionConfig {
        rasterizer: Some(Arc::new(TwoPages)),
        ..ConversionConfig::from_global()
    };

    // Reconfiguring after the snapshot must not leak into the call.
    set_global_base_options(&ConvertOptions::new().format(ImageFormat::Gif));
    let output = convert_with(&pdf, &ConvertOptions::new(), &snapshot).await;
    reset_global_base_options();

    let output = output.unwrap();
    assert_eq!(entries(&out), vec!["snap_1.png", "snap_2.png"]);
    assert_eq!(output.pages[0].name, "snap_1.png");
}

#[cfg(unix)]
#[tokio::test]
async fn convert_uses_global_defaults_and_recovers_after_timeout() {
    use edgequake_pdf2img::convert;

    let _guard = GLOBALS.lock().await;
    let tools = tempfile::tempdir().unwrap();
    let gm = common::script_gm(tools.path(), 3);
    std::env::set_var(gm_locate::GM_PATH_ENV, &gm);

    let work = tempfile::tempdir().unwrap();
    let pdf = work.path().join("report.pdf");
    std::fs::write(&pdf, b"%PDF-1.4\n").unwrap();
    let out = work.path().join("images");

    set_global_base_options(
        &ConvertOptions::new()
            .format(ImageFormat::Png)
            .output_dir(&out)
            .output_name("glob"),
    );

    // A page-count query that outlives the budget fails without writing pages.
    let slow = tools.path().join(common::SLOW_FLAG);
    std::fs::write(&slow, b"").unwrap();
    let timed_out = convert(&pdf, &ConvertOptions::new().timeout_ms(100)).await;
    std::fs::remove_file(&slow).unwrap();

    // The failed call leaves the defaults untouched for the next one.
    let second = convert(&pdf, &ConvertOptions::new()).await;
    reset_global_base_options();

    let err = timed_out.unwrap_err();
    assert!(err.is_timeout(), "got {err:?}");

    let output = second.unwrap();
    let names: Vec<&str> = output.pages.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["glob_1.png", "glob_2.png", "glob_3.png"]);
    assert_eq!(entries(&out), vec!["glob_1.png", "glob_2.png", "glob_3.png"]);
    assert_eq!(output.output_dir, out);

    let calls = common::calls(tools.path());
    assert!(calls.iter().all(|c| !c.contains(".jpg")), "calls: {calls:#?}");
}
