//! Per-call options, option resolution, and the process-wide defaults.
//!
//! Every conversion runs with an [`EffectiveOptions`] computed exactly once,
//! at the start of the call, by [`resolve`]: each field the caller left unset
//! in [`ConvertOptions`] falls back to the [`BaseOptions`] in force at that
//! moment. A concurrent [`set_global_base_options`] therefore never changes a
//! conversion that has already started.
//!
//! `page` is special. A call that does not mention `page` inherits the base
//! page; a call that sets `page` (including to "all pages") uses that value
//! verbatim. [`ConvertOptions::page`] is `Option<Option<u32>>` to keep those
//! two cases apart, and JSON input distinguishes a missing key from `null`.

use crate::config::{BaseOptions, ImageFormat};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Per-call overrides. Every `None` falls back to the base options.
///
/// # Example
/// ```rust
/// use edgequake_pdf2img::{ConvertOptions, ImageFormat};
///
/// let opts = ConvertOptions::new().format(ImageFormat::Png).page(2);
/// let from_json: ConvertOptions =
///     serde_json::from_str(r#"{"type":"png","page":2}"#).unwrap();
/// assert_eq!(opts, from_json);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertOptions {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ImageFormat>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub density: Option<u32>,

    #[serde(rename = "outputdir", default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    #[serde(rename = "outputname", default, skip_serializing_if = "Option::is_none")]
    pub output_name: Option<String>,

    /// `None`: not mentioned, inherit the base page.
    /// `Some(None)`: explicitly "all pages".
    /// `Some(Some(k))`: only page `k`.
    #[serde(
        default,
        deserialize_with = "explicit_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub page: Option<Option<u32>>,

    /// Time budget for the page-count probe, in milliseconds.
    #[serde(
        rename = "timeoutMilliseconds",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout_ms: Option<u64>,
}

/// Keeps an explicit `null` as `Some(None)`; a missing key stays `None` via
/// `#[serde(default)]`.
fn explicit_value<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl ConvertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn format(mut self, format: ImageFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn size(mut self, px: u32) -> Self {
        self.size = Some(px);
        self
    }

    pub fn density(mut self, dpi: u32) -> Self {
        self.density = Some(dpi);
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }

    /// Convert only this 1-based page.
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(Some(page));
        self
    }

    /// Convert every page, even if the base options name a single page.
    pub fn all_pages(mut self) -> Self {
        self.page = Some(None);
        self
    }

    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = Some(ms);
        self
    }
}

/// Fully-resolved options for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveOptions {
    pub format: ImageFormat,
    pub size: u32,
    pub density: u32,
    pub output_dir: Option<PathBuf>,
    pub output_name: Option<String>,
    pub page: Option<u32>,
    pub timeout: Option<Duration>,
}

impl EffectiveOptions {
    /// Drop the per-call time budget, keeping the rest as base options.
    pub fn into_base(self) -> BaseOptions {
        BaseOptions {
            format: self.format,
            size: self.size,
            density: self.density,
            output_dir: self.output_dir,
            output_name: self.output_name,
            page: self.page,
        }
    }
}

/// Merge per-call options over `base`.
///
/// Zero sizes/densities and empty paths/names count as unset, so they fall
/// back like missing fields do.
pub fn resolve(call: &ConvertOptions, base: &BaseOptions) -> EffectiveOptions {
    EffectiveOptions {
        format: call.format.unwrap_or(base.format),
        size: call.size.filter(|&s| s > 0).unwrap_or(base.size),
        density: call.density.filter(|&d| d > 0).unwrap_or(base.density),
        output_dir: call
            .output_dir
            .clone()
            .filter(|d| !d.as_os_str().is_empty())
            .or_else(|| base.output_dir.clone()),
        output_name: call
            .output_name
            .clone()
            .filter(|n| !n.is_empty())
            .or_else(|| base.output_name.clone()),
        page: match call.page {
            Some(explicit) => explicit,
            None => base.page,
        },
        timeout: call
            .timeout_ms
            .filter(|&ms| ms > 0)
            .map(Duration::from_millis),
    }
}

// ── Process-wide defaults ────────────────────────────────────────────────

static GLOBAL_BASE: Lazy<RwLock<BaseOptions>> = Lazy::new(|| RwLock::new(BaseOptions::default()));

/// Snapshot of the current process-wide defaults.
pub fn global_base_options() -> BaseOptions {
    GLOBAL_BASE.read().clone()
}

/// Replace the process-wide defaults.
///
/// The new defaults are `opts` resolved against the *hardcoded* defaults, not
/// merged with the previous global state: fields missing from `opts` go back
/// to `jpg` / 1024 / 600 / none. Last writer wins.
pub fn set_global_base_options(opts: &ConvertOptions) {
    let base = resolve(opts, &BaseOptions::default()).into_base();
    debug!("Global base options replaced: {:?}", base);
    *GLOBAL_BASE.write() = base;
}

/// Deprecated alias of [`set_global_base_options`].
#[deprecated(note = "use set_global_base_options, which does the same thing under a clearer name")]
pub fn set_options(opts: &ConvertOptions) {
    set_global_base_options(opts);
}

/// Restore the hardcoded defaults.
pub fn reset_global_base_options() {
    *GLOBAL_BASE.write() = BaseOptions::default();
}

#[cfg(test)]
pub(crate) static GLOBAL_TEST_LOCK: parking_lot::Mutex<()> = parking_lot::const_mutex(());

#[cfg(test)]
mod tests {
    use super::*;

    fn base_with_page(page: Option<u32>) -> BaseOptions {
        BaseOptions {
            page,
            output_dir: Some("base-out".into()),
            output_name: Some("base".into()),
            ..BaseOptions::default()
        }
    }

    #[test]
    fn empty_call_takes_every_base_field() {
        let base = base_with_page(Some(3));
        let eff = resolve(&ConvertOptions::new(), &base);
        assert_eq!(eff.format, ImageFormat::Jpg);
        assert_eq!(eff.size, 1024);
        assert_eq!(eff.density, 600);
        assert_eq!(eff.output_dir, Some(PathBuf::from("base-out")));
        assert_eq!(eff.output_name.as_deref(), Some("base"));
        assert_eq!(eff.page, Some(3));
        assert_eq!(eff.timeout, None);
    }

    #[test]
    fn call_fields_override_base() {
        let base = base_with_page(None);
        let call = ConvertOptions::new()
            .format(ImageFormat::Png)
            .size(200)
            .density(72)
            .output_dir("call-out")
            .output_name("call")
            .timeout_ms(10);
        let eff = resolve(&call, &base);
        assert_eq!(eff.format, ImageFormat::Png);
        assert_eq!(eff.size, 200);
        assert_eq!(eff.density, 72);
        assert_eq!(eff.output_dir, Some(PathBuf::from("call-out")));
        assert_eq!(eff.output_name.as_deref(), Some("call"));
        assert_eq!(eff.timeout, Some(Duration::from_millis(10)));
    }

    #[test]
    fn zero_and_empty_values_fall_back() {
        let base = base_with_page(None);
        let call = ConvertOptions {
            size: Some(0),
            density: Some(0),
            output_dir: Some(PathBuf::new()),
            output_name: Some(String::new()),
            ..ConvertOptions::default()
        };
        let eff = resolve(&call, &base);
        assert_eq!(eff.size, 1024);
        assert_eq!(eff.density, 600);
        assert_eq!(eff.output_dir, Some(PathBuf::from("base-out")));
        assert_eq!(eff.output_name.as_deref(), Some("base"));
    }

    #[test]
    fn explicit_all_pages_resets_base_page() {
        let base = base_with_page(Some(2));
        assert_eq!(resolve(&ConvertOptions::new().all_pages(), &base).page, None);
        assert_eq!(resolve(&ConvertOptions::new().page(1), &base).page, Some(1));
    }

    #[test]
    fn json_distinguishes_missing_and_null_page() {
        let missing: ConvertOptions = serde_json::from_str(r#"{"type":"jpg"}"#).unwrap();
        let null: ConvertOptions = serde_json::from_str(r#"{"type":"jpg","page":null}"#).unwrap();
        let two: ConvertOptions = serde_json::from_str(r#"{"page":2}"#).unwrap();
        assert_eq!(missing.page, None);
        assert_eq!(null.page, Some(None));
        assert_eq!(two.page, Some(Some(2)));
    }

    #[test]
    fn json_reads_classic_field_names() {
        let opts: ConvertOptions = serde_json::from_str(
            r#"{"type":"png","size":512,"density":300,"outputdir":"/tmp/out",
                "outputname":"test","timeoutMilliseconds":10}"#,
        )
        .unwrap();
        assert_eq!(opts.format, Some(ImageFormat::Png));
        assert_eq!(opts.size, Some(512));
        assert_eq!(opts.density, Some(300));
        assert_eq!(opts.output_dir, Some(PathBuf::from("/tmp/out")));
        assert_eq!(opts.output_name.as_deref(), Some("test"));
        assert_eq!(opts.timeout_ms, Some(10));
    }

    #[test]
    fn global_reconfiguration_recomputes_against_hardcoded_defaults() {
        let _guard = GLOBAL_TEST_LOCK.lock();

        set_global_base_options(&ConvertOptions::new().size(300).output_name("first"));
        set_global_base_options(&ConvertOptions::new().density(72));

        let g = global_base_options();
        assert_eq!(g.density, 72);
        // Not carried over from the first call.
        assert_eq!(g.size, 1024);
        assert_eq!(g.output_name, None);

        reset_global_base_options();
        assert_eq!(global_base_options(), BaseOptions::default());
    }

    #[test]
    fn snapshot_is_isolated_from_later_reconfiguration() {
        let _guard = GLOBAL_TEST_LOCK.lock();

        set_global_base_options(&ConvertOptions::new().output_name("before"));
        let snapshot = global_base_options();
        set_global_base_options(&ConvertOptions::new().output_name("after"));

        assert_eq!(snapshot.output_name.as_deref(), Some("before"));
        assert_eq!(global_base_options().output_name.as_deref(), Some("after"));
        reset_global_base_options();
    }

    #[test]
    #[allow(deprecated)]
    fn set_options_is_an_alias() {
        let _guard = GLOBAL_TEST_LOCK.lock();

        set_options(&ConvertOptions::new().format(ImageFormat::Png).page(4));
        let g = global_base_options();
        assert_eq!(g.format, ImageFormat::Png);
        assert_eq!(g.page, Some(4));
        reset_global_base_options();
    }
}
