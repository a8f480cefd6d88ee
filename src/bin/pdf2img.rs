//! CLI binary for edgequake-pdf2img.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConvertOptions` / `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf2img::{
    convert_with, inspect, ConversionConfig, ConversionProgressCallback, ConversionResult,
    ConvertOptions, GraphicsMagick, ImageFormat, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per page.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Per-page wall-clock start times for elapsed reporting.
    start_times: Mutex<HashMap<u32, Instant>>,
}

impl CliProgressCallback {
    /// Spinner until `on_conversion_start` tells us the page count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Counting pages…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Rendering");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self, page: u32) -> f64 {
        self.start_times
            .lock()
            .remove(&page)
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Rendering {total_pages} page(s)…"))
        ));
    }

    fn on_page_start(&self, page: u32, _total: usize) {
        self.start_times.lock().insert(page, Instant::now());
        self.bar.set_message(format!("page {page}"));
    }

    fn on_page_complete(&self, page: u32, total: usize, size_kb: f64) {
        let secs = self.elapsed_secs(page);
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<10}  {}",
            green("✓"),
            page,
            total,
            dim(&format!("{size_kb:>7.1} KB")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page: u32, total: usize, error: &str) {
        let secs = self.elapsed_secs(page);
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page,
            total,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
    }

    fn on_conversion_complete(&self, total_pages: usize, success_count: usize) {
        self.bar.finish_and_clear();
        if success_count == total_pages {
            eprintln!(
                "{} {} page(s) written",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} page(s) written before stopping",
                red("✘"),
                bold(&success_count.to_string()),
                total_pages,
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # All pages → ./test/test_1.jpg, ./test/test_2.jpg, …
  pdf2img test.pdf

  # PNG, 800px box, into ./output with a custom base name
  pdf2img --type png --size 800 --outputdir ./output --outputname scan test.pdf

  # Only page 3, at 300 DPI
  pdf2img --page 3 --density 300 test.pdf

  # Give up if counting pages takes longer than 5 s
  pdf2img --timeout-ms 5000 big.pdf

  # Machine-readable result ({"result": ..., "message": ...})
  pdf2img --json test.pdf

  # Page count only
  pdf2img --inspect-only test.pdf

ENVIRONMENT VARIABLES:
  PDF2IMG_GM_PATH   Path to the `gm` executable (skips the PATH search)
  PDF2IMG_*         Every flag can also be set from its PDF2IMG_ variable
  RUST_LOG          Overrides the log filter (e.g. RUST_LOG=edgequake_pdf2img=debug)

SETUP:
  GraphicsMagick (with Ghostscript for PDF input) must be installed:
    macOS:   brew install graphicsmagick ghostscript
    Debian:  apt install graphicsmagick ghostscript
"#;

/// Convert PDF pages to images with GraphicsMagick.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2img",
    version,
    about = "Convert PDF pages to JPEG/PNG images with GraphicsMagick",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to a local `.pdf` file.
    input: PathBuf,

    /// Output image type.
    #[arg(short = 't', long = "type", env = "PDF2IMG_TYPE", value_enum)]
    format: Option<TypeArg>,

    /// Resize target in pixels (fits inside SIZE×SIZE, aspect ratio kept).
    #[arg(short, long, env = "PDF2IMG_SIZE")]
    size: Option<u32>,

    /// Rendering density in DPI.
    #[arg(short, long, env = "PDF2IMG_DENSITY")]
    density: Option<u32>,

    /// Output directory (default: the input's stem, in the working directory).
    #[arg(short, long, env = "PDF2IMG_OUTPUTDIR")]
    outputdir: Option<PathBuf>,

    /// Output base name (default: the input's stem).
    #[arg(short = 'n', long, env = "PDF2IMG_OUTPUTNAME")]
    outputname: Option<String>,

    /// Convert only this 1-based page.
    #[arg(short, long, env = "PDF2IMG_PAGE",
          value_parser = clap::value_parser!(u32).range(1..))]
    page: Option<u32>,

    /// Time budget for counting pages, in milliseconds.
    #[arg(long, env = "PDF2IMG_TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    /// Path to the `gm` executable.
    #[arg(long, env = "PDF2IMG_GM_PATH")]
    gm: Option<PathBuf>,

    /// Print the `{result, message}` report as JSON on stdout.
    #[arg(long, env = "PDF2IMG_JSON")]
    json: bool,

    /// Print the page count only, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2IMG_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2IMG_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2IMG_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum TypeArg {
    Jpg,
    Jpeg,
    Png,
    Gif,
    Tiff,
    Bmp,
    Webp,
}

impl From<TypeArg> for ImageFormat {
    fn from(v: TypeArg) -> Self {
        match v {
            TypeArg::Jpg => ImageFormat::Jpg,
            TypeArg::Jpeg => ImageFormat::Jpeg,
            TypeArg::Png => ImageFormat::Png,
            TypeArg::Gif => ImageFormat::Gif,
            TypeArg::Tiff => ImageFormat::Tiff,
            TypeArg::Bmp => ImageFormat::Bmp,
            TypeArg::Webp => ImageFormat::Webp,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // INFO logs are noise while the progress bar is drawing.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress || cli.json {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Locate GraphicsMagick ────────────────────────────────────────────
    // Without --gm the library runs the lookup itself, so a missing tool is
    // reported like any other conversion error (including under --json).
    let gm = cli.gm.as_ref().map(GraphicsMagick::new);
    if cli.verbose {
        let program = match gm {
            Some(ref gm) => Ok(gm.program().to_path_buf()),
            None => gm_locate::gm_path(),
        };
        match program.and_then(|p| gm_locate::gm_version(&p).map(|v| (p, v))) {
            Ok((p, v)) => tracing::debug!("{} ({})", v, p.display()),
            Err(e) => tracing::warn!("GraphicsMagick check failed: {}", e),
        }
    }

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new_dynamic() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, gm, progress_cb)?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let pages = inspect(&cli.input, &config)
            .await
            .context("Failed to count pages")?;
        if cli.json {
            println!("{}", serde_json::json!({ "pages": pages }));
        } else {
            println!("File:   {}", cli.input.display());
            println!("Pages:  {}", pages);
        }
        return Ok(());
    }

    // ── Run conversion ───────────────────────────────────────────────────
    let options = build_options(&cli);
    let result = convert_with(&cli.input, &options, &config).await;

    if cli.json {
        let report = ConversionResult::from(&result);
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise result")?
        );
        if !report.is_success() {
            std::process::exit(1);
        }
        return Ok(());
    }

    let output = result.context("Conversion failed")?;
    if !cli.quiet {
        for page in &output.pages {
            println!("{}", page.path.display());
        }
        if !show_progress {
            eprintln!(
                "Converted {}/{} pages in {}ms → {}",
                output.stats.converted_pages,
                output.stats.total_pages,
                output.stats.total_duration_ms,
                output.output_dir.display()
            );
        }
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
///
/// Flags left unset fall through to the library defaults (jpg / 1024 / 600).
fn build_config(
    cli: &Cli,
    gm: Option<GraphicsMagick>,
    progress: Option<ProgressCallback>,
) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder();
    if let Some(gm) = gm {
        builder = builder.rasterizer(Arc::new(gm));
    }
    if let Some(ms) = cli.timeout_ms {
        builder = builder.probe_timeout_ms(ms);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    builder.build().context("Invalid configuration")
}

/// Map CLI args to per-call `ConvertOptions`.
fn build_options(cli: &Cli) -> ConvertOptions {
    let mut options = ConvertOptions::new();
    if let Some(t) = cli.format {
        options = options.format(t.into());
    }
    if let Some(s) = cli.size {
        options = options.size(s);
    }
    if let Some(d) = cli.density {
        options = options.density(d);
    }
    if let Some(ref dir) = cli.outputdir {
        options = options.output_dir(dir);
    }
    if let Some(ref name) = cli.outputname {
        options = options.output_name(name);
    }
    if let Some(p) = cli.page {
        options = options.page(p);
    }
    options
}
