//! CLI binary for epaper2pdf.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `EditionConfig` and writes the merged PDF.

use anyhow::{Context, Result};
use clap::Parser;
use epaper2pdf::{
    fetch_edition, inspect, merge_directory, write_document, AdditionalImages, EPaperDate,
    EditionConfig, EditionProgressCallback, FailurePolicy, Phase, PortalMarkup, ProgressCallback,
    StorageMode,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: one 0–100 % bar plus a log line per finished page.
/// Pages may finish out of order when `--concurrency` > 1.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}%  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        let bar = ProgressBar::new(100);
        bar.set_style(style);
        bar.set_prefix("Fetching");
        bar.set_message("Connecting…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

impl EditionProgressCallback for CliProgressCallback {
    fn on_progress(&self, percent: u8, message: &str) {
        self.bar.set_position(u64::from(percent));
        self.bar.set_message(message.to_string());
    }

    fn on_phase(&self, phase: Phase) {
        match phase {
            Phase::Merging => self.bar.set_prefix("Merging"),
            Phase::Done | Phase::Failed => self.bar.finish_and_clear(),
            _ => {}
        }
    }

    fn on_page_complete(&self, page: usize, total: usize) {
        self.bar
            .println(format!("  {} Page {:>3}/{:<3}", green("✓"), page, total));
    }

    fn on_page_error(&self, page: usize, total: usize, error: &str) {
        // Truncate very long error messages to keep output tidy.
        let msg = match error.char_indices().nth(90) {
            Some((cut, _)) => format!("{}\u{2026}", &error[..cut]),
            None => error.to_string(),
        };
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            red("✗"),
            page,
            total,
            red(&msg)
        ));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Today's Ahmedabad edition → ./Gujarat_Samachar_<dd-mm-yyyy>.pdf
  epaper2pdf

  # A specific date, written to a chosen path
  epaper2pdf 05-03-2024 -o paper.pdf

  # Fail instead of skipping pages without an image
  epaper2pdf --on-missing-image abort 05-03-2024

  # Keep page images and page PDFs under ./archive
  epaper2pdf --keep-intermediates archive 05-03-2024

  # Rebuild a PDF from kept page PDFs
  epaper2pdf --merge-dir archive/PDFs/05-03-2024

  # List page URLs only
  epaper2pdf --list-pages 05-03-2024

  # JSON run report (stats and per-page outcome)
  epaper2pdf --json 05-03-2024 > report.json

ENVIRONMENT VARIABLES:
  EPAPER_*        every flag can also be set through the environment
                  (see --help for the variable of each flag)
  RUST_LOG        tracing filter, overrides -v / -q
"#;

/// Download a day's e-paper edition and merge it into one PDF.
#[derive(Parser, Debug)]
#[command(
    name = "epaper2pdf",
    version,
    about = "Download a day's e-paper edition and merge it into one PDF",
    long_about = "Discovers every page of the chosen edition, downloads each page image, \
places it on a fixed 2800×3974 white canvas, encodes it as a single-page PDF at JPEG \
quality 70 and merges the pages, in order, into one document.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Edition date, dd-mm-yyyy or yyyy-mm-dd. Default: today.
    date: Option<String>,

    /// Write the PDF here instead of ./Gujarat_Samachar_<date>.pdf.
    #[arg(short, long, env = "EPAPER_OUTPUT")]
    output: Option<PathBuf>,

    /// Edition path segment on the portal.
    #[arg(long, env = "EPAPER_EDITION", default_value = "ahmedabad")]
    edition: String,

    /// Portal origin.
    #[arg(long, env = "EPAPER_PORTAL", default_value = "https://epaper.gujaratsamachar.com")]
    portal: String,

    /// Pages processed at once (1 = strictly sequential).
    #[arg(short, long, env = "EPAPER_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// What a page without an e-paper image does to the run.
    #[arg(long, env = "EPAPER_ON_MISSING_IMAGE", value_enum, default_value = "skip")]
    on_missing_image: PolicyArg,

    /// What a failed download, decode or encode does to the run.
    #[arg(long, env = "EPAPER_ON_PAGE_ERROR", value_enum, default_value = "skip")]
    on_page_error: PolicyArg,

    /// Secondary images on a page: ignore, download (kept, not merged) or
    /// include (extra pages).
    #[arg(long, env = "EPAPER_ADDITIONAL_IMAGES", value_enum, default_value = "ignore")]
    additional_images: AdditionalArg,

    /// Keep page images and page PDFs under this directory.
    #[arg(long, env = "EPAPER_KEEP_INTERMEDIATES")]
    keep_intermediates: Option<PathBuf>,

    /// JPEG quality of each page (1–100).
    #[arg(long, env = "EPAPER_QUALITY", default_value_t = 70,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Per-request timeout in seconds.
    #[arg(long, env = "EPAPER_TIMEOUT", default_value_t = 60)]
    timeout: u64,

    /// Accept dates older than the portal's 30-day window.
    #[arg(long, env = "EPAPER_NO_DATE_CHECK")]
    no_date_check: bool,

    /// Print the edition's page URLs and exit.
    #[arg(long)]
    list_pages: bool,

    /// Merge the page PDFs of a kept run directory and exit.
    #[arg(long, value_name = "DIR")]
    merge_dir: Option<PathBuf>,

    /// Print a JSON run report on stdout.
    #[arg(long, env = "EPAPER_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "EPAPER_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "EPAPER_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "EPAPER_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PolicyArg {
    Abort,
    Skip,
}

impl From<PolicyArg> for FailurePolicy {
    fn from(v: PolicyArg) -> Self {
        match v {
            PolicyArg::Abort => FailurePolicy::Abort,
            PolicyArg::Skip => FailurePolicy::Skip,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum AdditionalArg {
    Ignore,
    Download,
    Include,
}

impl From<AdditionalArg> for AdditionalImages {
    fn from(v: AdditionalArg) -> Self {
        match v {
            AdditionalArg::Ignore => AdditionalImages::Ignore,
            AdditionalArg::Download => AdditionalImages::Download,
            AdditionalArg::Include => AdditionalImages::Include,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs while it is shown.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.list_pages;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
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

    // ── Re-merge mode ────────────────────────────────────────────────────
    if let Some(ref dir) = cli.merge_dir {
        return remerge(&cli, dir).await;
    }

    let date = match cli.date.as_deref() {
        Some(s) => EPaperDate::parse(s)?,
        None => EPaperDate::today(),
    };

    // ── List-only mode ───────────────────────────────────────────────────
    if cli.list_pages {
        let config = build_config(&cli, None)?;
        let info = inspect(date, &config)
            .await
            .context("Failed to list pages")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&info).context("Failed to serialize page list")?
            );
        } else {
            println!("Edition:  {} ({})", info.date, cli.edition);
            println!("Root:     {}", info.root_url);
            println!("Pages:    {}", info.pages.len());
            for page in &info.pages {
                println!("  {:>3}  {}", page.index, page.url);
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn EditionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run ──────────────────────────────────────────────────────────────
    let document = fetch_edition(date, &config)
        .await
        .with_context(|| format!("Fetching the {date} edition failed"))?;

    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(document.suggested_filename()));
    write_document(&document, &output_path)
        .await
        .context("Failed to write PDF")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&document).context("Failed to serialise report")?;
        println!("{json}");
    }

    if !cli.quiet {
        let stats = &document.stats;
        eprintln!(
            "{}  {}/{} pages  {}ms  →  {}",
            if stats.skipped_pages == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            stats.included_pages,
            stats.discovered_pages,
            stats.total_duration_ms,
            bold(&output_path.display().to_string()),
        );
        for page in document.pages.iter().filter(|p| !p.is_included()) {
            if let Some(ref e) = page.error {
                eprintln!("   {} {}", dim("skipped:"), e);
            }
        }
    }

    Ok(())
}

/// Merge a kept `PDFs/<date>` directory into one document.
async fn remerge(cli: &Cli, dir: &Path) -> Result<()> {
    let bytes = merge_directory(dir)
        .await
        .with_context(|| format!("Failed to merge {}", dir.display()))?;

    let output_path = match cli.output.clone() {
        Some(path) => path,
        None => {
            // A `PDFs/<dd-mm-yyyy>` directory gets the usual download name.
            let name = dir
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| EPaperDate::parse(n).ok())
                .map(|d| epaper2pdf::output::suggested_filename("Gujarat_Samachar", &d))
                .unwrap_or_else(|| "merged.pdf".to_string());
            PathBuf::from(name)
        }
    };

    tokio::fs::write(&output_path, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    if !cli.quiet {
        eprintln!(
            "{}  merged {}  →  {}",
            green("✔"),
            dir.display(),
            bold(&output_path.display().to_string())
        );
    }
    Ok(())
}

/// Map CLI args to `EditionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<EditionConfig> {
    let portal = PortalMarkup {
        base_url: cli.portal.clone(),
        edition: cli.edition.clone(),
        ..PortalMarkup::default()
    };
    let storage = match cli.keep_intermediates {
        Some(ref root) => StorageMode::Persistent(root.clone()),
        None => StorageMode::Transient,
    };

    let mut builder = EditionConfig::builder()
        .portal(portal)
        .concurrency(cli.concurrency)
        .on_missing_image(cli.on_missing_image.into())
        .on_page_error(cli.on_page_error.into())
        .additional_images(cli.additional_images.into())
        .jpeg_quality(cli.quality)
        .storage(storage)
        .request_timeout_secs(cli.timeout);

    if cli.no_date_check {
        builder = builder.date_window_days(None);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
