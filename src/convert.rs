//! Eager (whole-edition) entry points.
//!
//! [`fetch_edition`] runs the full pipeline for one date and returns only
//! once the merged document exists. Use [`crate::stream::page_stream`]
//! instead to receive page documents while later pages are still being
//! processed.
//!
//! ## Progress
//!
//! ```text
//!   0     connecting
//!  10     Website connected successfully
//!  20     Page links scraped successfully
//!  20–80  one step per finished page
//!  90     merging
//! 100     done
//! ```

use crate::config::{EditionConfig, FailurePolicy};
use crate::date::EPaperDate;
use crate::error::{EpaperError, PageError};
use crate::output::{suggested_filename, EditionInfo, EditionStats, FinalDocument, PageOutcome};
use crate::pipeline::discover::{discover_pages, PageRef};
use crate::pipeline::encode::PageDocument;
use crate::pipeline::http;
use crate::pipeline::merge::merge_pages;
use crate::pipeline::page::{process_page, PageContext};
use crate::pipeline::storage::prepare_storage;
use crate::progress::{Phase, ProgressReporter, CONNECTED, PAGES_END, PAGES_START};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Download one day's edition and merge it into a single PDF.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(FinalDocument)` when at least one page made it into the document,
/// even if others were skipped (check `document.stats.skipped_pages`).
///
/// # Errors
/// Returns `Err(EpaperError)` for fatal errors only:
/// - date outside the configured window
/// - root page unreachable or without page navigation
/// - a page failure whose policy is [`FailurePolicy::Abort`]
/// - every page skipped ([`EpaperError::NoPages`])
/// - merge failure
///
/// No document is produced on error. Transient intermediates are removed
/// either way.
///
/// # Example
/// ```rust,no_run
/// use epaper2pdf::{fetch_edition, EPaperDate, EditionConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let date = EPaperDate::parse("05-03-2024")?;
/// let document = fetch_edition(date, &EditionConfig::default()).await?;
/// std::fs::write(document.suggested_filename(), &document.bytes)?;
/// # Ok(())
/// # }
/// ```
pub async fn fetch_edition(
    date: EPaperDate,
    config: &EditionConfig,
) -> Result<FinalDocument, EpaperError> {
    let reporter = Arc::new(ProgressReporter::new(config.progress_callback.clone()));
    match run(date, config, Arc::clone(&reporter)).await {
        Ok(document) => Ok(document),
        Err(e) => {
            warn!("Edition {} failed: {}", date, e);
            reporter.phase(Phase::Failed);
            Err(e)
        }
    }
}

/// Download an edition and write it to `output_path`.
///
/// Uses atomic write (temp file + rename) so a failed run never leaves a
/// partial PDF behind.
pub async fn fetch_edition_to_file(
    date: EPaperDate,
    output_path: impl AsRef<Path>,
    config: &EditionConfig,
) -> Result<EditionStats, EpaperError> {
    let document = fetch_edition(date, config).await?;
    write_document(&document, output_path).await?;
    Ok(document.stats)
}

/// Write a finished document atomically.
pub async fn write_document(
    document: &FinalDocument,
    output_path: impl AsRef<Path>,
) -> Result<(), EpaperError> {
    let path = output_path.as_ref();
    let write_err = |source| EpaperError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, &document.bytes)
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;

    info!("Wrote {} ({} bytes)", path.display(), document.bytes.len());
    Ok(())
}

/// Synchronous wrapper around [`fetch_edition`].
///
/// Creates a temporary tokio runtime internally.
pub fn fetch_edition_sync(
    date: EPaperDate,
    config: &EditionConfig,
) -> Result<FinalDocument, EpaperError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| EpaperError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(fetch_edition(date, config))
}

/// List an edition's pages without downloading any image.
pub async fn inspect(date: EPaperDate, config: &EditionConfig) -> Result<EditionInfo, EpaperError> {
    ensure_available(date, config)?;
    let client = client_for(config)?;
    let root_url = date.root_url(&config.portal.base_url, &config.portal.edition);
    let pages = discover_pages(&client, &root_url, &config.portal, config.request_timeout_secs).await?;
    Ok(EditionInfo {
        date,
        root_url,
        pages,
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Reject dates outside the configured window.
pub(crate) fn ensure_available(date: EPaperDate, config: &EditionConfig) -> Result<(), EpaperError> {
    match config.date_window_days {
        Some(days) => date.ensure_within(EPaperDate::today(), days),
        None => Ok(()),
    }
}

pub(crate) fn client_for(config: &EditionConfig) -> Result<Client, EpaperError> {
    http::build_client(config.request_timeout_secs)
        .map_err(|e| EpaperError::Internal(format!("Failed to build HTTP client: {e}")))
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}

async fn run(
    date: EPaperDate,
    config: &EditionConfig,
    reporter: Arc<ProgressReporter>,
) -> Result<FinalDocument, EpaperError> {
    let total_start = Instant::now();
    ensure_available(date, config)?;
    info!("Fetching edition {} ({})", date, config.portal.edition);

    // ── Step 1: Discover pages ───────────────────────────────────────────
    reporter.phase(Phase::Discovering);
    reporter.progress(Phase::Discovering.base_percent(), "Connecting to the e-paper portal");
    let client = client_for(config)?;
    let root_url = date.root_url(&config.portal.base_url, &config.portal.edition);

    let discovery_start = Instant::now();
    let pages = discover_pages(&client, &root_url, &config.portal, config.request_timeout_secs).await?;
    let discovery_duration_ms = elapsed_ms(discovery_start);
    reporter.progress(CONNECTED, "Website connected successfully");
    reporter.progress(PAGES_START, "Page links scraped successfully");

    // ── Step 2: Per-page sub-pipeline ────────────────────────────────────
    let storage = prepare_storage(&date, &config.storage).await?;
    let ctx = Arc::new(PageContext {
        client,
        config: config.clone(),
        storage,
        reporter: Arc::clone(&reporter),
        total: pages.len(),
    });

    let pages_start = Instant::now();
    let processed = process_pages(&ctx, &pages).await?;
    let pages_duration_ms = elapsed_ms(pages_start);
    reporter.progress(PAGES_END, "All pages processed");

    let discovered = pages.len();
    let included = processed.outcomes.iter().filter(|o| o.is_included()).count();
    if processed.documents.is_empty() {
        let first_error = processed
            .outcomes
            .iter()
            .find_map(|o| o.error.as_ref())
            .map(ToString::to_string)
            .unwrap_or_else(|| "no page produced a document".to_string());
        return Err(EpaperError::NoPages {
            date: date.portal_segment(),
            discovered,
            first_error,
        });
    }

    // ── Step 3: Merge ────────────────────────────────────────────────────
    reporter.phase(Phase::Merging);
    reporter.progress(Phase::Merging.base_percent(), "Merging page documents");
    let merge_start = Instant::now();
    let document_pages = processed.documents.len();
    let documents = processed.documents;
    let bytes = tokio::task::spawn_blocking(move || merge_pages(documents))
        .await
        .map_err(|e| EpaperError::Internal(format!("merge task panicked: {e}")))??;
    let merge_duration_ms = elapsed_ms(merge_start);

    // Transient intermediates go away with the context.
    drop(ctx);

    let filename = suggested_filename(&config.filename_prefix, &date);
    let stats = EditionStats {
        discovered_pages: discovered,
        included_pages: included,
        skipped_pages: discovered - included,
        document_pages,
        downloaded_bytes: processed.downloaded_bytes,
        output_bytes: bytes.len() as u64,
        discovery_duration_ms,
        pages_duration_ms,
        merge_duration_ms,
        total_duration_ms: elapsed_ms(total_start),
    };

    info!(
        "Edition {} complete: {}/{} pages, {} bytes, {}ms total",
        date,
        included,
        discovered,
        bytes.len(),
        stats.total_duration_ms
    );
    reporter.phase(Phase::Done);
    reporter.progress(Phase::Done.base_percent(), &format!("{filename} is ready"));

    Ok(FinalDocument {
        date,
        bytes,
        page_count: document_pages,
        pages: processed.outcomes,
        stats,
        filename,
    })
}

/// Per-page results of a run, in page order.
struct ProcessedPages {
    outcomes: Vec<PageOutcome>,
    documents: Vec<PageDocument>,
    downloaded_bytes: u64,
}

/// Run every page through the sub-pipeline, `concurrency` at a time.
///
/// Pages finish in any order; `outcomes` is sorted afterwards and
/// `documents` carry their own index for the merge. Returns early on the
/// first failure whose policy is `Abort`, dropping the pages still in
/// flight.
async fn process_pages(
    ctx: &Arc<PageContext>,
    pages: &[PageRef],
) -> Result<ProcessedPages, EpaperError> {
    let total = pages.len();
    let mut results = stream::iter(pages.iter().cloned().map(|page| {
        let ctx = Arc::clone(ctx);
        async move {
            let result = process_page(&ctx, &page).await;
            (page, result)
        }
    }))
    .buffer_unordered(ctx.config.concurrency);

    let mut processed = ProcessedPages {
        outcomes: Vec::with_capacity(total),
        documents: Vec::with_capacity(total),
        downloaded_bytes: 0,
    };
    let mut done = 0;

    while let Some((page, result)) = results.next().await {
        done += 1;
        match result {
            Ok(output) => {
                ctx.reporter.page_done(page.index, total, done, None);
                processed.downloaded_bytes += output.downloaded_bytes;
                processed.outcomes.push(PageOutcome {
                    page: page.index,
                    url: page.url,
                    image_url: output.urls.primary,
                    additional_image_urls: output.urls.additional,
                    document_pages: output.documents.len(),
                    error: None,
                });
                processed.documents.extend(output.documents);
            }
            Err(e) => {
                ctx.reporter
                    .page_done(page.index, total, done, Some(&e.to_string()));
                if ctx.config.policy_for(&e) == FailurePolicy::Abort {
                    return Err(e.into());
                }
                warn!("Skipping page {}: {}", page.index, e);
                processed.outcomes.push(skipped(page, e));
            }
        }
    }

    processed.outcomes.sort_by_key(|o| o.page);
    debug!(
        "{} of {} pages produced documents",
        processed.outcomes.iter().filter(|o| o.is_included()).count(),
        total
    );
    Ok(processed)
}

fn skipped(page: PageRef, error: PageError) -> PageOutcome {
    PageOutcome {
        page: page.index,
        url: page.url,
        image_url: None,
        additional_image_urls: Vec::new(),
        document_pages: 0,
        error: Some(error),
    }
}
