//! Streaming API: emit page documents while later pages are still running.
//!
//! Unlike the eager [`crate::convert::fetch_edition`], which returns only
//! after the merge, [`page_stream`] yields each page's single-page PDF as
//! soon as it and every page before it are done. Up to `concurrency` pages
//! are processed at once, but items always arrive in ascending page order,
//! so the stream can be written straight to disk or merged incrementally.
//!
//! Failure policies are not applied here: a failed page is yielded as
//! `Err(PageError)` and the caller decides whether to keep going.

use crate::config::EditionConfig;
use crate::convert::{client_for, ensure_available};
use crate::date::EPaperDate;
use crate::error::{EpaperError, PageError};
use crate::pipeline::discover::discover_pages;
use crate::pipeline::encode::PageDocument;
use crate::pipeline::page::{process_page, PageContext};
use crate::pipeline::storage::prepare_storage;
use crate::progress::{Phase, ProgressReporter, CONNECTED, PAGES_START};
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of page documents.
pub type PageStream = Pin<Box<dyn Stream<Item = Result<PageDocument, PageError>> + Send>>;

/// Discover an edition's pages and stream their documents in page order.
///
/// Included additional images follow their page's primary document.
///
/// # Returns
/// - `Ok(PageStream)`: a stream of `Result<PageDocument, PageError>`
/// - `Err(EpaperError)`: date out of range or discovery failed
///
/// # Example
/// ```rust,no_run
/// use epaper2pdf::{page_stream, EPaperDate, EditionConfig};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let date = EPaperDate::parse("05-03-2024")?;
/// let mut pages = page_stream(date, &EditionConfig::default()).await?;
/// while let Some(page) = pages.next().await {
///     match page {
///         Ok(doc) => println!("page {}: {} bytes", doc.page, doc.bytes.len()),
///         Err(e) => eprintln!("Error: {e}"),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub async fn page_stream(date: EPaperDate, config: &EditionConfig) -> Result<PageStream, EpaperError> {
    ensure_available(date, config)?;
    info!("Starting streaming fetch: {}", date);

    let reporter = Arc::new(ProgressReporter::new(config.progress_callback.clone()));
    reporter.phase(Phase::Discovering);

    let client = client_for(config)?;
    let root_url = date.root_url(&config.portal.base_url, &config.portal.edition);
    let pages = match discover_pages(&client, &root_url, &config.portal, config.request_timeout_secs).await {
        Ok(pages) => pages,
        Err(e) => {
            reporter.phase(Phase::Failed);
            return Err(e);
        }
    };
    reporter.progress(CONNECTED, "Website connected successfully");
    reporter.progress(PAGES_START, "Page links scraped successfully");

    let storage = match prepare_storage(&date, &config.storage).await {
        Ok(storage) => storage,
        Err(e) => {
            reporter.phase(Phase::Failed);
            return Err(e);
        }
    };

    let total = pages.len();
    let ctx = Arc::new(PageContext {
        client,
        config: config.clone(),
        storage,
        reporter,
        total,
    });
    let done = Arc::new(AtomicUsize::new(0));
    let concurrency = config.concurrency;

    let s = stream::iter(pages.into_iter().map(move |page| {
        let ctx = Arc::clone(&ctx);
        let done = Arc::clone(&done);
        async move {
            let result = process_page(&ctx, &page).await;
            let finished = done.fetch_add(1, Ordering::SeqCst) + 1;
            let error = result.as_ref().err().map(ToString::to_string);
            ctx.reporter
                .page_done(page.index, total, finished, error.as_deref());
            if finished == total {
                ctx.reporter.phase(Phase::Done);
            }
            result
        }
    }))
    .buffered(concurrency)
    .flat_map(|result| {
        let items: Vec<Result<PageDocument, PageError>> = match result {
            Ok(output) => output.documents.into_iter().map(Ok).collect(),
            Err(e) => vec![Err(e)],
        };
        stream::iter(items)
    });

    Ok(Box::pin(s))
}
