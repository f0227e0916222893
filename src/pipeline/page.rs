//! The per-page sub-pipeline: extract → download → normalise → encode.
//!
//! Pages do not depend on each other, so the orchestrator runs this for
//! several pages at once. Within one page the steps are strictly
//! sequential. Decode, normalise and encode are CPU-bound and run on the
//! blocking pool.

use crate::config::{AdditionalImages, EditionConfig};
use crate::error::PageError;
use crate::pipeline::canvas::normalize_page;
use crate::pipeline::discover::PageRef;
use crate::pipeline::encode::{encode_page, PageDocument};
use crate::pipeline::extract::{extract_image_urls, PageImageUrls};
use crate::pipeline::fetch::{fetch_image, PageImage};
use crate::pipeline::storage::RunStorage;
use crate::progress::{Phase, ProgressReporter};
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, warn};

/// Everything a page task needs, shared by all pages of one run.
pub(crate) struct PageContext {
    pub client: Client,
    pub config: EditionConfig,
    pub storage: RunStorage,
    pub reporter: Arc<ProgressReporter>,
    pub total: usize,
}

/// A page that made it through every step.
#[derive(Debug)]
pub(crate) struct PageOutput {
    pub urls: PageImageUrls,
    /// The primary page first, then any included additional images.
    pub documents: Vec<PageDocument>,
    pub downloaded_bytes: u64,
}

/// Run one page through the sub-pipeline.
///
/// Failures of the primary image fail the page. Additional images are
/// auxiliary: any failure on one is logged and that image is left out.
pub(crate) async fn process_page(
    ctx: &PageContext,
    page: &PageRef,
) -> Result<PageOutput, PageError> {
    let config = &ctx.config;
    let timeout = config.request_timeout_secs;

    ctx.reporter
        .page_phase(page.index, ctx.total, Phase::ExtractingImages);
    let urls = extract_image_urls(
        &ctx.client,
        page,
        &config.portal,
        timeout,
        config.additional_images.scans(),
    )
    .await?;
    let Some(primary_url) = urls.primary.clone() else {
        return Err(PageError::ImageNotFound {
            page: page.index,
            url: page.url.clone(),
        });
    };

    ctx.reporter
        .page_phase(page.index, ctx.total, Phase::Downloading);
    let primary = fetch_image(&ctx.client, page.index, &primary_url, timeout).await?;
    ctx.storage.save_image(page.index, 0, &primary.bytes).await?;
    let mut downloaded_bytes = primary.bytes.len() as u64;

    let document = render_document(ctx, page.index, 0, primary).await?;
    ctx.storage.save_document(&document).await?;
    let mut documents = vec![document];

    for (k, url) in urls.additional.iter().enumerate() {
        let part = k + 1;
        match additional_document(ctx, page.index, part, url).await {
            Ok((bytes, document)) => {
                downloaded_bytes += bytes;
                documents.extend(document);
            }
            Err(e) => warn!(
                "Page {}: additional image {} left out: {}",
                page.index, part, e
            ),
        }
    }

    debug!(
        "Page {}: {} document(s), {} bytes downloaded",
        page.index,
        documents.len(),
        downloaded_bytes
    );
    Ok(PageOutput {
        urls,
        documents,
        downloaded_bytes,
    })
}

/// Fetch and store one additional image; render it too when included.
///
/// Returns the downloaded size and, under `Include`, its document.
async fn additional_document(
    ctx: &PageContext,
    page: usize,
    part: usize,
    url: &str,
) -> Result<(u64, Option<PageDocument>), PageError> {
    let config = &ctx.config;
    let image = fetch_image(&ctx.client, page, url, config.request_timeout_secs).await?;
    ctx.storage.save_image(page, part, &image.bytes).await?;
    let bytes = image.bytes.len() as u64;

    if config.additional_images != AdditionalImages::Include {
        return Ok((bytes, None));
    }
    let document = render_document(ctx, page, part, image).await?;
    ctx.storage.save_document(&document).await?;
    Ok((bytes, Some(document)))
}

/// Normalise and encode one image on the blocking pool.
async fn render_document(
    ctx: &PageContext,
    page: usize,
    part: usize,
    image: PageImage,
) -> Result<PageDocument, PageError> {
    let join_failed = |e: tokio::task::JoinError| PageError::EncodeFailed {
        page,
        detail: format!("worker task failed: {e}"),
    };

    ctx.reporter.page_phase(page, ctx.total, Phase::Normalizing);
    let decoded = image.image;
    let normalized = tokio::task::spawn_blocking(move || normalize_page(page, part, &decoded))
        .await
        .map_err(join_failed)?;

    ctx.reporter.page_phase(page, ctx.total, Phase::Encoding);
    let (quality, dpi) = (ctx.config.jpeg_quality, ctx.config.page_dpi);
    tokio::task::spawn_blocking(move || encode_page(&normalized, quality, dpi))
        .await
        .map_err(join_failed)?
}
