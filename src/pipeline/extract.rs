//! Image URL extraction from a single page.
//!
//! The primary render is the first `img` matching the configured selector.
//! In secondary mode every other absolute `img` URL containing the
//! configured marker is collected too, deduplicated against the primary
//! image and against each other, in document order.

use crate::config::PortalMarkup;
use crate::error::PageError;
use crate::pipeline::discover::PageRef;
use crate::pipeline::http;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::debug;

/// Image URLs found on one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageImageUrls {
    pub primary: Option<String>,
    pub additional: Vec<String>,
}

/// Fetch a page and extract its image URLs.
///
/// A page without a primary image yields [`PageError::ImageNotFound`].
pub async fn extract_image_urls(
    client: &Client,
    page: &PageRef,
    markup: &PortalMarkup,
    timeout_secs: u64,
    scan_additional: bool,
) -> Result<PageImageUrls, PageError> {
    let body = http::get_text(client, &page.url, timeout_secs)
        .await
        .map_err(|e| PageError::FetchFailed {
            page: page.index,
            url: page.url.clone(),
            detail: e.to_string(),
        })?;

    let urls = parse_page_images(&body, &page.url, markup, scan_additional);
    if urls.primary.is_none() {
        return Err(PageError::ImageNotFound {
            page: page.index,
            url: page.url.clone(),
        });
    }

    debug!(
        "Page {}: primary image {:?}, {} additional",
        page.index,
        urls.primary,
        urls.additional.len()
    );
    Ok(urls)
}

/// Extract image URLs from page HTML.
pub fn parse_page_images(
    html: &str,
    page_url: &str,
    markup: &PortalMarkup,
    scan_additional: bool,
) -> PageImageUrls {
    let doc = Html::parse_document(html);
    let mut urls = PageImageUrls::default();

    if let Ok(selectors) = markup.selectors() {
        urls.primary = doc
            .select(&selectors.page_image)
            .filter_map(|img| {
                let v = img.value();
                v.attr("src").or_else(|| v.attr("data-src"))
            })
            .find_map(|src| http::resolve(page_url, src));
    }

    if scan_additional {
        let marker = markup.additional_image_marker.to_lowercase();
        if let Ok(img_sel) = Selector::parse("img") {
            for img in doc.select(&img_sel) {
                let Some(src) = img.value().attr("src") else {
                    continue;
                };
                let src = src.trim();
                if !src.starts_with("http") || !src.to_lowercase().contains(&marker) {
                    continue;
                }
                // Compare in the same normalised form the primary URL has.
                let Some(url) = http::resolve(page_url, src) else {
                    continue;
                };
                if urls.primary.as_deref() == Some(url.as_str()) || urls.additional.contains(&url)
                {
                    continue;
                }
                urls.additional.push(url);
            }
        }
    }

    urls
}
