//! Page discovery: read the root page's tab strip into an ordered page list.
//!
//! Everything downstream relies on the list being complete and in portal
//! order, so any problem here (unreachable root, missing strip, empty strip)
//! fails the run with [`EpaperError::Discovery`]; a partial list is never
//! returned.

use crate::config::PortalMarkup;
use crate::error::EpaperError;
use crate::pipeline::http;
use reqwest::Client;
use scraper::Html;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// One physical page of the edition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRef {
    /// 1-based position in the tab strip; equals the page's position in the
    /// final document.
    pub index: usize,
    /// Absolute URL of the page.
    pub url: String,
}

/// Fetch the root page and return its page list.
pub async fn discover_pages(
    client: &Client,
    root_url: &str,
    markup: &PortalMarkup,
    timeout_secs: u64,
) -> Result<Vec<PageRef>, EpaperError> {
    info!("Discovering pages from: {}", root_url);

    let body = http::get_text(client, root_url, timeout_secs)
        .await
        .map_err(|e| EpaperError::Discovery {
            url: root_url.to_string(),
            reason: e.to_string(),
        })?;

    let pages = parse_page_links(&body, root_url, markup).map_err(|reason| {
        EpaperError::Discovery {
            url: root_url.to_string(),
            reason,
        }
    })?;

    info!("Found {} pages", pages.len());
    Ok(pages)
}

/// Extract page links from root-page HTML, in document order.
///
/// Relative `href`s are resolved against `root_url`.
pub fn parse_page_links(
    html: &str,
    root_url: &str,
    markup: &PortalMarkup,
) -> Result<Vec<PageRef>, String> {
    let selectors = markup.selectors().map_err(|e| e.to_string())?;
    let doc = Html::parse_document(html);

    let nav = doc.select(&selectors.navigation).next().ok_or_else(|| {
        format!(
            "navigation element '{}' not found",
            markup.navigation_selector
        )
    })?;

    let mut pages = Vec::new();
    for anchor in nav.select(&selectors.page_link) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let url = http::resolve(root_url, href)
            .ok_or_else(|| format!("page link '{href}' is not a valid URL"))?;
        let index = pages.len() + 1;
        debug!("Page {} → {}", index, url);
        pages.push(PageRef { index, url });
    }

    if pages.is_empty() {
        return Err(format!(
            "navigation element has no '{}' links",
            markup.page_link_selector
        ));
    }

    Ok(pages)
}
