//! Image download and decode.
//!
//! Decoding runs on the blocking pool: a full-page scan is tens of
//! megapixels and would otherwise stall the async workers. A single attempt
//! is made per image.

use crate::error::PageError;
use crate::pipeline::http;
use image::DynamicImage;
use reqwest::Client;
use tracing::debug;

/// One downloaded and decoded page image.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// 1-based page index the image belongs to.
    pub page: usize,
    pub url: String,
    /// Raw response body as served by the portal.
    pub bytes: Vec<u8>,
    pub image: DynamicImage,
}

impl PageImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Download `url` and decode it.
///
/// Non-success responses, transport errors and undecodable bodies all
/// surface as [`PageError::FetchFailed`].
pub async fn fetch_image(
    client: &Client,
    page: usize,
    url: &str,
    timeout_secs: u64,
) -> Result<PageImage, PageError> {
    let bytes = http::get_bytes(client, url, timeout_secs)
        .await
        .map_err(|e| PageError::FetchFailed {
            page,
            url: url.to_string(),
            detail: e.to_string(),
        })?;

    let (bytes, image) = decode(bytes).await.map_err(|detail| PageError::FetchFailed {
        page,
        url: url.to_string(),
        detail,
    })?;

    debug!(
        "Page {}: decoded {}x{} px from {}",
        page,
        image.width(),
        image.height(),
        url
    );

    Ok(PageImage {
        page,
        url: url.to_string(),
        bytes,
        image,
    })
}

/// Decode image bytes on the blocking pool, handing the bytes back.
async fn decode(bytes: Vec<u8>) -> Result<(Vec<u8>, DynamicImage), String> {
    tokio::task::spawn_blocking(move || {
        let image = decode_bytes(&bytes)?;
        Ok((bytes, image))
    })
    .await
    .map_err(|e| format!("decode task panicked: {e}"))?
}

/// Decode image bytes, sniffing the format from the content.
pub fn decode_bytes(bytes: &[u8]) -> Result<DynamicImage, String> {
    if bytes.is_empty() {
        return Err("malformed image: empty body".to_string());
    }
    image::load_from_memory(bytes).map_err(|e| format!("malformed image: {e}"))
}
