//! Error types for the epaper2pdf library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`EpaperError`] is **fatal**: the run is aborted and no document is
//!   produced (portal unreachable, navigation markup missing, merge failed,
//!   or a page failure under the `Abort` policy). Returned as
//!   `Err(EpaperError)` from the top-level `fetch_edition*` functions.
//!
//! * [`PageError`] is **non-fatal**: a single page could not be turned into a
//!   document. Under [`crate::config::FailurePolicy::Skip`] it is stored in
//!   [`crate::output::PageOutcome`] and the page is left out of the final
//!   document; under `Abort` it is converted into the matching
//!   [`EpaperError`] variant.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the epaper2pdf library.
#[derive(Debug, Error)]
pub enum EpaperError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The date string is not a `dd-mm-yyyy` calendar date.
    #[error("Invalid date '{input}': expected dd-mm-yyyy")]
    InvalidDate { input: String },

    /// The date lies outside the window the portal keeps online.
    #[error("Date {date} is outside the available window (last {window_days} days through today)")]
    DateOutOfRange { date: String, window_days: u32 },

    // ── Discovery ─────────────────────────────────────────────────────────
    /// Root page unreachable, non-200, or page-tab navigation missing.
    #[error("Page discovery failed for '{url}': {reason}\nThe edition may not be published yet, or the portal markup changed.")]
    Discovery { url: String, reason: String },

    // ── Per-page failures under the Abort policy ──────────────────────────
    /// The page HTML had no primary e-paper image.
    #[error("Page {page}: no e-paper image found at '{url}'")]
    ImageNotFound { page: usize, url: String },

    /// Network or decode failure on a page or image request.
    #[error("Page {page}: failed to fetch '{url}': {reason}")]
    Fetch {
        page: usize,
        url: String,
        reason: String,
    },

    /// The normalised canvas could not be encoded as a PDF page.
    #[error("Page {page}: PDF encoding failed: {detail}")]
    Encode { page: usize, detail: String },

    // ── Assembly ──────────────────────────────────────────────────────────
    /// An intermediate page document could not be read or the merged
    /// document could not be written.
    #[error("Merging page documents failed: {detail}")]
    Merge { detail: String },

    /// Every discovered page was skipped; no document to return.
    #[error("No pages could be assembled for {date} ({discovered} discovered, all skipped)\nFirst error: {first_error}")]
    NoPages {
        date: String,
        discovered: usize,
        first_error: String,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write a run's intermediate storage.
    #[error("Storage error at '{path}': {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
///
/// Stored in [`crate::output::PageOutcome`] when the page is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The page HTML carried no primary image element.
    #[error("Page {page}: no e-paper image found at '{url}'")]
    ImageNotFound { page: usize, url: String },

    /// Page HTML or image download/decode failed.
    #[error("Page {page}: failed to fetch '{url}': {detail}")]
    FetchFailed {
        page: usize,
        url: String,
        detail: String,
    },

    /// Canvas → PDF encoding failed.
    #[error("Page {page}: PDF encoding failed: {detail}")]
    EncodeFailed { page: usize, detail: String },

    /// An intermediate file for the page could not be written.
    #[error("Page {page}: could not store '{path}': {detail}")]
    StorageFailed {
        page: usize,
        path: PathBuf,
        detail: String,
    },
}

impl PageError {
    /// 1-based page index the error belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageError::ImageNotFound { page, .. }
            | PageError::FetchFailed { page, .. }
            | PageError::EncodeFailed { page, .. }
            | PageError::StorageFailed { page, .. } => *page,
        }
    }

    /// Whether the error came from a missing image element rather than a
    /// network, decode, encode or storage failure. The two are governed by separate
    /// policies in [`crate::config::EditionConfig`].
    pub fn is_missing_image(&self) -> bool {
        matches!(self, PageError::ImageNotFound { .. })
    }
}

impl From<PageError> for EpaperError {
    fn from(e: PageError) -> Self {
        match e {
            PageError::ImageNotFound { page, url } => EpaperError::ImageNotFound { page, url },
            PageError::FetchFailed { page, url, detail } => EpaperError::Fetch {
                page,
                url,
                reason: detail,
            },
            PageError::EncodeFailed { page, detail } => EpaperError::Encode { page, detail },
            PageError::StorageFailed { path, detail, .. } => EpaperError::Storage {
                path,
                source: std::io::Error::other(detail),
            },
        }
    }
}
