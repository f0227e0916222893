//! Result types returned by an edition run.

use crate::date::EPaperDate;
use crate::error::PageError;
use crate::pipeline::discover::PageRef;
use serde::{Deserialize, Serialize};

/// The merged, multi-page PDF for one date: the only artifact that
/// outlives a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalDocument {
    pub date: EPaperDate,
    /// Complete PDF file contents.
    #[serde(skip)]
    pub bytes: Vec<u8>,
    /// Number of pages in `bytes`.
    pub page_count: usize,
    /// One entry per discovered page, in page order.
    pub pages: Vec<PageOutcome>,
    pub stats: EditionStats,
    /// Suggested download name, e.g. `Gujarat_Samachar_05-03-2024.pdf`.
    pub filename: String,
}

impl FinalDocument {
    pub fn suggested_filename(&self) -> &str {
        &self.filename
    }
}

/// Build the suggested file name for a date.
pub fn suggested_filename(prefix: &str, date: &EPaperDate) -> String {
    format!("{}_{}.pdf", prefix, date.portal_segment())
}

/// What happened to one discovered page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageOutcome {
    /// 1-based page index.
    pub page: usize,
    /// Page URL from the navigation strip.
    pub url: String,
    /// Primary image URL, when one was found.
    pub image_url: Option<String>,
    /// Secondary image URLs that were found (see
    /// [`crate::config::AdditionalImages`]).
    pub additional_image_urls: Vec<String>,
    /// Pages this entry contributed to the final document.
    pub document_pages: usize,
    /// Set when the page was skipped.
    pub error: Option<PageError>,
}

impl PageOutcome {
    pub fn is_included(&self) -> bool {
        self.error.is_none() && self.document_pages > 0
    }
}

/// Aggregate numbers for a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditionStats {
    /// Pages in the navigation strip.
    pub discovered_pages: usize,
    /// Discovered pages present in the final document.
    pub included_pages: usize,
    /// Discovered pages left out under the skip policy.
    pub skipped_pages: usize,
    /// Pages of the final document (more than `included_pages` when
    /// additional images are included).
    pub document_pages: usize,
    /// Image bytes downloaded.
    pub downloaded_bytes: u64,
    /// Size of the final PDF.
    pub output_bytes: u64,
    pub discovery_duration_ms: u64,
    pub pages_duration_ms: u64,
    pub merge_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Discovery-only view of an edition (see [`crate::convert::inspect`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditionInfo {
    pub date: EPaperDate,
    pub root_url: String,
    pub pages: Vec<PageRef>,
}
