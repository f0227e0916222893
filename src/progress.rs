//! Progress reporting for an edition run.
//!
//! Inject an [`Arc<dyn EditionProgressCallback>`] via
//! [`crate::config::EditionConfigBuilder::progress_callback`] to receive
//! `(percent, message)` updates, phase transitions and per-page events.
//!
//! Events are fire-and-forget: the pipeline never waits on the callback and
//! never inspects a return value. A presentation layer (progress bar, web
//! socket, log file) decides what to show.
//!
//! # Example
//!
//! ```rust
//! use epaper2pdf::{EditionConfig, EditionProgressCallback};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl EditionProgressCallback for Printer {
//!     fn on_progress(&self, percent: u8, message: &str) {
//!         eprintln!("[{percent:>3}%] {message}");
//!     }
//! }
//!
//! let config = EditionConfig::builder()
//!     .progress_callback(Arc::new(Printer))
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Run phases, in the order a successful run passes through them.
///
/// `Failed` may follow any non-terminal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    Idle,
    Discovering,
    ExtractingImages,
    Downloading,
    Normalizing,
    Encoding,
    Merging,
    Done,
    Failed,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Done | Phase::Failed)
    }

    /// Percentage reached when the phase is entered at run level.
    ///
    /// Per-page phases (`ExtractingImages`..`Encoding`) share the 20–80 band
    /// and advance as pages complete.
    pub fn base_percent(self) -> u8 {
        match self {
            Phase::Idle => 0,
            Phase::Discovering => 0,
            Phase::ExtractingImages
            | Phase::Downloading
            | Phase::Normalizing
            | Phase::Encoding => PAGES_START,
            Phase::Merging => 90,
            Phase::Done => 100,
            Phase::Failed => 0,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Idle => "idle",
            Phase::Discovering => "discovering pages",
            Phase::ExtractingImages => "extracting image links",
            Phase::Downloading => "downloading images",
            Phase::Normalizing => "normalising canvases",
            Phase::Encoding => "encoding page documents",
            Phase::Merging => "merging",
            Phase::Done => "done",
            Phase::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Percentage after the root page has been fetched.
pub const CONNECTED: u8 = 10;
/// Percentage once the page list is known; per-page work starts here.
pub const PAGES_START: u8 = 20;
/// Percentage once every page has been attempted.
pub const PAGES_END: u8 = 80;

/// Receives progress events from an edition run.
///
/// Implementations must be `Send + Sync`: with `concurrency > 1` the
/// per-page events arrive from concurrently running page tasks. All methods
/// default to no-ops.
pub trait EditionProgressCallback: Send + Sync {
    /// Overall progress. `percent` never decreases within one run.
    fn on_progress(&self, percent: u8, message: &str) {
        let _ = (percent, message);
    }

    /// Run-level phase transition.
    fn on_phase(&self, phase: Phase) {
        let _ = phase;
    }

    /// A page entered one of the per-page phases.
    fn on_page_phase(&self, page: usize, total_pages: usize, phase: Phase) {
        let _ = (page, total_pages, phase);
    }

    /// A page produced its document(s).
    fn on_page_complete(&self, page: usize, total_pages: usize) {
        let _ = (page, total_pages);
    }

    /// A page failed. Under the skip policy the run continues.
    fn on_page_error(&self, page: usize, total_pages: usize, error: &str) {
        let _ = (page, total_pages, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl EditionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::EditionConfig`].
pub type ProgressCallback = Arc<dyn EditionProgressCallback>;

/// Single writer in front of the caller's callback.
///
/// Clamps percentages so the reported value is monotonically non-decreasing
/// even when pages finish out of order.
pub(crate) struct ProgressReporter {
    callback: Option<ProgressCallback>,
    last: AtomicU8,
}

impl ProgressReporter {
    pub(crate) fn new(callback: Option<ProgressCallback>) -> Self {
        Self {
            callback,
            last: AtomicU8::new(0),
        }
    }

    pub(crate) fn progress(&self, percent: u8, message: &str) {
        let percent = percent.min(100);
        let prev = self.last.fetch_max(percent, Ordering::SeqCst);
        let effective = prev.max(percent);
        if let Some(ref cb) = self.callback {
            cb.on_progress(effective, message);
        }
    }

    pub(crate) fn phase(&self, phase: Phase) {
        if let Some(ref cb) = self.callback {
            cb.on_phase(phase);
        }
    }

    pub(crate) fn page_phase(&self, page: usize, total: usize, phase: Phase) {
        if let Some(ref cb) = self.callback {
            cb.on_page_phase(page, total, phase);
        }
    }

    /// Report a finished page; `done` counts attempted pages so far.
    pub(crate) fn page_done(&self, page: usize, total: usize, done: usize, error: Option<&str>) {
        if let Some(ref cb) = self.callback {
            match error {
                None => cb.on_page_complete(page, total),
                Some(e) => cb.on_page_error(page, total, e),
            }
        }
        let message = match error {
            None => format!("Page {page}/{total} ready"),
            Some(_) => format!("Page {page}/{total} failed"),
        };
        self.progress(pages_percent(done, total), &message);
    }
}

/// Map `done` of `total` pages onto the 20–80 band.
pub(crate) fn pages_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return PAGES_END;
    }
    let span = usize::from(PAGES_END - PAGES_START);
    let step = span * done.min(total) / total;
    PAGES_START + step as u8
}
