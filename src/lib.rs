//! # epaper2pdf
//!
//! Download one day's edition from a newspaper e-paper portal and merge its
//! pages into a single PDF.
//!
//! ## Pipeline Overview
//!
//! ```text
//! date
//!  │
//!  ├─ 1. Discover  root page → ordered page links (fatal on failure)
//!  ├─ 2. Extract   page HTML → primary image URL (+ optional extras)
//!  ├─ 3. Fetch     image bytes → decoded image (spawn_blocking)
//!  ├─ 4. Canvas    paste onto a white 2800×3974 canvas
//!  ├─ 5. Encode    JPEG quality 70 → single-page PDF
//!  └─ 6. Merge     page documents in page order → Gujarat_Samachar_dd-mm-yyyy.pdf
//! ```
//!
//! Steps 2–5 run for several pages at once (`concurrency`, default 4); the
//! merge always restores ascending page order.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use epaper2pdf::{fetch_edition, EPaperDate, EditionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EditionConfig::default();
//!     let document = fetch_edition(EPaperDate::today(), &config).await?;
//!     std::fs::write(document.suggested_filename(), &document.bytes)?;
//!     eprintln!(
//!         "{} pages ({} skipped)",
//!         document.page_count, document.stats.skipped_pages
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `epaper2pdf` binary (clap + indicatif + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! epaper2pdf = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod date;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    AdditionalImages, EditionConfig, EditionConfigBuilder, FailurePolicy, PortalMarkup,
    StorageMode, CANVAS_HEIGHT, CANVAS_WIDTH, DEFAULT_JPEG_QUALITY,
};
pub use convert::{fetch_edition, fetch_edition_sync, fetch_edition_to_file, inspect, write_document};
pub use date::EPaperDate;
pub use error::{EpaperError, PageError};
pub use output::{EditionInfo, EditionStats, FinalDocument, PageOutcome};
pub use pipeline::discover::PageRef;
pub use pipeline::encode::PageDocument;
pub use pipeline::merge::{merge_directory, merge_documents};
pub use progress::{EditionProgressCallback, NoopProgressCallback, Phase, ProgressCallback};
pub use stream::{page_stream, PageStream};
