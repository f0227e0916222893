//! Pipeline stages for turning one dated edition into a PDF.
//!
//! Each submodule implements one step and is testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! discover ──▶ extract ──▶ fetch ──▶ canvas ──▶ encode ──▶ merge
//! (root page)  (page HTML)  (image)   (2800×3974) (JPEG/PDF)  (lopdf)
//! ```
//!
//! 1. [`discover`] reads the page-tab strip of the root page into ordered
//!    [`discover::PageRef`]s; any failure here is fatal for the run
//! 2. [`extract`] finds the primary image (and optionally additional
//!    images) on one page
//! 3. [`fetch`] downloads and decodes an image, single attempt
//! 4. [`canvas`] pastes the image onto the fixed white canvas
//! 5. [`encode`] writes the canvas as a single-page PDF at JPEG quality 70
//! 6. [`merge`] concatenates page documents in ascending page order
//!
//! Steps 2–5 run per page in `page`; [`storage`] holds the run's
//! intermediates and [`http`] the shared client.

pub mod canvas;
pub mod discover;
pub mod encode;
pub mod extract;
pub mod fetch;
pub mod http;
pub mod merge;
pub(crate) mod page;
pub mod storage;
