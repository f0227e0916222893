//! Configuration types for an edition run.
//!
//! All run behaviour is controlled through [`EditionConfig`], built via its
//! [`EditionConfigBuilder`]. The defaults reproduce the reference behaviour:
//! the Ahmedabad edition of the Gujarat Samachar portal, failed pages skipped,
//! secondary images ignored, JPEG quality 70, transient intermediates.

use crate::error::EpaperError;
use crate::progress::ProgressCallback;
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Fixed canvas width in pixels. Identical for every page of every run.
pub const CANVAS_WIDTH: u32 = 2800;
/// Fixed canvas height in pixels. Identical for every page of every run.
pub const CANVAS_HEIGHT: u32 = 3974;
/// JPEG quality used for page documents unless overridden.
pub const DEFAULT_JPEG_QUALITY: u8 = 70;

/// Configuration for one edition run.
///
/// # Example
/// ```rust
/// use epaper2pdf::{EditionConfig, FailurePolicy};
///
/// let config = EditionConfig::builder()
///     .edition("ahmedabad")
///     .concurrency(4)
///     .on_missing_image(FailurePolicy::Abort)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct EditionConfig {
    /// Where the edition lives and how its markup is recognised.
    pub portal: PortalMarkup,

    /// Pages processed at once. Default: 4. `1` gives strictly sequential
    /// processing; merge order is independent of this value.
    pub concurrency: usize,

    /// What to do when a page has no primary image element. Default: Skip.
    pub on_missing_image: FailurePolicy,

    /// What to do when downloading, decoding, encoding or storing a page
    /// fails. Default: Skip.
    pub on_page_error: FailurePolicy,

    /// Handling of secondary images found on a page. Default: Ignore.
    pub additional_images: AdditionalImages,

    /// JPEG quality (1–100) of the image embedded in each page document.
    /// Default: 70.
    pub jpeg_quality: u8,

    /// Resolution used to size the PDF page box from the canvas pixels.
    /// Default: 72, i.e. one point per pixel.
    pub page_dpi: f32,

    /// Where intermediates are written. Default: transient.
    pub storage: StorageMode,

    /// Per-request timeout in seconds. Default: 60.
    pub request_timeout_secs: u64,

    /// Reject dates older than this many days, and future dates.
    /// `None` disables the check. Default: `Some(30)`.
    pub date_window_days: Option<u32>,

    /// Prefix of the suggested output file name. Default: `Gujarat_Samachar`.
    pub filename_prefix: String,

    /// Progress sink. Default: None.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for EditionConfig {
    fn default() -> Self {
        Self {
            portal: PortalMarkup::default(),
            concurrency: 4,
            on_missing_image: FailurePolicy::Skip,
            on_page_error: FailurePolicy::Skip,
            additional_images: AdditionalImages::Ignore,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            page_dpi: 72.0,
            storage: StorageMode::Transient,
            request_timeout_secs: 60,
            date_window_days: Some(30),
            filename_prefix: "Gujarat_Samachar".to_string(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for EditionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditionConfig")
            .field("portal", &self.portal)
            .field("concurrency", &self.concurrency)
            .field("on_missing_image", &self.on_missing_image)
            .field("on_page_error", &self.on_page_error)
            .field("additional_images", &self.additional_images)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("page_dpi", &self.page_dpi)
            .field("storage", &self.storage)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("date_window_days", &self.date_window_days)
            .field("filename_prefix", &self.filename_prefix)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn EditionProgressCallback>"),
            )
            .finish()
    }
}

impl EditionConfig {
    /// Create a new builder for `EditionConfig`.
    pub fn builder() -> EditionConfigBuilder {
        EditionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Policy that applies to a given page failure.
    pub fn policy_for(&self, error: &crate::error::PageError) -> FailurePolicy {
        if error.is_missing_image() {
            self.on_missing_image
        } else {
            self.on_page_error
        }
    }
}

/// Builder for [`EditionConfig`].
#[derive(Debug)]
pub struct EditionConfigBuilder {
    config: EditionConfig,
}

impl EditionConfigBuilder {
    pub fn portal(mut self, portal: PortalMarkup) -> Self {
        self.config.portal = portal;
        self
    }

    pub fn portal_base(mut self, base: impl Into<String>) -> Self {
        self.config.portal.base_url = base.into();
        self
    }

    pub fn edition(mut self, edition: impl Into<String>) -> Self {
        self.config.portal.edition = edition.into();
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn on_missing_image(mut self, policy: FailurePolicy) -> Self {
        self.config.on_missing_image = policy;
        self
    }

    pub fn on_page_error(mut self, policy: FailurePolicy) -> Self {
        self.config.on_page_error = policy;
        self
    }

    pub fn additional_images(mut self, mode: AdditionalImages) -> Self {
        self.config.additional_images = mode;
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q.clamp(1, 100);
        self
    }

    pub fn page_dpi(mut self, dpi: f32) -> Self {
        self.config.page_dpi = dpi;
        self
    }

    pub fn storage(mut self, storage: StorageMode) -> Self {
        self.config.storage = storage;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn date_window_days(mut self, days: Option<u32>) -> Self {
        self.config.date_window_days = days;
        self
    }

    pub fn filename_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.filename_prefix = prefix.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<EditionConfig, EpaperError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(EpaperError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        if !(c.page_dpi.is_finite() && c.page_dpi > 0.0) {
            return Err(EpaperError::InvalidConfig(format!(
                "Page DPI must be positive, got {}",
                c.page_dpi
            )));
        }
        if !(c.portal.base_url.starts_with("http://") || c.portal.base_url.starts_with("https://"))
        {
            return Err(EpaperError::InvalidConfig(format!(
                "Portal base must be an HTTP/HTTPS URL, got '{}'",
                c.portal.base_url
            )));
        }
        if c.portal.edition.trim_matches('/').is_empty() {
            return Err(EpaperError::InvalidConfig("Edition must not be empty".into()));
        }
        c.portal.selectors()?;
        Ok(self.config)
    }
}

// ── Portal markup ────────────────────────────────────────────────────────

/// Location of the portal and the structural markers used to scrape it.
///
/// The selectors are CSS selectors evaluated with `scraper`. They are kept
/// configurable because the portal's markup is the part most likely to
/// change between releases of the site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalMarkup {
    /// Portal origin, e.g. `https://epaper.gujaratsamachar.com`.
    pub base_url: String,
    /// Edition path segment, e.g. `ahmedabad`.
    pub edition: String,
    /// The page-tab strip on the root page.
    pub navigation_selector: String,
    /// Anchors inside the strip; each `href` is one page.
    pub page_link_selector: String,
    /// The primary page render on each page.
    pub page_image_selector: String,
    /// Substring (case-insensitive) an absolute `img` URL must contain to
    /// count as an additional e-paper image.
    pub additional_image_marker: String,
}

impl Default for PortalMarkup {
    fn default() -> Self {
        Self {
            base_url: "https://epaper.gujaratsamachar.com".to_string(),
            edition: "ahmedabad".to_string(),
            navigation_selector: "ul.nav.nav-tabs.nav-dots.border-bottom-0".to_string(),
            page_link_selector: "a.anchor_click[href]".to_string(),
            page_image_selector: "img.w-100.sky.epaper_page".to_string(),
            additional_image_marker: "epaper".to_string(),
        }
    }
}

/// The three portal selectors, parsed once per run.
#[derive(Debug, Clone)]
pub struct PortalSelectors {
    pub navigation: Selector,
    pub page_link: Selector,
    pub page_image: Selector,
}

impl PortalMarkup {
    /// Parse the configured selectors.
    pub fn selectors(&self) -> Result<PortalSelectors, EpaperError> {
        Ok(PortalSelectors {
            navigation: parse_selector(&self.navigation_selector)?,
            page_link: parse_selector(&self.page_link_selector)?,
            page_image: parse_selector(&self.page_image_selector)?,
        })
    }
}

fn parse_selector(s: &str) -> Result<Selector, EpaperError> {
    Selector::parse(s)
        .map_err(|e| EpaperError::InvalidConfig(format!("Invalid CSS selector '{s}': {e:?}")))
}

// ── Enums ────────────────────────────────────────────────────────────────

/// What a per-page failure does to the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Fail the whole run; no document is produced.
    Abort,
    /// Leave the page out of the document and continue. (default)
    #[default]
    Skip,
}

/// Handling of images on a page other than the primary render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AdditionalImages {
    /// Do not look for them. (default)
    #[default]
    Ignore,
    /// Download and store them next to the page image; not merged.
    Download,
    /// Turn each into an extra page right after its page's primary image.
    Include,
}

impl AdditionalImages {
    pub fn scans(self) -> bool {
        !matches!(self, AdditionalImages::Ignore)
    }
}

/// Where a run's intermediate images and page documents go.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StorageMode {
    /// A private temporary directory removed when the run ends, whether it
    /// succeeded or failed. (default)
    #[default]
    Transient,
    /// Keep intermediates under this root:
    /// `images/<dd-mm-yyyy>/page_NN.jpg` and `PDFs/<dd-mm-yyyy>/page_NN.pdf`.
    Persistent(PathBuf),
}
