//! End-to-end tests for epaper2pdf against a local mock portal.
//!
//! Every test starts its own `wiremock` server that serves the root page,
//! the per-page HTML and generated PNG page images. Each page image is a
//! solid colour, so the merged PDF can be checked page by page by decoding
//! the JPEG embedded in each page.
//!
//! Run with:
//!   cargo test --test edition -- --nocapture

use epaper2pdf::{
    fetch_edition, fetch_edition_to_file, inspect, merge_directory, page_stream, AdditionalImages,
    EPaperDate, EditionConfig, EditionConfigBuilder, EditionProgressCallback, EpaperError,
    FailurePolicy, PageError, Phase, StorageMode, CANVAS_HEIGHT, CANVAS_WIDTH,
};
use futures::StreamExt;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use lopdf::Document;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DATE: &str = "05-03-2024";

const RED: [u8; 3] = [220, 30, 30];
const GREEN: [u8; 3] = [30, 200, 30];
const BLUE: [u8; 3] = [30, 30, 220];
const YELLOW: [u8; 3] = [230, 220, 40];

// ── Mock portal ──────────────────────────────────────────────────────────────

/// How one page of the mock edition behaves.
#[derive(Clone)]
struct MockPage {
    colour: [u8; 3],
    /// Emit the primary `img` element at all.
    has_image: bool,
    /// Status of the image response.
    image_status: u16,
    /// Delay before the image response, to force out-of-order completion.
    image_delay_ms: u64,
    /// An additional e-paper image on the page.
    extra: Option<[u8; 3]>,
}

impl MockPage {
    fn ok(colour: [u8; 3]) -> Self {
        Self {
            colour,
            has_image: true,
            image_status: 200,
            image_delay_ms: 0,
            extra: None,
        }
    }

    fn missing_image(colour: [u8; 3]) -> Self {
        Self {
            has_image: false,
            ..Self::ok(colour)
        }
    }

    fn broken_image(colour: [u8; 3]) -> Self {
        Self {
            image_status: 500,
            ..Self::ok(colour)
        }
    }

    fn slow(self, ms: u64) -> Self {
        Self {
            image_delay_ms: ms,
            ..self
        }
    }

    fn with_extra(self, colour: [u8; 3]) -> Self {
        Self {
            extra: Some(colour),
            ..self
        }
    }
}

fn png(colour: [u8; 3]) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 48, Rgb(colour)));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

fn image_response(colour: [u8; 3]) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(png(colour), "image/png")
}

/// Serve an edition for `date` whose pages behave as `pages` describes.
async fn mount_edition(server: &MockServer, date: &str, pages: &[MockPage]) {
    let links: String = (1..=pages.len())
        .map(|n| {
            format!(r#"<li class="nav-item"><a class="anchor_click" href="/ahmedabad/{date}/{n}">{n}</a></li>"#)
        })
        .collect();
    let nav = format!(r#"<ul class="nav nav-tabs nav-dots border-bottom-0">{links}</ul>"#);

    for (i, mock) in pages.iter().enumerate() {
        let n = i + 1;
        let image_path = format!("/img/{date}/{n}.png");
        let primary = if mock.has_image {
            format!(r#"<img class="w-100 sky epaper_page" src="{image_path}">"#)
        } else {
            r#"<div class="placeholder">Page not available</div>"#.to_string()
        };
        let extra_path = format!("/epaper/{date}/{n}-extra.png");
        let extra = match mock.extra {
            Some(_) => format!(r#"<img src="{}{}">"#, server.uri(), extra_path),
            None => String::new(),
        };
        let html = format!(
            r#"<html><body>{nav}<img class="logo" src="/logo.png">{primary}{extra}</body></html>"#
        );

        Mock::given(method("GET"))
            .and(path(format!("/ahmedabad/{date}/{n}")))
            .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html"))
            .mount(server)
            .await;

        let response = if mock.image_status == 200 {
            image_response(mock.colour)
        } else {
            ResponseTemplate::new(mock.image_status)
        };
        Mock::given(method("GET"))
            .and(path(image_path))
            .respond_with(response.set_delay(Duration::from_millis(mock.image_delay_ms)))
            .mount(server)
            .await;

        if let Some(colour) = mock.extra {
            Mock::given(method("GET"))
                .and(path(extra_path))
                .respond_with(image_response(colour))
                .mount(server)
                .await;
        }
    }
}

fn date() -> EPaperDate {
    EPaperDate::parse(DATE).unwrap()
}

/// Route library logs to the test output; `RUST_LOG=epaper2pdf=debug` to see them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn config_for(server: &MockServer) -> EditionConfigBuilder {
    init_tracing();
    EditionConfig::builder()
        .portal_base(server.uri())
        .edition("ahmedabad")
        .date_window_days(None)
        .request_timeout_secs(10)
}

// ── PDF inspection ───────────────────────────────────────────────────────────

/// Colour of each page's image, in document page order.
fn page_colours(pdf: &[u8]) -> Vec<[u8; 3]> {
    let doc = Document::load_mem(pdf).unwrap();
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let page = doc.get_object(page_id).unwrap().as_dict().unwrap();

            let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
            assert_eq!(media_box[2].as_float().unwrap(), CANVAS_WIDTH as f32);
            assert_eq!(media_box[3].as_float().unwrap(), CANVAS_HEIGHT as f32);

            let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
            let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
            let image_id = xobjects.get(b"Im0").unwrap().as_reference().unwrap();
            let stream = doc.get_object(image_id).unwrap().as_stream().unwrap();

            let canvas = image::load_from_memory(&stream.content).unwrap().to_rgb8();
            assert_eq!(canvas.dimensions(), (CANVAS_WIDTH, CANVAS_HEIGHT));
            // Source images sit at the top-left; the rest is white.
            let white = canvas.get_pixel(CANVAS_WIDTH - 10, CANVAS_HEIGHT - 10).0;
            assert!(white.iter().all(|&c| c > 230), "margin not white: {white:?}");
            canvas.get_pixel(10, 10).0
        })
        .collect()
}

/// JPEG at quality 70 is lossy; compare colours with a tolerance.
fn assert_colours(actual: &[[u8; 3]], expected: &[[u8; 3]]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "page count: got {actual:?}, expected {expected:?}"
    );
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        let close = a.iter().zip(e).all(|(x, y)| x.abs_diff(*y) <= 40);
        assert!(close, "page {}: got {a:?}, expected {e:?}", i + 1);
    }
}

#[derive(Default)]
struct Recorder {
    percents: Mutex<Vec<u8>>,
    phases: Mutex<Vec<Phase>>,
    page_errors: Mutex<Vec<usize>>,
}

impl EditionProgressCallback for Recorder {
    fn on_progress(&self, percent: u8, _message: &str) {
        self.percents.lock().unwrap().push(percent);
    }

    fn on_phase(&self, phase: Phase) {
        self.phases.lock().unwrap().push(phase);
    }

    fn on_page_error(&self, page: usize, _total_pages: usize, _error: &str) {
        self.page_errors.lock().unwrap().push(page);
    }
}

// ── Happy path ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn three_pages_are_merged_in_order() {
    let server = MockServer::start().await;
    mount_edition(
        &server,
        DATE,
        &[MockPage::ok(RED), MockPage::ok(GREEN), MockPage::ok(BLUE)],
    )
    .await;

    let config = config_for(&server).concurrency(1).build().unwrap();
    let document = fetch_edition(date(), &config).await.unwrap();

    assert_eq!(document.page_count, 3);
    assert_eq!(document.filename, "Gujarat_Samachar_05-03-2024.pdf");
    assert_eq!(document.stats.discovered_pages, 3);
    assert_eq!(document.stats.included_pages, 3);
    assert_eq!(document.stats.skipped_pages, 0);
    assert!(document.stats.downloaded_bytes > 0);
    assert_eq!(document.stats.output_bytes, document.bytes.len() as u64);
    assert!(document.bytes.starts_with(b"%PDF"));
    assert!(document.pages.iter().all(|p| p.is_included()));
    assert_eq!(
        document.pages[1].image_url.as_deref(),
        Some(format!("{}/img/{DATE}/2.png", server.uri()).as_str())
    );

    assert_colours(&page_colours(&document.bytes), &[RED, GREEN, BLUE]);
}

#[tokio::test]
async fn concurrency_does_not_change_page_order() {
    let server = MockServer::start().await;
    mount_edition(
        &server,
        DATE,
        &[
            MockPage::ok(RED).slow(600),
            MockPage::ok(GREEN).slow(300),
            MockPage::ok(BLUE),
        ],
    )
    .await;

    let config = config_for(&server).concurrency(3).build().unwrap();
    let document = fetch_edition(date(), &config).await.unwrap();

    assert_colours(&page_colours(&document.bytes), &[RED, GREEN, BLUE]);
    let order: Vec<usize> = document.pages.iter().map(|p| p.page).collect();
    assert_eq!(order, vec![1, 2, 3]);
}

#[tokio::test]
async fn repeated_runs_give_the_same_document() {
    let server = MockServer::start().await;
    mount_edition(
        &server,
        DATE,
        &[
            MockPage::ok(RED).slow(200),
            MockPage::missing_image(GREEN),
            MockPage::ok(BLUE),
            MockPage::ok(YELLOW),
        ],
    )
    .await;

    let config = config_for(&server).concurrency(4).build().unwrap();
    let first = fetch_edition(date(), &config).await.unwrap();
    let second = fetch_edition(date(), &config).await.unwrap();

    assert_eq!(first.page_count, second.page_count);
    let outcomes = |d: &epaper2pdf::FinalDocument| -> Vec<(usize, bool)> {
        d.pages.iter().map(|p| (p.page, p.is_included())).collect()
    };
    assert_eq!(outcomes(&first), outcomes(&second));
    assert_eq!(outcomes(&first), vec![(1, true), (2, false), (3, true), (4, true)]);

    let colours = page_colours(&first.bytes);
    assert_colours(&colours, &[RED, BLUE, YELLOW]);
    assert_eq!(colours, page_colours(&second.bytes));
}

// ── Failure policies ─────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_image_is_skipped_by_default() {
    let server = MockServer::start().await;
    mount_edition(
        &server,
        DATE,
        &[
            MockPage::ok(RED),
            MockPage::missing_image(GREEN),
            MockPage::ok(BLUE),
        ],
    )
    .await;

    let recorder = Arc::new(Recorder::default());
    let config = config_for(&server)
        .progress_callback(recorder.clone())
        .build()
        .unwrap();
    let document = fetch_edition(date(), &config).await.unwrap();

    assert_eq!(document.page_count, 2);
    assert_eq!(document.stats.skipped_pages, 1);
    assert_colours(&page_colours(&document.bytes), &[RED, BLUE]);

    let skipped = &document.pages[1];
    assert_eq!(skipped.page, 2);
    assert!(!skipped.is_included());
    assert!(matches!(
        skipped.error,
        Some(PageError::ImageNotFound { page: 2, .. })
    ));
    assert_eq!(*recorder.page_errors.lock().unwrap(), vec![2]);
}

#[tokio::test]
async fn missing_image_aborts_under_abort_policy() {
    let server = MockServer::start().await;
    mount_edition(
        &server,
        DATE,
        &[
            MockPage::ok(RED),
            MockPage::missing_image(GREEN),
            MockPage::ok(BLUE),
        ],
    )
    .await;

    let recorder = Arc::new(Recorder::default());
    let config = config_for(&server)
        .on_missing_image(FailurePolicy::Abort)
        .progress_callback(recorder.clone())
        .build()
        .unwrap();
    let err = fetch_edition(date(), &config).await.unwrap_err();

    assert!(
        matches!(err, EpaperError::ImageNotFound { page: 2, .. }),
        "got {err:?}"
    );
    let phases = recorder.phases.lock().unwrap();
    assert_eq!(phases.last(), Some(&Phase::Failed));
    assert!(!phases.contains(&Phase::Done));
}

#[tokio::test]
async fn failed_download_follows_page_error_policy() {
    let server = MockServer::start().await;
    mount_edition(
        &server,
        DATE,
        &[
            MockPage::ok(RED),
            MockPage::ok(GREEN),
            MockPage::broken_image(BLUE),
        ],
    )
    .await;

    let skip = config_for(&server).build().unwrap();
    let document = fetch_edition(date(), &skip).await.unwrap();
    assert_colours(&page_colours(&document.bytes), &[RED, GREEN]);
    match &document.pages[2].error {
        Some(PageError::FetchFailed { page: 3, detail, .. }) => {
            assert!(detail.contains("500"), "got: {detail}")
        }
        other => panic!("expected FetchFailed for page 3, got {other:?}"),
    }

    // A missing-image abort policy does not cover download failures.
    let abort = config_for(&server)
        .on_missing_image(FailurePolicy::Abort)
        .on_page_error(FailurePolicy::Abort)
        .build()
        .unwrap();
    let err = fetch_edition(date(), &abort).await.unwrap_err();
    assert!(matches!(err, EpaperError::Fetch { page: 3, .. }), "got {err:?}");
}

#[tokio::test]
async fn all_pages_skipped_is_an_error_not_an_empty_pdf() {
    let server = MockServer::start().await;
    mount_edition(
        &server,
        DATE,
        &[MockPage::missing_image(RED), MockPage::missing_image(GREEN)],
    )
    .await;

    let config = config_for(&server).build().unwrap();
    let err = fetch_edition(date(), &config).await.unwrap_err();
    match err {
        EpaperError::NoPages {
            discovered,
            first_error,
            ..
        } => {
            assert_eq!(discovered, 2);
            assert!(first_error.contains("Page 1"), "got: {first_error}");
        }
        other => panic!("expected NoPages, got {other:?}"),
    }
}

// ── Discovery failures ───────────────────────────────────────────────────────

#[tokio::test]
async fn missing_root_page_is_a_discovery_error() {
    let server = MockServer::start().await;

    let config = config_for(&server).build().unwrap();
    let err = fetch_edition(date(), &config).await.unwrap_err();

    match err {
        EpaperError::Discovery { url, reason } => {
            assert!(url.ends_with("/ahmedabad/05-03-2024/1"), "got: {url}");
            assert!(reason.contains("404"), "got: {reason}");
        }
        other => panic!("expected Discovery, got {other:?}"),
    }
}

#[tokio::test]
async fn root_without_navigation_is_a_discovery_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/ahmedabad/{DATE}/1")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><body><p>Edition not published</p></body></html>", "text/html"),
        )
        .mount(&server)
        .await;

    let config = config_for(&server).build().unwrap();
    let err = fetch_edition(date(), &config).await.unwrap_err();
    assert!(matches!(err, EpaperError::Discovery { .. }), "got {err:?}");
}

#[tokio::test]
async fn slow_root_page_is_a_discovery_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/ahmedabad/{DATE}/1")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html></html>", "text/html")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = config_for(&server).request_timeout_secs(1).build().unwrap();
    let err = fetch_edition(date(), &config).await.unwrap_err();
    match err {
        EpaperError::Discovery { url, reason } => {
            assert!(url.ends_with("/ahmedabad/05-03-2024/1"), "got: {url}");
            assert!(reason.contains("timed out"), "got: {reason}");
        }
        other => panic!("expected Discovery, got {other:?}"),
    }
}

#[tokio::test]
async fn dates_outside_the_window_are_rejected() {
    let config = EditionConfig::default();
    let old = EPaperDate::from_ymd(2001, 1, 1).unwrap();
    let err = fetch_edition(old, &config).await.unwrap_err();
    assert!(matches!(err, EpaperError::DateOutOfRange { .. }), "got {err:?}");
}

// ── Progress ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn progress_is_monotonic_and_reaches_100() {
    let server = MockServer::start().await;
    mount_edition(
        &server,
        DATE,
        &[
            MockPage::ok(RED).slow(200),
            MockPage::ok(GREEN),
            MockPage::ok(BLUE),
        ],
    )
    .await;

    let recorder = Arc::new(Recorder::default());
    let config = config_for(&server)
        .concurrency(3)
        .progress_callback(recorder.clone())
        .build()
        .unwrap();
    fetch_edition(date(), &config).await.unwrap();

    let percents = recorder.percents.lock().unwrap();
    assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{percents:?}");
    assert_eq!(percents.last(), Some(&100));
    assert!(percents.contains(&10));
    assert!(percents.contains(&20));

    let phases = recorder.phases.lock().unwrap();
    assert_eq!(
        *phases,
        vec![Phase::Discovering, Phase::Merging, Phase::Done]
    );
}

// ── Storage ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn persistent_storage_keeps_intermediates() {
    let server = MockServer::start().await;
    mount_edition(
        &server,
        DATE,
        &[MockPage::ok(RED), MockPage::ok(GREEN), MockPage::ok(BLUE)],
    )
    .await;

    let root = tempfile::tempdir().unwrap();
    let config = config_for(&server)
        .storage(StorageMode::Persistent(root.path().to_path_buf()))
        .build()
        .unwrap();
    fetch_edition(date(), &config).await.unwrap();

    for n in 1..=3 {
        assert!(root
            .path()
            .join(format!("images/{DATE}/page_0{n}.jpg"))
            .is_file());
        assert!(root
            .path()
            .join(format!("PDFs/{DATE}/page_0{n}.pdf"))
            .is_file());
    }

    // The kept page documents re-merge into the same page sequence.
    let merged = merge_directory(root.path().join(format!("PDFs/{DATE}")))
        .await
        .unwrap();
    assert_colours(&page_colours(&merged), &[RED, GREEN, BLUE]);
}

#[tokio::test]
async fn transient_storage_is_cleaned_up_after_failure() {
    // A date no other test uses, so the temp-dir prefix is unique to this test.
    let date_segment = "17-08-2001";
    let server = MockServer::start().await;
    mount_edition(
        &server,
        date_segment,
        &[MockPage::ok(RED), MockPage::missing_image(GREEN)],
    )
    .await;

    let config = config_for(&server)
        .on_missing_image(FailurePolicy::Abort)
        .build()
        .unwrap();
    let err = fetch_edition(EPaperDate::parse(date_segment).unwrap(), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, EpaperError::ImageNotFound { .. }));

    let prefix = format!("epaper2pdf-{date_segment}-");
    let leftovers: Vec<_> = std::fs::read_dir(std::env::temp_dir())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().starts_with(&prefix))
        .collect();
    assert!(leftovers.is_empty(), "left behind: {leftovers:?}");
}

#[tokio::test]
async fn fetch_to_file_writes_atomically() {
    let server = MockServer::start().await;
    mount_edition(&server, DATE, &[MockPage::ok(RED), MockPage::ok(GREEN)]).await;

    let out = tempfile::tempdir().unwrap();
    let path = out.path().join("nested/edition.pdf");
    let config = config_for(&server).build().unwrap();
    let stats = fetch_edition_to_file(date(), &path, &config)
        .await
        .unwrap();

    let written = std::fs::read(&path).unwrap();
    assert_eq!(stats.output_bytes, written.len() as u64);
    assert_colours(&page_colours(&written), &[RED, GREEN]);
    assert!(!path.with_extension("pdf.tmp").exists());
}

// ── Additional images ────────────────────────────────────────────────────────

#[tokio::test]
async fn included_additional_images_follow_their_page() {
    let server = MockServer::start().await;
    mount_edition(
        &server,
        DATE,
        &[
            MockPage::ok(RED).with_extra(YELLOW),
            MockPage::ok(GREEN),
            MockPage::ok(BLUE),
        ],
    )
    .await;

    let config = config_for(&server)
        .concurrency(2)
        .additional_images(AdditionalImages::Include)
        .build()
        .unwrap();
    let document = fetch_edition(date(), &config).await.unwrap();

    assert_eq!(document.page_count, 4);
    assert_eq!(document.stats.included_pages, 3);
    assert_eq!(document.pages[0].document_pages, 2);
    assert_colours(&page_colours(&document.bytes), &[RED, YELLOW, GREEN, BLUE]);
}

#[tokio::test]
async fn downloaded_additional_images_are_not_merged() {
    let server = MockServer::start().await;
    mount_edition(
        &server,
        DATE,
        &[MockPage::ok(RED).with_extra(YELLOW), MockPage::ok(GREEN)],
    )
    .await;

    let root = tempfile::tempdir().unwrap();
    let config = config_for(&server)
        .additional_images(AdditionalImages::Download)
        .storage(StorageMode::Persistent(root.path().to_path_buf()))
        .build()
        .unwrap();
    let document = fetch_edition(date(), &config).await.unwrap();

    assert_colours(&page_colours(&document.bytes), &[RED, GREEN]);
    assert_eq!(document.pages[0].additional_image_urls.len(), 1);
    assert!(root
        .path()
        .join(format!("images/{DATE}/page_01_additional_1.jpg"))
        .is_file());
}

#[tokio::test]
async fn unstorable_additional_image_does_not_fail_its_page() {
    let server = MockServer::start().await;
    mount_edition(
        &server,
        DATE,
        &[MockPage::ok(RED).with_extra(YELLOW), MockPage::ok(GREEN)],
    )
    .await;

    // A directory where the extra image file should go makes its write fail.
    let root = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(
        root.path()
            .join(format!("images/{DATE}/page_01_additional_1.jpg")),
    )
    .unwrap();

    let config = config_for(&server)
        .additional_images(AdditionalImages::Include)
        .on_page_error(FailurePolicy::Abort)
        .storage(StorageMode::Persistent(root.path().to_path_buf()))
        .build()
        .unwrap();
    let document = fetch_edition(date(), &config).await.unwrap();

    assert_eq!(document.stats.skipped_pages, 0);
    assert_eq!(document.pages[0].document_pages, 1);
    assert_colours(&page_colours(&document.bytes), &[RED, GREEN]);
}

#[tokio::test]
async fn unstorable_additional_document_does_not_fail_its_page() {
    let server = MockServer::start().await;
    mount_edition(
        &server,
        DATE,
        &[MockPage::ok(RED).with_extra(YELLOW), MockPage::ok(GREEN)],
    )
    .await;

    let root = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(root.path().join(format!("PDFs/{DATE}/page_01_1.pdf"))).unwrap();

    let config = config_for(&server)
        .additional_images(AdditionalImages::Include)
        .on_page_error(FailurePolicy::Abort)
        .storage(StorageMode::Persistent(root.path().to_path_buf()))
        .build()
        .unwrap();
    let document = fetch_edition(date(), &config).await.unwrap();

    assert!(root
        .path()
        .join(format!("images/{DATE}/page_01_additional_1.jpg"))
        .is_file());
    assert_colours(&page_colours(&document.bytes), &[RED, GREEN]);
}

// ── Inspect & streaming ──────────────────────────────────────────────────────

#[tokio::test]
async fn inspect_lists_pages_without_downloading_images() {
    let server = MockServer::start().await;
    mount_edition(
        &server,
        DATE,
        &[MockPage::ok(RED), MockPage::ok(GREEN), MockPage::ok(BLUE)],
    )
    .await;

    let config = config_for(&server).build().unwrap();
    let info = inspect(date(), &config).await.unwrap();

    assert_eq!(info.root_url, format!("{}/ahmedabad/{DATE}/1", server.uri()));
    let indices: Vec<usize> = info.pages.iter().map(|p| p.index).collect();
    assert_eq!(indices, vec![1, 2, 3]);
    assert_eq!(info.pages[2].url, format!("{}/ahmedabad/{DATE}/3", server.uri()));

    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| !r.url.path().starts_with("/img/")));
}

#[tokio::test]
async fn page_stream_yields_in_page_order() {
    let server = MockServer::start().await;
    mount_edition(
        &server,
        DATE,
        &[
            MockPage::ok(RED).slow(400),
            MockPage::missing_image(GREEN),
            MockPage::ok(BLUE),
        ],
    )
    .await;

    let config = config_for(&server).concurrency(3).build().unwrap();
    let items: Vec<_> = page_stream(date(), &config).await.unwrap().collect().await;

    assert_eq!(items.len(), 3);
    assert_eq!(items[0].as_ref().unwrap().page, 1);
    assert!(matches!(
        items[1],
        Err(PageError::ImageNotFound { page: 2, .. })
    ));
    let third = items[2].as_ref().unwrap();
    assert_eq!(third.order_key(), (3, 0));
    assert_colours(&page_colours(&third.bytes), &[BLUE]);
}
