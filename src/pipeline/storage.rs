//! Per-run storage for intermediate images and page documents.
//!
//! [`prepare_storage`] returns a [`RunStorage`] handle scoped to one run.
//! In transient mode the handle owns a private temporary directory that is
//! removed when the handle is dropped, on success, failure or panic alike.
//! In persistent mode files are kept under
//! `<root>/images/<dd-mm-yyyy>/` and `<root>/PDFs/<dd-mm-yyyy>/`, so runs for
//! different dates never share a directory.

use crate::config::StorageMode;
use crate::date::EPaperDate;
use crate::error::{EpaperError, PageError};
use crate::pipeline::encode::PageDocument;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// Prefix of transient run directories.
pub const TRANSIENT_PREFIX: &str = "epaper2pdf-";

/// Directories one run writes its intermediates to.
#[derive(Debug)]
pub struct RunStorage {
    images_dir: PathBuf,
    pdfs_dir: PathBuf,
    /// Kept alive so the directory survives until the run ends.
    _temp_dir: Option<TempDir>,
}

/// Create the storage for one run.
pub async fn prepare_storage(
    date: &EPaperDate,
    mode: &StorageMode,
) -> Result<RunStorage, EpaperError> {
    let segment = date.portal_segment();
    let storage = match mode {
        StorageMode::Transient => {
            let temp_dir = tempfile::Builder::new()
                .prefix(&format!("{TRANSIENT_PREFIX}{segment}-"))
                .tempdir()
                .map_err(|source| EpaperError::Storage {
                    path: std::env::temp_dir(),
                    source,
                })?;
            RunStorage {
                images_dir: temp_dir.path().join("images"),
                pdfs_dir: temp_dir.path().join("PDFs"),
                _temp_dir: Some(temp_dir),
            }
        }
        StorageMode::Persistent(root) => RunStorage {
            images_dir: root.join("images").join(&segment),
            pdfs_dir: root.join("PDFs").join(&segment),
            _temp_dir: None,
        },
    };

    for dir in [&storage.images_dir, &storage.pdfs_dir] {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| EpaperError::Storage {
                path: dir.clone(),
                source,
            })?;
    }
    debug!(
        "Run storage ready: {} / {}",
        storage.images_dir.display(),
        storage.pdfs_dir.display()
    );
    Ok(storage)
}

impl RunStorage {
    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    pub fn pdfs_dir(&self) -> &Path {
        &self.pdfs_dir
    }

    /// Whether the directories disappear when the handle is dropped.
    pub fn is_transient(&self) -> bool {
        self._temp_dir.is_some()
    }

    /// `page_NN.jpg` for the primary image, `page_NN_additional_K.jpg` for
    /// the K-th additional image.
    pub fn image_path(&self, page: usize, part: usize) -> PathBuf {
        let name = if part == 0 {
            format!("page_{page:02}.jpg")
        } else {
            format!("page_{page:02}_additional_{part}.jpg")
        };
        self.images_dir.join(name)
    }

    /// `page_NN.pdf` for the primary image, `page_NN_K.pdf` for included
    /// additional images. Names sort in merge order.
    pub fn document_path(&self, page: usize, part: usize) -> PathBuf {
        let name = if part == 0 {
            format!("page_{page:02}.pdf")
        } else {
            format!("page_{page:02}_{part}.pdf")
        };
        self.pdfs_dir.join(name)
    }

    /// Store downloaded image bytes as served.
    pub async fn save_image(
        &self,
        page: usize,
        part: usize,
        bytes: &[u8],
    ) -> Result<PathBuf, PageError> {
        let path = self.image_path(page, part);
        write(page, &path, bytes).await?;
        Ok(path)
    }

    /// Store an encoded page document.
    pub async fn save_document(&self, document: &PageDocument) -> Result<PathBuf, PageError> {
        let path = self.document_path(document.page, document.part);
        write(document.page, &path, &document.bytes).await?;
        Ok(path)
    }
}

async fn write(page: usize, path: &Path, bytes: &[u8]) -> Result<(), PageError> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| PageError::StorageFailed {
            page,
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
}
