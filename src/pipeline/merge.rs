//! Document merging: ordered single-page documents → one multi-page PDF.
//!
//! Every input is loaded, its objects renumbered into a shared id space,
//! and its pages appended to one `Pages` node in input order. Inputs may
//! themselves be multi-page, so merging `[1..k]` and `[k+1..N]` and then
//! merging the two results gives the same page sequence as merging
//! `[1..N]` directly.
//!
//! Any unreadable input fails the whole merge; a partial document is never
//! returned.

use crate::error::EpaperError;
use crate::pipeline::encode::PageDocument;
use lopdf::{Dictionary, Document, Object, ObjectId};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Runs of digits in a file name, e.g. `7` and `2` in `page_07_2.pdf`.
static PAGE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// Merge page documents in ascending `(page, part)` order.
///
/// Order comes from the index each [`PageDocument`] carries, never from the
/// order the documents finished in.
pub fn merge_pages(mut pages: Vec<PageDocument>) -> Result<Vec<u8>, EpaperError> {
    pages.sort_by_key(PageDocument::order_key);
    let inputs: Vec<Vec<u8>> = pages.into_iter().map(|p| p.bytes).collect();
    merge_documents(&inputs)
}

/// Concatenate the pages of `documents`, in slice order.
pub fn merge_documents(documents: &[Vec<u8>]) -> Result<Vec<u8>, EpaperError> {
    if documents.is_empty() {
        return Err(EpaperError::Merge {
            detail: "no page documents to merge".to_string(),
        });
    }

    let mut max_id: u32 = 1;
    let mut page_objects: Vec<(ObjectId, Object)> = Vec::new();
    let mut other_objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for (i, bytes) in documents.iter().enumerate() {
        let mut doc = Document::load_mem(bytes).map_err(|e| EpaperError::Merge {
            detail: format!("document {} is unreadable: {}", i + 1, e),
        })?;

        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        let pages = doc.get_pages();
        if pages.is_empty() {
            return Err(EpaperError::Merge {
                detail: format!("document {} has no pages", i + 1),
            });
        }
        // BTreeMap keyed by page number, so this is document page order.
        for page_id in pages.into_values() {
            let page = doc.get_object(page_id).map_err(|e| EpaperError::Merge {
                detail: format!("document {}: missing page object: {}", i + 1, e),
            })?;
            page_objects.push((page_id, page.clone()));
        }

        for (id, object) in doc.objects {
            match object.type_name().unwrap_or("") {
                "Catalog" | "Pages" | "Page" | "Outlines" | "Outline" => {}
                _ => {
                    other_objects.insert(id, object);
                }
            }
        }
    }

    let mut merged = Document::with_version("1.5");
    merged.objects.extend(other_objects);
    merged.max_id = max_id;

    let pages_id = merged.new_object_id();
    let mut kids = Vec::with_capacity(page_objects.len());
    for (id, object) in page_objects {
        let Object::Dictionary(mut dict) = object else {
            return Err(EpaperError::Merge {
                detail: format!("page object {id:?} is not a dictionary"),
            });
        };
        dict.set("Parent", Object::Reference(pages_id));
        merged.objects.insert(id, Object::Dictionary(dict));
        kids.push(Object::Reference(id));
    }
    let count = kids.len();

    merged.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(count as i64)),
        ])),
    );
    let catalog_id = merged.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    merged.trailer.set("Root", Object::Reference(catalog_id));
    merged.renumber_objects();

    let mut output = Vec::new();
    merged.save_to(&mut output).map_err(|e| EpaperError::Merge {
        detail: format!("writing merged document failed: {e}"),
    })?;

    debug!(
        "Merged {} documents → {} pages, {} bytes",
        documents.len(),
        count,
        output.len()
    );
    Ok(output)
}

/// Number of pages in a PDF.
pub fn page_count(bytes: &[u8]) -> Result<usize, EpaperError> {
    let doc = Document::load_mem(bytes).map_err(|e| EpaperError::Merge {
        detail: format!("document is unreadable: {e}"),
    })?;
    Ok(doc.get_pages().len())
}

/// Every number embedded in a file name, in order. `page_01_10.pdf` gives
/// `[1, 10]`, so extra parts of one page sort numerically after it.
pub fn numbers_in_name(name: &str) -> Vec<u64> {
    PAGE_NUMBER
        .find_iter(name)
        .filter_map(|m| m.as_str().parse().ok())
        .collect()
}

/// `*.pdf` files of `dir`, ordered by the numbers in their names.
///
/// Files without a number sort last, by name.
pub async fn page_files(dir: &Path) -> Result<Vec<PathBuf>, EpaperError> {
    let storage_err = |source| EpaperError::Storage {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(storage_err)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(storage_err)? {
        let path = entry.path();
        let is_pdf = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        let is_file = entry.file_type().await.is_ok_and(|t| t.is_file());
        if is_pdf && is_file {
            files.push(path);
        }
    }

    files.sort_by_cached_key(|p| {
        let name = p
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let numbers = numbers_in_name(&name);
        (numbers.is_empty(), numbers, name)
    });
    Ok(files)
}

/// Merge the page documents of a persisted run directory.
pub async fn merge_directory(dir: impl AsRef<Path>) -> Result<Vec<u8>, EpaperError> {
    let dir = dir.as_ref();
    let files = page_files(dir).await?;
    if files.is_empty() {
        return Err(EpaperError::Merge {
            detail: format!("no PDF files in '{}'", dir.display()),
        });
    }
    info!("Merging {} page files from {}", files.len(), dir.display());

    let mut documents = Vec::with_capacity(files.len());
    for path in &files {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| EpaperError::Storage {
                path: path.clone(),
                source,
            })?;
        documents.push(bytes);
    }

    tokio::task::spawn_blocking(move || merge_documents(&documents))
        .await
        .map_err(|e| EpaperError::Internal(format!("merge task panicked: {e}")))?
}
