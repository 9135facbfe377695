//! Text extraction
//!
//! Turns a PDF or image into one flat string. Extraction never fails the
//! pipeline: parse errors, OCR errors, panics and timeouts all degrade to
//! empty text, which downstream stages treat as unknown content.
//!
//! ## Strategies
//! - PDF: page text via lopdf, pages in order, concatenated
//! - Image: whole-image OCR via tesseract

use anyhow::{anyhow, Context, Result};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;
use tesseract_rs::TesseractAPI;
use tracing::{debug, warn};

use crate::types::DocumentKind;

/// One input file. Bytes are opened lazily by whichever strategy handles it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    path: PathBuf,
    kind: DocumentKind,
}

impl Document {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let kind = DocumentKind::from_path(&path);
        Self { path, kind }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// Final path component, used for review-queue names and notifications.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string())
    }
}

/// Source of document text and structural metadata.
///
/// Implementations must not panic on bad input and must return empty text
/// rather than an error.
pub trait TextSource: Send + Sync {
    /// Whether a PDF carries an encryption dictionary. Only called for PDFs.
    fn is_protected(&self, document: &Document) -> bool;

    /// Extract all text from a PDF or image.
    fn extract(&self, document: &Document) -> String;
}

/// Production text source backed by lopdf and tesseract.
pub struct NativeTextSource {
    tessdata_dir: String,
    language: String,
}

impl NativeTextSource {
    pub fn new(tessdata_dir: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            tessdata_dir: tessdata_dir.into(),
            language: language.into(),
        }
    }

    fn extract_pdf(&self, path: &Path) -> Result<String> {
        let doc = lopdf::Document::load(path).context("Failed to parse PDF")?;

        // get_pages is keyed by page number, so iteration is already in page order
        let mut text = String::new();
        for page_number in doc.get_pages().keys() {
            let page_text = doc
                .extract_text(&[*page_number])
                .with_context(|| format!("Failed to extract text from page {}", page_number))?;
            text.push_str(&page_text);
        }

        Ok(text)
    }

    fn extract_image(&self, path: &Path) -> Result<String> {
        let image = image::open(path).context("Failed to decode image")?.to_rgb8();
        let (width, height) = image.dimensions();
        let width = i32::try_from(width).context("Image too wide")?;
        let height = i32::try_from(height).context("Image too tall")?;

        let api = TesseractAPI::new();
        api.init(&self.tessdata_dir, &self.language)
            .map_err(|e| anyhow!("Tesseract init failed: {:?}", e))?;
        api.set_image(image.as_raw(), width, height, 3, 3 * width)
            .map_err(|e| anyhow!("Tesseract rejected image: {:?}", e))?;

        api.get_utf8_text()
            .map_err(|e| anyhow!("OCR failed: {:?}", e))
    }
}

impl TextSource for NativeTextSource {
    fn is_protected(&self, document: &Document) -> bool {
        match lopdf::Document::load(document.path()) {
            Ok(doc) => doc.is_encrypted(),
            Err(e) => {
                debug!(path = %document.path().display(), error = %e, "PDF unreadable during protection check");
                false
            }
        }
    }

    fn extract(&self, document: &Document) -> String {
        let result = match document.kind() {
            DocumentKind::Pdf => self.extract_pdf(document.path()),
            DocumentKind::Image => self.extract_image(document.path()),
            DocumentKind::Unsupported => Ok(String::new()),
        };

        result.unwrap_or_else(|e| {
            warn!(path = %document.path().display(), kind = ?document.kind(), "Text extraction failed: {:#}", e);
            String::new()
        })
    }
}

/// Run `source.extract` on the calling thread, turning a panic into empty text.
pub fn extract_guarded(source: &dyn TextSource, document: &Document) -> String {
    match panic::catch_unwind(AssertUnwindSafe(|| source.extract(document))) {
        Ok(text) => text,
        Err(_) => {
            warn!(path = %document.path().display(), "Text extraction panicked");
            String::new()
        }
    }
}

/// Run `source.extract` on a worker thread, giving up after `timeout`.
///
/// A timed-out worker is left to finish on its own; its result is discarded.
pub fn extract_with_timeout(
    source: &Arc<dyn TextSource>,
    document: &Document,
    timeout: Option<Duration>,
) -> String {
    let Some(limit) = timeout else {
        return extract_guarded(source.as_ref(), document);
    };

    let (tx, rx) = mpsc::channel();
    let worker_source = Arc::clone(source);
    let worker_document = document.clone();

    let spawned = thread::Builder::new()
        .name("doc-extract".to_string())
        .spawn(move || {
            let text = worker_source.extract(&worker_document);
            let _ = tx.send(text);
        });

    if let Err(e) = spawned {
        warn!("Could not spawn extraction worker, extracting inline: {}", e);
        return extract_guarded(source.as_ref(), document);
    }

    match rx.recv_timeout(limit) {
        Ok(text) => text,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            warn!(
                path = %document.path().display(),
                timeout_secs = limit.as_secs_f64(),
                "Text extraction timed out"
            );
            String::new()
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            warn!(path = %document.path().display(), "Extraction worker exited without a result");
            String::new()
        }
    }
}
