//! Document classification pipeline
//!
//! Five stages run strictly in order for each document:
//!
//! ```text
//! extract ──▶ gatekeeper ──▶ classify ──▶ extract client ──▶ route/name
//!    │            │                                              │
//!    │            └── PASSWORD_PROTECTED / UNWANTED ─────────────▶│
//!    └── UNSUPPORTED_FORMAT (no extraction) ─────────────────────▶│
//!                                                                 ▼
//!                                                       one outcome + ≤1 copy
//! ```
//!
//! Documents are independent: nothing is shared between two runs except the
//! output directory tree.

pub mod classifier;
pub mod extractor;
pub mod fields;
pub mod gatekeeper;
pub mod router;

pub use extractor::{Document, NativeTextSource, TextSource};
pub use router::{Destination, OutputLayout, Plan, Routed, Verdict};

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::notify::{self, Notice, Notifier};
use crate::types::{ClientContact, DocumentKind, DocumentType, Outcome, SorterResult};

/// Result of processing one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessReport {
    pub outcome: Outcome,
    pub original_filename: String,
    /// File name of the filed copy, if one was made.
    pub new_filename: Option<String>,
    /// Classification, when the document got that far.
    pub doc_type: Option<DocumentType>,
    pub client_name: Option<String>,
}

/// Per-file entry of a batch run.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum BatchEntry {
    Done(ProcessReport),
    Failed { error: String },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub results: BTreeMap<String, BatchEntry>,
}

impl BatchReport {
    /// Number of files per outcome code; hard failures count under `FAILED`.
    pub fn counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for entry in self.results.values() {
            let key = match entry {
                BatchEntry::Done(report) => report.outcome.to_string(),
                BatchEntry::Failed { .. } => "FAILED".to_string(),
            };
            *counts.entry(key).or_insert(0) += 1;
        }
        counts
    }

    pub fn failures(&self) -> usize {
        self.results
            .values()
            .filter(|e| matches!(e, BatchEntry::Failed { .. }))
            .count()
    }
}

pub struct Pipeline {
    source: Arc<dyn TextSource>,
    notifier: Arc<dyn Notifier>,
    layout: OutputLayout,
    extraction_timeout: Option<Duration>,
}

impl Pipeline {
    pub fn new(source: Arc<dyn TextSource>, notifier: Arc<dyn Notifier>, layout: OutputLayout) -> Self {
        Self {
            source,
            notifier,
            layout,
            extraction_timeout: None,
        }
    }

    pub fn with_extraction_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.extraction_timeout = timeout;
        self
    }

    /// Production wiring: lopdf/tesseract extraction and the configured notifier.
    pub fn from_config(config: &Config) -> Self {
        let sorter = &config.sorter;
        let source = Arc::new(NativeTextSource::new(&sorter.tessdata_dir, &sorter.ocr_language));
        let timeout = match sorter.extraction_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        Self::new(source, notify::from_config(&config.notify), OutputLayout::new(&sorter.output_dir))
            .with_extraction_timeout(timeout)
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Create the output directory taxonomy. Call once before processing.
    pub fn setup(&self) -> SorterResult<()> {
        self.layout.provision()
    }

    /// Stages 1-4: everything up to routing, with no filesystem side effects.
    pub fn evaluate(&self, document: &Document) -> Verdict {
        if document.kind() == DocumentKind::Unsupported {
            return Verdict::Unsupported;
        }

        if gatekeeper::check_protection(self.source.as_ref(), document).is_some() {
            return Verdict::Protected;
        }

        let text = extractor::extract_with_timeout(&self.source, document, self.extraction_timeout);
        debug!(file = %document.file_name(), chars = text.len(), "Text extracted");

        if gatekeeper::check_content(&text).is_some() {
            return Verdict::Unwanted;
        }

        let doc_type = classifier::classify(&text);
        let client = fields::extract_client(&text, doc_type);
        debug!(file = %document.file_name(), %doc_type, found_client = client.is_some(), "Document classified");

        Verdict::Classified { doc_type, client }
    }

    /// Process one document: decide its outcome, file at most one copy, and
    /// notify `contact` when given.
    ///
    /// Errors are hard I/O failures while filing; the source is untouched.
    pub fn process_file(&self, path: &Path, contact: Option<&ClientContact>) -> SorterResult<ProcessReport> {
        let document = Document::new(path);
        info!(file = %document.file_name(), kind = ?document.kind(), "Processing document");

        let verdict = self.evaluate(&document);
        let (doc_type, client_name) = match &verdict {
            Verdict::Classified { doc_type, client } => {
                (Some(*doc_type), client.as_ref().map(|c| c.name.clone()))
            }
            _ => (None, None),
        };

        let plan = router::plan(&document, verdict);
        let routed = match self.layout.file(&document, &plan) {
            Ok(routed) => routed,
            Err(e) => {
                error!(file = %document.file_name(), outcome = %plan.outcome, "Filing failed: {}", e);
                if let Some(contact) = contact {
                    let notice = Notice {
                        outcome: plan.outcome,
                        contact: contact.clone(),
                        original_filename: document.file_name(),
                        new_filename: None,
                        doc_type,
                        client_name,
                    };
                    notify::dispatch_failure(self.notifier.as_ref(), &notice, &e.to_string());
                }
                return Err(e);
            }
        };

        let report = ProcessReport {
            outcome: routed.outcome,
            original_filename: document.file_name(),
            new_filename: routed.new_filename(),
            doc_type,
            client_name,
        };
        info!(file = %report.original_filename, outcome = %report.outcome, "Document processed");

        if let Some(contact) = contact {
            let notice = Notice {
                outcome: report.outcome,
                contact: contact.clone(),
                original_filename: report.original_filename.clone(),
                new_filename: report.new_filename.clone(),
                doc_type: report.doc_type,
                client_name: report.client_name.clone(),
            };
            notify::dispatch(self.notifier.as_ref(), &notice);
        }

        Ok(report)
    }

    /// Process every regular file directly inside `input_dir`, in name order.
    /// A failure on one file is recorded and the run continues.
    pub fn process_all(&self, input_dir: &Path) -> SorterResult<BatchReport> {
        let mut paths: Vec<_> = fs::read_dir(input_dir)?
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry.path()),
                Err(e) => {
                    warn!(input = %input_dir.display(), "Skipping unreadable directory entry: {}", e);
                    None
                }
            })
            .filter(|path| path.is_file())
            .collect();
        paths.sort();

        info!(input = %input_dir.display(), files = paths.len(), "Starting batch");

        let mut report = BatchReport::default();
        for path in paths {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            let entry = match self.process_file(&path, None) {
                Ok(result) => BatchEntry::Done(result),
                Err(e) => BatchEntry::Failed { error: e.to_string() },
            };
            report.results.insert(name, entry);
        }

        info!(processed = report.results.len(), failed = report.failures(), "Batch finished");
        Ok(report)
    }
}
