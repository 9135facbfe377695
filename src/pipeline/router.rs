//! Routing and naming.
//!
//! Maps a verdict to a destination directory and file name, then files a copy
//! of the source. The source is never moved, deleted or modified, and an
//! existing destination file is never overwritten: a clashing name gets a
//! numeric suffix (`NAME_RDL.pdf`, `NAME_RDL_2.pdf`, ...).

use filetime::{set_file_mtime, FileTime};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::extractor::Document;
use crate::types::{ClientRecord, DocumentType, Outcome, SorterError, SorterResult};

pub const REVIEW_DIR: &str = "REVIEW_NEEDED";

/// Upper bound on suffixed names tried before giving up on a copy.
const MAX_NAME_ATTEMPTS: u32 = 10_000;

static DISALLOWED_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s-]").expect("sanitize pattern is valid"));
static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Subdirectory of the output root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Typed(DocumentType),
    Review,
}

impl Destination {
    pub const ALL: [Destination; 4] = [
        Destination::Typed(DocumentType::Rdl),
        Destination::Typed(DocumentType::Rcs),
        Destination::Typed(DocumentType::Unknown),
        Destination::Review,
    ];

    pub fn dir_name(&self) -> &'static str {
        match self {
            Destination::Typed(doc_type) => doc_type.as_str(),
            Destination::Review => REVIEW_DIR,
        }
    }
}

/// Where an outcome is filed. `UNSUPPORTED_FORMAT` is never filed.
pub fn destination_for(outcome: Outcome) -> Option<Destination> {
    match outcome {
        Outcome::PasswordProtected | Outcome::Unwanted | Outcome::NeedsReview => {
            Some(Destination::Review)
        }
        Outcome::Processed(doc_type) => Some(Destination::Typed(doc_type)),
        Outcome::UnsupportedFormat => None,
    }
}

/// File name prefix for review-queue copies.
pub fn review_prefix(outcome: Outcome) -> Option<&'static str> {
    match outcome {
        Outcome::PasswordProtected => Some("PASSWORD_PROTECTED_"),
        Outcome::Unwanted => Some("UNWANTED_"),
        Outcome::NeedsReview => Some("NO_CLIENT_INFO_"),
        Outcome::UnsupportedFormat | Outcome::Processed(_) => None,
    }
}

/// Drop everything except word characters, whitespace and hyphens, then
/// collapse each whitespace run into one underscore.
pub fn sanitize_client_name(name: &str) -> String {
    let stripped = DISALLOWED_CHARS.replace_all(name, "");
    WHITESPACE_RUN.replace_all(&stripped, "_").into_owned()
}

/// `<sanitized name>_<TYPE>.pdf`, or `None` if nothing usable survives sanitizing.
pub fn processed_filename(client_name: &str, doc_type: DocumentType) -> Option<String> {
    let clean = sanitize_client_name(client_name);
    if !clean.chars().any(char::is_alphanumeric) {
        return None;
    }
    Some(format!("{}_{}.pdf", clean, doc_type))
}

/// What the earlier stages decided about a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Protected,
    Unsupported,
    Unwanted,
    Classified {
        doc_type: DocumentType,
        client: Option<ClientRecord>,
    },
}

/// Outcome and target decided for a document before anything is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub outcome: Outcome,
    /// Directory and file name of the copy; `None` when nothing is filed.
    pub target: Option<(Destination, String)>,
}

/// Decide the final outcome and destination name for `verdict`. Pure.
pub fn plan(document: &Document, verdict: Verdict) -> Plan {
    let (outcome, processed_name) = match verdict {
        Verdict::Unsupported => (Outcome::UnsupportedFormat, None),
        Verdict::Protected => (Outcome::PasswordProtected, None),
        Verdict::Unwanted => (Outcome::Unwanted, None),
        Verdict::Classified { doc_type, client } => {
            match client.and_then(|c| processed_filename(&c.name, doc_type)) {
                Some(name) => (Outcome::Processed(doc_type), Some(name)),
                None => (Outcome::NeedsReview, None),
            }
        }
    };

    let target = destination_for(outcome).map(|destination| {
        let file_name = match (processed_name, review_prefix(outcome)) {
            (Some(name), _) => name,
            (None, Some(prefix)) => format!("{}{}", prefix, document.file_name()),
            (None, None) => document.file_name(),
        };
        (destination, file_name)
    });

    Plan { outcome, target }
}

/// Final outcome plus the path of the filed copy, if one was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routed {
    pub outcome: Outcome,
    pub filed_as: Option<PathBuf>,
}

impl Routed {
    /// File name of the filed copy.
    pub fn new_filename(&self) -> Option<String> {
        self.filed_as
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
    }
}

/// The fixed output directory taxonomy.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir(&self, destination: Destination) -> PathBuf {
        self.root.join(destination.dir_name())
    }

    /// Create the root and every destination directory. Safe to call repeatedly;
    /// existing directories and their contents are left alone.
    pub fn provision(&self) -> SorterResult<()> {
        for destination in Destination::ALL {
            fs::create_dir_all(self.dir(destination))?;
        }
        info!(root = %self.root.display(), "Output directories ready");
        Ok(())
    }

    /// Carry out `plan` for `document`: at most one copy.
    pub fn file(&self, document: &Document, plan: &Plan) -> SorterResult<Routed> {
        let Some((destination, file_name)) = &plan.target else {
            return Ok(Routed {
                outcome: plan.outcome,
                filed_as: None,
            });
        };

        let filed_as = copy_without_overwrite(document.path(), &self.dir(*destination), file_name)?;
        info!(
            source = %document.path().display(),
            dest = %filed_as.display(),
            outcome = %plan.outcome,
            "Filed document copy"
        );

        Ok(Routed {
            outcome: plan.outcome,
            filed_as: Some(filed_as),
        })
    }

    /// Plan and file in one step.
    pub fn route(&self, document: &Document, verdict: Verdict) -> SorterResult<Routed> {
        self.file(document, &plan(document, verdict))
    }
}

/// `name` for the first attempt, `stem_N.ext` afterwards.
fn candidate_name(file_name: &str, attempt: u32) -> String {
    if attempt <= 1 {
        return file_name.to_string();
    }

    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string());

    match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, attempt, ext.to_string_lossy()),
        None => format!("{}_{}", stem, attempt),
    }
}

/// Copy `source` into `dir` as `file_name`, picking a suffixed name when the
/// plain one is taken. Returns the path written.
pub fn copy_without_overwrite(source: &Path, dir: &Path, file_name: &str) -> SorterResult<PathBuf> {
    let mut reader = File::open(source)?;

    for attempt in 1..=MAX_NAME_ATTEMPTS {
        let candidate = dir.join(candidate_name(file_name, attempt));

        let mut writer = match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        };

        if attempt > 1 {
            debug!(file_name, chosen = %candidate.display(), "Destination name taken, using suffix");
        }

        if let Err(e) = io::copy(&mut reader, &mut writer).and_then(|_| writer.sync_all()) {
            drop(writer);
            let _ = fs::remove_file(&candidate);
            return Err(e.into());
        }
        drop(writer);

        // Timestamp carry-over is best effort
        match fs::metadata(source) {
            Ok(meta) => {
                if let Err(e) = set_file_mtime(&candidate, FileTime::from_last_modification_time(&meta)) {
                    debug!(dest = %candidate.display(), error = %e, "Could not preserve mtime");
                }
            }
            Err(e) => debug!(source = %source.display(), error = %e, "Could not read source metadata"),
        }

        return Ok(candidate);
    }

    Err(SorterError::NameExhausted(
        file_name.to_string(),
        dir.display().to_string(),
    ))
}
