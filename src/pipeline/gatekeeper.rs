//! Gatekeeper: rejects documents that must not be filed.
//!
//! Two checks, in order:
//! 1. PDF protection (before extraction; images cannot be encrypted)
//! 2. Unwanted identity documents (after extraction, on uppercased text)

use tracing::info;

use super::extractor::{Document, TextSource};
use crate::types::{DocumentKind, Outcome};

/// Content signatures of identity documents that are never filed.
///
/// `"DL"` is a bare substring test and will also match words such as
/// `HANDLING` or `MIDDLE`. It is kept as-is until the intended scope of the
/// check is confirmed.
pub const UNWANTED_MARKERS: &[&str] = &[
    "DRIVER'S LICENSE",
    "DRIVERS LICENSE",
    "DL",
    "PASSPORT",
    "BIRTH CERTIFICATE",
    "SOCIAL SECURITY CARD",
];

/// Protection gate. Returns `Some(PasswordProtected)` only for encrypted PDFs.
pub fn check_protection(source: &dyn TextSource, document: &Document) -> Option<Outcome> {
    if document.kind() != DocumentKind::Pdf {
        return None;
    }

    if source.is_protected(document) {
        info!(path = %document.path().display(), "Document is password protected");
        Some(Outcome::PasswordProtected)
    } else {
        None
    }
}

/// First unwanted marker found in `text`, if any.
pub fn unwanted_marker(text: &str) -> Option<&'static str> {
    let upper = text.to_uppercase();
    UNWANTED_MARKERS
        .iter()
        .copied()
        .find(|marker| upper.contains(marker))
}

/// Content gate. Returns `Some(Unwanted)` when any denylisted marker appears.
pub fn check_content(text: &str) -> Option<Outcome> {
    unwanted_marker(text).map(|marker| {
        info!(marker, "Unwanted document signature matched");
        Outcome::Unwanted
    })
}
