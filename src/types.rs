// Type definitions and enums

use std::path::Path;

/// Input kind, derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Image,
    Unsupported,
}

impl DocumentKind {
    /// Case-insensitive extension lookup. Files without an extension are unsupported.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase());

        match ext.as_deref() {
            Some("pdf") => DocumentKind::Pdf,
            Some("jpg") | Some("jpeg") | Some("png") | Some("tiff") => DocumentKind::Image,
            _ => DocumentKind::Unsupported,
        }
    }
}

/// Closed set of document types the classifier can assign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum DocumentType {
    #[serde(rename = "RDL")]
    Rdl,
    #[serde(rename = "RCS")]
    Rcs,
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Rdl => "RDL",
            DocumentType::Rcs => "RCS",
            DocumentType::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal result of processing one document.
///
/// Serializes as its outcome code (`PASSWORD_PROTECTED`, `PROCESSED_RDL`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    PasswordProtected,
    UnsupportedFormat,
    Unwanted,
    NeedsReview,
    Processed(DocumentType),
}

impl Outcome {
    pub fn is_processed(&self) -> bool {
        matches!(self, Outcome::Processed(_))
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::PasswordProtected => write!(f, "PASSWORD_PROTECTED"),
            Outcome::UnsupportedFormat => write!(f, "UNSUPPORTED_FORMAT"),
            Outcome::Unwanted => write!(f, "UNWANTED"),
            Outcome::NeedsReview => write!(f, "NEEDS_REVIEW"),
            Outcome::Processed(doc_type) => write!(f, "PROCESSED_{}", doc_type),
        }
    }
}

impl serde::Serialize for Outcome {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Client identity pulled out of document text. Lives for one document only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientRecord {
    pub name: String,
    pub id: Option<String>,
}

/// Contact details supplied by the caller alongside a document.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ClientContact {
    pub address: String,
    pub name: Option<String>,
}

impl ClientContact {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Build a contact from optional request fields; blank addresses yield `None`.
    pub fn from_parts(address: Option<String>, name: Option<String>) -> Option<Self> {
        let address = address.map(|a| a.trim().to_string()).filter(|a| !a.is_empty())?;
        let name = name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        Some(Self { address, name })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SorterError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not find a free file name for {0} in {1}")]
    NameExhausted(String, String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type SorterResult<T> = std::result::Result<T, SorterError>;
