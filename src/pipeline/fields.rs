//! Client field extraction.
//!
//! Each document type maps to one pure strategy over the raw text. A strategy
//! returning `None` is an expected outcome (the document goes to review), not
//! an error.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{ClientRecord, DocumentType};

pub type ExtractionStrategy = fn(&str) -> Option<ClientRecord>;

/// Strategy per document type. Types without an entry never yield a client.
pub const STRATEGIES: &[(DocumentType, ExtractionStrategy)] = &[
    (DocumentType::Rdl, extract_rdl_client),
    (DocumentType::Rcs, extract_rcs_client),
];

/// Line that anchors the name search in rating decision letters.
const RDL_ANCHOR: &str = "VA File Number";

/// How many lines above the anchor may hold the name.
const RDL_WINDOW: usize = 5;

/// Letterhead lines that look like names but never are.
const RDL_STOPLIST: &[&str] = &[
    "DEPARTMENT OF VETERANS AFFAIRS",
    "VETERANS BENEFITS ADMINISTRATION",
    "REGIONAL OFFICE",
];

static RCS_CLIENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Client:\s*([A-Za-z\s.]+)\s*\(").expect("RCS client pattern is valid")
});

pub fn strategy_for(doc_type: DocumentType) -> Option<ExtractionStrategy> {
    STRATEGIES
        .iter()
        .find(|(t, _)| *t == doc_type)
        .map(|(_, strategy)| *strategy)
}

/// Run the strategy registered for `doc_type`.
pub fn extract_client(text: &str, doc_type: DocumentType) -> Option<ClientRecord> {
    strategy_for(doc_type).and_then(|strategy| strategy(text))
}

/// Rating decision letters print the veteran's name in capitals a few lines
/// above the "VA File Number" caption.
pub fn extract_rdl_client(text: &str) -> Option<ClientRecord> {
    let lines: Vec<&str> = text.split('\n').collect();

    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.contains(RDL_ANCHOR))
        .find_map(|(anchor, _)| {
            let start = anchor.saturating_sub(RDL_WINDOW);
            lines[start..anchor]
                .iter()
                .map(|line| line.trim())
                .find(|candidate| is_rdl_name_line(candidate))
        })
        .map(|name| ClientRecord {
            name: name.to_string(),
            id: None,
        })
}

fn is_rdl_name_line(line: &str) -> bool {
    line.chars().count() > 3
        && is_all_caps(line)
        && !line.chars().any(char::is_numeric)
        && !RDL_STOPLIST.contains(&line)
}

/// At least one cased character and no lowercase ones.
fn is_all_caps(line: &str) -> bool {
    line.chars().any(char::is_uppercase) && !line.chars().any(char::is_lowercase)
}

/// Authorization forms carry `Client: <name> (ID: ...)`. The parenthesised
/// id is not captured.
pub fn extract_rcs_client(text: &str) -> Option<ClientRecord> {
    let captures = RCS_CLIENT.captures(text)?;
    let name = captures.get(1)?.as_str().trim();

    Some(ClientRecord {
        name: name.to_string(),
        id: None,
    })
}
