//! Content-signature classification.
//!
//! Rules are evaluated in table order against the uppercased text and the
//! first match wins. Adding a document type means appending a rule here and a
//! strategy in `fields`.

use crate::types::DocumentType;

/// Substring predicate over uppercased text.
#[derive(Debug, Clone, Copy)]
pub enum Signature {
    /// Every marker must appear.
    AllOf(&'static [&'static str]),
    /// At least one marker must appear.
    AnyOf(&'static [&'static str]),
}

impl Signature {
    pub fn matches(&self, upper: &str) -> bool {
        match self {
            Signature::AllOf(markers) => markers.iter().all(|m| upper.contains(m)),
            Signature::AnyOf(markers) => markers.iter().any(|m| upper.contains(m)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ClassificationRule {
    pub doc_type: DocumentType,
    pub signature: Signature,
}

/// Priority-ordered rules.
pub const RULES: &[ClassificationRule] = &[
    ClassificationRule {
        doc_type: DocumentType::Rdl,
        signature: Signature::AllOf(&["DEPARTMENT OF VETERANS AFFAIRS", "RATING DECISION"]),
    },
    ClassificationRule {
        doc_type: DocumentType::Rcs,
        signature: Signature::AnyOf(&["TM CLIENT AUTHORIZATION", "TM-RCS-"]),
    },
];

pub fn classify(text: &str) -> DocumentType {
    classify_with(RULES, text)
}

pub fn classify_with(rules: &[ClassificationRule], text: &str) -> DocumentType {
    let upper = text.to_uppercase();
    rules
        .iter()
        .find(|rule| rule.signature.matches(&upper))
        .map(|rule| rule.doc_type)
        .unwrap_or(DocumentType::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rdl_requires_both_markers() {
        assert_eq!(
            classify("Department of Veterans Affairs\nRating Decision"),
            DocumentType::Rdl
        );
        assert_eq!(classify("Department of Veterans Affairs"), DocumentType::Unknown);
        assert_eq!(classify("Rating Decision"), DocumentType::Unknown);
    }

    #[test]
    fn test_rcs_either_marker() {
        assert_eq!(classify("TM Client Authorization Form"), DocumentType::Rcs);
        assert_eq!(classify("Document ID: TM-RCS-2023-8765"), DocumentType::Rcs);
    }

    #[test]
    fn test_rdl_wins_over_rcs() {
        let text = "DEPARTMENT OF VETERANS AFFAIRS\nRATING DECISION\nTM-RCS-0001";
        assert_eq!(classify(text), DocumentType::Rdl);
    }

    #[test]
    fn test_markers_are_not_whitespace_normalized() {
        assert_eq!(
            classify("DEPARTMENT OF  VETERANS AFFAIRS\nRATING DECISION"),
            DocumentType::Unknown
        );
        assert_eq!(classify("TM CLIENT\nAUTHORIZATION"), DocumentType::Unknown);
    }

    #[test]
    fn test_custom_rule_order() {
        let rules = [
            ClassificationRule {
                doc_type: DocumentType::Rcs,
                signature: Signature::AnyOf(&["TM-RCS-"]),
            },
            ClassificationRule {
                doc_type: DocumentType::Rdl,
                signature: Signature::AllOf(&["RATING DECISION"]),
            },
        ];
        assert_eq!(classify_with(&rules, "rating decision TM-RCS-1"), DocumentType::Rcs);
        assert_eq!(classify_with(&[], "anything"), DocumentType::Unknown);
    }
}
