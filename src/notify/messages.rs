//! Notification message composition.
//!
//! Pure functions from a [`Notice`] to the messages a mail transport would
//! send. Clients get one message per notice; the admin address, when
//! configured, gets an alert for protected and failed documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Notice;
use crate::types::Outcome;

const SIGNATURE: &str = "Document Processing System";

/// Which notification is being sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoticeKind {
    PasswordProtected,
    NeedsAttention,
    ProcessingComplete,
    ProcessingFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl EmailMessage {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
            created_at: at,
        }
    }
}

/// Connectivity check addressed to the admin.
pub fn admin_test_message(admin_email: &str, at: DateTime<Utc>) -> EmailMessage {
    let time = at.format("%Y-%m-%d %H:%M:%S UTC");
    EmailMessage::new(
        admin_email,
        "Email Service Test - Document Processing System",
        format!(
            "Email service test successful.\n\n\
             This is a test message confirming that notifications can be delivered.\n\n\
             Test time: {time}\n\
             To: {admin_email}\n\n\
             {SIGNATURE}\n"
        ),
        at,
    )
}

pub fn compose(
    kind: &NoticeKind,
    notice: &Notice,
    admin_email: Option<&str>,
    at: DateTime<Utc>,
) -> Vec<EmailMessage> {
    let name = notice.greeting_name();
    let file = notice.original_filename.as_str();
    let time = at.format("%Y-%m-%d %H:%M:%S UTC");

    let message = |to: &str, subject: String, body: String| EmailMessage::new(to, subject, body, at);

    let mut messages = Vec::new();

    match kind {
        NoticeKind::PasswordProtected => {
            messages.push(message(
                &notice.contact.address,
                "Document Resubmission Required - Password Protection Detected".to_string(),
                format!(
                    "Dear {name},\n\n\
                     Your document \"{file}\" could not be processed because it is password-protected.\n\n\
                     Document: {file}\n\
                     Time: {time}\n\n\
                     Please resubmit the document without password protection so we can continue processing it.\n\n\
                     Thank you,\n{SIGNATURE}\n"
                ),
            ));
            if let Some(admin) = admin_email {
                messages.push(message(
                    admin,
                    format!("Password-Protected Document Alert - {name}"),
                    format!(
                        "A password-protected document was received.\n\n\
                         Document: {file}\n\
                         Client: {name} ({address})\n\
                         Time: {time}\n\n\
                         The document was copied to the review queue and the client was asked to resubmit it.\n",
                        address = notice.contact.address
                    ),
                ));
            }
        }
        NoticeKind::NeedsAttention => {
            messages.push(message(
                &notice.contact.address,
                "Document Processing Issue - Action Required".to_string(),
                format!(
                    "Dear {name},\n\n\
                     We could not file your document \"{file}\" automatically: {reason}.\n\n\
                     Document: {file}\n\
                     Status: {outcome}\n\
                     Time: {time}\n\n\
                     Thank you,\n{SIGNATURE}\n",
                    reason = attention_reason(notice.outcome),
                    outcome = notice.outcome,
                ),
            ));
        }
        NoticeKind::ProcessingComplete => {
            let processed_as = notice.new_filename.as_deref().unwrap_or(file);
            let doc_type = notice
                .doc_type
                .map(|t| t.to_string())
                .unwrap_or_else(|| "UNKNOWN".to_string());
            messages.push(message(
                &notice.contact.address,
                "Document Processing Complete".to_string(),
                format!(
                    "Dear {name},\n\n\
                     Your document has been processed successfully.\n\n\
                     Original: {file}\n\
                     Processed as: {processed_as}\n\
                     Document type: {doc_type}\n\
                     Completed: {time}\n\n\
                     Thank you,\n{SIGNATURE}\n"
                ),
            ));
        }
        NoticeKind::ProcessingFailed(error) => {
            messages.push(message(
                &notice.contact.address,
                "Document Processing Issue - Action Required".to_string(),
                format!(
                    "Dear {name},\n\n\
                     We hit a problem while processing your document \"{file}\".\n\n\
                     Document: {file}\n\
                     Time: {time}\n\n\
                     Please resubmit the document or contact our support team.\n\n\
                     Thank you,\n{SIGNATURE}\n"
                ),
            ));
            if let Some(admin) = admin_email {
                messages.push(message(
                    admin,
                    format!("Processing Error Alert - {name}"),
                    format!(
                        "A document could not be filed.\n\n\
                         Document: {file}\n\
                         Client: {name} ({address})\n\
                         Time: {time}\n\
                         Error: {error}\n\n\
                         The original upload was left untouched and needs manual review.\n",
                        address = notice.contact.address
                    ),
                ));
            }
        }
    }

    messages
}

fn attention_reason(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Unwanted => {
            "it looks like an identity document (license, passport, birth certificate or social security card), which we do not accept"
        }
        Outcome::UnsupportedFormat => {
            "the file type is not supported; please send a PDF or a JPG, PNG or TIFF image"
        }
        Outcome::NeedsReview => {
            "the client details could not be read; a member of our team will review it"
        }
        Outcome::PasswordProtected => "the document is password-protected",
        Outcome::Processed(_) => "no action is needed",
    }
}
