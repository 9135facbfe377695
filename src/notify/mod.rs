//! Client notifications
//!
//! The pipeline hands a [`Notice`] to an injected [`Notifier`] once a document
//! reaches a terminal outcome and the caller supplied a contact address.
//! Delivery is fire-and-forget: failures are logged and never change the
//! outcome or the filed copy.

pub mod messages;

use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{NotifyConfig, NotifyMode};
use crate::types::{ClientContact, DocumentType, Outcome, SorterError, SorterResult};
use messages::{compose, EmailMessage, NoticeKind};

/// Payload describing one processed document.
#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub outcome: Outcome,
    pub contact: ClientContact,
    pub original_filename: String,
    pub new_filename: Option<String>,
    pub doc_type: Option<DocumentType>,
    /// Name extracted from the document, when there was one.
    pub client_name: Option<String>,
}

impl Notice {
    /// Name to address the client by.
    pub fn greeting_name(&self) -> &str {
        let extracted = if self.outcome.is_processed() {
            self.client_name.as_deref()
        } else {
            None
        };

        extracted
            .or(self.contact.name.as_deref())
            .unwrap_or("Client")
    }
}

pub trait Notifier: Send + Sync {
    fn password_protected(&self, notice: &Notice) -> SorterResult<()>;

    /// Unwanted, unsupported and review-queue outcomes.
    fn needs_attention(&self, notice: &Notice) -> SorterResult<()>;

    fn processing_complete(&self, notice: &Notice) -> SorterResult<()>;

    /// Hard failure while filing; `error` is the failure description.
    fn processing_failed(&self, notice: &Notice, error: &str) -> SorterResult<()>;
}

/// Send the notification matching `notice.outcome`. Returns whether it was delivered.
pub fn dispatch(notifier: &dyn Notifier, notice: &Notice) -> bool {
    let result = match notice.outcome {
        Outcome::PasswordProtected => notifier.password_protected(notice),
        Outcome::Processed(_) => notifier.processing_complete(notice),
        Outcome::Unwanted | Outcome::UnsupportedFormat | Outcome::NeedsReview => {
            notifier.needs_attention(notice)
        }
    };
    log_delivery(notice, result)
}

/// Send a failure notification. Returns whether it was delivered.
pub fn dispatch_failure(notifier: &dyn Notifier, notice: &Notice, error: &str) -> bool {
    log_delivery(notice, notifier.processing_failed(notice, error))
}

fn log_delivery(notice: &Notice, result: SorterResult<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            warn!(
                to = %notice.contact.address,
                file = %notice.original_filename,
                "Notification not delivered: {}",
                e
            );
            false
        }
    }
}

/// The configured transport, seen both as the pipeline's notifier and as a
/// raw mailbox for ad-hoc messages.
pub fn transport_from_config(config: &NotifyConfig) -> (Arc<dyn Notifier>, Arc<dyn Mailbox>) {
    fn shared<T: Mailbox + 'static>(mailbox: T) -> (Arc<dyn Notifier>, Arc<dyn Mailbox>) {
        let mailbox = Arc::new(mailbox);
        (mailbox.clone(), mailbox)
    }

    match config.mode {
        NotifyMode::Log => shared(LogNotifier::new(config.admin_email.clone())),
        NotifyMode::Outbox => shared(OutboxNotifier::new(
            config.outbox_dir.clone(),
            config.admin_email.clone(),
        )),
        NotifyMode::None => shared(NoopNotifier),
    }
}

/// Build the notifier selected by configuration.
pub fn from_config(config: &NotifyConfig) -> Arc<dyn Notifier> {
    transport_from_config(config).0
}

/// Message transport. Every `Mailbox` is a [`Notifier`] that composes the
/// messages for each notice kind and hands them to `deliver` one by one.
pub trait Mailbox: Send + Sync {
    fn admin_email(&self) -> Option<&str>;

    fn deliver(&self, message: &EmailMessage) -> SorterResult<()>;

    /// Every composed message is attempted; the first failure is returned.
    fn send(&self, kind: NoticeKind, notice: &Notice) -> SorterResult<()> {
        let mut first_error = None;
        for message in compose(&kind, notice, self.admin_email(), Utc::now()) {
            if let Err(e) = self.deliver(&message) {
                warn!(to = %message.to, subject = %message.subject, "Message not delivered: {}", e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl<T: Mailbox> Notifier for T {
    fn password_protected(&self, notice: &Notice) -> SorterResult<()> {
        self.send(NoticeKind::PasswordProtected, notice)
    }

    fn needs_attention(&self, notice: &Notice) -> SorterResult<()> {
        self.send(NoticeKind::NeedsAttention, notice)
    }

    fn processing_complete(&self, notice: &Notice) -> SorterResult<()> {
        self.send(NoticeKind::ProcessingComplete, notice)
    }

    fn processing_failed(&self, notice: &Notice, error: &str) -> SorterResult<()> {
        self.send(NoticeKind::ProcessingFailed(error.to_string()), notice)
    }
}

/// Writes composed messages to the log instead of sending them.
pub struct LogNotifier {
    admin_email: Option<String>,
}

impl LogNotifier {
    pub fn new(admin_email: Option<String>) -> Self {
        Self { admin_email }
    }
}

impl Mailbox for LogNotifier {
    fn admin_email(&self) -> Option<&str> {
        self.admin_email.as_deref()
    }

    fn deliver(&self, message: &EmailMessage) -> SorterResult<()> {
        info!(to = %message.to, subject = %message.subject, "Notification composed");
        Ok(())
    }
}

/// Drops every message as a JSON file into an outbox directory for an
/// external mailer to pick up.
pub struct OutboxNotifier {
    dir: PathBuf,
    admin_email: Option<String>,
}

impl OutboxNotifier {
    pub fn new(dir: impl Into<PathBuf>, admin_email: Option<String>) -> Self {
        Self {
            dir: dir.into(),
            admin_email,
        }
    }
}

impl Mailbox for OutboxNotifier {
    fn admin_email(&self) -> Option<&str> {
        self.admin_email.as_deref()
    }

    fn deliver(&self, message: &EmailMessage) -> SorterResult<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| SorterError::Notification(format!("outbox unavailable: {}", e)))?;

        let path = self.dir.join(format!(
            "{}_{}.json",
            message.created_at.format("%Y%m%dT%H%M%S"),
            Uuid::new_v4()
        ));
        let payload = serde_json::to_vec_pretty(message)?;
        fs::write(&path, payload)
            .map_err(|e| SorterError::Notification(format!("outbox write failed: {}", e)))?;

        info!(to = %message.to, path = %path.display(), "Notification queued");
        Ok(())
    }
}

/// Discards every message.
pub struct NoopNotifier;

impl Mailbox for NoopNotifier {
    fn admin_email(&self) -> Option<&str> {
        None
    }

    fn deliver(&self, _message: &EmailMessage) -> SorterResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn notice(outcome: Outcome) -> Notice {
        Notice {
            outcome,
            contact: ClientContact::new("jane@example.com"),
            original_filename: "scan.pdf".to_string(),
            new_filename: None,
            doc_type: None,
            client_name: Some("JANE DOE".to_string()),
        }
    }

    #[test]
    fn test_greeting_name_fallbacks() {
        assert_eq!(notice(Outcome::NeedsReview).greeting_name(), "Client");
        assert_eq!(notice(Outcome::Processed(DocumentType::Rdl)).greeting_name(), "JANE DOE");

        let mut named = notice(Outcome::Unwanted);
        named.contact = named.contact.with_name("Jane");
        assert_eq!(named.greeting_name(), "Jane");
    }

    #[test]
    fn test_outbox_writes_one_file_per_message() {
        let temp_dir = TempDir::new().unwrap();
        let outbox = temp_dir.path().join("outbox");
        let notifier = OutboxNotifier::new(&outbox, Some("ops@example.com".to_string()));

        assert!(dispatch(&notifier, &notice(Outcome::PasswordProtected)));
        assert!(dispatch(&notifier, &notice(Outcome::NeedsReview)));

        let mut recipients: Vec<String> = fs::read_dir(&outbox)
            .unwrap()
            .map(|entry| {
                let data = fs::read(entry.unwrap().path()).unwrap();
                serde_json::from_slice::<EmailMessage>(&data).unwrap().to
            })
            .collect();
        recipients.sort();
        assert_eq!(recipients, vec!["jane@example.com", "jane@example.com", "ops@example.com"]);
    }

    #[test]
    fn test_outbox_failure_is_reported_not_raised() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("not-a-dir");
        fs::write(&blocker, b"file in the way").unwrap();
        let notifier = OutboxNotifier::new(&blocker, None);

        assert!(!dispatch(&notifier, &notice(Outcome::Processed(DocumentType::Rcs))));
        assert!(!dispatch_failure(&notifier, &notice(Outcome::NeedsReview), "disk full"));
    }

    /// Refuses one recipient and records everything else.
    struct RefusingMailbox {
        refused: &'static str,
        delivered: std::sync::Mutex<Vec<String>>,
    }

    impl Mailbox for RefusingMailbox {
        fn admin_email(&self) -> Option<&str> {
            Some("ops@example.com")
        }

        fn deliver(&self, message: &EmailMessage) -> SorterResult<()> {
            if message.to == self.refused {
                return Err(SorterError::Notification("mailbox full".to_string()));
            }
            self.delivered.lock().unwrap().push(message.to.clone());
            Ok(())
        }
    }

    #[test]
    fn test_admin_alert_sent_when_client_delivery_fails() {
        let mailbox = RefusingMailbox {
            refused: "jane@example.com",
            delivered: Default::default(),
        };

        assert!(!dispatch(&mailbox, &notice(Outcome::PasswordProtected)));
        assert!(!dispatch_failure(&mailbox, &notice(Outcome::NeedsReview), "disk full"));

        let delivered = mailbox.delivered.lock().unwrap().clone();
        assert_eq!(delivered, vec!["ops@example.com", "ops@example.com"]);
    }

    #[test]
    fn test_transport_shares_admin_address() {
        let temp_dir = TempDir::new().unwrap();
        let config = NotifyConfig {
            mode: NotifyMode::Outbox,
            admin_email: Some("ops@example.com".to_string()),
            outbox_dir: temp_dir.path().join("outbox"),
        };

        let (notifier, mailbox) = transport_from_config(&config);
        assert_eq!(mailbox.admin_email(), Some("ops@example.com"));
        assert!(dispatch(notifier.as_ref(), &notice(Outcome::Unwanted)));
        assert_eq!(fs::read_dir(temp_dir.path().join("outbox")).unwrap().count(), 1);
    }

    #[test]
    fn test_log_and_noop_always_deliver() {
        assert!(dispatch(&LogNotifier::new(None), &notice(Outcome::Unwanted)));
        assert!(dispatch(&NoopNotifier, &notice(Outcome::UnsupportedFormat)));
    }
}
