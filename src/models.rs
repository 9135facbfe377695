use std::sync::Arc;

use crate::config::Config;
use crate::notify::Mailbox;
use crate::pipeline::{BatchReport, Pipeline, ProcessReport};
use crate::types::Outcome;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub pipeline: Arc<Pipeline>,
    /// Transport for ad-hoc messages from the admin dashboard.
    pub mailbox: Arc<dyn Mailbox>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub output_dir: String,
}

/// Body of `POST /api/process-document`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ProcessResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Outcome>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ProcessReport>,
}

impl ProcessResponse {
    pub fn processed(report: ProcessReport) -> Self {
        Self {
            success: true,
            result: Some(report.outcome),
            message: "Document processed successfully".to_string(),
            error: None,
            report: Some(report),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            message: "Document processing failed".to_string(),
            error: Some(error.into()),
            report: None,
        }
    }
}

/// Body of `POST /api/process-all`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BatchResponse {
    pub success: bool,
    pub summary: std::collections::BTreeMap<String, usize>,
    pub report: BatchReport,
}

/// Body of `POST /api/send-email`. Fields are optional so a missing one is
/// reported as a 400 rather than a JSON rejection.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct SendEmailRequest {
    pub recipient: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct EmailResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EmailResponse {
    pub fn sent(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: "Failed to send email".to_string(),
            error: Some(error.into()),
        }
    }
}
