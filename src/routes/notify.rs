//! Admin dashboard email endpoints
//!
//! - `POST /api/test-email` - send a connectivity check to `ADMIN_EMAIL`
//! - `POST /api/send-email` - send `{recipient, subject, message}`

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use chrono::Utc;
use tracing::{error, info, warn};

use crate::models::{AppState, EmailResponse, SendEmailRequest};
use crate::notify::messages::{admin_test_message, EmailMessage};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/test-email", post(test_email))
        .route("/api/send-email", post(send_email))
        .with_state(state)
}

/// Hand `message` to the mailbox off the async runtime.
async fn deliver(state: &AppState, message: EmailMessage) -> axum::response::Response {
    let mailbox = state.mailbox.clone();
    let to = message.to.clone();

    let result = tokio::task::spawn_blocking(move || mailbox.deliver(&message))
        .await
        .map_err(|e| format!("Delivery task failed: {}", e))
        .and_then(|result| result.map_err(|e| e.to_string()));

    match result {
        Ok(()) => {
            info!(%to, "Email sent");
            (StatusCode::OK, Json(EmailResponse::sent(format!("Email sent to {}", to)))).into_response()
        }
        Err(e) => {
            error!(%to, "Email delivery failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(EmailResponse::failed(e))).into_response()
        }
    }
}

async fn test_email(State(state): State<AppState>) -> impl IntoResponse {
    let Some(admin) = state.mailbox.admin_email().map(str::to_string) else {
        warn!("Test email requested without ADMIN_EMAIL");
        return (
            StatusCode::BAD_REQUEST,
            Json(EmailResponse::failed("ADMIN_EMAIL is not configured")),
        )
            .into_response();
    };

    deliver(&state, admin_test_message(&admin, Utc::now())).await
}

async fn send_email(
    State(state): State<AppState>,
    Json(request): Json<SendEmailRequest>,
) -> impl IntoResponse {
    let field = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

    let (Some(recipient), Some(subject), Some(body)) = (
        field(request.recipient),
        field(request.subject),
        field(request.message),
    ) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(EmailResponse::failed("Missing required fields: recipient, subject, message")),
        )
            .into_response();
    };

    deliver(&state, EmailMessage::new(recipient.trim(), subject, body, Utc::now())).await
}
