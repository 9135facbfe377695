//! Document intake endpoints
//!
//! `POST /api/process-document` takes a multipart upload, stores it in a
//! per-request scratch directory, runs it through the pipeline and removes
//! the scratch copy again. The filed copy lives under the output tree.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use std::path::Path;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::{AppState, BatchResponse, ProcessResponse};
use crate::types::ClientContact;

/// Largest accepted request body.
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/process-document", post(process_document))
        .route("/api/process-all", post(process_all))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

struct Upload {
    file_name: String,
    data: Vec<u8>,
}

/// Last path component of a client-supplied name, or `upload` when nothing usable remains.
fn safe_file_name(raw: &str) -> String {
    let normalized = raw.replace('\\', "/");
    Path::new(&normalized)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.trim().is_empty() && n != "..")
        .unwrap_or_else(|| "upload".to_string())
}

fn rejected(status: StatusCode, error: impl Into<String>) -> axum::response::Response {
    (status, Json(ProcessResponse::failed(error))).into_response()
}

async fn process_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut upload: Option<Upload> = None;
    let mut client_email: Option<String> = None;
    let mut client_name: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!("Malformed multipart request: {}", e);
                return rejected(StatusCode::BAD_REQUEST, format!("Malformed upload: {}", e));
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "document" => {
                let file_name = safe_file_name(field.file_name().unwrap_or_default());
                match field.bytes().await {
                    Ok(data) => {
                        upload = Some(Upload {
                            file_name,
                            data: data.to_vec(),
                        })
                    }
                    Err(e) => {
                        return rejected(StatusCode::BAD_REQUEST, format!("Could not read document: {}", e))
                    }
                }
            }
            "clientEmail" => client_email = field.text().await.ok(),
            "clientName" => client_name = field.text().await.ok(),
            _ => {}
        }
    }

    let Some(upload) = upload else {
        return rejected(StatusCode::BAD_REQUEST, "No document provided");
    };

    let contact = ClientContact::from_parts(client_email, client_name);
    info!(
        file = %upload.file_name,
        bytes = upload.data.len(),
        notify = contact.is_some(),
        "Document upload received"
    );

    let scratch = state.config.sorter.upload_dir.join(Uuid::new_v4().to_string());
    let path = scratch.join(&upload.file_name);

    let outcome = match store_upload(&scratch, &path, &upload.data).await {
        Ok(()) => {
            let pipeline = state.pipeline.clone();
            let path = path.clone();
            tokio::task::spawn_blocking(move || pipeline.process_file(&path, contact.as_ref()))
                .await
                .map_err(|e| format!("Processing task failed: {}", e))
                .and_then(|result| result.map_err(|e| e.to_string()))
        }
        Err(e) => Err(format!("Could not store upload: {}", e)),
    };

    if let Err(e) = tokio::fs::remove_dir_all(&scratch).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(dir = %scratch.display(), "Could not remove upload scratch directory: {}", e);
        }
    }

    match outcome {
        Ok(report) => (StatusCode::OK, Json(ProcessResponse::processed(report))).into_response(),
        Err(e) => {
            error!(file = %upload.file_name, "Document processing failed: {}", e);
            rejected(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
    }
}

async fn store_upload(scratch: &Path, path: &Path, data: &[u8]) -> std::io::Result<()> {
    tokio::fs::create_dir_all(scratch).await?;
    tokio::fs::write(path, data).await
}

/// Run the whole configured input directory through the pipeline.
async fn process_all(State(state): State<AppState>) -> impl IntoResponse {
    let pipeline = state.pipeline.clone();
    let input_dir = state.config.sorter.input_dir.clone();
    info!(input = %input_dir.display(), "Batch run requested");

    let result = tokio::task::spawn_blocking(move || pipeline.process_all(&input_dir))
        .await
        .map_err(|e| format!("Batch task failed: {}", e))
        .and_then(|result| result.map_err(|e| e.to_string()));

    match result {
        Ok(report) => (
            StatusCode::OK,
            Json(BatchResponse {
                success: report.failures() == 0,
                summary: report.counts(),
                report,
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Batch run failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "success": false,
                    "error": e,
                    "message": "Batch processing failed"
                })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::notify::NoopNotifier;
    use crate::pipeline::{OutputLayout, Pipeline};
    use crate::test_support::{write_fixture, FixtureTextSource, RCS_FORM, RDL_LETTER};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const BOUNDARY: &str = "sorter-test-boundary";

    fn test_state(temp_dir: &TempDir) -> AppState {
        let root = temp_dir.path().to_path_buf();
        let config = Config::from_lookup(|key| match key {
            "INPUT_DIR" => Some(root.join("uploads").display().to_string()),
            "OUTPUT_DIR" => Some(root.join("processed").display().to_string()),
            "UPLOAD_TMP_DIR" => Some(root.join("scratch").display().to_string()),
            "NOTIFY_MODE" => Some("none".to_string()),
            _ => None,
        })
        .unwrap();

        let pipeline = Pipeline::new(
            Arc::new(FixtureTextSource::default()),
            Arc::new(NoopNotifier),
            OutputLayout::new(&config.sorter.output_dir),
        );
        pipeline.setup().unwrap();

        AppState {
            config,
            pipeline: Arc::new(pipeline),
            mailbox: Arc::new(NoopNotifier),
        }
    }

    fn multipart_body(parts: &[(&str, Option<&str>, &str)]) -> String {
        let mut body = String::new();
        for (name, file_name, value) in parts {
            body.push_str(&format!("--{}\r\n", BOUNDARY));
            match file_name {
                Some(file_name) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                    name, file_name
                )),
                None => body.push_str(&format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)),
            }
            body.push_str(value);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{}--\r\n", BOUNDARY));
        body
    }

    fn upload_request(body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/process-document")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_safe_file_name_strips_directories() {
        assert_eq!(safe_file_name("letter.pdf"), "letter.pdf");
        assert_eq!(safe_file_name("../../etc/passwd"), "passwd");
        assert_eq!(safe_file_name("C:\\scans\\form.png"), "form.png");
        assert_eq!(safe_file_name(""), "upload");
        assert_eq!(safe_file_name(".."), "upload");
    }

    #[tokio::test]
    async fn test_upload_is_processed_and_scratch_removed() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir);
        let app = router(state.clone());

        let body = multipart_body(&[
            ("document", Some("letter.pdf"), RDL_LETTER),
            ("clientEmail", None, "jane@example.com"),
            ("clientName", None, "Jane"),
        ]);
        let response = app.oneshot(upload_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["result"], "PROCESSED_RDL");
        assert_eq!(json["report"]["new_filename"], "ARIANA_ATKINS_RDL.pdf");

        let filed = state.config.sorter.output_dir.join("RDL").join("ARIANA_ATKINS_RDL.pdf");
        assert!(filed.is_file());

        let leftovers = std::fs::read_dir(&state.config.sorter.upload_dir).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_missing_document_is_bad_request() {
        let temp_dir = TempDir::new().unwrap();
        let app = router(test_state(&temp_dir));

        let body = multipart_body(&[("clientEmail", None, "jane@example.com")]);
        let response = app.oneshot(upload_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "No document provided");
    }

    #[tokio::test]
    async fn test_unsupported_upload_reports_outcome() {
        let temp_dir = TempDir::new().unwrap();
        let app = router(test_state(&temp_dir));

        let body = multipart_body(&[("document", Some("notes.docx"), "plain notes")]);
        let response = app.oneshot(upload_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["result"], "UNSUPPORTED_FORMAT");
        assert!(json["report"]["new_filename"].is_null());
    }

    #[tokio::test]
    async fn test_filing_failure_is_server_error() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir);
        std::fs::remove_dir_all(state.pipeline.layout().dir(crate::pipeline::Destination::Review)).unwrap();
        let app = router(state);

        let body = multipart_body(&[("document", Some("memo.pdf"), "nothing useful")]);
        let response = app.oneshot(upload_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert_eq!(json["success"], false);
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn test_process_all_summarizes_input_dir() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir);
        let input = state.config.sorter.input_dir.clone();
        std::fs::create_dir_all(&input).unwrap();
        write_fixture(&input, "a.pdf", RDL_LETTER);
        write_fixture(&input, "b.png", RCS_FORM);
        let app = router(state);

        let request = Request::builder()
            .method("POST")
            .uri("/api/process-all")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["summary"]["PROCESSED_RDL"], 1);
        assert_eq!(json["summary"]["PROCESSED_RCS"], 1);
        assert_eq!(json["report"]["results"]["a.pdf"]["outcome"], "PROCESSED_RDL");
    }

    #[tokio::test]
    async fn test_process_all_without_input_dir_fails() {
        let temp_dir = TempDir::new().unwrap();
        let app = router(test_state(&temp_dir));

        let request = Request::builder()
            .method("POST")
            .uri("/api/process-all")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
