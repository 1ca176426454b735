use std::io;

use axum::{
    body::Body,
    extract::{
        multipart::MultipartRejection, rejection::FormRejection, Multipart, Path, State,
    },
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use futures::TryStreamExt;
use serde::Deserialize;
use tokio_util::io::{ReaderStream, StreamReader};
use tracing::{debug, info, warn};

use crate::error::ShareError;
use crate::page;
use crate::repository::UploadSource;
use crate::validate;
use crate::AppState;

/// Form body of `POST /clipboard`
#[derive(Debug, Deserialize)]
pub struct ClipboardForm {
    pub clipboard: Option<String>,
}

const UPLOAD_FIELD: &str = "file";

// ============================================================================
// Helper functions
// ============================================================================

fn ensure_acceptable(name: &str) -> Result<(), ShareError> {
    if validate::is_acceptable(name) {
        Ok(())
    } else {
        Err(ShareError::InvalidName)
    }
}

/// Build an inline Content-Disposition value that is always a valid header.
fn content_disposition(name: &str) -> String {
    let safe: String = name
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| if c == '"' { '\'' } else { c })
        .collect();
    format!("inline; filename=\"{}\"", safe)
}

fn invalid_multipart(err: impl std::error::Error + Send + Sync + 'static) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET / - Landing page with upload and clipboard forms
pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(page::index(
        &state.clipboard.get(),
        state.config.poll_interval_ms,
    ))
}

/// GET /api/files - Names in the shared directory as a JSON array
pub async fn list_files(State(state): State<AppState>) -> Response {
    let names = state.repository.list().await;

    (
        [
            (header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
            (header::PRAGMA, "no-cache"),
            (header::EXPIRES, "0"),
        ],
        Json(names),
    )
        .into_response()
}

/// GET /files/{name} - Stream a file
///
/// The body is streamed, so file size does not affect memory use.
pub async fn download(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ShareError> {
    ensure_acceptable(&name)?;

    let (file, entry) = state.repository.read(&name).await?;
    debug!("Streaming file: {} ({} bytes)", entry.name, entry.size);

    let body = Body::from_stream(ReaderStream::new(file));

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, entry.content_type.to_string()),
            (header::CONTENT_LENGTH, entry.size.to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(&entry.name)),
        ],
        body,
    )
        .into_response())
}

/// POST /upload - Store the multipart `file` field under its own filename
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<StatusCode, ShareError> {
    let mut multipart = multipart.map_err(|rejection| {
        warn!("Upload without a multipart body: {}", rejection);
        ShareError::MissingParameter(UPLOAD_FIELD)
    })?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ShareError::Io(invalid_multipart(e)))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!("Skipping multipart field {:?}", field.name());
            continue;
        }

        let name = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Err(ShareError::MissingParameter(UPLOAD_FIELD)),
        };
        ensure_acceptable(&name)?;

        let reader = StreamReader::new(field.map_err(invalid_multipart));
        tokio::pin!(reader);
        let (staged, received) = state.repository.stage(&mut reader).await?;
        debug!("Received {} bytes for {}", received, name);

        state
            .repository
            .write(&name, UploadSource::Staged(staged))
            .await?;
        info!("File uploaded: {}", name);

        return Ok(StatusCode::NO_CONTENT);
    }

    Err(ShareError::MissingParameter(UPLOAD_FIELD))
}

/// POST /delete/{name} - Remove a file
pub async fn delete(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, ShareError> {
    ensure_acceptable(&name)?;
    state.repository.delete(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /clipboard - Current clipboard value as an HTML fragment
pub async fn get_clipboard(State(state): State<AppState>) -> Html<String> {
    Html(page::clipboard_fragment(&state.clipboard.get()))
}

/// POST /clipboard - Replace the clipboard value
pub async fn set_clipboard(
    State(state): State<AppState>,
    form: Result<Form<ClipboardForm>, FormRejection>,
) -> Result<Response, ShareError> {
    let text = form
        .ok()
        .and_then(|Form(form)| form.clipboard)
        .ok_or(ShareError::MissingParameter("clipboard"))?;

    let text = text.trim();
    if text.is_empty() {
        return Err(ShareError::EmptyValue("Clipboard text"));
    }

    state.clipboard.set(text.to_string());
    debug!("Clipboard set from client");

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "Clipboard updated successfully.",
    )
        .into_response())
}

/// Anything without a route
pub async fn not_found() -> ShareError {
    ShareError::Unrouted
}
