use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, Response, StatusCode},
    response::IntoResponse,
    Json,
};
use futures::TryStreamExt;
use shardstore_core::{AppError, FileRecord};
use shardstore_services::FileUpload;
use std::sync::Arc;
use tokio_util::io::{ReaderStream, StreamReader};

/// Declared body length of a request, `None` when the header is absent
fn declared_length(headers: &HeaderMap) -> Result<Option<u64>, AppError> {
    let Some(value) = headers.get(header::CONTENT_LENGTH) else {
        return Ok(None);
    };

    value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Some)
        .ok_or_else(|| AppError::InvalidInput("Content-Length is not a valid number".to_string()))
}

/// Store the request body under `name`
///
/// The body is streamed straight into the placement service; `Content-Length` is
/// required because parts are sized before the first byte is read.
#[tracing::instrument(skip(state, headers, body), fields(file = %name))]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Body,
) -> Result<axum::response::Response, HttpAppError> {
    let Some(content_length) = declared_length(&headers)? else {
        return Ok((
            StatusCode::LENGTH_REQUIRED,
            Json(ErrorResponse::new(
                "Content-Length header is required",
                "LENGTH_REQUIRED",
            )),
        )
            .into_response());
    };

    let stream = body.into_data_stream().map_err(std::io::Error::other);
    let upload = FileUpload::new(name, content_length, StreamReader::new(stream));

    let cancel = state.shutdown.child_token();
    let meta = state.files.put_file(upload, &cancel).await?;

    Ok((StatusCode::CREATED, Json(meta)).into_response())
}

/// Stream a stored file back to the client
#[tracing::instrument(skip(state), fields(file = %name))]
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let cancel = state.shutdown.child_token();
    let download = state.files.get_file(&name, &cancel).await?;

    tracing::debug!(
        file = %name,
        size_bytes = download.meta.content_length,
        parts = download.meta.parts.len(),
        "Streaming file from backends"
    );

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, download.meta.content_length)
        .body(Body::from_stream(ReaderStream::new(download.body)))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))?;

    Ok(response)
}

/// Metadata record of a stored file
#[tracing::instrument(skip(state), fields(file = %name))]
pub async fn file_metadata(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<FileRecord>, HttpAppError> {
    Ok(Json(state.files.stat(&name).await?))
}

/// Delete a stored file and its parts
#[tracing::instrument(skip(state), fields(file = %name))]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<StatusCode, HttpAppError> {
    state.files.delete_file(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}
