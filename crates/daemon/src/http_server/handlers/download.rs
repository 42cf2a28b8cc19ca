use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use serde::Deserialize;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use common::token;

use crate::http_server::range::{self, RangeError};
use crate::service_config::Config;
use crate::ServiceState;

/// Streaming buffer size; memory per transfer is bounded by this, not by
/// file size.
const STREAM_BUF_SIZE: usize = 64 * 1024;

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    /// Capability token issued at share time
    pub token: Option<String>,
    /// Raw path, honored only when the server runs with open access
    pub path: Option<PathBuf>,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Extension(config): Extension<Config>,
    headers: HeaderMap,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, DownloadError> {
    let path = authorize(&state, &config, &query)?;
    serve_file(&path, &headers).await
}

/// Resolve the request to a trusted file path, or refuse.
///
/// Token verification is two-phase: the unverified payload selects which
/// secret to check against, and only the verified parse yields the path
/// that is allowed to touch the filesystem.
fn authorize(
    state: &ServiceState,
    config: &Config,
    query: &DownloadQuery,
) -> Result<PathBuf, DownloadError> {
    if let Some(token) = &query.token {
        let claimed = token::peek_path(token).map_err(|e| {
            tracing::warn!("rejecting unparseable token: {}", e);
            DownloadError::BadToken
        })?;

        let record = state.vault().get(&claimed).ok_or_else(|| {
            tracing::warn!(path = ?claimed, "token for a path that is not shared");
            DownloadError::NotShared
        })?;

        return token::verify(token, &record.secret).map_err(|e| {
            tracing::warn!(path = ?claimed, "token failed verification: {}", e);
            DownloadError::BadToken
        });
    }

    if config.open_access {
        return query.path.clone().ok_or(DownloadError::MissingPath);
    }

    Err(DownloadError::MissingToken)
}

/// Stream the bytes of a trusted path, honoring an optional `Range` header.
async fn serve_file(path: &Path, headers: &HeaderMap) -> Result<Response, DownloadError> {
    let meta = match tokio::fs::metadata(path).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(DownloadError::NotFound(path.to_path_buf()))
        }
        Err(e) => return Err(DownloadError::Io(e)),
    };
    if !meta.is_file() {
        return Err(DownloadError::NotFound(path.to_path_buf()));
    }
    let size = meta.len();

    let range = match headers.get(header::RANGE) {
        Some(value) => {
            let value = value
                .to_str()
                .map_err(|_| RangeError::Malformed("non-ascii range header".to_string()))?;
            Some(range::parse(value, size)?)
        }
        None => None,
    };

    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("download");

    let mut file = tokio::fs::File::open(path).await?;

    let builder = Response::builder()
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        );

    let response = match range {
        Some(range) => {
            file.seek(SeekFrom::Start(range.start)).await?;
            // take() bounds the stream to the range even if the file grows
            let reader = file.take(range.len());
            tracing::debug!(path = ?path, range.start, range.end, "serving byte range");
            builder
                .status(StatusCode::PARTIAL_CONTENT)
                .header(
                    header::CONTENT_RANGE,
                    format!("bytes {}-{}/{}", range.start, range.end, size),
                )
                .header(header::CONTENT_LENGTH, range.len())
                .body(Body::from_stream(ReaderStream::with_capacity(
                    reader,
                    STREAM_BUF_SIZE,
                )))?
        }
        None => {
            tracing::debug!(path = ?path, size, "serving full file");
            builder
                .status(StatusCode::OK)
                .header(header::CONTENT_LENGTH, size)
                .body(Body::from_stream(ReaderStream::with_capacity(
                    file,
                    STREAM_BUF_SIZE,
                )))?
        }
    };

    Ok(response)
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("no capability token supplied")]
    MissingToken,
    #[error("token is malformed or its signature does not match")]
    BadToken,
    #[error("no authorization record for the requested path")]
    NotShared,
    #[error("missing path parameter")]
    MissingPath,
    #[error(transparent)]
    Range(#[from] RangeError),
    #[error("not a shareable file: {0}")]
    NotFound(PathBuf),
    #[error("file i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("response construction failed: {0}")]
    Response(#[from] axum::http::Error),
}

impl IntoResponse for DownloadError {
    fn into_response(self) -> Response {
        match self {
            // authorization failures all look the same from outside
            DownloadError::MissingToken | DownloadError::BadToken | DownloadError::NotShared => {
                (StatusCode::UNAUTHORIZED, "unauthorized").into_response()
            }
            DownloadError::MissingPath => {
                (StatusCode::BAD_REQUEST, "missing path parameter").into_response()
            }
            DownloadError::Range(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
            DownloadError::NotFound(_) => {
                (StatusCode::NOT_FOUND, "file not found").into_response()
            }
            DownloadError::Io(e) => {
                tracing::error!("download i/o failure: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "i/o failure").into_response()
            }
            DownloadError::Response(e) => {
                tracing::error!("download response failure: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
            }
        }
    }
}
