//! Status and transport error mapping shared by the HTTP adapters.
//!
//! Adapters only special-case the statuses that carry meaning for them
//! (e.g. 404 on a read). Everything else goes through [`ensure_success`].

use reqwest::{Response, StatusCode};
use seolink_core::error::{StorageError, StorageResult};
use serde::de::DeserializeOwned;
use tracing::warn;

const MAX_ERROR_BODY: usize = 512;

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> StorageError {
    let message = err.to_string();
    if err.is_timeout() {
        StorageError::Timeout(message)
    } else if err.is_decode() {
        StorageError::InvalidData(message)
    } else if err.is_builder() {
        StorageError::Operation(message)
    } else {
        StorageError::Unavailable(message)
    }
}

/// Maps a non-success status and its body to a storage error.
pub(crate) fn status_error(status: StatusCode, body: &str) -> StorageError {
    let body = truncate(body);
    let message = format!("HTTP {}: {}", status.as_u16(), body);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            StorageError::Unavailable(format!("credentials rejected ({message})"))
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => StorageError::Timeout(message),
        StatusCode::CONFLICT => StorageError::Conflict(message),
        StatusCode::TOO_MANY_REQUESTS => StorageError::Unavailable(message),
        s if s.is_server_error() => StorageError::Unavailable(message),
        _ => StorageError::Query(message),
    }
}

/// Passes successful responses through and turns the rest into errors.
pub(crate) async fn ensure_success(response: Response) -> StorageResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().clone();
    let body = response.text().await.unwrap_or_default();
    warn!(%url, status = status.as_u16(), "storage request failed");
    Err(status_error(status, &body))
}

pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> StorageResult<T> {
    let bytes = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| StorageError::InvalidData(format!("unexpected response body: {e}")))
}

fn truncate(body: &str) -> &str {
    if body.len() <= MAX_ERROR_BODY {
        return body;
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
