//! HTTP and process gateways implementing the `speech_ai` provider traits.

use log::*;
use reqwest::{Response, StatusCode};

pub mod cloud_speech;
pub mod media;
pub mod ml_service;
pub mod object_storage;

/// Maps a failed `send()` to a transient provider error.
pub(crate) fn send_error(context: &str, err: reqwest::Error) -> speech_ai::Error {
    warn!("{context}: {err:?}");
    if err.is_timeout() {
        speech_ai::Error::Timeout(format!("{context}: {err}"))
    } else {
        speech_ai::Error::Network(format!("{context}: {err}"))
    }
}

/// Turns a non-success response into a provider error, consuming the body for context.
pub(crate) async fn status_error(context: &str, response: Response) -> speech_ai::Error {
    let status = response.status();
    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());
    let body = response.text().await.unwrap_or_default();
    error!("{context}: status {status}, body: {body}");

    let message = format!("{context}: status {}, body: {body}", status.as_u16());
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            speech_ai::Error::Authentication(message)
        }
        StatusCode::NOT_FOUND => speech_ai::Error::NotFound(message),
        StatusCode::TOO_MANY_REQUESTS => speech_ai::Error::RateLimited {
            retry_after_seconds: retry_after.unwrap_or(1),
        },
        _ => speech_ai::Error::Provider(message),
    }
}

/// Reads a local file that is about to be sent upstream.
pub(crate) async fn read_audio(path: &std::path::Path) -> Result<Vec<u8>, speech_ai::Error> {
    tokio::fs::read(path).await.map_err(|e| {
        warn!("Failed to read audio file {}: {e}", path.display());
        speech_ai::Error::Media(format!("read {}: {e}", path.display()))
    })
}
