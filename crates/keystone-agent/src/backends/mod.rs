//! Concrete [`ModelClient`](crate::ModelClient) implementations.
//!
//! To add a provider: implement `ModelClient` in a new module here, add the
//! variant to `ModelProvider` in `config.rs` and wire it up in
//! `build_client()` in `client.rs`.

pub mod gemini;

use crate::client::ModelError;
use reqwest::StatusCode;

/// 408, 429 and any 5xx are worth retrying; every other failure status is not.
pub fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
}

/// Classify a non-success HTTP response.
pub fn classify_status(provider: &str, status: StatusCode, body: &str) -> ModelError {
    let message = format!("{provider} API error {status}: {}", truncate(body, 300));
    if is_transient_status(status) {
        ModelError::Transient(message)
    } else {
        ModelError::Permanent(message)
    }
}

/// Classify a transport-level failure from reqwest.
pub fn classify_transport(provider: &str, err: reqwest::Error) -> ModelError {
    if err.is_decode() {
        ModelError::InvalidPayload(format!("{provider}: {err}"))
    } else if err.is_builder() {
        ModelError::Permanent(format!("{provider}: {err}"))
    } else {
        ModelError::Transient(format!("{provider}: {err}"))
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
