use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;

use crate::utils::AdapterError;

/// Build the shared HTTP client used by every adapter
pub fn build_client(timeout_secs: u64) -> Result<Client, AdapterError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

/// Turn a non-success response into an [`AdapterError`], keeping the
/// provider's own error message when it sends one.
pub async fn ensure_success(response: Response) -> Result<Response, AdapterError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(AdapterError::from_status(status.as_u16(), error_message(&body)))
}

/// Extract `error.message` from the usual provider error envelope
pub fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct Envelope {
        error: ErrorBody,
    }

    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
    }

    serde_json::from_str::<Envelope>(body)
        .ok()
        .and_then(|envelope| envelope.error.message)
        .unwrap_or_else(|| body.trim().to_string())
}
