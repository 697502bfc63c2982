//! Shared request plumbing for the HTTP backends.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::provider::{ProviderError, ProviderResult};

/// Send a prepared request and decode a JSON body.
///
/// Non-success statuses become [`ProviderError::Api`] carrying the most
/// specific message the body offers.
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> ProviderResult<T> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Api {
            status: status.as_u16(),
            message: extract_error_message(&body, status),
        });
    }
    Ok(response.json::<T>().await?)
}

/// Pull `error.message` or a string `error` out of an error body, falling
/// back to the raw body text.
pub(crate) fn extract_error_message(body: &str, status: reqwest::StatusCode) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        match value.get("error") {
            Some(Value::String(message)) if !message.is_empty() => return message.clone(),
            Some(Value::Object(obj)) => {
                if let Some(Value::String(message)) = obj.get("message") {
                    if !message.is_empty() {
                        return message.clone();
                    }
                }
            }
            _ => {}
        }
    }
    let body = body.trim();
    if body.is_empty() {
        status.to_string()
    } else {
        body.to_string()
    }
}
