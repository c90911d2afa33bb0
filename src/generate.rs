//! Generative-text upstream client
//!
//! The authoring tool speaks the chat-completions shape; the upstream expects
//! the responses shape. [`to_responses_payload`] rewrites the two fields that
//! differ and the client forwards the result with the configured key. The
//! upstream status and body are handed back untouched.

use std::time::Duration;

use axum::body::Bytes;
use axum::http::StatusCode;
use reqwest::Client;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

/// Upstream generations can be slow.
pub const GENERATE_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("generative text upstream is not configured")]
    NotConfigured,
    #[error("request body must be a JSON object")]
    NotAnObject,
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
}

/// Raw upstream answer.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

#[derive(Clone)]
pub struct TextGenerator {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl TextGenerator {
    pub fn new(url: &str, api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(GENERATE_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            url: url.to_string(),
            api_key,
        }
    }

    pub async fn forward(&self, payload: Value) -> Result<UpstreamResponse, GenerateError> {
        let api_key = self.api_key.as_deref().ok_or(GenerateError::NotConfigured)?;
        let payload = to_responses_payload(payload)?;

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;

        // Same numeric code, re-typed for axum.
        let status = StatusCode::from_u16(response.status().as_u16())
            .unwrap_or(StatusCode::BAD_GATEWAY);
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?;

        if status.is_success() {
            info!("Generative upstream answered {} ({} bytes)", status, body.len());
        } else {
            warn!("Generative upstream answered {}", status);
        }
        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}

/// Rewrite a chat-style payload into the responses shape.
///
/// `messages` becomes `input` unless `input` is already present;
/// `response_format` moves under `text.format`.
pub fn to_responses_payload(payload: Value) -> Result<Value, GenerateError> {
    let Value::Object(mut body) = payload else {
        return Err(GenerateError::NotAnObject);
    };

    if !body.contains_key("input") {
        if let Some(messages) = body.remove("messages") {
            body.insert("input".to_string(), messages);
        }
    }

    if let Some(format) = body.remove("response_format") {
        let text = body
            .entry("text")
            .or_insert_with(|| Value::Object(Map::new()));
        match text {
            Value::Object(text) => {
                text.insert("format".to_string(), format);
            }
            other => {
                let mut replacement = Map::new();
                replacement.insert("format".to_string(), format);
                *other = Value::Object(replacement);
            }
        }
    }

    Ok(Value::Object(body))
}
