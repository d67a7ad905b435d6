use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::AskError;

#[derive(Serialize)]
struct AskRequest<'a> {
    query: &'a str,
}

#[derive(Deserialize)]
struct AskResponse {
    answer: String,
}

/// HTTP client for a question-answering server's ask endpoint.
#[derive(Clone)]
pub struct AskClient {
    client: Client,
    endpoint: Url,
}

impl AskClient {
    pub fn new(base_url: &str, ask_path: &str, timeout: Option<Duration>) -> Result<Self, AskError> {
        let raw = format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            ask_path.trim_start_matches('/')
        );
        let endpoint = Url::parse(&raw).map_err(|e| AskError::InvalidEndpoint {
            url: raw.clone(),
            reason: e.to_string(),
        })?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Post `query` and return the server's answer text.
    pub async fn ask(&self, query: &str) -> Result<String, AskError> {
        debug!(endpoint = %self.endpoint, "sending ask request");

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .json(&AskRequest { query })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AskError::Status { status, body });
        }

        let body = response.text().await?;
        decode_answer(&body)
    }
}

/// Decode an ask response body.
///
/// The body is decoded exactly once. Some servers wrap the response object in a
/// JSON string; that string is then decoded as the response object.
pub fn decode_answer(body: &str) -> Result<String, AskError> {
    let response: AskResponse = match serde_json::from_str::<Value>(body)? {
        Value::String(inner) => serde_json::from_str(&inner)?,
        other => serde_json::from_value(other)?,
    };
    Ok(response.answer)
}
