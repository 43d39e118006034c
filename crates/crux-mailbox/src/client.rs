//! The mailbox RPC client.
//!
//! One logical request/response exchange per [`MailboxClient::call`]. The
//! server may answer with a buffered JSON envelope or with a
//! `text/event-stream`; both are normalized into the same envelope type.
//! No retry logic lives here — a failed call is surfaced to the caller
//! with a distinct error kind and the (truncated) raw payload.

use futures::StreamExt;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crux_core::thread::{MailMessage, NewMessage};

use crate::config::MailboxConfig;
use crate::envelope::{RpcRequest, RpcResponse};
use crate::error::{MailboxError, Result};
use crate::sse::EventStreamScanner;

/// Client for the mailbox RPC endpoint.
#[derive(Debug, Clone)]
pub struct MailboxClient {
    http: Client,
    config: MailboxConfig,
}

impl MailboxClient {
    /// Creates a client over the given configuration.
    pub fn new(config: MailboxConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    /// Creates a client resolved from the environment.
    pub fn from_env() -> Self {
        Self::new(MailboxConfig::from_env())
    }

    pub fn config(&self) -> &MailboxConfig {
        &self.config
    }

    /// Sends one request and returns the envelope's `result`.
    ///
    /// Accepts either a buffered JSON envelope or an event stream whose
    /// first well-formed envelope wins. The connection is scoped to this
    /// call: once a terminal envelope is parsed the response stream is
    /// dropped, actively ending the read even if more data remains.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let request = RpcRequest::new(method, params);
        let endpoint = self.config.endpoint();
        debug!(method, id = %request.id, %endpoint, "mailbox call");

        let mut builder = self
            .http
            .post(&endpoint)
            .header("Accept", "application/json, text/event-stream")
            .json(&request);
        if let Some(token) = &self.config.bearer_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| MailboxError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            warn!(method, status = status.as_u16(), "mailbox call rejected");
            return Err(MailboxError::status(status.as_u16(), &body));
        }

        let is_event_stream = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("text/event-stream"));

        if is_event_stream {
            self.scan_event_stream(response).await
        } else {
            let body = response
                .text()
                .await
                .map_err(|err| MailboxError::Network(err.to_string()))?;
            parse_envelope(&body)
        }
    }

    /// Reads the stream incrementally and returns the first well-formed
    /// envelope. Dropping out of this function cancels the remaining
    /// body read.
    async fn scan_event_stream(&self, response: reqwest::Response) -> Result<Value> {
        let mut scanner = EventStreamScanner::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(bytes) => bytes,
                Err(err) => {
                    // The body stream died mid-read; fall back to
                    // scanning whatever text already accumulated.
                    warn!(error = %err, "event stream read failed, scanning accumulated text");
                    break;
                }
            };
            for event in scanner.push(&String::from_utf8_lossy(&chunk)) {
                if let Some(outcome) = try_envelope(&event)? {
                    return Ok(outcome);
                }
            }
        }

        // Flush-on-EOF: a final event lacking its trailing newline.
        if let Some(event) = scanner.finish() {
            if let Some(outcome) = try_envelope(&event)? {
                return Ok(outcome);
            }
        }

        Err(MailboxError::stream_exhausted(&scanner.residue()))
    }

    /// Fetches every message in a thread.
    pub async fn fetch_thread(&self, thread_id: &str) -> Result<Vec<MailMessage>> {
        let result = self
            .call("fetch_thread", serde_json::json!({ "threadId": thread_id }))
            .await?;
        decode("thread message list", result)
    }

    /// Posts a message and returns the stored record.
    pub async fn send_message(&self, draft: &NewMessage) -> Result<MailMessage> {
        let result = self.call("send_message", to_params(draft)?).await?;
        decode("stored message", result)
    }
}

/// Parses one buffered body into an envelope outcome.
fn parse_envelope(body: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(body)
        .map_err(|err| MailboxError::invalid_json(err.to_string(), body))?;
    if !value.is_object() {
        return Err(MailboxError::not_an_object(body));
    }
    let envelope: RpcResponse = serde_json::from_value(value)
        .map_err(|err| MailboxError::invalid_json(err.to_string(), body))?;
    if let Some(error) = envelope.error {
        return Err(MailboxError::Remote {
            message: error.message,
        });
    }
    envelope
        .result
        .ok_or_else(|| MailboxError::invalid_json("envelope missing result/error", body))
}

/// Attempts to interpret one stream event as a terminal envelope.
///
/// `[DONE]` markers and events that are not well-formed envelopes are
/// skipped (`Ok(None)`); a well-formed envelope yields the result or the
/// remote error.
fn try_envelope(event: &str) -> Result<Option<Value>> {
    let trimmed = event.trim();
    if trimmed.is_empty() || trimmed == "[DONE]" {
        return Ok(None);
    }
    let Ok(value) = serde_json::from_str::<Value>(trimmed) else {
        return Ok(None);
    };
    if !value.is_object() {
        return Ok(None);
    }
    let Ok(envelope) = serde_json::from_value::<RpcResponse>(value) else {
        return Ok(None);
    };
    if !envelope.is_well_formed() {
        return Ok(None);
    }
    if let Some(error) = envelope.error {
        return Err(MailboxError::Remote {
            message: error.message,
        });
    }
    Ok(envelope.result)
}

fn decode<T: DeserializeOwned>(what: &str, result: Value) -> Result<T> {
    let raw = result.to_string();
    serde_json::from_value(result)
        .map_err(|err| MailboxError::invalid_json(format!("cannot decode {what}: {err}"), &raw))
}

fn to_params<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value)
        .map_err(|err| MailboxError::invalid_json(format!("cannot encode params: {err}"), ""))
}
