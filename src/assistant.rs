//! Assistant chat passthrough.
//!
//! Thin client for the optional assistant backend: a single chat endpoint
//! plus a health probe. Each message carries a typed context block
//! describing the client's current state so the assistant can answer
//! questions about tracked files and recent activity.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::AssistantConfig;
use crate::error::RemoteError;
use crate::health::HealthProbe;
use crate::remote::ProbeOutcome;

/// Client-side state snapshot sent with every chat message.
#[derive(Debug, Clone, Serialize)]
pub struct ChatContext {
    pub application: &'static str,
    pub version: &'static str,
    pub tracked_files: usize,
    /// Most recent activity titles, oldest first.
    pub recent_activity: Vec<String>,
}

impl ChatContext {
    pub fn new(tracked_files: usize, recent_activity: Vec<String>) -> Self {
        Self {
            application: "stowage",
            version: env!("CARGO_PKG_VERSION"),
            tracked_files,
            recent_activity,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    context: &'a ChatContext,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    reply: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct HealthResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: Option<String>,
}

pub struct AssistantClient {
    base_url: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl AssistantClient {
    pub fn new(config: &AssistantConfig) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| RemoteError::Unreachable(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout_secs: config.request_timeout_secs,
            client,
        })
    }

    /// Send a chat message and return the assistant's reply.
    ///
    /// A well-formed response with `success = false` is surfaced as
    /// `Rejected` carrying the backend's own error text.
    pub async fn send(
        &self,
        message: &str,
        context: &ChatContext,
    ) -> Result<String, RemoteError> {
        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&ChatRequest { message, context })
            .send()
            .await
            .map_err(|e| RemoteError::classify(e, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| status.to_string());
            return Err(RemoteError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::classify(e, self.timeout_secs))?;
        if parsed.success {
            Ok(parsed.reply.unwrap_or_default())
        } else {
            Err(RemoteError::Rejected {
                status: status.as_u16(),
                message: parsed
                    .error
                    .unwrap_or_else(|| "assistant returned no reply".to_string()),
            })
        }
    }

    pub async fn health(&self) -> Result<ProbeOutcome, RemoteError> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map_err(|e| RemoteError::classify(e, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| status.to_string());
            return Err(RemoteError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: HealthResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::classify(e, self.timeout_secs))?;
        if parsed.status.is_empty() || parsed.status == "ok" || parsed.status == "healthy" {
            Ok(ProbeOutcome::Healthy)
        } else {
            Ok(ProbeOutcome::ServerError(
                parsed.message.unwrap_or(parsed.status),
            ))
        }
    }
}

#[async_trait]
impl HealthProbe for AssistantClient {
    fn endpoint(&self) -> &str {
        "assistant"
    }

    async fn probe(&self) -> Result<ProbeOutcome, RemoteError> {
        self.health().await
    }
}

/// Canned starter questions shown before the first exchange.
pub fn suggested_questions() -> &'static [&'static str] {
    &[
        "What files have I uploaded recently?",
        "How much space are my uploads using?",
        "Were there any failed operations today?",
        "Which of my files are duplicates?",
    ]
}
