//! Remote content store client.
//!
//! The [`RemoteStore`] trait is the seam between the client core and the
//! store backend: listing, upload, download, delete, and a lightweight
//! health probe. The HTTP implementation talks to the store's REST API with
//! `X-API-KEY` authentication; tests substitute a scripted implementation.
//!
//! Every method returns a classified [`RemoteError`] — callers never see raw
//! transport failures.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::config::RemoteConfig;
use crate::error::RemoteError;
use crate::health::HealthProbe;

/// One entry of the remote listing. Ephemeral — each fetch wholly replaces
/// the previous snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteEntry {
    #[serde(rename = "file_id")]
    pub remote_id: String,
    #[serde(rename = "file_name")]
    pub name: String,
    #[serde(rename = "file_size", default)]
    pub size: Option<u64>,
    #[serde(rename = "file_type", default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Outcome of a health probe that got a response at transport level.
///
/// `ServerError` means the endpoint answered but reported a server-side
/// problem in the body — distinct from a transport failure, which surfaces
/// as `Err(RemoteError)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Healthy,
    ServerError(String),
}

/// Operations the client needs from the remote content store.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch the authoritative listing of stored files.
    async fn list(&self) -> Result<Vec<RemoteEntry>, RemoteError>;

    /// Upload bytes under a display name; the uploader travels as separate
    /// metadata, not embedded in the transmitted name. Returns the assigned
    /// remote id.
    async fn upload(
        &self,
        bytes: Vec<u8>,
        name: &str,
        uploader: &str,
    ) -> Result<String, RemoteError>;

    /// Download the bytes of a stored file.
    async fn download(&self, remote_id: &str) -> Result<Vec<u8>, RemoteError>;

    /// Delete a stored file. Success means the deletion was acknowledged.
    async fn delete(&self, remote_id: &str) -> Result<(), RemoteError>;

    /// Lightweight probe of the store's health endpoint.
    async fn health(&self) -> Result<ProbeOutcome, RemoteError>;
}

/// HTTP implementation over the store's REST API.
pub struct HttpRemoteStore {
    base_url: String,
    api_key: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    files: Vec<RemoteEntry>,
}

#[derive(Deserialize)]
struct UploadResponse {
    file_id: String,
}

#[derive(Deserialize)]
struct HealthResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: Option<String>,
}

impl HttpRemoteStore {
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| RemoteError::Unreachable(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            timeout_secs: config.request_timeout_secs,
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn classify(&self, err: reqwest::Error) -> RemoteError {
        RemoteError::classify(err, self.timeout_secs)
    }

    /// Turn a non-success response into `Rejected` with the body verbatim.
    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| status.to_string());
        Err(RemoteError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn list(&self) -> Result<Vec<RemoteEntry>, RemoteError> {
        let response = self
            .client
            .get(self.url("/file/list"))
            .header("X-API-KEY", &self.api_key)
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        let response = self.check_status(response).await?;
        let parsed: ListResponse = response.json().await.map_err(|e| self.classify(e))?;
        Ok(parsed.files)
    }

    async fn upload(
        &self,
        bytes: Vec<u8>,
        name: &str,
        uploader: &str,
    ) -> Result<String, RemoteError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(name.to_string())
            .mime_str("application/octet-stream")
            .map_err(|e| self.classify(e))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("uploaded_by", uploader.to_string());

        let response = self
            .client
            .post(self.url("/file/upload"))
            .header("X-API-KEY", &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        let response = self.check_status(response).await?;
        let parsed: UploadResponse = response.json().await.map_err(|e| self.classify(e))?;
        Ok(parsed.file_id)
    }

    async fn download(&self, remote_id: &str) -> Result<Vec<u8>, RemoteError> {
        let response = self
            .client
            .get(self.url(&format!("/file/download/{}", remote_id)))
            .header("X-API-KEY", &self.api_key)
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        let response = self.check_status(response).await?;
        let bytes = response.bytes().await.map_err(|e| self.classify(e))?;
        Ok(bytes.to_vec())
    }

    async fn delete(&self, remote_id: &str) -> Result<(), RemoteError> {
        let response = self
            .client
            .delete(self.url(&format!("/file/delete/{}", remote_id)))
            .header("X-API-KEY", &self.api_key)
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        self.check_status(response).await?;
        Ok(())
    }

    async fn health(&self) -> Result<ProbeOutcome, RemoteError> {
        let response = self
            .client
            .get(self.url("/health"))
            .header("X-API-KEY", &self.api_key)
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        let response = self.check_status(response).await?;

        // A 2xx with a non-ok status in the body is a server-reported error
        // condition, not a transport failure.
        let parsed: HealthResponse = response.json().await.map_err(|e| self.classify(e))?;
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
impl HealthProbe for HttpRemoteStore {
    fn endpoint(&self) -> &str {
        "store"
    }

    async fn probe(&self) -> Result<ProbeOutcome, RemoteError> {
        self.health().await
    }
}

/// Format a byte count as a human-readable string.
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
