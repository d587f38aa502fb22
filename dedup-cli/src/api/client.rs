//! HTTP client for the deduplication backend

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::backend::DedupBackend;
use super::error::ApiError;
use super::models::{
    ClearOutputsResponse, CrossSystemResponse, DeleteOutputResponse, ErrorBody, HealthReport,
    HealthStatus, ProcessedOutputs, ProcessingRequest, SingleFileRequest, SingleFileResponse,
};
use crate::config::ApiConfig;

/// reqwest-backed implementation of [`DedupBackend`]
#[derive(Debug, Clone)]
pub struct DedupClient {
    http: reqwest::Client,
    base_url: String,
}

impl DedupClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ApiError::Transport {
                url: config.base_url.clone(),
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build `{base}/api/{segments...}`, percent-encoding each segment
    pub fn endpoint(&self, segments: &[&str]) -> String {
        let mut url = format!("{}/api", self.base_url);
        for segment in segments {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response, ApiError> {
        debug!("{} {}", method, url);

        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| ApiError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        warn!("Backend returned {} for {}", status, url);
        Err(ApiError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            message: error_message(status, &text),
        })
    }

    async fn decode<T: DeserializeOwned>(
        url: &str,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let text = response.text().await.map_err(|e| ApiError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&text).map_err(|e| ApiError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, ApiError> {
        let response = self.send::<()>(Method::GET, &url, None).await?;
        Self::decode(&url, response).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: String,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.send(Method::POST, &url, Some(body)).await?;
        Self::decode(&url, response).await
    }

    async fn delete_json<T: DeserializeOwned>(&self, url: String) -> Result<T, ApiError> {
        let response = self.send::<()>(Method::DELETE, &url, None).await?;
        Self::decode(&url, response).await
    }
}

/// Prefer the backend's `{"error": "..."}` message over the raw body
fn error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
        Err(_) => body.trim().to_string(),
    }
}

#[async_trait]
impl DedupBackend for DedupClient {
    async fn list_entities(&self) -> Result<Vec<String>, ApiError> {
        self.get_json(self.endpoint(&["entities"])).await
    }

    async fn list_source_systems(&self, entity: &str) -> Result<Vec<String>, ApiError> {
        self.get_json(self.endpoint(&["source-systems", entity])).await
    }

    async fn list_files(&self, entity: &str, source_system: &str) -> Result<Vec<String>, ApiError> {
        self.get_json(self.endpoint(&["files", entity, source_system]))
            .await
    }

    async fn list_processed_outputs(&self, entity: &str) -> Result<ProcessedOutputs, ApiError> {
        self.get_json(self.endpoint(&["processed-outputs", entity]))
            .await
    }

    async fn list_columns(
        &self,
        entity: &str,
        source_system: &str,
        filename: &str,
    ) -> Result<Vec<String>, ApiError> {
        self.get_json(self.endpoint(&["columns", entity, source_system, filename]))
            .await
    }

    async fn list_output_columns(&self, filename: &str) -> Result<Vec<String>, ApiError> {
        self.get_json(self.endpoint(&["output-columns", filename]))
            .await
    }

    async fn process_single(
        &self,
        request: &SingleFileRequest,
    ) -> Result<SingleFileResponse, ApiError> {
        self.post_json(self.endpoint(&["process-single"]), request)
            .await
    }

    async fn process_cross_system(
        &self,
        request: &ProcessingRequest,
    ) -> Result<CrossSystemResponse, ApiError> {
        self.post_json(self.endpoint(&["process-cross-system"]), request)
            .await
    }

    async fn delete_processed_outputs(
        &self,
        entity: &str,
    ) -> Result<ClearOutputsResponse, ApiError> {
        self.delete_json(self.endpoint(&["clear-processed-outputs", entity]))
            .await
    }

    async fn delete_output(
        &self,
        entity: &str,
        source_system: &str,
        filename: &str,
    ) -> Result<DeleteOutputResponse, ApiError> {
        self.delete_json(self.endpoint(&[
            "clear-specific-output",
            entity,
            source_system,
            filename,
        ]))
        .await
    }

    async fn download(&self, filename: &str) -> Result<Vec<u8>, ApiError> {
        let url = self.endpoint(&["download", filename]);
        let response = self.send::<()>(Method::GET, &url, None).await?;
        let bytes = response.bytes().await.map_err(|e| ApiError::Transport {
            url: url.clone(),
            message: e.to_string(),
        })?;
        Ok(bytes.to_vec())
    }

    async fn health(&self) -> Result<HealthReport, ApiError> {
        let url = self.endpoint(&["health"]);
        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::Transport {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        health_report(url, status, &text)
    }
}

/// Decode a health response
///
/// A failing check is answered with 500 and a report whose status is
/// `error`; any other non-success response is an [`ApiError::Status`].
fn health_report(url: String, status: StatusCode, body: &str) -> Result<HealthReport, ApiError> {
    let decoded = serde_json::from_str::<HealthReport>(body);
    if status.is_success() {
        return decoded.map_err(|e| ApiError::Decode {
            url,
            message: e.to_string(),
        });
    }

    match decoded {
        Ok(report)
            if status == StatusCode::INTERNAL_SERVER_ERROR
                && report.status == HealthStatus::Error =>
        {
            Ok(report)
        }
        _ => {
            warn!("Backend returned {} for {}", status, url);
            Err(ApiError::Status {
                url,
                status: status.as_u16(),
                message: error_message(status, body),
            })
        }
    }
}
