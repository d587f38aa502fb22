//! In-memory backend used by the session tests

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;
use std::time::Duration;

use crate::api::error::ApiError;
use crate::api::models::{
    ClearOutputsResponse, CrossSystemResponse, DeleteOutputResponse, HealthReport, HealthStatus,
    ProcessedOutputs, ProcessingRequest, SingleFileRequest, SingleFileResponse,
};
use crate::api::DedupBackend;

#[derive(Default)]
pub struct FakeBackend {
    systems: BTreeMap<String, Vec<String>>,
    files: BTreeMap<(String, String), Vec<String>>,
    columns: BTreeMap<String, Vec<String>>,
    delays: BTreeMap<String, Duration>,
    failing_systems: BTreeSet<String>,
    fail_processing: bool,
    failing_single: BTreeSet<String>,
    outputs: Mutex<BTreeMap<String, ProcessedOutputs>>,
    pub single_requests: Mutex<Vec<SingleFileRequest>>,
    pub cross_requests: Mutex<Vec<ProcessingRequest>>,
    pub column_fetches: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a source system of `entity` with its source files
    pub fn with_system(mut self, entity: &str, system: &str, files: &[&str]) -> Self {
        self.systems
            .entry(entity.to_string())
            .or_default()
            .push(system.to_string());
        self.files.insert(
            (entity.to_string(), system.to_string()),
            files.iter().map(|f| f.to_string()).collect(),
        );
        self
    }

    pub fn with_output(self, entity: &str, system: &str, file: &str) -> Self {
        if let Ok(mut outputs) = self.outputs.lock() {
            outputs
                .entry(entity.to_string())
                .or_default()
                .entry(system.to_string())
                .or_default()
                .push(file.to_string());
        }
        self
    }

    /// Columns reported for a source file or processed output of this name
    pub fn with_columns(mut self, file: &str, columns: &[&str]) -> Self {
        self.columns.insert(
            file.to_string(),
            columns.iter().map(|c| c.to_string()).collect(),
        );
        self
    }

    /// Delay file listing for one source system
    pub fn with_delay(mut self, system: &str, millis: u64) -> Self {
        self.delays
            .insert(system.to_string(), Duration::from_millis(millis));
        self
    }

    /// Fail file listing for one source system
    pub fn failing(mut self, system: &str) -> Self {
        self.failing_systems.insert(system.to_string());
        self
    }

    pub fn failing_processing(mut self) -> Self {
        self.fail_processing = true;
        self
    }

    /// Fail single-file processing for one source system only
    pub fn failing_single(mut self, system: &str) -> Self {
        self.failing_single.insert(system.to_string());
        self
    }

    fn not_found(url: &str, message: &str) -> ApiError {
        ApiError::Status {
            url: url.to_string(),
            status: 404,
            message: message.to_string(),
        }
    }

    fn lookup_columns(&self, file: &str) -> Result<Vec<String>, ApiError> {
        if let Ok(mut fetches) = self.column_fetches.lock() {
            fetches.push(file.to_string());
        }
        self.columns
            .get(file)
            .cloned()
            .ok_or_else(|| Self::not_found(file, "File not found"))
    }
}

#[async_trait]
impl DedupBackend for FakeBackend {
    async fn list_entities(&self) -> Result<Vec<String>, ApiError> {
        Ok(self.systems.keys().cloned().collect())
    }

    async fn list_source_systems(&self, entity: &str) -> Result<Vec<String>, ApiError> {
        Ok(self.systems.get(entity).cloned().unwrap_or_default())
    }

    async fn list_files(&self, entity: &str, source_system: &str) -> Result<Vec<String>, ApiError> {
        if let Some(delay) = self.delays.get(source_system) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing_systems.contains(source_system) {
            return Err(ApiError::Transport {
                url: format!("files/{}/{}", entity, source_system),
                message: "connection reset".to_string(),
            });
        }
        Ok(self
            .files
            .get(&(entity.to_string(), source_system.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn list_processed_outputs(&self, entity: &str) -> Result<ProcessedOutputs, ApiError> {
        let outputs = self.outputs.lock().map_err(|_| Self::not_found(entity, "poisoned"))?;
        Ok(outputs.get(entity).cloned().unwrap_or_default())
    }

    async fn list_columns(
        &self,
        _entity: &str,
        _source_system: &str,
        filename: &str,
    ) -> Result<Vec<String>, ApiError> {
        self.lookup_columns(filename)
    }

    async fn list_output_columns(&self, filename: &str) -> Result<Vec<String>, ApiError> {
        self.lookup_columns(filename)
    }

    async fn process_single(
        &self,
        request: &SingleFileRequest,
    ) -> Result<SingleFileResponse, ApiError> {
        if self.fail_processing || self.failing_single.contains(&request.source_system) {
            return Err(ApiError::Status {
                url: "process-single".to_string(),
                status: 500,
                message: "processing failed".to_string(),
            });
        }
        if let Ok(mut requests) = self.single_requests.lock() {
            requests.push(request.clone());
        }

        let output_file = format!("{}_Output.xlsx", request.source_system);
        if let Ok(mut outputs) = self.outputs.lock() {
            let files = outputs
                .entry(request.entity.clone())
                .or_default()
                .entry(request.source_system.clone())
                .or_default();
            if !files.contains(&output_file) {
                files.push(output_file.clone());
            }
        }

        Ok(SingleFileResponse {
            message: format!("Processing complete! Output file: {}", output_file),
            output_file,
            processing_time_ms: Some(120),
            total_records: Some(10),
            final_records: Some(8),
            duplicate_groups: Some(2),
            duplicates_found: Some(2),
            ..Default::default()
        })
    }

    async fn process_cross_system(
        &self,
        request: &ProcessingRequest,
    ) -> Result<CrossSystemResponse, ApiError> {
        if self.fail_processing {
            return Err(ApiError::Status {
                url: "process-cross-system".to_string(),
                status: 500,
                message: "processing failed".to_string(),
            });
        }
        if let Ok(mut requests) = self.cross_requests.lock() {
            requests.push(request.clone());
        }

        Ok(CrossSystemResponse {
            message: "Cross-system processing complete".to_string(),
            outputs: vec![format!("{}_CrossSystem_Output.xlsx", request.entity)],
            processing_time_ms: Some(300),
            total_records: Some(20),
            final_records: Some(15),
            duplicate_groups: Some(4),
            duplicates_found: Some(5),
            ..Default::default()
        })
    }

    async fn delete_processed_outputs(
        &self,
        entity: &str,
    ) -> Result<ClearOutputsResponse, ApiError> {
        let mut outputs = self.outputs.lock().map_err(|_| Self::not_found(entity, "poisoned"))?;
        let deleted_files = outputs
            .remove(entity)
            .map(|by_system| by_system.into_values().flatten().collect())
            .unwrap_or_default();
        Ok(ClearOutputsResponse {
            message: format!("Cleared processed outputs for {}", entity),
            deleted_files,
        })
    }

    async fn delete_output(
        &self,
        entity: &str,
        source_system: &str,
        filename: &str,
    ) -> Result<DeleteOutputResponse, ApiError> {
        let mut outputs = self.outputs.lock().map_err(|_| Self::not_found(entity, "poisoned"))?;
        let by_system = outputs
            .get_mut(entity)
            .ok_or_else(|| Self::not_found(filename, "Output not registered"))?;
        let files = by_system
            .get_mut(source_system)
            .ok_or_else(|| Self::not_found(filename, "Output not registered"))?;
        let before = files.len();
        files.retain(|f| f != filename);
        if files.len() == before {
            return Err(Self::not_found(filename, "Output not registered"));
        }
        // The backend drops a system once its last output is gone
        if files.is_empty() {
            by_system.remove(source_system);
        }
        Ok(DeleteOutputResponse {
            message: format!("Deleted {}", filename),
            deleted_file: Some(filename.to_string()),
        })
    }

    async fn download(&self, filename: &str) -> Result<Vec<u8>, ApiError> {
        Ok(filename.as_bytes().to_vec())
    }

    async fn health(&self) -> Result<HealthReport, ApiError> {
        Ok(HealthReport {
            status: HealthStatus::Healthy,
            ..Default::default()
        })
    }
}
