//! Seam between the console and the deduplication backend
//!
//! The console only talks to the backend through this trait, so the HTTP
//! client can be swapped for an in-memory implementation in tests.

use async_trait::async_trait;

use super::error::ApiError;
use super::models::{
    ClearOutputsResponse, CrossSystemResponse, DeleteOutputResponse, HealthReport,
    ProcessedOutputs, ProcessingRequest, SingleFileRequest, SingleFileResponse,
};

#[async_trait]
pub trait DedupBackend: Send + Sync {
    /// Entities (record domains) the backend manages
    async fn list_entities(&self) -> Result<Vec<String>, ApiError>;

    /// Source systems contributing records for an entity
    async fn list_source_systems(&self, entity: &str) -> Result<Vec<String>, ApiError>;

    /// Raw source files of one source system
    async fn list_files(&self, entity: &str, source_system: &str) -> Result<Vec<String>, ApiError>;

    /// Previously produced outputs, grouped by source system
    async fn list_processed_outputs(&self, entity: &str) -> Result<ProcessedOutputs, ApiError>;

    /// Header columns of a source file
    async fn list_columns(
        &self,
        entity: &str,
        source_system: &str,
        filename: &str,
    ) -> Result<Vec<String>, ApiError>;

    /// Header columns of a processed output
    async fn list_output_columns(&self, filename: &str) -> Result<Vec<String>, ApiError>;

    async fn process_single(
        &self,
        request: &SingleFileRequest,
    ) -> Result<SingleFileResponse, ApiError>;

    async fn process_cross_system(
        &self,
        request: &ProcessingRequest,
    ) -> Result<CrossSystemResponse, ApiError>;

    /// Delete every processed output of an entity (files and registry entries)
    async fn delete_processed_outputs(&self, entity: &str)
    -> Result<ClearOutputsResponse, ApiError>;

    async fn delete_output(
        &self,
        entity: &str,
        source_system: &str,
        filename: &str,
    ) -> Result<DeleteOutputResponse, ApiError>;

    async fn download(&self, filename: &str) -> Result<Vec<u8>, ApiError>;

    async fn health(&self) -> Result<HealthReport, ApiError>;
}
