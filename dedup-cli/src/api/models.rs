//! Request and response shapes exchanged with the deduplication backend

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Processed output filenames per source system, as registered by the backend
pub type ProcessedOutputs = BTreeMap<String, Vec<String>>;

/// Similarity thresholds per fuzzy column
pub type Thresholds = BTreeMap<String, i64>;

/// Whether a file is raw input or a previously produced deduplication result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    #[default]
    Source,
    Output,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Source => "source",
            FileKind::Output => "output",
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FileKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "source" => Ok(FileKind::Source),
            "output" | "processed" => Ok(FileKind::Output),
            other => Err(format!(
                "unknown file kind '{}' (expected 'source' or 'output')",
                other
            )),
        }
    }
}

/// One file entry of a processing request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfigPayload {
    pub source_system: String,
    pub filename: String,
    pub file_type: FileKind,
    pub fuzzy_columns: Vec<String>,
    pub exact_columns: Vec<String>,
    pub thresholds: Thresholds,
}

/// Validated request built from the console state
///
/// The global fields are always present; they stay empty in independent mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingRequest {
    pub entity: String,
    pub file_configs: Vec<FileConfigPayload>,
    pub global_fuzzy_columns: Vec<String>,
    pub global_exact_columns: Vec<String>,
    pub global_thresholds: Thresholds,
}

/// Body of `POST /api/process-single`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleFileRequest {
    pub entity: String,
    pub source_system: String,
    pub filename: String,
    pub file_type: FileKind,
    pub fuzzy_columns: Vec<String>,
    pub exact_columns: Vec<String>,
    pub thresholds: Thresholds,
}

impl SingleFileRequest {
    pub fn from_payload(entity: &str, file: &FileConfigPayload) -> Self {
        Self {
            entity: entity.to_string(),
            source_system: file.source_system.clone(),
            filename: file.filename.clone(),
            file_type: file.file_type,
            fuzzy_columns: file.fuzzy_columns.clone(),
            exact_columns: file.exact_columns.clone(),
            thresholds: file.thresholds.clone(),
        }
    }
}

/// Throughput figures reported alongside a processing result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceStats {
    pub records_per_second: Option<f64>,
    pub mb_per_second: Option<f64>,
    pub files_processed: Option<u64>,
    pub fuzzy_columns_count: Option<u64>,
    pub exact_columns_count: Option<u64>,
}

/// Response of `POST /api/process-single`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SingleFileResponse {
    pub message: String,
    pub output_file: String,
    pub download_link: Option<String>,
    pub processing_time_ms: Option<u64>,
    pub file_load_time_ms: Option<u64>,
    pub processing_only_time_ms: Option<u64>,
    pub memory_used_mb: Option<f64>,
    pub file_size_mb: Option<f64>,
    pub total_records: Option<u64>,
    pub duplicate_groups: Option<u64>,
    pub final_records: Option<u64>,
    pub duplicates_found: Option<u64>,
    pub performance_stats: Option<PerformanceStats>,
}

/// Response of `POST /api/process-cross-system`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossSystemResponse {
    pub message: String,
    pub outputs: Vec<String>,
    pub download_links: Vec<String>,
    pub processing_time_ms: Option<u64>,
    pub file_read_time_ms: Option<u64>,
    pub combine_time_ms: Option<u64>,
    pub deduplication_time_ms: Option<u64>,
    pub save_time_ms: Option<u64>,
    pub memory_used_mb: Option<f64>,
    pub total_file_size_mb: Option<f64>,
    pub total_records: Option<u64>,
    pub final_records: Option<u64>,
    pub duplicate_groups: Option<u64>,
    pub duplicates_found: Option<u64>,
    pub performance_stats: Option<PerformanceStats>,
}

/// Response of `DELETE /api/clear-processed-outputs/{entity}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClearOutputsResponse {
    pub message: String,
    pub deleted_files: Vec<String>,
}

/// Response of `DELETE /api/clear-specific-output/{entity}/{system}/{file}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeleteOutputResponse {
    pub message: String,
    pub deleted_file: Option<String>,
}

/// Overall backend health
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Error,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthChecks {
    pub directories_ok: bool,
    pub required_files_ok: bool,
    pub memory_ok: bool,
    pub disk_ok: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthStatistics {
    pub entities_count: u64,
    pub total_source_files: u64,
    pub total_output_files: u64,
}

/// Response of `GET /api/health`
///
/// The backend answers with status 500 and `status = "error"` when the check
/// itself fails; that body is still decoded into this type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub timestamp: Option<NaiveDateTime>,
    pub checks: Option<HealthChecks>,
    pub statistics: Option<HealthStatistics>,
    pub error: Option<String>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

/// Error body returned by the backend on failures
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}
