//! Result summaries rendered after a processing run

use std::time::Duration;

use super::state::ProcessingMode;
use crate::api::models::{
    CrossSystemResponse, PerformanceStats, ProcessingRequest, SingleFileRequest,
    SingleFileResponse,
};

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingSummary {
    pub mode: ProcessingMode,
    /// `source_system/filename` for single-file runs, the entity otherwise
    pub subject: String,
    pub message: String,
    pub output_files: Vec<String>,
    /// Wall-clock time measured by the console, request included
    pub elapsed_ms: u64,
    /// Processing time reported by the backend
    pub backend_time_ms: Option<u64>,
    pub total_records: Option<u64>,
    pub final_records: Option<u64>,
    pub duplicate_groups: Option<u64>,
    pub duplicates_found: Option<u64>,
    pub file_size_mb: Option<f64>,
    pub memory_used_mb: Option<f64>,
    pub files_processed: usize,
    pub fuzzy_columns: Vec<String>,
    pub exact_columns: Vec<String>,
    pub performance: Option<PerformanceStats>,
}

impl ProcessingSummary {
    pub fn from_single(
        request: &SingleFileRequest,
        response: SingleFileResponse,
        elapsed: Duration,
    ) -> Self {
        Self {
            mode: ProcessingMode::Independent,
            subject: format!("{}/{}", request.source_system, request.filename),
            message: response.message,
            output_files: vec![response.output_file],
            elapsed_ms: millis(elapsed),
            backend_time_ms: response.processing_time_ms,
            total_records: response.total_records,
            final_records: response.final_records,
            duplicate_groups: response.duplicate_groups,
            duplicates_found: response.duplicates_found,
            file_size_mb: response.file_size_mb,
            memory_used_mb: response.memory_used_mb,
            files_processed: 1,
            fuzzy_columns: request.fuzzy_columns.clone(),
            exact_columns: request.exact_columns.clone(),
            performance: response.performance_stats,
        }
    }

    pub fn from_cross_system(
        request: &ProcessingRequest,
        response: CrossSystemResponse,
        elapsed: Duration,
    ) -> Self {
        Self {
            mode: ProcessingMode::CrossSystem,
            subject: request.entity.clone(),
            message: response.message,
            output_files: response.outputs,
            elapsed_ms: millis(elapsed),
            backend_time_ms: response.processing_time_ms,
            total_records: response.total_records,
            final_records: response.final_records,
            duplicate_groups: response.duplicate_groups,
            duplicates_found: response.duplicates_found,
            file_size_mb: response.total_file_size_mb,
            memory_used_mb: response.memory_used_mb,
            files_processed: request.file_configs.len(),
            fuzzy_columns: request.global_fuzzy_columns.clone(),
            exact_columns: request.global_exact_columns.clone(),
            performance: response.performance_stats,
        }
    }

    /// Share of input records removed as duplicates, in percent
    pub fn reduction_percent(&self) -> Option<f64> {
        match (self.total_records, self.final_records) {
            (Some(total), Some(kept)) if total > 0 && kept <= total => {
                Some((total - kept) as f64 * 100.0 / total as f64)
            }
            _ => None,
        }
    }
}

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
