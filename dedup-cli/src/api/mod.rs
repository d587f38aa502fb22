//! Deduplication backend API
//!
//! The [`DedupBackend`] trait is the only way the console reaches the
//! backend; [`DedupClient`] implements it over HTTP.

pub mod backend;
pub mod client;
pub mod concurrency;
pub mod error;
pub mod models;

pub use backend::DedupBackend;
pub use client::DedupClient;
pub use concurrency::{FetchLimiter, FetchLimiterStats};
pub use error::ApiError;
pub use models::{
    ClearOutputsResponse, CrossSystemResponse, DeleteOutputResponse, FileConfigPayload, FileKind,
    HealthReport, HealthStatus, PerformanceStats, ProcessedOutputs, ProcessingRequest,
    SingleFileRequest, SingleFileResponse, Thresholds,
};
