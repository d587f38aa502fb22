//! Console error taxonomy

use super::file_config::FileConfigId;
use super::summary::ProcessingSummary;
use crate::api::ApiError;

/// Reasons a processing request cannot be built from the current state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// No file configuration has been added
    EmptyConfig,
    /// Independent mode: these `(source_system, filename)` pairs have no column roles
    MissingMapping { files: Vec<(String, String)> },
    /// Cross-system mode needs at least two files
    InsufficientFiles { count: usize },
    /// Cross-system mode needs files from at least two source systems
    InsufficientSystems { count: usize },
    /// Cross-system mode needs at least one global fuzzy or exact column
    MissingGlobalMapping,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::EmptyConfig => {
                write!(f, "add at least one file configuration before processing")
            }
            ValidationError::MissingMapping { files } => {
                let names: Vec<String> = files
                    .iter()
                    .map(|(system, file)| format!("{}/{}", system, file))
                    .collect();
                write!(
                    f,
                    "set fuzzy or exact columns before processing: {}",
                    names.join(", ")
                )
            }
            ValidationError::InsufficientFiles { count } => write!(
                f,
                "cross-system deduplication requires at least 2 files (have {})",
                count
            ),
            ValidationError::InsufficientSystems { count } => write!(
                f,
                "cross-system deduplication requires files from at least 2 different source systems (have {})",
                count
            ),
            ValidationError::MissingGlobalMapping => write!(
                f,
                "set global fuzzy or exact columns for cross-system deduplication"
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Any failure surfaced by the console
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleError {
    /// A configuration for this `(source_system, filename)` pair already exists
    DuplicateConfig {
        source_system: String,
        filename: String,
    },
    /// Columns of a file could not be fetched, or the file has none
    ColumnFetch {
        source_system: String,
        filename: String,
        reason: String,
    },
    Validation(ValidationError),
    /// Any other backend call failure
    Network(ApiError),
    /// The operation needs an entity and none is selected
    NoEntitySelected,
    UnknownConfig(FileConfigId),
    /// The session moved to a new entity or mode before the result arrived
    Superseded,
    /// An independent run stopped at `failed`; `completed` already produced outputs
    Incomplete {
        completed: Vec<ProcessingSummary>,
        failed: String,
        cause: Box<ConsoleError>,
    },
}

impl std::fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsoleError::DuplicateConfig {
                source_system,
                filename,
            } => write!(
                f,
                "configuration for {}/{} already exists",
                source_system, filename
            ),
            ConsoleError::ColumnFetch {
                source_system,
                filename,
                reason,
            } => write!(
                f,
                "failed to load columns for {}/{}: {}",
                source_system, filename, reason
            ),
            ConsoleError::Validation(err) => write!(f, "{}", err),
            ConsoleError::Network(err) => write!(f, "backend request failed: {}", err),
            ConsoleError::NoEntitySelected => write!(f, "no entity selected"),
            ConsoleError::UnknownConfig(id) => write!(f, "no file configuration with id {}", id),
            ConsoleError::Superseded => {
                write!(f, "the session changed before the result arrived")
            }
            ConsoleError::Incomplete {
                completed,
                failed,
                cause,
            } => write!(
                f,
                "processing stopped at {} ({} already processed): {}",
                failed,
                completed.len(),
                cause
            ),
        }
    }
}

impl std::error::Error for ConsoleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConsoleError::Validation(err) => Some(err),
            ConsoleError::Network(err) => Some(err),
            ConsoleError::Incomplete { cause, .. } => Some(cause.as_ref()),
            _ => None,
        }
    }
}

impl From<ValidationError> for ConsoleError {
    fn from(err: ValidationError) -> Self {
        ConsoleError::Validation(err)
    }
}

impl From<ApiError> for ConsoleError {
    fn from(err: ApiError) -> Self {
        ConsoleError::Network(err)
    }
}
