//! Request builder and validator

use std::collections::BTreeSet;

use super::error::ValidationError;
use super::list::FileConfigList;
use super::mapping::ColumnMapping;
use super::state::ProcessingMode;
use crate::api::models::{ProcessingRequest, Thresholds};

/// Validate the configuration for `mode` and build the outbound request
///
/// Cross-system requests carry the global mapping and send every file's own
/// selections empty. Independent requests carry per-file selections and
/// empty global fields.
pub fn validate_and_build(
    mode: ProcessingMode,
    entity: &str,
    files: &FileConfigList,
    global: &ColumnMapping,
) -> Result<ProcessingRequest, ValidationError> {
    if files.is_empty() {
        return Err(ValidationError::EmptyConfig);
    }

    match mode {
        ProcessingMode::Independent => {
            let unmapped = files.unmapped();
            if !unmapped.is_empty() {
                return Err(ValidationError::MissingMapping { files: unmapped });
            }

            Ok(ProcessingRequest {
                entity: entity.to_string(),
                file_configs: files.iter().map(|c| c.to_payload(true)).collect(),
                global_fuzzy_columns: Vec::new(),
                global_exact_columns: Vec::new(),
                global_thresholds: Thresholds::new(),
            })
        }
        ProcessingMode::CrossSystem => {
            if files.len() < 2 {
                return Err(ValidationError::InsufficientFiles { count: files.len() });
            }

            let systems: BTreeSet<&str> =
                files.iter().map(|c| c.source_system.as_str()).collect();
            if systems.len() < 2 {
                return Err(ValidationError::InsufficientSystems {
                    count: systems.len(),
                });
            }

            if global.is_empty() {
                return Err(ValidationError::MissingGlobalMapping);
            }

            Ok(ProcessingRequest {
                entity: entity.to_string(),
                file_configs: files.iter().map(|c| c.to_payload(false)).collect(),
                global_fuzzy_columns: global.fuzzy_columns().to_vec(),
                global_exact_columns: global.exact_columns().to_vec(),
                global_thresholds: global.thresholds().clone(),
            })
        }
    }
}
