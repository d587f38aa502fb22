//! Cross-system auto-population
//!
//! One fetch per source system: list its source files, combine them with the
//! system's processed outputs, pick the default file and fetch its columns.
//! The fetches run concurrently under the [`FetchLimiter`] and each result is
//! yielded as a [`Msg`] as soon as it completes.

use futures::stream::FuturesUnordered;
use log::debug;

use super::error::ConsoleError;
use super::file_config::{FileAlternatives, FileDescriptor};
use super::msg::Msg;
use super::state::Generation;
use crate::api::models::{FileKind, ProcessedOutputs};
use crate::api::{DedupBackend, FetchLimiter};

/// Inputs of one population round, detached from the session state
#[derive(Debug, Clone)]
pub struct PopulationContext {
    pub entity: String,
    pub source_systems: Vec<String>,
    pub processed_outputs: ProcessedOutputs,
    pub generation: Generation,
}

/// Fetch the columns of a source file or processed output
///
/// A failed call and an empty column list are both reported as
/// [`ConsoleError::ColumnFetch`].
pub async fn fetch_columns<B: DedupBackend + ?Sized>(
    backend: &B,
    entity: &str,
    source_system: &str,
    file: &FileDescriptor,
) -> Result<Vec<String>, ConsoleError> {
    let column_fetch = |reason: String| ConsoleError::ColumnFetch {
        source_system: source_system.to_string(),
        filename: file.name.clone(),
        reason,
    };

    let columns = match file.kind {
        FileKind::Source => backend.list_columns(entity, source_system, &file.name).await,
        FileKind::Output => backend.list_output_columns(&file.name).await,
    }
    .map_err(|err| column_fetch(err.to_string()))?;

    if columns.is_empty() {
        return Err(column_fetch("file has no columns".to_string()));
    }
    Ok(columns)
}

/// Start one fetch per source system
///
/// Poll the returned set as a stream; completions arrive in whatever order
/// the backend answers.
pub fn populate<'a, B: DedupBackend + ?Sized>(
    backend: &'a B,
    limiter: &'a FetchLimiter,
    context: PopulationContext,
) -> FuturesUnordered<impl Future<Output = Msg> + 'a> {
    let PopulationContext {
        entity,
        source_systems,
        processed_outputs,
        generation,
    } = context;

    source_systems
        .into_iter()
        .map(|source_system| {
            let entity = entity.clone();
            let output_files = processed_outputs
                .get(&source_system)
                .cloned()
                .unwrap_or_default();

            async move {
                let _permit = match limiter.acquire().await {
                    Ok(permit) => permit,
                    Err(err) => {
                        return Msg::PopulationFailed {
                            generation,
                            error: ConsoleError::ColumnFetch {
                                source_system: source_system.clone(),
                                filename: String::new(),
                                reason: err.to_string(),
                            },
                            source_system,
                        };
                    }
                };
                populate_system(backend, &entity, source_system, output_files, generation).await
            }
        })
        .collect()
}

async fn populate_system<B: DedupBackend + ?Sized>(
    backend: &B,
    entity: &str,
    source_system: String,
    output_files: Vec<String>,
    generation: Generation,
) -> Msg {
    let source_files = match backend.list_files(entity, &source_system).await {
        Ok(files) => files,
        Err(err) => {
            return Msg::PopulationFailed {
                generation,
                source_system,
                error: err.into(),
            };
        }
    };

    let alternatives = FileAlternatives {
        source_files,
        output_files,
    };
    let Some(file) = alternatives.default_file() else {
        return Msg::PopulationSkipped {
            generation,
            source_system,
        };
    };

    debug!(
        "Auto-population: {} defaults to {}",
        source_system,
        file.display_name()
    );

    match fetch_columns(backend, entity, &source_system, &file).await {
        Ok(columns) => Msg::SystemPopulated {
            generation,
            source_system,
            file,
            columns,
            alternatives,
        },
        Err(error) => Msg::PopulationFailed {
            generation,
            source_system,
            error,
        },
    }
}
