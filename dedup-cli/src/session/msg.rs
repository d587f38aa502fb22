//! Messages applied to the session state
//!
//! Every asynchronous completion is turned into a [`Msg`] tagged with the
//! [`Generation`] that started it, so results that arrive after an entity or
//! mode change can be recognized and dropped.

use super::error::ConsoleError;
use super::file_config::{FileAlternatives, FileConfigId, FileDescriptor};
use super::state::Generation;
use crate::api::models::ProcessedOutputs;

#[derive(Debug, Clone)]
pub enum Msg {
    // === Entity data ===
    /// Source systems of the selected entity, in declaration order
    SourceSystemsLoaded {
        generation: Generation,
        systems: Vec<String>,
    },
    /// Processed outputs of the selected entity
    ProcessedOutputsLoaded {
        generation: Generation,
        outputs: ProcessedOutputs,
    },

    // === File configurations ===
    /// Columns fetched for a manually added file
    FileLoaded {
        generation: Generation,
        source_system: String,
        file: FileDescriptor,
        result: Result<Vec<String>, ConsoleError>,
    },
    /// Columns fetched for a file an existing entry switches to
    FileSwitched {
        generation: Generation,
        id: FileConfigId,
        file: FileDescriptor,
        result: Result<Vec<String>, ConsoleError>,
    },

    // === Cross-system auto-population ===
    /// Default file of a source system resolved, with its columns
    SystemPopulated {
        generation: Generation,
        source_system: String,
        file: FileDescriptor,
        columns: Vec<String>,
        alternatives: FileAlternatives,
    },
    /// Source system has neither source files nor processed outputs
    PopulationSkipped {
        generation: Generation,
        source_system: String,
    },
    /// Listing files or fetching columns failed for a source system
    PopulationFailed {
        generation: Generation,
        source_system: String,
        error: ConsoleError,
    },
}

impl Msg {
    pub fn generation(&self) -> Generation {
        match self {
            Msg::SourceSystemsLoaded { generation, .. }
            | Msg::ProcessedOutputsLoaded { generation, .. }
            | Msg::FileLoaded { generation, .. }
            | Msg::FileSwitched { generation, .. }
            | Msg::SystemPopulated { generation, .. }
            | Msg::PopulationSkipped { generation, .. }
            | Msg::PopulationFailed { generation, .. } => *generation,
        }
    }
}
