//! Session state for the processing console
//!
//! [`SessionState`] owns everything the console edits: the selected entity,
//! the processing mode, the file configuration list, the derived available
//! columns and the global mapping. Asynchronous completions are applied
//! through [`SessionState::update`], which drops any [`Msg`] whose generation
//! is older than the current one.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::error::ConsoleError;
use super::file_config::{FileConfigId, FileConfiguration, FileDescriptor};
use super::list::FileConfigList;
use super::mapping::ColumnMapping;
use super::msg::Msg;
use super::request::validate_and_build;
use crate::api::models::{ProcessedOutputs, ProcessingRequest, Thresholds};

/// Counter bumped on every entity change, mode change or population start
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProcessingMode {
    /// Each file is deduplicated on its own with its own mapping
    #[default]
    Independent,
    /// All files are combined and deduplicated with the global mapping
    CrossSystem,
}

impl ProcessingMode {
    pub fn is_cross_system(&self) -> bool {
        matches!(self, ProcessingMode::CrossSystem)
    }
}

impl std::fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingMode::Independent => write!(f, "independent"),
            ProcessingMode::CrossSystem => write!(f, "cross-system"),
        }
    }
}

/// Outcome of applying a [`Msg`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    Applied,
    /// A file configuration was appended or inserted
    Added(FileConfigId),
    /// The message belongs to an older generation and was dropped
    Stale,
    /// Cross-system inputs changed; the caller should re-run auto-population
    PopulationNeeded,
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    entity: Option<String>,
    mode: ProcessingMode,
    generation: Generation,
    /// Source systems of the entity, in declaration order
    source_systems: Vec<String>,
    processed_outputs: ProcessedOutputs,
    files: FileConfigList,
    available_columns: Vec<String>,
    global: ColumnMapping,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity(&self) -> Option<&str> {
        self.entity.as_deref()
    }

    pub fn mode(&self) -> ProcessingMode {
        self.mode
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn source_systems(&self) -> &[String] {
        &self.source_systems
    }

    pub fn processed_outputs(&self) -> &ProcessedOutputs {
        &self.processed_outputs
    }

    pub fn files(&self) -> &FileConfigList {
        &self.files
    }

    pub fn file(&self, id: &FileConfigId) -> Option<&FileConfiguration> {
        self.files.get(id)
    }

    pub fn available_columns(&self) -> &[String] {
        &self.available_columns
    }

    pub fn global(&self) -> &ColumnMapping {
        &self.global
    }

    // === Mode controller ===

    /// Select an entity and reset everything derived from the previous one
    pub fn set_entity(&mut self, entity: impl Into<String>) -> Generation {
        let entity = entity.into();
        info!("Selecting entity '{}'", entity);

        self.entity = Some(entity);
        self.mode = ProcessingMode::Independent;
        self.source_systems.clear();
        self.processed_outputs.clear();
        self.files.clear();
        self.available_columns.clear();
        self.global.clear();
        self.bump()
    }

    /// Switch processing mode; the file list is always cleared, even when
    /// the mode does not change
    pub fn set_mode(&mut self, mode: ProcessingMode) -> Generation {
        info!("Switching to {} mode", mode);

        self.mode = mode;
        self.files.clear();
        self.available_columns.clear();
        self.bump()
    }

    /// Start a new auto-population round, discarding the current list
    pub fn begin_population(&mut self) -> Generation {
        self.files.clear();
        self.available_columns.clear();
        let generation = self.bump();
        debug!(
            "Starting auto-population {} over {} source systems",
            generation,
            self.source_systems.len()
        );
        generation
    }

    /// Finish a population round: drop global selections no longer available
    pub fn finish_population(&mut self, generation: Generation) {
        if generation != self.generation {
            return;
        }
        self.prune_global();
        info!(
            "Auto-population {} finished with {} file configurations",
            generation,
            self.files.len()
        );
    }

    fn bump(&mut self) -> Generation {
        self.generation = self.generation.next();
        self.generation
    }

    // === Message reducer ===

    /// Apply an asynchronous completion
    pub fn update(&mut self, msg: Msg) -> Result<Update, ConsoleError> {
        if msg.generation() != self.generation {
            debug!(
                "Discarding stale message from {} (current {})",
                msg.generation(),
                self.generation
            );
            return Ok(Update::Stale);
        }

        match msg {
            Msg::SourceSystemsLoaded { systems, .. } => {
                self.source_systems = systems;
                Ok(self.population_update())
            }
            Msg::ProcessedOutputsLoaded { outputs, .. } => {
                self.processed_outputs = outputs;
                Ok(self.population_update())
            }
            Msg::FileLoaded {
                source_system,
                file,
                result,
                ..
            } => {
                let columns = result?;
                let config = FileConfiguration::new(source_system, file, columns);
                let id = self.files.push(config)?;
                self.recompute_available_columns();
                Ok(Update::Added(id))
            }
            Msg::FileSwitched { id, file, result, .. } => {
                let columns = result?;
                if !self.files.replace_file(&id, file, columns)? {
                    return Err(ConsoleError::UnknownConfig(id));
                }
                self.recompute_available_columns();
                self.prune_global();
                Ok(Update::Applied)
            }
            Msg::SystemPopulated {
                source_system,
                file,
                columns,
                alternatives,
                ..
            } => {
                if self.files.contains(&source_system, &file.name) {
                    warn!(
                        "Skipping auto-populated {}/{}: already configured",
                        source_system, file.name
                    );
                    return Ok(Update::Applied);
                }

                let index = self.insert_position(&source_system);
                let config = FileConfiguration::new(source_system, file, columns)
                    .with_alternatives(alternatives);
                let id = self.files.insert(index, config)?;
                self.recompute_available_columns();
                Ok(Update::Added(id))
            }
            Msg::PopulationSkipped { source_system, .. } => {
                debug!(
                    "Source system {} has no files or processed outputs",
                    source_system
                );
                Ok(Update::Applied)
            }
            Msg::PopulationFailed {
                source_system,
                error,
                ..
            } => {
                warn!("Auto-population skipped {}: {}", source_system, error);
                Ok(Update::Applied)
            }
        }
    }

    fn population_update(&self) -> Update {
        if self.mode.is_cross_system() {
            Update::PopulationNeeded
        } else {
            Update::Applied
        }
    }

    /// Index that keeps entries grouped in source-system declaration order
    ///
    /// Systems not declared for the entity sort after every declared one.
    fn insert_position(&self, source_system: &str) -> usize {
        let rank = |system: &str| {
            self.source_systems
                .iter()
                .position(|s| s == system)
                .unwrap_or(usize::MAX)
        };
        let target = rank(source_system);
        self.files
            .iter()
            .position(|c| rank(&c.source_system) > target)
            .unwrap_or(self.files.len())
    }

    // === File configuration list ===

    /// Remove a file configuration; false if no entry has this id
    pub fn remove_file(&mut self, id: &FileConfigId) -> bool {
        match self.files.remove(id) {
            Some(removed) => {
                debug!(
                    "Removed configuration {}/{}",
                    removed.source_system,
                    removed.filename()
                );
                self.recompute_available_columns();
                self.prune_global();
                true
            }
            None => false,
        }
    }

    /// Replace an entry's mapping wholesale; false if no entry has this id
    pub fn update_mapping(
        &mut self,
        id: &FileConfigId,
        fuzzy: &[String],
        exact: &[String],
        thresholds: &Thresholds,
    ) -> bool {
        self.files.update_mapping(id, fuzzy, exact, thresholds)
    }

    /// Fail with `DuplicateConfig` if the pair is already configured
    pub fn ensure_absent(&self, source_system: &str, file: &FileDescriptor) -> Result<(), ConsoleError> {
        self.files.ensure_absent(source_system, &file.name)
    }

    // === Column mapping editor ===

    /// Toggle the fuzzy role of a column of one file
    ///
    /// Returns false when the entry does not exist or lacks the column.
    pub fn toggle_fuzzy(&mut self, id: &FileConfigId, column: &str) -> bool {
        self.with_file_column(id, column, |mapping| mapping.toggle_fuzzy(column))
    }

    pub fn toggle_exact(&mut self, id: &FileConfigId, column: &str) -> bool {
        self.with_file_column(id, column, |mapping| mapping.toggle_exact(column))
    }

    pub fn set_threshold(&mut self, id: &FileConfigId, column: &str, value: &str) -> bool {
        match self.files.get_mut(id) {
            Some(config) if config.has_column(column) => {
                config.mapping.set_threshold(column, value)
            }
            _ => false,
        }
    }

    fn with_file_column(
        &mut self,
        id: &FileConfigId,
        column: &str,
        edit: impl FnOnce(&mut ColumnMapping),
    ) -> bool {
        match self.files.get_mut(id) {
            Some(config) if config.has_column(column) => {
                edit(&mut config.mapping);
                true
            }
            _ => false,
        }
    }

    // === Global mapping aggregator ===

    pub fn toggle_global_fuzzy(&mut self, column: &str) -> bool {
        if !self.is_available(column) {
            return false;
        }
        self.global.toggle_fuzzy(column);
        true
    }

    pub fn toggle_global_exact(&mut self, column: &str) -> bool {
        if !self.is_available(column) {
            return false;
        }
        self.global.toggle_exact(column);
        true
    }

    pub fn set_global_threshold(&mut self, column: &str, value: &str) -> bool {
        self.is_available(column) && self.global.set_threshold(column, value)
    }

    /// Replace the global mapping wholesale, normalized against the
    /// available columns
    pub fn update_global_mapping(
        &mut self,
        fuzzy: &[String],
        exact: &[String],
        thresholds: &Thresholds,
    ) {
        self.global =
            ColumnMapping::normalized(&self.available_columns, fuzzy, exact, thresholds);
    }

    fn is_available(&self, column: &str) -> bool {
        self.available_columns.iter().any(|c| c == column)
    }

    fn recompute_available_columns(&mut self) {
        self.available_columns = self.files.available_columns();
    }

    fn prune_global(&mut self) {
        self.global.retain_columns(&self.available_columns);
    }

    // === Request builder ===

    /// Validate the current configuration and build the processing request
    pub fn build_request(&self) -> Result<ProcessingRequest, ConsoleError> {
        let entity = self.entity.as_deref().ok_or(ConsoleError::NoEntitySelected)?;
        Ok(validate_and_build(self.mode, entity, &self.files, &self.global)?)
    }
}
