//! Ordered list of file configurations
//!
//! Entries are addressed by [`FileConfigId`]. No two entries may share a
//! `(source_system, filename)` pair.

use super::error::ConsoleError;
use super::file_config::{FileConfigId, FileConfiguration, FileDescriptor};
use super::mapping::ColumnMapping;
use crate::api::models::Thresholds;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfigList {
    entries: Vec<FileConfiguration>,
}

impl FileConfigList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FileConfiguration> {
        self.entries.iter()
    }

    pub fn get(&self, id: &FileConfigId) -> Option<&FileConfiguration> {
        self.entries.iter().find(|c| &c.id == id)
    }

    pub fn get_mut(&mut self, id: &FileConfigId) -> Option<&mut FileConfiguration> {
        self.entries.iter_mut().find(|c| &c.id == id)
    }

    pub fn find(&self, source_system: &str, filename: &str) -> Option<&FileConfiguration> {
        self.entries
            .iter()
            .find(|c| c.matches(source_system, filename))
    }

    pub fn contains(&self, source_system: &str, filename: &str) -> bool {
        self.find(source_system, filename).is_some()
    }

    /// Fail with `DuplicateConfig` if the pair is already present
    pub fn ensure_absent(&self, source_system: &str, filename: &str) -> Result<(), ConsoleError> {
        if self.contains(source_system, filename) {
            return Err(ConsoleError::DuplicateConfig {
                source_system: source_system.to_string(),
                filename: filename.to_string(),
            });
        }
        Ok(())
    }

    /// Append a configuration
    pub fn push(&mut self, config: FileConfiguration) -> Result<FileConfigId, ConsoleError> {
        let len = self.entries.len();
        self.insert(len, config)
    }

    /// Insert a configuration at `index` (clamped to the list length)
    pub fn insert(
        &mut self,
        index: usize,
        config: FileConfiguration,
    ) -> Result<FileConfigId, ConsoleError> {
        self.ensure_absent(&config.source_system, config.filename())?;
        let id = config.id.clone();
        let index = index.min(self.entries.len());
        self.entries.insert(index, config);
        Ok(id)
    }

    /// Remove an entry; `None` if no entry has this id
    pub fn remove(&mut self, id: &FileConfigId) -> Option<FileConfiguration> {
        let position = self.entries.iter().position(|c| &c.id == id)?;
        Some(self.entries.remove(position))
    }

    /// Replace the mapping of an entry; false if no entry has this id
    ///
    /// The new mapping is normalized against the entry's columns.
    pub fn update_mapping(
        &mut self,
        id: &FileConfigId,
        fuzzy: &[String],
        exact: &[String],
        thresholds: &Thresholds,
    ) -> bool {
        match self.get_mut(id) {
            Some(config) => {
                config.mapping = ColumnMapping::normalized(&config.columns, fuzzy, exact, thresholds);
                true
            }
            None => false,
        }
    }

    /// Point an entry at another file, replacing its columns and resetting its mapping
    pub fn replace_file(
        &mut self,
        id: &FileConfigId,
        file: FileDescriptor,
        columns: Vec<String>,
    ) -> Result<bool, ConsoleError> {
        let Some(current) = self.get(id) else {
            return Ok(false);
        };
        if current.filename() != file.name {
            self.ensure_absent(&current.source_system.clone(), &file.name)?;
        }

        if let Some(config) = self.get_mut(id) {
            config.file = file;
            config.columns = columns;
            config.mapping = ColumnMapping::new();
        }
        Ok(true)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Order-preserving union of every entry's columns
    pub fn available_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        for column in self.entries.iter().flat_map(|c| c.columns.iter()) {
            if !columns.contains(column) {
                columns.push(column.clone());
            }
        }
        columns
    }

    /// Distinct source systems, in list order
    pub fn source_systems(&self) -> Vec<&str> {
        let mut systems: Vec<&str> = Vec::new();
        for config in &self.entries {
            if !systems.contains(&config.source_system.as_str()) {
                systems.push(&config.source_system);
            }
        }
        systems
    }

    /// `(source_system, filename)` of entries with neither fuzzy nor exact columns
    pub fn unmapped(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .filter(|c| c.mapping.is_empty())
            .map(|c| (c.source_system.clone(), c.filename().to_string()))
            .collect()
    }
}

impl<'a> IntoIterator for &'a FileConfigList {
    type Item = &'a FileConfiguration;
    type IntoIter = std::slice::Iter<'a, FileConfiguration>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
