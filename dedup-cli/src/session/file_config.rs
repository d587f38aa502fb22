//! Per-file configuration entries

use uuid::Uuid;

use super::mapping::ColumnMapping;
use crate::api::models::{FileConfigPayload, FileKind, Thresholds};

/// Stable identity of a file configuration
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileConfigId(String);

impl FileConfigId {
    /// New id composed of the file's origin plus a random suffix
    pub fn generate(source_system: &str, filename: &str) -> Self {
        Self(format!(
            "{}-{}-{}",
            source_system,
            filename,
            Uuid::new_v4().simple()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FileConfigId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl std::fmt::Display for FileConfigId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A selectable file: its name plus whether it is a source file or a processed output
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileDescriptor {
    pub name: String,
    pub kind: FileKind,
}

impl FileDescriptor {
    pub fn new(name: impl Into<String>, kind: FileKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn source(name: impl Into<String>) -> Self {
        Self::new(name, FileKind::Source)
    }

    pub fn output(name: impl Into<String>) -> Self {
        Self::new(name, FileKind::Output)
    }

    pub fn display_name(&self) -> String {
        match self.kind {
            FileKind::Source => self.name.clone(),
            FileKind::Output => format!("{} (Processed Output)", self.name),
        }
    }
}

/// Files a source system offers, recorded during cross-system auto-population
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileAlternatives {
    pub source_files: Vec<String>,
    pub output_files: Vec<String>,
}

impl FileAlternatives {
    /// First source file, or the first processed output when there is none
    pub fn default_file(&self) -> Option<FileDescriptor> {
        self.source_files
            .first()
            .map(FileDescriptor::source)
            .or_else(|| self.output_files.first().map(FileDescriptor::output))
    }

    /// Every alternative, source files first
    pub fn descriptors(&self) -> Vec<FileDescriptor> {
        self.source_files
            .iter()
            .map(FileDescriptor::source)
            .chain(self.output_files.iter().map(FileDescriptor::output))
            .collect()
    }

    pub fn contains(&self, file: &FileDescriptor) -> bool {
        match file.kind {
            FileKind::Source => self.source_files.contains(&file.name),
            FileKind::Output => self.output_files.contains(&file.name),
        }
    }
}

/// Match configuration for one file of one source system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileConfiguration {
    pub id: FileConfigId,
    pub source_system: String,
    pub file: FileDescriptor,
    /// Header columns as reported by the backend
    pub columns: Vec<String>,
    pub mapping: ColumnMapping,
    pub alternatives: Option<FileAlternatives>,
}

impl FileConfiguration {
    pub fn new(source_system: impl Into<String>, file: FileDescriptor, columns: Vec<String>) -> Self {
        let source_system = source_system.into();
        Self {
            id: FileConfigId::generate(&source_system, &file.name),
            source_system,
            file,
            columns,
            mapping: ColumnMapping::new(),
            alternatives: None,
        }
    }

    pub fn with_alternatives(mut self, alternatives: FileAlternatives) -> Self {
        self.alternatives = Some(alternatives);
        self
    }

    pub fn filename(&self) -> &str {
        &self.file.name
    }

    pub fn kind(&self) -> FileKind {
        self.file.kind
    }

    pub fn display_name(&self) -> String {
        self.file.display_name()
    }

    pub fn matches(&self, source_system: &str, filename: &str) -> bool {
        self.source_system == source_system && self.file.name == filename
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Wire form; `with_mapping = false` sends empty column selections
    pub fn to_payload(&self, with_mapping: bool) -> FileConfigPayload {
        let (fuzzy_columns, exact_columns, thresholds) = if with_mapping {
            (
                self.mapping.fuzzy_columns().to_vec(),
                self.mapping.exact_columns().to_vec(),
                self.mapping.thresholds().clone(),
            )
        } else {
            (Vec::new(), Vec::new(), Thresholds::new())
        };

        FileConfigPayload {
            source_system: self.source_system.clone(),
            filename: self.file.name.clone(),
            file_type: self.file.kind,
            fuzzy_columns,
            exact_columns,
            thresholds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = FileConfigId::generate("SYS1", "file1.xlsx");
        let b = FileConfigId::generate("SYS1", "file1.xlsx");
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("SYS1-file1.xlsx-"));
    }

    #[test]
    fn test_display_name() {
        assert_eq!(FileDescriptor::source("a.xlsx").display_name(), "a.xlsx");
        assert_eq!(
            FileDescriptor::output("ps91_Output.xlsx").display_name(),
            "ps91_Output.xlsx (Processed Output)"
        );
    }

    #[test]
    fn test_alternatives_default_prefers_source() {
        let alternatives = FileAlternatives {
            source_files: vec!["raw.xlsx".to_string()],
            output_files: vec!["SYS1_Output.xlsx".to_string()],
        };
        assert_eq!(
            alternatives.default_file(),
            Some(FileDescriptor::source("raw.xlsx"))
        );

        let outputs_only = FileAlternatives {
            source_files: vec![],
            output_files: vec!["SYS1_Output.xlsx".to_string()],
        };
        assert_eq!(
            outputs_only.default_file(),
            Some(FileDescriptor::output("SYS1_Output.xlsx"))
        );

        assert_eq!(FileAlternatives::default().default_file(), None);
        assert!(alternatives.contains(&FileDescriptor::output("SYS1_Output.xlsx")));
        assert!(!alternatives.contains(&FileDescriptor::source("SYS1_Output.xlsx")));
        assert_eq!(alternatives.descriptors().len(), 2);
    }

    #[test]
    fn test_payload_without_mapping_is_empty() {
        let mut config = FileConfiguration::new(
            "SYS1",
            FileDescriptor::source("file1.xlsx"),
            vec!["id".to_string(), "name".to_string()],
        );
        config.mapping.toggle_fuzzy("name");
        config.mapping.toggle_exact("id");

        let full = config.to_payload(true);
        assert_eq!(full.fuzzy_columns, vec!["name".to_string()]);
        assert_eq!(full.exact_columns, vec!["id".to_string()]);
        assert_eq!(full.thresholds.get("name"), Some(&90));

        let bare = config.to_payload(false);
        assert_eq!(bare.filename, "file1.xlsx");
        assert_eq!(bare.file_type, FileKind::Source);
        assert!(bare.fuzzy_columns.is_empty());
        assert!(bare.exact_columns.is_empty());
        assert!(bare.thresholds.is_empty());
    }
}
