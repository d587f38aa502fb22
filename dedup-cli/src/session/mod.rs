//! Processing configuration session
//!
//! Holds the per-entity editing state (file configurations, column mappings,
//! processing mode) and the [`Console`] that drives it against a backend.

pub mod console;
pub mod error;
pub mod file_config;
pub mod list;
pub mod mapping;
pub mod msg;
pub mod populate;
pub mod request;
pub mod state;
pub mod summary;

#[cfg(test)]
pub(crate) mod fake;

pub use console::Console;
pub use error::{ConsoleError, ValidationError};
pub use file_config::{FileAlternatives, FileConfigId, FileConfiguration, FileDescriptor};
pub use list::FileConfigList;
pub use mapping::{ColumnMapping, ColumnRole, DEFAULT_THRESHOLD};
pub use msg::Msg;
pub use request::validate_and_build;
pub use state::{Generation, ProcessingMode, SessionState, Update};
pub use summary::ProcessingSummary;
