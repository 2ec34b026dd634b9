//! # Core Error Types
//!
//! Errors raised by the ledger and by configuration loading.
//! Gate failures in the engines are not errors; they surface as `false`/`None`.

use thiserror::Error;

/// Errors that can occur in the core crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Attempted to remove more of an item than the ledger holds.
    #[error("insufficient items: need {required} of {item}, have {available}")]
    InsufficientItems {
        /// The item that was short.
        item: String,
        /// The amount required.
        required: u64,
        /// The amount available.
        available: u64,
    },

    /// A skill name did not match any known skill.
    #[error("unknown skill: {0}")]
    UnknownSkill(String),

    /// The XP threshold table is not a valid monotonic table.
    #[error("invalid xp table: {0}")]
    InvalidXpTable(String),

    /// The same identifier was declared twice.
    #[error("duplicate {kind} id: {id}")]
    DuplicateId {
        /// What kind of definition was duplicated.
        kind: &'static str,
        /// The duplicated identifier.
        id: String,
    },

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configuration file could not be read.
    #[error("failed to read {path}: {reason}")]
    Io {
        /// The path that failed.
        path: String,
        /// The underlying reason.
        reason: String,
    },
}

impl From<toml::de::Error> for CoreError {
    fn from(err: toml::de::Error) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Reads a UTF-8 file, mapping I/O failures onto [`CoreError::Io`].
///
/// # Errors
///
/// Returns [`CoreError::Io`] if the file cannot be read.
pub fn read_to_string(path: impl AsRef<std::path::Path>) -> CoreResult<String> {
    let path = path.as_ref();
    std::fs::read_to_string(path).map_err(|err| CoreError::Io {
        path: path.display().to_string(),
        reason: err.to_string(),
    })
}
