//! # Runtime Error Types

use idleforge_core::{CoreError, Skill};
use thiserror::Error;

/// Errors that can occur in the runtime.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// Catalog or runtime configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] CoreError),

    /// No engine of the requested family is configured for the skill.
    #[error("no {family} engine for {skill}")]
    NoEngine {
        /// `"gathering"` or `"production"`.
        family: &'static str,
        /// The requested skill.
        skill: Skill,
    },
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
