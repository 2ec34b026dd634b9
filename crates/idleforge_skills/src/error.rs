//! # Skill Errors
//!
//! Only tool equipping reports a reason. Engine gate failures surface as
//! `false`/`None` and catalog loading reuses [`idleforge_core::CoreError`].

use thiserror::Error;

/// Why a tool could not be equipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// The item is unknown or is not a tool for a skill.
    #[error("{0} is not a skill tool")]
    BadType(String),

    /// None of the item is owned.
    #[error("no {0} in inventory")]
    NoInventory(String),
}

/// Result type for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;
