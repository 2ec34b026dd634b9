//! # Runtime Configuration
//!
//! Session and automation timing, loaded from TOML. Every field has a
//! default, so an empty document is a valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use idleforge_core::{CoreResult, Millis};

/// Default AFK session length: 30 minutes.
pub const DEFAULT_AFK_SESSION_MS: Millis = 30 * 60 * 1_000;

/// Default retry delay while another action is in flight.
pub const DEFAULT_BUSY_BACKOFF_MS: Millis = 250;

/// Default retry delay after a driver could not start.
pub const DEFAULT_NOT_READY_BACKOFF_MS: Millis = 2_000;

/// Default per-subscriber channel capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Session and automation settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// How long an AFK session runs before it ends on its own.
    pub afk_session_ms: Millis,
    /// Retry delay while a foreign action is in flight.
    pub busy_backoff_ms: Millis,
    /// Retry delay after a driver reports it cannot start.
    pub not_ready_backoff_ms: Millis,
    /// Capacity of each subscriber's channel.
    pub event_capacity: usize,
    /// Fixed RNG seed; wall-clock seeded when absent.
    pub rng_seed: Option<u64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            afk_session_ms: DEFAULT_AFK_SESSION_MS,
            busy_backoff_ms: DEFAULT_BUSY_BACKOFF_MS,
            not_ready_backoff_ms: DEFAULT_NOT_READY_BACKOFF_MS,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            rng_seed: None,
        }
    }
}

impl RuntimeConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// [`idleforge_core::CoreError::InvalidConfig`] on malformed TOML.
    pub fn from_toml(source: &str) -> CoreResult<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// [`idleforge_core::CoreError::Io`] if unreadable, otherwise as
    /// [`Self::from_toml`].
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        Self::from_toml(&idleforge_core::error::read_to_string(path)?)
    }

    /// Sets the RNG seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }
}
