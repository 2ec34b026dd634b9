//! # IDLEFORGE Runtime
//!
//! Sessions, AFK automation and notifications on top of the skill engines.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use idleforge_core::Skill;
//! use idleforge_runtime::{RuntimeConfig, Session, SkillEvent};
//! use idleforge_skills::Catalog;
//!
//! let catalog = Catalog::from_toml(r#"
//!     [[gathering]]
//!     skill = "mining"
//!     action_kind = "mine"
//!     targets = [{ id = "copper", base_time_ms = 2500, drop = { item = "copper_ore" }, xp = 18 }]
//! "#).unwrap();
//!
//! let mut session = Session::new(Arc::new(catalog), RuntimeConfig::default().with_seed(1));
//! let events = session.subscribe();
//!
//! session.start_afk(Skill::Mining, Some("copper"));
//! session.advance_by(10_000);
//!
//! assert_eq!(session.player.inventory.count("copper_ore"), 4);
//! assert!(matches!(events.try_recv(), Some(SkillEvent::AfkStarted { .. })));
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod afk;
pub mod config;
pub mod drivers;
pub mod error;
pub mod events;
pub mod realtime;
pub mod session;

pub use config::RuntimeConfig;
pub use drivers::{DoneFn, Driver, DriverRegistry, GatheringDriver, ProductionDriver};
pub use error::{RuntimeError, RuntimeResult};
pub use events::{CycleDetail, EndReason, EventBus, EventReceiver, SkillEvent};
pub use realtime::{DriverStats, RealtimeDriver, SessionHandle};
pub use session::Session;
