//! # IDLEFORGE Skills
//!
//! **Timed skill engines over a single logical clock**
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   start()    ┌──────────────┐   due    ┌──────────────┐
//! │ SkillEngine  │─────────────>│  Scheduler   │─────────>│  on_done()   │
//! │ <Gathering>  │  install +   │ (timer heap) │  ticket  │  finish()    │
//! │ <Production> │  guard       └──────────────┘  current?└──────────────┘
//! └──────────────┘                                  │ no
//!                                                   └──> dropped
//! ```
//!
//! - [`scheduler`]: timer queue and the generation guard
//! - [`engine`]: shared gating, duration formula and action install
//! - [`gathering`] / [`production`]: the two engine families
//! - [`buffs`]: consumable tool buffs
//! - [`catalog`]: TOML loading and validation
//!
//! ## Example
//!
//! ```rust
//! use idleforge_core::{PlayerState, Skill};
//! use idleforge_skills::catalog::Catalog;
//!
//! let catalog = Catalog::from_toml(r#"
//!     [[gathering]]
//!     skill = "woodcutting"
//!     action_kind = "chop"
//!     targets = [{ id = "oak", base_time_ms = 2500, drop = { item = "oak_log" }, xp = 25 }]
//! "#).unwrap();
//!
//! let engine = catalog.gathering(Skill::Woodcutting).unwrap();
//! let state = PlayerState::new();
//! assert!(engine.can_do(&state, Some("oak")));
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod buffs;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod gathering;
pub mod production;
pub mod scheduler;

pub use buffs::{equip_tool, roll_tool_double, tool_effect_for};
pub use catalog::{Catalog, GatheringSpec, ProductionSpec};
pub use engine::{ActionPlan, EngineConfig, SkillContext, SkillEngine, SkillKind};
pub use error::{ToolError, ToolResult};
pub use gathering::{BonusDrop, BonusGrant, GatherOutcome, Gathering, PrimaryDrop, TargetDef};
pub use production::{ItemQty, Production, ProductionOutcome, Recipe, RecipeDef, XpGrant};
pub use scheduler::{fire_next, run_until, run_until_idle, ActionHost, Scheduler, TimerFn};
