//! # IDLEFORGE Core
//!
//! State and progression primitives shared by every skill engine.
//!
//! ## Design Principles
//!
//! 1. **Level is derived** - XP is the only stored progression value
//! 2. **One action at a time** - the [`ActionSlot`] hands out generation tickets
//!    so stale completions can recognise themselves
//! 3. **No underflow** - the [`Inventory`] ledger refuses removals it cannot cover
//! 4. **External configuration** - item data is loaded from TOML files
//!
//! ## Example
//!
//! ```rust
//! use idleforge_core::{PlayerState, Skill, XpTable};
//!
//! let table = XpTable::standard();
//! let mut player = PlayerState::new();
//! player.add_xp(Skill::Mining, 200);
//! assert_eq!(player.level(&table, Skill::Mining), 3);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod action;
pub mod equipment;
pub mod error;
pub mod inventory;
pub mod items;
pub mod rng;
pub mod skill;
pub mod state;
pub mod time;
pub mod xp;

pub use action::{Action, ActionSlot, ActionSpec, ActionTicket};
pub use equipment::Equipment;
pub use error::{CoreError, CoreResult};
pub use inventory::{Inventory, InventorySnapshot};
pub use items::{base_item_id, EquipmentSpec, ItemCatalog, ItemDef, ItemKind, ToolSpec};
pub use rng::SkillRng;
pub use skill::{ItemId, Skill};
pub use state::{AfkSession, PlayerState, ToolBuff};
pub use time::{clamp_duration_ms, level_speed_multiplier, Millis};
pub use xp::{LevelProgress, XpTable, MAX_LEVEL};
