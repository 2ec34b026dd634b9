//! # Player State
//!
//! Everything the engines mutate for one player. XP is the only stored
//! progression value; levels are always derived through an [`XpTable`].

use std::collections::HashMap;

use crate::action::ActionSlot;
use crate::equipment::Equipment;
use crate::inventory::Inventory;
use crate::skill::{ItemId, Skill};
use crate::time::Millis;
use crate::xp::XpTable;

/// A timed consumable modifier for one skill.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolBuff {
    /// Base id of the tool that granted the buff.
    pub item_id: ItemId,
    /// Chance of an extra primary drop per finished action.
    pub chance: f64,
    /// Additive production speed bonus.
    pub smelt_bonus: f64,
    /// When the buff was first applied.
    pub started: Millis,
    /// When the buff stops applying.
    pub until: Millis,
}

impl ToolBuff {
    /// True while `until` lies in the future.
    #[inline]
    #[must_use]
    pub fn is_active(&self, now: Millis) -> bool {
        self.until > now
    }
}

/// An automation session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AfkSession {
    /// Monotonic session id; timers of replaced sessions compare against it.
    pub id: u64,
    /// Automated skill.
    pub skill: Skill,
    /// Target or recipe the driver is asked to run.
    pub target_id: Option<String>,
    /// Session start.
    pub started_at: Millis,
    /// Session expiry.
    pub end_at: Millis,
}

impl AfkSession {
    /// True once `now` reaches `end_at`.
    #[inline]
    #[must_use]
    pub fn is_expired(&self, now: Millis) -> bool {
        now >= self.end_at
    }
}

/// Mutable per-player record.
#[derive(Clone, Debug, Default)]
pub struct PlayerState {
    xp: HashMap<Skill, u64>,
    selected: HashMap<Skill, String>,
    buffs: HashMap<Skill, ToolBuff>,
    afk: Option<AfkSession>,
    /// Owned items.
    pub inventory: Inventory,
    /// The single in-flight action.
    pub action: ActionSlot,
    /// Worn items and slot modifiers.
    pub equipment: Equipment,
}

impl PlayerState {
    /// Creates a fresh player with no xp and an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulated xp of `skill`.
    #[inline]
    #[must_use]
    pub fn xp(&self, skill: Skill) -> u64 {
        self.xp.get(&skill).copied().unwrap_or(0)
    }

    /// Adds xp to `skill`.
    pub fn add_xp(&mut self, skill: Skill, amount: u64) {
        if amount == 0 {
            return;
        }
        let counter = self.xp.entry(skill).or_insert(0);
        *counter = counter.saturating_add(amount);
    }

    /// Derived level of `skill`.
    #[inline]
    #[must_use]
    pub fn level(&self, table: &XpTable, skill: Skill) -> u32 {
        table.level_for(self.xp(skill))
    }

    /// Last target chosen for `skill`.
    #[must_use]
    pub fn selected_target(&self, skill: Skill) -> Option<&str> {
        self.selected.get(&skill).map(String::as_str)
    }

    /// Remembers the target chosen for `skill`.
    pub fn set_selected_target(&mut self, skill: Skill, target_id: &str) {
        self.selected.insert(skill, target_id.to_string());
    }

    /// Stored buff of `skill`, expired or not.
    #[must_use]
    pub fn tool_buff(&self, skill: Skill) -> Option<&ToolBuff> {
        self.buffs.get(&skill)
    }

    /// Stores a buff for `skill`, replacing any previous one.
    pub fn set_tool_buff(&mut self, skill: Skill, buff: ToolBuff) {
        self.buffs.insert(skill, buff);
    }

    /// Drops the buff of `skill`.
    pub fn remove_tool_buff(&mut self, skill: Skill) -> Option<ToolBuff> {
        self.buffs.remove(&skill)
    }

    /// The automation session, if any.
    #[must_use]
    pub fn afk_session(&self) -> Option<&AfkSession> {
        self.afk.as_ref()
    }

    /// Installs a session and returns the one it replaced.
    pub fn replace_afk(&mut self, session: AfkSession) -> Option<AfkSession> {
        self.afk.replace(session)
    }

    /// Removes the session.
    pub fn take_afk(&mut self) -> Option<AfkSession> {
        self.afk.take()
    }
}
