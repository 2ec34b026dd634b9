//! # Tool Buffs
//!
//! Consumable tools grant a timed buff to one skill: a chance at an extra
//! primary drop and an additive production speed bonus.
//!
//! Expiry is lazy. Nothing sweeps old buffs; readers compare `until` with
//! the current time, and an expired buff is overwritten the next time a tool
//! for that skill is equipped.

use idleforge_core::{base_item_id, ItemCatalog, Millis, PlayerState, Skill, SkillRng, ToolBuff};

use crate::error::{ToolError, ToolResult};

/// Consumes one `item_id` from the inventory and applies its buff.
///
/// Equipping the same tool while its buff is active extends `until` by the
/// tool's duration and keeps `started`; anything else replaces the skill's
/// buff with a fresh one starting at `now`.
///
/// # Errors
///
/// [`ToolError::BadType`] if the item is not a skill tool,
/// [`ToolError::NoInventory`] if none is owned.
pub fn equip_tool(state: &mut PlayerState, items: &ItemCatalog, item_id: &str, now: Millis) -> ToolResult<Skill> {
    let base = base_item_id(item_id);
    let spec = items
        .get(base)
        .and_then(idleforge_core::ItemDef::as_tool)
        .ok_or_else(|| ToolError::BadType(base.to_string()))?;

    if state.inventory.remove(item_id, 1).is_err() {
        return Err(ToolError::NoInventory(item_id.to_string()));
    }

    let skill = spec.skill;
    let stacked = match state.tool_buff(skill) {
        Some(buff) if buff.item_id == base && buff.is_active(now) => Some(ToolBuff {
            until: buff.until.saturating_add(spec.duration_ms),
            ..buff.clone()
        }),
        _ => None,
    };

    let buff = stacked.unwrap_or_else(|| ToolBuff {
        item_id: base.to_string(),
        chance: spec.chance,
        smelt_bonus: spec.smelt_bonus,
        started: now,
        until: now.saturating_add(spec.duration_ms),
    });

    tracing::debug!(%skill, item = base, until = buff.until, "tool equipped");
    state.set_tool_buff(skill, buff);
    Ok(skill)
}

/// The active buff of `skill`, if it has not expired.
#[must_use]
pub fn tool_effect_for(state: &PlayerState, skill: Skill, now: Millis) -> Option<&ToolBuff> {
    state.tool_buff(skill).filter(|b| b.is_active(now))
}

/// Rolls the active buff's extra-drop chance once.
pub fn roll_tool_double(state: &PlayerState, skill: Skill, rng: &mut SkillRng, now: Millis) -> bool {
    tool_effect_for(state, skill, now).is_some_and(|b| rng.chance(b.chance))
}
