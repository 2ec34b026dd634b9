//! # Skill Engine
//!
//! One generic engine, parametrized over a [`SkillKind`].
//!
//! The engine owns everything the two families of skills share: level
//! gating, the duration formula and installing a timed action with a guarded
//! completion. A kind only has to turn "what the caller asked for" into an
//! [`ActionPlan`]; the kind-specific operations (drops, recipes) live in
//! `impl SkillEngine<Gathering>` and `impl SkillEngine<Production>`.
//!
//! ```text
//! duration = max(floor, base / (equipment_speed * (1 + scale * (level - 1) + extra)))
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use idleforge_core::{
    clamp_duration_ms, level_speed_multiplier, ActionSpec, ItemCatalog, Millis, PlayerState, Skill,
    XpTable,
};

use crate::scheduler::Scheduler;

/// Default lower bound on an action's duration.
pub const DEFAULT_MIN_DURATION_MS: Millis = 600;

/// Default speed gained per level above 1.
pub const DEFAULT_LEVEL_SPEED_SCALE: f64 = 0.01;

/// Settings shared by every engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Skill that levels up.
    pub skill: Skill,
    /// Action-type tag written into installed actions.
    pub action_kind: String,
    /// Equipment slot whose speed applies.
    #[serde(default)]
    pub equipment_slot: Option<String>,
    /// Lower bound on duration.
    #[serde(default = "default_min_duration")]
    pub min_duration_ms: Millis,
    /// Speed gained per level above 1.
    #[serde(default = "default_level_speed_scale")]
    pub level_speed_scale: f64,
}

fn default_min_duration() -> Millis {
    DEFAULT_MIN_DURATION_MS
}

fn default_level_speed_scale() -> f64 {
    DEFAULT_LEVEL_SPEED_SCALE
}

impl EngineConfig {
    /// Creates a config with default floor and scale and no equipment slot.
    #[must_use]
    pub fn new(skill: Skill, action_kind: &str) -> Self {
        Self {
            skill,
            action_kind: action_kind.to_string(),
            equipment_slot: None,
            min_duration_ms: DEFAULT_MIN_DURATION_MS,
            level_speed_scale: DEFAULT_LEVEL_SPEED_SCALE,
        }
    }

    /// Sets the equipment slot.
    #[must_use]
    pub fn with_equipment_slot(mut self, slot: &str) -> Self {
        self.equipment_slot = Some(slot.to_string());
        self
    }

    /// Sets the duration floor.
    #[must_use]
    pub const fn with_min_duration(mut self, floor_ms: Millis) -> Self {
        self.min_duration_ms = floor_ms;
        self
    }

    /// Sets the per-level speed scale.
    #[must_use]
    pub fn with_level_speed_scale(mut self, scale: f64) -> Self {
        self.level_speed_scale = scale;
        self
    }
}

/// Read-only data every engine consults.
#[derive(Clone, Debug, Default)]
pub struct SkillContext {
    /// XP -> level table.
    pub xp_table: Arc<XpTable>,
    /// Item definitions (equipment speed, tools).
    pub items: Arc<ItemCatalog>,
}

impl SkillContext {
    /// Bundles a table and a catalog.
    #[must_use]
    pub fn new(xp_table: Arc<XpTable>, items: Arc<ItemCatalog>) -> Self {
        Self { xp_table, items }
    }
}

/// What a kind wants installed.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionPlan {
    /// Target or recipe id.
    pub key: String,
    /// Display label.
    pub label: String,
    /// Duration before speed modifiers.
    pub base_ms: Millis,
    /// Skill whose level drives the speed multiplier.
    pub speed_skill: Skill,
    /// Additive bonus on the level multiplier.
    pub extra_speed: f64,
    /// Remember `key` as the skill's selected target.
    pub remember_selection: bool,
}

/// The capability that distinguishes engine families.
pub trait SkillKind: Send + Sync + 'static {
    /// Resolves and gates the requested key. `None` means the action cannot
    /// start.
    fn plan(
        &self,
        engine: &SkillEngine<Self>,
        state: &PlayerState,
        key: Option<&str>,
        now: Millis,
    ) -> Option<ActionPlan>
    where
        Self: Sized;
}

/// A timed skill engine.
#[derive(Debug)]
pub struct SkillEngine<K> {
    config: EngineConfig,
    context: SkillContext,
    pub(crate) kind: K,
}

impl<K: SkillKind> SkillEngine<K> {
    /// Creates an engine.
    #[must_use]
    pub fn new(config: EngineConfig, kind: K, context: SkillContext) -> Self {
        Self {
            config,
            context,
            kind,
        }
    }

    /// Engine settings.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Skill this engine levels.
    #[inline]
    #[must_use]
    pub fn skill(&self) -> Skill {
        self.config.skill
    }

    /// Action-type tag.
    #[inline]
    #[must_use]
    pub fn action_kind(&self) -> &str {
        &self.config.action_kind
    }

    /// Shared read-only data.
    #[inline]
    #[must_use]
    pub fn context(&self) -> &SkillContext {
        &self.context
    }

    /// Derived level of `skill` for this player.
    #[inline]
    #[must_use]
    pub fn level_of(&self, state: &PlayerState, skill: Skill) -> u32 {
        state.level(&self.context.xp_table, skill)
    }

    /// Equipment speed of this engine's slot (1.0 without a slot).
    #[must_use]
    pub fn equipment_speed(&self, state: &PlayerState) -> f64 {
        self.config
            .equipment_slot
            .as_deref()
            .map_or(1.0, |slot| state.equipment.speed_for_slot(slot, &self.context.items))
    }

    /// Duration of an action with `base_ms` for this player.
    #[must_use]
    pub fn duration_ms(&self, state: &PlayerState, base_ms: Millis, speed_skill: Skill, extra_speed: f64) -> Millis {
        let level = self.level_of(state, speed_skill);
        let multiplier = level_speed_multiplier(level, self.config.level_speed_scale) + extra_speed;
        let speed = self.equipment_speed(state) * multiplier;
        clamp_duration_ms(self.config.min_duration_ms, base_ms as f64 / speed)
    }

    /// The plan `start` would install, without installing it.
    #[must_use]
    pub fn plan(&self, state: &PlayerState, key: Option<&str>, now: Millis) -> Option<ActionPlan> {
        self.kind.plan(self, state, key, now)
    }

    /// Starts a timed action.
    ///
    /// Returns `false` and leaves the state untouched when the key cannot be
    /// resolved or is gated. Otherwise installs a new action (superseding any
    /// in flight) and schedules `on_done` to run at completion, provided the
    /// action is still current then.
    pub fn start<W>(
        &self,
        state: &mut PlayerState,
        scheduler: &mut Scheduler<W>,
        key: Option<&str>,
        on_done: impl FnOnce(&mut W) + Send + 'static,
    ) -> bool {
        let now = scheduler.now();
        let Some(plan) = self.plan(state, key, now) else {
            tracing::debug!(
                skill = %self.config.skill,
                key = key.unwrap_or("<default>"),
                "action not started"
            );
            return false;
        };

        let duration_ms = self.duration_ms(state, plan.base_ms, plan.speed_skill, plan.extra_speed);

        if plan.remember_selection {
            state.set_selected_target(self.config.skill, &plan.key);
        }

        let ticket = state.action.install(ActionSpec {
            kind: self.config.action_kind.clone(),
            skill: self.config.skill,
            label: plan.label,
            key: plan.key,
            started_at: now,
            duration_ms,
        });
        scheduler.schedule_guarded(duration_ms, ticket, on_done);

        tracing::trace!(
            skill = %self.config.skill,
            generation = ticket.generation(),
            duration_ms,
            "action installed"
        );
        true
    }

    /// Key of the in-flight action if this engine installed it.
    #[must_use]
    pub fn current_key<'s>(&self, state: &'s PlayerState) -> Option<&'s str> {
        state
            .action
            .current()
            .filter(|a| a.is_kind(&self.config.action_kind) && a.skill == self.config.skill)
            .map(|a| a.key.as_str())
    }
}
