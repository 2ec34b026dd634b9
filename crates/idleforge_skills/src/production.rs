//! # Production Skills
//!
//! **Transactional Recipe Crafting**
//!
//! Smithing, crafting, alchemy and engineering all turn inputs into outputs.
//!
//! 1. **Gated**: the recipe's required skill level must be met
//! 2. **Re-validated**: inputs are checked again when the action finishes,
//!    since the inventory may have changed while it was in flight
//! 3. **Transactional**: all inputs consumed and all outputs created, or
//!    nothing happens (inventory snapshot and rollback)
//!
//! Recipes are normalized once when the engine is built; callers only ever
//! see the normalized view.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use idleforge_core::{ItemId, Millis, PlayerState, Skill};

use crate::buffs;
use crate::engine::{ActionPlan, SkillEngine, SkillKind};

/// An item and a quantity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemQty {
    /// The item.
    pub item: ItemId,
    /// Quantity consumed or produced.
    pub qty: u64,
}

impl ItemQty {
    /// Creates an entry.
    #[must_use]
    pub fn new(item: &str, qty: u64) -> Self {
        Self {
            item: item.to_string(),
            qty,
        }
    }
}

/// XP granted to one skill.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpGrant {
    /// Receiving skill.
    pub skill: Skill,
    /// Amount.
    pub amount: u64,
}

/// A recipe as written in data files.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecipeDef {
    /// Unique id within the engine.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Required level of `req_skill`.
    #[serde(default)]
    pub level: u32,
    /// Duration at level 1.
    pub time_ms: Millis,
    /// Skill whose level gates the recipe.
    #[serde(default)]
    pub req_skill: Option<Skill>,
    /// Skill whose level speeds the recipe up.
    #[serde(default)]
    pub speed_skill: Option<Skill>,
    /// Consumed items.
    #[serde(default)]
    pub inputs: Vec<ItemQty>,
    /// Produced items.
    #[serde(default)]
    pub outputs: Vec<ItemQty>,
    /// XP granted on success.
    #[serde(default)]
    pub xp: Vec<XpGrant>,
}

impl RecipeDef {
    /// Creates a recipe without inputs, outputs or xp.
    #[must_use]
    pub fn new(id: &str, name: &str, level: u32, time_ms: Millis) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            level,
            time_ms,
            req_skill: None,
            speed_skill: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
            xp: Vec::new(),
        }
    }

    /// Adds an input.
    #[must_use]
    pub fn with_input(mut self, item: &str, qty: u64) -> Self {
        self.inputs.push(ItemQty::new(item, qty));
        self
    }

    /// Adds an output.
    #[must_use]
    pub fn with_output(mut self, item: &str, qty: u64) -> Self {
        self.outputs.push(ItemQty::new(item, qty));
        self
    }

    /// Adds an xp grant.
    #[must_use]
    pub fn with_xp(mut self, skill: Skill, amount: u64) -> Self {
        self.xp.push(XpGrant { skill, amount });
        self
    }

    /// Sets the gating skill.
    #[must_use]
    pub fn with_req_skill(mut self, skill: Skill) -> Self {
        self.req_skill = Some(skill);
        self
    }

    /// Sets the speed skill.
    #[must_use]
    pub fn with_speed_skill(mut self, skill: Skill) -> Self {
        self.speed_skill = Some(skill);
        self
    }
}

/// Normalized, read-only recipe view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recipe {
    /// Unique id.
    pub id: String,
    /// Display name (the id when none was given).
    pub name: String,
    /// Required level of `req_skill`.
    pub level: u32,
    /// Duration at level 1.
    pub time_ms: Millis,
    /// Gating skill.
    pub req_skill: Skill,
    /// Speed skill.
    pub speed_skill: Skill,
    /// Consumed items, zero quantities dropped and repeats merged.
    pub inputs: Vec<ItemQty>,
    /// Produced items, zero quantities dropped and repeats merged.
    pub outputs: Vec<ItemQty>,
    /// XP grants, zero amounts dropped.
    pub xp: Vec<XpGrant>,
}

impl Recipe {
    /// Normalizes a data-file recipe for an engine of `base_skill`.
    #[must_use]
    pub fn normalize(def: &RecipeDef, base_skill: Skill) -> Self {
        // Repeated items merge into the first entry.
        let keep = |entries: &[ItemQty]| -> Vec<ItemQty> {
            let mut merged: Vec<ItemQty> = Vec::with_capacity(entries.len());
            for entry in entries.iter().filter(|e| e.qty > 0) {
                match merged.iter_mut().find(|m| m.item == entry.item) {
                    Some(existing) => existing.qty = existing.qty.saturating_add(entry.qty),
                    None => merged.push(entry.clone()),
                }
            }
            merged
        };

        Self {
            id: def.id.clone(),
            name: if def.name.is_empty() {
                def.id.clone()
            } else {
                def.name.clone()
            },
            level: def.level,
            time_ms: def.time_ms,
            req_skill: def.req_skill.unwrap_or(base_skill),
            speed_skill: def.speed_skill.unwrap_or(base_skill),
            inputs: keep(&def.inputs),
            outputs: keep(&def.outputs),
            xp: def.xp.iter().filter(|g| g.amount > 0).cloned().collect(),
        }
    }
}

/// What one finished production action did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProductionOutcome {
    /// Recipe id.
    pub id: String,
    /// Recipe name.
    pub name: String,
    /// Items produced.
    pub outputs: Vec<ItemQty>,
    /// XP granted per skill.
    pub xp_gains: Vec<XpGrant>,
}

/// Production capability: a recipe map.
#[derive(Clone, Debug, Default)]
pub struct Production {
    recipes: BTreeMap<String, Recipe>,
}

impl Production {
    /// Normalizes `defs` for an engine of `base_skill`. Later duplicates
    /// replace earlier ones; the catalog loader rejects them beforehand.
    #[must_use]
    pub fn new(base_skill: Skill, defs: &[RecipeDef]) -> Self {
        let recipes = defs
            .iter()
            .map(|def| (def.id.clone(), Recipe::normalize(def, base_skill)))
            .collect();
        Self { recipes }
    }
}

impl SkillKind for Production {
    fn plan(
        &self,
        engine: &SkillEngine<Self>,
        state: &PlayerState,
        key: Option<&str>,
        now: Millis,
    ) -> Option<ActionPlan> {
        let recipe = self.recipes.get(key?)?;
        if !engine.can_make(state, &recipe.id, 1) {
            return None;
        }

        let extra_speed = buffs::tool_effect_for(state, recipe.speed_skill, now).map_or(0.0, |b| b.smelt_bonus);

        Some(ActionPlan {
            key: recipe.id.clone(),
            label: recipe.name.clone(),
            base_ms: recipe.time_ms,
            speed_skill: recipe.speed_skill,
            extra_speed,
            remember_selection: false,
        })
    }
}

impl SkillEngine<Production> {
    /// Normalized recipe by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Recipe> {
        self.kind.recipes.get(id)
    }

    /// All recipes, ordered by id.
    pub fn recipes(&self) -> impl Iterator<Item = &Recipe> {
        self.kind.recipes.values()
    }

    fn level_ok(&self, state: &PlayerState, recipe: &Recipe) -> bool {
        self.level_of(state, recipe.req_skill) >= recipe.level
    }

    /// How many times the recipe could run with the current inventory.
    ///
    /// Zero for unknown recipes, recipes without inputs, or when the level
    /// gate fails.
    #[must_use]
    pub fn max_craftable(&self, state: &PlayerState, id: &str) -> u64 {
        let Some(recipe) = self.get(id) else {
            return 0;
        };
        if recipe.inputs.is_empty() || !self.level_ok(state, recipe) {
            return 0;
        }

        recipe
            .inputs
            .iter()
            .map(|input| state.inventory.count(&input.item) / input.qty)
            .min()
            .unwrap_or(0)
    }

    /// True if the level gate passes and every input is owned `times` over.
    #[must_use]
    pub fn can_make(&self, state: &PlayerState, id: &str, times: u64) -> bool {
        let Some(recipe) = self.get(id) else {
            return false;
        };
        self.level_ok(state, recipe)
            && recipe
                .inputs
                .iter()
                .all(|input| state.inventory.has(&input.item, input.qty.saturating_mul(times)))
    }

    /// Completes `id` (or the in-flight action's recipe).
    ///
    /// Always clears the action slot. Returns `None` for an unknown recipe
    /// or when the inputs are no longer available; the inventory is then
    /// left exactly as it was.
    pub fn finish(&self, state: &mut PlayerState, id: Option<&str>) -> Option<ProductionOutcome> {
        let key = id
            .map(str::to_string)
            .or_else(|| self.current_key(state).map(str::to_string));
        state.action.clear();

        let recipe = key.as_deref().and_then(|k| self.get(k))?;
        if !self.can_make(state, &recipe.id, 1) {
            tracing::debug!(recipe = %recipe.id, "inputs no longer available");
            return None;
        }

        // Snapshot for rollback
        let snapshot = state.inventory.snapshot();
        for input in &recipe.inputs {
            if let Err(err) = state.inventory.remove(&input.item, input.qty) {
                tracing::warn!(recipe = %recipe.id, %err, "rolling back production");
                state.inventory.restore(snapshot);
                return None;
            }
        }
        for output in &recipe.outputs {
            state.inventory.add(&output.item, output.qty);
        }
        for grant in &recipe.xp {
            state.add_xp(grant.skill, grant.amount);
        }

        Some(ProductionOutcome {
            id: recipe.id.clone(),
            name: recipe.name.clone(),
            outputs: recipe.outputs.clone(),
            xp_gains: recipe.xp.clone(),
        })
    }

    /// Completes the in-flight action if this engine installed it.
    pub fn finish_one(&self, state: &mut PlayerState) -> Option<ProductionOutcome> {
        let key = self.current_key(state)?.to_string();
        self.finish(state, Some(&key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineConfig, SkillContext};
    use crate::scheduler::{run_until_idle, ActionHost, Scheduler};
    use idleforge_core::{ToolBuff, XpTable};

    #[derive(Default)]
    struct World {
        player: PlayerState,
        scheduler: Scheduler<World>,
        outcomes: Vec<Option<ProductionOutcome>>,
    }

    impl ActionHost for World {
        fn player(&self) -> &PlayerState {
            &self.player
        }

        fn scheduler_mut(&mut self) -> &mut Scheduler<Self> {
            &mut self.scheduler
        }
    }

    fn smithing() -> SkillEngine<Production> {
        let defs = [
            RecipeDef::new("bronze_bar", "Bronze Bar", 1, 3_000)
                .with_input("copper_ore", 1)
                .with_input("tin_ore", 1)
                .with_output("bronze_bar", 1)
                .with_xp(Skill::Smithing, 6),
            RecipeDef::new("plate", "Plate", 1, 2_000)
                .with_input("bar", 2)
                .with_input("dust", 0)
                .with_output("plate", 1)
                .with_xp(Skill::Smithing, 10)
                .with_xp(Skill::Crafting, 0),
            RecipeDef::new("steel_bar", "", 30, 5_000)
                .with_input("iron_ore", 1)
                .with_output("steel_bar", 1),
            RecipeDef::new("gift", "Gift", 1, 1_000).with_output("box", 1),
        ];
        SkillEngine::new(
            EngineConfig::new(Skill::Smithing, "smelt"),
            Production::new(Skill::Smithing, &defs),
            SkillContext::new(std::sync::Arc::new(XpTable::standard()), std::sync::Arc::default()),
        )
    }

    #[test]
    fn test_get_normalizes() {
        let engine = smithing();
        let plate = engine.get("plate").unwrap();
        assert_eq!(plate.inputs, vec![ItemQty::new("bar", 2)]);
        assert_eq!(plate.xp, vec![XpGrant { skill: Skill::Smithing, amount: 10 }]);
        assert_eq!(plate.req_skill, Skill::Smithing);
        assert_eq!(plate.speed_skill, Skill::Smithing);

        assert_eq!(engine.get("steel_bar").unwrap().name, "steel_bar");
        assert!(engine.get("mithril_bar").is_none());
    }

    #[test]
    fn test_repeated_inputs_merge() {
        let defs = [RecipeDef::new("rivets", "Rivets", 1, 1_000)
            .with_input("bar", 2)
            .with_input("bar", 2)
            .with_output("rivets", 10)];
        let engine = SkillEngine::new(
            EngineConfig::new(Skill::Smithing, "smelt"),
            Production::new(Skill::Smithing, &defs),
            SkillContext::new(std::sync::Arc::new(XpTable::standard()), std::sync::Arc::default()),
        );
        assert_eq!(engine.get("rivets").unwrap().inputs, vec![ItemQty::new("bar", 4)]);

        let mut state = PlayerState::new();
        state.inventory.add("bar", 5);
        assert_eq!(engine.max_craftable(&state, "rivets"), 1);
        assert!(!engine.can_make(&state, "rivets", 2));

        state.inventory.add("bar", 2);
        assert!(!engine.can_make(&state, "rivets", 2));
        state.inventory.add("bar", 1);
        assert!(engine.can_make(&state, "rivets", 2));
    }

    #[test]
    fn test_max_craftable_and_can_make() {
        let engine = smithing();
        let mut state = PlayerState::new();
        state.inventory.add("bar", 5);

        assert_eq!(engine.max_craftable(&state, "plate"), 2);
        assert!(!engine.can_make(&state, "plate", 3));
        assert!(engine.can_make(&state, "plate", 2));
    }

    #[test]
    fn test_max_craftable_bound() {
        let engine = smithing();
        let mut state = PlayerState::new();
        state.inventory.add("copper_ore", 7);
        state.inventory.add("tin_ore", 3);

        let n = engine.max_craftable(&state, "bronze_bar");
        assert_eq!(n, 3);
        assert!(engine.can_make(&state, "bronze_bar", n));
        assert!(!engine.can_make(&state, "bronze_bar", n + 1));
    }

    #[test]
    fn test_max_craftable_zero_cases() {
        let engine = smithing();
        let mut state = PlayerState::new();
        state.inventory.add("iron_ore", 10);

        assert_eq!(engine.max_craftable(&state, "gift"), 0, "no inputs");
        assert_eq!(engine.max_craftable(&state, "steel_bar"), 0, "level gate");
        assert!(!engine.can_make(&state, "steel_bar", 1));
        assert_eq!(engine.max_craftable(&state, "unknown"), 0);
    }

    #[test]
    fn test_start_rejects_without_inputs() {
        let engine = smithing();
        let mut world = World::default();

        assert!(!engine.start(&mut world.player, &mut world.scheduler, Some("bronze_bar"), |_: &mut World| {}));
        assert!(!engine.start(&mut world.player, &mut world.scheduler, None, |_: &mut World| {}));
        assert!(!world.player.action.is_busy());
        assert_eq!(world.scheduler.pending(), 0);
    }

    #[test]
    fn test_start_and_finish_one() {
        let engine = std::sync::Arc::new(smithing());
        let mut world = World::default();
        world.player.inventory.add("copper_ore", 1);
        world.player.inventory.add("tin_ore", 1);

        let e = std::sync::Arc::clone(&engine);
        assert!(engine.start(&mut world.player, &mut world.scheduler, Some("bronze_bar"), move |w: &mut World| {
            let outcome = e.finish_one(&mut w.player);
            w.outcomes.push(outcome);
        }));
        let action = world.player.action.current().unwrap();
        assert_eq!(action.kind, "smelt");
        assert_eq!(action.key, "bronze_bar");
        assert_eq!(action.label, "Bronze Bar");
        assert_eq!(action.duration_ms, 3_000);

        run_until_idle(&mut world);
        assert_eq!(world.outcomes.len(), 1);
        let outcome = world.outcomes[0].as_ref().unwrap();
        assert_eq!(outcome.xp_gains, vec![XpGrant { skill: Skill::Smithing, amount: 6 }]);
        assert_eq!(world.player.inventory.count("bronze_bar"), 1);
        assert_eq!(world.player.inventory.count("copper_ore"), 0);
        assert_eq!(world.player.xp(Skill::Smithing), 6);
        assert!(!world.player.action.is_busy());
    }

    #[test]
    fn test_finish_revalidates_inputs() {
        let engine = smithing();
        let mut world = World::default();
        world.player.inventory.add("copper_ore", 1);
        world.player.inventory.add("tin_ore", 1);

        assert!(engine.start(&mut world.player, &mut world.scheduler, Some("bronze_bar"), |_: &mut World| {}));
        // Consumed elsewhere while the action was in flight.
        world.player.inventory.remove("tin_ore", 1).unwrap();

        assert!(engine.finish(&mut world.player, None).is_none());
        assert!(!world.player.action.is_busy());
        assert_eq!(world.player.inventory.count("copper_ore"), 1, "nothing consumed");
        assert_eq!(world.player.inventory.count("bronze_bar"), 0);
        assert_eq!(world.player.xp(Skill::Smithing), 0);
    }

    #[test]
    fn test_finish_unknown_recipe_clears_action() {
        let engine = smithing();
        let mut world = World::default();
        world.player.inventory.add("bar", 2);

        assert!(engine.start(&mut world.player, &mut world.scheduler, Some("plate"), |_: &mut World| {}));
        assert!(engine.finish(&mut world.player, Some("nope")).is_none());
        assert!(!world.player.action.is_busy());
        assert_eq!(world.player.inventory.count("bar"), 2);
    }

    #[test]
    fn test_finish_one_ignores_foreign_action() {
        let engine = smithing();
        let mut state = PlayerState::new();
        state.inventory.add("bar", 2);
        state.action.install(idleforge_core::ActionSpec {
            kind: "mine".to_string(),
            skill: Skill::Mining,
            label: "plate".to_string(),
            key: "plate".to_string(),
            started_at: 0,
            duration_ms: 1_000,
        });

        assert!(engine.finish_one(&mut state).is_none());
        assert!(state.action.is_busy(), "foreign action left alone");
        assert_eq!(state.inventory.count("bar"), 2);
    }

    #[test]
    fn test_smelt_bonus_speeds_up() {
        let engine = smithing();
        let mut world = World::default();
        world.player.inventory.add("bar", 2);
        world.player.set_tool_buff(
            Skill::Smithing,
            ToolBuff {
                item_id: "flux".to_string(),
                chance: 0.0,
                smelt_bonus: 1.0,
                started: 0,
                until: 60_000,
            },
        );

        assert!(engine.start(&mut world.player, &mut world.scheduler, Some("plate"), |_: &mut World| {}));
        assert_eq!(world.player.action.current().unwrap().duration_ms, 1_000);
    }
}
