//! # Gathering Skills
//!
//! Mining, woodcutting, fishing and friends: pick a target, wait, receive
//! one primary drop plus independent bonus rolls.
//!
//! Target resolution always follows the same fallback chain:
//! explicit id, then the skill's previously selected target, then the first
//! target in the list.

use serde::{Deserialize, Serialize};

use idleforge_core::{ItemId, Millis, PlayerState, SkillRng};

use crate::buffs;
use crate::engine::{ActionPlan, SkillEngine, SkillKind};

/// The primary drop of a target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryDrop {
    /// Item granted.
    pub item: ItemId,
    /// Quantity granted per action.
    #[serde(default = "default_qty")]
    pub qty: u64,
}

/// A probabilistic extra drop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BonusDrop {
    /// Item granted.
    pub item: ItemId,
    /// Chance (0..=1) per action.
    pub chance: f64,
    /// Minimum quantity on success.
    #[serde(default = "default_qty")]
    pub min: u64,
    /// Maximum quantity on success (defaults to `min`).
    #[serde(default)]
    pub max: Option<u64>,
}

impl BonusDrop {
    /// Upper bound of the quantity roll.
    #[must_use]
    pub fn max_qty(&self) -> u64 {
        self.max.unwrap_or(self.min).max(self.min)
    }
}

fn default_qty() -> u64 {
    1
}

fn default_level() -> u32 {
    1
}

/// A gathering target (rock, tree, fishing spot).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetDef {
    /// Unique id within the engine.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Required level.
    #[serde(default = "default_level")]
    pub level: u32,
    /// Duration at level 1 without equipment.
    pub base_time_ms: Millis,
    /// Primary drop.
    pub drop: PrimaryDrop,
    /// XP per action.
    #[serde(default)]
    pub xp: u64,
    /// Independent extra drops.
    #[serde(default)]
    pub bonus_drops: Vec<BonusDrop>,
    /// Overrides the engine's essence chance.
    #[serde(default)]
    pub essence_chance: Option<f64>,
}

impl TargetDef {
    /// Creates a target with one primary drop and no bonuses.
    #[must_use]
    pub fn new(id: &str, level: u32, base_time_ms: Millis, drop_item: &str, xp: u64) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            level,
            base_time_ms,
            drop: PrimaryDrop {
                item: drop_item.to_string(),
                qty: 1,
            },
            xp,
            bonus_drops: Vec::new(),
            essence_chance: None,
        }
    }

    /// Adds a bonus drop.
    #[must_use]
    pub fn with_bonus(mut self, item: &str, chance: f64, min: u64, max: u64) -> Self {
        self.bonus_drops.push(BonusDrop {
            item: item.to_string(),
            chance,
            min,
            max: Some(max),
        });
        self
    }

    /// Sets the essence chance override.
    #[must_use]
    pub fn with_essence_chance(mut self, chance: f64) -> Self {
        self.essence_chance = Some(chance);
        self
    }
}

/// One granted bonus drop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BonusGrant {
    /// Item granted.
    pub id: ItemId,
    /// Quantity granted.
    pub qty: u64,
}

/// What one finished gathering action granted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatherOutcome {
    /// Target id.
    pub target: String,
    /// Primary drop item.
    pub drop_id: ItemId,
    /// Primary drop quantity.
    pub qty: u64,
    /// Essence units granted (0 or 1).
    pub essence: u64,
    /// Essence item, if the engine has one.
    pub essence_id: Option<ItemId>,
    /// Bonus drops that hit.
    pub bonuses: Vec<BonusGrant>,
    /// XP granted, extra tool drops included.
    pub xp: u64,
    /// Extra primary drops granted by a tool buff.
    pub double_count: u64,
}

/// Gathering capability: a target list and an optional essence.
#[derive(Clone, Debug, Default)]
pub struct Gathering {
    targets: Vec<TargetDef>,
    essence_id: Option<ItemId>,
    essence_chance: f64,
}

impl Gathering {
    /// Creates a kind over `targets`.
    #[must_use]
    pub fn new(targets: Vec<TargetDef>) -> Self {
        Self {
            targets,
            essence_id: None,
            essence_chance: 0.0,
        }
    }

    /// Sets the essence item and its default chance.
    #[must_use]
    pub fn with_essence(mut self, essence_id: &str, chance: f64) -> Self {
        self.essence_id = Some(essence_id.to_string());
        self.essence_chance = chance;
        self
    }

    fn find(&self, id: &str) -> Option<&TargetDef> {
        self.targets.iter().find(|t| t.id == id)
    }

    fn resolve(&self, state: &PlayerState, engine_skill: idleforge_core::Skill, id: Option<&str>) -> Option<&TargetDef> {
        if let Some(id) = id {
            if let Some(target) = self.find(id) {
                return Some(target);
            }
        }
        state
            .selected_target(engine_skill)
            .and_then(|selected| self.find(selected))
            .or_else(|| self.targets.first())
    }
}

impl SkillKind for Gathering {
    fn plan(
        &self,
        engine: &SkillEngine<Self>,
        state: &PlayerState,
        key: Option<&str>,
        _now: Millis,
    ) -> Option<ActionPlan> {
        let skill = engine.skill();
        let target = self.resolve(state, skill, key)?;
        if engine.level_of(state, skill) < target.level {
            return None;
        }

        Some(ActionPlan {
            key: target.id.clone(),
            label: target.name.clone(),
            base_ms: target.base_time_ms,
            speed_skill: skill,
            extra_speed: 0.0,
            remember_selection: true,
        })
    }
}

impl SkillEngine<Gathering> {
    /// All targets, in declaration order.
    #[must_use]
    pub fn list_targets(&self) -> &[TargetDef] {
        &self.kind.targets
    }

    /// Resolves a target through the fallback chain.
    #[must_use]
    pub fn resolve_target(&self, state: &PlayerState, target: Option<&str>) -> Option<&TargetDef> {
        self.kind.resolve(state, self.skill(), target)
    }

    /// True if the resolved target exists and its level requirement is met.
    #[must_use]
    pub fn can_do(&self, state: &PlayerState, target: Option<&str>) -> bool {
        self.resolve_target(state, target)
            .is_some_and(|t| self.level_of(state, self.skill()) >= t.level)
    }

    /// Completes the action for `target` (or for the in-flight action).
    ///
    /// Always clears the action slot. Returns `None` when no target resolves.
    pub fn finish(&self, state: &mut PlayerState, target: Option<&str>, rng: &mut SkillRng) -> Option<GatherOutcome> {
        let key = target
            .map(str::to_string)
            .or_else(|| self.current_key(state).map(str::to_string));
        state.action.clear();

        let Some(target) = key.as_deref().and_then(|k| self.kind.find(k)) else {
            tracing::debug!(skill = %self.skill(), key = key.as_deref().unwrap_or("<none>"), "nothing to finish");
            return None;
        };

        let qty = target.drop.qty;
        state.inventory.add(&target.drop.item, qty);

        let mut bonuses = Vec::new();
        for bonus in &target.bonus_drops {
            if rng.chance(bonus.chance) {
                let amount = rng.roll_qty(bonus.min, bonus.max_qty());
                if amount > 0 {
                    state.inventory.add(&bonus.item, amount);
                    bonuses.push(BonusGrant {
                        id: bonus.item.clone(),
                        qty: amount,
                    });
                }
            }
        }

        let mut essence = 0;
        if let Some(essence_id) = &self.kind.essence_id {
            let chance = target.essence_chance.unwrap_or(self.kind.essence_chance);
            if rng.chance(chance) {
                state.inventory.add(essence_id, 1);
                essence = 1;
            }
        }

        state.add_xp(self.skill(), target.xp);

        Some(GatherOutcome {
            target: target.id.clone(),
            drop_id: target.drop.item.clone(),
            qty,
            essence,
            essence_id: self.kind.essence_id.clone(),
            bonuses,
            xp: target.xp,
            double_count: 0,
        })
    }

    /// [`Self::finish`] followed by the skill's tool double roll.
    ///
    /// A hit grants one more unit of the primary drop and the target's xp
    /// again, reported through `double_count`.
    pub fn finish_with_tool(
        &self,
        state: &mut PlayerState,
        target: Option<&str>,
        rng: &mut SkillRng,
        now: Millis,
    ) -> Option<GatherOutcome> {
        let mut outcome = self.finish(state, target, rng)?;
        if buffs::roll_tool_double(state, self.skill(), rng, now) {
            let xp = self.kind.find(&outcome.target).map_or(0, |t| t.xp);
            state.inventory.add(&outcome.drop_id, 1);
            state.add_xp(self.skill(), xp);
            outcome.qty += 1;
            outcome.xp += xp;
            outcome.double_count += 1;
        }
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineConfig, SkillContext};
    use crate::scheduler::{run_until_idle, ActionHost, Scheduler};
    use idleforge_core::{ItemCatalog, ItemDef, Skill, ToolBuff, XpTable};
    use std::sync::Arc;

    #[derive(Default)]
    struct World {
        player: PlayerState,
        scheduler: Scheduler<World>,
        completions: u32,
    }

    impl ActionHost for World {
        fn player(&self) -> &PlayerState {
            &self.player
        }

        fn scheduler_mut(&mut self) -> &mut Scheduler<Self> {
            &mut self.scheduler
        }
    }

    fn mining() -> SkillEngine<Gathering> {
        let items = ItemCatalog::from_defs([ItemDef::equipment("bronze_pickaxe", "Bronze Pickaxe", "pickaxe", 1.25)]).unwrap();
        SkillEngine::new(
            EngineConfig::new(Skill::Mining, "mine").with_equipment_slot("pickaxe"),
            Gathering::new(vec![
                TargetDef::new("copper", 1, 2_500, "copper_ore", 18),
                TargetDef::new("iron", 15, 4_000, "iron_ore", 35).with_bonus("gem", 1.0, 1, 1),
            ])
            .with_essence("mining_essence", 0.0),
            SkillContext::new(Arc::new(XpTable::standard()), Arc::new(items)),
        )
    }

    #[test]
    fn test_list_targets() {
        let engine = mining();
        let ids: Vec<_> = engine.list_targets().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["copper", "iron"]);
    }

    #[test]
    fn test_resolution_fallbacks() {
        let engine = mining();
        let mut state = PlayerState::new();

        assert_eq!(engine.resolve_target(&state, None).unwrap().id, "copper");
        assert_eq!(engine.resolve_target(&state, Some("iron")).unwrap().id, "iron");

        state.set_selected_target(Skill::Mining, "iron");
        assert_eq!(engine.resolve_target(&state, None).unwrap().id, "iron");
        assert_eq!(engine.resolve_target(&state, Some("mithril")).unwrap().id, "iron");
    }

    #[test]
    fn test_can_do_gating() {
        let engine = mining();
        let mut state = PlayerState::new();
        assert!(engine.can_do(&state, Some("copper")));
        assert!(!engine.can_do(&state, Some("iron")));

        let table = XpTable::standard();
        state.add_xp(Skill::Mining, table.xp_for_level(15));
        assert!(engine.can_do(&state, Some("iron")));
    }

    #[test]
    fn test_base_duration_at_level_one() {
        let engine = mining();
        let mut world = World::default();

        assert!(engine.start(&mut world.player, &mut world.scheduler, Some("copper"), |w: &mut World| w.completions += 1));
        let action = world.player.action.current().unwrap();
        assert_eq!(action.duration_ms, 2_500);
        assert_eq!(action.ends_at, 2_500);
        assert_eq!(world.player.selected_target(Skill::Mining), Some("copper"));
    }

    #[test]
    fn test_equipment_shortens_duration() {
        let engine = mining();
        let mut state = PlayerState::new();
        state.equipment.equip("pickaxe", "bronze_pickaxe");
        assert_eq!(engine.duration_ms(&state, 2_500, Skill::Mining, 0.0), 2_000);
    }

    #[test]
    fn test_duration_floor() {
        let engine = mining();
        let mut state = PlayerState::new();
        state.equipment.set_speed_bonus("pickaxe", 100.0);
        assert_eq!(engine.duration_ms(&state, 2_500, Skill::Mining, 0.0), 600);
    }

    #[test]
    fn test_no_install_on_fail() {
        let engine = mining();
        let mut world = World::default();

        assert!(!engine.start(&mut world.player, &mut world.scheduler, Some("iron"), |w: &mut World| w.completions += 1));
        assert!(world.player.action.current().is_none());
        assert_eq!(world.scheduler.pending(), 0);
        assert_eq!(world.player.selected_target(Skill::Mining), None);
    }

    #[test]
    fn test_finish_grants_once() {
        let engine = Arc::new(mining());
        let mut world = World::default();
        let mut rng = SkillRng::seeded(3);

        let e = Arc::clone(&engine);
        assert!(engine.start(&mut world.player, &mut world.scheduler, Some("copper"), move |w: &mut World| {
            let mut rng = SkillRng::seeded(3);
            assert!(e.finish(&mut w.player, None, &mut rng).is_some());
            w.completions += 1;
        }));

        run_until_idle(&mut world);
        assert_eq!(world.completions, 1);
        assert_eq!(world.player.inventory.count("copper_ore"), 1);
        assert_eq!(world.player.xp(Skill::Mining), 18);
        assert!(world.player.action.current().is_none());

        // Nothing in flight: nothing more to grant.
        assert!(engine.finish(&mut world.player, None, &mut rng).is_none());
        assert_eq!(world.player.inventory.count("copper_ore"), 1);
    }

    #[test]
    fn test_restart_supersedes_completion() {
        let engine = mining();
        let mut world = World::default();

        assert!(engine.start(&mut world.player, &mut world.scheduler, Some("copper"), |w: &mut World| w.completions += 1));
        assert!(engine.start(&mut world.player, &mut world.scheduler, Some("copper"), |w: &mut World| w.completions += 10));

        run_until_idle(&mut world);
        assert_eq!(world.completions, 10);
    }

    #[test]
    fn test_finish_bonus_and_essence() {
        let engine = mining();
        let mut state = PlayerState::new();
        let mut rng = SkillRng::seeded(11);

        let outcome = engine.finish(&mut state, Some("iron"), &mut rng).unwrap();
        assert_eq!(outcome.bonuses, vec![BonusGrant { id: "gem".to_string(), qty: 1 }]);
        assert_eq!(outcome.essence, 0);
        assert_eq!(outcome.essence_id.as_deref(), Some("mining_essence"));
        assert_eq!(state.inventory.count("gem"), 1);
        assert_eq!(state.inventory.count("iron_ore"), 1);
    }

    fn essence_engine(default_chance: f64, target: TargetDef) -> SkillEngine<Gathering> {
        SkillEngine::new(
            EngineConfig::new(Skill::Mining, "mine"),
            Gathering::new(vec![target]).with_essence("mining_essence", default_chance),
            SkillContext::new(Arc::new(XpTable::standard()), Arc::new(ItemCatalog::new())),
        )
    }

    #[test]
    fn test_target_essence_chance_grants() {
        let engine = essence_engine(0.0, TargetDef::new("copper", 1, 2_500, "copper_ore", 18).with_essence_chance(1.0));
        let mut state = PlayerState::new();
        let mut rng = SkillRng::seeded(2);

        let outcome = engine.finish(&mut state, Some("copper"), &mut rng).unwrap();
        assert_eq!(outcome.essence, 1);
        assert_eq!(state.inventory.count("mining_essence"), 1);
    }

    #[test]
    fn test_target_essence_chance_overrides_default() {
        let engine = essence_engine(1.0, TargetDef::new("copper", 1, 2_500, "copper_ore", 18).with_essence_chance(0.0));
        let mut state = PlayerState::new();
        let mut rng = SkillRng::seeded(2);

        for _ in 0..20 {
            let outcome = engine.finish(&mut state, Some("copper"), &mut rng).unwrap();
            assert_eq!(outcome.essence, 0);
        }
        assert_eq!(state.inventory.count("mining_essence"), 0);

        // Without an override the engine default applies.
        let engine = essence_engine(1.0, TargetDef::new("tin", 1, 2_500, "tin_ore", 18));
        let outcome = engine.finish(&mut state, Some("tin"), &mut rng).unwrap();
        assert_eq!(outcome.essence, 1);
    }

    #[test]
    fn test_bonus_quantity_range() {
        let engine = essence_engine(0.0, TargetDef::new("copper", 1, 2_500, "copper_ore", 18).with_bonus("gem", 1.0, 2, 5));
        let mut state = PlayerState::new();
        let mut rng = SkillRng::seeded(21);

        let mut total = 0;
        for _ in 0..50 {
            let outcome = engine.finish(&mut state, Some("copper"), &mut rng).unwrap();
            assert_eq!(outcome.bonuses.len(), 1);
            let grant = &outcome.bonuses[0];
            assert_eq!(grant.id, "gem");
            assert!((2..=5).contains(&grant.qty), "rolled {}", grant.qty);
            total += grant.qty;
        }
        assert_eq!(state.inventory.count("gem"), total);
    }

    #[test]
    fn test_declared_drop_quantity() {
        let mut target = TargetDef::new("copper", 1, 2_500, "copper_ore", 18);
        target.drop.qty = 3;
        let engine = essence_engine(0.0, target);
        let mut state = PlayerState::new();

        let outcome = engine.finish(&mut state, Some("copper"), &mut SkillRng::seeded(1)).unwrap();
        assert_eq!(outcome.qty, 3);
        assert_eq!(state.inventory.count("copper_ore"), 3);
    }

    #[test]
    fn test_unknown_target_clears_action() {
        let engine = mining();
        let mut world = World::default();
        let mut rng = SkillRng::seeded(5);

        assert!(engine.start(&mut world.player, &mut world.scheduler, Some("copper"), |_: &mut World| {}));
        assert!(engine.finish(&mut world.player, Some("adamant"), &mut rng).is_none());
        assert!(world.player.action.current().is_none());
        assert!(world.player.inventory.is_empty());
    }

    #[test]
    fn test_tool_double() {
        let engine = mining();
        let mut state = PlayerState::new();
        let mut rng = SkillRng::seeded(8);
        state.set_tool_buff(
            Skill::Mining,
            ToolBuff {
                item_id: "charm".to_string(),
                chance: 1.0,
                smelt_bonus: 0.0,
                started: 0,
                until: 10_000,
            },
        );

        let outcome = engine.finish_with_tool(&mut state, Some("copper"), &mut rng, 5_000).unwrap();
        assert_eq!(outcome.double_count, 1);
        assert_eq!(outcome.qty, 2);
        assert_eq!(outcome.xp, 36);
        assert_eq!(state.inventory.count("copper_ore"), 2);
        assert_eq!(state.xp(Skill::Mining), 36);

        // Expired buff never rolls.
        let outcome = engine.finish_with_tool(&mut state, Some("copper"), &mut rng, 10_000).unwrap();
        assert_eq!(outcome.double_count, 0);
    }
}
