//! # Skill Catalog
//!
//! Loads items, gathering engines and production engines from one TOML
//! document and validates them before any engine is built:
//!
//! - at most one engine per skill, across both families
//! - unique target ids within a gathering engine
//! - unique recipe ids within a production engine
//! - every recipe produces something
//!
//! ```toml
//! [[items]]
//! id = "copper_ore"
//!
//! [[gathering]]
//! skill = "mining"
//! action_kind = "mine"
//! equipment_slot = "pickaxe"
//!
//! [[gathering.targets]]
//! id = "copper"
//! base_time_ms = 2500
//! drop = { item = "copper_ore" }
//! xp = 18
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use idleforge_core::{CoreError, CoreResult, ItemCatalog, ItemDef, ItemId, Millis, Skill, XpTable};

use crate::engine::{EngineConfig, SkillContext, SkillEngine, DEFAULT_LEVEL_SPEED_SCALE, DEFAULT_MIN_DURATION_MS};
use crate::gathering::{Gathering, TargetDef};
use crate::production::{Production, RecipeDef};

/// A gathering engine as written in data files.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GatheringSpec {
    /// Skill that levels up.
    pub skill: Skill,
    /// Action-type tag.
    pub action_kind: String,
    /// Equipment slot whose speed applies.
    #[serde(default)]
    pub equipment_slot: Option<String>,
    /// Duration floor.
    #[serde(default = "default_min_duration")]
    pub min_duration_ms: Millis,
    /// Speed gained per level above 1.
    #[serde(default = "default_level_speed_scale")]
    pub level_speed_scale: f64,
    /// Essence item granted by lucky actions.
    #[serde(default)]
    pub essence_id: Option<ItemId>,
    /// Default essence chance.
    #[serde(default)]
    pub essence_chance: f64,
    /// Targets in display order.
    #[serde(default)]
    pub targets: Vec<TargetDef>,
}

/// A production engine as written in data files.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductionSpec {
    /// Skill that levels up.
    pub skill: Skill,
    /// Action-type tag.
    pub action_kind: String,
    /// Equipment slot whose speed applies.
    #[serde(default)]
    pub equipment_slot: Option<String>,
    /// Duration floor.
    #[serde(default = "default_min_duration")]
    pub min_duration_ms: Millis,
    /// Speed gained per level above 1.
    #[serde(default = "default_level_speed_scale")]
    pub level_speed_scale: f64,
    /// Recipes.
    #[serde(default)]
    pub recipes: Vec<RecipeDef>,
}

fn default_min_duration() -> Millis {
    DEFAULT_MIN_DURATION_MS
}

fn default_level_speed_scale() -> f64 {
    DEFAULT_LEVEL_SPEED_SCALE
}

fn engine_config(
    skill: Skill,
    action_kind: &str,
    equipment_slot: Option<&str>,
    min_duration_ms: Millis,
    level_speed_scale: f64,
) -> EngineConfig {
    let config = EngineConfig::new(skill, action_kind)
        .with_min_duration(min_duration_ms)
        .with_level_speed_scale(level_speed_scale);
    match equipment_slot {
        Some(slot) => config.with_equipment_slot(slot),
        None => config,
    }
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    xp_thresholds: Option<Vec<u64>>,
    #[serde(default)]
    items: Vec<ItemDef>,
    #[serde(default)]
    gathering: Vec<GatheringSpec>,
    #[serde(default)]
    production: Vec<ProductionSpec>,
}

/// Every engine of a game, sharing one XP table and one item catalog.
#[derive(Debug, Default)]
pub struct Catalog {
    context: SkillContext,
    gathering: BTreeMap<Skill, Arc<SkillEngine<Gathering>>>,
    production: BTreeMap<Skill, Arc<SkillEngine<Production>>>,
}

impl Catalog {
    /// Creates a catalog without engines.
    #[must_use]
    pub fn new(context: SkillContext) -> Self {
        Self {
            context,
            gathering: BTreeMap::new(),
            production: BTreeMap::new(),
        }
    }

    /// Parses and validates a catalog document.
    ///
    /// Uses the standard XP curve unless the document sets `xp_thresholds`.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidConfig`] for malformed TOML or recipes without
    /// outputs, [`CoreError::DuplicateId`] for repeated ids or skills,
    /// [`CoreError::InvalidXpTable`] for a bad threshold list.
    pub fn from_toml(source: &str) -> CoreResult<Self> {
        let file: CatalogFile = toml::from_str(source)?;

        let xp_table = match file.xp_thresholds {
            Some(thresholds) => XpTable::from_thresholds(thresholds)?,
            None => XpTable::standard(),
        };
        let items = ItemCatalog::from_defs(file.items)?;
        let mut catalog = Self::new(SkillContext::new(Arc::new(xp_table), Arc::new(items)));

        for spec in file.gathering {
            catalog.add_gathering_spec(spec)?;
        }
        for spec in file.production {
            catalog.add_production_spec(spec)?;
        }

        tracing::info!(
            "Catalog loaded: {} items, {} gathering engines, {} production engines",
            catalog.context.items.len(),
            catalog.gathering.len(),
            catalog.production.len()
        );
        Ok(catalog)
    }

    /// Reads and parses a catalog file.
    ///
    /// # Errors
    ///
    /// [`CoreError::Io`] if the file cannot be read, otherwise as
    /// [`Self::from_toml`].
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let source = idleforge_core::error::read_to_string(path)?;
        Self::from_toml(&source)
    }

    /// Validates and adds a gathering engine.
    ///
    /// # Errors
    ///
    /// [`CoreError::DuplicateId`] for a repeated target id or an already
    /// configured skill, [`CoreError::InvalidConfig`] for a target that drops
    /// nothing.
    pub fn add_gathering_spec(&mut self, spec: GatheringSpec) -> CoreResult<()> {
        self.check_skill_free(spec.skill)?;
        check_unique("target", spec.targets.iter().map(|t| t.id.as_str()))?;

        if let Some(empty) = spec.targets.iter().find(|t| t.drop.qty == 0) {
            return Err(CoreError::InvalidConfig(format!(
                "target {} must drop at least one {}",
                empty.id, empty.drop.item
            )));
        }

        let config = engine_config(
            spec.skill,
            &spec.action_kind,
            spec.equipment_slot.as_deref(),
            spec.min_duration_ms,
            spec.level_speed_scale,
        );
        let mut kind = Gathering::new(spec.targets);
        if let Some(essence_id) = &spec.essence_id {
            kind = kind.with_essence(essence_id, spec.essence_chance);
        }

        self.gathering.insert(
            spec.skill,
            Arc::new(SkillEngine::new(config, kind, self.context.clone())),
        );
        Ok(())
    }

    /// Validates and adds a production engine.
    ///
    /// # Errors
    ///
    /// [`CoreError::DuplicateId`] for a repeated recipe id or an already
    /// configured skill, [`CoreError::InvalidConfig`] for a recipe that
    /// produces nothing.
    pub fn add_production_spec(&mut self, spec: ProductionSpec) -> CoreResult<()> {
        self.check_skill_free(spec.skill)?;
        check_unique("recipe", spec.recipes.iter().map(|r| r.id.as_str()))?;

        if let Some(empty) = spec.recipes.iter().find(|r| r.outputs.iter().all(|o| o.qty == 0)) {
            return Err(CoreError::InvalidConfig(format!(
                "recipe {} must have at least one output",
                empty.id
            )));
        }

        let config = engine_config(
            spec.skill,
            &spec.action_kind,
            spec.equipment_slot.as_deref(),
            spec.min_duration_ms,
            spec.level_speed_scale,
        );
        let kind = Production::new(spec.skill, &spec.recipes);

        self.production.insert(
            spec.skill,
            Arc::new(SkillEngine::new(config, kind, self.context.clone())),
        );
        Ok(())
    }

    fn check_skill_free(&self, skill: Skill) -> CoreResult<()> {
        if self.gathering.contains_key(&skill) || self.production.contains_key(&skill) {
            return Err(CoreError::DuplicateId {
                kind: "engine",
                id: skill.to_string(),
            });
        }
        Ok(())
    }

    /// Shared table and items.
    #[must_use]
    pub fn context(&self) -> &SkillContext {
        &self.context
    }

    /// Item definitions.
    #[must_use]
    pub fn items(&self) -> &ItemCatalog {
        &self.context.items
    }

    /// XP table.
    #[must_use]
    pub fn xp_table(&self) -> &XpTable {
        &self.context.xp_table
    }

    /// Gathering engine of `skill`.
    #[must_use]
    pub fn gathering(&self, skill: Skill) -> Option<&Arc<SkillEngine<Gathering>>> {
        self.gathering.get(&skill)
    }

    /// Production engine of `skill`.
    #[must_use]
    pub fn production(&self, skill: Skill) -> Option<&Arc<SkillEngine<Production>>> {
        self.production.get(&skill)
    }

    /// All gathering engines, ordered by skill.
    pub fn gathering_engines(&self) -> impl Iterator<Item = &Arc<SkillEngine<Gathering>>> {
        self.gathering.values()
    }

    /// All production engines, ordered by skill.
    pub fn production_engines(&self) -> impl Iterator<Item = &Arc<SkillEngine<Production>>> {
        self.production.values()
    }
}

fn check_unique<'a>(kind: &'static str, ids: impl Iterator<Item = &'a str>) -> CoreResult<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(CoreError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}
