//! # Item Catalog
//!
//! Static item definitions. The skill engines only read three things from an
//! item: the declared speed of equipment, the tool spec of consumable tools,
//! and the item's type for validation.
//!
//! Inventory ids may carry a qualifier suffix (`iron_pickaxe@fine`); lookups
//! go through [`base_item_id`] so every qualified variant shares one
//! definition.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::skill::{ItemId, Skill};
use crate::time::Millis;

/// Separator between a base item id and its qualifier.
pub const QUALIFIER_SEPARATOR: char = '@';

/// Strips any qualifier suffix from an item id.
#[inline]
#[must_use]
pub fn base_item_id(item_id: &str) -> &str {
    item_id
        .split_once(QUALIFIER_SEPARATOR)
        .map_or(item_id, |(base, _)| base)
}

/// Equipment that speeds up actions when worn in its slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EquipmentSpec {
    /// Slot the item is worn in.
    pub slot: String,
    /// Declared base speed (1.0 = no bonus).
    #[serde(default = "default_speed")]
    pub speed: f64,
}

/// A consumable tool that grants a timed buff to one skill.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Skill the buff applies to.
    pub skill: Skill,
    /// Chance (0..=1) of one extra primary drop per finished action.
    #[serde(default)]
    pub chance: f64,
    /// Additive speed bonus for production actions of the skill.
    #[serde(default)]
    pub smelt_bonus: f64,
    /// How long one unit lasts.
    pub duration_ms: Millis,
}

/// Item type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemKind {
    /// Plain resource or product.
    Material,
    /// Secondary currency granted by gathering.
    Essence,
    /// Wearable gear.
    Equipment(EquipmentSpec),
    /// Consumable skill tool.
    Tool(ToolSpec),
}

/// An item definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemDef {
    /// Unique identifier.
    pub id: ItemId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Item type and type-specific data.
    #[serde(default = "default_kind")]
    pub kind: ItemKind,
}

impl ItemDef {
    /// Creates a plain material definition.
    #[must_use]
    pub fn material(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind: ItemKind::Material,
        }
    }

    /// Creates a tool definition.
    #[must_use]
    pub fn tool(id: &str, name: &str, spec: ToolSpec) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind: ItemKind::Tool(spec),
        }
    }

    /// Creates an equipment definition.
    #[must_use]
    pub fn equipment(id: &str, name: &str, slot: &str, speed: f64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind: ItemKind::Equipment(EquipmentSpec {
                slot: slot.to_string(),
                speed,
            }),
        }
    }

    /// Tool spec, if this item is a tool.
    #[must_use]
    pub fn as_tool(&self) -> Option<&ToolSpec> {
        match &self.kind {
            ItemKind::Tool(spec) => Some(spec),
            _ => None,
        }
    }

    /// Declared base speed, if this item is equipment.
    #[must_use]
    pub fn speed(&self) -> Option<f64> {
        match &self.kind {
            ItemKind::Equipment(spec) => Some(spec.speed),
            _ => None,
        }
    }
}

fn default_speed() -> f64 {
    1.0
}

fn default_kind() -> ItemKind {
    ItemKind::Material
}

/// Read-only item lookup.
#[derive(Clone, Debug, Default)]
pub struct ItemCatalog {
    items: HashMap<ItemId, ItemDef>,
}

#[derive(Deserialize)]
struct ItemFile {
    #[serde(default)]
    items: Vec<ItemDef>,
}

impl ItemCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from definitions.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateId`] if an id appears twice.
    pub fn from_defs(defs: impl IntoIterator<Item = ItemDef>) -> CoreResult<Self> {
        let mut catalog = Self::new();
        for def in defs {
            catalog.insert(def)?;
        }
        Ok(catalog)
    }

    /// Parses `[[items]]` tables from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] on malformed TOML and
    /// [`CoreError::DuplicateId`] on repeated ids.
    pub fn from_toml(source: &str) -> CoreResult<Self> {
        let file: ItemFile = toml::from_str(source)?;
        Self::from_defs(file.items)
    }

    /// Adds one definition.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateId`] if the id is already present.
    pub fn insert(&mut self, def: ItemDef) -> CoreResult<()> {
        if self.items.contains_key(&def.id) {
            return Err(CoreError::DuplicateId {
                kind: "item",
                id: def.id,
            });
        }
        self.items.insert(def.id.clone(), def);
        Ok(())
    }

    /// Looks up an item by (possibly qualified) id.
    #[must_use]
    pub fn get(&self, item_id: &str) -> Option<&ItemDef> {
        self.items.get(base_item_id(item_id))
    }

    /// Number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
