//! # Equipment
//!
//! Slot -> item mapping plus additive per-slot speed modifiers.

use std::collections::HashMap;

use crate::items::ItemCatalog;
use crate::skill::ItemId;

/// Lowest equipment speed the engines will use.
pub const MIN_EQUIPMENT_SPEED: f64 = 0.05;

/// Worn items and slot modifiers.
#[derive(Clone, Debug, Default)]
pub struct Equipment {
    slots: HashMap<String, ItemId>,
    speed_bonus: HashMap<String, f64>,
}

impl Equipment {
    /// Creates empty equipment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts `item_id` in `slot`, returning whatever was there.
    pub fn equip(&mut self, slot: &str, item_id: &str) -> Option<ItemId> {
        self.slots.insert(slot.to_string(), item_id.to_string())
    }

    /// Empties `slot`.
    pub fn unequip(&mut self, slot: &str) -> Option<ItemId> {
        self.slots.remove(slot)
    }

    /// Item worn in `slot`.
    #[must_use]
    pub fn equipped(&self, slot: &str) -> Option<&str> {
        self.slots.get(slot).map(String::as_str)
    }

    /// Sets the additive speed modifier of `slot`. Zero removes it.
    pub fn set_speed_bonus(&mut self, slot: &str, bonus: f64) {
        if bonus.abs() < f64::EPSILON {
            self.speed_bonus.remove(slot);
        } else {
            self.speed_bonus.insert(slot.to_string(), bonus);
        }
    }

    /// Additive speed modifier of `slot` (0 if none).
    #[must_use]
    pub fn speed_bonus(&self, slot: &str) -> f64 {
        self.speed_bonus.get(slot).copied().unwrap_or(0.0)
    }

    /// Effective speed of `slot`: the worn item's declared speed plus the slot
    /// modifier. An empty slot, or an item without a declared speed, counts
    /// as 1.0 before the modifier is added.
    #[must_use]
    pub fn speed_for_slot(&self, slot: &str, items: &ItemCatalog) -> f64 {
        let base = self
            .equipped(slot)
            .and_then(|id| items.get(id))
            .and_then(crate::items::ItemDef::speed)
            .unwrap_or(1.0);

        let speed = base + self.speed_bonus(slot);
        if speed.is_finite() && speed > MIN_EQUIPMENT_SPEED {
            speed
        } else {
            MIN_EQUIPMENT_SPEED
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::ItemDef;

    fn catalog() -> ItemCatalog {
        ItemCatalog::from_defs([ItemDef::equipment(
            "bronze_pickaxe",
            "Bronze Pickaxe",
            "pickaxe",
            1.25,
        )])
        .unwrap()
    }

    #[test]
    fn test_unequipped_speed_is_one() {
        let equipment = Equipment::new();
        assert!((equipment.speed_for_slot("pickaxe", &catalog()) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_item_speed_plus_bonus() {
        let mut equipment = Equipment::new();
        equipment.equip("pickaxe", "bronze_pickaxe@sharp");
        assert!((equipment.speed_for_slot("pickaxe", &catalog()) - 1.25).abs() < 1e-9);

        equipment.set_speed_bonus("pickaxe", 0.25);
        assert!((equipment.speed_for_slot("pickaxe", &catalog()) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_speed_is_clamped() {
        let mut equipment = Equipment::new();
        equipment.set_speed_bonus("pickaxe", -5.0);
        assert!((equipment.speed_for_slot("pickaxe", &catalog()) - MIN_EQUIPMENT_SPEED).abs() < 1e-9);
    }

    #[test]
    fn test_unequip() {
        let mut equipment = Equipment::new();
        assert_eq!(equipment.equip("pickaxe", "bronze_pickaxe"), None);
        assert_eq!(equipment.unequip("pickaxe").as_deref(), Some("bronze_pickaxe"));
        assert_eq!(equipment.equipped("pickaxe"), None);
    }
}
