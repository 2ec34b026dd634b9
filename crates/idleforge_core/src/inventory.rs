//! # Inventory Ledger
//!
//! Keyed item quantities. Removal is checked: the ledger never underflows,
//! and multi-item transactions use [`Inventory::snapshot`] /
//! [`Inventory::restore`] for rollback.

use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::skill::ItemId;

/// Item quantities owned by a player.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Inventory {
    items: HashMap<ItemId, u64>,
}

impl Inventory {
    /// Creates an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Quantity owned of `item_id` (0 if absent).
    #[inline]
    #[must_use]
    pub fn count(&self, item_id: &str) -> u64 {
        self.items.get(item_id).copied().unwrap_or(0)
    }

    /// True if at least `quantity` of `item_id` is owned.
    #[inline]
    #[must_use]
    pub fn has(&self, item_id: &str, quantity: u64) -> bool {
        self.count(item_id) >= quantity
    }

    /// Adds items. Adding zero is a no-op.
    pub fn add(&mut self, item_id: &str, quantity: u64) {
        if quantity == 0 {
            return;
        }
        let slot = self.items.entry(item_id.to_string()).or_insert(0);
        *slot = slot.saturating_add(quantity);
    }

    /// Removes items.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InsufficientItems`] and leaves the ledger untouched
    /// if fewer than `quantity` are owned.
    pub fn remove(&mut self, item_id: &str, quantity: u64) -> CoreResult<()> {
        if quantity == 0 {
            return Ok(());
        }

        let available = self.count(item_id);
        if available < quantity {
            return Err(CoreError::InsufficientItems {
                item: item_id.to_string(),
                required: quantity,
                available,
            });
        }

        if available == quantity {
            self.items.remove(item_id);
        } else if let Some(slot) = self.items.get_mut(item_id) {
            *slot -= quantity;
        }

        Ok(())
    }

    /// Number of distinct items held.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if nothing is held.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over `(item, quantity)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.items.iter().map(|(id, &qty)| (id.as_str(), qty))
    }

    /// Creates a snapshot of the inventory for rollback.
    #[must_use]
    pub fn snapshot(&self) -> InventorySnapshot {
        InventorySnapshot {
            items: self.items.clone(),
        }
    }

    /// Restores inventory from a snapshot (rollback).
    pub fn restore(&mut self, snapshot: InventorySnapshot) {
        self.items = snapshot.items;
    }
}

impl<S: Into<ItemId>> FromIterator<(S, u64)> for Inventory {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        let mut inventory = Self::new();
        for (id, qty) in iter {
            let id: ItemId = id.into();
            inventory.add(&id, qty);
        }
        inventory
    }
}

/// Snapshot of inventory state for transactional rollback.
#[derive(Clone, Debug)]
pub struct InventorySnapshot {
    items: HashMap<ItemId, u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_items() {
        let mut inv = Inventory::new();
        inv.add("copper_ore", 10);
        inv.add("copper_ore", 5);
        assert_eq!(inv.count("copper_ore"), 15);
        assert_eq!(inv.len(), 1);
    }

    #[test]
    fn test_add_zero_is_noop() {
        let mut inv = Inventory::new();
        inv.add("copper_ore", 0);
        assert!(inv.is_empty());
    }

    #[test]
    fn test_remove_items() {
        let mut inv = Inventory::new();
        inv.add("log", 100);
        inv.remove("log", 30).unwrap();
        assert_eq!(inv.count("log"), 70);

        inv.remove("log", 70).unwrap();
        assert_eq!(inv.count("log"), 0);
        assert!(inv.is_empty(), "emptied entries are dropped");
    }

    #[test]
    fn test_remove_insufficient() {
        let mut inv = Inventory::new();
        inv.add("log", 10);
        let result = inv.remove("log", 20);
        assert_eq!(
            result,
            Err(CoreError::InsufficientItems {
                item: "log".to_string(),
                required: 20,
                available: 10,
            })
        );
        assert_eq!(inv.count("log"), 10, "failed removal leaves ledger untouched");
    }

    #[test]
    fn test_snapshot_restore() {
        let mut inv: Inventory = [("log", 50)].into_iter().collect();

        let snapshot = inv.snapshot();

        inv.add("plank", 30);
        inv.remove("log", 50).unwrap();

        inv.restore(snapshot);
        assert_eq!(inv.count("plank"), 0);
        assert_eq!(inv.count("log"), 50);
    }
}
