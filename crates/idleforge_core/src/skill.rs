//! Skill identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Item identifier as used by the catalog and the inventory ledger.
///
/// Qualified variants (`iron_pickaxe@fine`) share the definition of their
/// base id; see [`crate::base_item_id`].
pub type ItemId = String;

/// A trainable skill.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Skill {
    /// Rocks and ores.
    Mining,
    /// Trees and logs.
    Woodcutting,
    /// Fishing spots.
    Fishing,
    /// Smelting and forging.
    Smithing,
    /// General crafting.
    Crafting,
    /// Potion brewing.
    Alchemy,
    /// Assembling components.
    Engineering,
}

impl Skill {
    /// Every skill, in declaration order.
    pub const ALL: [Skill; 7] = [
        Skill::Mining,
        Skill::Woodcutting,
        Skill::Fishing,
        Skill::Smithing,
        Skill::Crafting,
        Skill::Alchemy,
        Skill::Engineering,
    ];

    /// Lowercase name, matching the serialized form.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mining => "mining",
            Self::Woodcutting => "woodcutting",
            Self::Fishing => "fishing",
            Self::Smithing => "smithing",
            Self::Crafting => "crafting",
            Self::Alchemy => "alchemy",
            Self::Engineering => "engineering",
        }
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Skill {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|skill| skill.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::UnknownSkill(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip_names() {
        for skill in Skill::ALL {
            assert_eq!(skill.name().parse::<Skill>().unwrap(), skill);
        }
        assert_eq!(" Mining ".parse::<Skill>().unwrap(), Skill::Mining);
    }

    #[test]
    fn test_parse_unknown() {
        let err = "farming".parse::<Skill>().unwrap_err();
        assert_eq!(err, CoreError::UnknownSkill("farming".to_string()));
    }
}
