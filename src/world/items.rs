//! # Item Registry and Instances
//!
//! Item type definitions live in a static registry keyed by kind key. An
//! item instance carries its kind key, an optional enchantment level, and an
//! open-ended metadata map used only for genuinely dynamic data (a skull
//! remembers which monster it came from). Legacy keys from old saves are
//! normalized through a fixed alias table before lookup.

use crate::{EramudError, EramudResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Static definition of an item type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemKind {
    /// Canonical registry key
    pub key: &'static str,
    /// Display name
    pub name: &'static str,
    /// Base weapon power when swung
    pub power: i32,
    /// Ion value when sold or scrapped
    pub ion_value: u32,
    /// Riblet value when sold or scrapped
    pub riblet_value: u32,
    /// Armor class granted while worn
    pub ac_bonus: i32,
    /// Carry weight
    pub weight: u32,
    /// Whether the generator may seed this item onto the ground
    pub spawnable: bool,
}

/// The item registry. Order is stable; generation indexes into the
/// spawnable subset deterministically.
pub const ITEM_KINDS: &[ItemKind] = &[
    ItemKind {
        key: "ion-decay",
        name: "Ion-Decay",
        power: 0,
        ion_value: 45,
        riblet_value: 2,
        ac_bonus: 0,
        weight: 1,
        spawnable: true,
    },
    ItemKind {
        key: "rusty-blade",
        name: "Rusty-Blade",
        power: 3,
        ion_value: 2,
        riblet_value: 8,
        ac_bonus: 0,
        weight: 4,
        spawnable: true,
    },
    ItemKind {
        key: "shard-pike",
        name: "Shard-Pike",
        power: 5,
        ion_value: 4,
        riblet_value: 15,
        ac_bonus: 0,
        weight: 6,
        spawnable: true,
    },
    ItemKind {
        key: "pulse-rifle",
        name: "Pulse-Rifle",
        power: 7,
        ion_value: 12,
        riblet_value: 40,
        ac_bonus: 0,
        weight: 8,
        spawnable: true,
    },
    ItemKind {
        key: "leather-vest",
        name: "Leather-Vest",
        power: 0,
        ion_value: 3,
        riblet_value: 10,
        ac_bonus: 4,
        weight: 5,
        spawnable: true,
    },
    ItemKind {
        key: "plasteel-plate",
        name: "Plasteel-Plate",
        power: 0,
        ion_value: 10,
        riblet_value: 35,
        ac_bonus: 9,
        weight: 12,
        spawnable: true,
    },
    ItemKind {
        key: "rad-tablet",
        name: "Rad-Tablet",
        power: 0,
        ion_value: 1,
        riblet_value: 3,
        ac_bonus: 0,
        weight: 1,
        spawnable: true,
    },
    ItemKind {
        key: "med-gel",
        name: "Med-Gel",
        power: 0,
        ion_value: 2,
        riblet_value: 6,
        ac_bonus: 0,
        weight: 1,
        spawnable: true,
    },
    ItemKind {
        key: "battery-cell",
        name: "Battery-Cell",
        power: 0,
        ion_value: 8,
        riblet_value: 5,
        ac_bonus: 0,
        weight: 2,
        spawnable: true,
    },
    ItemKind {
        key: "skull",
        name: "Skull",
        power: 0,
        ion_value: 0,
        riblet_value: 1,
        ac_bonus: 0,
        weight: 2,
        spawnable: false,
    },
];

/// Legacy key aliases from earlier save formats, normalized before lookup.
const KEY_ALIASES: &[(&str, &str)] = &[
    ("iondecay", "ion-decay"),
    ("ion_decay", "ion-decay"),
    ("laser-rifle", "pulse-rifle"),
    ("vest", "leather-vest"),
    ("plate", "plasteel-plate"),
    ("bone", "skull"),
];

/// Normalizes a raw key: lowercases and applies the legacy alias table.
pub fn normalize_key(raw: &str) -> String {
    let lowered = raw.to_ascii_lowercase();
    for (alias, canonical) in KEY_ALIASES {
        if lowered == *alias {
            return (*canonical).to_string();
        }
    }
    lowered
}

/// Looks up an item kind by (normalized) key.
pub fn item_kind(key: &str) -> Option<&'static ItemKind> {
    let normalized = normalize_key(key);
    ITEM_KINDS.iter().find(|kind| kind.key == normalized)
}

/// Resolves user input to an item kind: exact key first, then a
/// case-insensitive prefix of the display name.
///
/// # Examples
///
/// ```
/// use eramud::resolve_item_kind;
///
/// assert_eq!(resolve_item_kind("Ion-Decay").unwrap().key, "ion-decay");
/// assert_eq!(resolve_item_kind("puls").unwrap().key, "pulse-rifle");
/// assert!(resolve_item_kind("chainsaw").is_none());
/// ```
pub fn resolve_item_kind(input: &str) -> Option<&'static ItemKind> {
    if let Some(kind) = item_kind(input) {
        return Some(kind);
    }
    let lowered = input.to_ascii_lowercase();
    ITEM_KINDS
        .iter()
        .find(|kind| kind.name.to_ascii_lowercase().starts_with(&lowered))
}

/// The subset of kinds the generator may place, in registry order.
pub fn spawnable_kinds() -> Vec<&'static ItemKind> {
    ITEM_KINDS.iter().filter(|kind| kind.spawnable).collect()
}

/// Metadata key under which a skull records its source monster type.
pub const META_MONSTER: &str = "monster";

/// A concrete item in the world or an inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemInstance {
    /// Registry key (possibly a legacy alias in old saves)
    pub key: String,
    /// Enchantment level, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enchant: Option<i32>,
    /// Open-ended metadata
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, String>,
}

impl ItemInstance {
    /// Creates a plain instance of the given kind.
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            enchant: None,
            meta: BTreeMap::new(),
        }
    }

    /// Creates the skull a dying monster leaves behind.
    pub fn skull(monster_name: &str) -> Self {
        let mut meta = BTreeMap::new();
        meta.insert(META_MONSTER.to_string(), monster_name.to_string());
        Self {
            key: "skull".to_string(),
            enchant: None,
            meta,
        }
    }

    /// Resolves this instance's kind, normalizing legacy aliases.
    ///
    /// An unresolvable key is an invariant violation; it means the instance
    /// was constructed outside the registry.
    pub fn kind(&self) -> EramudResult<&'static ItemKind> {
        item_kind(&self.key).ok_or_else(|| {
            EramudError::InvalidState(format!("unknown item key '{}'", self.key))
        })
    }

    /// Display name, including the skull's monster tag when present.
    pub fn display_name(&self) -> String {
        let base = item_kind(&self.key).map(|kind| kind.name).unwrap_or(&self.key);
        match self.meta.get(META_MONSTER) {
            Some(monster) => format!("{} ({})", base, monster),
            None => base.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_key_is_canonical() {
        for kind in ITEM_KINDS {
            assert_eq!(normalize_key(kind.key), kind.key);
        }
    }

    #[test]
    fn test_alias_normalization() {
        assert_eq!(normalize_key("IonDecay"), "ion-decay");
        assert_eq!(normalize_key("LASER-RIFLE"), "pulse-rifle");
        assert_eq!(item_kind("vest").unwrap().key, "leather-vest");
    }

    #[test]
    fn test_resolve_by_name_prefix() {
        assert_eq!(resolve_item_kind("Rusty").unwrap().key, "rusty-blade");
        assert_eq!(resolve_item_kind("ION-DECAY").unwrap().key, "ion-decay");
        assert!(resolve_item_kind("zzz").is_none());
    }

    #[test]
    fn test_skull_is_not_spawnable() {
        assert!(!item_kind("skull").unwrap().spawnable);
        assert!(spawnable_kinds().iter().all(|kind| kind.key != "skull"));
    }

    #[test]
    fn test_skull_instance_carries_monster_tag() {
        let skull = ItemInstance::skull("mutant");
        assert_eq!(skull.meta.get(META_MONSTER).map(String::as_str), Some("mutant"));
        assert_eq!(skull.display_name(), "Skull (mutant)");
    }

    #[test]
    fn test_instance_kind_resolution() {
        let item = ItemInstance::new("pulse-rifle");
        assert_eq!(item.kind().unwrap().power, 7);

        let legacy = ItemInstance::new("laser-rifle");
        assert_eq!(legacy.kind().unwrap().key, "pulse-rifle");

        let bogus = ItemInstance::new("no-such-item");
        assert!(bogus.kind().is_err());
    }
}
