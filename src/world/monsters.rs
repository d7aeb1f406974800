//! # Monster Registry and Instances
//!
//! Monster type definitions live in a static registry; the first entry is
//! the canonical kind the generator seeds. Instances carry combat state, the
//! sticky aggro flag, and whatever loot they will shed on death.
//!
//! Ids come from a monotonically increasing allocator owned by the World,
//! re-armed past the highest id found in a loaded save, so no two
//! simultaneously live monsters ever collide even across reloads.

use crate::world::items::ItemInstance;
use serde::{Deserialize, Serialize};

/// Static definition of a monster type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonsterKind {
    /// Canonical registry key
    pub key: &'static str,
    /// Display name
    pub name: &'static str,
    /// Hit points at spawn
    pub max_hp: i32,
    /// Experience awarded to the killer
    pub xp_award: u64,
    /// Ions awarded to the killer
    pub ion_award: u32,
    /// Riblets awarded to the killer
    pub riblet_award: u32,
    /// Natural armor class
    pub armor_class: i32,
}

/// The monster registry. The first entry is the canonical spawn kind.
pub const MONSTER_KINDS: &[MonsterKind] = &[
    MonsterKind {
        key: "mutant",
        name: "mutant",
        max_hp: 12,
        xp_award: 9,
        ion_award: 3,
        riblet_award: 7,
        armor_class: 0,
    },
    MonsterKind {
        key: "rad-hound",
        name: "rad-hound",
        max_hp: 8,
        xp_award: 6,
        ion_award: 2,
        riblet_award: 4,
        armor_class: 0,
    },
    MonsterKind {
        key: "scrap-golem",
        name: "scrap-golem",
        max_hp: 30,
        xp_award: 25,
        ion_award: 9,
        riblet_award: 18,
        armor_class: 20,
    },
    MonsterKind {
        key: "dust-wraith",
        name: "dust-wraith",
        max_hp: 16,
        xp_award: 14,
        ion_award: 6,
        riblet_award: 10,
        armor_class: 10,
    },
];

/// Looks up a monster kind by key.
pub fn monster_kind(key: &str) -> Option<&'static MonsterKind> {
    MONSTER_KINDS.iter().find(|kind| kind.key == key)
}

/// The kind the generator places during top-up.
pub fn canonical_spawn_kind() -> &'static MonsterKind {
    &MONSTER_KINDS[0]
}

/// A live monster somewhere in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterInstance {
    /// Registry key
    pub key: String,
    /// Stable id, unique among simultaneously live monsters
    pub id: u64,
    /// Display name derived at spawn
    pub name: String,
    /// Remaining hit points
    pub hp: i32,
    /// Whether this monster is actively hunting the player
    pub aggro: bool,
    /// Whether the player has ever noticed this monster
    pub seen: bool,
    /// Guards the one-yell-per-activation rule
    pub has_yelled_this_aggro: bool,
    /// Carried loot, dropped in order on death
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inventory: Vec<ItemInstance>,
    /// Worn armor, dropped last on death
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worn_armor: Option<ItemInstance>,
}

impl MonsterInstance {
    /// Creates a fresh instance of `kind` with the given id.
    pub fn new(kind: &MonsterKind, id: u64) -> Self {
        Self {
            key: kind.key.to_string(),
            id,
            name: kind.name.to_string(),
            hp: kind.max_hp,
            aggro: false,
            seen: false,
            has_yelled_this_aggro: false,
            inventory: Vec::new(),
            worn_armor: None,
        }
    }

    /// This monster's kind, if its key still resolves.
    pub fn kind(&self) -> Option<&'static MonsterKind> {
        monster_kind(&self.key)
    }

    /// Effective armor class: natural AC plus worn armor.
    pub fn armor_class(&self) -> i32 {
        let natural = self.kind().map(|kind| kind.armor_class).unwrap_or(0);
        let worn = self
            .worn_armor
            .as_ref()
            .and_then(|armor| armor.kind().ok())
            .map(|kind| kind.ac_bonus)
            .unwrap_or(0);
        natural + worn
    }

    /// Forces the monster back to dormancy, clearing the yell guard.
    pub fn reset_aggro(&mut self) {
        self.aggro = false;
        self.has_yelled_this_aggro = false;
    }
}

/// Monotonically increasing monster-id source, owned by the World.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterIdAllocator {
    next: u64,
}

impl MonsterIdAllocator {
    /// Hands out the next id.
    pub fn allocate(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Ensures future allocations land strictly after `id`. Called for every
    /// id observed while loading persisted state.
    pub fn advance_past(&mut self, id: u64) {
        if id >= self.next {
            self.next = id + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_spawn_kind_is_first() {
        assert_eq!(canonical_spawn_kind().key, MONSTER_KINDS[0].key);
        assert_eq!(canonical_spawn_kind().key, "mutant");
    }

    #[test]
    fn test_allocator_is_monotonic() {
        let mut alloc = MonsterIdAllocator::default();
        let a = alloc.allocate();
        let b = alloc.allocate();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn test_allocator_advances_past_loaded_ids() {
        let mut alloc = MonsterIdAllocator::default();
        alloc.advance_past(41);
        assert_eq!(alloc.allocate(), 42);
        // Ids below the watermark never move it backwards.
        alloc.advance_past(3);
        assert_eq!(alloc.allocate(), 43);
    }

    #[test]
    fn test_armor_class_includes_worn_armor() {
        let kind = monster_kind("dust-wraith").unwrap();
        let mut monster = MonsterInstance::new(kind, 0);
        assert_eq!(monster.armor_class(), 10);

        monster.worn_armor = Some(ItemInstance::new("leather-vest"));
        assert_eq!(monster.armor_class(), 14);
    }

    #[test]
    fn test_reset_aggro_clears_yell_guard() {
        let mut monster = MonsterInstance::new(canonical_spawn_kind(), 5);
        monster.aggro = true;
        monster.has_yelled_this_aggro = true;
        monster.reset_aggro();
        assert!(!monster.aggro);
        assert!(!monster.has_yelled_this_aggro);
    }
}
