//! # World Module
//!
//! The world state store: per-era grids, ground item stacks, monster lists,
//! and memoized room descriptions, all keyed by `(year, x, y)`.
//!
//! The store owns every piece of mutable world content. Eras initialize
//! lazily: the first access to a year builds its grid and runs the content
//! generator exactly once; every later access is a plain read or write.
//! Ground stacks and monster lists are never stored empty — an empty list
//! means the key is absent.

pub mod grid;
pub mod items;
pub mod monsters;

pub use grid::*;
pub use items::*;
pub use monsters::*;

use crate::game::{Direction, Position};
use crate::{generation, EramudError, EramudResult};
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// All mutable content of a single era.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearState {
    /// Topology for this era (identical bounds every era)
    pub grid: Grid,
    /// Ground item stacks; stack order matters for render and eviction
    #[serde(with = "crate::utils::position_map")]
    pub(crate) ground: HashMap<Position, Vec<ItemInstance>>,
    /// Live monsters; the first in a list is the primary target
    #[serde(with = "crate::utils::position_map")]
    pub(crate) monsters: HashMap<Position, Vec<MonsterInstance>>,
    /// Lazily generated room descriptions
    #[serde(with = "crate::utils::position_map")]
    pub(crate) room_cache: HashMap<Position, String>,
    /// Item count this era converges toward
    pub item_target: usize,
    /// Monster count this era converges toward
    pub monster_target: usize,
}

impl YearState {
    pub(crate) fn new(grid: Grid, item_target: usize, monster_target: usize) -> Self {
        Self {
            grid,
            ground: HashMap::new(),
            monsters: HashMap::new(),
            room_cache: HashMap::new(),
            item_target,
            monster_target,
        }
    }

    /// The item stack on a tile, in stack order. Empty slice when bare.
    pub fn ground_at(&self, pos: Position) -> &[ItemInstance] {
        self.ground.get(&pos).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether a tile holds any items.
    pub fn has_ground(&self, pos: Position) -> bool {
        self.ground.contains_key(&pos)
    }

    /// Total items on the ground across the era.
    pub fn ground_total(&self) -> usize {
        self.ground.values().map(Vec::len).sum()
    }

    pub(crate) fn add_ground(&mut self, pos: Position, item: ItemInstance) {
        self.ground.entry(pos).or_default().push(item);
    }

    pub(crate) fn remove_ground(&mut self, pos: Position, index: usize) -> Option<ItemInstance> {
        let stack = self.ground.get_mut(&pos)?;
        if index >= stack.len() {
            return None;
        }
        let item = stack.remove(index);
        if stack.is_empty() {
            self.ground.remove(&pos);
        }
        Some(item)
    }

    /// The monsters on a tile, first-listed is primary. Empty slice when none.
    pub fn monsters_at(&self, pos: Position) -> &[MonsterInstance] {
        self.monsters.get(&pos).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether a tile holds any monsters.
    pub fn has_monsters(&self, pos: Position) -> bool {
        self.monsters.contains_key(&pos)
    }

    /// Total live monsters across the era.
    pub fn monster_total(&self) -> usize {
        self.monsters.values().map(Vec::len).sum()
    }

    /// Whether any monster in the era is hunting the player.
    pub fn any_aggro(&self) -> bool {
        self.monsters.values().flatten().any(|monster| monster.aggro)
    }

    /// `(tile, id)` for every aggro monster, tiles sorted, list order kept.
    /// This is the deterministic processing order for the movement tick.
    pub fn aggro_monsters_in_order(&self) -> Vec<(Position, u64)> {
        let mut tiles: Vec<Position> = self.monsters.keys().copied().collect();
        tiles.sort();
        let mut order = Vec::new();
        for pos in tiles {
            for monster in &self.monsters[&pos] {
                if monster.aggro {
                    order.push((pos, monster.id));
                }
            }
        }
        order
    }

    pub(crate) fn monsters_mut(&mut self, pos: Position) -> Option<&mut Vec<MonsterInstance>> {
        self.monsters.get_mut(&pos)
    }

    pub(crate) fn monster_mut(&mut self, pos: Position, id: u64) -> Option<&mut MonsterInstance> {
        self.monsters
            .get_mut(&pos)?
            .iter_mut()
            .find(|monster| monster.id == id)
    }

    pub(crate) fn take_monster(&mut self, pos: Position, id: u64) -> Option<MonsterInstance> {
        let list = self.monsters.get_mut(&pos)?;
        let index = list.iter().position(|monster| monster.id == id)?;
        let monster = list.remove(index);
        if list.is_empty() {
            self.monsters.remove(&pos);
        }
        Some(monster)
    }

    pub(crate) fn put_monster(&mut self, pos: Position, monster: MonsterInstance) {
        self.monsters.entry(pos).or_default().push(monster);
    }

    /// Applies `f` to every live monster in the era.
    pub fn for_each_monster_mut(&mut self, mut f: impl FnMut(&mut MonsterInstance)) {
        for list in self.monsters.values_mut() {
            for monster in list {
                f(monster);
            }
        }
    }
}

/// What a damage application did to its target.
#[derive(Debug, Clone, PartialEq)]
pub enum DamageOutcome {
    /// The blow was fatal; the monster has been removed from its tile and
    /// handed back so the death pipeline can run exactly once.
    Slain(MonsterInstance),
    /// The monster survived with this much hp left.
    Wounded { remaining_hp: i32 },
}

/// The root aggregate owning all era content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    /// Seed fixing every derived random stream
    pub global_seed: u64,
    /// Discrete game-time counter, advanced by turn-consuming actions
    pub turn: u64,
    /// Last calendar day the daily top-up ran
    pub last_topup_date: Option<NaiveDate>,
    pub(crate) years: BTreeMap<i32, YearState>,
    pub(crate) id_allocator: MonsterIdAllocator,
}

impl World {
    /// Creates an empty world. Eras appear on first access.
    ///
    /// # Examples
    ///
    /// ```
    /// use eramud::World;
    ///
    /// let mut world = World::new(42);
    /// let era = world.year(2000).unwrap();
    /// assert!(era.ground_total() > 0);
    /// ```
    pub fn new(global_seed: u64) -> Self {
        Self {
            global_seed,
            turn: 0,
            last_topup_date: None,
            years: BTreeMap::new(),
            id_allocator: MonsterIdAllocator::default(),
        }
    }

    /// The era for `year`, generating it on first access.
    ///
    /// Generation runs exactly once per era and guarantees the origin tile
    /// is walkable and monster-free unless something is explicitly placed
    /// there afterwards.
    pub fn year(&mut self, year: i32) -> EramudResult<&mut YearState> {
        if !self.years.contains_key(&year) {
            let state =
                generation::initialize_year(self.global_seed, year, &mut self.id_allocator)?;
            debug!(
                "initialized era {}: {} items, {} monsters",
                year,
                state.ground_total(),
                state.monster_total()
            );
            self.years.insert(year, state);
        }
        match self.years.get_mut(&year) {
            Some(state) => Ok(state),
            None => Err(EramudError::InvalidState(format!(
                "era {} missing after initialization",
                year
            ))),
        }
    }

    /// Read access to an already-initialized era.
    pub fn year_state(&self, year: i32) -> Option<&YearState> {
        self.years.get(&year)
    }

    /// Write access to an already-initialized era.
    pub fn year_state_mut(&mut self, year: i32) -> Option<&mut YearState> {
        self.years.get_mut(&year)
    }

    /// Every era that has been initialized, ascending.
    pub fn known_years(&self) -> Vec<i32> {
        self.years.keys().copied().collect()
    }

    pub(crate) fn topup_parts(
        &mut self,
    ) -> (&mut BTreeMap<i32, YearState>, &mut MonsterIdAllocator) {
        (&mut self.years, &mut self.id_allocator)
    }

    /// Whether a tile is walkable in an initialized era.
    pub fn is_open(&self, year: i32, pos: Position) -> bool {
        self.years
            .get(&year)
            .map(|state| state.grid.is_open(pos))
            .unwrap_or(false)
    }

    /// One step within an era's bounds, or None.
    pub fn step(&self, year: i32, from: Position, direction: Direction) -> Option<Position> {
        self.years.get(&year)?.grid.step(from, direction)
    }

    /// In-bounds neighbors of a tile in an initialized era.
    pub fn neighbors(&self, year: i32, pos: Position) -> Vec<Position> {
        self.years
            .get(&year)
            .map(|state| state.grid.neighbors(pos))
            .unwrap_or_default()
    }

    /// The ground stack on a tile (empty slice for bare tiles).
    pub fn ground_items(&self, year: i32, pos: Position) -> &[ItemInstance] {
        self.years
            .get(&year)
            .map(|state| state.ground_at(pos))
            .unwrap_or(&[])
    }

    /// Total items on the ground in an era.
    pub fn ground_item_count(&self, year: i32) -> usize {
        self.years
            .get(&year)
            .map(YearState::ground_total)
            .unwrap_or(0)
    }

    /// Free item slots left on a tile.
    pub fn ground_free_slots(&self, year: i32, pos: Position) -> usize {
        crate::config::MAX_ITEMS_PER_TILE.saturating_sub(self.ground_items(year, pos).len())
    }

    /// Adds an item to the top of a tile's stack, initializing the era if
    /// needed.
    pub fn add_ground_item(
        &mut self,
        year: i32,
        pos: Position,
        item: ItemInstance,
    ) -> EramudResult<()> {
        self.year(year)?.add_ground(pos, item);
        Ok(())
    }

    /// Removes and returns the item at `index` in a tile's stack.
    pub fn remove_ground_item(
        &mut self,
        year: i32,
        pos: Position,
        index: usize,
    ) -> Option<ItemInstance> {
        self.years.get_mut(&year)?.remove_ground(pos, index)
    }

    /// The monsters on a tile (empty slice for bare tiles).
    pub fn monsters_at(&self, year: i32, pos: Position) -> &[MonsterInstance] {
        self.years
            .get(&year)
            .map(|state| state.monsters_at(pos))
            .unwrap_or(&[])
    }

    /// Total live monsters in an era.
    pub fn monster_count(&self, year: i32) -> usize {
        self.years
            .get(&year)
            .map(YearState::monster_total)
            .unwrap_or(0)
    }

    /// The primary (first-listed) monster on a tile.
    pub fn primary_monster(&self, year: i32, pos: Position) -> Option<&MonsterInstance> {
        self.monsters_at(year, pos).first()
    }

    /// Mutable access to one monster by id.
    pub fn monster_mut(
        &mut self,
        year: i32,
        pos: Position,
        id: u64,
    ) -> Option<&mut MonsterInstance> {
        self.years.get_mut(&year)?.monster_mut(pos, id)
    }

    /// Places a monster of `key` on a tile, initializing the era if needed.
    ///
    /// With `explicit_id` the caller supplies the id (loading persisted
    /// state); the allocator is advanced past it so later spawns can never
    /// collide. Otherwise a fresh id is allocated.
    pub fn place_monster(
        &mut self,
        year: i32,
        pos: Position,
        key: &str,
        explicit_id: Option<u64>,
    ) -> EramudResult<u64> {
        let kind = monster_kind(key).ok_or_else(|| {
            EramudError::InvalidAction(format!("unknown monster kind '{}'", key))
        })?;
        self.year(year)?;
        let id = match explicit_id {
            Some(id) => {
                self.id_allocator.advance_past(id);
                id
            }
            None => self.id_allocator.allocate(),
        };
        match self.years.get_mut(&year) {
            Some(state) => {
                state.put_monster(pos, MonsterInstance::new(kind, id));
                Ok(id)
            }
            None => Err(EramudError::InvalidState(format!(
                "era {} missing after initialization",
                year
            ))),
        }
    }

    /// Applies damage to one monster; a fatal blow removes it from its tile
    /// and returns the corpse for the death pipeline.
    pub fn damage_monster(
        &mut self,
        year: i32,
        pos: Position,
        id: u64,
        damage: i32,
    ) -> EramudResult<DamageOutcome> {
        let state = self.years.get_mut(&year).ok_or_else(|| {
            EramudError::InvalidState(format!("era {} not initialized", year))
        })?;
        let remaining = {
            let monster = state.monster_mut(pos, id).ok_or_else(|| {
                EramudError::InvalidAction(format!("no monster {} at {}", id, pos))
            })?;
            monster.hp -= damage;
            monster.hp
        };
        if remaining <= 0 {
            let corpse = state.take_monster(pos, id).ok_or_else(|| {
                EramudError::InvalidState(format!("monster {} vanished mid-death", id))
            })?;
            Ok(DamageOutcome::Slain(corpse))
        } else {
            Ok(DamageOutcome::Wounded {
                remaining_hp: remaining,
            })
        }
    }

    /// Removes one monster outright (debug/reset paths).
    pub fn remove_monster(&mut self, year: i32, pos: Position, id: u64) -> Option<MonsterInstance> {
        self.years.get_mut(&year)?.take_monster(pos, id)
    }

    /// The memoized room description for a tile.
    pub fn room_description(&mut self, year: i32, pos: Position) -> EramudResult<String> {
        let seed = self.global_seed;
        let state = self.year(year)?;
        if let Some(cached) = state.room_cache.get(&pos) {
            return Ok(cached.clone());
        }
        let description = generation::room_description(seed, year, pos);
        state.room_cache.insert(pos, description.clone());
        Ok(description)
    }

    /// Re-arms the id allocator past every live monster id. Called after
    /// deserializing persisted state.
    pub fn rearm_monster_ids(&mut self) {
        let mut highest = None;
        for state in self.years.values() {
            for monster in state.monsters.values().flatten() {
                highest = highest.max(Some(monster.id));
            }
        }
        if let Some(id) = highest {
            self.id_allocator.advance_past(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_starts_monster_free() {
        let mut world = World::new(1234);
        world.year(2000).unwrap();
        assert!(world.monsters_at(2000, Position::origin()).is_empty());
        assert!(world.is_open(2000, Position::origin()));
    }

    #[test]
    fn test_era_initializes_exactly_once() {
        let mut world = World::new(1234);
        let items_first = world.year(2000).unwrap().ground_total();
        // Drain one tile, then re-access; content must not regenerate.
        let occupied = world
            .year_state(2000)
            .unwrap()
            .ground
            .keys()
            .copied()
            .min()
            .unwrap();
        world.remove_ground_item(2000, occupied, 0).unwrap();
        let items_second = world.year(2000).unwrap().ground_total();
        assert_eq!(items_second, items_first - 1);
    }

    #[test]
    fn test_empty_stack_means_absent_key() {
        let mut world = World::new(99);
        world.year(2000).unwrap();
        let pos = Position::origin();
        let baseline = world.ground_items(2000, pos).len();
        world
            .add_ground_item(2000, pos, ItemInstance::new("battery-cell"))
            .unwrap();
        for index in (0..=baseline).rev() {
            world.remove_ground_item(2000, pos, index).unwrap();
        }
        assert!(!world.year_state(2000).unwrap().has_ground(pos));
    }

    #[test]
    fn test_monster_ids_unique_among_live() {
        let mut world = World::new(7);
        let a = world
            .place_monster(2000, Position::new(1, 1), "mutant", None)
            .unwrap();
        let b = world
            .place_monster(2000, Position::new(1, 1), "rad-hound", None)
            .unwrap();
        assert_ne!(a, b);

        let mut live = std::collections::HashSet::new();
        for state in world.years.values() {
            for monster in state.monsters.values().flatten() {
                assert!(live.insert(monster.id), "duplicate live id {}", monster.id);
            }
        }
    }

    #[test]
    fn test_damage_to_zero_removes_monster() {
        let mut world = World::new(7);
        let pos = Position::new(2, 3);
        let id = world.place_monster(2000, pos, "rad-hound", None).unwrap();
        let hp = world.monsters_at(2000, pos)[0].hp;

        match world.damage_monster(2000, pos, id, hp - 1).unwrap() {
            DamageOutcome::Wounded { remaining_hp } => assert_eq!(remaining_hp, 1),
            other => panic!("unexpected outcome {:?}", other),
        }
        match world.damage_monster(2000, pos, id, 5).unwrap() {
            DamageOutcome::Slain(corpse) => assert_eq!(corpse.id, id),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(world
            .monsters_at(2000, pos)
            .iter()
            .all(|monster| monster.id != id));
    }

    #[test]
    fn test_explicit_id_advances_allocator() {
        let mut world = World::new(7);
        world
            .place_monster(2000, Position::new(4, 4), "mutant", Some(100))
            .unwrap();
        let fresh = world
            .place_monster(2000, Position::new(4, 4), "mutant", None)
            .unwrap();
        assert!(fresh > 100);
    }

    #[test]
    fn test_room_description_is_memoized() {
        let mut world = World::new(31);
        let first = world.room_description(2000, Position::new(5, 5)).unwrap();
        let second = world.room_description(2000, Position::new(5, 5)).unwrap();
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }
}
