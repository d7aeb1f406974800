//! # Game State Module
//!
//! Central coordination between the world store, the player, the AI, and
//! the upkeep clock. The dispatcher calls these methods and prints whatever
//! lines they return; the state itself never touches the terminal.

use crate::game::{CharacterClass, Direction, Player, Position, UpkeepClock};
use crate::world::{normalize_key, resolve_item_kind, ItemInstance, World};
use crate::{ai, config, EramudError, EramudResult, Footsteps};
use log::debug;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Game statistics tracking player progress.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameStatistics {
    /// Monsters put down
    pub monsters_slain: u32,
    /// Items picked up off the ground
    pub items_collected: u32,
    /// Total damage dealt
    pub damage_dealt: u64,
    /// Total damage taken
    pub damage_taken: u64,
    /// Times the player has died
    pub deaths: u32,
    /// Total steps taken
    pub steps_taken: u64,
}

impl GameStatistics {
    /// Creates new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Central game state: the world, the player, and progress tracking.
///
/// # Examples
///
/// ```
/// use eramud::{CharacterClass, GameState};
///
/// let state = GameState::new(12345, "Ash".to_string(), CharacterClass::Drifter);
/// assert_eq!(state.world.turn, 0);
/// assert_eq!(state.player.level, 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// The world containing every era
    pub world: World,
    /// The player character
    pub player: Player,
    /// Progress statistics
    pub statistics: GameStatistics,
    /// Wall-clock upkeep boundary; rebuilt fresh after load
    #[serde(skip)]
    pub upkeep: UpkeepClock,
}

impl GameState {
    /// Creates a new game with the given seed and character.
    pub fn new(seed: u64, name: String, class: CharacterClass) -> Self {
        Self {
            world: World::new(seed),
            player: Player::new(name, class),
            statistics: GameStatistics::new(),
            upkeep: UpkeepClock::default(),
        }
    }

    /// Moves the player into an era, generating it on first visit. Returns
    /// any yells from monsters on the arrival tile.
    pub fn enter_year(&mut self, year: i32) -> EramudResult<Vec<String>> {
        self.world.year(year)?;
        self.player.year = year;
        let pos = self.player.position();
        Ok(ai::entry_aggro_check(&mut self.world, year, pos))
    }

    /// Attempts one step. Off-grid steps are rejected with a message and
    /// consume no turn; a successful step runs the entry aggro check and
    /// the monster tick.
    pub fn try_step(&mut self, direction: Direction) -> EramudResult<Vec<String>> {
        let year = self.player.year;
        self.world.year(year)?;
        let from = self.player.position();
        let Some(dest) = self.world.step(year, from, direction) else {
            return Ok(vec![
                "The static wall at the edge of the era turns you back.".to_string(),
            ]);
        };
        self.player.set_position(dest);
        self.statistics.steps_taken += 1;
        let mut messages = ai::entry_aggro_check(&mut self.world, year, dest);
        messages.extend(self.consume_turn());
        Ok(messages)
    }

    /// Advances world time by one tick and runs monster movement for the
    /// player's era. Arrival lines are returned; footstep cues queue in the
    /// senses buffer until the next look.
    pub fn consume_turn(&mut self) -> Vec<String> {
        let year = self.player.year;
        let pos = self.player.position();
        self.world.turn += 1;
        let outcome = ai::move_monsters_one_tick(&mut self.world, year, pos);

        let mut messages = Vec::new();
        for arrival in outcome.arrivals {
            messages.push(format!(
                "The {} closes in from the {}!",
                arrival.name,
                arrival.from.name()
            ));
        }
        if let Some(footsteps) = outcome.footsteps {
            let cue = match footsteps {
                Footsteps::Faint(direction) => {
                    format!("You hear faint footsteps to the {}.", direction.name())
                }
                Footsteps::Loud(direction) => {
                    format!("You hear loud footsteps to the {}!", direction.name())
                }
            };
            self.player.sense(cue);
        }
        messages
    }

    /// Describes the player's tile: room flavor, monsters, ground items,
    /// shadows in adjacent tiles, and any queued sensory cues (which this
    /// drains). Re-observing the tile also re-runs the aggro check.
    pub fn look(&mut self) -> EramudResult<Vec<String>> {
        let year = self.player.year;
        let pos = self.player.position();
        let mut lines = vec![self.world.room_description(year, pos)?];

        let yells = ai::entry_aggro_check(&mut self.world, year, pos);
        if let Some(state) = self.world.year_state_mut(year) {
            if let Some(list) = state.monsters_mut(pos) {
                for monster in list.iter_mut() {
                    monster.seen = true;
                    let glare = if monster.aggro { ", glaring at you" } else { "" };
                    lines.push(format!("A {} is here{}.", monster.name, glare));
                }
            }
        }
        lines.extend(yells);

        let items = self.world.ground_items(year, pos);
        if !items.is_empty() {
            let names: Vec<String> = items.iter().map(ItemInstance::display_name).collect();
            lines.push(format!("On the ground: {}.", names.join(", ")));
        }

        for direction in ai::shadow_directions(&self.world, year, pos) {
            lines.push(format!("A shadow shifts to the {}.", direction.name()));
        }
        lines.extend(self.player.drain_senses());
        Ok(lines)
    }

    /// Picks up the first ground item whose name or key matches `name`.
    pub fn pick_up(&mut self, name: &str) -> EramudResult<Vec<String>> {
        let year = self.player.year;
        let pos = self.player.position();
        let lowered = name.to_ascii_lowercase();
        let normalized = normalize_key(name);
        let index = self
            .world
            .ground_items(year, pos)
            .iter()
            .position(|item| {
                normalize_key(&item.key) == normalized
                    || item
                        .display_name()
                        .to_ascii_lowercase()
                        .starts_with(&lowered)
            });
        let Some(index) = index else {
            return Ok(vec![format!("You see no '{}' here.", name)]);
        };
        let item = self
            .world
            .remove_ground_item(year, pos, index)
            .ok_or_else(|| {
                EramudError::InvalidState("ground stack changed mid-pickup".to_string())
            })?;
        let label = item.display_name();
        self.player.inventory.push(item);
        self.statistics.items_collected += 1;

        let mut messages = vec![format!("You pick up the {}.", label)];
        messages.extend(self.consume_turn());
        Ok(messages)
    }

    /// Drops the first carried item matching `name`, capacity permitting.
    pub fn drop_item(&mut self, name: &str) -> EramudResult<Vec<String>> {
        let year = self.player.year;
        let pos = self.player.position();
        if self.world.ground_free_slots(year, pos) == 0 {
            return Ok(vec!["There is no room on the ground here.".to_string()]);
        }
        let Some(index) = self.find_inventory_index(name) else {
            return Ok(vec![format!("You aren't carrying a '{}'.", name)]);
        };
        let item = self.player.inventory.remove(index);
        let label = item.display_name();
        self.world.add_ground_item(year, pos, item)?;

        let mut messages = vec![format!("You drop the {}.", label)];
        messages.extend(self.consume_turn());
        Ok(messages)
    }

    /// Wields a carried weapon, returning any previous weapon to the pack.
    pub fn wield(&mut self, name: &str) -> EramudResult<Vec<String>> {
        let Some(index) = self.find_inventory_index(name) else {
            return Ok(vec![format!("You aren't carrying a '{}'.", name)]);
        };
        let kind = self.player.inventory[index].kind()?;
        if kind.power == 0 {
            return Ok(vec![format!("The {} is no weapon.", kind.name)]);
        }
        let item = self.player.inventory.remove(index);
        let label = item.display_name();
        if let Some(previous) = self.player.wielded.replace(item) {
            self.player.inventory.push(previous);
        }
        Ok(vec![format!("You wield the {}.", label)])
    }

    /// Wears a carried piece of armor, returning any previous armor to the
    /// pack.
    pub fn wear(&mut self, name: &str) -> EramudResult<Vec<String>> {
        let Some(index) = self.find_inventory_index(name) else {
            return Ok(vec![format!("You aren't carrying a '{}'.", name)]);
        };
        let kind = self.player.inventory[index].kind()?;
        if kind.ac_bonus == 0 {
            return Ok(vec![format!("The {} won't protect you.", kind.name)]);
        }
        let item = self.player.inventory.remove(index);
        let label = item.display_name();
        if let Some(previous) = self.player.worn.replace(item) {
            self.player.inventory.push(previous);
        }
        Ok(vec![format!("You strap on the {}.", label)])
    }

    /// Eats or applies a carried consumable.
    pub fn consume(&mut self, name: &str) -> EramudResult<Vec<String>> {
        let Some(index) = self.find_inventory_index(name) else {
            return Ok(vec![format!("You aren't carrying a '{}'.", name)]);
        };
        let key = normalize_key(&self.player.inventory[index].key);
        let message = match key.as_str() {
            "rad-tablet" => {
                self.player.sustenance =
                    (self.player.sustenance + 40).min(config::MAX_SUSTENANCE);
                "The tablet fizzes going down. You feel fuller.".to_string()
            }
            "med-gel" => {
                self.player.hp = (self.player.hp + 10).min(self.player.max_hp);
                "The gel knits your wounds closed.".to_string()
            }
            _ => {
                let label = self.player.inventory[index].display_name();
                return Ok(vec![format!("You can't use the {}.", label)]);
            }
        };
        self.player.inventory.remove(index);
        Ok(vec![message])
    }

    /// Applies owed upkeep ticks, at most one per call; the clock caps how
    /// far a long-idle process may catch up. Returns true when a tick ran.
    pub fn process_owed_upkeep(&mut self, now: Instant) -> bool {
        if !self.upkeep.next_owed(now) {
            return false;
        }
        self.apply_upkeep_tick();
        true
    }

    /// One upkeep tick: sustenance drains, starvation bites at zero.
    pub fn apply_upkeep_tick(&mut self) {
        self.player.sustenance = (self.player.sustenance - 1).max(0);
        if self.player.sustenance > 0 {
            return;
        }
        self.player.hp -= 1;
        self.statistics.damage_taken += 1;
        self.player
            .sense("Your stomach gnaws at itself. You are starving!".to_string());
        debug!("starvation tick: hp now {}", self.player.hp);
        if self.player.hp <= 0 {
            self.handle_player_death();
        }
    }

    fn handle_player_death(&mut self) {
        self.statistics.deaths += 1;
        let year = self.player.year;
        ai::reset_all_aggro(&mut self.world, year);
        self.player.hp = self.player.max_hp;
        self.player.sustenance = config::MAX_SUSTENANCE / 2;
        self.player.set_position(Position::origin());
        self.player
            .sense("You black out... and wake at the crossing, mouth full of dust.".to_string());
    }

    /// Saves the game state to JSON.
    pub fn save_to_json(&self) -> EramudResult<String> {
        serde_json::to_string_pretty(self).map_err(EramudError::from)
    }

    /// Loads game state from JSON and re-arms the monster id allocator past
    /// every persisted id.
    pub fn load_from_json(json: &str) -> EramudResult<Self> {
        let mut state: GameState = serde_json::from_str(json)?;
        state.world.rearm_monster_ids();
        Ok(state)
    }

    fn find_inventory_index(&self, name: &str) -> Option<usize> {
        let normalized = normalize_key(name);
        let by_key = self
            .player
            .inventory
            .iter()
            .position(|item| normalize_key(&item.key) == normalized);
        if by_key.is_some() {
            return by_key;
        }
        let kind = resolve_item_kind(name)?;
        self.player
            .inventory
            .iter()
            .position(|item| normalize_key(&item.key) == kind.key)
    }
}
